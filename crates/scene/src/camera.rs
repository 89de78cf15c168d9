use foundation::LatLonBounds;
use foundation::math::{
    LatLon, MERCATOR_MAX_LAT_DEG, MarkerProjector, ScreenPoint, WORLD_WIDTH_M, clamp,
    inverse_mercator_lat_deg, inverse_mercator_lon_deg, mercator_x_m, mercator_y_m, wrap_dx_m,
    wrap_lon_deg,
};
use serde::{Deserialize, Serialize};

/// Edge length of one map tile in pixels. At zoom `z` the world is
/// `TILE_SIZE_PX * 2^z` pixels wide.
pub const TILE_SIZE_PX: f64 = 256.0;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera2D {
    pub center: LatLon,
    pub zoom: f64,
}

impl Default for Camera2D {
    fn default() -> Self {
        Self {
            center: LatLon::new(20.0, 0.0),
            zoom: 2.0,
        }
    }
}

impl Camera2D {
    pub fn new(center: LatLon, zoom: f64) -> Self {
        Self { center, zoom }
    }

    pub fn scale_px_per_m(&self) -> f64 {
        (TILE_SIZE_PX * self.zoom.exp2() / WORLD_WIDTH_M).max(1e-12)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
}

impl Viewport {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        let sanitize = |v: f64| if v.is_finite() { v.max(1.0) } else { 1.0 };
        Self {
            width_px: sanitize(width_px),
            height_px: sanitize(height_px),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.0, max: 18.0 }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, zoom: f64) -> f64 {
        if !zoom.is_finite() {
            return if zoom > 0.0 { self.max } else { self.min };
        }
        clamp(zoom, self.min, self.max)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FitOptions {
    /// Padding kept free on every side of the viewport.
    pub padding_px: f64,
    /// Upper bound on the fitted zoom, on top of the view's own limits.
    pub max_zoom: Option<f64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            padding_px: 0.0,
            max_zoom: None,
        }
    }
}

impl FitOptions {
    /// The framing used when the dancer map first shows a data set.
    pub fn dancers() -> Self {
        Self {
            padding_px: 50.0,
            max_zoom: Some(3.0),
        }
    }
}

/// Camera that shows all of `bounds` inside the padded viewport.
///
/// The zoom is snapped down to a whole level so the bounds stay inside the
/// view. Point-sized bounds use the highest permitted zoom.
pub fn fit_camera(
    bounds: LatLonBounds,
    viewport: Viewport,
    options: FitOptions,
    limits: ZoomLimits,
) -> Camera2D {
    let max_zoom = options.max_zoom.map_or(limits.max, |z| z.min(limits.max));
    if bounds.is_point() {
        return Camera2D::new(bounds.center(), max_zoom.max(limits.min));
    }
    let span_x_m = (mercator_x_m(bounds.north_east.lon_deg) - mercator_x_m(bounds.south_west.lon_deg)).abs();
    let span_y_m = (mercator_y_m(bounds.north_east.lat_deg) - mercator_y_m(bounds.south_west.lat_deg)).abs();

    let avail_w = (viewport.width_px - 2.0 * options.padding_px).max(1.0);
    let avail_h = (viewport.height_px - 2.0 * options.padding_px).max(1.0);

    // Pixels per meter at zoom 0.
    let base_scale = TILE_SIZE_PX / WORLD_WIDTH_M;
    let fit_x = avail_w / (span_x_m * base_scale);
    let fit_y = avail_h / (span_y_m * base_scale);
    let raw_zoom = fit_x.min(fit_y).log2();

    let zoom = if raw_zoom.is_finite() {
        clamp(raw_zoom.floor(), limits.min, max_zoom)
    } else {
        max_zoom.max(limits.min)
    };

    Camera2D::new(bounds.center(), zoom)
}

/// Projector for a fixed camera and viewport.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MercatorProjector {
    center_x: f64,
    center_y: f64,
    scale_px_per_m: f64,
    width_px: f64,
    height_px: f64,
}

impl MercatorProjector {
    pub fn new(camera: Camera2D, viewport: Viewport) -> Self {
        Self {
            center_x: mercator_x_m(camera.center.lon_deg),
            center_y: mercator_y_m(camera.center.lat_deg),
            scale_px_per_m: camera.scale_px_per_m(),
            width_px: viewport.width_px,
            height_px: viewport.height_px,
        }
    }

    /// Mercator meters under a container pixel.
    fn screen_to_mercator_m(&self, point: ScreenPoint) -> (f64, f64) {
        let dx_m = (point.x - self.width_px * 0.5) / self.scale_px_per_m;
        let dy_m = (self.height_px * 0.5 - point.y) / self.scale_px_per_m;
        (self.center_x + dx_m, self.center_y + dy_m)
    }
}

impl MarkerProjector for MercatorProjector {
    fn project(&self, position: LatLon) -> ScreenPoint {
        let dx = wrap_dx_m(mercator_x_m(position.lon_deg) - self.center_x);
        let dy = mercator_y_m(position.lat_deg) - self.center_y;
        ScreenPoint::new(
            self.width_px * 0.5 + dx * self.scale_px_per_m,
            self.height_px * 0.5 - dy * self.scale_px_per_m,
        )
    }

    fn unproject(&self, point: ScreenPoint) -> LatLon {
        let (x_m, y_m) = self.screen_to_mercator_m(point);
        LatLon::new(
            clamp(
                inverse_mercator_lat_deg(y_m),
                -MERCATOR_MAX_LAT_DEG,
                MERCATOR_MAX_LAT_DEG,
            ),
            wrap_lon_deg(inverse_mercator_lon_deg(x_m)),
        )
    }
}

/// Camera after dragging the map content by `(dx_px, dy_px)`.
pub fn pan_camera(camera: Camera2D, viewport: Viewport, dx_px: f64, dy_px: f64) -> Camera2D {
    let projector = MercatorProjector::new(camera, viewport);
    let center = projector.unproject(ScreenPoint::new(
        viewport.width_px * 0.5 - dx_px,
        viewport.height_px * 0.5 - dy_px,
    ));
    Camera2D { center, ..camera }
}

/// Camera after changing zoom to `next_zoom` while keeping the map point
/// under `(x_px, y_px)` fixed on screen.
pub fn zoom_camera_at(
    camera: Camera2D,
    viewport: Viewport,
    x_px: f64,
    y_px: f64,
    next_zoom: f64,
) -> Camera2D {
    let projector = MercatorProjector::new(camera, viewport);
    let (p_x_m, p_y_m) = projector.screen_to_mercator_m(ScreenPoint::new(x_px, y_px));

    let next = Camera2D {
        zoom: next_zoom,
        ..camera
    };
    let next_scale = next.scale_px_per_m();
    let next_center_x = p_x_m - (x_px - viewport.width_px * 0.5) / next_scale;
    let next_center_y = p_y_m - (viewport.height_px * 0.5 - y_px) / next_scale;

    Camera2D {
        center: LatLon::new(
            clamp(
                inverse_mercator_lat_deg(next_center_y),
                -MERCATOR_MAX_LAT_DEG,
                MERCATOR_MAX_LAT_DEG,
            ),
            wrap_lon_deg(inverse_mercator_lon_deg(next_center_x)),
        ),
        zoom: next_zoom,
    }
}
