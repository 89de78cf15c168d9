use foundation::LatLonBounds;
use foundation::math::LatLon;
use runtime::{Event, EventBus, MapEvent};

use crate::camera::{
    Camera2D, FitOptions, MercatorProjector, Viewport, ZoomLimits, fit_camera, pan_camera,
    zoom_camera_at,
};

/// Interactive 2D map view state.
///
/// Every completed view change is reported on the view's event bus, the same
/// way a slippy map fires `zoomend` / `moveend` after an interaction settles.
#[derive(Debug)]
pub struct MapView {
    camera: Camera2D,
    viewport: Viewport,
    limits: ZoomLimits,
    events: EventBus,
}

impl MapView {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_camera(Camera2D::default(), viewport, ZoomLimits::default())
    }

    pub fn with_camera(camera: Camera2D, viewport: Viewport, limits: ZoomLimits) -> Self {
        Self {
            camera: Camera2D {
                zoom: limits.clamp(camera.zoom),
                ..camera
            },
            viewport,
            limits,
            events: EventBus::new(),
        }
    }

    pub fn camera(&self) -> Camera2D {
        self.camera
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projector(&self) -> MercatorProjector {
        MercatorProjector::new(self.camera, self.viewport)
    }

    pub fn set_view(&mut self, center: LatLon, zoom: f64) {
        let zoom = self.limits.clamp(zoom);
        let zoom_changed = zoom != self.camera.zoom;
        self.camera = Camera2D::new(center, zoom);
        if zoom_changed {
            self.events.emit(MapEvent::ZoomEnd { zoom });
        }
        self.events.emit(MapEvent::MoveEnd { center });
    }

    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
        if !dx_px.is_finite() || !dy_px.is_finite() || (dx_px == 0.0 && dy_px == 0.0) {
            return;
        }
        self.camera = pan_camera(self.camera, self.viewport, dx_px, dy_px);
        self.events.emit(MapEvent::MoveEnd {
            center: self.camera.center,
        });
    }

    /// Zooms by `delta_zoom` levels around a container pixel.
    pub fn zoom_at(&mut self, x_px: f64, y_px: f64, delta_zoom: f64) {
        if !x_px.is_finite() || !y_px.is_finite() || !delta_zoom.is_finite() {
            return;
        }
        let next_zoom = self.limits.clamp(self.camera.zoom + delta_zoom);
        if next_zoom == self.camera.zoom {
            return;
        }
        self.camera = zoom_camera_at(self.camera, self.viewport, x_px, y_px, next_zoom);
        self.events.emit(MapEvent::ZoomEnd { zoom: next_zoom });
        self.events.emit(MapEvent::MoveEnd {
            center: self.camera.center,
        });
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        self.events.emit(MapEvent::Resize {
            width_px: viewport.width_px,
            height_px: viewport.height_px,
        });
    }

    pub fn fit_bounds(&mut self, bounds: LatLonBounds, options: FitOptions) {
        let cam = fit_camera(bounds, self.viewport, options, self.limits);
        self.set_view(cam.center, cam.zoom);
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.events.emit(event);
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }
}
