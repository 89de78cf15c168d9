use std::sync::Arc;

use catalog::DancerCatalog;
use formats::DanceMode;
use foundation::DancerId;
use runtime::MapEvent;
use scene::{Camera2D, FitOptions, MapView, Viewport};
use tracing::{debug, info};

use crate::decluster::DeclusterConfig;
use crate::markers::{MarkersLayer, PlacedMarker};
use crate::popup::{PopupContent, PopupOptions};
use crate::symbology::Legend;

const MARKERS_LAYER_ID: u64 = 1;

/// One viewer's map: the selected mode, the view, and the marker layer kept
/// in step with both.
///
/// View operations queue events; `pump` delivers them to the marker layer.
/// Every public mutator pumps before returning, so reads always see settled
/// marker positions.
#[derive(Debug)]
pub struct MapSession {
    catalog: Arc<DancerCatalog>,
    mode: DanceMode,
    view: MapView,
    markers: MarkersLayer,
    has_initial_view: bool,
}

impl MapSession {
    pub fn new(catalog: Arc<DancerCatalog>, viewport: Viewport, config: DeclusterConfig) -> Self {
        let mut session = Self {
            catalog,
            mode: DanceMode::default(),
            view: MapView::new(viewport),
            markers: MarkersLayer::new(MARKERS_LAYER_ID, config),
            has_initial_view: false,
        };
        session.load_mode(DanceMode::default());
        session
    }

    pub fn mode(&self) -> DanceMode {
        self.mode
    }

    pub fn camera(&self) -> Camera2D {
        self.view.camera()
    }

    pub fn viewport(&self) -> Viewport {
        self.view.viewport()
    }

    pub fn markers_layer(&self) -> &MarkersLayer {
        &self.markers
    }

    pub fn markers(&self) -> Vec<PlacedMarker> {
        self.markers.markers()
    }

    pub fn legend(&self) -> Legend {
        Legend::for_mode(self.mode)
    }

    /// Switches the visible dancer set. Selecting the active mode is a no-op.
    pub fn set_mode(&mut self, mode: DanceMode) {
        if mode == self.mode {
            return;
        }
        info!(from = %self.mode, to = %mode, "switching dance mode");
        self.load_mode(mode);
    }

    fn load_mode(&mut self, mode: DanceMode) {
        self.mode = mode;
        let dancers = self.catalog.records_for(mode);
        let count = dancers.len();

        // The first non-empty set frames the view; later switches keep it.
        if !self.has_initial_view {
            if let Some(bounds) = self.catalog.bounds(mode) {
                self.view.fit_bounds(bounds, FitOptions::dancers());
                self.has_initial_view = true;
            }
        }
        // Layout for the fit and the new set happens once, in the pump below.
        self.markers.replace_dancers(mode, dancers);
        self.view.emit(MapEvent::DancersChanged { count });
        let recomputed = self.pump();
        debug!(%mode, count, recomputed, "loaded dancers");
    }

    pub fn pan_by(&mut self, dx_px: f64, dy_px: f64) {
        self.view.pan_by(dx_px, dy_px);
        self.pump();
    }

    pub fn zoom_at(&mut self, x_px: f64, y_px: f64, delta_zoom: f64) {
        self.view.zoom_at(x_px, y_px, delta_zoom);
        self.pump();
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.view.resize(viewport);
        self.pump();
    }

    /// Returns false when `id` is not among the visible dancers.
    pub fn open_popup(&mut self, id: &str) -> bool {
        if self.markers.marker(id).is_none() {
            debug!("no visible dancer {id}");
            return false;
        }
        self.view.emit(MapEvent::PopupOpen {
            dancer: DancerId::new(id),
        });
        self.pump();
        true
    }

    pub fn close_popup(&mut self) {
        if !self.markers.is_popup_open() {
            return;
        }
        self.view.emit(MapEvent::PopupClose);
        self.pump();
    }

    /// Pans to a visible dancer's true position, keeping the zoom.
    pub fn center_on(&mut self, id: &str) -> bool {
        let Some(marker) = self.markers.marker(id) else {
            return false;
        };
        let zoom = self.view.camera().zoom;
        self.view.set_view(marker.original, zoom);
        self.pump();
        true
    }

    /// Frames the current mode's dancers again.
    pub fn reset_view(&mut self) {
        match self.catalog.bounds(self.mode) {
            Some(bounds) => self.view.fit_bounds(bounds, FitOptions::dancers()),
            None => {
                let home = Camera2D::default();
                self.view.set_view(home.center, home.zoom);
            }
        }
        self.pump();
    }

    /// Popup content for a visible dancer.
    pub fn popup(&self, id: &str, options: &PopupOptions) -> Option<PopupContent> {
        self.markers.marker(id)?;
        self.catalog
            .get(id)
            .map(|dancer| PopupContent::for_dancer(dancer, options))
    }

    /// Delivers queued view events to the marker layer. Returns the number of
    /// recomputes performed.
    pub fn pump(&mut self) -> usize {
        let events = self.view.drain_events();
        if events.is_empty() {
            return 0;
        }
        let projector = self.view.projector();
        let mut recomputed = 0;
        for event in &events {
            if self.markers.handle_event(&event.event, Some(&projector)) {
                recomputed += 1;
            }
        }
        debug!(
            events = events.len(),
            recomputed, "delivered view events to markers"
        );
        recomputed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formats::DancerRecord;
    use foundation::math::LatLon;

    fn record(id: &str, mode: DanceMode, lat: f64, lon: f64) -> DancerRecord {
        DancerRecord {
            id: DancerId::new(id),
            name: format!("Dancer {id}"),
            mode,
            location: "Somewhere".into(),
            latitude: lat,
            longitude: lon,
            profile_pic: format!("images/{id}.jpg"),
            instagram: Some(format!("https://instagram.com/{id}")),
            tiktok: None,
        }
    }

    fn session() -> MapSession {
        let catalog = DancerCatalog::from_records(vec![
            record("s1", DanceMode::Salsa, 40.7128, -74.0060),
            record("s2", DanceMode::Salsa, 40.7306, -73.9352),
            record("s3", DanceMode::Salsa, 51.5074, -0.1278),
            record("b1", DanceMode::Bachata, 18.4861, -69.9312),
        ])
        .unwrap();
        MapSession::new(
            Arc::new(catalog),
            Viewport::new(1024.0, 768.0),
            DeclusterConfig::default(),
        )
    }

    fn displaced(session: &MapSession) -> Vec<String> {
        session
            .markers()
            .into_iter()
            .filter(|m| m.displaced)
            .map(|m| m.id.to_string())
            .collect()
    }

    #[test]
    fn starts_on_salsa_framed_to_its_dancers() {
        let s = session();
        assert_eq!(s.mode(), DanceMode::Salsa);
        assert_eq!(s.markers().len(), 3);
        assert!(s.camera().zoom <= 3.0);
        assert_eq!(s.legend().label, "Salsa Dancers");
    }

    #[test]
    fn nearby_dancers_are_spread_until_zoomed_in() {
        let mut s = session();
        assert_eq!(displaced(&s), vec!["s1", "s2"]);

        for _ in 0..8 {
            s.zoom_at(512.0, 384.0, 1.0);
        }
        assert!(displaced(&s).is_empty());
    }

    #[test]
    fn mode_switch_replaces_markers_and_keeps_view() {
        let mut s = session();
        let camera = s.camera();
        s.set_mode(DanceMode::Bachata);
        assert_eq!(s.mode(), DanceMode::Bachata);
        let ids: Vec<String> = s.markers().iter().map(|m| m.id.to_string()).collect();
        assert_eq!(ids, vec!["b1"]);
        assert_eq!(s.camera(), camera);

        let before = s.markers_layer().recompute_count();
        s.set_mode(DanceMode::Bachata);
        assert_eq!(s.markers_layer().recompute_count(), before);
    }

    #[test]
    fn open_popup_freezes_markers_until_closed() {
        let mut s = session();
        assert!(s.open_popup("s1"));
        let frozen = s.markers();
        let count = s.markers_layer().recompute_count();

        s.pan_by(40.0, 10.0);
        s.zoom_at(512.0, 384.0, 1.0);
        assert_eq!(s.markers(), frozen);
        assert_eq!(s.markers_layer().recompute_count(), count);

        s.close_popup();
        assert_eq!(s.markers_layer().recompute_count(), count + 1);
        assert!(!s.markers_layer().is_popup_open());
    }

    #[test]
    fn mode_switch_is_laid_out_through_the_event_pump() {
        let mut s = session();
        assert!(s.open_popup("s1"));
        s.set_mode(DanceMode::Bachata);
        assert!(!s.markers_layer().is_popup_open());
        assert!(!s.markers_layer().is_stale());
        assert_eq!(s.markers_layer().positions().len(), 1);
        assert!(s.markers_layer().positions().get("b1").is_some());
    }

    #[test]
    fn popup_only_for_visible_dancers() {
        let mut s = session();
        assert!(!s.open_popup("b1"));
        assert!(s.popup("b1", &PopupOptions::default()).is_none());
        let popup = s.popup("s3", &PopupOptions::default()).unwrap();
        assert_eq!(popup.title, "Dancer s3");
        assert!(popup.links_centered);
    }

    #[test]
    fn center_on_keeps_zoom() {
        let mut s = session();
        let zoom = s.camera().zoom;
        assert!(s.center_on("s3"));
        assert_eq!(s.camera().zoom, zoom);
        assert_eq!(s.camera().center, LatLon::new(51.5074, -0.1278));
        assert!(!s.center_on("nobody"));
    }

    #[test]
    fn reset_view_refits_current_mode() {
        let mut s = session();
        let framed = s.camera();
        s.pan_by(300.0, -200.0);
        assert_ne!(s.camera(), framed);
        s.reset_view();
        assert_eq!(s.camera(), framed);
    }

    #[test]
    fn resize_triggers_layout() {
        let mut s = session();
        let count = s.markers_layer().recompute_count();
        s.resize(Viewport::new(400.0, 300.0));
        assert_eq!(s.markers_layer().recompute_count(), count + 1);
        s.resize(Viewport::new(400.0, 300.0));
        assert_eq!(s.markers_layer().recompute_count(), count + 1);
    }
}
