use formats::{DanceMode, DancerRecord};
use foundation::DancerId;
use foundation::math::{LatLon, MarkerProjector};
use runtime::MapEvent;
use serde::Serialize;
use tracing::debug;

use crate::decluster::{AdjustedPositions, DeclusterConfig, adjusted_positions};
use crate::layer::{Layer, LayerId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedMarker {
    pub id: DancerId,
    pub name: String,
    pub mode: DanceMode,
    /// Where the marker is drawn.
    pub position: LatLon,
    /// The dancer's true coordinates.
    pub original: LatLon,
    pub displaced: bool,
}

/// One marker per visible dancer, positioned by the declustering pass.
///
/// Positions are recomputed after zoom, pan, resize and dancer-set changes.
/// While a popup is open recomputation is deferred so the popup's auto-pan
/// does not move markers under it; the deferred pass runs on popup close.
#[derive(Debug, Clone)]
pub struct MarkersLayer {
    id: LayerId,
    mode: DanceMode,
    dancers: Vec<DancerRecord>,
    positions: AdjustedPositions,
    open_popup: Option<DancerId>,
    config: DeclusterConfig,
    stale: bool,
    recomputes: u64,
}

impl MarkersLayer {
    pub fn new(id: u64, config: DeclusterConfig) -> Self {
        Self {
            id: LayerId(id),
            mode: DanceMode::default(),
            dancers: Vec::new(),
            positions: AdjustedPositions::default(),
            open_popup: None,
            config,
            stale: false,
            recomputes: 0,
        }
    }

    pub fn mode(&self) -> DanceMode {
        self.mode
    }

    pub fn dancers(&self) -> &[DancerRecord] {
        &self.dancers
    }

    pub fn positions(&self) -> &AdjustedPositions {
        &self.positions
    }

    pub fn config(&self) -> DeclusterConfig {
        self.config
    }

    pub fn open_popup(&self) -> Option<&DancerId> {
        self.open_popup.as_ref()
    }

    pub fn is_popup_open(&self) -> bool {
        self.open_popup.is_some()
    }

    /// True when positions lag behind the dancer set or the view, either
    /// because a popup deferred the recompute or a replaced set awaits its
    /// change event.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// Replaces the visible dancer set and lays it out. Returns whether
    /// positions were recomputed.
    pub fn set_dancers<P>(
        &mut self,
        mode: DanceMode,
        dancers: Vec<DancerRecord>,
        projector: Option<&P>,
    ) -> bool
    where
        P: MarkerProjector + ?Sized,
    {
        self.replace_dancers(mode, dancers);
        self.recompute(projector)
    }

    /// Replaces the visible dancer set without laying it out; the layer stays
    /// stale until the matching `DancersChanged` event is handled.
    pub fn replace_dancers(&mut self, mode: DanceMode, dancers: Vec<DancerRecord>) {
        self.mode = mode;
        self.dancers = dancers;
        self.stale = true;

        // A popup cannot outlive its marker.
        let popup_gone = self
            .open_popup
            .as_ref()
            .is_some_and(|open| !self.dancers.iter().any(|d| &d.id == open));
        if popup_gone {
            self.open_popup = None;
        }
    }

    /// Applies one view notification. Returns whether positions were
    /// recomputed.
    pub fn handle_event<P>(&mut self, event: &MapEvent, projector: Option<&P>) -> bool
    where
        P: MarkerProjector + ?Sized,
    {
        match event {
            MapEvent::DancersChanged { .. } => self.recompute(projector),
            event if event.changes_projection() => self.recompute(projector),
            MapEvent::PopupOpen { dancer } => {
                if self.dancers.iter().any(|d| &d.id == dancer) {
                    self.open_popup = Some(dancer.clone());
                } else {
                    debug!("ignoring popup for unknown dancer {dancer}");
                }
                false
            }
            MapEvent::PopupClose => {
                self.open_popup = None;
                self.recompute(projector)
            }
            _ => false,
        }
    }

    fn recompute<P>(&mut self, projector: Option<&P>) -> bool
    where
        P: MarkerProjector + ?Sized,
    {
        if let Some(open) = &self.open_popup {
            debug!("popup {open} open; deferring marker layout");
            self.stale = true;
            return false;
        }
        self.positions = adjusted_positions(&self.dancers, projector, self.config);
        self.stale = false;
        self.recomputes += 1;
        true
    }

    pub fn markers(&self) -> Vec<PlacedMarker> {
        self.dancers.iter().map(|d| self.place(d)).collect()
    }

    pub fn marker(&self, id: &str) -> Option<PlacedMarker> {
        self.dancers
            .iter()
            .find(|d| d.id.as_str() == id)
            .map(|d| self.place(d))
    }

    fn place(&self, dancer: &DancerRecord) -> PlacedMarker {
        let original = dancer.position();
        let position = self.positions.position_or_original(dancer);
        PlacedMarker {
            id: dancer.id.clone(),
            name: dancer.name.clone(),
            mode: dancer.mode,
            position,
            original,
            displaced: position != original,
        }
    }
}

impl Layer for MarkersLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}
