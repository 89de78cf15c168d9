use foundation::DancerId;
use foundation::math::LatLon;

/// View-state change notifications.
///
/// These are the only signals the marker layer reacts to; everything else
/// about the map (tiles, animation) stays outside this crate.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    ZoomEnd { zoom: f64 },
    MoveEnd { center: LatLon },
    Resize { width_px: f64, height_px: f64 },
    PopupOpen { dancer: DancerId },
    PopupClose,
    DancersChanged { count: usize },
}

impl MapEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::ZoomEnd { .. } => "zoomend",
            MapEvent::MoveEnd { .. } => "moveend",
            MapEvent::Resize { .. } => "resize",
            MapEvent::PopupOpen { .. } => "popupopen",
            MapEvent::PopupClose => "popupclose",
            MapEvent::DancersChanged { .. } => "dancerschanged",
        }
    }

    /// True for events after which projected screen positions are stale.
    pub fn changes_projection(&self) -> bool {
        matches!(
            self,
            MapEvent::ZoomEnd { .. } | MapEvent::MoveEnd { .. } | MapEvent::Resize { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub seq: u64,
    pub event: MapEvent,
}

#[derive(Debug, Default)]
pub struct EventBus {
    next_seq: u64,
    events: Vec<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: MapEvent) {
        self.events.push(Event {
            seq: self.next_seq,
            event,
        });
        self.next_seq += 1;
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
