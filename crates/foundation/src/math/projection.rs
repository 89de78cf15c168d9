use super::{LatLon, ScreenPoint};

/// Geographic <-> container pixel conversion at the current view state.
///
/// Implementations are expected to be pure for a fixed view: projecting the
/// same coordinate twice yields the same point.
pub trait MarkerProjector {
    fn project(&self, position: LatLon) -> ScreenPoint;
    fn unproject(&self, point: ScreenPoint) -> LatLon;
}

impl<P: MarkerProjector + ?Sized> MarkerProjector for &P {
    fn project(&self, position: LatLon) -> ScreenPoint {
        (**self).project(position)
    }

    fn unproject(&self, point: ScreenPoint) -> LatLon {
        (**self).unproject(point)
    }
}
