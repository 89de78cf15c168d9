use crate::math::{LatLon, inverse_mercator_lat_deg, mercator_y_m};

/// Geographic bounding box (south-west / north-east corners, degrees).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LatLonBounds {
    pub south_west: LatLon,
    pub north_east: LatLon,
}

impl LatLonBounds {
    pub fn new(south_west: LatLon, north_east: LatLon) -> Self {
        LatLonBounds {
            south_west,
            north_east,
        }
    }

    /// Smallest box containing every point, or `None` when there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLon>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = LatLonBounds::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLon) {
        self.south_west.lat_deg = self.south_west.lat_deg.min(p.lat_deg);
        self.south_west.lon_deg = self.south_west.lon_deg.min(p.lon_deg);
        self.north_east.lat_deg = self.north_east.lat_deg.max(p.lat_deg);
        self.north_east.lon_deg = self.north_east.lon_deg.max(p.lon_deg);
    }

    /// Midpoint in projected (Mercator) space, which is what a map view
    /// centers on when fitting these bounds.
    pub fn center(&self) -> LatLon {
        let y = 0.5 * (mercator_y_m(self.south_west.lat_deg) + mercator_y_m(self.north_east.lat_deg));
        LatLon::new(
            inverse_mercator_lat_deg(y),
            0.5 * (self.south_west.lon_deg + self.north_east.lon_deg),
        )
    }

    pub fn is_point(&self) -> bool {
        self.south_west == self.north_east
    }
}
