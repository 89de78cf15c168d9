//! Screen-space marker declustering.
//!
//! Markers whose projected positions fall within the overlap threshold of
//! another marker are spread on a small ring so each stays clickable. The
//! result is expressed in geographic coordinates so the renderer can place
//! markers the usual way; it is only valid for the view it was computed
//! against.

use std::collections::BTreeMap;

use formats::DancerRecord;
use foundation::DancerId;
use foundation::math::{LatLon, MarkerProjector, ScreenPoint, wrap_lon_deg};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclusterConfig {
    /// Markers closer than this (pixels) overlap.
    pub overlap_threshold_px: f64,
    /// Ring radius (pixels) clustered markers are moved onto.
    pub separation_radius_px: f64,
}

impl Default for DeclusterConfig {
    fn default() -> Self {
        Self {
            overlap_threshold_px: 8.0,
            separation_radius_px: 12.0,
        }
    }
}

/// Rendering position for every dancer of one layout pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AdjustedPositions {
    positions: BTreeMap<DancerId, LatLon>,
}

impl AdjustedPositions {
    pub fn get(&self, id: &str) -> Option<LatLon> {
        self.positions.get(id).copied()
    }

    pub fn position_or_original(&self, dancer: &DancerRecord) -> LatLon {
        self.get(dancer.id.as_str())
            .unwrap_or_else(|| dancer.position())
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DancerId, &LatLon)> {
        self.positions.iter()
    }

    fn insert(&mut self, id: &DancerId, position: LatLon) {
        self.positions.insert(id.clone(), position);
    }
}

/// Every dancer at its own coordinates.
pub fn identity_positions(dancers: &[DancerRecord]) -> AdjustedPositions {
    let mut out = AdjustedPositions::default();
    for dancer in dancers {
        out.insert(&dancer.id, dancer.position());
    }
    out
}

/// Computes adjusted marker positions for the current view.
///
/// Grouping is a single pass in dataset order: each not-yet-placed dancer
/// collects the later, not-yet-placed dancers whose projected distance to it
/// is below the overlap threshold. Proximity is measured to the initiating
/// dancer only, so clusters are not transitive.
///
/// A cluster of `n` is laid out on a ring of `separation_radius_px` around
/// the projection of the members' mean latitude/longitude, member `k` (in
/// discovery order) at angle `k * 2π / n`.
///
/// Without a projector every dancer keeps its original coordinates. A dancer
/// whose projection is not finite is never clustered. The result always has
/// one entry per dancer.
pub fn adjusted_positions<P>(
    dancers: &[DancerRecord],
    projector: Option<&P>,
    config: DeclusterConfig,
) -> AdjustedPositions
where
    P: MarkerProjector + ?Sized,
{
    let Some(projector) = projector else {
        return identity_positions(dancers);
    };

    let screen: Vec<Option<ScreenPoint>> = dancers
        .iter()
        .map(|d| {
            let p = projector.project(d.position());
            p.is_finite().then_some(p)
        })
        .collect();

    let mut processed = vec![false; dancers.len()];
    let mut out = AdjustedPositions::default();

    for i in 0..dancers.len() {
        if processed[i] {
            continue;
        }
        processed[i] = true;

        let Some(origin) = screen[i] else {
            out.insert(&dancers[i].id, dancers[i].position());
            continue;
        };

        let mut cluster = vec![i];
        for j in (i + 1)..dancers.len() {
            if processed[j] {
                continue;
            }
            let Some(other) = screen[j] else {
                continue;
            };
            if origin.distance(other) < config.overlap_threshold_px {
                cluster.push(j);
            }
        }

        if cluster.len() == 1 {
            out.insert(&dancers[i].id, dancers[i].position());
            continue;
        }

        for &j in &cluster[1..] {
            processed[j] = true;
        }
        spread_cluster(dancers, &cluster, projector, config, &mut out);
    }

    out
}

/// Geographic mean of a cluster. Longitudes are taken relative to the
/// initiating dancer so a cluster straddling the antimeridian averages to a
/// point between its members rather than to the far side of the world.
fn cluster_centroid(dancers: &[DancerRecord], cluster: &[usize]) -> Option<LatLon> {
    let anchor_lon = dancers[*cluster.first()?].longitude;
    let mean = LatLon::mean(cluster.iter().map(|&i| {
        let p = dancers[i].position();
        LatLon::new(p.lat_deg, anchor_lon + wrap_lon_deg(p.lon_deg - anchor_lon))
    }))?;
    Some(LatLon::new(mean.lat_deg, wrap_lon_deg(mean.lon_deg)))
}

fn spread_cluster<P>(
    dancers: &[DancerRecord],
    cluster: &[usize],
    projector: &P,
    config: DeclusterConfig,
    out: &mut AdjustedPositions,
) where
    P: MarkerProjector + ?Sized,
{
    let center = cluster_centroid(dancers, cluster)
        .map(|c| projector.project(c))
        .filter(ScreenPoint::is_finite);

    let Some(center) = center else {
        for &i in cluster {
            out.insert(&dancers[i].id, dancers[i].position());
        }
        return;
    };

    let step = std::f64::consts::TAU / cluster.len() as f64;
    for (k, &i) in cluster.iter().enumerate() {
        let point = center.offset_polar(config.separation_radius_px, k as f64 * step);
        let adjusted = projector.unproject(point);
        let position = if adjusted.is_finite() {
            adjusted
        } else {
            dancers[i].position()
        };
        out.insert(&dancers[i].id, position);
    }
}
