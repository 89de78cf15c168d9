use std::collections::BTreeMap;
use std::path::Path;

use formats::{DanceMode, DancerRecord, DatasetError, load_dancers_from_path, validate_dancers};
use foundation::{DancerId, LatLonBounds};
use serde::Serialize;

#[derive(Debug)]
pub enum CatalogError {
    Dataset(DatasetError),
    Encode(String),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Dataset(err) => write!(f, "dancer dataset unavailable: {err}"),
            CatalogError::Encode(msg) => write!(f, "dancer dataset encode error: {msg}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Dataset(err) => Some(err),
            CatalogError::Encode(_) => None,
        }
    }
}

impl From<DatasetError> for CatalogError {
    fn from(err: DatasetError) -> Self {
        CatalogError::Dataset(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeCount {
    pub mode: DanceMode,
    pub count: usize,
}

/// The dancer dataset, loaded once per session and never mutated.
///
/// Ordering contract:
/// - `all()` and `by_mode()` yield records in dataset order.
#[derive(Debug, Clone)]
pub struct DancerCatalog {
    records: Vec<DancerRecord>,
    index: BTreeMap<DancerId, usize>,
    content_hash: String,
}

impl DancerCatalog {
    pub fn from_records(records: Vec<DancerRecord>) -> Result<Self, CatalogError> {
        validate_dancers(&records)?;
        let canonical =
            serde_json::to_vec(&records).map_err(|e| CatalogError::Encode(e.to_string()))?;
        let content_hash = blake3::hash(&canonical).to_hex().to_string();
        let index = records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.id.clone(), i))
            .collect();
        Ok(Self {
            records,
            index,
            content_hash,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let records = load_dancers_from_path(path)?;
        Self::from_records(records)
    }

    /// blake3 hex digest of the canonical JSON encoding of the records.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn all(&self) -> &[DancerRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&DancerRecord> {
        self.index.get(id).and_then(|&i| self.records.get(i))
    }

    pub fn by_mode(&self, mode: DanceMode) -> Vec<&DancerRecord> {
        self.records.iter().filter(|r| r.mode == mode).collect()
    }

    /// Owned copy of one mode's records, for consumers that keep their own set.
    pub fn records_for(&self, mode: DanceMode) -> Vec<DancerRecord> {
        self.by_mode(mode).into_iter().cloned().collect()
    }

    pub fn count(&self, mode: DanceMode) -> usize {
        self.records.iter().filter(|r| r.mode == mode).count()
    }

    pub fn counts(&self) -> Vec<ModeCount> {
        DanceMode::ALL
            .iter()
            .map(|&mode| ModeCount {
                mode,
                count: self.count(mode),
            })
            .collect()
    }

    pub fn bounds(&self, mode: DanceMode) -> Option<LatLonBounds> {
        LatLonBounds::from_points(self.by_mode(mode).into_iter().map(DancerRecord::position))
    }
}
