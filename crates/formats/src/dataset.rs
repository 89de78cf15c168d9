use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::dancer::DancerRecord;

#[derive(Debug)]
pub enum DatasetError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { id: String, reason: String },
    DuplicateId(String),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(err) => write!(f, "I/O error: {err}"),
            DatasetError::Parse(err) => write!(f, "dataset parse error: {err}"),
            DatasetError::Invalid { id, reason } => {
                write!(f, "invalid dancer record {id:?}: {reason}")
            }
            DatasetError::DuplicateId(id) => write!(f, "duplicate dancer id: {id:?}"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Io(err) => Some(err),
            DatasetError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::Io(err)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(err: serde_json::Error) -> Self {
        DatasetError::Parse(err)
    }
}

pub fn load_dancers_from_path(path: impl AsRef<Path>) -> Result<Vec<DancerRecord>, DatasetError> {
    let payload = fs::read_to_string(path.as_ref())?;
    parse_dancers(&payload)
}

/// Parses and validates a JSON array of dancer records.
pub fn parse_dancers(payload: &str) -> Result<Vec<DancerRecord>, DatasetError> {
    let records: Vec<DancerRecord> = serde_json::from_str(payload)?;
    validate_dancers(&records)?;
    Ok(records)
}

/// Checks the invariants every consumer of the dataset relies on.
///
/// - ids and names are non-empty, ids are unique
/// - latitude is finite and within [-90, 90]
/// - longitude is finite and within [-180, 180]
pub fn validate_dancers(records: &[DancerRecord]) -> Result<(), DatasetError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(records.len());
    for record in records {
        let id = record.id.as_str();
        let invalid = |reason: &str| DatasetError::Invalid {
            id: id.to_string(),
            reason: reason.to_string(),
        };

        if id.trim().is_empty() {
            return Err(invalid("empty id"));
        }
        if record.name.trim().is_empty() {
            return Err(invalid("empty name"));
        }
        if !record.latitude.is_finite() || !(-90.0..=90.0).contains(&record.latitude) {
            return Err(invalid("latitude out of range"));
        }
        if !record.longitude.is_finite() || !(-180.0..=180.0).contains(&record.longitude) {
            return Err(invalid("longitude out of range"));
        }
        if !seen.insert(id) {
            return Err(DatasetError::DuplicateId(id.to_string()));
        }
    }
    Ok(())
}
