//! The first version of the dance map kept its dancers grouped by mode with
//! bare social handles:
//!
//! ```json
//! { "salsa": [ { "name": "...", "location": [40.7, -74.0], "country": "USA",
//!                "instagram": "handle", "tiktok": null } ],
//!   "bachata": [ ... ] }
//! ```
//!
//! `convert_legacy` upgrades that shape into validated `DancerRecord`s.

use foundation::DancerId;
use serde::Deserialize;

use crate::dancer::{DanceMode, DancerRecord};
use crate::dataset::{DatasetError, validate_dancers};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LegacyDancer {
    pub name: String,
    /// `[latitude, longitude]` in degrees.
    pub location: [f64; 2],
    pub country: String,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LegacyDataset {
    #[serde(default)]
    pub salsa: Vec<LegacyDancer>,
    #[serde(default)]
    pub bachata: Vec<LegacyDancer>,
}

impl LegacyDataset {
    fn by_mode(&self, mode: DanceMode) -> &[LegacyDancer] {
        match mode {
            DanceMode::Salsa => &self.salsa,
            DanceMode::Bachata => &self.bachata,
        }
    }
}

pub fn instagram_url(handle: &str) -> String {
    format!("https://instagram.com/{}", handle.trim().trim_start_matches('@'))
}

pub fn tiktok_url(handle: &str) -> String {
    format!("https://tiktok.com/@{}", handle.trim().trim_start_matches('@'))
}

fn handle(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|h| !h.is_empty())
}

pub fn parse_legacy(payload: &str) -> Result<LegacyDataset, DatasetError> {
    Ok(serde_json::from_str(payload)?)
}

/// Ids are `<mode>-<n>` with `n` counting from 1 within each mode, salsa
/// first. Profile pictures default to `images/<id>.jpg`.
pub fn convert_legacy(dataset: &LegacyDataset) -> Result<Vec<DancerRecord>, DatasetError> {
    let mut out = Vec::with_capacity(dataset.salsa.len() + dataset.bachata.len());
    for mode in DanceMode::ALL {
        for (i, dancer) in dataset.by_mode(mode).iter().enumerate() {
            let id = format!("{}-{}", mode.as_str(), i + 1);
            out.push(DancerRecord {
                profile_pic: format!("images/{id}.jpg"),
                id: DancerId::new(id),
                name: dancer.name.trim().to_string(),
                mode,
                location: dancer.country.trim().to_string(),
                latitude: dancer.location[0],
                longitude: dancer.location[1],
                instagram: handle(&dancer.instagram).map(instagram_url),
                tiktok: handle(&dancer.tiktok).map(tiktok_url),
            });
        }
    }
    validate_dancers(&out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LEGACY: &str = r#"{
        "salsa": [
            { "name": "Jorge Ataca", "location": [25.7617, -80.1918], "country": "USA",
              "instagram": "ataca_jorge", "tiktok": "ataca_jorge" },
            { "name": "Leon Rose", "location": [51.5074, -0.1278], "country": "UK",
              "instagram": "leonrosesalsa", "tiktok": null }
        ],
        "bachata": [
            { "name": "Nery y Giana", "location": [35.6762, 139.6503], "country": "Japan",
              "instagram": "neryygiana" }
        ]
    }"#;

    #[test]
    fn converts_handles_to_profile_urls() {
        let records = convert_legacy(&parse_legacy(LEGACY).unwrap()).unwrap();
        assert_eq!(records.len(), 3);

        let jorge = &records[0];
        assert_eq!(jorge.id.as_str(), "salsa-1");
        assert_eq!(jorge.location, "USA");
        assert_eq!(jorge.instagram.as_deref(), Some("https://instagram.com/ataca_jorge"));
        assert_eq!(jorge.tiktok.as_deref(), Some("https://tiktok.com/@ataca_jorge"));
        assert_eq!(jorge.profile_pic, "images/salsa-1.jpg");

        assert_eq!(records[1].tiktok, None);
        assert_eq!(records[2].id.as_str(), "bachata-1");
        assert_eq!(records[2].mode, DanceMode::Bachata);
        assert_eq!(records[2].position().lon_deg, 139.6503);
    }

    #[test]
    fn missing_mode_lists_are_empty() {
        let records = convert_legacy(&parse_legacy(r#"{"bachata": []}"#).unwrap()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn strips_leading_at_from_handles() {
        assert_eq!(tiktok_url("@neryygiana"), "https://tiktok.com/@neryygiana");
        assert_eq!(instagram_url(" @x "), "https://instagram.com/x");
    }

    #[test]
    fn invalid_legacy_coordinates_are_rejected() {
        let bad = r#"{"salsa":[{"name":"X","location":[120.0,0.0],"country":"?"}]}"#;
        let err = convert_legacy(&parse_legacy(bad).unwrap()).unwrap_err();
        assert!(matches!(err, DatasetError::Invalid { .. }));
    }
}
