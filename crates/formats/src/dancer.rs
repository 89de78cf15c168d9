use std::fmt;
use std::str::FromStr;

use foundation::DancerId;
use foundation::math::LatLon;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum DanceMode {
    #[default]
    Salsa,
    Bachata,
}

impl DanceMode {
    pub const ALL: [DanceMode; 2] = [DanceMode::Salsa, DanceMode::Bachata];

    pub fn as_str(self) -> &'static str {
        match self {
            DanceMode::Salsa => "salsa",
            DanceMode::Bachata => "bachata",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DanceMode::Salsa => "Salsa",
            DanceMode::Bachata => "Bachata",
        }
    }
}

impl fmt::Display for DanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDanceMode(pub String);

impl fmt::Display for UnknownDanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown dance mode: {:?} (expected salsa or bachata)", self.0)
    }
}

impl std::error::Error for UnknownDanceMode {}

impl FromStr for DanceMode {
    type Err = UnknownDanceMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "salsa" => Ok(DanceMode::Salsa),
            "bachata" => Ok(DanceMode::Bachata),
            _ => Err(UnknownDanceMode(s.to_string())),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Instagram,
    Tiktok,
}

impl SocialPlatform {
    pub fn label(self) -> &'static str {
        match self {
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Tiktok => "TikTok",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: SocialPlatform,
    pub url: String,
}

/// One entry of the dancer dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DancerRecord {
    pub id: DancerId,
    pub name: String,
    #[serde(rename = "type")]
    pub mode: DanceMode,
    /// Free-text place label, e.g. "New York, USA".
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub profile_pic: String,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub tiktok: Option<String>,
}

impl DancerRecord {
    pub fn position(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// Present social links, Instagram first.
    pub fn social_links(&self) -> Vec<SocialLink> {
        let mut links = Vec::with_capacity(2);
        for (platform, url) in [
            (SocialPlatform::Instagram, &self.instagram),
            (SocialPlatform::Tiktok, &self.tiktok),
        ] {
            let Some(url) = url.as_deref().map(str::trim) else {
                continue;
            };
            if url.is_empty() {
                continue;
            }
            links.push(SocialLink {
                platform,
                url: url.to_string(),
            });
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record_json() -> &'static str {
        r#"{
            "id": "salsa-1",
            "name": "Adolfo Indacochea",
            "type": "salsa",
            "location": "New York, USA",
            "latitude": 40.7128,
            "longitude": -74.006,
            "profilePic": "/images/adolfo.jpg",
            "instagram": "https://instagram.com/adolfoindacochea",
            "tiktok": null
        }"#
    }

    #[test]
    fn parses_camel_case_record() {
        let record: DancerRecord = serde_json::from_str(record_json()).unwrap();
        assert_eq!(record.id, DancerId::new("salsa-1"));
        assert_eq!(record.mode, DanceMode::Salsa);
        assert_eq!(record.profile_pic, "/images/adolfo.jpg");
        assert_eq!(record.position(), LatLon::new(40.7128, -74.006));
        assert_eq!(record.tiktok, None);
    }

    #[test]
    fn social_links_are_optional_and_ordered() {
        let mut record: DancerRecord = serde_json::from_str(record_json()).unwrap();
        record.tiktok = Some("https://tiktok.com/@x".into());
        record.instagram = Some("   ".into());
        assert_eq!(
            record.social_links(),
            vec![SocialLink {
                platform: SocialPlatform::Tiktok,
                url: "https://tiktok.com/@x".into(),
            }]
        );
    }

    #[test]
    fn missing_social_fields_default_to_none() {
        let json = r#"{"id":"b","name":"B","type":"bachata","location":"Lima",
            "latitude":-12.0,"longitude":-77.0,"profilePic":"b.jpg"}"#;
        let record: DancerRecord = serde_json::from_str(json).unwrap();
        assert!(record.social_links().is_empty());
    }

    #[test]
    fn dance_mode_parses_case_insensitively() {
        assert_eq!("Bachata".parse::<DanceMode>().unwrap(), DanceMode::Bachata);
        assert_eq!(" salsa ".parse::<DanceMode>().unwrap(), DanceMode::Salsa);
        assert!("tango".parse::<DanceMode>().is_err());
    }

    #[test]
    fn dance_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DanceMode::Bachata).unwrap(), "\"bachata\"");
    }
}
