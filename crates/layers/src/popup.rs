use formats::{DancerRecord, SocialLink};
use foundation::DancerId;
use foundation::math::LatLon;
use serde::Serialize;

/// Icon shown in place of the profile photo when it fails to load.
pub const PROFILE_FALLBACK_ICON: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupOptions {
    /// Public base path relative image references are resolved against.
    pub base_url: String,
    /// Narrow-screen layout: adds a "center on map" action.
    pub compact: bool,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            base_url: "/".to_string(),
            compact: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileImage {
    pub url: String,
    pub alt: String,
    pub fallback_icon: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopupLink {
    pub label: &'static str,
    #[serde(flatten)]
    pub link: SocialLink,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupContent {
    pub dancer: DancerId,
    pub title: String,
    pub location: String,
    pub image: ProfileImage,
    pub links: Vec<PopupLink>,
    /// A lone Instagram button is centred.
    pub links_centered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_on: Option<LatLon>,
}

impl PopupContent {
    /// Missing images are not probed up front; the renderer swaps in
    /// `image.fallback_icon` when the image fails to load.
    pub fn for_dancer(dancer: &DancerRecord, options: &PopupOptions) -> Self {
        let links: Vec<PopupLink> = dancer
            .social_links()
            .into_iter()
            .map(|link| PopupLink {
                label: link.platform.label(),
                link,
            })
            .collect();
        let has_instagram = dancer.instagram.as_deref().is_some_and(|s| !s.trim().is_empty());
        let has_tiktok = dancer.tiktok.as_deref().is_some_and(|s| !s.trim().is_empty());

        PopupContent {
            dancer: dancer.id.clone(),
            title: dancer.name.clone(),
            location: dancer.location.clone(),
            image: ProfileImage {
                url: resolve_asset_url(&options.base_url, &dancer.profile_pic),
                alt: format!("{} - Profile Photo", dancer.name),
                fallback_icon: PROFILE_FALLBACK_ICON,
            },
            links,
            links_centered: has_instagram && !has_tiktok,
            center_on: options.compact.then(|| dancer.position()),
        }
    }
}

/// Absolute `http(s)` references pass through; anything else is joined to
/// `base_url` with at most one leading `/` removed.
pub fn resolve_asset_url(base_url: &str, reference: &str) -> String {
    if reference.starts_with("http") {
        return reference.to_string();
    }
    let relative = reference.strip_prefix('/').unwrap_or(reference);
    if base_url.ends_with('/') {
        format!("{base_url}{relative}")
    } else {
        format!("{base_url}/{relative}")
    }
}
