use formats::DanceMode;
use serde::Serialize;

/// Visual identity of one dance mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ModeStyle {
    pub mode: DanceMode,
    /// CSS colour of the marker dot, legend swatch and active toggle.
    pub marker_color: &'static str,
    pub legend_label: &'static str,
    /// CSS filter applied to base map tiles.
    pub tile_filter: &'static str,
    pub tile_filter_dark: &'static str,
}

impl ModeStyle {
    pub const fn for_mode(mode: DanceMode) -> Self {
        match mode {
            DanceMode::Salsa => ModeStyle {
                mode,
                marker_color: "hsl(0 75% 60%)",
                legend_label: "Salsa Dancers",
                tile_filter: "hue-rotate(350deg) saturate(0.9)",
                tile_filter_dark: "hue-rotate(350deg) saturate(0.8) brightness(0.7)",
            },
            DanceMode::Bachata => ModeStyle {
                mode,
                marker_color: "hsl(280 65% 58%)",
                legend_label: "Bachata Dancers",
                tile_filter: "hue-rotate(260deg) saturate(0.9)",
                tile_filter_dark: "hue-rotate(260deg) saturate(0.8) brightness(0.7)",
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct MarkerIcon {
    pub size_px: [f64; 2],
    /// Pixel of the icon that sits on the marker position.
    pub anchor_px: [f64; 2],
    /// Popup tip offset relative to the anchor.
    pub popup_anchor_px: [f64; 2],
    pub border_px: f64,
    pub border_color: &'static str,
    pub color: &'static str,
}

impl MarkerIcon {
    pub const fn for_mode(mode: DanceMode) -> Self {
        MarkerIcon {
            size_px: [24.0, 24.0],
            anchor_px: [12.0, 12.0],
            popup_anchor_px: [-11.0, -20.0],
            border_px: 3.0,
            border_color: "white",
            color: ModeStyle::for_mode(mode).marker_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Legend {
    pub label: &'static str,
    pub color: &'static str,
    pub hint: &'static str,
}

impl Legend {
    pub fn for_mode(mode: DanceMode) -> Self {
        let style = ModeStyle::for_mode(mode);
        Legend {
            label: style.legend_label,
            color: style.marker_color,
            hint: "Tap markers for details",
        }
    }
}
