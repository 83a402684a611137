// src/render/legend.rs
use serde::Serialize;

use super::palette::Palette;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

/// Stepped color legend, one swatch per palette color
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub position: String,
    pub entries: Vec<LegendEntry>,
}

impl Legend {
    /// Swatch `i` is labelled `min + i * (max - min) / (n - 1)`, two decimals
    pub fn stepped(title: impl Into<String>, palette: &Palette, min: f64, max: f64) -> Self {
        let steps = palette.len().saturating_sub(1).max(1);
        let step = (max - min) / steps as f64;
        let entries = palette
            .colors
            .iter()
            .enumerate()
            .map(|(i, color)| LegendEntry {
                color: color.hex(),
                label: format!("{:.2}", min + i as f64 * step),
            })
            .collect();

        Self {
            title: title.into(),
            position: "bottom-right".to_string(),
            entries,
        }
    }

    pub fn lst(palette: &Palette, min: f64, max: f64) -> Self {
        Self::stepped("Land Surface Temperature (°C)", palette, min, max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleOverlay {
    pub text: String,
    pub position: String,
}

impl TitleOverlay {
    pub fn for_study(region: &str, years: &str) -> Self {
        Self {
            text: format!("Land Surface Temperature - {} ({})", region, years),
            position: "top-center".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lst_legend() {
        let legend = Legend::lst(&Palette::lst(), 15.0, 45.0);
        assert_eq!(legend.entries.len(), 29);
        assert_eq!(legend.entries[0].label, "15.00");
        assert_eq!(legend.entries[1].label, "16.07");
        assert_eq!(legend.entries[14].label, "30.00");
        assert_eq!(legend.entries[28].label, "45.00");
        assert_eq!(legend.entries[0].color, "#040274");
        assert_eq!(legend.title, "Land Surface Temperature (°C)");
    }

    #[test]
    fn test_title() {
        let title = TitleOverlay::for_study("Alicante", "2014–2023");
        assert_eq!(title.text, "Land Surface Temperature - Alicante (2014–2023)");
    }
}
