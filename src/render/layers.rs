// src/render/layers.rs
use serde::Serialize;

use super::legend::{Legend, TitleOverlay};
use super::palette::{Palette, Rgb};
use crate::error::{LstError, Result};
use crate::raster::{GeoInfo, Image};

/// Display parameters of a map layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<String>>,
    pub min: f64,
    pub max: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub palette: Option<Vec<String>>,
}

/// A named layer and the image it displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub name: String,
    pub source: String,
    pub vis: VisParams,
}

/// A layer paired with its image, for quicklook rendering
#[derive(Debug, Clone)]
pub struct Layer<'a> {
    pub spec: LayerSpec,
    pub image: &'a Image,
}

/// Everything a map viewer needs: layers in draw order, legend, title
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayout {
    pub title: TitleOverlay,
    pub legend: Legend,
    pub region: String,
    pub center: (f64, f64),
    pub zoom: u8,
    pub layers: Vec<LayerSpec>,
}

/// 8-bit RGB rendering of a layer on the image grid
#[derive(Debug, Clone, PartialEq)]
pub struct RgbRaster {
    pub geo: GeoInfo,
    pub red: Vec<u8>,
    pub green: Vec<u8>,
    pub blue: Vec<u8>,
}

fn stretch(value: f32, min: f64, max: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (((value as f64 - min) / (max - min)).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Render a layer the way a map viewer would: palette ramp for one band,
/// min/max stretch per channel for three. Masked pixels are black.
pub fn render_quicklook(image: &Image, vis: &VisParams) -> Result<RgbRaster> {
    let names: Vec<&str> = match &vis.bands {
        Some(bands) => bands.iter().map(String::as_str).collect(),
        None => image.band_names(),
    };
    let n = image.geo.pixel_count();

    if let Some(colors) = &vis.palette {
        let palette = Palette::from_strs(colors)?;
        let band = image.band(names.first().copied().unwrap_or_default())?;
        let mut out = RgbRaster {
            geo: image.geo.clone(),
            red: vec![0; n],
            green: vec![0; n],
            blue: vec![0; n],
        };
        for (i, &v) in band.data.iter().enumerate() {
            let Rgb { r, g, b } = palette
                .colorize(v as f64, vis.min, vis.max)
                .unwrap_or(Rgb::new(0, 0, 0));
            out.red[i] = r;
            out.green[i] = g;
            out.blue[i] = b;
        }
        return Ok(out);
    }

    let channels = match names.len() {
        1 => [names[0], names[0], names[0]],
        3 => [names[0], names[1], names[2]],
        count => {
            return Err(LstError::InvalidConfig(format!(
                "layer needs 1 or 3 bands without a palette, got {}",
                count
            )))
        }
    };
    let [r, g, b] = channels.map(|name| {
        image
            .band(name)
            .map(|band| band.data.iter().map(|&v| stretch(v, vis.min, vis.max)).collect::<Vec<u8>>())
    });

    Ok(RgbRaster {
        geo: image.geo.clone(),
        red: r?,
        green: g?,
        blue: b?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Band;

    fn image() -> Image {
        let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], 2, 1);
        Image::new("i", None, geo)
            .with_band(Band::new("SR_B4", (2, 1), vec![0.15, f32::NAN]))
            .unwrap()
            .with_band(Band::new("SR_B3", (2, 1), vec![0.075, 0.0]))
            .unwrap()
            .with_band(Band::new("SR_B2", (2, 1), vec![0.0, 0.3]))
            .unwrap()
    }

    #[test]
    fn test_true_color_stretch() {
        let vis = VisParams {
            bands: Some(vec!["SR_B4".into(), "SR_B3".into(), "SR_B2".into()]),
            min: 0.0,
            max: 0.15,
            palette: None,
        };
        let rgb = render_quicklook(&image(), &vis).unwrap();
        assert_eq!(rgb.red, vec![255, 0]);
        assert_eq!(rgb.green, vec![128, 0]);
        assert_eq!(rgb.blue, vec![0, 255]);
    }

    #[test]
    fn test_palette_layer() {
        let vis = VisParams {
            bands: Some(vec!["SR_B2".into()]),
            min: 0.0,
            max: 0.3,
            palette: Some(vec!["blue".into(), "white".into(), "green".into()]),
        };
        let rgb = render_quicklook(&image(), &vis).unwrap();
        assert_eq!((rgb.red[0], rgb.green[0], rgb.blue[0]), (0, 0, 255));
        assert_eq!((rgb.red[1], rgb.green[1], rgb.blue[1]), (0, 128, 0));
    }
}
