// src/processing/scale.rs
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{LstError, Result};
use crate::raster::Image;

/// Affine rescaling `value * gain + offset`
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub gain: f64,
    pub offset: f64,
}

impl LinearScale {
    /// Landsat Collection 2 Level 2 surface reflectance
    pub const LANDSAT_OPTICAL: LinearScale = LinearScale {
        gain: 0.0000275,
        offset: -0.2,
    };

    /// Landsat Collection 2 Level 2 surface temperature (Kelvin)
    pub const LANDSAT_THERMAL: LinearScale = LinearScale {
        gain: 0.00341802,
        offset: 149.0,
    };

    /// MOD11A2 LST to degrees Celsius
    pub const MODIS_LST: LinearScale = LinearScale {
        gain: 0.02,
        offset: -273.15,
    };

    pub fn new(gain: f64, offset: f64) -> Self {
        Self { gain, offset }
    }

    pub fn apply(&self, value: f64) -> f64 {
        value * self.gain + self.offset
    }

    pub fn invert(&self, value: f64) -> f64 {
        (value - self.offset) / self.gain
    }

    /// Rescale every band of `image` in place
    pub fn apply_to_image(&self, image: &mut Image) {
        for band in &mut image.bands {
            *band = band.map(|v| self.apply(v as f64) as f32);
        }
    }
}

/// Scale every band whose name fully matches `pattern`
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ScaleRule {
    pub pattern: String,
    pub scale: LinearScale,
}

impl ScaleRule {
    pub fn new(pattern: impl Into<String>, scale: LinearScale) -> Self {
        Self {
            pattern: pattern.into(),
            scale,
        }
    }

    /// Optical `SR_B.` and thermal `ST_B.*` rules
    pub fn landsat_c2_l2() -> Vec<ScaleRule> {
        vec![
            ScaleRule::new("SR_B.", LinearScale::LANDSAT_OPTICAL),
            ScaleRule::new("ST_B.*", LinearScale::LANDSAT_THERMAL),
        ]
    }

    fn compile(&self) -> Result<Regex> {
        Regex::new(&format!("^(?:{})$", self.pattern))
            .map_err(|e| LstError::InvalidConfig(format!("bad band pattern '{}': {}", self.pattern, e)))
    }
}

/// Apply scale rules to an image, replacing matching bands in place.
/// Bands matched by no rule are left untouched; the first matching rule wins.
pub fn apply_scale_factors(mut image: Image, rules: &[ScaleRule]) -> Result<Image> {
    let compiled = rules
        .iter()
        .map(|rule| Ok((rule.compile()?, rule.scale)))
        .collect::<Result<Vec<_>>>()?;

    let scaled = image
        .bands
        .iter()
        .filter_map(|band| {
            compiled
                .iter()
                .find(|(re, _)| re.is_match(&band.name))
                .map(|(_, scale)| band.map(|v| scale.apply(v as f64) as f32))
        })
        .collect::<Vec<_>>();
    for band in scaled {
        image.replace_band(band)?;
    }
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{Band, GeoInfo};

    #[test]
    fn test_invert_recovers_digital_numbers() {
        for scale in [
            LinearScale::LANDSAT_OPTICAL,
            LinearScale::LANDSAT_THERMAL,
            LinearScale::MODIS_LST,
        ] {
            for dn in [0.0, 1.0, 7273.0, 21_824.0, 43_636.0, 65_535.0] {
                let scaled = scale.apply(dn);
                assert!((scale.invert(scaled) - dn).abs() < 1e-6, "{:?} {}", scale, dn);
            }
        }
    }

    #[test]
    fn test_band_patterns() {
        let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], 1, 1);
        let image = Image::new("s", None, geo)
            .with_band(Band::new("SR_B4", (1, 1), vec![10_000.0]))
            .unwrap()
            .with_band(Band::new("SR_B10", (1, 1), vec![10_000.0]))
            .unwrap()
            .with_band(Band::new("ST_B10", (1, 1), vec![40_000.0]))
            .unwrap()
            .with_band(Band::new("QA_PIXEL", (1, 1), vec![21_824.0]))
            .unwrap();

        let scaled = apply_scale_factors(image, &ScaleRule::landsat_c2_l2()).unwrap();

        let sr = scaled.band("SR_B4").unwrap().data[0] as f64;
        assert!((sr - 0.075).abs() < 1e-6);
        // `SR_B.` matches exactly one trailing character
        assert_eq!(scaled.band("SR_B10").unwrap().data[0], 10_000.0);
        let st = scaled.band("ST_B10").unwrap().data[0] as f64;
        assert!((st - (40_000.0 * 0.00341802 + 149.0)).abs() < 1e-3);
        assert_eq!(scaled.band("QA_PIXEL").unwrap().data[0], 21_824.0);
    }
}
