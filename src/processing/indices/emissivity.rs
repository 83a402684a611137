// src/processing/indices/emissivity.rs
use rayon::prelude::*;

use crate::processing::parallel::IndexCalculator;
use crate::raster::Band;

/// Emissivity of bare soil (PV = 0)
pub const SOIL_EMISSIVITY: f64 = 0.986;
/// Emissivity gain from bare soil to full vegetation cover
pub const VEGETATION_EMISSIVITY_GAIN: f64 = 0.004;

/// Regional NDVI extremes used to normalise NDVI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NdviRange {
    pub min: f64,
    pub max: f64,
}

/// Proportion of vegetation: ((ndvi - min) / (max - min))^2, clamped to [0, 1]
pub fn proportion_of_vegetation(ndvi: f64, range: NdviRange) -> f64 {
    let normalized = (ndvi - range.min) / (range.max - range.min);
    normalized.clamp(0.0, 1.0).powi(2)
}

/// Surface emissivity from proportion of vegetation
pub fn emissivity_from_pv(pv: f64) -> f64 {
    pv * VEGETATION_EMISSIVITY_GAIN + SOIL_EMISSIVITY
}

/// PV band from an NDVI band
pub struct VegetationProportion {
    range: NdviRange,
}

impl VegetationProportion {
    /// `range.max` must be greater than `range.min`
    pub fn new(range: NdviRange) -> Self {
        Self { range }
    }
}

impl IndexCalculator for VegetationProportion {
    fn calculate(&self, inputs: &[&Band]) -> Band {
        let ndvi = inputs[0];
        let data = ndvi
            .data
            .par_iter()
            .map(|&v| {
                if v.is_nan() {
                    f32::NAN
                } else {
                    proportion_of_vegetation(v as f64, self.range) as f32
                }
            })
            .collect();
        Band::new("PV", ndvi.shape(), data)
    }

    fn required_bands(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "PV"
    }
}

/// EM band from a PV band
pub struct Emissivity;

impl IndexCalculator for Emissivity {
    fn calculate(&self, inputs: &[&Band]) -> Band {
        inputs[0].map(|pv| emissivity_from_pv(pv as f64) as f32)
    }

    fn required_bands(&self) -> usize {
        1
    }

    fn name(&self) -> &str {
        "EM"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: NdviRange = NdviRange { min: -0.2, max: 0.8 };

    #[test]
    fn test_pv_bounds() {
        assert_eq!(proportion_of_vegetation(-0.2, RANGE), 0.0);
        assert_eq!(proportion_of_vegetation(0.8, RANGE), 1.0);
        for i in 0..=100 {
            let ndvi = -0.2 + i as f64 * 0.01;
            let pv = proportion_of_vegetation(ndvi, RANGE);
            assert!((0.0..=1.0).contains(&pv), "pv {} for ndvi {}", pv, ndvi);
        }
        assert!((proportion_of_vegetation(0.3, RANGE) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_emissivity_endpoints() {
        assert!((emissivity_from_pv(0.0) - 0.986).abs() < 1e-12);
        assert!((emissivity_from_pv(1.0) - 0.990).abs() < 1e-12);
    }

    #[test]
    fn test_pv_keeps_mask() {
        let ndvi = Band::new("NDVI", (2, 1), vec![0.3, f32::NAN]);
        let pv = VegetationProportion::new(RANGE).calculate(&[&ndvi]);
        assert!((pv.data[0] - 0.25).abs() < 1e-6);
        assert!(pv.data[1].is_nan());
        let em = Emissivity.calculate(&[&pv]);
        assert!((em.data[0] - 0.987).abs() < 1e-6);
        assert!(em.data[1].is_nan());
    }
}
