// src/processing/indices/ndi.rs
use rayon::prelude::*;

use crate::processing::parallel::IndexCalculator;
use crate::raster::Band;

/// Normalized difference of two values; `None` when the sum is zero
pub fn normalized_difference(a: f32, b: f32) -> Option<f32> {
    let sum = a + b;
    if sum != 0.0 {
        Some((a - b) / sum)
    } else {
        None
    }
}

/// Normalized Difference Index (NDI) calculator: (A-B)/(A+B)
pub struct NDI {
    band_a_index: usize,
    band_b_index: usize,
    name: String,
}

impl NDI {
    pub fn new(band_a_index: usize, band_b_index: usize, name: Option<String>) -> Self {
        Self {
            band_a_index,
            band_b_index,
            name: name.unwrap_or_else(|| "NDI".to_string()),
        }
    }

    /// NDVI from inputs ordered (NIR, RED)
    pub fn ndvi() -> Self {
        Self::new(0, 1, Some("NDVI".to_string()))
    }
}

impl IndexCalculator for NDI {
    fn calculate(&self, inputs: &[&Band]) -> Band {
        let a = inputs[self.band_a_index];
        let b = inputs[self.band_b_index];

        let data = a
            .data
            .par_iter()
            .zip(b.data.par_iter())
            .map(|(&a_val, &b_val)| {
                // NaN in either band propagates as masked
                normalized_difference(a_val, b_val).unwrap_or(f32::NAN)
            })
            .collect();

        Band::new(self.name.clone(), a.shape(), data)
    }

    fn required_bands(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        &self.name
    }
}
