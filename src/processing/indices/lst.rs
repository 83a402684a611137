// src/processing/indices/lst.rs
use rayon::prelude::*;

use crate::processing::parallel::IndexCalculator;
use crate::raster::Band;

/// Effective wavelength of Landsat 8 band 10 (cm)
pub const EMITTED_WAVELENGTH: f64 = 0.00115;
/// h*c/k (cm K)
pub const RHO: f64 = 1.438;
pub const KELVIN_OFFSET: f64 = 273.15;

/// LST in degrees Celsius from brightness temperature (K) and emissivity
pub fn land_surface_temperature(tb: f64, emissivity: f64) -> f64 {
    tb / (1.0 + (EMITTED_WAVELENGTH * (tb / RHO)) * emissivity.ln()) - KELVIN_OFFSET
}

/// LST calculator, inputs ordered (thermal, emissivity)
pub struct LandSurfaceTemperature {
    thermal_index: usize,
    emissivity_index: usize,
    name: String,
}

impl LandSurfaceTemperature {
    pub fn new(thermal_index: usize, emissivity_index: usize, name: Option<String>) -> Self {
        Self {
            thermal_index,
            emissivity_index,
            name: name.unwrap_or_else(|| "LST".to_string()),
        }
    }
}

impl IndexCalculator for LandSurfaceTemperature {
    fn calculate(&self, inputs: &[&Band]) -> Band {
        let thermal = inputs[self.thermal_index];
        let em = inputs[self.emissivity_index];

        let data = thermal
            .data
            .par_iter()
            .zip(em.data.par_iter())
            .map(|(&tb, &e)| {
                if tb.is_nan() || e.is_nan() {
                    f32::NAN
                } else {
                    land_surface_temperature(tb as f64, e as f64) as f32
                }
            })
            .collect();

        Band::new(self.name.clone(), thermal.shape(), data)
    }

    fn required_bands(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        &self.name
    }
}
