// src/processing/composite.rs
use rayon::prelude::*;

use crate::error::{LstError, Result};
use crate::raster::{Band, Image};

/// Per-pixel reducer across a stack of scenes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Composite {
    Median,
    Mean,
}

impl Composite {
    fn reduce(&self, values: &mut [f32]) -> f32 {
        if values.is_empty() {
            return f32::NAN;
        }
        match self {
            Composite::Mean => {
                let sum: f64 = values.iter().map(|&v| v as f64).sum();
                (sum / values.len() as f64) as f32
            }
            Composite::Median => {
                values.sort_unstable_by(|a, b| a.total_cmp(b));
                let mid = values.len() / 2;
                if values.len() % 2 == 0 {
                    ((values[mid - 1] as f64 + values[mid] as f64) / 2.0) as f32
                } else {
                    values[mid]
                }
            }
        }
    }
}

/// Reduce co-registered scenes to one image, ignoring masked pixels.
/// Band set and grid come from the first scene; a pixel masked in every
/// scene stays masked.
pub fn composite(scenes: &[Image], reducer: Composite, id: &str) -> Result<Option<Image>> {
    let Some(first) = scenes.first() else {
        return Ok(None);
    };

    for scene in &scenes[1..] {
        if !scene.geo.same_grid(&first.geo) {
            return Err(LstError::GridMismatch {
                expected: first.geo.shape(),
                actual: scene.geo.shape(),
            });
        }
    }

    let mut out = Image::new(id, None, first.geo.clone());
    for name in first.band_names() {
        let stack = scenes
            .iter()
            .map(|scene| scene.band(name).map(|b| b.data.as_slice()))
            .collect::<Result<Vec<_>>>()?;

        let data: Vec<f32> = (0..first.geo.pixel_count())
            .into_par_iter()
            .map_init(
                || Vec::with_capacity(stack.len()),
                |values, i| {
                    values.clear();
                    values.extend(stack.iter().map(|band| band[i]).filter(|v| !v.is_nan()));
                    reducer.reduce(values)
                },
            )
            .collect();

        out.add_band(Band::new(name, first.geo.shape(), data))?;
    }
    Ok(Some(out))
}
