// src/processing/reduce.rs
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{LstError, Result};
use crate::raster::{Band, GeoInfo};

/// Sampling scale (metres) and pixel ceiling of a regional reduction
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
pub struct ReduceParams {
    pub scale: f64,
    pub max_pixels: u64,
}

/// Regional reducer producing a single scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionReducer {
    Min,
    Max,
    Mean,
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    const EMPTY: Accumulator = Accumulator {
        count: 0,
        sum: 0.0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    fn push(mut self, v: f64) -> Self {
        self.count += 1;
        self.sum += v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
        self
    }

    fn merge(self, other: Self) -> Self {
        Accumulator {
            count: self.count + other.count,
            sum: self.sum + other.sum,
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// Sampling stride for a reduction at `scale` metres on `geo`
fn stride_for(geo: &GeoInfo, scale: f64) -> usize {
    let pixel = geo.pixel_size_m();
    if pixel <= 0.0 || scale <= pixel {
        1
    } else {
        (scale / pixel).round().max(1.0) as usize
    }
}

/// Reduce the unmasked pixels of `band` inside `region` (same grid) to one value.
///
/// Returns `Ok(None)` when no valid pixel is sampled. Fails with
/// `PixelBudgetExceeded` when the sampled region is larger than `max_pixels`.
pub fn reduce_region(
    band: &Band,
    geo: &GeoInfo,
    region: Option<&[bool]>,
    reducer: RegionReducer,
    params: &ReduceParams,
) -> Result<Option<f64>> {
    let stride = stride_for(geo, params.scale);
    let (width, height) = band.shape();

    let rows: Vec<usize> = (0..height).step_by(stride).collect();
    let (sampled, acc) = rows
        .par_iter()
        .map(|&row| {
            let mut sampled = 0u64;
            let mut acc = Accumulator::EMPTY;
            for col in (0..width).step_by(stride) {
                let i = row * width + col;
                if region.map_or(true, |mask| mask[i]) {
                    sampled += 1;
                    let v = band.data[i];
                    if !v.is_nan() {
                        acc = acc.push(v as f64);
                    }
                }
            }
            (sampled, acc)
        })
        .reduce(
            || (0, Accumulator::EMPTY),
            |(sa, a), (sb, b)| (sa + sb, a.merge(b)),
        );

    if sampled > params.max_pixels {
        return Err(LstError::PixelBudgetExceeded {
            pixels: sampled,
            max_pixels: params.max_pixels,
        });
    }

    if acc.count == 0 {
        return Ok(None);
    }

    Ok(Some(match reducer {
        RegionReducer::Min => acc.min,
        RegionReducer::Max => acc.max,
        RegionReducer::Mean => acc.sum / acc.count as f64,
    }))
}
