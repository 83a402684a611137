// src/processing/parallel.rs
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{LstError, Result};
use crate::raster::{Band, Image};

/// Runs index calculators on image bands inside a dedicated rayon pool
pub struct ParallelProcessor {
    threads: usize,
    pool: Option<ThreadPool>,
}

impl ParallelProcessor {
    /// `None` uses the global rayon pool
    pub fn new(threads: Option<usize>) -> Self {
        let pool = threads.and_then(|n| ThreadPoolBuilder::new().num_threads(n).build().ok());
        let threads = threads.unwrap_or_else(rayon::current_num_threads);

        Self { threads, pool }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `op` inside this processor's pool
    pub fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    /// Calculate an index from the named bands of `image`
    pub fn process<I: IndexCalculator>(&self, calculator: &I, image: &Image, bands: &[&str]) -> Result<Band> {
        if bands.len() < calculator.required_bands() {
            return Err(LstError::InvalidConfig(format!(
                "Not enough input bands for {}. Required: {}, provided: {}",
                calculator.name(),
                calculator.required_bands(),
                bands.len()
            )));
        }

        let inputs = bands
            .iter()
            .map(|name| image.band(name))
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Calculating {} from {:?} on {}x{} pixels",
            calculator.name(),
            bands,
            image.geo.width,
            image.geo.height
        );

        let result = self.install(|| calculator.calculate(&inputs));
        Ok(result.renamed(calculator.name()))
    }
}

/// Trait for per-pixel index calculators
pub trait IndexCalculator: Send + Sync {
    /// Calculate the index from the provided input bands (same grid)
    fn calculate(&self, inputs: &[&Band]) -> Band;

    /// Return the number of required input bands
    fn required_bands(&self) -> usize;

    /// Return the name of the output band
    fn name(&self) -> &str;
}
