// src/utils/cache.rs
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::io::reader::read_band;
use crate::raster::{Band, GeoInfo};

type CachedBand = Arc<(Band, GeoInfo)>;

/// Thread-safe cache of bands already read from disk, keyed by path
#[derive(Default)]
pub struct RasterCache {
    bands: Mutex<HashMap<PathBuf, CachedBand>>,
}

impl RasterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Band at `path`, read on first use. The cached band keeps the name
    /// it was first read under.
    pub fn get_band<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<CachedBand> {
        let path_buf = path.as_ref().to_path_buf();

        if let Some(band) = self.bands.lock().get(&path_buf) {
            return Ok(Arc::clone(band));
        }

        // Read outside the lock so other bands load in parallel
        let band = Arc::new(read_band(&path_buf, name)?);
        let mut cache = self.bands.lock();
        let entry = cache.entry(path_buf).or_insert(band);
        Ok(Arc::clone(entry))
    }

    pub fn clear(&self) {
        self.bands.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.bands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
