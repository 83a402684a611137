// src/io/reader.rs
use gdal::Dataset;
use rayon::prelude::*;
use std::path::Path;

use crate::error::Result;
use crate::raster::{Band, GeoInfo};

/// Read band 1 of a single-band raster. Nodata and NaN both come back as NaN.
pub fn read_band(path: &Path, name: &str) -> Result<(Band, GeoInfo)> {
    let dataset = Dataset::open(path)?;
    let (width, height) = dataset.raster_size();
    let geo_info = GeoInfo::new(dataset.projection(), dataset.geo_transform()?, width, height);

    let band = dataset.rasterband(1)?;
    let nodata = band.no_data_value();
    let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    let data = match nodata {
        Some(nodata) => {
            let nodata = nodata as f32;
            buffer
                .data()
                .par_iter()
                .map(|&v| if v == nodata { f32::NAN } else { v })
                .collect()
        }
        None => buffer.data().to_vec(),
    };

    Ok((Band::new(name, (width, height), data), geo_info))
}
