// src/io/writer.rs
use gdal::raster::{Buffer, RasterCreationOptions};
use gdal::{DriverManager, Metadata};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::config::ExportConfig;
use crate::error::Result;
use crate::raster::{GeoInfo, Image, NODATA_VALUE_FLOAT};
use crate::render::RgbRaster;

/// GeoTIFF creation options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub compress: String,
    pub compress_level: u8,
    pub tiled: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: "DEFLATE".to_string(),
            compress_level: 6,
            tiled: true,
        }
    }
}

impl From<&ExportConfig> for WriteOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            compress: config.compress.clone(),
            compress_level: config.compress_level,
            tiled: config.tiled,
        }
    }
}

impl WriteOptions {
    fn creation_options(&self) -> RasterCreationOptions {
        let mut options = vec![
            format!("COMPRESS={}", self.compress),
            "NUM_THREADS=ALL_CPUS".to_string(),
        ];
        if self.compress.eq_ignore_ascii_case("DEFLATE") {
            options.push(format!("ZLEVEL={}", self.compress_level));
        }
        if self.tiled {
            options.push("TILED=YES".to_string());
        }
        RasterCreationOptions::from_iter(options.iter().map(String::as_str))
    }
}

/// Write every band of `image` as float32 with nodata -999.
/// Band descriptions carry the band names.
pub fn write_image(image: &Image, output_path: &Path, options: &WriteOptions) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let geo_info = &image.geo;

    let mut out_ds = driver.create_with_band_type_with_options::<f32, _>(
        output_path,
        geo_info.width,
        geo_info.height,
        image.bands.len(),
        &options.creation_options(),
    )?;
    set_grid(&mut out_ds, geo_info)?;
    out_ds.set_description(&image.id)?;

    for (idx, band) in image.bands.iter().enumerate() {
        let mut out_band = out_ds.rasterband(idx + 1)?;
        out_band.set_no_data_value(Some(NODATA_VALUE_FLOAT as f64))?;
        out_band.set_description(&band.name)?;

        let data = band
            .data
            .iter()
            .map(|&v| if v.is_nan() { NODATA_VALUE_FLOAT } else { v })
            .collect();
        let mut buffer = Buffer::new((band.width, band.height), data);
        out_band.write((0, 0), (band.width, band.height), &mut buffer)?;
    }

    out_ds.flush_cache()?;
    debug!("Wrote {} ({} bands) to {}", image.id, image.bands.len(), output_path.display());
    Ok(())
}

/// Write an 8-bit RGB rendering
pub fn write_rgb(raster: &RgbRaster, output_path: &Path) -> Result<()> {
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let geo_info = &raster.geo;
    let options = RasterCreationOptions::from_iter(["COMPRESS=DEFLATE", "PHOTOMETRIC=RGB"]);

    let mut out_ds = driver.create_with_band_type_with_options::<u8, _>(
        output_path,
        geo_info.width,
        geo_info.height,
        3,
        &options,
    )?;
    set_grid(&mut out_ds, geo_info)?;

    for (idx, (name, channel)) in [("red", &raster.red), ("green", &raster.green), ("blue", &raster.blue)]
        .into_iter()
        .enumerate()
    {
        let mut out_band = out_ds.rasterband(idx + 1)?;
        out_band.set_description(name)?;
        let mut buffer = Buffer::new((geo_info.width, geo_info.height), channel.clone());
        out_band.write((0, 0), (geo_info.width, geo_info.height), &mut buffer)?;
    }

    out_ds.flush_cache()?;
    Ok(())
}

fn set_grid(out_ds: &mut gdal::Dataset, geo_info: &GeoInfo) -> Result<()> {
    if !geo_info.projection.is_empty() {
        out_ds.set_projection(&geo_info.projection)?;
    }
    out_ds.set_geo_transform(&geo_info.geo_transform)?;
    Ok(())
}
