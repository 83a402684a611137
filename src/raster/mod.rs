// src/raster/mod.rs
pub mod band;
pub mod geo_info;
pub mod image;

pub use band::Band;
pub use geo_info::GeoInfo;
pub use image::Image;

/// Metres per degree of latitude, used for grids and bounds in a geographic CRS
pub const METRES_PER_DEGREE: f64 = 111_320.0;

/// NoData written to disk for masked pixels
pub const NODATA_VALUE_FLOAT: f32 = -999.0;
