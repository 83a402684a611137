// src/error.rs
use thiserror::Error;

/// Errors raised by the study pipeline
#[derive(Error, Debug)]
pub enum LstError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("No feature with {attribute} = '{value}' in boundary collection")]
    RegionNotFound { attribute: String, value: String },

    #[error("{count} features match {attribute} = '{value}', expected exactly one")]
    AmbiguousRegion {
        attribute: String,
        value: String,
        count: usize,
    },

    #[error("Region '{0}' has no polygon geometry")]
    InvalidRegionGeometry(String),

    #[error("No valid pixels in the {year} composite")]
    EmptyComposite { year: i32 },

    #[error("NDVI range collapsed to a single value ({value}) for {year}")]
    DegenerateNdviRange { year: i32, value: f64 },

    #[error("Band '{band}' not found in image '{image}'")]
    MissingBand { band: String, image: String },

    #[error("Grid mismatch: expected {expected:?}, got {actual:?}")]
    GridMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("Region does not overlap the grid of '{image}'")]
    OutsideGrid { image: String },

    #[error("Too many pixels: {pixels} exceeds the ceiling of {max_pixels}")]
    PixelBudgetExceeded { pixels: u64, max_pixels: u64 },

    #[error("Export '{description}' rejected: {reason}")]
    ExportRejected { description: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, LstError>;
