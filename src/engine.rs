// src/engine.rs
//! Seams to the earth-observation backend: where scenes come from and
//! where exports go. Both are injected so the pipeline can run against a
//! local catalog, a recording stub, or anything else that can serve scenes.

use serde::Serialize;

use crate::config::DateRange;
use crate::error::Result;
use crate::pipeline::modis::TimeSeries;
use crate::raster::Image;
use crate::region::Region;

/// Scenes of `collection` intersecting `region` and acquired in `dates`
#[derive(Debug, Clone)]
pub struct SceneQuery<'a> {
    pub collection: &'a str,
    pub region: &'a Region,
    pub dates: DateRange,
    /// Only these bands, or every band when `None`
    pub bands: Option<Vec<String>>,
}

/// Source of image collections
pub trait SceneSource: Send + Sync {
    /// Scenes matching `query`, ordered by acquisition date
    fn fetch(&self, query: &SceneQuery<'_>) -> Result<Vec<Image>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExportFormat {
    GeoTiff,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::GeoTiff => "tif",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Everything about an export except the data itself
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportParams {
    pub description: String,
    pub folder: String,
    pub file_name_prefix: String,
    /// Region bounds in longitude/latitude, for image exports
    pub region_bounds: Option<(f64, f64, f64, f64)>,
    /// Output resolution in metres, for image exports
    pub scale: Option<f64>,
    pub max_pixels: Option<u64>,
    pub format: ExportFormat,
}

#[derive(Debug, Clone)]
pub enum ExportPayload {
    Image(Image),
    Table(TimeSeries),
}

#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub params: ExportParams,
    pub payload: ExportPayload,
}

/// Handle for an accepted export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTask {
    pub id: usize,
    pub description: String,
}

/// Destination for export jobs. Accepting a job does not mean it completed.
pub trait ExportSink {
    fn submit(&self, request: ExportRequest) -> Result<ExportTask>;
}
