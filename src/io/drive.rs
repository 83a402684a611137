// src/io/drive.rs
use flume::Sender;
use serde::Serialize;
use std::fs;
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

use super::table::write_time_series;
use super::writer::{write_image, WriteOptions};
use crate::engine::{ExportFormat, ExportParams, ExportPayload, ExportRequest, ExportSink, ExportTask};
use crate::error::{LstError, Result};
use crate::processing::resample::{resample_nearest, target_grid};
use crate::raster::METRES_PER_DEGREE;
use crate::region::Region;

struct ExportJob {
    task: ExportTask,
    path: PathBuf,
    request: ExportRequest,
}

/// Outcome of one accepted export
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportOutcome {
    pub id: usize,
    pub description: String,
    pub path: PathBuf,
    /// `None` when the file was written
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExportReport {
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    pub fn completed(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_none())
    }

    pub fn failed(&self) -> impl Iterator<Item = &ExportOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// Export sink writing `<root>/<folder>/<prefix>.{tif,csv}` on a
/// background worker. `submit` only validates and queues.
pub struct DriveExporter {
    root: PathBuf,
    next_id: AtomicUsize,
    tx: Option<Sender<ExportJob>>,
    worker: Option<JoinHandle<Vec<ExportOutcome>>>,
}

impl DriveExporter {
    pub fn new(root: impl Into<PathBuf>, options: WriteOptions) -> Self {
        let (tx, rx) = flume::unbounded::<ExportJob>();

        let worker = thread::spawn(move || {
            let mut outcomes = Vec::new();
            for job in rx {
                let ExportJob { task, path, request } = job;
                let result = run_export(&path, request, &options);
                let error = match result {
                    Ok(()) => {
                        info!("Export #{} {} written to {}", task.id, task.description, path.display());
                        None
                    }
                    Err(e) => {
                        warn!("Export #{} {} failed: {}", task.id, task.description, e);
                        Some(e.to_string())
                    }
                };
                outcomes.push(ExportOutcome {
                    id: task.id,
                    description: task.description,
                    path,
                    error,
                });
            }
            outcomes
        });

        Self {
            root: root.into(),
            next_id: AtomicUsize::new(0),
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Wait for every queued export and report the outcomes
    pub fn finish(mut self) -> ExportReport {
        self.tx.take();
        let outcomes = match self.worker.take().map(JoinHandle::join) {
            Some(Ok(outcomes)) => outcomes,
            Some(Err(e)) => panic::resume_unwind(e),
            None => Vec::new(),
        };
        ExportReport { outcomes }
    }

    fn output_path(&self, params: &ExportParams) -> PathBuf {
        self.root
            .join(&params.folder)
            .join(format!("{}.{}", params.file_name_prefix, params.format.extension()))
    }
}

impl Drop for DriveExporter {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            // Outcomes are lost when the exporter is dropped without finish()
            if worker.join().is_err() {
                warn!("Export worker panicked");
            }
        }
    }
}

impl ExportSink for DriveExporter {
    fn submit(&self, request: ExportRequest) -> Result<ExportTask> {
        validate(&request)?;

        let task = ExportTask {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            description: request.params.description.clone(),
        };
        let path = self.output_path(&request.params);
        debug!("Queueing export #{} -> {}", task.id, path.display());

        let job = ExportJob {
            task: task.clone(),
            path,
            request,
        };
        let sent = match self.tx.as_ref() {
            Some(tx) => tx.send(job).is_ok(),
            None => false,
        };
        if !sent {
            return Err(rejected(&task.description, "export worker has stopped"));
        }
        Ok(task)
    }
}

fn rejected(description: &str, reason: impl Into<String>) -> LstError {
    LstError::ExportRejected {
        description: description.to_string(),
        reason: reason.into(),
    }
}

/// Pixels an export of `bounds` (longitude/latitude) covers at `scale` metres
pub fn region_pixel_count(bounds: (f64, f64, f64, f64), scale: f64) -> u64 {
    let (min_x, min_y, max_x, max_y) = bounds;
    let mid_lat = ((min_y + max_y) / 2.0).to_radians();
    let width_m = (max_x - min_x) * METRES_PER_DEGREE * mid_lat.cos();
    let height_m = (max_y - min_y) * METRES_PER_DEGREE;
    let cols = (width_m / scale).ceil().max(1.0);
    let rows = (height_m / scale).ceil().max(1.0);
    (cols * rows) as u64
}

fn validate(request: &ExportRequest) -> Result<()> {
    let params = &request.params;
    let description = params.description.as_str();

    if description.trim().is_empty() {
        return Err(rejected(description, "empty description"));
    }
    if params.file_name_prefix.trim().is_empty() || params.file_name_prefix.contains(['/', '\\']) {
        return Err(rejected(
            description,
            format!("invalid file name prefix '{}'", params.file_name_prefix),
        ));
    }

    match (&request.payload, params.format) {
        (ExportPayload::Image(image), ExportFormat::GeoTiff) => {
            if image.bands.is_empty() {
                return Err(rejected(description, "image has no bands"));
            }
            let scale = params.scale.unwrap_or_else(|| image.geo.pixel_size_m());
            if scale.is_nan() || scale <= 0.0 {
                return Err(rejected(description, format!("invalid scale {}", scale)));
            }
            let pixels = match params.region_bounds {
                Some(bounds) => region_pixel_count(bounds, scale),
                None => target_grid(&image.geo, scale).pixel_count() as u64,
            };
            if let Some(max_pixels) = params.max_pixels {
                if pixels > max_pixels {
                    return Err(rejected(
                        description,
                        LstError::PixelBudgetExceeded { pixels, max_pixels }.to_string(),
                    ));
                }
            }
            Ok(())
        }
        (ExportPayload::Table(_), ExportFormat::Csv) => Ok(()),
        (_, format) => Err(rejected(
            description,
            format!("payload cannot be exported as {:?}", format),
        )),
    }
}

fn run_export(path: &Path, request: ExportRequest, options: &WriteOptions) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    match request.payload {
        ExportPayload::Image(image) => {
            let image = match request.params.region_bounds {
                Some(bounds) => {
                    let region = Region::from_bounds(request.params.description.as_str(), bounds);
                    image.crop(region.bounds_in(&image.geo.projection)?)?
                }
                None => image,
            };
            let image = match request.params.scale {
                Some(scale) => resample_nearest(&image, scale),
                None => image,
            };
            write_image(&image, path, options)
        }
        ExportPayload::Table(series) => write_time_series(&series, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::reader::read_band;
    use crate::pipeline::modis::{TimeSeries, TimeSeriesRow};
    use crate::raster::{Band, GeoInfo, Image};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn table_request(prefix: &str) -> ExportRequest {
        ExportRequest {
            params: ExportParams {
                description: prefix.to_string(),
                folder: "GEE_Exports".to_string(),
                file_name_prefix: prefix.to_string(),
                region_bounds: None,
                scale: None,
                max_pixels: None,
                format: ExportFormat::Csv,
            },
            payload: ExportPayload::Table(TimeSeries {
                band: "LST_Day_1km".to_string(),
                rows: vec![TimeSeriesRow {
                    date: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
                    mean: Some(20.5),
                }],
            }),
        }
    }

    fn image_request(max_pixels: u64) -> ExportRequest {
        let geo = GeoInfo::new("", [-1.0, 0.01, 0.0, 39.0, 0.0, -0.01], 100, 100);
        let image = Image::new("LST_Alicante_2020", None, geo)
            .with_band(Band::filled("LST", (100, 100), 30.0))
            .unwrap();
        ExportRequest {
            params: ExportParams {
                description: image.id.clone(),
                folder: "GEE_Exports".to_string(),
                file_name_prefix: image.id.clone(),
                region_bounds: Some((-1.0, 38.0, 0.0, 39.0)),
                scale: Some(30.0),
                max_pixels: Some(max_pixels),
                format: ExportFormat::GeoTiff,
            },
            payload: ExportPayload::Image(image),
        }
    }

    /// 10x10 grid of unit pixels with its top-left corner at (0, 10)
    fn grid_request(region_bounds: Option<(f64, f64, f64, f64)>, scale: Option<f64>) -> ExportRequest {
        let geo = GeoInfo::new("", [0.0, 1.0, 0.0, 10.0, 0.0, -1.0], 10, 10);
        let mut data: Vec<f32> = (0..100).map(|v| v as f32).collect();
        data[42] = f32::NAN;
        let image = Image::new("NDVI_Test_2020", None, geo)
            .with_band(Band::new("NDVI", (10, 10), data))
            .unwrap();
        ExportRequest {
            params: ExportParams {
                description: image.id.clone(),
                folder: "GEE_Exports".to_string(),
                file_name_prefix: image.id.clone(),
                region_bounds,
                scale,
                max_pixels: None,
                format: ExportFormat::GeoTiff,
            },
            payload: ExportPayload::Image(image),
        }
    }

    #[test]
    fn test_image_export_cropped_to_region() {
        let dir = tempdir().unwrap();
        let exporter = DriveExporter::new(dir.path(), WriteOptions::default());
        exporter.submit(grid_request(Some((2.0, 3.0, 5.0, 6.0)), None)).unwrap();

        let report = exporter.finish();
        assert_eq!(report.completed().count(), 1);

        let (band, geo) = read_band(&dir.path().join("GEE_Exports/NDVI_Test_2020.tif"), "NDVI").unwrap();
        // columns 2..5, rows 4..7
        assert_eq!(geo.shape(), (3, 3));
        assert_eq!(geo.geo_transform, [2.0, 1.0, 0.0, 6.0, 0.0, -1.0]);
        assert!(band.data[0].is_nan());
        assert_eq!(band.data[1], 43.0);
        assert_eq!(band.data[8], 64.0);
    }

    #[test]
    fn test_image_export_at_scale() {
        let dir = tempdir().unwrap();
        let exporter = DriveExporter::new(dir.path(), WriteOptions::default());
        exporter.submit(grid_request(None, Some(2.0))).unwrap();
        assert_eq!(exporter.finish().completed().count(), 1);

        let (band, geo) = read_band(&dir.path().join("GEE_Exports/NDVI_Test_2020.tif"), "NDVI").unwrap();
        assert_eq!(geo.shape(), (5, 5));
        assert_eq!(geo.geo_transform, [0.0, 2.0, 0.0, 10.0, 0.0, -2.0]);
        // centre of coarse pixel (0, 0) falls on fine pixel (1, 1)
        assert_eq!(band.data[0], 11.0);
    }

    #[test]
    fn test_table_export_written_by_worker() {
        let dir = tempdir().unwrap();
        let exporter = DriveExporter::new(dir.path(), WriteOptions::default());
        let task = exporter.submit(table_request("MODIS_LST_Timeseries_Alicante_2014_2023")).unwrap();
        assert_eq!(task.id, 0);

        let report = exporter.finish();
        assert_eq!(report.completed().count(), 1);
        let path = dir.path().join("GEE_Exports/MODIS_LST_Timeseries_Alicante_2014_2023.csv");
        assert_eq!(report.outcomes[0].path, path);
        assert!(path.exists());
    }

    #[test]
    fn test_pixel_budget_rejection() {
        let dir = tempdir().unwrap();
        let exporter = DriveExporter::new(dir.path(), WriteOptions::default());
        // roughly 2900 x 3700 pixels at 30 m
        let err = exporter.submit(image_request(1_000_000)).unwrap_err();
        assert!(matches!(err, LstError::ExportRejected { .. }));
        assert!(err.to_string().contains("exceeds"));
        assert!(exporter.finish().outcomes.is_empty());
    }

    #[test]
    fn test_format_mismatch_rejected() {
        let dir = tempdir().unwrap();
        let exporter = DriveExporter::new(dir.path(), WriteOptions::default());
        let mut request = table_request("table");
        request.params.format = ExportFormat::GeoTiff;
        assert!(exporter.submit(request).is_err());

        let mut request = table_request("bad/prefix");
        request.params.description = "bad".to_string();
        assert!(exporter.submit(request).is_err());
    }

    #[test]
    fn test_region_pixel_count() {
        // 1 degree of latitude at 1000 m
        let pixels = region_pixel_count((0.0, 0.0, 0.0, 1.0), 1000.0);
        assert_eq!(pixels, 112);
        assert!(region_pixel_count((-1.0, 38.0, 0.0, 39.0), 30.0) > 1_000_000);
        assert!(region_pixel_count((-1.0, 38.0, 0.0, 39.0), 30.0) < 1e13 as u64);
    }
}
