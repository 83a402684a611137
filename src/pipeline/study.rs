// src/pipeline/study.rs
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};

use super::landsat::{compute_year, export_requests_for_year, layers_for_year};
use super::modis::{chart_specs, compute_modis, export_requests, mean_layer};
use crate::config::StudyConfig;
use crate::engine::{ExportRequest, ExportSink, SceneSource};
use crate::error::{LstError, Result};
use crate::io::writer::write_rgb;
use crate::processing::ParallelProcessor;
use crate::region::Region;
use crate::render::palette::Palette;
use crate::render::{render_quicklook, ChartSpec, Layer, LayerSpec, Legend, MapLayout, TitleOverlay, VisParams};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub scene_count: usize,
    pub ndvi_min: f64,
    pub ndvi_max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedYear {
    pub year: i32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedExport {
    pub description: String,
    pub reason: String,
}

/// What a study run did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StudyReport {
    pub years_processed: Vec<YearSummary>,
    pub years_skipped: Vec<SkippedYear>,
    pub exports_submitted: Vec<String>,
    pub exports_rejected: Vec<RejectedExport>,
    pub layers: Vec<LayerSpec>,
    pub charts: Vec<ChartSpec>,
}

/// Runs the yearly Landsat LST study and the MODIS series for one region
pub struct Study<'a> {
    config: &'a StudyConfig,
    region: &'a Region,
    source: &'a dyn SceneSource,
    sink: &'a dyn ExportSink,
    processor: ParallelProcessor,
    quicklook_dir: Option<PathBuf>,
}

impl<'a> Study<'a> {
    pub fn new(
        config: &'a StudyConfig,
        region: &'a Region,
        source: &'a dyn SceneSource,
        sink: &'a dyn ExportSink,
        processor: ParallelProcessor,
    ) -> Self {
        Self {
            config,
            region,
            source,
            sink,
            processor,
            quicklook_dir: None,
        }
    }

    /// Also write an RGB GeoTIFF of every layer into `dir`
    pub fn with_quicklooks(mut self, dir: PathBuf) -> Self {
        self.quicklook_dir = Some(dir);
        self
    }

    /// Every configured year, then the MODIS series
    pub fn run(&self) -> Result<StudyReport> {
        let mut report = StudyReport::default();
        self.run_years(&mut report)?;
        self.run_modis(&mut report)?;
        Ok(report)
    }

    pub fn run_years(&self, report: &mut StudyReport) -> Result<()> {
        for &year in &self.config.landsat.years {
            self.run_year(year, report)?;
        }
        info!(
            "Processed {} of {} years",
            report.years_processed.len(),
            self.config.landsat.years.len()
        );
        Ok(())
    }

    /// One year: compute, add layers, submit three exports.
    /// A year without usable imagery, or whose scenes are not on one grid,
    /// is logged and skipped.
    pub fn run_year(&self, year: i32, report: &mut StudyReport) -> Result<()> {
        let products = match compute_year(self.source, &self.processor, self.region, year, &self.config.landsat) {
            Ok(products) => products,
            Err(
                e @ (LstError::EmptyComposite { .. }
                | LstError::DegenerateNdviRange { .. }
                | LstError::GridMismatch { .. }),
            ) => {
                warn!("Skipping {}: {}", year, e);
                report.years_skipped.push(SkippedYear {
                    year,
                    reason: e.to_string(),
                });
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        for layer in layers_for_year(&products, self.region, &self.config.landsat, &self.config.legend) {
            self.add_layer(layer, report);
        }

        for request in export_requests_for_year(&products, self.region, &self.config.export)? {
            self.submit(request, report);
        }

        info!(
            "{}: NDVI [{:.3}, {:.3}] from {} scenes",
            year, products.ndvi_range.min, products.ndvi_range.max, products.scene_count
        );
        report.years_processed.push(YearSummary {
            year,
            scene_count: products.scene_count,
            ndvi_min: products.ndvi_range.min,
            ndvi_max: products.ndvi_range.max,
        });
        Ok(())
    }

    /// MODIS mean image, time-series table and charts
    pub fn run_modis(&self, report: &mut StudyReport) -> Result<()> {
        let modis = &self.config.modis;
        let products = match compute_modis(self.source, self.region, modis) {
            Ok(products) => products,
            Err(e @ LstError::EmptyComposite { .. }) => {
                warn!("Skipping MODIS series: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.add_layer(mean_layer(&products, modis, &self.config.legend), report);
        for request in export_requests(&products, self.region, modis, &self.config.export)? {
            self.submit(request, report);
        }
        report.charts.extend(chart_specs(&products, self.region, modis));

        info!(
            "MODIS: {} scenes, {} time-series rows",
            products.scene_count,
            products.series.rows.len()
        );
        Ok(())
    }

    /// Region outline, every layer added so far, legend and title
    pub fn map_layout(&self, report: &StudyReport) -> Result<MapLayout> {
        let (min_x, min_y, max_x, max_y) = self.region.bounds()?;
        let legend = &self.config.legend;
        let palette = Palette::from_strs(legend.palette.as_slice())?;

        let mut layers = vec![LayerSpec {
            name: self.region.name.clone(),
            source: "boundary".to_string(),
            vis: VisParams {
                bands: None,
                min: 0.0,
                max: 1.0,
                palette: None,
            },
        }];
        layers.extend(report.layers.iter().cloned());

        Ok(MapLayout {
            title: TitleOverlay::for_study(&self.region.name, &self.config.year_span()),
            legend: Legend::lst(&palette, legend.lst_min, legend.lst_max),
            region: self.region.name.clone(),
            center: ((min_x + max_x) / 2.0, (min_y + max_y) / 2.0),
            zoom: 9,
            layers,
        })
    }

    fn add_layer(&self, layer: Layer<'_>, report: &mut StudyReport) {
        if let Some(dir) = &self.quicklook_dir {
            let path = dir.join(format!("{}.tif", layer.spec.name.replace([' ', '(', ')'], "_")));
            let written = render_quicklook(layer.image, &layer.spec.vis).and_then(|rgb| write_rgb(&rgb, &path));
            if let Err(e) = written {
                warn!("Quicklook for '{}' failed: {}", layer.spec.name, e);
            }
        }
        report.layers.push(layer.spec);
    }

    /// Submit an export; a rejection is logged and recorded, not fatal
    fn submit(&self, request: ExportRequest, report: &mut StudyReport) {
        let description = request.params.description.clone();
        match self.sink.submit(request) {
            Ok(task) => {
                info!("Submitted export #{} {}", task.id, task.description);
                report.exports_submitted.push(description);
            }
            Err(e) => {
                warn!("Export {} rejected: {}", description, e);
                report.exports_rejected.push(RejectedExport {
                    description,
                    reason: e.to_string(),
                });
            }
        }
    }
}
