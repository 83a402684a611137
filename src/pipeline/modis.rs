// src/pipeline/modis.rs
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ExportConfig, LegendConfig, ModisConfig};
use crate::engine::{ExportFormat, ExportParams, ExportPayload, ExportRequest, SceneQuery, SceneSource};
use crate::error::{LstError, Result};
use crate::processing::composite::{composite, Composite};
use crate::processing::reduce::{reduce_region, RegionReducer};
use crate::raster::{GeoInfo, Image};
use crate::region::Region;
use crate::render::{ChartSpec, Layer, LayerSpec, VisParams};

/// One scene's regional mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesRow {
    pub date: NaiveDate,
    #[serde(rename = "mean_LST")]
    pub mean: Option<f64>,
}

/// Per-scene regional means, in acquisition order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    pub band: String,
    pub rows: Vec<TimeSeriesRow>,
}

#[derive(Debug, Clone)]
pub struct ModisProducts {
    pub scene_count: usize,
    /// Mean LST (°C) over the whole period, clipped to the region
    pub mean: Image,
    pub series: TimeSeries,
}

/// `2014_2023` style label of the configured period
pub fn period_label(config: &ModisConfig) -> String {
    format!("{}_{}", config.dates.start.year(), config.dates.end.year())
}

fn period_title(config: &ModisConfig) -> String {
    format!("{}–{}", config.dates.start.year(), config.dates.end.year())
}

/// Load, scale to °C, average, and reduce the MODIS LST collection
pub fn compute_modis(source: &dyn SceneSource, region: &Region, config: &ModisConfig) -> Result<ModisProducts> {
    let query = SceneQuery {
        collection: &config.collection,
        region,
        dates: config.dates,
        bands: Some(vec![config.band.clone()]),
    };
    let scenes = source.fetch(&query)?;
    info!(
        "{} scenes in {} between {} and {}",
        scenes.len(),
        config.collection,
        config.dates.start,
        config.dates.end
    );

    let scaled = scenes
        .into_iter()
        .map(|scene| {
            let mut selected = scene.select(&[config.band.as_str()])?;
            config.scale.apply_to_image(&mut selected);
            Ok(selected)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(scaled.len());
    let mut mask_cache: Option<(GeoInfo, Vec<bool>)> = None;
    for scene in &scaled {
        let Some(date) = scene.date else {
            warn!("Skipping undated scene {}", scene.id);
            continue;
        };
        let stale = mask_cache
            .as_ref()
            .map_or(true, |(geo, _)| !geo.same_grid(&scene.geo));
        if stale {
            mask_cache = Some((scene.geo.clone(), region.mask_for(&scene.geo)?));
        }
        let mask = mask_cache.as_ref().map(|(_, mask)| mask.as_slice()).unwrap_or_default();
        let mean = reduce_region(
            scene.band(&config.band)?,
            &scene.geo,
            Some(mask),
            RegionReducer::Mean,
            &config.reduce,
        )?;
        rows.push(TimeSeriesRow { date, mean });
    }

    let mean = composite(&scaled, Composite::Mean, &format!("MODIS_LST_Mean_{}", period_label(config)))?
        .ok_or(LstError::EmptyComposite {
            year: config.dates.start.year(),
        })?;
    let region_mask = region.mask_for(&mean.geo)?;
    let mean = mean.clip(&region_mask);

    Ok(ModisProducts {
        scene_count: scaled.len(),
        mean,
        series: TimeSeries {
            band: config.band.clone(),
            rows,
        },
    })
}

/// Mean LST layer of the period
pub fn mean_layer<'a>(products: &'a ModisProducts, config: &ModisConfig, legend: &LegendConfig) -> Layer<'a> {
    Layer {
        spec: LayerSpec {
            name: format!("Mean LST MODIS ({})", period_title(config)),
            source: products.mean.id.clone(),
            vis: VisParams {
                bands: None,
                min: legend.modis_min,
                max: legend.modis_max,
                palette: Some(legend.palette.clone()),
            },
        },
        image: &products.mean,
    }
}

/// Seasonal overlay and chronological charts of the regional means
pub fn chart_specs(products: &ModisProducts, region: &Region, config: &ModisConfig) -> Vec<ChartSpec> {
    vec![
        ChartSpec::doy_series_by_year(
            &products.series,
            format!("Annual Variation of LST in {} (MODIS)", region.name),
        ),
        ChartSpec::time_series(
            &products.series,
            format!("Mean LST Over Time ({})", period_title(config)),
        ),
    ]
}

/// Mean image GeoTIFF and time-series CSV exports
pub fn export_requests(
    products: &ModisProducts,
    region: &Region,
    config: &ModisConfig,
    export: &ExportConfig,
) -> Result<Vec<ExportRequest>> {
    let bounds = region.bounds()?;
    let table_name = format!("MODIS_LST_Timeseries_{}_{}", region.label(), period_label(config));

    Ok(vec![
        ExportRequest {
            params: ExportParams {
                description: products.mean.id.clone(),
                folder: export.folder.clone(),
                file_name_prefix: products.mean.id.clone(),
                region_bounds: Some(bounds),
                scale: Some(export.modis_scale),
                max_pixels: Some(export.max_pixels),
                format: ExportFormat::GeoTiff,
            },
            payload: ExportPayload::Image(products.mean.clone()),
        },
        ExportRequest {
            params: ExportParams {
                description: table_name.clone(),
                folder: export.folder.clone(),
                file_name_prefix: table_name,
                region_bounds: None,
                scale: None,
                max_pixels: None,
                format: ExportFormat::Csv,
            },
            payload: ExportPayload::Table(products.series.clone()),
        },
    ])
}
