// src/pipeline/landsat.rs
use tracing::{debug, info};

use crate::config::{ExportConfig, LandsatConfig, LegendConfig};
use crate::engine::{ExportFormat, ExportParams, ExportPayload, ExportRequest, SceneQuery, SceneSource};
use crate::error::{LstError, Result};
use crate::processing::composite::{composite, Composite};
use crate::processing::indices::{Emissivity, LandSurfaceTemperature, NdviRange, VegetationProportion, NDI};
use crate::processing::reduce::{reduce_region, RegionReducer};
use crate::processing::scale::apply_scale_factors;
use crate::processing::ParallelProcessor;
use crate::raster::Image;
use crate::region::Region;
use crate::render::palette::NDVI_PALETTE;
use crate::render::{Layer, LayerSpec, VisParams};

/// Rasters derived for one year of the study
#[derive(Debug, Clone)]
pub struct YearlyProducts {
    pub year: i32,
    pub scene_count: usize,
    pub ndvi_range: NdviRange,
    /// Single band `NDVI`
    pub ndvi: Image,
    /// Single band `LST <region> <year>`, degrees Celsius
    pub lst: Image,
    /// Red, green, blue reflectance
    pub true_color: Image,
}

/// Scale, cloud-mask and median-composite the summer scenes of `year`,
/// then derive NDVI, emissivity and LST inside `region`.
///
/// Fails with `EmptyComposite` when the window holds no cloud-free pixel
/// and with `DegenerateNdviRange` when NDVI is constant over the region.
pub fn compute_year(
    source: &dyn SceneSource,
    processor: &ParallelProcessor,
    region: &Region,
    year: i32,
    config: &LandsatConfig,
) -> Result<YearlyProducts> {
    let dates = config.window.for_year(year)?;
    let query = SceneQuery {
        collection: &config.collection,
        region,
        dates,
        bands: None,
    };
    let scenes = source.fetch(&query)?;
    let scene_count = scenes.len();
    info!(
        "{}: {} scenes in {} between {} and {}",
        year, scene_count, config.collection, dates.start, dates.end
    );

    let prepared = scenes
        .into_iter()
        .map(|scene| prepare_scene(scene, config))
        .collect::<Result<Vec<_>>>()?;

    let label = region.label();
    let median = composite(&prepared, Composite::Median, &format!("Landsat_{}_{}", label, year))?
        .ok_or(LstError::EmptyComposite { year })?;
    let region_mask = region.mask_for(&median.geo)?;
    let median = median.clip(&region_mask);

    let ndvi_band = processor.process(&NDI::ndvi(), &median, &[config.nir_band.as_str(), config.red_band.as_str()])?;

    let ndvi_min = reduce_region(
        &ndvi_band,
        &median.geo,
        Some(region_mask.as_slice()),
        RegionReducer::Min,
        &config.ndvi_reduce,
    )?;
    let ndvi_max = reduce_region(
        &ndvi_band,
        &median.geo,
        Some(region_mask.as_slice()),
        RegionReducer::Max,
        &config.ndvi_reduce,
    )?;
    let (Some(min), Some(max)) = (ndvi_min, ndvi_max) else {
        return Err(LstError::EmptyComposite { year });
    };
    if max <= min {
        return Err(LstError::DegenerateNdviRange { year, value: min });
    }
    let ndvi_range = NdviRange { min, max };
    debug!("{}: NDVI range [{:.4}, {:.4}]", year, min, max);

    let ndvi = Image::new(format!("NDVI_{}_{}", label, year), None, median.geo.clone()).with_band(ndvi_band)?;

    let mut work = ndvi.clone();
    let pv = processor.process(&VegetationProportion::new(ndvi_range), &work, &["NDVI"])?;
    work.add_band(pv)?;
    let em = processor.process(&Emissivity, &work, &["PV"])?;
    work.add_band(em)?;
    work.add_band(median.band(&config.thermal_band)?.clone().renamed("thermal"))?;

    let lst_name = format!("LST {} {}", region.name, year);
    let lst_band = processor.process(&LandSurfaceTemperature::new(0, 1, Some(lst_name)), &work, &["thermal", "EM"])?;
    let lst = Image::new(format!("LST_{}_{}", label, year), None, median.geo.clone()).with_band(lst_band)?;

    let true_color_bands: Vec<&str> = config.true_color_bands.iter().map(String::as_str).collect();
    let mut true_color = median.select(&true_color_bands)?;
    true_color.id = format!("TrueColor_{}_{}", label, year);

    Ok(YearlyProducts {
        year,
        scene_count,
        ndvi_range,
        ndvi,
        lst,
        true_color,
    })
}

fn prepare_scene(scene: Image, config: &LandsatConfig) -> Result<Image> {
    let scaled = apply_scale_factors(scene, &config.scale_factors)?;
    config.qa.apply(scaled)
}

/// True color, NDVI and LST layers of one year, in draw order
pub fn layers_for_year<'a>(
    products: &'a YearlyProducts,
    region: &Region,
    config: &LandsatConfig,
    legend: &LegendConfig,
) -> Vec<Layer<'a>> {
    let year = products.year;
    vec![
        Layer {
            spec: LayerSpec {
                name: format!("True Color 432 - {}", year),
                source: products.true_color.id.clone(),
                vis: VisParams {
                    bands: Some(config.true_color_bands.clone()),
                    min: 0.0,
                    max: 0.15,
                    palette: None,
                },
            },
            image: &products.true_color,
        },
        Layer {
            spec: LayerSpec {
                name: format!("NDVI {} - {}", region.name, year),
                source: products.ndvi.id.clone(),
                vis: VisParams {
                    bands: None,
                    min: -1.0,
                    max: 1.0,
                    palette: Some(NDVI_PALETTE.iter().map(|c| c.to_string()).collect()),
                },
            },
            image: &products.ndvi,
        },
        Layer {
            spec: LayerSpec {
                name: format!("LST - {}", year),
                source: products.lst.id.clone(),
                vis: VisParams {
                    bands: None,
                    min: legend.lst_min,
                    max: legend.lst_max,
                    palette: Some(legend.palette.clone()),
                },
            },
            image: &products.lst,
        },
    ]
}

/// NDVI, LST and true color GeoTIFF exports of one year
pub fn export_requests_for_year(
    products: &YearlyProducts,
    region: &Region,
    export: &ExportConfig,
) -> Result<Vec<ExportRequest>> {
    let bounds = region.bounds()?;
    let request = |image: &Image| ExportRequest {
        params: ExportParams {
            description: image.id.clone(),
            folder: export.folder.clone(),
            file_name_prefix: image.id.clone(),
            region_bounds: Some(bounds),
            scale: Some(export.landsat_scale),
            max_pixels: Some(export.max_pixels),
            format: ExportFormat::GeoTiff,
        },
        payload: ExportPayload::Image(image.clone()),
    };

    Ok(vec![
        request(&products.ndvi),
        request(&products.lst),
        request(&products.true_color),
    ])
}
