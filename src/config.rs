// src/config.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LstError, Result};
use crate::processing::cloud_mask::QaMask;
use crate::processing::reduce::ReduceParams;
use crate::processing::scale::{LinearScale, ScaleRule};
use crate::render::palette::LST_PALETTE;

/// Study parameters. Every field defaults to the Alicante study constants,
/// so a JSON file only needs to list what it overrides.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct StudyConfig {
    #[serde(default)]
    pub region: RegionConfig,
    #[serde(default)]
    pub landsat: LandsatConfig,
    #[serde(default)]
    pub modis: ModisConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub legend: LegendConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RegionConfig {
    #[serde(default = "default_region_attribute")]
    pub attribute: String,
    #[serde(default = "default_region_value")]
    pub value: String,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            attribute: default_region_attribute(),
            value: default_region_value(),
        }
    }
}

/// Seasonal window, `[start, end)` within each year
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonWindow {
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
}

impl Default for SeasonWindow {
    fn default() -> Self {
        Self {
            start_month: 6,
            start_day: 1,
            end_month: 9,
            end_day: 21,
        }
    }
}

impl SeasonWindow {
    pub fn for_year(&self, year: i32) -> Result<DateRange> {
        let start = NaiveDate::from_ymd_opt(year, self.start_month, self.start_day);
        let end = NaiveDate::from_ymd_opt(year, self.end_month, self.end_day);
        match (start, end) {
            (Some(start), Some(end)) if start < end => Ok(DateRange { start, end }),
            _ => Err(LstError::InvalidConfig(format!(
                "season window {:?} is not a valid range in {}",
                self, year
            ))),
        }
    }
}

/// Half-open date range `[start, end)`
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date < self.end
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LandsatConfig {
    #[serde(default = "default_landsat_collection")]
    pub collection: String,
    #[serde(default = "default_years")]
    pub years: Vec<i32>,
    #[serde(default)]
    pub window: SeasonWindow,
    #[serde(default = "default_nir_band")]
    pub nir_band: String,
    #[serde(default = "default_red_band")]
    pub red_band: String,
    #[serde(default = "default_thermal_band")]
    pub thermal_band: String,
    #[serde(default = "default_true_color_bands")]
    pub true_color_bands: Vec<String>,
    #[serde(default)]
    pub qa: QaMask,
    #[serde(default = "default_landsat_scale_rules")]
    pub scale_factors: Vec<ScaleRule>,
    #[serde(default = "default_ndvi_reduce")]
    pub ndvi_reduce: ReduceParams,
}

impl Default for LandsatConfig {
    fn default() -> Self {
        Self {
            collection: default_landsat_collection(),
            years: default_years(),
            window: SeasonWindow::default(),
            nir_band: default_nir_band(),
            red_band: default_red_band(),
            thermal_band: default_thermal_band(),
            true_color_bands: default_true_color_bands(),
            qa: QaMask::default(),
            scale_factors: default_landsat_scale_rules(),
            ndvi_reduce: default_ndvi_reduce(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ModisConfig {
    #[serde(default = "default_modis_collection")]
    pub collection: String,
    #[serde(default = "default_modis_band")]
    pub band: String,
    #[serde(default = "default_modis_dates")]
    pub dates: DateRange,
    #[serde(default = "default_modis_scale")]
    pub scale: LinearScale,
    #[serde(default = "default_modis_reduce")]
    pub reduce: ReduceParams,
}

impl Default for ModisConfig {
    fn default() -> Self {
        Self {
            collection: default_modis_collection(),
            band: default_modis_band(),
            dates: default_modis_dates(),
            scale: default_modis_scale(),
            reduce: default_modis_reduce(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ExportConfig {
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_landsat_export_scale")]
    pub landsat_scale: f64,
    #[serde(default = "default_modis_export_scale")]
    pub modis_scale: f64,
    #[serde(default = "default_export_max_pixels")]
    pub max_pixels: u64,
    #[serde(default = "default_compress")]
    pub compress: String,
    #[serde(default = "default_compress_level")]
    pub compress_level: u8,
    #[serde(default = "default_true")]
    pub tiled: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            landsat_scale: default_landsat_export_scale(),
            modis_scale: default_modis_export_scale(),
            max_pixels: default_export_max_pixels(),
            compress: default_compress(),
            compress_level: default_compress_level(),
            tiled: default_true(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LegendConfig {
    #[serde(default = "default_lst_min")]
    pub lst_min: f64,
    #[serde(default = "default_lst_max")]
    pub lst_max: f64,
    #[serde(default = "default_modis_min")]
    pub modis_min: f64,
    #[serde(default = "default_modis_max")]
    pub modis_max: f64,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            lst_min: default_lst_min(),
            lst_max: default_lst_max(),
            modis_min: default_modis_min(),
            modis_max: default_modis_max(),
            palette: default_palette(),
        }
    }
}

fn default_region_attribute() -> String {
    "NAME_1".to_string()
}

fn default_region_value() -> String {
    "Alicante".to_string()
}

fn default_landsat_collection() -> String {
    "LANDSAT/LC08/C02/T1_L2".to_string()
}

fn default_years() -> Vec<i32> {
    (2014..=2023).collect()
}

fn default_nir_band() -> String {
    "SR_B5".to_string()
}

fn default_red_band() -> String {
    "SR_B4".to_string()
}

fn default_thermal_band() -> String {
    "ST_B10".to_string()
}

fn default_true_color_bands() -> Vec<String> {
    vec!["SR_B4".to_string(), "SR_B3".to_string(), "SR_B2".to_string()]
}

fn default_landsat_scale_rules() -> Vec<ScaleRule> {
    ScaleRule::landsat_c2_l2()
}

fn default_ndvi_reduce() -> ReduceParams {
    ReduceParams {
        scale: 30.0,
        max_pixels: 1_000_000_000,
    }
}

fn default_modis_collection() -> String {
    "MODIS/061/MOD11A2".to_string()
}

fn default_modis_band() -> String {
    "LST_Day_1km".to_string()
}

fn default_modis_dates() -> DateRange {
    DateRange {
        start: NaiveDate::from_ymd_opt(2014, 1, 1).unwrap_or_default(),
        end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
    }
}

fn default_modis_scale() -> LinearScale {
    LinearScale::MODIS_LST
}

fn default_modis_reduce() -> ReduceParams {
    ReduceParams {
        scale: 1000.0,
        max_pixels: 10_000_000_000_000,
    }
}

fn default_folder() -> String {
    "GEE_Exports".to_string()
}

fn default_landsat_export_scale() -> f64 {
    30.0
}

fn default_modis_export_scale() -> f64 {
    1000.0
}

fn default_export_max_pixels() -> u64 {
    10_000_000_000_000
}

fn default_compress() -> String {
    "DEFLATE".to_string()
}

fn default_compress_level() -> u8 {
    6
}

fn default_true() -> bool {
    true
}

fn default_lst_min() -> f64 {
    15.0
}

fn default_lst_max() -> f64 {
    45.0
}

fn default_modis_min() -> f64 {
    20.0
}

fn default_modis_max() -> f64 {
    40.0
}

fn default_palette() -> Vec<String> {
    LST_PALETTE.iter().map(|c| c.to_string()).collect()
}

impl StudyConfig {
    /// Read a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: StudyConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.landsat.years.is_empty() {
            return Err(LstError::InvalidConfig("no years to process".to_string()));
        }
        for &year in &self.landsat.years {
            self.landsat.window.for_year(year)?;
        }
        if self.modis.dates.start >= self.modis.dates.end {
            return Err(LstError::InvalidConfig(format!(
                "MODIS date range {} .. {} is empty",
                self.modis.dates.start, self.modis.dates.end
            )));
        }
        if self.legend.lst_min >= self.legend.lst_max || self.legend.modis_min >= self.legend.modis_max {
            return Err(LstError::InvalidConfig("legend min must be below max".to_string()));
        }
        if self.legend.palette.len() < 2 {
            return Err(LstError::InvalidConfig("palette needs at least two colors".to_string()));
        }
        if self.export.landsat_scale <= 0.0 || self.export.modis_scale <= 0.0 {
            return Err(LstError::InvalidConfig("export scale must be positive".to_string()));
        }
        Ok(())
    }

    /// Label for the years covered, e.g. `2014–2023`
    pub fn year_span(&self) -> String {
        let first = self.landsat.years.iter().min().copied().unwrap_or_default();
        let last = self.landsat.years.iter().max().copied().unwrap_or_default();
        format!("{}–{}", first, last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_study_constants() {
        let config = StudyConfig::default();
        assert_eq!(config.landsat.years.len(), 10);
        assert_eq!(config.landsat.years[0], 2014);
        assert_eq!(config.landsat.years[9], 2023);
        assert_eq!(config.export.folder, "GEE_Exports");
        assert_eq!(config.legend.palette.len(), 29);
        assert_eq!(config.year_span(), "2014–2023");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_override() {
        let json = r#"{ "landsat": { "years": [2020] }, "export": { "folder": "out" } }"#;
        let config: StudyConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.landsat.years, vec![2020]);
        assert_eq!(config.landsat.nir_band, "SR_B5");
        assert_eq!(config.export.folder, "out");
        assert_eq!(config.export.landsat_scale, 30.0);
        assert_eq!(config.region.value, "Alicante");
    }

    #[test]
    fn test_season_window_is_half_open() {
        let range = SeasonWindow::default().for_year(2020).unwrap();
        assert!(range.contains(NaiveDate::from_ymd_opt(2020, 6, 1).unwrap()));
        assert!(range.contains(NaiveDate::from_ymd_opt(2020, 9, 20).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2020, 9, 21).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2020, 5, 31).unwrap()));
    }

    #[test]
    fn test_invalid_window_rejected() {
        let mut config = StudyConfig::default();
        config.landsat.window.end_month = 2;
        assert!(matches!(config.validate(), Err(LstError::InvalidConfig(_))));
    }
}
