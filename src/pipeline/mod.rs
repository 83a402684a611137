// src/pipeline/mod.rs
pub mod landsat;
pub mod modis;
pub mod study;

pub use landsat::{compute_year, YearlyProducts};
pub use modis::{compute_modis, ModisProducts, TimeSeries, TimeSeriesRow};
pub use study::{Study, StudyReport};
