// src/io/table.rs
use std::path::Path;

use crate::error::Result;
use crate::pipeline::modis::{TimeSeries, TimeSeriesRow};

/// Write a time series as `date,mean_LST` CSV; masked means are empty fields
pub fn write_time_series(series: &TimeSeries, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in &series.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_time_series(path: &Path, band: &str) -> Result<TimeSeries> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize::<TimeSeriesRow>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(TimeSeries {
        band: band.to_string(),
        rows,
    })
}
