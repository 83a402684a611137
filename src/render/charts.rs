// src/render/charts.rs
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use serde::Serialize;

use crate::pipeline::modis::TimeSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    /// One series per year, x = day of year
    DoySeriesByYear,
    /// One chronological series, x = date
    TimeSeries,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisValue {
    Day(u32),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: AxisValue,
    pub y: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<ChartPoint>,
}

/// Chart description for an external plotting front end
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub v_axis_title: String,
    pub h_axis_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_size: Option<u32>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    /// Seasonal overlay: one line per year against day of year
    pub fn doy_series_by_year(series: &TimeSeries, title: impl Into<String>) -> Self {
        let chunks = series.rows.iter().chunk_by(|row| row.date.year());
        let by_year = chunks
            .into_iter()
            .map(|(year, rows)| ChartSeries {
                name: year.to_string(),
                points: rows
                    .map(|row| ChartPoint {
                        x: AxisValue::Day(row.date.ordinal()),
                        y: row.mean,
                    })
                    .collect(),
            })
            .collect();

        Self {
            kind: ChartKind::DoySeriesByYear,
            title: title.into(),
            v_axis_title: "Temperature (°C)".to_string(),
            h_axis_title: "Day of Year".to_string(),
            line_width: None,
            point_size: None,
            series: by_year,
        }
    }

    /// Full chronological series
    pub fn time_series(series: &TimeSeries, title: impl Into<String>) -> Self {
        let points = series
            .rows
            .iter()
            .map(|row| ChartPoint {
                x: AxisValue::Date(row.date),
                y: row.mean,
            })
            .collect();

        Self {
            kind: ChartKind::TimeSeries,
            title: title.into(),
            v_axis_title: "Temperature (°C)".to_string(),
            h_axis_title: "Date".to_string(),
            line_width: Some(1),
            point_size: Some(3),
            series: vec![ChartSeries {
                name: series.band.clone(),
                points,
            }],
        }
    }
}
