// src/raster/geo_info.rs
use gdal::spatial_ref::SpatialRef;
use serde::{Deserialize, Serialize};

use super::METRES_PER_DEGREE;

/// Georeferencing of a raster grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoInfo {
    pub projection: String,
    pub geo_transform: [f64; 6],
    pub width: usize,
    pub height: usize,
}

impl GeoInfo {
    pub fn new(projection: impl Into<String>, geo_transform: [f64; 6], width: usize, height: usize) -> Self {
        Self {
            projection: projection.into(),
            geo_transform,
            width,
            height,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Pixel width in CRS units
    pub fn pixel_size(&self) -> f64 {
        self.geo_transform[1].abs()
    }

    /// Pixel width in metres. An empty projection is treated as a metric grid.
    pub fn pixel_size_m(&self) -> f64 {
        if self.is_geographic() {
            self.pixel_size() * METRES_PER_DEGREE
        } else {
            self.pixel_size()
        }
    }

    pub fn is_geographic(&self) -> bool {
        if self.projection.trim().is_empty() {
            return false;
        }
        SpatialRef::from_wkt(&self.projection)
            .map(|srs| srs.is_geographic())
            .unwrap_or(false)
    }

    /// Map coordinates of the centre of pixel (col, row)
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let gt = &self.geo_transform;
        let x = col as f64 + 0.5;
        let y = row as f64 + 0.5;
        (gt[0] + x * gt[1] + y * gt[2], gt[3] + x * gt[4] + y * gt[5])
    }

    /// Extent as (min_x, min_y, max_x, max_y)
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        let gt = &self.geo_transform;
        let corners = [
            (0.0, 0.0),
            (self.width as f64, 0.0),
            (0.0, self.height as f64),
            (self.width as f64, self.height as f64),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(c, r)| {
                let x = gt[0] + c * gt[1] + r * gt[2];
                let y = gt[3] + c * gt[4] + r * gt[5];
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Same grid (size and transform); projection strings are not compared
    pub fn same_grid(&self, other: &GeoInfo) -> bool {
        self.shape() == other.shape()
            && self
                .geo_transform
                .iter()
                .zip(other.geo_transform.iter())
                .all(|(a, b)| (a - b).abs() < 1e-9)
    }

    /// Grid covering the same extent with `factor` times larger pixels
    pub fn scaled(&self, factor: f64) -> GeoInfo {
        let width = ((self.width as f64 / factor).ceil() as usize).max(1);
        let height = ((self.height as f64 / factor).ceil() as usize).max(1);
        let mut gt = self.geo_transform;
        gt[1] *= factor;
        gt[2] *= factor;
        gt[4] *= factor;
        gt[5] *= factor;
        GeoInfo::new(self.projection.clone(), gt, width, height)
    }

    /// Pixel window of a north-up grid covering `bounds` (min_x, min_y,
    /// max_x, max_y in the grid CRS), clamped to the grid. Returns the
    /// column and row offsets and the window's own grid, or `None` when
    /// the bounds miss the grid.
    pub fn window(&self, bounds: (f64, f64, f64, f64)) -> Option<(usize, usize, GeoInfo)> {
        let (min_x, min_y, max_x, max_y) = bounds;
        let gt = &self.geo_transform;
        if gt[1] == 0.0 || gt[5] == 0.0 {
            return None;
        }

        let pixel_range = |a: f64, b: f64, origin: f64, step: f64, len: usize| {
            let (lo, hi) = {
                let a = (a - origin) / step;
                let b = (b - origin) / step;
                (a.min(b), a.max(b))
            };
            let start = lo.floor().max(0.0) as usize;
            let end = (hi.ceil().min(len as f64)).max(0.0) as usize;
            (start < end).then_some((start, end))
        };

        let (col0, col1) = pixel_range(min_x, max_x, gt[0], gt[1], self.width)?;
        let (row0, row1) = pixel_range(min_y, max_y, gt[3], gt[5], self.height)?;

        let mut window_gt = *gt;
        window_gt[0] = gt[0] + col0 as f64 * gt[1];
        window_gt[3] = gt[3] + row0 as f64 * gt[5];
        Some((
            col0,
            row0,
            GeoInfo::new(self.projection.clone(), window_gt, col1 - col0, row1 - row0),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GeoInfo {
        GeoInfo::new("", [700_000.0, 30.0, 0.0, 4_300_000.0, 0.0, -30.0], 4, 2)
    }

    #[test]
    fn test_pixel_center_and_bounds() {
        let geo = grid();
        assert_eq!(geo.pixel_center(0, 0), (700_015.0, 4_299_985.0));
        assert_eq!(geo.bounds(), (700_000.0, 4_299_940.0, 700_120.0, 4_300_000.0));
        assert_eq!(geo.pixel_size_m(), 30.0);
    }

    #[test]
    fn test_scaled_grid_keeps_origin() {
        let coarse = grid().scaled(2.0);
        assert_eq!(coarse.shape(), (2, 1));
        assert_eq!(coarse.geo_transform[0], 700_000.0);
        assert_eq!(coarse.geo_transform[1], 60.0);
        assert_eq!(coarse.geo_transform[5], -60.0);
    }

    #[test]
    fn test_window_snaps_outward_and_clamps() {
        let geo = grid();
        // x 700_040..700_070 touches columns 1 and 2, y spans past the top edge
        let (col, row, window) = geo.window((700_040.0, 4_299_970.0, 700_070.0, 4_300_500.0)).unwrap();
        assert_eq!((col, row), (1, 0));
        assert_eq!(window.shape(), (2, 1));
        assert_eq!(window.geo_transform, [700_030.0, 30.0, 0.0, 4_300_000.0, 0.0, -30.0]);

        assert!(geo.window((0.0, 0.0, 10.0, 10.0)).is_none());
    }
}
