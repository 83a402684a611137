// src/region.rs
use gdal::spatial_ref::{CoordTransform, SpatialRef};
use geo::{BoundingRect, Contains, Coord, LineString, MapCoords, MultiPolygon, Point, Polygon};
use rayon::prelude::*;

use crate::error::{LstError, Result};
use crate::raster::GeoInfo;

/// Boundaries are read as longitude/latitude on WGS84
const BOUNDARY_CRS: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Vertices per edge when a bounding box is turned into a polygon, so
/// reprojected edges keep their curvature
const EDGE_VERTICES: usize = 16;

/// Region of interest bounding and clipping every computation
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

impl Region {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            name: name.into(),
            geometry,
        }
    }

    /// Rectangle covering longitude/latitude `bounds`
    pub fn from_bounds(name: impl Into<String>, bounds: (f64, f64, f64, f64)) -> Self {
        let (min_x, min_y, max_x, max_y) = bounds;
        let corners = [(min_x, min_y), (max_x, min_y), (max_x, max_y), (min_x, max_y), (min_x, min_y)];
        let mut ring: Vec<Coord<f64>> = corners
            .windows(2)
            .flat_map(|edge| {
                let ((x0, y0), (x1, y1)) = (edge[0], edge[1]);
                (0..EDGE_VERTICES).map(move |i| {
                    let t = i as f64 / EDGE_VERTICES as f64;
                    Coord {
                        x: x0 + (x1 - x0) * t,
                        y: y0 + (y1 - y0) * t,
                    }
                })
            })
            .collect();
        ring.push(Coord { x: min_x, y: min_y });
        let polygon = Polygon::new(LineString::new(ring), Vec::new());
        Self::new(name, MultiPolygon::new(vec![polygon]))
    }

    /// Name as used in file names and descriptions
    pub fn label(&self) -> String {
        self.name.replace(char::is_whitespace, "_")
    }

    /// Bounds as (min_x, min_y, max_x, max_y) in longitude/latitude
    pub fn bounds(&self) -> Result<(f64, f64, f64, f64)> {
        rect_bounds(&self.geometry).ok_or_else(|| LstError::InvalidRegionGeometry(self.name.clone()))
    }

    /// Geometry in the CRS of `projection` (WKT). Empty or geographic
    /// projections are taken to already be longitude/latitude.
    pub fn geometry_in(&self, projection: &str) -> Result<MultiPolygon<f64>> {
        if projection.trim().is_empty() {
            return Ok(self.geometry.clone());
        }
        let target = SpatialRef::from_wkt(projection)?;
        if target.is_geographic() {
            return Ok(self.geometry.clone());
        }
        let source = SpatialRef::from_proj4(BOUNDARY_CRS)?;
        let transform = CoordTransform::new(&source, &target)?;
        let transformed = self.geometry.try_map_coords(|coord| {
            let mut x = [coord.x];
            let mut y = [coord.y];
            let mut z = [0.0];
            transform.transform_coords(&mut x, &mut y, &mut z)?;
            Ok::<_, gdal::errors::GdalError>(Coord { x: x[0], y: y[0] })
        })?;
        Ok(transformed)
    }

    pub fn bounds_in(&self, projection: &str) -> Result<(f64, f64, f64, f64)> {
        let geometry = self.geometry_in(projection)?;
        rect_bounds(&geometry).ok_or_else(|| LstError::InvalidRegionGeometry(self.name.clone()))
    }

    /// Rasterize the region onto `geo`: true where the pixel centre lies inside
    pub fn mask_for(&self, geo: &GeoInfo) -> Result<Vec<bool>> {
        let geometry = self.geometry_in(&geo.projection)?;
        let Some((min_x, min_y, max_x, max_y)) = rect_bounds(&geometry) else {
            return Ok(vec![false; geo.pixel_count()]);
        };

        let mask = (0..geo.height)
            .into_par_iter()
            .flat_map_iter(|row| {
                let geometry = &geometry;
                (0..geo.width).map(move |col| {
                    let (x, y) = geo.pixel_center(col, row);
                    x >= min_x
                        && x <= max_x
                        && y >= min_y
                        && y <= max_y
                        && geometry.contains(&Point::new(x, y))
                })
            })
            .collect();
        Ok(mask)
    }

    /// Whether the grid extent overlaps the region's bounding box
    pub fn intersects_grid(&self, geo: &GeoInfo) -> Result<bool> {
        let (rmin_x, rmin_y, rmax_x, rmax_y) = self.bounds_in(&geo.projection)?;
        let (gmin_x, gmin_y, gmax_x, gmax_y) = geo.bounds();
        Ok(rmin_x <= gmax_x && rmax_x >= gmin_x && rmin_y <= gmax_y && rmax_y >= gmin_y)
    }
}

fn rect_bounds(geometry: &MultiPolygon<f64>) -> Option<(f64, f64, f64, f64)> {
    geometry
        .bounding_rect()
        .map(|rect| (rect.min().x, rect.min().y, rect.max().x, rect.max().y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    fn square() -> Region {
        let poly = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 0.0, y: 2.0),
            (x: 0.0, y: 0.0),
        ];
        Region::new("Test Region", MultiPolygon::new(vec![poly]))
    }

    #[test]
    fn test_label_and_bounds() {
        let region = square();
        assert_eq!(region.label(), "Test_Region");
        assert_eq!(region.bounds().unwrap(), (0.0, 0.0, 2.0, 2.0));
    }

    #[test]
    fn test_from_bounds_round_trips_bounds() {
        let region = Region::from_bounds("bbox", (-1.1, 37.8, 0.3, 38.9));
        assert_eq!(region.bounds().unwrap(), (-1.1, 37.8, 0.3, 38.9));
        assert_eq!(region.geometry.0[0].exterior().0.len(), 4 * EDGE_VERTICES + 1);
    }

    #[test]
    fn test_mask_uses_pixel_centres() {
        // 4x4 grid of 1-unit pixels from (-1, 3) downwards
        let geo = GeoInfo::new("", [-1.0, 1.0, 0.0, 3.0, 0.0, -1.0], 4, 4);
        let mask = square().mask_for(&geo).unwrap();
        let inside: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, &m)| m)
            .map(|(i, _)| i)
            .collect();
        // centres (0.5, 1.5), (1.5, 1.5), (0.5, 0.5), (1.5, 0.5)
        assert_eq!(inside, vec![5, 6, 9, 10]);
    }

    #[test]
    fn test_intersects_grid() {
        let region = square();
        let near = GeoInfo::new("", [1.0, 1.0, 0.0, 3.0, 0.0, -1.0], 2, 2);
        let far = GeoInfo::new("", [10.0, 1.0, 0.0, 13.0, 0.0, -1.0], 2, 2);
        assert!(region.intersects_grid(&near).unwrap());
        assert!(!region.intersects_grid(&far).unwrap());
    }
}
