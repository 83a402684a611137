// src/io/boundary.rs
use geo::{Geometry, MultiPolygon};
use geojson::{Feature, GeoJson};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::{LstError, Result};
use crate::region::Region;

/// Load the single feature of a boundary collection whose `attribute`
/// equals `value`
pub fn load_region(path: &Path, attribute: &str, value: &str) -> Result<Region> {
    let text = fs::read_to_string(path)?;
    let region = region_from_str(&text, attribute, value)?;
    info!("Loaded region '{}' from {}", region.name, path.display());
    Ok(region)
}

/// Same as [`load_region`], from GeoJSON text
pub fn region_from_str(geojson: &str, attribute: &str, value: &str) -> Result<Region> {
    let geojson: GeoJson = geojson.parse()?;
    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => Vec::new(),
    };

    let mut matches = features
        .into_iter()
        .filter(|feature| attribute_matches(feature, attribute, value))
        .collect::<Vec<_>>();

    match matches.len() {
        0 => Err(LstError::RegionNotFound {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }),
        1 => {
            let feature = matches.remove(0);
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or_else(|| LstError::InvalidRegionGeometry(value.to_string()))?;
            let geometry: Geometry<f64> = geometry.try_into()?;
            Ok(Region::new(value, polygons(geometry, value)?))
        }
        count => Err(LstError::AmbiguousRegion {
            attribute: attribute.to_string(),
            value: value.to_string(),
            count,
        }),
    }
}

fn attribute_matches(feature: &Feature, attribute: &str, value: &str) -> bool {
    match feature.property(attribute) {
        Some(Value::String(s)) => s == value,
        Some(Value::Number(n)) => n.to_string() == value,
        _ => false,
    }
}

fn polygons(geometry: Geometry<f64>, name: &str) -> Result<MultiPolygon<f64>> {
    let polygons = match geometry {
        Geometry::Polygon(polygon) => vec![polygon],
        Geometry::MultiPolygon(multi) => multi.0,
        Geometry::GeometryCollection(collection) => collection
            .into_iter()
            .map(|g| polygons(g, name).map(|m| m.0))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect(),
        _ => Vec::new(),
    };
    if polygons.is_empty() {
        return Err(LstError::InvalidRegionGeometry(name.to_string()));
    }
    Ok(MultiPolygon::new(polygons))
}
