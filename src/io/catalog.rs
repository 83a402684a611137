// src/io/catalog.rs
use chrono::NaiveDate;
use rayon::prelude::*;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::{SceneQuery, SceneSource};
use crate::error::{LstError, Result};
use crate::raster::Image;
use crate::utils::cache::RasterCache;

/// `YYYY-MM-DD` optionally followed by `_<id>`
const SCENE_DIR_PATTERN: &str = r"^(\d{4}-\d{2}-\d{2})(?:_(.+))?$";

fn scene_dir_pattern() -> Result<Regex> {
    Regex::new(SCENE_DIR_PATTERN).map_err(|e| LstError::InvalidConfig(e.to_string()))
}

/// Scenes stored on disk as one GeoTIFF per band:
/// `<root>/<collection>/<YYYY-MM-DD>[_<id>]/<BAND>.tif`
pub struct LocalCatalog {
    root: PathBuf,
    cache: Arc<RasterCache>,
}

#[derive(Debug, Clone)]
struct SceneEntry {
    id: String,
    date: NaiveDate,
    dir: PathBuf,
}

impl LocalCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_cache(root, Arc::new(RasterCache::new()))
    }

    pub fn with_cache(root: impl Into<PathBuf>, cache: Arc<RasterCache>) -> Self {
        Self {
            root: root.into(),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache(&self) -> &RasterCache {
        &self.cache
    }

    fn scene_entries(&self, collection: &str) -> Result<Vec<SceneEntry>> {
        let dir = self.root.join(collection);
        if !dir.is_dir() {
            warn!("Collection {} not found under {}", collection, self.root.display());
            return Ok(Vec::new());
        }

        let pattern = scene_dir_pattern()?;
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(caps) = pattern.captures(&name) else {
                debug!("Ignoring {} in {}", name, dir.display());
                continue;
            };
            let Ok(date) = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d") else {
                warn!("Ignoring scene directory with invalid date: {}", name);
                continue;
            };
            entries.push(SceneEntry {
                id: name,
                date,
                dir: entry.path(),
            });
        }
        Ok(entries)
    }

    fn band_files(dir: &Path, wanted: Option<&[String]>) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let is_tif = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"));
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if is_tif {
                files.push((stem.to_string(), path.clone()));
            }
        }
        files.sort();

        match wanted {
            None => Ok(files),
            Some(wanted) => wanted
                .iter()
                .map(|band| {
                    files
                        .iter()
                        .find(|(name, _)| name == band)
                        .cloned()
                        .ok_or_else(|| LstError::MissingBand {
                            band: band.clone(),
                            image: dir.display().to_string(),
                        })
                })
                .collect(),
        }
    }

    fn load_scene(&self, entry: &SceneEntry, bands: Option<&[String]>) -> Result<Image> {
        let files = Self::band_files(&entry.dir, bands)?;
        let mut image: Option<Image> = None;
        for (name, path) in files {
            let cached = self.cache.get_band(&path, &name)?;
            let (band, geo) = cached.as_ref();
            let image = image.get_or_insert_with(|| Image::new(entry.id.clone(), Some(entry.date), geo.clone()));
            if !image.geo.same_grid(geo) {
                return Err(LstError::GridMismatch {
                    expected: image.geo.shape(),
                    actual: geo.shape(),
                });
            }
            image.add_band(band.clone().renamed(name))?;
        }
        image.ok_or_else(|| LstError::MissingBand {
            band: "*.tif".to_string(),
            image: entry.id.clone(),
        })
    }
}

impl SceneSource for LocalCatalog {
    fn fetch(&self, query: &SceneQuery<'_>) -> Result<Vec<Image>> {
        let entries = self
            .scene_entries(query.collection)?
            .into_iter()
            .filter(|entry| query.dates.contains(entry.date))
            .collect::<Vec<_>>();

        let loaded = entries
            .par_iter()
            .map(|entry| self.load_scene(entry, query.bands.as_deref()))
            .collect::<Result<Vec<_>>>()?;

        let mut scenes = Vec::with_capacity(loaded.len());
        for scene in loaded {
            if query.region.intersects_grid(&scene.geo)? {
                scenes.push(scene);
            } else {
                debug!("Scene {} does not intersect {}", scene.id, query.region.name);
            }
        }
        scenes.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(scenes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DateRange;
    use crate::io::writer::{write_image, WriteOptions};
    use crate::raster::{Band, GeoInfo};
    use crate::region::Region;
    use tempfile::tempdir;

    const COLLECTION: &str = "LANDSAT/LC08/C02/T1_L2";

    fn write_scene(root: &Path, dir_name: &str, origin_x: f64, nir: f32) {
        let dir = root.join(COLLECTION).join(dir_name);
        fs::create_dir_all(&dir).unwrap();
        let geo = GeoInfo::new("", [origin_x, 1.0, 0.0, 4.0, 0.0, -1.0], 4, 4);
        for (name, value) in [("SR_B4", 0.1), ("SR_B5", nir)] {
            let image = Image::new(dir_name, None, geo.clone())
                .with_band(Band::filled(name, (4, 4), value))
                .unwrap();
            write_image(&image, &dir.join(format!("{}.tif", name)), &WriteOptions::default()).unwrap();
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_scene_dir_pattern() {
        let pattern = scene_dir_pattern().unwrap();
        let caps = pattern.captures("2020-07-14_LC08_198033").unwrap();
        assert_eq!(&caps[1], "2020-07-14");
        assert_eq!(&caps[2], "LC08_198033");
        assert!(pattern.is_match("2020-07-14"));
        assert!(!pattern.is_match("thumbnails"));
    }

    #[test]
    fn test_scene_entries_skip_unrelated_dirs() {
        let dir = tempdir().unwrap();
        let collection = dir.path().join("MODIS/061/MOD11A2");
        fs::create_dir_all(collection.join("2014-01-01")).unwrap();
        fs::create_dir_all(collection.join("2014-01-09_h17v05")).unwrap();
        fs::create_dir_all(collection.join("notes")).unwrap();
        fs::write(collection.join("README.txt"), "scenes").unwrap();

        let catalog = LocalCatalog::new(dir.path());
        let mut entries = catalog.scene_entries("MODIS/061/MOD11A2").unwrap();
        entries.sort_by_key(|e| e.date);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].id, "2014-01-09_h17v05");
        assert!(catalog.scene_entries("LANDSAT/LC08/C02/T1_L2").unwrap().is_empty());
    }

    #[test]
    fn test_fetch_reads_scenes_in_date_order() {
        let dir = tempdir().unwrap();
        write_scene(dir.path(), "2020-08-02_LC08_199033", 0.0, 0.5);
        write_scene(dir.path(), "2020-07-14_LC08_198033", 0.0, 0.3);
        write_scene(dir.path(), "2020-07-14_LC08_198032", 0.0, 0.4);
        // outside the date range
        write_scene(dir.path(), "2020-09-01", 0.0, 0.6);
        // inside the range but far from the region
        write_scene(dir.path(), "2020-07-20", 100.0, 0.7);

        let region = Region::from_bounds("Test", (1.0, 1.0, 3.0, 3.0));
        let catalog = LocalCatalog::new(dir.path());
        let query = SceneQuery {
            collection: COLLECTION,
            region: &region,
            dates: DateRange {
                start: date(2020, 6, 1),
                end: date(2020, 9, 1),
            },
            bands: Some(vec!["SR_B5".to_string(), "SR_B4".to_string()]),
        };
        let scenes = catalog.fetch(&query).unwrap();

        let ids: Vec<&str> = scenes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2020-07-14_LC08_198032", "2020-07-14_LC08_198033", "2020-08-02_LC08_199033"]);
        assert_eq!(scenes[0].date, Some(date(2020, 7, 14)));
        assert_eq!(scenes[0].band_names(), vec!["SR_B5", "SR_B4"]);
        assert_eq!(scenes[2].band("SR_B5").unwrap().data, vec![0.5; 16]);
        assert_eq!(scenes[1].geo.shape(), (4, 4));
        // two bands for each of the four scenes inside the date range
        assert_eq!(catalog.cache().len(), 8);
    }

    #[test]
    fn test_band_files_missing_band() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("SR_B4.tif"), b"").unwrap();
        fs::write(dir.path().join("metadata.json"), b"{}").unwrap();

        let all = LocalCatalog::band_files(dir.path(), None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, "SR_B4");

        let err = LocalCatalog::band_files(dir.path(), Some(&["SR_B5".to_string()][..])).unwrap_err();
        assert!(matches!(err, LstError::MissingBand { .. }));
    }
}
