// src/raster/image.rs
use chrono::NaiveDate;

use super::{Band, GeoInfo};
use crate::error::{LstError, Result};

/// A multi-band scene or composite on a single grid
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub geo: GeoInfo,
    pub bands: Vec<Band>,
}

impl Image {
    pub fn new(id: impl Into<String>, date: Option<NaiveDate>, geo: GeoInfo) -> Self {
        Self {
            id: id.into(),
            date,
            geo,
            bands: Vec::new(),
        }
    }

    pub fn with_band(mut self, band: Band) -> Result<Self> {
        self.add_band(band)?;
        Ok(self)
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Result<&Band> {
        self.bands
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| LstError::MissingBand {
                band: name.to_string(),
                image: self.id.clone(),
            })
    }

    /// New image holding copies of `names`, in that order
    pub fn select(&self, names: &[&str]) -> Result<Image> {
        let bands = names
            .iter()
            .map(|name| self.band(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        Ok(Image {
            id: self.id.clone(),
            date: self.date,
            geo: self.geo.clone(),
            bands,
        })
    }

    /// Add a band, replacing an existing band of the same name in place
    pub fn add_band(&mut self, band: Band) -> Result<()> {
        if band.shape() != self.geo.shape() {
            return Err(LstError::GridMismatch {
                expected: self.geo.shape(),
                actual: band.shape(),
            });
        }
        match self.bands.iter_mut().find(|b| b.name == band.name) {
            Some(existing) => *existing = band,
            None => self.bands.push(band),
        }
        Ok(())
    }

    /// Replace an existing band of the same name; fails if there is none
    pub fn replace_band(&mut self, band: Band) -> Result<()> {
        if !self.bands.iter().any(|b| b.name == band.name) {
            return Err(LstError::MissingBand {
                band: band.name,
                image: self.id.clone(),
            });
        }
        self.add_band(band)
    }

    /// Mask every band where `keep` is false
    pub fn update_mask(&mut self, keep: &[bool]) {
        for band in &mut self.bands {
            band.update_mask(keep);
        }
    }

    /// Crop to the pixel window covering `bounds` in the image CRS
    pub fn crop(&self, bounds: (f64, f64, f64, f64)) -> Result<Image> {
        let (col, row, geo) = self
            .geo
            .window(bounds)
            .ok_or_else(|| LstError::OutsideGrid { image: self.id.clone() })?;
        let bands = self.bands.iter().map(|b| b.window(col, row, geo.shape())).collect();
        Ok(Image {
            id: self.id.clone(),
            date: self.date,
            geo,
            bands,
        })
    }

    /// Mask everything outside a region mask of the same grid
    pub fn clip(mut self, region_mask: &[bool]) -> Self {
        self.update_mask(region_mask);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Image {
        let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], 2, 1);
        Image::new("scene", None, geo)
            .with_band(Band::new("SR_B4", (2, 1), vec![0.1, 0.2]))
            .unwrap()
            .with_band(Band::new("SR_B5", (2, 1), vec![0.3, 0.4]))
            .unwrap()
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let selected = image().select(&["SR_B5", "SR_B4"]).unwrap();
        assert_eq!(selected.band_names(), vec!["SR_B5", "SR_B4"]);
    }

    #[test]
    fn test_missing_band() {
        let err = image().select(&["ST_B10"]).unwrap_err();
        assert!(matches!(err, LstError::MissingBand { .. }));
    }

    #[test]
    fn test_add_band_replaces_in_place() {
        let mut img = image();
        img.add_band(Band::new("SR_B4", (2, 1), vec![9.0, 9.0])).unwrap();
        assert_eq!(img.band_names(), vec!["SR_B4", "SR_B5"]);
        assert_eq!(img.band("SR_B4").unwrap().data, vec![9.0, 9.0]);
    }

    #[test]
    fn test_add_band_rejects_wrong_shape() {
        let mut img = image();
        let err = img.add_band(Band::new("X", (1, 1), vec![0.0])).unwrap_err();
        assert!(matches!(err, LstError::GridMismatch { .. }));
    }

    #[test]
    fn test_crop_keeps_every_band() {
        // pixels are 30 units wide from x = 0; 30..60 is the second column
        let cropped = image().crop((30.0, -30.0, 60.0, 0.0)).unwrap();
        assert_eq!(cropped.geo.shape(), (1, 1));
        assert_eq!(cropped.geo.geo_transform[0], 30.0);
        assert_eq!(cropped.band("SR_B4").unwrap().data, vec![0.2]);
        assert_eq!(cropped.band("SR_B5").unwrap().data, vec![0.4]);

        let err = image().crop((500.0, 500.0, 600.0, 600.0)).unwrap_err();
        assert!(matches!(err, LstError::OutsideGrid { .. }));
    }

    #[test]
    fn test_replace_band_requires_existing() {
        let mut img = image();
        img.replace_band(Band::new("SR_B5", (2, 1), vec![1.0, 1.0])).unwrap();
        assert_eq!(img.band("SR_B5").unwrap().data, vec![1.0, 1.0]);
        let err = img.replace_band(Band::new("NDVI", (2, 1), vec![0.0, 0.0])).unwrap_err();
        assert!(matches!(err, LstError::MissingBand { .. }));
    }
}
