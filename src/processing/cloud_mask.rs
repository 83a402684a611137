// src/processing/cloud_mask.rs
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::raster::Image;

/// Landsat Collection 2 `QA_PIXEL` bits
pub const CLOUD_SHADOW_BIT: u8 = 3;
pub const CLOUD_BIT: u8 = 5;

/// Quality-band mask: a pixel is kept only when none of `bits` is set
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct QaMask {
    pub band: String,
    pub bits: Vec<u8>,
}

impl Default for QaMask {
    fn default() -> Self {
        Self {
            band: "QA_PIXEL".to_string(),
            bits: vec![CLOUD_SHADOW_BIT, CLOUD_BIT],
        }
    }
}

impl QaMask {
    fn bitmask(&self) -> u32 {
        self.bits.iter().fold(0u32, |acc, &bit| acc | (1u32 << bit))
    }

    pub fn is_clear(&self, qa: u32) -> bool {
        qa & self.bitmask() == 0
    }

    /// Per-pixel keep flags; a masked QA pixel is never kept
    pub fn keep_flags(&self, image: &Image) -> Result<Vec<bool>> {
        let qa = image.band(&self.band)?;
        let bitmask = self.bitmask();
        Ok(qa
            .data
            .par_iter()
            .map(|&v| !v.is_nan() && (v as u32) & bitmask == 0)
            .collect())
    }

    /// Mask cloud and cloud-shadow pixels in every band
    pub fn apply(&self, mut image: Image) -> Result<Image> {
        let keep = self.keep_flags(&image)?;
        image.update_mask(&keep);
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LstError;
    use crate::raster::{Band, GeoInfo};

    #[test]
    fn test_all_six_bit_combinations() {
        let mask = QaMask::default();
        for qa in 0u32..64 {
            let shadow = qa & (1 << 3) != 0;
            let cloud = qa & (1 << 5) != 0;
            assert_eq!(mask.is_clear(qa), !shadow && !cloud, "qa = {:06b}", qa);
        }
    }

    #[test]
    fn test_apply_masks_every_band() {
        let qa_values: Vec<f32> = (0..64).map(|v| v as f32).collect();
        let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], 64, 1);
        let image = Image::new("s", None, geo)
            .with_band(Band::filled("SR_B4", (64, 1), 0.1))
            .unwrap()
            .with_band(Band::new("QA_PIXEL", (64, 1), qa_values))
            .unwrap();

        let masked = QaMask::default().apply(image).unwrap();
        let red = masked.band("SR_B4").unwrap();
        for (qa, &v) in red.data.iter().enumerate() {
            let expected_clear = qa & 0b10_1000 == 0;
            assert_eq!(!v.is_nan(), expected_clear, "qa = {:06b}", qa);
        }
        assert_eq!(red.valid_count(), 16);
    }

    #[test]
    fn test_missing_qa_band() {
        let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], 1, 1);
        let image = Image::new("s", None, geo);
        assert!(matches!(
            QaMask::default().apply(image),
            Err(LstError::MissingBand { .. })
        ));
    }
}
