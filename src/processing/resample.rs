// src/processing/resample.rs
use rayon::prelude::*;

use crate::raster::{Band, GeoInfo, Image};

/// Ratio between a target scale (metres) and the native pixel size of `geo`
pub fn scale_factor(geo: &GeoInfo, scale: f64) -> f64 {
    let native = geo.pixel_size_m();
    if native <= 0.0 {
        1.0
    } else {
        scale / native
    }
}

/// Grid an export at `scale` metres would produce
pub fn target_grid(geo: &GeoInfo, scale: f64) -> GeoInfo {
    let factor = scale_factor(geo, scale);
    if (factor - 1.0).abs() < 1e-6 {
        geo.clone()
    } else {
        geo.scaled(factor)
    }
}

/// Nearest-neighbour resampling of every band to `scale` metres
pub fn resample_nearest(image: &Image, scale: f64) -> Image {
    let factor = scale_factor(&image.geo, scale);
    if (factor - 1.0).abs() < 1e-6 {
        return image.clone();
    }

    let target = image.geo.scaled(factor);
    let (src_w, src_h) = image.geo.shape();
    let (dst_w, dst_h) = target.shape();

    let bands = image
        .bands
        .iter()
        .map(|band| {
            let data = (0..dst_w * dst_h)
                .into_par_iter()
                .map(|i| {
                    let col = i % dst_w;
                    let row = i / dst_w;
                    let src_col = (((col as f64 + 0.5) * factor) as usize).min(src_w - 1);
                    let src_row = (((row as f64 + 0.5) * factor) as usize).min(src_h - 1);
                    band.data[src_row * src_w + src_col]
                })
                .collect();
            Band::new(band.name.clone(), (dst_w, dst_h), data)
        })
        .collect();

    Image {
        id: image.id.clone(),
        date: image.date,
        geo: target,
        bands,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_scale_is_identity() {
        let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], 2, 2);
        let image = Image::new("i", None, geo)
            .with_band(Band::new("B", (2, 2), vec![1.0, 2.0, 3.0, 4.0]))
            .unwrap();
        assert_eq!(resample_nearest(&image, 30.0).band("B").unwrap().data, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_downsample() {
        let geo = GeoInfo::new("", [0.0, 500.0, 0.0, 0.0, 0.0, -500.0], 4, 2);
        let image = Image::new("i", None, geo)
            .with_band(Band::new("B", (4, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]))
            .unwrap();
        let out = resample_nearest(&image, 1000.0);
        assert_eq!(out.geo.shape(), (2, 1));
        assert_eq!(out.band("B").unwrap().data, vec![6.0, 8.0]);
    }
}
