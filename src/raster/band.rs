// src/raster/band.rs
use rayon::prelude::*;

/// A single raster band, row-major. Masked pixels hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl Band {
    pub fn new(name: impl Into<String>, shape: (usize, usize), data: Vec<f32>) -> Self {
        debug_assert_eq!(shape.0 * shape.1, data.len());
        Self {
            name: name.into(),
            width: shape.0,
            height: shape.1,
            data,
        }
    }

    pub fn filled(name: impl Into<String>, shape: (usize, usize), value: f32) -> Self {
        Self::new(name, shape, vec![value; shape.0 * shape.1])
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Apply `f` to every unmasked pixel; masked pixels stay masked
    pub fn map<F>(&self, f: F) -> Band
    where
        F: Fn(f32) -> f32 + Sync,
    {
        let data = self
            .data
            .par_iter()
            .map(|&v| if v.is_nan() { f32::NAN } else { f(v) })
            .collect();
        Band::new(self.name.clone(), self.shape(), data)
    }

    /// Mask every pixel where `keep` is false
    pub fn update_mask(&mut self, keep: &[bool]) {
        debug_assert_eq!(keep.len(), self.data.len());
        self.data
            .par_iter_mut()
            .zip(keep.par_iter())
            .for_each(|(v, &k)| {
                if !k {
                    *v = f32::NAN;
                }
            });
    }

    /// Copy of the `shape` pixels starting at column `col`, row `row`
    pub fn window(&self, col: usize, row: usize, shape: (usize, usize)) -> Band {
        let (w, h) = shape;
        debug_assert!(col + w <= self.width && row + h <= self.height);
        let data = (row..row + h)
            .flat_map(|r| {
                let start = r * self.width + col;
                self.data[start..start + w].iter().copied()
            })
            .collect();
        Band::new(self.name.clone(), shape, data)
    }

    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_nan()).count()
    }

    pub fn valid_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.data.iter().copied().filter(|v| !v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_preserves_mask() {
        let band = Band::new("b", (3, 1), vec![1.0, f32::NAN, 3.0]);
        let doubled = band.map(|v| v * 2.0);
        assert_eq!(doubled.data[0], 2.0);
        assert!(doubled.data[1].is_nan());
        assert_eq!(doubled.data[2], 6.0);
        assert_eq!(doubled.valid_count(), 2);
    }

    #[test]
    fn test_update_mask() {
        let mut band = Band::filled("b", (2, 2), 1.0);
        band.update_mask(&[true, false, false, true]);
        assert_eq!(band.valid_count(), 2);
        assert!(band.data[1].is_nan());
    }

    #[test]
    fn test_window() {
        let band = Band::new("b", (3, 3), (0..9).map(|v| v as f32).collect());
        let window = band.window(1, 1, (2, 2));
        assert_eq!(window.shape(), (2, 2));
        assert_eq!(window.data, vec![4.0, 5.0, 7.0, 8.0]);
    }
}
