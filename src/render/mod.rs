// src/render/mod.rs
pub mod charts;
pub mod layers;
pub mod legend;
pub mod palette;

pub use charts::{ChartKind, ChartSpec};
pub use layers::{render_quicklook, Layer, LayerSpec, MapLayout, RgbRaster, VisParams};
pub use legend::{Legend, TitleOverlay};
pub use palette::{Palette, Rgb};
