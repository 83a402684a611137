// src/processing/indices/mod.rs
pub mod emissivity;
pub mod lst;
pub mod ndi;

// Re-export indices
pub use emissivity::{Emissivity, NdviRange, VegetationProportion};
pub use lst::LandSurfaceTemperature;
pub use ndi::NDI;
