// src/processing/mod.rs
pub mod cloud_mask;
pub mod composite;
pub mod indices;
pub mod parallel;
pub mod reduce;
pub mod resample;
pub mod scale;

// Re-export main components
pub use parallel::{IndexCalculator, ParallelProcessor};
