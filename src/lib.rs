// src/lib.rs
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod processing;
pub mod raster;
pub mod region;
pub mod render;
pub mod utils;

pub use error::{LstError, Result};

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
