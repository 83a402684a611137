// src/io/mod.rs
pub mod boundary;
pub mod catalog;
pub mod drive;
pub mod reader;
pub mod table;
pub mod writer;

pub use boundary::load_region;
pub use catalog::LocalCatalog;
pub use drive::{DriveExporter, ExportReport};
pub use reader::read_band;
pub use table::write_time_series;
pub use writer::{write_image, write_rgb, WriteOptions};
