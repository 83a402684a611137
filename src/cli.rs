use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lst-calc")]
#[command(version, about = "Land surface temperature and NDVI study for Landsat 8 and MODIS")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Study configuration (JSON); every field is optional
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Boundary feature collection (GeoJSON)
    #[arg(short, long, default_value = "boundaries.geojson", global = true)]
    pub boundary: PathBuf,

    /// Root directory of the local scene catalog
    #[arg(long, default_value = "catalog", global = true)]
    pub catalog: PathBuf,

    /// Output directory for exports, map layout and charts
    #[arg(short, long, default_value = "output", global = true)]
    pub output: PathBuf,

    /// Worker threads for raster processing (default: all CPUs)
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Also write RGB quicklook GeoTIFFs of every map layer
    #[arg(long, global = true)]
    pub quicklooks: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Every configured year, then the MODIS time series
    Run,

    /// A single Landsat year
    Year {
        /// Year to process
        year: i32,
    },

    /// MODIS mean LST and time series only
    Modis,

    /// Print the LST legend and map title as JSON
    Legend,
}
