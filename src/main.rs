// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use rayon::ThreadPoolBuilder;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lst_calc::cli::{Cli, Commands};
use lst_calc::config::StudyConfig;
use lst_calc::io::{load_region, DriveExporter, LocalCatalog, WriteOptions};
use lst_calc::pipeline::{Study, StudyReport};
use lst_calc::processing::ParallelProcessor;
use lst_calc::render::{Legend, Palette, TitleOverlay};

/// What a study command runs
enum Job {
    All,
    Year(i32),
    Modis,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => StudyConfig::load(path).with_context(|| format!("Failed to load config {}", path.display()))?,
        None => StudyConfig::default(),
    };

    let job = match &cli.command {
        Commands::Legend => return print_legend(&config),
        Commands::Run => Job::All,
        Commands::Year { year } => Job::Year(*year),
        Commands::Modis => Job::Modis,
    };

    let threads = cli.threads.unwrap_or_else(num_cpus::get);
    ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .context("Failed to build thread pool")?;
    // Kernels run on the global pool configured above
    let processor = ParallelProcessor::new(None);

    let region = load_region(&cli.boundary, &config.region.attribute, &config.region.value)
        .with_context(|| format!("Failed to resolve region from {}", cli.boundary.display()))?;

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("Failed to create output directory {}", cli.output.display()))?;

    let catalog = LocalCatalog::new(&cli.catalog);
    let exporter = DriveExporter::new(&cli.output, WriteOptions::from(&config.export));

    let (report, layout) = {
        let mut study = Study::new(&config, &region, &catalog, &exporter, processor);
        if cli.quicklooks {
            let dir = cli.output.join("quicklooks");
            fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
            study = study.with_quicklooks(dir);
        }

        let report = match job {
            Job::All => study.run()?,
            Job::Year(year) => {
                let mut report = StudyReport::default();
                study.run_year(year, &mut report)?;
                report
            }
            Job::Modis => {
                let mut report = StudyReport::default();
                study.run_modis(&mut report)?;
                report
            }
        };
        let layout = study.map_layout(&report)?;
        (report, layout)
    };

    write_json(&cli.output.join("map_layout.json"), &layout)?;
    write_json(&cli.output.join("charts.json"), &report.charts)?;
    write_json(&cli.output.join("study_report.json"), &report)?;

    info!("Waiting for {} exports", report.exports_submitted.len());
    let exports = exporter.finish();
    for failed in exports.failed() {
        warn!("Export {} failed: {}", failed.description, failed.error.as_deref().unwrap_or(""));
    }
    write_json(&cli.output.join("exports.json"), &exports)?;

    println!(
        "Processing complete: {} years, {} skipped, {} of {} exports written to {}",
        report.years_processed.len(),
        report.years_skipped.len(),
        exports.completed().count(),
        report.exports_submitted.len() + report.exports_rejected.len(),
        cli.output.display()
    );
    Ok(())
}

fn print_legend(config: &StudyConfig) -> Result<()> {
    let palette = Palette::from_strs(config.legend.palette.as_slice())?;
    let legend = Legend::lst(&palette, config.legend.lst_min, config.legend.lst_max);
    let title = TitleOverlay::for_study(&config.region.value, &config.year_span());
    println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "title": title, "legend": legend }))?);
    Ok(())
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
