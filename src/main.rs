//! Beach slope estimation from satellite-derived shorelines.
//!
//! Usage:
//! ```text
//! estimate-slope --config narra.toml
//! estimate-slope --data-dir example_data --site NARRA --output slopes.txt -v
//! ```
//!
//! Without a configuration file the defaults reproduce the Narrabeen example
//! run. Slopes are printed to stdout, progress is logged to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use slope_rs::config::SlopeConfig;
use slope_rs::{logging, pipeline};

#[derive(Parser)]
#[command(name = "estimate-slope")]
#[command(about = "Estimate beach slopes from satellite shorelines and tide levels")]
#[command(version)]
struct Args {
    /// TOML run configuration
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Directory with the input files (overrides the configuration)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Site name (overrides the configuration)
    #[arg(long)]
    site: Option<String>,

    /// Directory for figures (overrides the configuration)
    #[arg(long, value_name = "DIR")]
    plot_dir: Option<PathBuf>,

    /// Do not write figures
    #[arg(long)]
    no_plots: bool,

    /// Write the slope table to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn into_config(self) -> anyhow::Result<SlopeConfig> {
        let mut config = match &self.config {
            Some(path) => SlopeConfig::load(path)
                .with_context(|| format!("loading configuration {}", path.display()))?,
            None => SlopeConfig::default(),
        };

        if let Some(dir) = self.data_dir {
            config.site.data_dir = dir;
        }
        if let Some(site) = self.site {
            config.site.name = site;
        }
        if let Some(dir) = self.plot_dir {
            config.output.plot_dir = dir;
        }
        if self.no_plots {
            config.output.plots = false;
        }
        if self.output.is_some() {
            config.output.slope_file = self.output;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose).context("initialising logging")?;

    let config = args.into_config()?;
    let report = pipeline::run(&config)
        .with_context(|| format!("estimating slopes for {}", config.site.name))?;

    for estimate in &report.estimates {
        println!(
            "Beach slope at transect {}: {:.3}",
            estimate.transect, estimate.slope
        );
    }
    if !report.skipped.is_empty() {
        tracing::warn!(transects = ?report.skipped, "transects without an estimate");
    }

    Ok(())
}
