//! Command line interface.

pub mod command;

use std::path::PathBuf;
use std::time::Duration;

use clap::{command, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

#[derive(Parser)]
#[command(version, about, long_about = None)]
/// Contains the commands
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "wheatrust.toml")]
    pub config: PathBuf,

    /// Print debug messages
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and unpack the county gazetteer archive
    Fetch {},
    /// Write the first-passage table from the observation survey
    FirstPassage {
        /// Append crop stage, severity and prevalence columns
        #[arg(long)]
        codes: bool,
        /// Output file path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List counties with at least one resolved observation
    Counties {},
    /// Build per-county pixel weights from the land-cover dumps
    Weights {
        /// Output parquet path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Sample county greenness at each first-passage date
    Greenness {
        /// Pixel-weight parquet produced by `weights`
        #[arg(long)]
        weights: PathBuf,
        /// Output file path
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Trace county greenness over one year's half-month rasters
    Trace {
        /// The year of interest
        #[arg(long)]
        year: i32,
        /// Pixel-weight parquet produced by `weights`
        #[arg(long)]
        weights: PathBuf,
        /// Output file path
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Sets the logger up from the verbosity flags. `RUST_LOG` still wins
/// when it is set.
pub fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.parse_default_env();
    builder.init();
}

/// Creates a spinner.
pub fn create_spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));

    bar
}

/// Creates a progress bar.
pub fn create_progress_bar(size: u64, message: String) -> ProgressBar {
    ProgressBar::new(size).with_message(message).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {msg}")
            .unwrap()
            .progress_chars("##-"),
    )
}
