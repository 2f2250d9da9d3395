//! Reduces the land-cover dumps to per-county pixel weights and saves
//! them for reuse.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use glob::glob;
use log::{info, warn};

use super::make_output_file_name;
use crate::config::Config;
use crate::parquet::save_weights;
use crate::weights::build;

pub fn weights(config: &Config, out: Option<PathBuf>) -> Result<String> {
    let files = landcover_files(config)?;
    info!("reading {} land-cover files", files.len());

    let mut readers = Vec::new();
    for path in &files {
        let file = File::open(path)
            .with_context(|| format!("could not open land-cover file {}", path.display()))?;
        readers.push(BufReader::new(file));
    }

    let lines = readers.into_iter().flat_map(|reader| {
        reader.lines().filter_map(|line| match line {
            Ok(line) => Some(line),
            Err(e) => {
                warn!("read error in land-cover stream: {}", e);
                None
            }
        })
    });

    let counties = build(lines, &config.codes.wheat);
    info!("build found {} counties", counties.len());

    let out_path = out.unwrap_or_else(|| make_output_file_name("weights", "parquet"));
    save_weights(&counties, &out_path)?;

    Ok(format!("File saved to `{}`", out_path.display()))
}

fn landcover_files(config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in &config.paths.landcover {
        let entries =
            glob(pattern).with_context(|| format!("bad land-cover pattern {:?}", pattern))?;
        for entry in entries {
            match entry {
                Ok(path) => files.push(path),
                Err(e) => warn!("bad path from glob: {}", e),
            }
        }
    }
    files.sort();

    if files.is_empty() {
        bail!(
            "no land-cover files match {:?}",
            config.paths.landcover
        );
    }
    Ok(files)
}
