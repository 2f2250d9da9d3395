//! Traces county greenness across one year's half-month rasters.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use super::make_output_file_name;
use crate::cli::create_progress_bar;
use crate::config::Config;
use crate::first_passage::day_of_year;
use crate::greenness::{half_month_dates, weighted_greenness};
use crate::parquet::load_weights;
use crate::raster::{GimmsArchive, RasterCache};

pub fn trace(config: &Config, year: i32, weights_path: &Path, out: Option<PathBuf>) -> Result<String> {
    let counties = load_weights(weights_path)?;
    info!("loaded pixel weights for {} counties", counties.len());

    let archive = GimmsArchive::new(&config.paths.gimms_dir);
    let mut cache = RasterCache::new(&archive);

    let out_path = out.unwrap_or_else(|| make_output_file_name("trace", "csv"));
    let mut writer = csv::Writer::from_path(&out_path)
        .with_context(|| format!("could not create {}", out_path.display()))?;
    writer.write_record(["geoid", "day", "greenness"])?;

    let dates = half_month_dates(year);
    let bar = create_progress_bar(dates.len() as u64, "Sampling half-month rasters".to_string());

    for date in dates {
        let day = day_of_year(date);
        let raster = cache.raster_for(date)?;
        for county in &counties {
            if let Some(value) = weighted_greenness(raster, county) {
                writer.write_record([
                    county.geoid.to_string(),
                    day.to_string(),
                    value.to_string(),
                ])?;
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message("Trace complete");
    writer.flush()?;

    Ok(format!("File saved to `{}`", out_path.display()))
}
