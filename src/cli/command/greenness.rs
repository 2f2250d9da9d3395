//! Samples county greenness at each first-passage date.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use log::{debug, info};

use super::make_output_file_name;
use crate::config::Config;
use crate::gazetteer::CountyId;
use crate::greenness::weighted_greenness;
use crate::parquet::load_weights;
use crate::raster::{GimmsArchive, RasterCache};
use crate::weights::CountyPixels;

pub fn greenness(config: &Config, weights_path: &Path, out: Option<PathBuf>) -> Result<String> {
    let counties = load_weights(weights_path)?;
    info!("loaded pixel weights for {} counties", counties.len());
    let by_geoid: HashMap<CountyId, &CountyPixels> =
        counties.iter().map(|c| (c.geoid, c)).collect();

    let (_gazetteer, table, _stats) = super::first_passage::build_table(config)?;

    let archive = GimmsArchive::new(&config.paths.gimms_dir);
    let mut cache = RasterCache::new(&archive);

    let out_path = out.unwrap_or_else(|| make_output_file_name("greenness", "csv"));
    let mut writer = csv::Writer::from_path(&out_path)
        .with_context(|| format!("could not create {}", out_path.display()))?;
    writer.write_record(["geoid", "year", "day", "greenness"])?;

    let mut sampled = 0usize;
    for (year, days) in table.years() {
        for (day, entries) in days {
            let date = NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
                + Duration::days(i64::from(*day));
            let raster = cache.raster_for(date)?;

            for entry in entries {
                let Some(county) = by_geoid.get(&entry.geoid) else {
                    debug!("no pixel weights for county {}", entry.geoid);
                    continue;
                };
                match weighted_greenness(raster, county) {
                    Some(value) => {
                        writer.write_record([
                            entry.geoid.to_string(),
                            year.to_string(),
                            day.to_string(),
                            value.to_string(),
                        ])?;
                        sampled += 1;
                    }
                    None => debug!("no usable ndvi for county {} on {}", entry.geoid, date),
                }
            }
        }
    }
    writer.flush()?;

    Ok(format!(
        "File saved to `{}` ({} samples)",
        out_path.display(),
        sampled
    ))
}
