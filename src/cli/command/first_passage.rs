//! Builds the first-passage table and writes it for the fitting scripts.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use log::info;

use super::make_output_file_name;
use crate::cli::create_spinner;
use crate::config::Config;
use crate::first_passage::{write_table, FirstPassage};
use crate::gazetteer::Gazetteer;
use crate::observation::{LoadStats, ObservationStream};
use crate::resolve::Resolver;
use crate::states::StateTable;

pub fn first_passage(config: &Config, codes: bool, out: Option<PathBuf>) -> Result<String> {
    let (gazetteer, table, _stats) = build_table(config)?;
    info!("first passage covers {} county-years", table.len());

    let out_path = out.unwrap_or_else(|| make_output_file_name("first-passage", "txt"));
    let file = File::create(&out_path)
        .with_context(|| format!("could not create {}", out_path.display()))?;
    write_table(BufWriter::new(file), &table, &gazetteer, codes)?;

    Ok(format!("File saved to `{}`", out_path.display()))
}

/// Shared pipeline: gazetteer, resolver, observation stream, then the
/// first-passage reduction. Everything is constructed here and dropped
/// with the run; the resolver and stream only borrow.
pub(crate) fn build_table(config: &Config) -> Result<(Gazetteer, FirstPassage, LoadStats)> {
    let spinner = create_spinner("Loading county gazetteer...".to_string());
    let states = StateTable::load();
    let gazetteer = Gazetteer::load(&config.paths.gazetteer)?;
    spinner.finish_with_message(format!("Loaded {} counties", gazetteer.len()));

    let resolver = Resolver::new(&states, &gazetteer);
    let mut stream = ObservationStream::open(&config.paths.observations, &resolver)?;

    let mut table = FirstPassage::default();
    for item in stream.by_ref() {
        if let Ok(observation) = item {
            table.record(&observation);
        }
    }
    let stats = stream.stats();
    info!(
        "{} observations included, {} skipped",
        stats.included, stats.skipped
    );

    Ok((gazetteer, table, stats))
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;
    use crate::first_passage::day_of_year;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    const GAZETTEER: &str = "\
19\t169\t19169\tStory\tStory County\t42.0362\t-93.4650\t-93.6985\t-93.2315\t41.8627\t42.2097
19\t153\t19153\tPolk\tPolk County\t41.6855\t-93.5733\t-93.8158\t-93.3278\t41.5009\t41.8630
";

    const OBSERVATIONS: &str = "\
year,collection,isolate,date,state,county,host,stage,cultivar,sev,prev,source,eco
2005,1,ISO1,0315,IA,STORY,2,F,,20,tr,SURVEY,3
2005,2,ISO2,3/27,IA,STORY,2,,,,,SURVEY,3
2005,3,ISO3,0315,IA,ZZZBOGUS,2,,,,,SURVEY,3
2005,4,ISO4,0402,IA,Polk County,2,,,,,SURVEY,3
";

    fn fixture_config(dir: &TempDir) -> Config {
        let gazetteer_path = dir.path().join("county_gazetteer.txt");
        let observations_path = dir.path().join("cereal_rust.csv");
        fs::write(&gazetteer_path, GAZETTEER).unwrap();
        fs::write(&observations_path, OBSERVATIONS).unwrap();

        let mut config = Config::default();
        config.paths.gazetteer = gazetteer_path;
        config.paths.observations = observations_path;
        config
    }

    #[test]
    fn should_run_pipeline_end_to_end() {
        let dir = TempDir::new().unwrap();
        let config = fixture_config(&dir);

        let (gazetteer, table, stats) = build_table(&config).unwrap();

        assert_eq!(stats.included, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(table.len(), 2);

        // Story's later sighting never creates a second entry
        let day70 = day_of_year(NaiveDate::from_ymd_opt(2005, 3, 15).unwrap());
        let days = table.year(2005).unwrap();
        assert_eq!(days[&day70][0].geoid, 19169);
        assert_eq!(days.len(), 2);

        let mut buffer = Vec::new();
        write_table(&mut buffer, &table, &gazetteer, false).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("42.0362 -93.465 2005 73 19169"));
        assert!(text.contains("2005 91 19153"));
    }
}
