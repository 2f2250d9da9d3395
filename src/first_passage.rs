//! First-passage reduction: for each year, the earliest day a county was
//! observed.
//!
//! A single forward pass in stream order. The first time a (year, county)
//! pair appears, the county is recorded under that day-of-year; later
//! sightings of the pair are skipped. Counties recorded on the same day
//! keep their arrival order. Whether "first in the stream" is also the
//! minimum date is up to the input being date-sorted; no sort happens
//! here.

use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use log::warn;

use crate::gazetteer::{CountyId, Gazetteer};
use crate::observation::Observation;

/// Day index within the date's year, with January 1 = 0.
pub fn day_of_year(date: NaiveDate) -> u16 {
    let jan1 = NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap();
    (date - jan1).num_days() as u16
}

/// One first-observation entry, carrying the free-form codes of the
/// observation that triggered it for the extended output table.
#[derive(Debug, Clone)]
pub struct FirstEntry {
    pub geoid: CountyId,
    pub crop_stage: Option<String>,
    pub severity: Option<f64>,
    pub prevalence: Option<f64>,
}

#[derive(Debug, Default)]
pub struct FirstPassage {
    years: BTreeMap<i32, BTreeMap<u16, Vec<FirstEntry>>>,
    seen: HashSet<(i32, CountyId)>,
}

impl FirstPassage {
    pub fn from_observations<I>(observations: I) -> FirstPassage
    where
        I: IntoIterator<Item = Observation>,
    {
        let mut table = FirstPassage::default();
        for observation in observations {
            table.record(&observation);
        }
        table
    }

    pub fn record(&mut self, observation: &Observation) {
        let year = observation.date.year();
        if !self.seen.insert((year, observation.geoid)) {
            return;
        }
        let day = day_of_year(observation.date);
        self.years
            .entry(year)
            .or_default()
            .entry(day)
            .or_default()
            .push(FirstEntry {
                geoid: observation.geoid,
                crop_stage: observation.crop_stage.clone(),
                severity: observation.severity,
                prevalence: observation.prevalence,
            });
    }

    pub fn years(&self) -> impl Iterator<Item = (i32, &BTreeMap<u16, Vec<FirstEntry>>)> {
        self.years.iter().map(|(year, days)| (*year, days))
    }

    pub fn year(&self, year: i32) -> Option<&BTreeMap<u16, Vec<FirstEntry>>> {
        self.years.get(&year)
    }

    /// Every entry as (year, day, entry), years and days ascending.
    pub fn iter(&self) -> impl Iterator<Item = (i32, u16, &FirstEntry)> {
        self.years.iter().flat_map(|(year, days)| {
            days.iter().flat_map(move |(day, entries)| {
                entries.iter().map(move |entry| (*year, *day, entry))
            })
        })
    }

    /// Distinct counties carrying at least one observation, sorted.
    pub fn counties(&self) -> Vec<CountyId> {
        let mut counties: Vec<CountyId> = self
            .seen
            .iter()
            .map(|(_, geoid)| *geoid)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        counties.sort_unstable();
        counties
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Writes the table consumed by the R fitting scripts:
/// `lat long year day geoid`, space-delimited, one row per entry.
/// With `with_codes`, crop stage / severity / prevalence follow as three
/// extra columns, `NA` where unset.
pub fn write_table<W: Write>(
    mut out: W,
    table: &FirstPassage,
    gazetteer: &Gazetteer,
    with_codes: bool,
) -> Result<()> {
    if with_codes {
        writeln!(out, "lat long year day geoid crop_stage severity prevalence")?;
    } else {
        writeln!(out, "lat long year day geoid")?;
    }

    for (year, day, entry) in table.iter() {
        let Some((lat, lon)) = gazetteer.lat_long(entry.geoid) else {
            warn!("no centroid for county {}, row skipped", entry.geoid);
            continue;
        };
        write!(out, "{} {} {} {} {}", lat, lon, year, day, entry.geoid)?;
        if with_codes {
            write!(
                out,
                " {} {} {}",
                entry.crop_stage.as_deref().unwrap_or("NA"),
                entry.severity.map_or("NA".to_string(), |v| v.to_string()),
                entry.prevalence.map_or("NA".to_string(), |v| v.to_string()),
            )?;
        }
        writeln!(out)?;
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------
