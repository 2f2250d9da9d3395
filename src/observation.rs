//! Streams disease-observation records from the survey CSV.
//!
//! Columns, in file order: year, collection, isolate, date, state, county,
//! host_code, crop_stage, cultivar, severity, prevalence, source, ecoarea.
//! Rows whose first field is not all digits are header or commentary and
//! are skipped outright. A row with a bad date or an unresolvable county
//! is logged with its original text and excluded from every reduction;
//! unparseable severity/prevalence codes only leave those fields unset.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};
use log::{debug, warn};

use crate::error::RecordError;
use crate::gazetteer::CountyId;
use crate::resolve::Resolver;

const DATE_FIELD: usize = 3;
const STATE_FIELD: usize = 4;
const COUNTY_FIELD: usize = 5;
const CROP_STAGE_FIELD: usize = 7;
const SEVERITY_FIELD: usize = 9;
const PREVALENCE_FIELD: usize = 10;

#[derive(Debug, Clone)]
pub struct Observation {
    pub year: i32,
    pub date: NaiveDate,
    pub state: String,
    pub county: String,
    pub geoid: CountyId,
    pub crop_stage: Option<String>,
    pub severity: Option<f64>,
    pub prevalence: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadStats {
    pub included: usize,
    pub skipped: usize,
}

/// Lazy pull-based stream: parse, normalize, resolve, filter, one record
/// at a time. Errors come through the iterator as items so callers can
/// count them, and are logged here so no failure is silent either way.
pub struct ObservationStream<'a, R: Read> {
    records: StringRecordsIntoIter<R>,
    resolver: &'a Resolver<'a>,
    stats: LoadStats,
}

impl<'a> ObservationStream<'a, File> {
    pub fn open(path: &Path, resolver: &'a Resolver<'a>) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("could not open observation file {}", path.display()))?;
        Ok(Self::from_reader(file, resolver))
    }
}

impl<'a, R: Read> ObservationStream<'a, R> {
    pub fn from_reader(reader: R, resolver: &'a Resolver<'a>) -> Self {
        let records = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader)
            .into_records();
        ObservationStream {
            records,
            resolver,
            stats: LoadStats::default(),
        }
    }

    pub fn stats(&self) -> LoadStats {
        self.stats
    }

    fn parse_record(&self, record: &StringRecord) -> Result<Observation, RecordError> {
        let field = |idx: usize| record.get(idx).unwrap_or("").trim();

        let year: i32 = field(0)
            .parse()
            .map_err(|_| RecordError::MalformedRow(format!("{:?}", record)))?;
        let date = parse_date(year, field(DATE_FIELD))?;
        let state = field(STATE_FIELD).to_string();
        let county = field(COUNTY_FIELD).to_string();
        let geoid = self.resolver.resolve(&state, &county)?;

        Ok(Observation {
            year,
            date,
            state,
            county,
            geoid,
            crop_stage: parse_code(field(CROP_STAGE_FIELD)),
            severity: parse_quantity(field(SEVERITY_FIELD)),
            prevalence: parse_quantity(field(PREVALENCE_FIELD)),
        })
    }
}

impl<'a, R: Read> Iterator for ObservationStream<'a, R> {
    type Item = Result<Observation, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.stats.skipped += 1;
                    warn!("unreadable observation row: {}", e);
                    return Some(Err(RecordError::MalformedRow(e.to_string())));
                }
            };

            // Header and commentary rows carry no leading year.
            let first = record.get(0).unwrap_or("").trim();
            if first.is_empty() || !first.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }

            match self.parse_record(&record) {
                Ok(observation) => {
                    self.stats.included += 1;
                    return Some(Ok(observation));
                }
                Err(e) => {
                    self.stats.skipped += 1;
                    warn!("{} in row {:?}", e, record);
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Survey dates arrive in two shapes: all digits means MMDD against the
/// row's year column (the last two characters are the day), a slash means
/// M/D. Anything else is a date error.
pub fn parse_date(year: i32, text: &str) -> Result<NaiveDate, RecordError> {
    let err = || RecordError::DateParse(text.to_string());

    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        if text.len() < 3 {
            return Err(err());
        }
        let (month_part, day_part) = text.split_at(text.len() - 2);
        let month: u32 = month_part.parse().map_err(|_| err())?;
        let day: u32 = day_part.parse().map_err(|_| err())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err);
    }

    if text.contains('/') {
        let mut parts = text.split('/');
        let month: u32 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let day: u32 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err);
    }

    Err(err())
}

fn parse_code(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Best-effort numeric parse for severity/prevalence. Codes like "tr"
/// (trace) are not numbers; the field stays unset and the row survives.
fn parse_quantity(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    match text.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            debug!("non-numeric quantity field {:?} left unset", text);
            None
        }
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::tests::fixture;
    use crate::states::StateTable;

    fn collect(input: &str) -> (Vec<Observation>, LoadStats) {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);
        let mut stream = ObservationStream::from_reader(input.as_bytes(), &resolver);
        let mut observations = Vec::new();
        for item in stream.by_ref() {
            if let Ok(observation) = item {
                observations.push(observation);
            }
        }
        (observations, stream.stats())
    }

    #[test]
    fn should_parse_mmdd_row() {
        let input = "2005,1,ISO1,0315,IA,STORY,2,F,,20,tr,SURVEY,3\n";
        let (observations, stats) = collect(input);

        assert_eq!(stats.included, 1);
        assert_eq!(stats.skipped, 0);
        let obs = &observations[0];
        assert_eq!(obs.year, 2005);
        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2005, 3, 15).unwrap());
        assert_eq!(obs.geoid, 19169);
        assert_eq!(obs.crop_stage, Some("F".to_string()));
        assert_eq!(obs.severity, Some(20.0));
        // "tr" is not numeric, field stays unset, row is kept
        assert_eq!(obs.prevalence, None);
    }

    #[test]
    fn should_parse_slash_date() {
        let input = "2007,1,ISO9,4/2,MS,PANOLA,2,,,,,SURVEY,\n";
        let (observations, _) = collect(input);
        assert_eq!(
            observations[0].date,
            NaiveDate::from_ymd_opt(2007, 4, 2).unwrap()
        );
    }

    #[test]
    fn should_skip_header_row_silently() {
        let input = "\
year,collection,isolate,date,state,county,host,stage,cultivar,sev,prev,source,eco
2005,1,ISO1,0315,IA,STORY,2,,,,,SURVEY,
";
        let (observations, stats) = collect(input);
        assert_eq!(observations.len(), 1);
        assert_eq!(stats.skipped, 0);
    }

    #[test]
    fn should_exclude_bad_date_but_continue() {
        let input = "\
2005,1,ISO1,bogus,IA,STORY,2,,,,,SURVEY,
2005,1,ISO2,0315,IA,POLK,2,,,,,SURVEY,
";
        let (observations, stats) = collect(input);
        assert_eq!(observations.len(), 1);
        assert_eq!(observations[0].geoid, 19153);
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn should_exclude_unresolved_county() {
        let input = "2005,1,ISO1,0315,IA,ZZZBOGUS,2,,,,,SURVEY,\n";
        let (observations, stats) = collect(input);
        assert!(observations.is_empty());
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn should_report_error_kind_through_stream() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);
        let input = "2005,1,ISO1,0315,XQ,STORY,2,,,,,SURVEY,\n";
        let mut stream = ObservationStream::from_reader(input.as_bytes(), &resolver);

        match stream.next() {
            Some(Err(RecordError::UnknownState(text))) => assert_eq!(text, "XQ"),
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn should_parse_short_mmdd() {
        // three digits: single-digit month, two-digit day
        assert_eq!(
            parse_date(2005, "315").unwrap(),
            NaiveDate::from_ymd_opt(2005, 3, 15).unwrap()
        );
    }

    #[test]
    fn should_reject_impossible_dates() {
        assert!(parse_date(2005, "1332").is_err());
        assert!(parse_date(2005, "0/1").is_err());
        assert!(parse_date(2005, "15").is_err());
        assert!(parse_date(2005, "").is_err());
    }
}
