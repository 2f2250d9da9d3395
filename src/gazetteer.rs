//! County gazetteer loader.
//!
//! The source is the attribute table of the TIGER county shapefile,
//! exported as tab-delimited text with one county per row:
//!
//! `STATEFP COUNTYFP GEOID NAME NAMELSAD INTPTLAT INTPTLON WEST EAST SOUTH NORTH`
//!
//! GEOID is the concatenation of state and county FIPS codes; NAME and
//! NAMELSAD are the two name variants the resolver matches against.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::debug;

pub type CountyId = u32;

/// Bounding box in lat-long, as the shapefile envelope orders it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

#[derive(Debug, Clone)]
pub struct County {
    pub geoid: CountyId,
    pub state_fips: u32,
    pub name: String,
    pub name_lsad: String,
    pub lat: f64,
    pub lon: f64,
    pub bounds: Bounds,
}

impl County {
    fn from_record(record: &StringRecord) -> Result<Self> {
        let field = |idx: usize| -> Result<&str> {
            record
                .get(idx)
                .ok_or_else(|| anyhow!("missing field {} in {:?}", idx, record))
        };

        Ok(County {
            state_fips: field(0)?.trim().parse()?,
            geoid: field(2)?.trim().parse()?,
            name: field(3)?.to_string(),
            name_lsad: field(4)?.to_string(),
            lat: field(5)?.trim().parse()?,
            lon: field(6)?.trim().parse()?,
            bounds: Bounds {
                west: field(7)?.trim().parse()?,
                east: field(8)?.trim().parse()?,
                south: field(9)?.trim().parse()?,
                north: field(10)?.trim().parse()?,
            },
        })
    }
}

/// Normalizes a place name for matching: periods stripped, surrounding
/// whitespace removed, uppercased.
pub fn normalize_name(name: &str) -> String {
    name.replace('.', "").trim().to_uppercase()
}

/// The loaded county dataset: direct lookup by GEOID plus a per-state
/// index of normalized name variants, in file order, for the resolver.
#[derive(Debug, Default)]
pub struct Gazetteer {
    counties: HashMap<CountyId, County>,
    by_state: HashMap<u32, Vec<(CountyId, [String; 2])>>,
}

impl Gazetteer {
    /// One-time startup load. Any failure here is fatal for the run.
    pub fn load(path: &Path) -> Result<Gazetteer> {
        let file = File::open(path)
            .with_context(|| format!("could not open county gazetteer {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("could not parse county gazetteer {}", path.display()))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Gazetteer> {
        let mut gazetteer = Gazetteer::default();
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .delimiter(b'\t')
            .from_reader(reader);

        for record in csv_reader.records() {
            let record = record?;
            let county = County::from_record(&record)
                .with_context(|| format!("bad gazetteer record {:?}", record))?;
            let names = [
                normalize_name(&county.name),
                normalize_name(&county.name_lsad),
            ];
            gazetteer
                .by_state
                .entry(county.state_fips)
                .or_default()
                .push((county.geoid, names));
            gazetteer.counties.insert(county.geoid, county);
        }

        debug!("gazetteer holds {} counties", gazetteer.counties.len());
        Ok(gazetteer)
    }

    pub fn get(&self, geoid: CountyId) -> Option<&County> {
        self.counties.get(&geoid)
    }

    /// Name variants of every county in a state, in file order.
    pub fn county_index(&self, state_fips: u32) -> Option<&[(CountyId, [String; 2])]> {
        self.by_state.get(&state_fips).map(Vec::as_slice)
    }

    pub fn lat_long(&self, geoid: CountyId) -> Option<(f64, f64)> {
        self.counties.get(&geoid).map(|c| (c.lat, c.lon))
    }

    pub fn len(&self) -> usize {
        self.counties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counties.is_empty()
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const FIXTURE: &str = "\
19\t169\t19169\tStory\tStory County\t42.0362\t-93.4650\t-93.6985\t-93.2315\t41.8627\t42.2097
19\t153\t19153\tPolk\tPolk County\t41.6855\t-93.5733\t-93.8158\t-93.3278\t41.5009\t41.8630
28\t107\t28107\tPanola\tPanola County\t34.3637\t-89.9505\t-90.1365\t-89.7218\t34.1564\t34.5991
";

    pub(crate) fn fixture() -> Gazetteer {
        Gazetteer::from_reader(FIXTURE.as_bytes()).unwrap()
    }

    #[test]
    fn should_load_counties() {
        let gazetteer = fixture();
        assert_eq!(gazetteer.len(), 3);

        let story = gazetteer.get(19169).unwrap();
        assert_eq!(story.state_fips, 19);
        assert_eq!(story.name, "Story");
        assert_eq!(story.name_lsad, "Story County");
        assert!((story.lat - 42.0362).abs() < 1e-9);
        assert!((story.bounds.north - 42.2097).abs() < 1e-9);
    }

    #[test]
    fn should_index_by_state_in_file_order() {
        let gazetteer = fixture();
        let iowa = gazetteer.county_index(19).unwrap();
        assert_eq!(iowa.len(), 2);
        assert_eq!(iowa[0].0, 19169);
        assert_eq!(iowa[0].1, ["STORY".to_string(), "STORY COUNTY".to_string()]);
        assert_eq!(iowa[1].0, 19153);
        assert!(gazetteer.county_index(99).is_none());
    }

    #[test]
    fn should_expose_lat_long() {
        let gazetteer = fixture();
        let (lat, lon) = gazetteer.lat_long(28107).unwrap();
        assert!((lat - 34.3637).abs() < 1e-9);
        assert!((lon + 89.9505).abs() < 1e-9);
        assert_eq!(gazetteer.lat_long(12345), None);
    }

    #[test]
    fn should_normalize_names() {
        assert_eq!(normalize_name(" St. Croix  "), "ST CROIX");
        assert_eq!(normalize_name("story"), "STORY");
    }

    #[test]
    fn should_fail_on_short_record() {
        let result = Gazetteer::from_reader("19\t169\t19169\tStory\n".as_bytes());
        assert!(result.is_err());
    }
}
