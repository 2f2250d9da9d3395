//! US state lookup table: postal code, FIPS code, name, and centroid.
//!
//! The table is compiled in because it never changes and every run needs
//! it before anything else loads. Centers are approximate; the study only
//! needs them for plotting downstream.

use std::collections::HashMap;

// postal, name words, FIPS, longitude, latitude
const STATE_CENTERS: &str = "
DC District of Columbia 11 -77.01692 38.89078
AK Alaska 02 -149.05656 63.08239
AL Alabama 01 -86.68338 32.60661
AR Arkansas 05 -92.12893 34.75712
AS American Samoa 60 -170.70473 -14.31125
AZ Arizona 04 -111.93248 34.17163
CA California 06 -119.25700 37.26842
CO Colorado 08 -105.54781 38.99604
CT Connecticut 09 -72.75720 41.52281
DE Delaware 10 -75.41699 39.14561
FL Florida 12 -81.68751 28.06163
GA Georgia 13 -83.22671 32.67985
GU Guam 66 144.78514 13.44272
HI Hawaii 15 -155.43683 19.59269
IA Iowa 19 -93.39193 41.93699
ID Idaho 16 -114.14093 45.49204
IL Illinois 17 -89.51148 39.74655
IN Indiana 18 -86.44417 39.77044
KS Kansas 20 -98.32368 38.49518
KY Kentucky 21 -85.76394 37.81914
LA Louisiana 22 -91.42602 30.97712
MA Massachusetts 25 -71.71267 42.06141
MD Maryland 24 -76.74451 38.82523
ME Maine 23 -69.02289 45.26101
MI Michigan 26 -84.62436 43.74509
MN Minnesota 27 -93.35500 46.43515
MO Missouri 29 -92.43575 38.29989
MP Marianas 69 145.75757 15.19046
MS Mississippi 28 -89.86849 32.59474
MT Montana 30 -110.05062 46.67912
NC North Carolina 37 -79.88784 35.21638
ND North Dakota 38 -100.30356 47.46736
NE Nebraska 31 -99.68333 41.49784
NH New Hampshire 33 -71.63407 43.99997
NJ New Jersey 34 -74.37751 40.13828
NM New Mexico 35 -106.02717 34.17184
NV Nevada 32 -117.01664 38.50227
NY New York 36 -75.81028 42.75633
OH Ohio 39 -82.67375 40.19406
OK Oklahoma 40 -98.71880 35.31003
OR Oregon 41 -120.51327 44.13156
PA Pennsylvania 42 -77.61161 40.99494
PR Puerto Rico 72 -66.58765 18.19958
RI Rhode Island 44 -71.50537 41.57887
SC South Carolina 45 -80.94851 33.62318
SD South Dakota 46 -100.25584 44.21638
TN Tennessee 47 -85.97945 35.83453
TX Texas 48 -100.07718 31.16937
UT Utah 49 -111.54490 39.49720
VA Virginia 51 -79.46565 37.99920
VI Virgin Islands 78 -64.73421 17.72882
VT Vermont 50 -72.47119 43.86954
WA Washington 53 -120.84015 47.27291
WI Wisconsin 55 -89.84694 44.78330
WV West Virginia 54 -80.18361 38.92065
WY Wyoming 56 -107.55226 42.99929
UM Midway 74 -177.37427 28.19667
";

#[derive(Debug, Clone)]
pub struct StateInfo {
    pub postal: String,
    pub fips: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Postal and FIPS codes are two co-existing identifier systems; the table
/// keeps both directions so callers never hand-roll the mapping.
#[derive(Debug)]
pub struct StateTable {
    states: Vec<StateInfo>,
    by_postal: HashMap<String, usize>,
    by_fips: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
}

impl StateTable {
    pub fn load() -> Self {
        let mut states = Vec::new();
        let mut by_postal = HashMap::new();
        let mut by_fips = HashMap::new();
        let mut by_name = HashMap::new();

        for line in STATE_CENTERS.lines() {
            let Some(info) = parse_center_line(line) else {
                continue;
            };
            let idx = states.len();
            by_postal.insert(info.postal.clone(), idx);
            by_fips.insert(info.fips, idx);
            by_name.insert(info.name.to_uppercase(), idx);
            states.push(info);
        }

        StateTable {
            states,
            by_postal,
            by_fips,
            by_name,
        }
    }

    /// Maps free text to a state FIPS code. Accepts a 2-letter postal code
    /// first, then a full state name; text is matched case-insensitively.
    pub fn fips_for(&self, text: &str) -> Option<u32> {
        let upper = text.trim().to_uppercase();
        self.by_postal
            .get(&upper)
            .or_else(|| self.by_name.get(&upper))
            .map(|&idx| self.states[idx].fips)
    }

    pub fn postal_for(&self, fips: u32) -> Option<&str> {
        self.by_fips
            .get(&fips)
            .map(|&idx| self.states[idx].postal.as_str())
    }

    pub fn get(&self, fips: u32) -> Option<&StateInfo> {
        self.by_fips.get(&fips).map(|&idx| &self.states[idx])
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }
}

fn parse_center_line(line: &str) -> Option<StateInfo> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }
    let postal = parts[0].to_string();
    let lat: f64 = parts[parts.len() - 1].parse().ok()?;
    let lon: f64 = parts[parts.len() - 2].parse().ok()?;
    let fips: u32 = parts[parts.len() - 3].parse().ok()?;
    let name = parts[1..parts.len() - 3].join(" ");

    Some(StateInfo {
        postal,
        fips,
        name,
        lat,
        lon,
    })
}

// -- Tests -------------------------------------------------------------------
