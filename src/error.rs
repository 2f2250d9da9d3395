//! Per-record error taxonomy.
//!
//! A `RecordError` never escapes the record that caused it: the loaders log
//! it together with the offending row and move on. Load-time failures
//! (missing gazetteer, unreadable raster) travel as `anyhow::Error` and
//! abort the run.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// Date field is neither MMDD digits nor M/D.
    #[error("unparseable date {0:?}")]
    DateParse(String),

    /// State text matched neither a postal code nor a state name.
    #[error("unknown state {0:?}")]
    UnknownState(String),

    /// State resolved to a FIPS code the gazetteer has no counties for.
    #[error("no counties loaded for state {state} (fips {fips})")]
    MissingStateIndex { state: String, fips: u32 },

    /// County text matched neither name variant of any county in the state.
    #[error("unmatched county {county:?} in {state}")]
    UnmatchedCounty { state: String, county: String },

    /// Row did not split into the expected fields.
    #[error("malformed row: {0}")]
    MalformedRow(String),
}
