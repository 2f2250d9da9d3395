//! Resolves free-text (state, county) pairs to canonical county ids.
//!
//! Survey records spell county names inconsistently, so matching runs
//! against both gazetteer name variants after normalization. When nothing
//! matches exactly, the closest names are computed purely for the log
//! line; a fuzzy match is never accepted as an answer.

use log::warn;

use crate::error::RecordError;
use crate::gazetteer::{normalize_name, CountyId, Gazetteer};
use crate::states::StateTable;

/// Minimum normalized edit similarity for a name to appear as a hint.
const HINT_CUTOFF: f64 = 0.6;
const HINT_COUNT: usize = 3;

pub struct Resolver<'a> {
    states: &'a StateTable,
    gazetteer: &'a Gazetteer,
}

impl<'a> Resolver<'a> {
    pub fn new(states: &'a StateTable, gazetteer: &'a Gazetteer) -> Self {
        Resolver { states, gazetteer }
    }

    /// Exact-match resolution with logged diagnostics on failure.
    /// Deterministic: the first county in gazetteer file order whose
    /// name or lsad variant equals the normalized text wins.
    pub fn resolve(&self, state_text: &str, county_text: &str) -> Result<CountyId, RecordError> {
        let state_norm = normalize_name(state_text);
        let Some(state_fips) = self.states.fips_for(&state_norm) else {
            warn!("could not find state {:?} for county {:?}", state_text, county_text);
            return Err(RecordError::UnknownState(state_text.to_string()));
        };

        let Some(index) = self.gazetteer.county_index(state_fips) else {
            warn!("missing counties for state {} fips {}", state_norm, state_fips);
            return Err(RecordError::MissingStateIndex {
                state: state_norm,
                fips: state_fips,
            });
        };

        let county_norm = normalize_name(county_text);
        for (geoid, names) in index {
            if county_norm == names[0] || county_norm == names[1] {
                return Ok(*geoid);
            }
        }

        let hints = close_matches(
            &county_norm,
            index.iter().flat_map(|(_, names)| names.iter().map(String::as_str)),
        );
        warn!(
            "did not find county {:?} in {}, closest: {:?}",
            county_text, state_norm, hints
        );
        Err(RecordError::UnmatchedCounty {
            state: state_norm,
            county: county_text.to_string(),
        })
    }
}

/// Closest candidates by normalized edit distance, best first, for
/// operator triage of misspelled county names.
pub fn close_matches<'c>(name: &str, candidates: impl Iterator<Item = &'c str>) -> Vec<String> {
    let mut scored: Vec<(f64, &str)> = candidates
        .map(|c| (strsim::normalized_levenshtein(name, c), c))
        .filter(|(score, _)| *score >= HINT_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(HINT_COUNT);
    scored.into_iter().map(|(_, c)| c.to_string()).collect()
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::tests::fixture;

    #[test]
    fn should_resolve_exact_name() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        assert_eq!(resolver.resolve("IA", "STORY"), Ok(19169));
        assert_eq!(resolver.resolve("IA", "Polk"), Ok(19153));
        assert_eq!(resolver.resolve("MS", "PANOLA"), Ok(28107));
    }

    #[test]
    fn should_resolve_lsad_variant() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        assert_eq!(resolver.resolve("IA", "Story County"), Ok(19169));
    }

    #[test]
    fn should_normalize_before_matching() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        assert_eq!(resolver.resolve(" ia ", " story. "), Ok(19169));
    }

    #[test]
    fn should_reject_unknown_state() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        assert_eq!(
            resolver.resolve("ZZ", "STORY"),
            Err(RecordError::UnknownState("ZZ".to_string()))
        );
    }

    #[test]
    fn should_reject_state_without_counties() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        // Texas is a real state but the fixture gazetteer has no counties
        // for it.
        assert_eq!(
            resolver.resolve("TX", "TRAVIS"),
            Err(RecordError::MissingStateIndex {
                state: "TX".to_string(),
                fips: 48,
            })
        );
    }

    #[test]
    fn should_never_accept_fuzzy_match() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        // One letter off from STORY, still unresolved.
        assert_eq!(
            resolver.resolve("IA", "STORK"),
            Err(RecordError::UnmatchedCounty {
                state: "IA".to_string(),
                county: "STORK".to_string(),
            })
        );
        assert!(matches!(
            resolver.resolve("IA", "ZZZBOGUS"),
            Err(RecordError::UnmatchedCounty { .. })
        ));
    }

    #[test]
    fn should_be_idempotent() {
        let states = StateTable::load();
        let gazetteer = fixture();
        let resolver = Resolver::new(&states, &gazetteer);

        let first = resolver.resolve("IA", "STORY");
        let second = resolver.resolve("IA", "STORY");
        assert_eq!(first, second);
    }

    #[test]
    fn should_rank_close_matches() {
        let names = ["STORY", "STORY COUNTY", "POLK", "POLK COUNTY"];
        let hints = close_matches("STORK", names.iter().copied());
        assert_eq!(hints[0], "STORY");
        assert!(hints.len() <= 3);
        assert!(!hints.contains(&"POLK COUNTY".to_string()));
    }

    #[test]
    fn should_return_no_hints_for_garbage() {
        let names = ["STORY", "POLK"];
        let hints = close_matches("QQQQQQQQQQ", names.iter().copied());
        assert!(hints.is_empty());
    }
}
