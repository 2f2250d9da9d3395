//! Prints the counties that carry at least one resolved observation.

use anyhow::Result;

use crate::config::Config;

pub fn counties(config: &Config) -> Result<String> {
    let (_gazetteer, table, _stats) = super::first_passage::build_table(config)?;

    let counties = table.counties();
    for geoid in &counties {
        println!("{}", geoid);
    }

    Ok(format!("total {}", counties.len()))
}
