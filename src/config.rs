//! Run configuration.
//!
//! All file locations and the target-crop code set live in a TOML file
//! (default `wheatrust.toml`). The parsed `Config` is built once in main
//! and passed to the commands that need it; nothing reads configuration
//! through globals.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: Paths,
    pub archive: Archive,
    pub codes: Codes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Paths {
    /// Tab-delimited county attribute table exported from the TIGER
    /// county shapefile.
    pub gazetteer: PathBuf,
    /// Cereal-rust observation survey, CSV.
    pub observations: PathBuf,
    /// Land-cover classification dumps, glob patterns.
    pub landcover: Vec<String>,
    /// Directory holding the half-month GIMMS NDVI archive.
    pub gimms_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Paths {
            gazetteer: PathBuf::from("data/county_gazetteer.txt"),
            observations: PathBuf::from("data/cereal_rust.csv"),
            landcover: vec!["data/counties/*.txt".to_string()],
            gimms_dir: PathBuf::from("data/gimms"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Archive {
    /// Where `fetch` downloads the gazetteer archive from.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Codes {
    /// Land-cover codes counted as cereal crop, from the CDL code table.
    pub wheat: Vec<u8>,
}

impl Default for Codes {
    fn default() -> Self {
        // Wheat|Wht rows of the generic CDL attribute table.
        Codes {
            wheat: vec![22, 23, 24, 26, 225, 230, 234, 236, 238],
        }
    }
}

impl Config {
    /// Reads the configuration file, or falls back to defaults when the
    /// file does not exist. A file that exists but does not parse is a
    /// fatal error, not a fallback.
    pub fn load(path: &Path) -> Result<Config> {
        if !path.exists() {
            debug!("no config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("could not read config {}", path.display()))?;
        let config = toml::from_str(&text)
            .with_context(|| format!("could not parse config {}", path.display()))?;
        Ok(config)
    }
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_fall_back_to_defaults() {
        let config = Config::load(Path::new("does/not/exist.toml")).unwrap();
        assert_eq!(config.paths.gimms_dir, PathBuf::from("data/gimms"));
        assert!(config.codes.wheat.contains(&22));
        assert!(config.archive.url.is_empty());
    }

    #[test]
    fn should_parse_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wheatrust.toml");
        fs::write(
            &path,
            "[paths]\ngimms_dir = \"/srv/gimms\"\n\n[codes]\nwheat = [121, 195]\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.paths.gimms_dir, PathBuf::from("/srv/gimms"));
        assert_eq!(config.codes.wheat, vec![121, 195]);
        // untouched section keeps its default
        assert_eq!(
            config.paths.observations,
            PathBuf::from("data/cereal_rust.csv")
        );
    }

    #[test]
    fn should_fail_on_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wheatrust.toml");
        fs::write(&path, "[paths\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
