//! Fetches the county gazetteer archive into the data directory.

use std::path::Path;

use anyhow::{bail, Result};
use tempfile::TempDir;

use crate::{
    cli::create_spinner,
    config::Config,
    download::{count_files, download_tar, extract_tar},
};

pub async fn fetch(config: &Config) -> Result<String> {
    if config.archive.url.is_empty() {
        bail!("no archive url configured; set archive.url in the config file");
    }

    let tmp_dir = TempDir::new()?;
    let file_name = config
        .archive
        .url
        .split('/')
        .next_back()
        .unwrap_or("gazetteer.tar.gz");
    let archive_path = tmp_dir.path().join(file_name);

    let bar = create_spinner("Downloading gazetteer archive...".to_string());
    download_tar(&config.archive.url, archive_path.clone(), bar.clone()).await?;
    bar.finish_with_message("Gazetteer archive downloaded");

    let dest = config
        .paths
        .gazetteer
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."))
        .to_path_buf();

    let bar = create_spinner("Unpacking gazetteer archive...".to_string());
    extract_tar(&archive_path, &dest)?;
    bar.finish_with_message("Gazetteer archive unpacked");

    let count = count_files(&dest)?;
    Ok(format!("Extracted {} files to `{}`", count, dest.display()))
}
