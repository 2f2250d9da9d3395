//! Downloads and extracts the county gazetteer archive.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Error, Result};
use flate2::read::GzDecoder;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tar::Archive;

/// Streams the tarball from the archive URL to the given path, growing
/// the spinner into a byte progress bar once the content length is known.
pub async fn download_tar(url: &str, file_path: PathBuf, progress_bar: ProgressBar) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::msg(format!("Failed to download archive: {}", e)))?;

    if !response.status().is_success() {
        return Err(Error::msg(format!(
            "Failed to download archive: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    if total_size > 0 {
        progress_bar.set_length(total_size);
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({percent}%) {eta}",
            )
            .unwrap()
            .progress_chars("=> "),
        );
    }

    let mut file = File::create(file_path)?;
    let mut downloaded = 0u64;
    let mut stream = response.bytes_stream();

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| Error::msg(format!("Error reading chunk: {}", e)))?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        progress_bar.set_position(downloaded);
    }

    Ok(())
}

/// Extracts the tarball at the specified path into the destination
/// directory.
pub fn extract_tar(tar_gz_path: &Path, dest_dir: &Path) -> Result<()> {
    fs::create_dir_all(dest_dir)?;

    let tar_gz = File::open(tar_gz_path)?;
    let tar = GzDecoder::new(tar_gz);
    let mut archive = Archive::new(tar);
    archive.unpack(dest_dir)?;

    Ok(())
}

/// Counts the regular files under a directory, for the post-extract
/// summary line.
pub fn count_files(dir: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            count += count_files(&path)?;
        } else {
            count += 1;
        }
    }
    Ok(count)
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::{write::GzEncoder, Compression};
    use tempfile::TempDir;

    fn make_archive(path: &Path) {
        let file = File::create(path).unwrap();
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        let data = b"19\t169\t19169\tStory\tStory County\n";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "gazetteer/county_gazetteer.txt", &data[..])
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn should_extract_archive() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("gazetteer.tar.gz");
        make_archive(&archive_path);

        let dest = temp_dir.path().join("data");
        extract_tar(&archive_path, &dest).unwrap();

        let extracted = dest.join("gazetteer/county_gazetteer.txt");
        assert!(extracted.exists());
        let text = fs::read_to_string(extracted).unwrap();
        assert!(text.starts_with("19\t169\t19169"));
    }

    #[test]
    fn should_count_extracted_files() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("gazetteer.tar.gz");
        make_archive(&archive_path);

        let dest = temp_dir.path().join("data");
        extract_tar(&archive_path, &dest).unwrap();
        assert_eq!(count_files(&dest).unwrap(), 1);
    }
}
