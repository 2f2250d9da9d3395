//! Access to the half-month GIMMS NDVI raster archive.
//!
//! The archive publishes one gzipped GeoTIFF per half month, named
//! `NA{yy}{mon}15{a|b}.n{NN}-VIg.tif.gz` inside a directory of the same
//! stem, where `a` covers days 1-15 and `b` the rest, and `NN` is the
//! satellite number (found by glob, it varies across years). Values are
//! integer greenness; anything non-positive is missing data and callers
//! must exclude it from weighting.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use flate2::read::GzDecoder;
use glob::glob;
use log::debug;
use tiff::decoder::{Decoder, DecodingResult};

const MONTH_KEYS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

pub struct GimmsArchive {
    dir: PathBuf,
}

impl GimmsArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        GimmsArchive { dir: dir.into() }
    }

    /// Locates the archive file covering the half month containing `date`.
    /// Missing files are fatal: the run cannot proceed without its raster.
    pub fn file_for(&self, date: NaiveDate) -> Result<PathBuf> {
        let half = if date.day() < 16 { 'a' } else { 'b' };
        let month = MONTH_KEYS[date.month0() as usize];
        let key = format!("NA{:02}{}15{}.n[0-9][0-9]-VIg", date.year() % 100, month, half);
        let pattern = self.dir.join(&key).join(format!("{}.tif.gz", key));
        let pattern = pattern
            .to_str()
            .ok_or_else(|| anyhow!("archive path is not valid UTF-8"))?
            .to_string();

        let mut matches = glob(&pattern).context("bad archive glob pattern")?;
        match matches.next() {
            Some(Ok(path)) => {
                debug!("raster for {} is {}", date, path.display());
                Ok(path)
            }
            _ => bail!("no raster file matching {}", pattern),
        }
    }

    pub fn open(&self, date: NaiveDate) -> Result<Raster> {
        let path = self.file_for(date)?;
        Raster::open(&path)
    }
}

/// One decoded raster, read whole exactly once and then only indexed.
pub struct Raster {
    pub width: u32,
    pub height: u32,
    data: Vec<i32>,
}

impl Raster {
    /// Opens a gzipped GeoTIFF from the archive.
    pub fn open(path: &Path) -> Result<Raster> {
        let file =
            File::open(path).with_context(|| format!("could not open raster {}", path.display()))?;
        let mut bytes = Vec::new();
        GzDecoder::new(file)
            .read_to_end(&mut bytes)
            .with_context(|| format!("could not decompress raster {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("could not decode raster {}", path.display()))
    }

    /// Decodes TIFF bytes into a flat row-major value buffer.
    pub fn decode(bytes: &[u8]) -> Result<Raster> {
        let mut decoder = Decoder::new(Cursor::new(bytes))?;
        let (width, height) = decoder.dimensions()?;

        let data: Vec<i32> = match decoder.read_image()? {
            DecodingResult::U8(buffer) => buffer.into_iter().map(i32::from).collect(),
            DecodingResult::I8(buffer) => buffer.into_iter().map(i32::from).collect(),
            DecodingResult::U16(buffer) => buffer.into_iter().map(i32::from).collect(),
            DecodingResult::I16(buffer) => buffer.into_iter().map(i32::from).collect(),
            DecodingResult::I32(buffer) => buffer,
            _ => bail!("unsupported raster sample format"),
        };

        if data.len() != (width as usize) * (height as usize) {
            bail!(
                "raster buffer length {} does not match {}x{}",
                data.len(),
                width,
                height
            );
        }

        Ok(Raster {
            width,
            height,
            data,
        })
    }

    /// Copies the minimal bounding rectangle covering the given pixel
    /// coordinates, clipped to the raster.
    pub fn window(&self, xs: &[u32], ys: &[u32]) -> Window {
        if xs.is_empty() || ys.is_empty() {
            return Window::empty();
        }
        let min_x = *xs.iter().min().unwrap();
        let min_y = *ys.iter().min().unwrap();
        let max_x = (*xs.iter().max().unwrap()).min(self.width.saturating_sub(1));
        let max_y = (*ys.iter().max().unwrap()).min(self.height.saturating_sub(1));
        if min_x > max_x || min_y > max_y {
            return Window::empty();
        }

        let width = max_x - min_x + 1;
        let height = max_y - min_y + 1;
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in min_y..=max_y {
            let start = (y as usize) * (self.width as usize) + min_x as usize;
            data.extend_from_slice(&self.data[start..start + width as usize]);
        }

        Window {
            min_x,
            min_y,
            width,
            height,
            data,
        }
    }

    /// One value per requested coordinate. Coordinates outside the raster
    /// come back as 0, the non-positive missing marker, so downstream
    /// weighting drops them like any other missing cell.
    pub fn values_at(&self, xs: &[u32], ys: &[u32]) -> Vec<i32> {
        let window = self.window(xs, ys);
        xs.iter()
            .zip(ys.iter())
            .map(|(&x, &y)| window.value(x, y))
            .collect()
    }
}

/// A rectangular excerpt of a raster, indexed in full-raster coordinates.
pub struct Window {
    min_x: u32,
    min_y: u32,
    width: u32,
    height: u32,
    data: Vec<i32>,
}

impl Window {
    fn empty() -> Window {
        Window {
            min_x: 0,
            min_y: 0,
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    pub fn value(&self, x: u32, y: u32) -> i32 {
        if x < self.min_x
            || y < self.min_y
            || x >= self.min_x + self.width
            || y >= self.min_y + self.height
        {
            return 0;
        }
        let row = (y - self.min_y) as usize;
        let col = (x - self.min_x) as usize;
        self.data[row * self.width as usize + col]
    }
}

/// Per-run cache of decoded rasters, keyed by file path and owned by the
/// command that samples. Nothing here outlives the run.
pub struct RasterCache<'a> {
    archive: &'a GimmsArchive,
    rasters: HashMap<PathBuf, Raster>,
}

impl<'a> RasterCache<'a> {
    pub fn new(archive: &'a GimmsArchive) -> Self {
        RasterCache {
            archive,
            rasters: HashMap::new(),
        }
    }

    pub fn raster_for(&mut self, date: NaiveDate) -> Result<&Raster> {
        let path = self.archive.file_for(date)?;
        if !self.rasters.contains_key(&path) {
            let raster = Raster::open(&path)?;
            self.rasters.insert(path.clone(), raster);
        }
        Ok(&self.rasters[&path])
    }

    pub fn len(&self) -> usize {
        self.rasters.len()
    }
}

// -- Tests -------------------------------------------------------------------
