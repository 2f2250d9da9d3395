//! Persists the per-county pixel-weight structure as a parquet file so
//! the land-cover reduction only has to run once.
//!
//! One row per (county, pixel): geoid, x, y, weight. Rows of one county
//! are written contiguously, which is what the loader relies on when it
//! regroups them.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use arrow::array::{ArrayRef, Float64Array, UInt32Array};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use crate::weights::CountyPixels;

pub fn save_weights(counties: &[CountyPixels], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)
        .with_context(|| format!("could not create {}", file_path.display()))?;

    let num_rows: usize = counties.iter().map(|c| c.weights.len()).sum();
    let mut geoids = Vec::with_capacity(num_rows);
    let mut xs = Vec::with_capacity(num_rows);
    let mut ys = Vec::with_capacity(num_rows);
    let mut weights = Vec::with_capacity(num_rows);

    for county in counties {
        for i in 0..county.weights.len() {
            geoids.push(county.geoid);
            xs.push(county.xs[i]);
            ys.push(county.ys[i]);
            weights.push(county.weights[i]);
        }
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("geoid", Arc::new(UInt32Array::from(geoids))),
        ("x", Arc::new(UInt32Array::from(xs))),
        ("y", Arc::new(UInt32Array::from(ys))),
        ("weight", Arc::new(Float64Array::from(weights))),
    ];
    let batch = RecordBatch::try_from_iter(columns)?;

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

pub fn load_weights(file_path: &Path) -> Result<Vec<CountyPixels>> {
    let file = File::open(file_path)
        .with_context(|| format!("could not open weights file {}", file_path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut counties: Vec<CountyPixels> = Vec::new();
    for batch in reader {
        let batch = batch?;
        let geoids = column_u32(&batch, "geoid")?;
        let xs = column_u32(&batch, "x")?;
        let ys = column_u32(&batch, "y")?;
        let weights = batch
            .column_by_name("weight")
            .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
            .ok_or_else(|| anyhow!("weights file has no weight column"))?;

        for row in 0..batch.num_rows() {
            let geoid = geoids.value(row);
            if counties.last().map(|c| c.geoid) != Some(geoid) {
                counties.push(CountyPixels {
                    geoid,
                    ..CountyPixels::default()
                });
            }
            let county = counties.last_mut().unwrap();
            county.xs.push(xs.value(row));
            county.ys.push(ys.value(row));
            county.weights.push(weights.value(row));
        }
    }

    Ok(counties)
}

fn column_u32<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt32Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt32Array>())
        .ok_or_else(|| anyhow!("weights file has no {} column", name))
}

// -- Tests -------------------------------------------------------------------
