//! Handles serialising and saving data to disk in the _parquet_ file format.

pub mod weights;

pub use weights::{load_weights, save_weights};
