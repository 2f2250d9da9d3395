//! Weighted greenness per county.
//!
//! A county's greenness on a date is the dot product of its pixel weights
//! with the raster values at those pixels, keeping only pixels whose
//! value is positive. Missing cells never enter the sum as zeros; if no
//! pixel has data the sample is absent rather than 0.0.

use chrono::NaiveDate;

use crate::raster::Raster;
use crate::weights::CountyPixels;

pub fn weighted_greenness(raster: &Raster, county: &CountyPixels) -> Option<f64> {
    let values = raster.values_at(&county.xs, &county.ys);

    let mut sum = 0.0;
    let mut any = false;
    for (value, weight) in values.iter().zip(county.weights.iter()) {
        if *value > 0 {
            sum += f64::from(*value) * weight;
            any = true;
        }
    }
    any.then_some(sum)
}

/// The 24 half-month sampling dates of a year: the 1st and 16th of every
/// month, matching the raster publication schedule.
pub fn half_month_dates(year: i32) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(24);
    for month in 1..=12 {
        for day in [1, 16] {
            dates.push(NaiveDate::from_ymd_opt(year, month, day).unwrap());
        }
    }
    dates
}

// -- Tests -------------------------------------------------------------------
