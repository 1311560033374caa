//! Dashboard aggregations over a (filtered) table.
//!
//! Every function here is a pure reduction; an empty table yields zero sums,
//! `None` means and empty groups instead of an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::model::{GeoKey, SalesRecord, SalesTable, MAX_RATING};

/// Number of bins in the rating histogram.
pub const RATING_BINS: usize = 10;

/// Sales summed for one product line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductLineSales {
    pub product_line: String,
    pub sales: f64,
}

/// Sales summed for one (date, region) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRegionSales {
    pub date: NaiveDate,
    pub region: String,
    pub sales: f64,
}

/// One histogram bin covering `[lower, upper)`; the last bin is closed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Mean sales at one map location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationSales {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub mean_sales: f64,
}

pub fn total_sales(records: &[SalesRecord]) -> f64 {
    records.iter().map(|r| r.sales).sum()
}

/// Mean customer rating, `None` when there are no records.
pub fn average_rating(records: &[SalesRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: f64 = records.iter().map(|r| r.customer_rating).sum();
    Some(sum / records.len() as f64)
}

/// Sales per product line, ordered by product line.
pub fn sales_by_product_line(records: &[SalesRecord]) -> Vec<ProductLineSales> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for rec in records {
        *groups.entry(rec.product_line.as_str()).or_default() += rec.sales;
    }
    groups
        .into_iter()
        .map(|(product_line, sales)| ProductLineSales {
            product_line: product_line.to_string(),
            sales,
        })
        .collect()
}

/// Sales per (date, region), ordered by date then region.
pub fn sales_by_date_region(records: &[SalesRecord]) -> Vec<DailyRegionSales> {
    let mut groups: BTreeMap<(NaiveDate, &str), f64> = BTreeMap::new();
    for rec in records {
        *groups.entry((rec.date, rec.region.as_str())).or_default() += rec.sales;
    }
    groups
        .into_iter()
        .map(|((date, region), sales)| DailyRegionSales {
            date,
            region: region.to_string(),
            sales,
        })
        .collect()
}

/// Customer ratings counted into `RATING_BINS` equal-width bins over `[0, 5]`.
pub fn rating_histogram(records: &[SalesRecord]) -> Vec<HistogramBin> {
    let width = MAX_RATING / RATING_BINS as f64;
    let mut counts = [0usize; RATING_BINS];

    for rec in records {
        let idx = (rec.customer_rating / width).floor();
        // Ratings are validated on load; clamp keeps 5.0 in the last bin.
        let idx = (idx.max(0.0) as usize).min(RATING_BINS - 1);
        counts[idx] += 1;
    }

    counts
        .iter()
        .enumerate()
        .map(|(i, &count)| HistogramBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Mean sales per (region, latitude, longitude).
/// Rows missing either coordinate do not contribute.
pub fn mean_sales_by_location(records: &[SalesRecord]) -> Vec<LocationSales> {
    let mut groups: BTreeMap<GeoKey, (f64, usize)> = BTreeMap::new();
    for rec in records {
        let Some((latitude, longitude)) = rec.location() else {
            continue;
        };
        let key = GeoKey {
            region: rec.region.clone(),
            latitude,
            longitude,
        };
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += rec.sales;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (sum, n))| LocationSales {
            region: key.region,
            latitude: key.latitude,
            longitude: key.longitude,
            mean_sales: sum / n as f64,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Dashboard – every value shown on screen for one filter selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub row_count: usize,
    pub total_sales: f64,
    pub average_rating: Option<f64>,
    pub sales_by_product_line: Vec<ProductLineSales>,
    pub sales_by_date_region: Vec<DailyRegionSales>,
    pub rating_histogram: Vec<HistogramBin>,
    /// Present only when the dataset carries geographic columns.
    pub sales_by_location: Option<Vec<LocationSales>>,
}

impl Dashboard {
    pub fn compute(table: &SalesTable) -> Self {
        let records = &table.records;
        Dashboard {
            row_count: records.len(),
            total_sales: total_sales(records),
            average_rating: average_rating(records),
            sales_by_product_line: sales_by_product_line(records),
            sales_by_date_region: sales_by_date_region(records),
            rating_histogram: rating_histogram(records),
            sales_by_location: table.has_geo.then(|| mean_sales_by_location(records)),
        }
    }
}
