use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Column names as they appear in the source files
// ---------------------------------------------------------------------------

pub const COL_DATE: &str = "Date";
pub const COL_REGION: &str = "Region";
pub const COL_PRODUCT_LINE: &str = "ProductLine";
pub const COL_SALES: &str = "Sales";
pub const COL_RATING: &str = "CustomerRating";
pub const COL_LATITUDE: &str = "Latitude";
pub const COL_LONGITUDE: &str = "Longitude";

/// Upper bound of the customer rating scale.
pub const MAX_RATING: f64 = 5.0;

// ---------------------------------------------------------------------------
// SalesRecord – one row of the dataset
// ---------------------------------------------------------------------------

/// A single sales observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub region: String,
    pub product_line: String,
    pub sales: f64,
    /// Always within `0.0..=MAX_RATING` once loaded.
    pub customer_rating: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl SalesRecord {
    /// Both coordinates, if the row has them.
    pub fn location(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ---------------------------------------------------------------------------
// SalesTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full parsed dataset with pre-computed category indices.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesTable {
    /// All records in source order.
    pub records: Vec<SalesRecord>,
    /// Sorted distinct regions.
    pub regions: BTreeSet<String>,
    /// Sorted distinct product lines.
    pub product_lines: BTreeSet<String>,
    /// Whether the source carried `Latitude` and `Longitude` columns.
    pub has_geo: bool,
}

impl SalesTable {
    /// Build the category indices from the loaded records.
    pub fn from_records(records: Vec<SalesRecord>, has_geo: bool) -> Self {
        let mut regions = BTreeSet::new();
        let mut product_lines = BTreeSet::new();
        for rec in &records {
            regions.insert(rec.region.clone());
            product_lines.insert(rec.product_line.clone());
        }
        SalesTable {
            records,
            regions,
            product_lines,
            has_geo,
        }
    }

    /// Build a new table from a subset of row indices, keeping the column layout.
    pub fn select(&self, indices: &[usize]) -> Self {
        let records = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        Self::from_records(records, self.has_geo)
    }

    /// Header row matching this table's column layout.
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut cols = vec![COL_DATE, COL_REGION, COL_PRODUCT_LINE, COL_SALES, COL_RATING];
        if self.has_geo {
            cols.push(COL_LATITUDE);
            cols.push(COL_LONGITUDE);
        }
        cols
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GeoKey – (Region, Latitude, Longitude) grouping key
// ---------------------------------------------------------------------------

/// Grouping key for the map aggregation.
/// Floats are ordered with `total_cmp` so the key can live in a `BTreeMap`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoKey {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Eq for GeoKey {}

impl PartialOrd for GeoKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GeoKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.region
            .cmp(&other.region)
            .then_with(|| self.latitude.total_cmp(&other.latitude))
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(region: &str, product_line: &str) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            region: region.to_string(),
            product_line: product_line.to_string(),
            sales: 1.0,
            customer_rating: 3.0,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn test_from_records_indexes_categories() {
        let table = SalesTable::from_records(
            vec![record("US", "Footwear"), record("EU", "Apparel"), record("US", "Apparel")],
            false,
        );
        let regions: Vec<&str> = table.regions.iter().map(String::as_str).collect();
        assert_eq!(regions, ["EU", "US"]);
        assert_eq!(table.product_lines.len(), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_select_keeps_layout() {
        let table = SalesTable::from_records(vec![record("US", "Footwear"), record("EU", "Apparel")], true);
        let sub = table.select(&[1, 7]);
        assert_eq!(sub.len(), 1);
        assert!(sub.has_geo);
        assert_eq!(sub.column_names().len(), 7);
    }

    #[test]
    fn test_geo_key_ordering() {
        let a = GeoKey { region: "EU".into(), latitude: 48.8, longitude: 2.3 };
        let b = GeoKey { region: "EU".into(), latitude: 52.5, longitude: 13.4 };
        let c = GeoKey { region: "US".into(), latitude: -10.0, longitude: 0.0 };
        assert!(a < b);
        assert!(b < c);
    }
}
