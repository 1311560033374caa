use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{SalesRecord, SalesTable};

// ---------------------------------------------------------------------------
// Filter predicate: which regions / product lines are selected
// ---------------------------------------------------------------------------

/// Selection state for the two filter columns.
/// An empty set selects nothing, so the filtered table is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub regions: BTreeSet<String>,
    pub product_lines: BTreeSet<String>,
}

impl FilterState {
    /// Every distinct value selected (i.e., show everything).
    pub fn all(table: &SalesTable) -> Self {
        FilterState {
            regions: table.regions.clone(),
            product_lines: table.product_lines.clone(),
        }
    }

    /// Whether a single record passes both filters.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.regions.contains(&record.region) && self.product_lines.contains(&record.product_line)
    }
}

/// Return indices of records that pass both filters, in source order.
pub fn filtered_indices(table: &SalesTable, filters: &FilterState) -> Vec<usize> {
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| filters.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// The filtered view materialised as its own table.
pub fn filter_table(table: &SalesTable, filters: &FilterState) -> SalesTable {
    let indices = filtered_indices(table, filters);
    log::debug!(
        "Filter kept {} of {} records ({} regions, {} product lines selected)",
        indices.len(),
        table.len(),
        filters.regions.len(),
        filters.product_lines.len()
    );
    table.select(&indices)
}
