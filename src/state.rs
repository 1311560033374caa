use std::sync::Arc;

use crate::data::filter::{filtered_indices, FilterState};
use crate::data::model::SalesTable;
use crate::stats::Dashboard;

// ---------------------------------------------------------------------------
// Dashboard state
// ---------------------------------------------------------------------------

/// Which filter column a selection change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterColumn {
    Region,
    ProductLine,
}

/// The interactive state, independent of presentation.
///
/// Every mutation recomputes `visible_indices` in full.
pub struct DashboardState {
    /// Loaded dataset, shared with the process-wide cache.
    pub dataset: Arc<SalesTable>,

    /// Current region / product-line selections.
    pub filters: FilterState,

    /// Indices of records passing the current filters (cached).
    pub visible_indices: Vec<usize>,
}

impl DashboardState {
    /// Start with every region and product line selected.
    pub fn new(dataset: Arc<SalesTable>) -> Self {
        let filters = FilterState::all(&dataset);
        let visible_indices = (0..dataset.len()).collect();
        Self {
            dataset,
            filters,
            visible_indices,
        }
    }

    fn selection_mut(&mut self, column: FilterColumn) -> &mut std::collections::BTreeSet<String> {
        match column {
            FilterColumn::Region => &mut self.filters.regions,
            FilterColumn::ProductLine => &mut self.filters.product_lines,
        }
    }

    /// Recompute `visible_indices` after a filter change.
    pub fn refilter(&mut self) {
        self.visible_indices = filtered_indices(&self.dataset, &self.filters);
        log::debug!(
            "{} of {} records visible",
            self.visible_indices.len(),
            self.dataset.len()
        );
    }

    /// Replace the whole selection for one column.
    pub fn set_selection<I, S>(&mut self, column: FilterColumn, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self.selection_mut(column) = values.into_iter().map(Into::into).collect();
        self.refilter();
    }

    /// Toggle a single value in a column's selection.
    pub fn toggle(&mut self, column: FilterColumn, value: &str) {
        let selected = self.selection_mut(column);
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        self.refilter();
    }

    /// Remove a single value from a column's selection.
    pub fn deselect(&mut self, column: FilterColumn, value: &str) {
        self.selection_mut(column).remove(value);
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: FilterColumn) {
        let all = match column {
            FilterColumn::Region => self.dataset.regions.clone(),
            FilterColumn::ProductLine => self.dataset.product_lines.clone(),
        };
        *self.selection_mut(column) = all;
        self.refilter();
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: FilterColumn) {
        self.selection_mut(column).clear();
        self.refilter();
    }

    /// The visible records as their own table.
    pub fn filtered(&self) -> SalesTable {
        self.dataset.select(&self.visible_indices)
    }

    /// All dashboard values for the current selection.
    pub fn dashboard(&self) -> Dashboard {
        Dashboard::compute(&self.filtered())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::SalesRecord;
    use chrono::NaiveDate;

    fn state() -> DashboardState {
        let records = vec![
            SalesRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                region: "US".into(),
                product_line: "Footwear".into(),
                sales: 100.0,
                customer_rating: 4.5,
                latitude: None,
                longitude: None,
            },
            SalesRecord {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                region: "EU".into(),
                product_line: "Apparel".into(),
                sales: 50.0,
                customer_rating: 3.0,
                latitude: None,
                longitude: None,
            },
        ];
        DashboardState::new(Arc::new(SalesTable::from_records(records, false)))
    }

    #[test]
    fn test_defaults_to_everything_visible() {
        let s = state();
        assert_eq!(s.visible_indices, vec![0, 1]);
        assert_eq!(s.dashboard().total_sales, 150.0);
    }

    #[test]
    fn test_select_single_region() {
        let mut s = state();
        s.set_selection(FilterColumn::Region, ["US"]);
        let d = s.dashboard();
        assert_eq!(d.total_sales, 100.0);
        assert_eq!(format!("{:.2}", d.average_rating.unwrap()), "4.50");
    }

    #[test]
    fn test_toggle_and_select_none_all() {
        let mut s = state();
        s.toggle(FilterColumn::ProductLine, "Apparel");
        assert_eq!(s.visible_indices, vec![0]);
        s.toggle(FilterColumn::ProductLine, "Apparel");
        assert_eq!(s.visible_indices, vec![0, 1]);

        s.select_none(FilterColumn::Region);
        assert!(s.visible_indices.is_empty());
        let d = s.dashboard();
        assert_eq!(d.total_sales, 0.0);
        assert_eq!(d.average_rating, None);

        s.select_all(FilterColumn::Region);
        assert_eq!(s.visible_indices, vec![0, 1]);
    }

    #[test]
    fn test_deselect() {
        let mut s = state();
        s.deselect(FilterColumn::Region, "EU");
        assert_eq!(s.filtered().regions.len(), 1);
    }
}
