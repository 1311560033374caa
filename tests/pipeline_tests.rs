use std::collections::BTreeSet;
use std::io::Write;

use pretty_assertions::assert_eq;
use sales_dashboard::data::error::LoadError;
use sales_dashboard::data::filter::{filter_table, filtered_indices, FilterState};
use sales_dashboard::data::loader::load_file;
use sales_dashboard::data::model::SalesTable;
use sales_dashboard::report::format_rating;
use sales_dashboard::stats::{sales_by_product_line, total_sales, Dashboard};
use tempfile::NamedTempFile;

const SAMPLE: &str = "\
Date,Region,ProductLine,Sales,CustomerRating,Latitude,Longitude
2024-01-31,US,Footwear,1200,4.6,37.1,-95.7
2024-01-31,EU,Apparel,800.5,3.9,50.1,9.7
2024-02-29,US,Apparel,450.25,4.1,37.1,-95.7
2024-02-29,APAC,Equipment,300,3.2,,
2024-03-31,EU,Footwear,975,4.8,50.1,9.7
2024-03-31,US,Footwear,1310,4.4,37.1,-95.7
";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn sample_table() -> SalesTable {
    let file = write_csv(SAMPLE);
    load_file(file.path()).unwrap()
}

fn set(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Every combination of subsets of the two category sets.
fn all_selections(table: &SalesTable) -> Vec<FilterState> {
    let regions: Vec<&String> = table.regions.iter().collect();
    let lines: Vec<&String> = table.product_lines.iter().collect();
    let subsets = |items: &[&String]| -> Vec<BTreeSet<String>> {
        (0..1u32 << items.len())
            .map(|mask| {
                items
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, v)| v.to_string())
                    .collect()
            })
            .collect()
    };
    let mut out = Vec::new();
    for r in subsets(&regions) {
        for p in subsets(&lines) {
            out.push(FilterState {
                regions: r.clone(),
                product_lines: p,
            });
        }
    }
    out
}

#[test]
fn test_load_sample_csv() {
    let table = sample_table();
    assert_eq!(table.len(), 6);
    assert!(table.has_geo);
    assert_eq!(table.regions, set(&["APAC", "EU", "US"]));
    assert_eq!(table.product_lines, set(&["Apparel", "Equipment", "Footwear"]));
    assert_eq!(table.records[3].location(), None);
    assert_eq!(table.records[1].sales, 800.5);
}

#[test]
fn test_filter_matches_predicate_for_every_selection() {
    let table = sample_table();
    for filters in all_selections(&table) {
        let kept = filtered_indices(&table, &filters);
        let expected: Vec<usize> = table
            .records
            .iter()
            .enumerate()
            .filter(|(_, r)| filters.regions.contains(&r.region) && filters.product_lines.contains(&r.product_line))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(kept, expected);

        let once = filter_table(&table, &filters);
        assert_eq!(filter_table(&once, &filters), once);
    }
}

#[test]
fn test_grouped_sales_equal_total_for_every_selection() {
    let table = sample_table();
    for filters in all_selections(&table) {
        let filtered = filter_table(&table, &filters);
        let grouped: f64 = sales_by_product_line(&filtered.records).iter().map(|g| g.sales).sum();
        assert!((grouped - total_sales(&filtered.records)).abs() < 1e-6);
    }
}

#[test]
fn test_us_only_selection() {
    let file = write_csv(
        "Date,Region,ProductLine,Sales,CustomerRating\n\
         2024-01-01,US,Footwear,100,4.5\n\
         2024-01-01,EU,Apparel,50,3.0\n",
    );
    let table = load_file(file.path()).unwrap();
    let filters = FilterState {
        regions: set(&["US"]),
        ..FilterState::all(&table)
    };
    let dashboard = Dashboard::compute(&filter_table(&table, &filters));
    assert_eq!(dashboard.total_sales, 100.0);
    assert_eq!(format_rating(dashboard.average_rating), "4.50 / 5");
    assert!(dashboard.sales_by_location.is_none());
}

#[test]
fn test_zero_regions_is_not_an_error() {
    let table = sample_table();
    let filters = FilterState {
        regions: BTreeSet::new(),
        ..FilterState::all(&table)
    };
    let filtered = filter_table(&table, &filters);
    assert!(filtered.is_empty());

    let dashboard = Dashboard::compute(&filtered);
    assert_eq!(dashboard.row_count, 0);
    assert_eq!(dashboard.total_sales, 0.0);
    assert_eq!(dashboard.average_rating, None);
    assert_eq!(dashboard.sales_by_location, Some(Vec::new()));
}

#[test]
fn test_dashboard_over_sample() {
    let table = sample_table();
    let dashboard = Dashboard::compute(&table);

    assert_eq!(dashboard.total_sales, 5035.75);
    let lines: Vec<(&str, f64)> = dashboard
        .sales_by_product_line
        .iter()
        .map(|g| (g.product_line.as_str(), g.sales))
        .collect();
    assert_eq!(lines, vec![("Apparel", 1250.75), ("Equipment", 300.0), ("Footwear", 3485.0)]);

    assert_eq!(dashboard.sales_by_date_region.len(), 6);
    assert_eq!(dashboard.sales_by_date_region[0].region, "EU");

    let total_binned: usize = dashboard.rating_histogram.iter().map(|b| b.count).sum();
    assert_eq!(total_binned, 6);

    let locations = dashboard.sales_by_location.unwrap();
    assert_eq!(locations.len(), 2);
    assert_eq!(locations[0].region, "EU");
    assert_eq!(locations[0].mean_sales, (800.5 + 975.0) / 2.0);
    assert_eq!(locations[1].mean_sales, (1200.0 + 450.25 + 1310.0) / 3.0);
}

#[test]
fn test_column_order_and_extra_columns() {
    let file = write_csv(
        "OrderId,Sales,Region,CustomerRating,Date,ProductLine\n\
         17,99.5,US,5,01/15/2024,Footwear\n",
    );
    let table = load_file(file.path()).unwrap();
    assert!(!table.has_geo);
    let rec = &table.records[0];
    assert_eq!(rec.date.to_string(), "2024-01-15");
    assert_eq!(rec.sales, 99.5);
    assert_eq!(rec.customer_rating, 5.0);
}

#[test]
fn test_load_failures() {
    let dir = tempfile::tempdir().unwrap();
    let missing = load_file(&dir.path().join("nope.csv"));
    assert!(matches!(missing, Err(LoadError::Io { .. })));

    let no_rating = write_csv("Date,Region,ProductLine,Sales\n2024-01-01,US,Footwear,1\n");
    assert!(matches!(
        load_file(no_rating.path()),
        Err(LoadError::MissingColumn(col)) if col == "CustomerRating"
    ));

    let bad_date = write_csv(
        "Date,Region,ProductLine,Sales,CustomerRating\n2024-01-01,US,Footwear,1,4\nsoon,US,Footwear,1,4\n",
    );
    assert!(matches!(
        load_file(bad_date.path()),
        Err(LoadError::InvalidDate { row: 2, .. })
    ));

    let bad_sales = write_csv("Date,Region,ProductLine,Sales,CustomerRating\n2024-01-01,US,Footwear,lots,4\n");
    assert!(matches!(load_file(bad_sales.path()), Err(LoadError::InvalidNumber { .. })));

    let bad_rating = write_csv("Date,Region,ProductLine,Sales,CustomerRating\n2024-01-01,US,Footwear,1,7\n");
    assert!(matches!(load_file(bad_rating.path()), Err(LoadError::RatingOutOfRange { .. })));
}
