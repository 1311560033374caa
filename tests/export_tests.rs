use std::io::Write;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use sales_dashboard::data::export::{export_file, to_csv_string, write_parquet};
use sales_dashboard::data::filter::{filter_table, FilterState};
use sales_dashboard::data::loader::load_file;
use sales_dashboard::data::model::{SalesRecord, SalesTable};

fn table(has_geo: bool) -> SalesTable {
    let rows = [
        ("2023-11-30", "North America", "Footwear", 41234.57, 4.3, Some((39.8, -98.6))),
        ("2023-11-30", "Europe", "Apparel, Kids", 0.1 + 0.2, 3.95, Some((50.1, 9.7))),
        ("2023-12-31", "Greater China", "Equipment", 12.0, 0.0, None),
        ("2024-01-31", "Europe", "Footwear", 1e7, 5.0, Some((50.1, 9.7))),
    ];
    let records = rows
        .iter()
        .map(|&(date, region, product_line, sales, rating, loc)| SalesRecord {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            region: region.to_string(),
            product_line: product_line.to_string(),
            sales,
            customer_rating: rating,
            latitude: loc.filter(|_| has_geo).map(|(lat, _)| lat),
            longitude: loc.filter(|_| has_geo).map(|(_, lon)| lon),
        })
        .collect();
    SalesTable::from_records(records, has_geo)
}

#[test]
fn test_csv_round_trip_filtered() {
    let original = table(true);
    let filters = FilterState {
        regions: ["Europe", "Greater China"].iter().map(|s| s.to_string()).collect(),
        ..FilterState::all(&original)
    };
    let filtered = filter_table(&original, &filters);
    assert_eq!(filtered.len(), 3);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("filtered_data.csv");
    export_file(&filtered, &path).unwrap();

    let reloaded = load_file(&path).unwrap();
    assert_eq!(reloaded, filtered);
}

#[test]
fn test_csv_round_trip_without_geo() {
    let original = table(false);
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(to_csv_string(&original).unwrap().as_bytes()).unwrap();
    file.flush().unwrap();

    let reloaded = load_file(file.path()).unwrap();
    assert!(!reloaded.has_geo);
    assert_eq!(reloaded, original);
}

#[test]
fn test_parquet_round_trip() {
    let original = table(true);
    let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    write_parquet(&original, file.reopen().unwrap()).unwrap();

    let reloaded = load_file(file.path()).unwrap();
    assert_eq!(reloaded, original);
}

#[test]
fn test_export_empty_selection() {
    let original = table(true);
    let empty = filter_table(&original, &FilterState::default());
    let text = to_csv_string(&empty).unwrap();
    assert_eq!(text, "Date,Region,ProductLine,Sales,CustomerRating,Latitude,Longitude\n");
}

#[test]
fn test_load_json_records() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"[
            {{"Date": "2024-01-31", "Region": "US", "ProductLine": "Footwear",
              "Sales": 1200, "CustomerRating": 4.5, "Latitude": 37.1, "Longitude": -95.7}},
            {{"Date": "2024-02-29T00:00:00", "Region": "EU", "ProductLine": "Apparel",
              "Sales": "80.5", "CustomerRating": 3, "Latitude": null, "Longitude": null}}
        ]"#
    )
    .unwrap();
    file.flush().unwrap();

    let table = load_file(file.path()).unwrap();
    assert!(table.has_geo);
    assert_eq!(table.len(), 2);
    assert_eq!(table.records[0].location(), Some((37.1, -95.7)));
    assert_eq!(table.records[1].date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    assert_eq!(table.records[1].sales, 80.5);
    assert_eq!(table.records[1].location(), None);
}

#[test]
fn test_json_round_trip() {
    for has_geo in [true, false] {
        let original = table(has_geo);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered_data.json");
        export_file(&original, &path).unwrap();

        let reloaded = load_file(&path).unwrap();
        assert_eq!(reloaded.has_geo, has_geo);
        assert_eq!(reloaded, original);
    }
}

#[test]
fn test_export_rejects_unknown_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filtered_data.xlsx");
    let err = export_file(&table(true), &path).unwrap_err();
    assert_eq!(err.to_string(), "unsupported export extension: .xlsx");
    assert!(!path.exists());
}
