use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::error::ExportError;
use super::loader::epoch_days;
use super::model::{
    SalesTable, COL_DATE, COL_LATITUDE, COL_LONGITUDE, COL_PRODUCT_LINE, COL_RATING, COL_REGION,
    COL_SALES,
};

/// File name offered for the filtered-data download.
pub const DEFAULT_EXPORT_NAME: &str = "filtered_data.csv";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write `table` to `path`, choosing the format by extension, with the
/// same extensions `load_file` reads (`.csv`/`.txt`, `.json`, `.parquet`/`.pq`).
/// Missing parent directories are created.
pub fn export_file(table: &SalesTable, path: &Path) -> Result<(), ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    if !matches!(ext.as_str(), "csv" | "txt" | "json" | "parquet" | "pq") {
        return Err(ExportError::UnsupportedExtension(ext));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    match ext.as_str() {
        "parquet" | "pq" => write_parquet(table, file)?,
        "json" => write_json(table, file)?,
        _ => write_csv(table, file)?,
    }

    log::info!("Exported {} records to {}", table.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV writer
// ---------------------------------------------------------------------------

/// Write the table with the same column layout it was loaded with.
/// Dates are written as `YYYY-MM-DD`; floats use the shortest exact form.
pub fn write_csv<W: Write>(table: &SalesTable, out: W) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(table.column_names())?;

    for rec in &table.records {
        let mut fields = vec![
            rec.date.format(DATE_FORMAT).to_string(),
            rec.region.clone(),
            rec.product_line.clone(),
            rec.sales.to_string(),
            rec.customer_rating.to_string(),
        ];
        if table.has_geo {
            fields.push(rec.latitude.map(|v| v.to_string()).unwrap_or_default());
            fields.push(rec.longitude.map(|v| v.to_string()).unwrap_or_default());
        }
        writer.write_record(&fields)?;
    }

    writer.flush()?;
    Ok(())
}

/// The CSV export as a string, ready to hand to a download surface.
pub fn to_csv_string(table: &SalesTable) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    String::from_utf8(buf).map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

// ---------------------------------------------------------------------------
// JSON writer
// ---------------------------------------------------------------------------

/// One row of the records-oriented JSON export.
/// Coordinates are omitted for tables without geo columns and `null` when a
/// geo row lacks them, so the loader sees the same layout again.
#[derive(Serialize)]
struct JsonRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Region")]
    region: &'a str,
    #[serde(rename = "ProductLine")]
    product_line: &'a str,
    #[serde(rename = "Sales")]
    sales: f64,
    #[serde(rename = "CustomerRating")]
    customer_rating: f64,
    #[serde(rename = "Latitude", skip_serializing_if = "Option::is_none")]
    latitude: Option<Option<f64>>,
    #[serde(rename = "Longitude", skip_serializing_if = "Option::is_none")]
    longitude: Option<Option<f64>>,
}

/// Write the table as a JSON array of record objects.
pub fn write_json<W: Write>(table: &SalesTable, out: W) -> Result<(), ExportError> {
    let rows: Vec<JsonRow<'_>> = table
        .records
        .iter()
        .map(|rec| JsonRow {
            date: rec.date.format(DATE_FORMAT).to_string(),
            region: &rec.region,
            product_line: &rec.product_line,
            sales: rec.sales,
            customer_rating: rec.customer_rating,
            latitude: table.has_geo.then_some(rec.latitude),
            longitude: table.has_geo.then_some(rec.longitude),
        })
        .collect();

    let mut out = std::io::BufWriter::new(out);
    serde_json::to_writer_pretty(&mut out, &rows)?;
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Arrow / Parquet writer
// ---------------------------------------------------------------------------

/// Build a single Arrow record batch holding the whole table.
pub fn to_record_batch(table: &SalesTable) -> Result<RecordBatch, ArrowError> {
    let recs = &table.records;

    let mut fields = vec![
        Field::new(COL_DATE, DataType::Date32, false),
        Field::new(COL_REGION, DataType::Utf8, false),
        Field::new(COL_PRODUCT_LINE, DataType::Utf8, false),
        Field::new(COL_SALES, DataType::Float64, false),
        Field::new(COL_RATING, DataType::Float64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from(
            recs.iter().map(|r| epoch_days(r.date)).collect::<Vec<i32>>(),
        )),
        Arc::new(StringArray::from_iter_values(recs.iter().map(|r| r.region.as_str()))),
        Arc::new(StringArray::from_iter_values(recs.iter().map(|r| r.product_line.as_str()))),
        Arc::new(Float64Array::from_iter_values(recs.iter().map(|r| r.sales))),
        Arc::new(Float64Array::from_iter_values(recs.iter().map(|r| r.customer_rating))),
    ];

    if table.has_geo {
        fields.push(Field::new(COL_LATITUDE, DataType::Float64, true));
        fields.push(Field::new(COL_LONGITUDE, DataType::Float64, true));
        columns.push(Arc::new(Float64Array::from(
            recs.iter().map(|r| r.latitude).collect::<Vec<Option<f64>>>(),
        )));
        columns.push(Arc::new(Float64Array::from(
            recs.iter().map(|r| r.longitude).collect::<Vec<Option<f64>>>(),
        )));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

/// Write the table as a single-row-group Parquet file.
pub fn write_parquet<W: Write + Send>(table: &SalesTable, out: W) -> Result<(), ExportError> {
    let batch = to_record_batch(table)?;
    let mut writer = ArrowWriter::try_new(out, batch.schema(), None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
