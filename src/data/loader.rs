use std::fs::File;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, AsArray, Date32Array, Date64Array, Float32Array, Float64Array, Int32Array,
    Int64Array, StringArray, TimestampMicrosecondArray, TimestampMillisecondArray,
    TimestampNanosecondArray, TimestampSecondArray,
};
use arrow::datatypes::{DataType, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::error::LoadError;
use super::model::{
    SalesRecord, SalesTable, COL_DATE, COL_LATITUDE, COL_LONGITUDE, COL_PRODUCT_LINE, COL_RATING,
    COL_REGION, COL_SALES, MAX_RATING,
};

/// Days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sales dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, columns `Date, Region, ProductLine, Sales,
///   CustomerRating` and optionally `Latitude, Longitude`
/// * `.json`    – `[{ "Date": "2024-01-31", "Region": "US", ... }, ...]`;
///   `Date` may also be epoch milliseconds
/// * `.parquet` – same columns; `Date` may be Date32/Date64, Timestamp or text
pub fn load_file(path: &Path) -> Result<SalesTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedExtension(other.to_string())),
    };

    log::info!(
        "Loaded {} sales records from {} ({} regions, {} product lines, geo: {})",
        table.len(),
        path.display(),
        table.regions.len(),
        table.product_lines.len(),
        table.has_geo
    );
    Ok(table)
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Cell parsing shared by every format
// ---------------------------------------------------------------------------

/// Parse a calendar date, dropping any time-of-day component.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

/// Calendar date (UTC) of a Unix timestamp counted in `unit`.
pub(crate) fn date_from_timestamp(value: i64, unit: &TimeUnit) -> Option<NaiveDate> {
    let per_second: i64 = match unit {
        TimeUnit::Second => 1,
        TimeUnit::Millisecond => 1_000,
        TimeUnit::Microsecond => 1_000_000,
        TimeUnit::Nanosecond => 1_000_000_000,
    };
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * (1_000_000_000 / per_second);
    DateTime::from_timestamp(secs, nanos as u32).map(|dt| dt.date_naive())
}

fn date_cell(s: &str, row: usize) -> Result<NaiveDate, LoadError> {
    parse_date(s).ok_or_else(|| LoadError::InvalidDate {
        row,
        value: s.to_string(),
    })
}

fn number_cell(s: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    s.trim().parse::<f64>().map_err(|_| LoadError::InvalidNumber {
        row,
        column: column.to_string(),
        value: s.to_string(),
    })
}

/// Empty cells are missing coordinates, not errors.
fn optional_number_cell(s: &str, row: usize, column: &str) -> Result<Option<f64>, LoadError> {
    if s.trim().is_empty() {
        Ok(None)
    } else {
        number_cell(s, row, column).map(Some)
    }
}

fn checked_rating(value: f64, row: usize) -> Result<f64, LoadError> {
    if (0.0..=MAX_RATING).contains(&value) {
        Ok(value)
    } else {
        Err(LoadError::RatingOutOfRange { row, value })
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Column positions resolved from a CSV header row.
struct CsvLayout {
    date: usize,
    region: usize,
    product_line: usize,
    sales: usize,
    rating: usize,
    geo: Option<(usize, usize)>,
}

impl CsvLayout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| find(name).ok_or_else(|| LoadError::MissingColumn(name.to_string()));

        Ok(CsvLayout {
            date: require(COL_DATE)?,
            region: require(COL_REGION)?,
            product_line: require(COL_PRODUCT_LINE)?,
            sales: require(COL_SALES)?,
            rating: require(COL_RATING)?,
            geo: find(COL_LATITUDE).zip(find(COL_LONGITUDE)),
        })
    }
}

/// CSV layout: header row with column names, any column order.
/// Columns other than the known ones are ignored.
fn load_csv(path: &Path) -> Result<SalesTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(open(path)?);
    let layout = CsvLayout::from_headers(reader.headers()?)?;

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_no + 1;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let (latitude, longitude) = match layout.geo {
            Some((lat, lon)) => (
                optional_number_cell(cell(lat), row, COL_LATITUDE)?,
                optional_number_cell(cell(lon), row, COL_LONGITUDE)?,
            ),
            None => (None, None),
        };

        records.push(SalesRecord {
            date: date_cell(cell(layout.date), row)?,
            region: cell(layout.region).to_string(),
            product_line: cell(layout.product_line).to_string(),
            sales: number_cell(cell(layout.sales), row, COL_SALES)?,
            customer_rating: checked_rating(number_cell(cell(layout.rating), row, COL_RATING)?, row)?,
            latitude,
            longitude,
        });
    }

    Ok(SalesTable::from_records(records, layout.geo.is_some()))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Date": "2024-01-31", "Region": "US", "ProductLine": "Footwear",
///     "Sales": 1200.0, "CustomerRating": 4.5,
///     "Latitude": 37.1, "Longitude": -95.7 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SalesTable, LoadError> {
    let root: JsonValue = serde_json::from_reader(std::io::BufReader::new(open(path)?))?;

    let rows: &[JsonValue] = match &root {
        JsonValue::Array(rows) => rows,
        _ => return Err(LoadError::NotRecords),
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut has_geo = false;

    for (row_no, rec) in rows.iter().enumerate() {
        let row = row_no + 1;
        let obj = rec
            .as_object()
            .ok_or(LoadError::NotRecords)?;

        has_geo |= obj.contains_key(COL_LATITUDE) && obj.contains_key(COL_LONGITUDE);

        records.push(SalesRecord {
            date: json_date(obj, row)?,
            region: json_text(obj, COL_REGION, row)?,
            product_line: json_text(obj, COL_PRODUCT_LINE, row)?,
            sales: json_number(obj, COL_SALES, row)?
                .ok_or_else(|| missing(row, COL_SALES))?,
            customer_rating: checked_rating(
                json_number(obj, COL_RATING, row)?.ok_or_else(|| missing(row, COL_RATING))?,
                row,
            )?,
            latitude: json_number(obj, COL_LATITUDE, row)?,
            longitude: json_number(obj, COL_LONGITUDE, row)?,
        });
    }

    Ok(SalesTable::from_records(records, has_geo))
}

fn missing(row: usize, column: &str) -> LoadError {
    LoadError::MissingValue {
        row,
        column: column.to_string(),
    }
}

/// Dates are text, or epoch milliseconds as written by `df.to_json()`.
fn json_date(obj: &Map<String, JsonValue>, row: usize) -> Result<NaiveDate, LoadError> {
    match obj.get(COL_DATE) {
        Some(JsonValue::Number(n)) => n
            .as_i64()
            .and_then(|millis| date_from_timestamp(millis, &TimeUnit::Millisecond))
            .ok_or_else(|| LoadError::InvalidDate {
                row,
                value: n.to_string(),
            }),
        _ => date_cell(&json_text(obj, COL_DATE, row)?, row),
    }
}

fn json_text(obj: &Map<String, JsonValue>, key: &str, row: usize) -> Result<String, LoadError> {
    match obj.get(key) {
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) => Ok(n.to_string()),
        Some(JsonValue::Bool(b)) => Ok(b.to_string()),
        _ => Err(missing(row, key)),
    }
}

/// Numbers may be JSON numbers or numeric strings; absent or null is `None`.
fn json_number(obj: &Map<String, JsonValue>, key: &str, row: usize) -> Result<Option<f64>, LoadError> {
    match obj.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::Number(n)) => n.as_f64().map(Some).ok_or_else(|| LoadError::InvalidNumber {
            row,
            column: key.to_string(),
            value: n.to_string(),
        }),
        Some(JsonValue::String(s)) => optional_number_cell(s, row, key),
        Some(other) => Err(LoadError::InvalidNumber {
            row,
            column: key.to_string(),
            value: other.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing sales data.
///
/// Expected schema:
/// - `Date`: Date32, Date64, Timestamp (any unit) or Utf8
/// - `Region`, `ProductLine`: Utf8 or LargeUtf8
/// - `Sales`, `CustomerRating`: any float or integer type
/// - `Latitude`, `Longitude`: optional, float
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<SalesTable, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let schema = builder.schema().clone();
    let has_geo =
        schema.index_of(COL_LATITUDE).is_ok() && schema.index_of(COL_LONGITUDE).is_ok();
    let reader = builder.build()?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;

        let date_col = column(&batch, COL_DATE)?;
        let region_col = column(&batch, COL_REGION)?;
        let product_col = column(&batch, COL_PRODUCT_LINE)?;
        let sales_col = column(&batch, COL_SALES)?;
        let rating_col = column(&batch, COL_RATING)?;
        let geo_cols = if has_geo {
            Some((column(&batch, COL_LATITUDE)?, column(&batch, COL_LONGITUDE)?))
        } else {
            None
        };

        for i in 0..batch.num_rows() {
            let row = records.len() + 1;

            let (latitude, longitude) = match geo_cols {
                Some((lat, lon)) => (
                    arrow_f64(lat, i, row, COL_LATITUDE)?,
                    arrow_f64(lon, i, row, COL_LONGITUDE)?,
                ),
                None => (None, None),
            };
            let sales = arrow_f64(sales_col, i, row, COL_SALES)?.ok_or_else(|| missing(row, COL_SALES))?;
            let rating = arrow_f64(rating_col, i, row, COL_RATING)?.ok_or_else(|| missing(row, COL_RATING))?;

            records.push(SalesRecord {
                date: arrow_date(date_col, i, row)?,
                region: arrow_text(region_col, i, row, COL_REGION)?,
                product_line: arrow_text(product_col, i, row, COL_PRODUCT_LINE)?,
                sales,
                customer_rating: checked_rating(rating, row)?,
                latitude,
                longitude,
            });
        }
    }

    Ok(SalesTable::from_records(records, has_geo))
}

// -- Parquet / Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, LoadError> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| LoadError::MissingColumn(name.to_string()))?;
    Ok(batch.column(idx))
}

fn unsupported(col: &ArrayRef, row: usize, column: &str) -> LoadError {
    LoadError::UnsupportedType {
        row,
        column: column.to_string(),
        data_type: col.data_type().to_string(),
    }
}

fn downcast<'a, T: Array + 'static>(col: &'a ArrayRef, row: usize, column: &str) -> Result<&'a T, LoadError> {
    col.as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| unsupported(col, row, column))
}

/// Days since the Unix epoch, as stored in Arrow `Date32`.
pub(crate) fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

/// Convert days since the Unix epoch into a calendar date.
pub(crate) fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

fn arrow_date(col: &ArrayRef, i: usize, row: usize) -> Result<NaiveDate, LoadError> {
    if col.is_null(i) {
        return Err(missing(row, COL_DATE));
    }
    let invalid = |value: String| LoadError::InvalidDate { row, value };

    match col.data_type() {
        DataType::Date32 => {
            let days = downcast::<Date32Array>(col, row, COL_DATE)?.value(i);
            date_from_epoch_days(days).ok_or_else(|| invalid(days.to_string()))
        }
        DataType::Date64 => {
            let millis = downcast::<Date64Array>(col, row, COL_DATE)?.value(i);
            date_from_timestamp(millis, &TimeUnit::Millisecond)
                .ok_or_else(|| invalid(millis.to_string()))
        }
        // Pandas and Polars write datetime columns as timestamps; a time zone,
        // if any, is ignored and the UTC date is used.
        DataType::Timestamp(unit, _) => {
            let value = match unit {
                TimeUnit::Second => downcast::<TimestampSecondArray>(col, row, COL_DATE)?.value(i),
                TimeUnit::Millisecond => {
                    downcast::<TimestampMillisecondArray>(col, row, COL_DATE)?.value(i)
                }
                TimeUnit::Microsecond => {
                    downcast::<TimestampMicrosecondArray>(col, row, COL_DATE)?.value(i)
                }
                TimeUnit::Nanosecond => {
                    downcast::<TimestampNanosecondArray>(col, row, COL_DATE)?.value(i)
                }
            };
            date_from_timestamp(value, unit).ok_or_else(|| invalid(value.to_string()))
        }
        DataType::Utf8 | DataType::LargeUtf8 => {
            let text = arrow_text(col, i, row, COL_DATE)?;
            date_cell(&text, row)
        }
        _ => Err(unsupported(col, row, COL_DATE)),
    }
}

fn arrow_text(col: &ArrayRef, i: usize, row: usize, column: &str) -> Result<String, LoadError> {
    if col.is_null(i) {
        return Err(missing(row, column));
    }
    match col.data_type() {
        DataType::Utf8 => Ok(downcast::<StringArray>(col, row, column)?.value(i).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(i).to_string()),
        _ => Err(unsupported(col, row, column)),
    }
}

/// Read a numeric cell as `f64`; nulls are `None`.
fn arrow_f64(col: &ArrayRef, i: usize, row: usize, column: &str) -> Result<Option<f64>, LoadError> {
    if col.is_null(i) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => downcast::<Float64Array>(col, row, column)?.value(i),
        DataType::Float32 => downcast::<Float32Array>(col, row, column)?.value(i) as f64,
        DataType::Int64 => downcast::<Int64Array>(col, row, column)?.value(i) as f64,
        DataType::Int32 => downcast::<Int32Array>(col, row, column)?.value(i) as f64,
        _ => return Err(unsupported(col, row, column)),
    };
    Ok(Some(value))
}
