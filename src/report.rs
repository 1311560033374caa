use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use serde::Serialize;

use crate::data::filter::FilterState;
use crate::data::loader::epoch_days;
use crate::stats::Dashboard;

// ---------------------------------------------------------------------------
// KPI formatting
// ---------------------------------------------------------------------------

/// Whole-dollar amount with thousands separators, e.g. `$1,234,567`.
pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("${amount}");
    }
    let digits = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 && digits != "0" { "-" } else { "" };
    format!("{sign}${grouped}")
}

/// Average rating to two decimals out of 5; `n/a` for an empty selection.
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{r:.2} / 5"),
        None => "n/a / 5".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn batch(fields: Vec<Field>, columns: Vec<ArrayRef>) -> Result<RecordBatch, ArrowError> {
    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
}

fn product_line_batch(d: &Dashboard) -> Result<RecordBatch, ArrowError> {
    let rows = &d.sales_by_product_line;
    batch(
        vec![
            Field::new("ProductLine", DataType::Utf8, false),
            Field::new("Sales", DataType::Float64, false),
        ],
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.product_line.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.sales))),
        ],
    )
}

fn trend_batch(d: &Dashboard) -> Result<RecordBatch, ArrowError> {
    let rows = &d.sales_by_date_region;
    batch(
        vec![
            Field::new("Date", DataType::Date32, false),
            Field::new("Region", DataType::Utf8, false),
            Field::new("Sales", DataType::Float64, false),
        ],
        vec![
            Arc::new(Date32Array::from_iter_values(rows.iter().map(|r| epoch_days(r.date)))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.region.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.sales))),
        ],
    )
}

fn histogram_batch(d: &Dashboard) -> Result<RecordBatch, ArrowError> {
    let bins = &d.rating_histogram;
    let last = bins.len().saturating_sub(1);
    let labels: Vec<String> = bins
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let close = if i == last { ']' } else { ')' };
            format!("[{:.1}, {:.1}{close}", b.lower, b.upper)
        })
        .collect();
    batch(
        vec![
            Field::new("CustomerRating", DataType::Utf8, false),
            Field::new("Count", DataType::UInt64, false),
        ],
        vec![
            Arc::new(StringArray::from(labels)),
            Arc::new(UInt64Array::from_iter_values(bins.iter().map(|b| b.count as u64))),
        ],
    )
}

fn location_batch(d: &Dashboard) -> Option<Result<RecordBatch, ArrowError>> {
    let rows = d.sales_by_location.as_ref()?;
    Some(batch(
        vec![
            Field::new("Region", DataType::Utf8, false),
            Field::new("Latitude", DataType::Float64, false),
            Field::new("Longitude", DataType::Float64, false),
            Field::new("Sales", DataType::Float64, false),
        ],
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.region.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.latitude))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.longitude))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.mean_sales))),
        ],
    ))
}

fn section(out: &mut String, title: &str, batch: &RecordBatch) -> Result<(), ArrowError> {
    let table = pretty_format_batches(std::slice::from_ref(batch))?;
    out.push_str(&format!("\n{title}\n{table}\n"));
    Ok(())
}

/// Render the dashboard as plain-text tables.
pub fn render_text(dashboard: &Dashboard, filters: &FilterState) -> Result<String, ArrowError> {
    let mut out = String::new();
    let join = |set: &std::collections::BTreeSet<String>| {
        set.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
    };

    out.push_str("Sales Performance Dashboard\n");
    out.push_str(&format!("Regions:       {}\n", join(&filters.regions)));
    out.push_str(&format!("Product lines: {}\n", join(&filters.product_lines)));
    out.push_str(&format!("Rows:          {}\n\n", dashboard.row_count));
    out.push_str(&format!("Total Sales     {}\n", format_currency(dashboard.total_sales)));
    out.push_str(&format!("Average Rating  {}\n", format_rating(dashboard.average_rating)));

    section(&mut out, "Sales by Product Line", &product_line_batch(dashboard)?)?;
    section(&mut out, "Sales Trend by Region", &trend_batch(dashboard)?)?;
    section(&mut out, "Customer Rating Distribution", &histogram_batch(dashboard)?)?;
    if let Some(locations) = location_batch(dashboard) {
        section(&mut out, "Regional Sales Distribution", &locations?)?;
    }

    Ok(out)
}

// ---------------------------------------------------------------------------
// JSON rendering
// ---------------------------------------------------------------------------

/// Serializable snapshot of one filter selection and its dashboard.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub filters: &'a FilterState,
    pub total_sales_display: String,
    pub average_rating_display: String,
    #[serde(flatten)]
    pub dashboard: &'a Dashboard,
}

impl<'a> Report<'a> {
    pub fn new(dashboard: &'a Dashboard, filters: &'a FilterState) -> Self {
        Self {
            filters,
            total_sales_display: format_currency(dashboard.total_sales),
            average_rating_display: format_rating(dashboard.average_rating),
            dashboard,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
