//! Sales analytics pipeline.
//!
//! Loads a regional sales dataset, narrows it by region and product line, and
//! computes the metrics and series a sales dashboard displays.
//!
//! ```text
//!  load (data::loader, data::cache) → filter (data::filter, state)
//!      → aggregate (stats) → present (report) / download (data::export)
//! ```

pub mod data;
pub mod report;
pub mod state;
pub mod stats;
