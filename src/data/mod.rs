/// Data layer: core types, loading, caching, filtering and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → SalesTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  load once per process, share Arc<SalesTable>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  region / product-line sets → filtered rows
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  export   │  filtered rows → .csv / .parquet
///   └──────────┘
/// ```

pub mod cache;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
