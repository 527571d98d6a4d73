/// Data layer: record types, loading, and KPI aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  store    │  Arc<Dataset> snapshot, explicit reload
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ kpi / group   │  global KPIs, grouped sums, top-N
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  report   │  everything the dashboard shows, once per load
///   └──────────┘
/// ```

pub mod error;
pub mod format;
pub mod group;
pub mod kpi;
pub mod loader;
pub mod model;
pub mod report;
pub mod store;
