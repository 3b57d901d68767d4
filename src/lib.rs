//! Filter a directory of medical professionals and summarise the selection
//! as KPI strings, chart-ready aggregates and a table.
//!
//! ```text
//!  FilterSpec ──► data::apply ──► FilteredView ──┬─► analysis::aggregate ──┐
//!                                                │                          ▼
//!                                                └──────────────► report::assemble
//!                                                                           │
//!                                                                           ▼
//!                                                                   DashboardResult
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod report;
pub mod state;

pub use analysis::{aggregate, aggregate_with, AggregateOptions, AggregationResult, KpiSummary};
pub use config::{ConfigError, DisplayConfig};
pub use data::{
    apply, category_choice, load_csv_reader, load_file, DatasetStore, FilterError, FilterSpec,
    FilteredView, LoadError, PriceRange, Record, TelemedicineFilter,
};
pub use report::{assemble, dashboard, DashboardResult, KpiStrings, TableRow};
pub use state::DashboardState;
