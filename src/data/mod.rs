/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + coerce once → DatasetStore
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │ DatasetStore │  Vec<Record>, option domains, price bounds
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  apply FilterSpec predicates → FilteredView
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;

pub use filter::{
    apply, category_choice, FilterError, FilterSpec, FilteredView, PriceRange, TelemedicineFilter,
};
pub use loader::{load_csv_reader, load_file, LoadError};
pub use model::{DatasetStore, Record};
