/// Data layer: core types, loading, classification and filtering.
///
/// Architecture:
/// ```text
///  .csv / .xls / .xlsx
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  headers, Arc<Vec<Row>>
///   └──────────┘
///        │
///        ├──────────────────┐
///        ▼                  ▼
///   ┌──────────┐      ┌──────────┐
///   │ classify  │      │  filter   │  active constraints → filtered rows
///   └──────────┘      └──────────┘
///   sample → column descriptors
/// ```

pub mod classify;
pub mod dates;
pub mod filter;
pub mod loader;
pub mod model;
