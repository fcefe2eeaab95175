/// Data layer: record schema, ingestion, filtering, and sampling.
///
/// Architecture:
/// ```text
///  <CODE>_slim.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Vec<RawRecord>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  row predicate → qualifying records
///   └──────────┘
///        │              │
///        ▼              ▼
///   aggregation    ┌──────────┐
///   (stats::*)     │  sample   │  deterministic fraction → regression
///                  └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;
