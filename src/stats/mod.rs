/// Aggregation pipeline: streaming per-region grouping and the national
/// mean-of-means roll-up.
pub mod aggregate;
pub mod summary;
