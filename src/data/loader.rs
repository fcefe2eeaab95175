use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::model::RawRecord;

// ---------------------------------------------------------------------------
// Record source boundary: slim CSV files, one per region
// ---------------------------------------------------------------------------

/// Suffix of a per-region slim CSV (`<CODE>_slim.csv`).
const REGION_FILE_SUFFIX: &str = "_slim.csv";

/// Load one region's records from a slim CSV.
///
/// The header row names the fields; column order is irrelevant and columns
/// beyond the known schema are ignored. Missing columns deserialize to empty
/// strings, which downstream parsing treats as absent values. A malformed
/// row is a hard error: corrupted input stops the run rather than producing
/// a partial dataset.
pub fn load_region(path: &Path) -> Result<Vec<RawRecord>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<RawRecord>().enumerate() {
        let record = result.with_context(|| format!("{}: row {row_no}", path.display()))?;
        records.push(record);
    }
    Ok(records)
}

/// Discover region files in a data directory.
///
/// Returns `(region_code, path)` pairs sorted by region code so every run
/// processes regions in the same order.
pub fn discover_regions(dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading data directory {}", dir.display()))?;

    let mut regions = Vec::new();
    for entry in entries {
        let entry = entry.context("reading data directory entry")?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(code) = name.strip_suffix(REGION_FILE_SUFFIX) {
            regions.push((code.to_string(), path));
        }
    }
    regions.sort();
    Ok(regions)
}
