use std::path::Path;

use anyhow::{Context, Result};

use crate::regression::ols::RegressionReport;
use crate::stats::summary::NationalSummary;

// ---------------------------------------------------------------------------
// Persisted artifacts
// ---------------------------------------------------------------------------

/// Write the aggregation artifact as pretty-printed JSON.
pub fn write_precomputed_json(path: &Path, summary: &NationalSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serializing national summary")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// Write the aggregation artifact as a typed TypeScript constant so a
/// front-end build can embed it directly:
///
/// ```text
/// const data = {...} as const;
///
/// export default data;
/// ```
pub fn write_precomputed_ts(path: &Path, summary: &NationalSummary) -> Result<()> {
    let json = serde_json::to_string(summary).context("serializing national summary")?;
    let body = format!("const data = {json} as const;\n\nexport default data;\n");
    std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))
}

/// Write the regression artifact as pretty-printed JSON.
pub fn write_regression_json(path: &Path, report: &RegressionReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing regression report")?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::summary::NationalAccumulator;

    fn scratch(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("loanscope-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[test]
    fn ts_artifact_wraps_the_json_document() {
        let summary = NationalAccumulator::default().finish("2018-2023");
        let path = scratch("precomputed.ts");
        write_precomputed_ts(&path, &summary).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        assert!(body.starts_with("const data = {"));
        assert!(body.ends_with(" as const;\n\nexport default data;\n"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn json_artifact_contains_the_summary_header() {
        let summary = NationalAccumulator::default().finish("2018-2023");
        let path = scratch("precomputed.json");
        write_precomputed_json(&path, &summary).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["summary"]["num_states"], 0);
        assert_eq!(parsed["summary"]["years"], "2018-2023");
        assert!(parsed["by_state"].as_object().unwrap().is_empty());
        std::fs::remove_file(&path).ok();
    }
}
