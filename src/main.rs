mod data;
mod regions;
mod regression;
mod report;
mod stats;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use data::model::RawRecord;
use data::{filter, loader, sample};
use regression::{features, ols};
use stats::aggregate::GroupAggregator;
use stats::summary::{summarize_region, NationalAccumulator};

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let data_dir = PathBuf::from(args.next().unwrap_or_else(|| "data".into()));
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| data_dir.clone());

    let regions = loader::discover_regions(&data_dir)?;
    if regions.is_empty() {
        bail!("no region files (*_slim.csv) found in {}", data_dir.display());
    }
    log::info!("{} region files in {}", regions.len(), data_dir.display());

    // Pipeline 1: per-region aggregation, then the national roll-up.
    // Pipeline 2 shares the filtered population: a deterministic sample per
    // region feeds the pooled regression.
    let mut national = NationalAccumulator::default();
    let mut regression_rows: Vec<RawRecord> = Vec::new();

    for (code, path) in &regions {
        let name = regions::region_name(code);
        let records = filter::filtered(loader::load_region(path)?);

        let mut aggregator = GroupAggregator::default();
        for record in &records {
            aggregator.observe(record);
        }
        let means = aggregator.finish();
        match summarize_region(&means) {
            Some(stats) => {
                log::info!(
                    "{name}: {} loans, B/W spread gap {:+.3}pp",
                    stats.total_loans,
                    stats.rate_gap_bw
                );
                national.push(name.to_string(), stats);
            }
            None => log::warn!("{name}: insufficient data ({} qualifying records)", means.total),
        }

        let drawn =
            sample::sample_fraction(records, sample::DEFAULT_SAMPLE_FRACTION, sample::DEFAULT_SEED);
        log::debug!("{name}: {} rows sampled for regression", drawn.len());
        regression_rows.extend(drawn);
    }

    let summary = national.finish(regions::COVERED_YEARS);
    log::info!(
        "{} regions qualified, {} total loans",
        summary.summary.num_states,
        summary.summary.total_loans
    );
    report::write_precomputed_json(&out_dir.join("precomputed.json"), &summary)?;
    report::write_precomputed_ts(&out_dir.join("precomputed.ts"), &summary)?;

    let design = features::build_design_matrix(&regression_rows)
        .context("building regression design matrix")?;
    log::info!(
        "regression sample: {} rows × {} columns",
        design.x.nrows(),
        design.names.len()
    );
    let fit = ols::fit(&design.x, &design.y);
    let regression_report = ols::summarize(&design, &fit);
    for (name, stats) in &regression_report.named_coefficients {
        log::info!(
            "{name}: {:+.4} ({:.4}, {:.4}) p={}",
            stats.coef,
            stats.ci_lower,
            stats.ci_upper,
            stats.p_value
        );
    }
    report::write_regression_json(&out_dir.join("regression_results.json"), &regression_report)?;

    Ok(())
}
