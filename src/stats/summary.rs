use std::collections::BTreeMap;

use serde::Serialize;

use crate::data::model::{IncomeBracket, LoanType, RaceGroup};

use super::aggregate::{round3, GroupMeans};

// ---------------------------------------------------------------------------
// RegionStats – the published per-region record
// ---------------------------------------------------------------------------

/// Minimum qualifying records for a region to be published
/// (strictly greater-than: exactly 100 is excluded).
pub const REGION_MIN_RECORDS: u64 = 100;

/// Races published in the per-loan-type and per-bracket breakdowns.
const BREAKDOWN_RACES: [RaceGroup; 3] = [RaceGroup::White, RaceGroup::Black, RaceGroup::Hispanic];

/// One income-bracket row; a race is absent when its cell was suppressed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BracketRow {
    pub bracket: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub white: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub black: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hispanic: Option<f64>,
}

/// Per-region derived statistics. Created once from a single pass over the
/// region's filtered records; never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct RegionStats {
    pub total_loans: u64,
    pub avg_rates: BTreeMap<&'static str, f64>,
    pub avg_spreads: BTreeMap<&'static str, f64>,
    pub rate_gap_bw: f64,
    pub rate_gap_hw: f64,
    pub avg_income: BTreeMap<&'static str, f64>,
    pub avg_loan_amount: BTreeMap<&'static str, f64>,
    pub loan_type_spreads: BTreeMap<&'static str, BTreeMap<&'static str, f64>>,
    pub income_brackets: Vec<BracketRow>,
    pub counts: BTreeMap<&'static str, u64>,
}

fn keyed(map: &BTreeMap<RaceGroup, f64>) -> BTreeMap<&'static str, f64> {
    map.iter().map(|(race, v)| (race.key(), *v)).collect()
}

/// Spread gap of a minority group against white, 0.0 when the minority mean
/// is absent (documented fallback, not an error).
fn spread_gap(means: &GroupMeans, minority: RaceGroup) -> f64 {
    let white = means.avg_spreads.get(&RaceGroup::White).copied().unwrap_or(0.0);
    match means.avg_spreads.get(&minority) {
        Some(m) => round3(m - white),
        None => 0.0,
    }
}

/// Build the published record for one region, or `None` when the region has
/// too few qualifying records to publish.
pub fn summarize_region(means: &GroupMeans) -> Option<RegionStats> {
    if means.total <= REGION_MIN_RECORDS {
        return None;
    }

    let mut loan_type_spreads: BTreeMap<&'static str, BTreeMap<&'static str, f64>> =
        BTreeMap::new();
    for loan_type in LoanType::ALL {
        let mut cells = BTreeMap::new();
        for race in BREAKDOWN_RACES {
            if let Some(mean) = means.loan_type_spreads.get(&(race, loan_type)) {
                cells.insert(race.key(), *mean);
            }
        }
        if !cells.is_empty() {
            loan_type_spreads.insert(loan_type.name(), cells);
        }
    }

    let mut income_brackets = Vec::new();
    for bracket in IncomeBracket::ALL {
        let cell = |race| means.bracket_spreads.get(&(race, bracket)).copied();
        let row = BracketRow {
            bracket: bracket.label(),
            white: cell(RaceGroup::White),
            black: cell(RaceGroup::Black),
            hispanic: cell(RaceGroup::Hispanic),
        };
        if row.white.is_some() || row.black.is_some() || row.hispanic.is_some() {
            income_brackets.push(row);
        }
    }

    Some(RegionStats {
        total_loans: means.total,
        avg_rates: keyed(&means.avg_rates),
        avg_spreads: keyed(&means.avg_spreads),
        rate_gap_bw: spread_gap(means, RaceGroup::Black),
        rate_gap_hw: spread_gap(means, RaceGroup::Hispanic),
        avg_income: keyed(&means.avg_income),
        avg_loan_amount: keyed(&means.avg_loan_amount),
        loan_type_spreads,
        income_brackets,
        counts: means.counts.iter().map(|(race, n)| (race.key(), *n)).collect(),
    })
}

// ---------------------------------------------------------------------------
// National roll-up – explicit accumulator, merged functionally
// ---------------------------------------------------------------------------

/// Header block of the published national document.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryHeader {
    pub total_loans: u64,
    pub num_states: usize,
    pub states: Vec<String>,
    pub years: String,
}

/// The merged two-pipeline aggregation artifact.
#[derive(Debug, Clone, Serialize)]
pub struct NationalSummary {
    pub summary: SummaryHeader,
    pub avg_rates: BTreeMap<&'static str, f64>,
    pub avg_spreads: BTreeMap<&'static str, f64>,
    pub by_state: BTreeMap<String, RegionStats>,
}

/// Accumulates qualifying regions into the national roll-up.
///
/// The national per-race figures are unweighted means of each region's
/// already-averaged statistic (mean-of-means), NOT a pooled mean over raw
/// records. That is the documented published behavior and is preserved
/// exactly for reproducibility, even though a population-weighted mean
/// would arguably be more defensible.
#[derive(Debug, Default)]
pub struct NationalAccumulator {
    total_loans: u64,
    region_rates: BTreeMap<RaceGroup, Vec<f64>>,
    region_spreads: BTreeMap<RaceGroup, Vec<f64>>,
    by_state: BTreeMap<String, RegionStats>,
}

impl NationalAccumulator {
    /// Fold one qualifying region into the roll-up.
    pub fn push(&mut self, region_name: String, stats: RegionStats) {
        self.total_loans += stats.total_loans;
        for race in RaceGroup::ALL {
            if let Some(v) = stats.avg_rates.get(race.key()) {
                self.region_rates.entry(race).or_default().push(*v);
            }
            if let Some(v) = stats.avg_spreads.get(race.key()) {
                self.region_spreads.entry(race).or_default().push(*v);
            }
        }
        self.by_state.insert(region_name, stats);
    }

    /// Produce the final national document.
    pub fn finish(self, years: &str) -> NationalSummary {
        let mean_of_means = |buckets: BTreeMap<RaceGroup, Vec<f64>>| {
            buckets
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(race, v)| (race.key(), round3(v.iter().sum::<f64>() / v.len() as f64)))
                .collect()
        };

        let states: Vec<String> = self.by_state.keys().cloned().collect();
        NationalSummary {
            summary: SummaryHeader {
                total_loans: self.total_loans,
                num_states: states.len(),
                states,
                years: years.to_string(),
            },
            avg_rates: mean_of_means(self.region_rates),
            avg_spreads: mean_of_means(self.region_spreads),
            by_state: self.by_state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::RawRecord;
    use crate::stats::aggregate::GroupAggregator;

    fn record(race: &str, rate: &str, spread: &str) -> RawRecord {
        RawRecord {
            derived_race: race.into(),
            interest_rate: rate.into(),
            rate_spread: spread.into(),
            ..RawRecord::default()
        }
    }

    fn region_means(n: usize) -> GroupMeans {
        let mut agg = GroupAggregator::default();
        for _ in 0..n {
            agg.observe(&record("White", "6.0", "1.0"));
        }
        agg.finish()
    }

    #[test]
    fn region_threshold_is_strictly_greater_than_100() {
        assert!(summarize_region(&region_means(100)).is_none());
        assert!(summarize_region(&region_means(101)).is_some());
    }

    #[test]
    fn missing_minority_spread_gap_falls_back_to_zero() {
        let stats = summarize_region(&region_means(150)).unwrap();
        assert_eq!(stats.rate_gap_bw, 0.0);
        assert_eq!(stats.rate_gap_hw, 0.0);
    }

    /// Build one synthetic region: 150 records, uniform rate 5.0, spreads
    /// varying by race (white 1.0, black 1.5, hispanic 1.2).
    fn synthetic_region() -> RegionStats {
        let mut agg = GroupAggregator::default();
        for (race, spread) in [
            ("White", "1.0"),
            ("Black or African American", "1.5"),
            ("Hispanic or Latino", "1.2"),
        ] {
            for _ in 0..50 {
                agg.observe(&record(race, "5.0", spread));
            }
        }
        summarize_region(&agg.finish()).expect("150 records must qualify")
    }

    #[test]
    fn national_rollup_of_three_synthetic_regions() {
        let mut national = NationalAccumulator::default();
        for name in ["Alpha", "Beta", "Gamma"] {
            national.push(name.to_string(), synthetic_region());
        }
        let summary = national.finish("2018-2023");

        assert_eq!(summary.summary.num_states, 3);
        assert_eq!(summary.summary.total_loans, 450);
        assert_eq!(summary.summary.states, ["Alpha", "Beta", "Gamma"]);

        // Every region reports the same gaps, so the roll-up preserves them.
        for stats in summary.by_state.values() {
            assert_eq!(stats.rate_gap_bw, 0.5);
            assert_eq!(stats.rate_gap_hw, 0.2);
        }
        assert_eq!(summary.avg_spreads["black"] - summary.avg_spreads["white"], 0.5);
        let hw = summary.avg_spreads["hispanic"] - summary.avg_spreads["white"];
        assert!((hw - 0.2).abs() < 1e-9);
        assert_eq!(summary.avg_rates["white"], 5.0);
    }

    #[test]
    fn national_figures_are_mean_of_means_not_pooled() {
        // Region A: 101 white loans at spread 1.0; region B: 1000 at 2.0.
        // Pooled mean would be ≈1.908; mean-of-means must be exactly 1.5.
        let mut national = NationalAccumulator::default();
        let mut a = GroupAggregator::default();
        for _ in 0..101 {
            a.observe(&record("White", "6.0", "1.0"));
        }
        let mut b = GroupAggregator::default();
        for _ in 0..1000 {
            b.observe(&record("White", "6.0", "2.0"));
        }
        national.push("A".into(), summarize_region(&a.finish()).unwrap());
        national.push("B".into(), summarize_region(&b.finish()).unwrap());

        let summary = national.finish("2018-2023");
        assert_eq!(summary.avg_spreads["white"], 1.5);
    }

    #[test]
    fn bracket_rows_keep_publication_order_and_drop_empty_rows() {
        let mut agg = GroupAggregator::default();
        // 51 observations in <50K and 51 in 150K+, nothing else.
        for income in ["40", "200"] {
            for _ in 0..51 {
                let mut r = record("White", "6.0", "1.0");
                r.income = income.into();
                agg.observe(&r);
            }
        }
        let stats = summarize_region(&agg.finish()).unwrap();
        let labels: Vec<&str> = stats.income_brackets.iter().map(|row| row.bracket).collect();
        assert_eq!(labels, ["<50K", "150K+"]);
    }
}
