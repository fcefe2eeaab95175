use std::collections::BTreeMap;

use crate::data::model::{
    parse_integer, parse_numeric, IncomeBracket, LoanType, RaceGroup, RawRecord,
};

// ---------------------------------------------------------------------------
// GroupAggregator – one streaming pass over a region's filtered records
// ---------------------------------------------------------------------------

/// Minimum observations for a (loan-type, race) cell to be published
/// (strictly greater-than). A privacy/stability floor, not a significance test.
pub const LOAN_TYPE_CELL_MIN: usize = 50;

/// Minimum observations for an (income-bracket, race) cell (strictly greater-than).
pub const BRACKET_CELL_MIN: usize = 30;

/// Round to the 3 decimal digits used by every published mean.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn mean3(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(round3(values.iter().sum::<f64>() / values.len() as f64))
}

/// Streaming per-region accumulator.
///
/// Each record is bucketed under every group key it belongs to: its race
/// bucket always, plus race×loan-type, race×income-bracket, and race×year
/// when the respective field parses. Numeric fields parse independently:
/// one absent field never discards the record for the others.
///
/// Buffers the raw values per group (exact means at `finish` time); regions
/// are bounded enough that this stays comfortably in memory.
#[derive(Debug, Default)]
pub struct GroupAggregator {
    total: u64,
    rates_by_race: BTreeMap<RaceGroup, Vec<f64>>,
    spreads_by_race: BTreeMap<RaceGroup, Vec<f64>>,
    income_by_race: BTreeMap<RaceGroup, Vec<f64>>,
    loan_amount_by_race: BTreeMap<RaceGroup, Vec<f64>>,
    spreads_by_race_loan_type: BTreeMap<(RaceGroup, LoanType), Vec<f64>>,
    spreads_by_race_bracket: BTreeMap<(RaceGroup, IncomeBracket), Vec<f64>>,
    rates_by_race_year: BTreeMap<(RaceGroup, i64), Vec<f64>>,
}

impl GroupAggregator {
    /// Fold one filtered record into the running buckets.
    ///
    /// A record only counts toward the region total when its race maps to
    /// one of the four groups and its interest rate parses.
    pub fn observe(&mut self, record: &RawRecord) {
        let Some(race) = RaceGroup::from_derived_race(&record.derived_race) else {
            return;
        };
        let Some(rate) = parse_numeric(&record.interest_rate) else {
            return;
        };

        self.total += 1;
        self.rates_by_race.entry(race).or_default().push(rate);

        if let Some(spread) = parse_numeric(&record.rate_spread) {
            self.spreads_by_race.entry(race).or_default().push(spread);
            if let Some(loan_type) = LoanType::from_code(&record.loan_type) {
                self.spreads_by_race_loan_type
                    .entry((race, loan_type))
                    .or_default()
                    .push(spread);
            }
            if let Some(income) = parse_integer(&record.income) {
                let bracket = IncomeBracket::from_thousands(income);
                self.spreads_by_race_bracket
                    .entry((race, bracket))
                    .or_default()
                    .push(spread);
            }
        }

        if let Some(income) = parse_integer(&record.income) {
            self.income_by_race.entry(race).or_default().push(income as f64);
        }
        if let Some(amount) = parse_numeric(&record.loan_amount) {
            self.loan_amount_by_race.entry(race).or_default().push(amount);
        }
        if let Some(year) = parse_integer(&record.activity_year) {
            self.rates_by_race_year
                .entry((race, year))
                .or_default()
                .push(rate);
        }
    }

    /// Compute rounded means per group and apply cell suppression.
    ///
    /// Groups with zero observations are omitted, never zero-filled.
    pub fn finish(self) -> GroupMeans {
        let means_of = |buckets: BTreeMap<RaceGroup, Vec<f64>>| -> BTreeMap<RaceGroup, f64> {
            buckets
                .into_iter()
                .filter_map(|(race, values)| mean3(&values).map(|m| (race, m)))
                .collect()
        };

        let counts = self
            .rates_by_race
            .iter()
            .map(|(race, values)| (*race, values.len() as u64))
            .collect();

        let loan_type_spreads = self
            .spreads_by_race_loan_type
            .into_iter()
            .filter(|(_, values)| values.len() > LOAN_TYPE_CELL_MIN)
            .filter_map(|(key, values)| mean3(&values).map(|m| (key, m)))
            .collect();

        let bracket_spreads = self
            .spreads_by_race_bracket
            .into_iter()
            .filter(|(_, values)| values.len() > BRACKET_CELL_MIN)
            .filter_map(|(key, values)| mean3(&values).map(|m| (key, m)))
            .collect();

        let yearly_rates = self
            .rates_by_race_year
            .into_iter()
            .filter_map(|(key, values)| mean3(&values).map(|m| (key, m)))
            .collect();

        GroupMeans {
            total: self.total,
            avg_rates: means_of(self.rates_by_race),
            avg_spreads: means_of(self.spreads_by_race),
            avg_income: means_of(self.income_by_race),
            avg_loan_amount: means_of(self.loan_amount_by_race),
            counts,
            loan_type_spreads,
            bracket_spreads,
            yearly_rates,
        }
    }
}

/// Per-group rounded means from one region pass.
///
/// Cells below the suppression thresholds are already removed; a key that is
/// absent simply had no (surviving) observations.
#[derive(Debug, Clone)]
pub struct GroupMeans {
    /// Qualifying record count (race mapped + rate parsed).
    pub total: u64,
    pub avg_rates: BTreeMap<RaceGroup, f64>,
    pub avg_spreads: BTreeMap<RaceGroup, f64>,
    pub avg_income: BTreeMap<RaceGroup, f64>,
    pub avg_loan_amount: BTreeMap<RaceGroup, f64>,
    /// Rate observations per race.
    pub counts: BTreeMap<RaceGroup, u64>,
    pub loan_type_spreads: BTreeMap<(RaceGroup, LoanType), f64>,
    pub bracket_spreads: BTreeMap<(RaceGroup, IncomeBracket), f64>,
    pub yearly_rates: BTreeMap<(RaceGroup, i64), f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(race: &str, rate: &str) -> RawRecord {
        RawRecord {
            derived_race: race.into(),
            interest_rate: rate.into(),
            ..RawRecord::default()
        }
    }

    #[test]
    fn means_match_true_arithmetic_mean() {
        let mut agg = GroupAggregator::default();
        for rate in ["6.0", "6.5", "7.1"] {
            agg.observe(&record("White", rate));
        }
        let means = agg.finish();
        assert_eq!(means.total, 3);
        let expected = (6.0 + 6.5 + 7.1) / 3.0;
        let got = means.avg_rates[&RaceGroup::White];
        assert!((got - expected).abs() <= 0.0005, "{got} vs {expected}");
    }

    #[test]
    fn unmapped_race_and_bad_rate_do_not_count() {
        let mut agg = GroupAggregator::default();
        agg.observe(&record("Joint", "6.0"));
        agg.observe(&record("White", "Exempt"));
        agg.observe(&record("White", "6.0"));
        let means = agg.finish();
        assert_eq!(means.total, 1);
    }

    #[test]
    fn field_parses_are_independent() {
        let mut agg = GroupAggregator::default();
        let mut r = record("Black or African American", "7.0");
        r.rate_spread = "NA".into(); // spread absent
        r.income = "85".into();
        r.loan_amount = "255000".into();
        r.activity_year = "2022".into();
        agg.observe(&r);

        let means = agg.finish();
        assert_eq!(means.total, 1);
        // No spread bucket, but income / loan amount / yearly rate all present.
        assert!(means.avg_spreads.is_empty());
        assert_eq!(means.avg_income[&RaceGroup::Black], 85.0);
        assert_eq!(means.avg_loan_amount[&RaceGroup::Black], 255000.0);
        assert_eq!(means.yearly_rates[&(RaceGroup::Black, 2022)], 7.0);
    }

    #[test]
    fn spread_feeds_loan_type_and_bracket_keys() {
        let mut agg = GroupAggregator::default();
        let mut r = record("White", "6.0");
        r.rate_spread = "1.25".into();
        r.loan_type = "2".into();
        r.income = "120".into();
        agg.observe(&r);
        // Single observation: below both cell thresholds, so cells suppressed
        // but the race-level spread mean survives.
        let means = agg.finish();
        assert_eq!(means.avg_spreads[&RaceGroup::White], 1.25);
        assert!(means.loan_type_spreads.is_empty());
        assert!(means.bracket_spreads.is_empty());
    }

    fn spread_record(race: &str, loan_type: &str, income: &str) -> RawRecord {
        RawRecord {
            derived_race: race.into(),
            interest_rate: "6.0".into(),
            rate_spread: "1.0".into(),
            loan_type: loan_type.into(),
            income: income.into(),
            ..RawRecord::default()
        }
    }

    #[test]
    fn loan_type_cell_requires_more_than_50() {
        for (n, expect_present) in [(50, false), (51, true)] {
            let mut agg = GroupAggregator::default();
            for _ in 0..n {
                agg.observe(&spread_record("White", "1", ""));
            }
            let means = agg.finish();
            assert_eq!(
                means
                    .loan_type_spreads
                    .contains_key(&(RaceGroup::White, LoanType::Conventional)),
                expect_present,
                "n = {n}"
            );
        }
    }

    #[test]
    fn bracket_cell_requires_more_than_30() {
        for (n, expect_present) in [(30, false), (31, true)] {
            let mut agg = GroupAggregator::default();
            for _ in 0..n {
                agg.observe(&spread_record("White", "", "40"));
            }
            let means = agg.finish();
            assert_eq!(
                means
                    .bracket_spreads
                    .contains_key(&(RaceGroup::White, IncomeBracket::Under50)),
                expect_present,
                "n = {n}"
            );
        }
    }

    #[test]
    fn empty_groups_are_omitted_not_zero_filled() {
        let mut agg = GroupAggregator::default();
        agg.observe(&record("White", "6.0"));
        let means = agg.finish();
        assert!(!means.avg_rates.contains_key(&RaceGroup::Black));
        assert!(means.avg_spreads.is_empty());
        assert!(means.avg_income.is_empty());
    }
}
