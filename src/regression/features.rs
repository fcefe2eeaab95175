use std::collections::BTreeSet;

use nalgebra::{DMatrix, DVector};

use crate::data::model::{parse_numeric, RawRecord};

use super::RegressionError;

// ---------------------------------------------------------------------------
// Feature construction: sampled raw records → numeric design matrix
// ---------------------------------------------------------------------------

/// Race categories retained for regression. White is the implicit baseline;
/// records outside this set are dropped entirely (not bucketed as "other").
const REGRESSION_RACES: [&str; 5] = [
    "White",
    "Black or African American",
    "Asian",
    "Native Hawaiian or Other Pacific Islander",
    "American Indian or Alaska Native",
];

/// The omitted reference category for race indicators.
const BASELINE_RACE: &str = "White";

/// Ethnicity value that sets the hispanic indicator.
const HISPANIC_ETHNICITY: &str = "Hispanic or Latino";

/// Spread floor guarding against corrupted negative-outlier encodings.
const MIN_RATE_SPREAD: f64 = -10.0;

/// Exact midpoint lookup for the semi-categorical debt-to-income field.
///
/// The source publishes DTI either as a named range ("<20%", "50%-60%") or
/// as a single-point percentage string ("36" through "49"). Values matching
/// no table entry fall back to a direct numeric parse; otherwise missing.
pub fn dti_midpoint(raw: &str) -> Option<f64> {
    let mapped = match raw.trim() {
        "<20%" => Some(15.0),
        "20%-<30%" => Some(25.0),
        "30%-<36%" => Some(33.0),
        "50%-60%" => Some(55.0),
        ">60%" => Some(65.0),
        point @ ("36" | "37" | "38" | "39" | "40" | "41" | "42" | "43" | "44" | "45" | "46"
        | "47" | "48" | "49") => point.parse().ok(),
        _ => None,
    };
    mapped.or_else(|| parse_numeric(raw))
}

/// The row-aligned design matrix, its target vector, and the demographic
/// indicator column names for downstream coefficient extraction.
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// Column names, aligned with the columns of `x`.
    pub names: Vec<String>,
    /// Design matrix with a leading constant-1 intercept column.
    pub x: DMatrix<f64>,
    /// Target vector (rate spread), aligned with the rows of `x`.
    pub y: DVector<f64>,
    /// Race indicator columns plus the hispanic flag.
    pub demographic_columns: Vec<String>,
}

/// One record that passed row admission, with its continuous fields coerced.
/// `ltv` and `dti` stay optional here; a missing value drops the row later
/// (complete-case only, no imputation).
struct AdmittedRow<'a> {
    record: &'a RawRecord,
    spread: f64,
    income: f64,
    loan_amount: f64,
    ltv: Option<f64>,
    dti: Option<f64>,
}

/// Row admission: required continuous fields present, spread above the
/// corruption floor, positive income, race in the retained set.
fn admit(record: &RawRecord) -> Option<AdmittedRow<'_>> {
    let spread = parse_numeric(&record.rate_spread)?;
    let income = parse_numeric(&record.income)?;
    let loan_amount = parse_numeric(&record.loan_amount)?;
    if spread <= MIN_RATE_SPREAD || income <= 0.0 {
        return None;
    }
    if !REGRESSION_RACES.contains(&record.derived_race.as_str()) {
        return None;
    }
    Some(AdmittedRow {
        record,
        spread,
        income,
        loan_amount,
        ltv: parse_numeric(&record.loan_to_value_ratio),
        dti: dti_midpoint(&record.debt_to_income_ratio),
    })
}

/// Observed categories of one raw field across the admitted rows, minus the
/// lexicographically first (the implicit baseline).
fn observed_non_baseline<'a>(
    rows: &[AdmittedRow<'a>],
    field: impl Fn(&RawRecord) -> &str,
) -> Vec<&'a str> {
    let observed: BTreeSet<&str> = rows.iter().map(|row| field(row.record)).collect();
    observed.into_iter().skip(1).collect()
}

fn indicator(on: bool) -> f64 {
    if on {
        1.0
    } else {
        0.0
    }
}

/// Build the design matrix from a sampled collection of raw records.
///
/// The category-to-column mapping is built once from the full set of
/// categories observed in the admitted rows, then applied deterministically
/// row by row, so the column set never depends on row order. Rows with any
/// missing value (loan-to-value or DTI) are dropped after the mapping is
/// fixed; a category that disappears in that drop therefore keeps its
/// column and surfaces downstream as a degenerate coefficient.
pub fn build_design_matrix(records: &[RawRecord]) -> Result<DesignMatrix, RegressionError> {
    let admitted: Vec<AdmittedRow> = records.iter().filter_map(admit).collect();
    if admitted.is_empty() {
        return Err(RegressionError::EmptySample);
    }

    // Non-baseline race categories observed in the admitted rows, sorted.
    let races: Vec<&str> = admitted
        .iter()
        .map(|row| row.record.derived_race.as_str())
        .filter(|race| *race != BASELINE_RACE)
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect();

    let loan_types = observed_non_baseline(&admitted, |r| r.loan_type.as_str());
    let occupancies = observed_non_baseline(&admitted, |r| r.occupancy_type.as_str());
    let years = observed_non_baseline(&admitted, |r| r.activity_year.as_str());
    let states = observed_non_baseline(&admitted, |r| r.state_code.as_str());

    let race_columns: Vec<String> = races.iter().map(|race| format!("race_{race}")).collect();
    let mut names: Vec<String> = vec![
        "const".into(),
        "income".into(),
        "loan_amount".into(),
        "loan_to_value_ratio".into(),
        "dti_numeric".into(),
    ];
    names.extend(race_columns.iter().cloned());
    names.push("hispanic".into());
    names.extend(loan_types.iter().map(|code| format!("loantype_{code}")));
    names.extend(occupancies.iter().map(|code| format!("occtype_{code}")));
    names.extend(years.iter().map(|year| format!("year_{year}")));
    names.extend(states.iter().map(|code| format!("state_{code}")));

    let mut demographic_columns = race_columns;
    demographic_columns.push("hispanic".into());

    let width = names.len();
    let mut cells: Vec<f64> = Vec::new();
    let mut targets: Vec<f64> = Vec::new();
    for row in &admitted {
        // Complete-case: every column must be present.
        let (Some(ltv), Some(dti)) = (row.ltv, row.dti) else {
            continue;
        };
        cells.push(1.0);
        cells.extend([row.income, row.loan_amount, ltv, dti]);
        for race in &races {
            cells.push(indicator(row.record.derived_race == *race));
        }
        cells.push(indicator(row.record.derived_ethnicity == HISPANIC_ETHNICITY));
        for code in &loan_types {
            cells.push(indicator(row.record.loan_type == *code));
        }
        for code in &occupancies {
            cells.push(indicator(row.record.occupancy_type == *code));
        }
        for year in &years {
            cells.push(indicator(row.record.activity_year == *year));
        }
        for code in &states {
            cells.push(indicator(row.record.state_code == *code));
        }
        targets.push(row.spread);
    }
    if targets.is_empty() {
        return Err(RegressionError::EmptySample);
    }

    let x = DMatrix::from_row_slice(targets.len(), width, &cells);
    let y = DVector::from_vec(targets);
    Ok(DesignMatrix {
        names,
        x,
        y,
        demographic_columns,
    })
}
