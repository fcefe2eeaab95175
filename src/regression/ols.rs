use std::collections::BTreeMap;

use nalgebra::{Cholesky, DMatrix, DVector};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::features::DesignMatrix;

// ---------------------------------------------------------------------------
// Ordinary least squares with t-based inference
// ---------------------------------------------------------------------------

/// Two-sided threshold for the published significance flag.
const SIGNIFICANCE_LEVEL: f64 = 0.001;

/// Relative pivot floor for declaring XᵀX rank deficient. Each Cholesky
/// pivot is compared against its own column's diagonal scale, so columns of
/// very different magnitudes (loan amounts next to 0/1 indicators) do not
/// mask each other.
const RANK_TOLERANCE: f64 = 1e-10;

/// Control variables reported alongside the coefficients.
pub const CONTROLS: [&str; 8] = [
    "income",
    "loan_amount",
    "loan_to_value_ratio",
    "debt_to_income_ratio",
    "loan_type",
    "occupancy_type",
    "activity_year",
    "state",
];

/// A raw OLS fit. `coefficients` and `std_errors` are aligned with the
/// design matrix columns; a degenerate fit carries NaN throughout.
#[derive(Debug, Clone)]
pub struct OlsFit {
    pub n: usize,
    pub k: usize,
    pub coefficients: DVector<f64>,
    pub std_errors: DVector<f64>,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Residual degrees of freedom (n − k); 0.0 when degenerate.
    pub df_resid: f64,
}

impl OlsFit {
    fn degenerate(n: usize, k: usize) -> Self {
        OlsFit {
            n,
            k,
            coefficients: DVector::from_element(k, f64::NAN),
            std_errors: DVector::from_element(k, f64::NAN),
            r_squared: f64::NAN,
            adj_r_squared: f64::NAN,
            df_resid: 0.0,
        }
    }
}

/// Fit ordinary least squares of `y` on `x` (no regularization, no weights).
///
/// Normal equations solved through a Cholesky factorization of XᵀX;
/// (XᵀX)⁻¹ diagonals for the standard errors come from Cholesky solves on
/// unit vectors rather than an explicit inverse. Ill-conditioned problems
/// (singular XᵀX such as a zero-variance column after row dropping, n ≤ k,
/// a non-finite solve) yield a fit full of NaN instead of a panic; callers
/// treat NaN coefficients as "no result for this covariate".
pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> OlsFit {
    let n = x.nrows();
    let k = x.ncols();
    if n <= k || k == 0 {
        return OlsFit::degenerate(n, k);
    }

    let xtx = x.transpose() * x;
    let xty = x.transpose() * y;
    let column_scales = xtx.diagonal();
    let Some(chol) = Cholesky::new(xtx) else {
        return OlsFit::degenerate(n, k);
    };
    // An exactly singular XᵀX (duplicated or zero-variance column) can still
    // factor numerically, producing arbitrary coefficients with zero standard
    // errors. A pivot that is tiny relative to its column's scale exposes the
    // rank deficiency; `!(.. > ..)` also traps NaN pivots.
    let factor = chol.l_dirty();
    for j in 0..k {
        let pivot = factor[(j, j)];
        if !(pivot * pivot > RANK_TOLERANCE * column_scales[j]) {
            return OlsFit::degenerate(n, k);
        }
    }
    let coefficients = chol.solve(&xty);
    if coefficients.iter().any(|v| !v.is_finite()) {
        return OlsFit::degenerate(n, k);
    }

    let residuals = y - x * &coefficients;
    let rss = residuals.norm_squared();
    let mean_y = y.mean();
    let tss: f64 = y.iter().map(|v| (v - mean_y).powi(2)).sum();
    let df_resid = (n - k) as f64;
    let sigma2 = rss / df_resid;

    let mut std_errors = DVector::zeros(k);
    for j in 0..k {
        let mut unit = DVector::zeros(k);
        unit[j] = 1.0;
        let solved = chol.solve(&unit);
        std_errors[j] = (sigma2 * solved[j]).sqrt();
    }

    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
    let adj_r_squared = 1.0 - (1.0 - r_squared) * (n as f64 - 1.0) / df_resid;

    OlsFit {
        n,
        k,
        coefficients,
        std_errors,
        r_squared,
        adj_r_squared,
        df_resid,
    }
}

// ---------------------------------------------------------------------------
// Published report
// ---------------------------------------------------------------------------

/// Inference for one demographic indicator column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoefficientStats {
    pub coef: f64,
    pub std_err: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub significant: bool,
}

/// The persisted regression artifact.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionReport {
    pub n: usize,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    /// Keyed by design matrix column name.
    pub coefficients: BTreeMap<String, CoefficientStats>,
    /// The same map keyed by human-readable names.
    pub named_coefficients: BTreeMap<String, CoefficientStats>,
    pub controls: Vec<&'static str>,
}

/// Human-readable labels for the demographic indicator columns.
fn display_name(column: &str) -> &str {
    match column {
        "race_Black or African American" => "Black",
        "race_Asian" => "Asian",
        "race_Native Hawaiian or Other Pacific Islander" => "Native Hawaiian / Pacific Islander",
        "race_American Indian or Alaska Native" => "American Indian / Alaska Native",
        "hispanic" => "Hispanic",
        other => other,
    }
}

fn round_to(v: f64, digits: i32) -> f64 {
    if !v.is_finite() {
        return v;
    }
    let factor = 10f64.powi(digits);
    (v * factor).round() / factor
}

/// Extract the published report from a fit.
///
/// Demographic columns whose coefficient or standard error is NaN (a
/// degenerate covariate) are omitted rather than reported: "no result",
/// not a failure.
pub fn summarize(design: &DesignMatrix, fit: &OlsFit) -> RegressionReport {
    let t_dist = StudentsT::new(0.0, 1.0, fit.df_resid).ok();

    let mut coefficients = BTreeMap::new();
    for column in &design.demographic_columns {
        let Some(j) = design.names.iter().position(|name| name == column) else {
            continue;
        };
        let coef = fit.coefficients[j];
        let std_err = fit.std_errors[j];
        if !coef.is_finite() || !std_err.is_finite() {
            continue;
        }
        let Some(t_dist) = t_dist.as_ref() else {
            continue;
        };
        let t_stat = coef / std_err;
        let p_value = 2.0 * (1.0 - t_dist.cdf(t_stat.abs()));
        let t_crit = t_dist.inverse_cdf(0.975);
        coefficients.insert(
            column.clone(),
            CoefficientStats {
                coef: round_to(coef, 4),
                std_err: round_to(std_err, 4),
                p_value: round_to(p_value, 6),
                ci_lower: round_to(coef - t_crit * std_err, 4),
                ci_upper: round_to(coef + t_crit * std_err, 4),
                significant: p_value < SIGNIFICANCE_LEVEL,
            },
        );
    }

    let named_coefficients = coefficients
        .iter()
        .map(|(column, stats)| (display_name(column).to_string(), stats.clone()))
        .collect();

    RegressionReport {
        n: fit.n,
        r_squared: round_to(fit.r_squared, 4),
        adj_r_squared: round_to(fit.adj_r_squared, 4),
        coefficients,
        named_coefficients,
        controls: CONTROLS.to_vec(),
    }
}
