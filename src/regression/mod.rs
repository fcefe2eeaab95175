/// Regression pipeline: design matrix construction and OLS fitting.
pub mod features;
pub mod ols;

/// Errors surfaced while constructing the regression inputs.
///
/// A degenerate *fit* (collinearity, zero-variance column) is deliberately
/// not an error: it comes back as NaN coefficients, see [`ols::fit`].
#[derive(Debug, thiserror::Error)]
pub enum RegressionError {
    /// Nothing survived admission and complete-case filtering.
    #[error("no usable rows after admission and complete-case filtering")]
    EmptySample,
}
