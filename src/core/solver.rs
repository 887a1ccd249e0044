use super::types::FeeDragError;

pub const DOUBLING_MULTIPLE: f64 = 2.0;

/// Years until fee drag compounds to `multiple` times the capital, relative to
/// fee-free growth at `return_pct`.
///
/// Closed form, with logarithms taken in base `1 + r`:
/// `N = log(k) / (1 - log(1 + r - c))`.
/// The result shrinks as the fee grows. It equals `ln(k) / ln(1 + r)` when
/// the fee matches the return.
pub fn years_to_multiply(
    multiple: f64,
    return_pct: f64,
    fee_pct: f64,
) -> Result<f64, FeeDragError> {
    if !multiple.is_finite() || multiple <= 1.0 {
        return Err(undefined("target multiple must be > 1"));
    }
    if !return_pct.is_finite() || !fee_pct.is_finite() {
        return Err(undefined("rates must be finite"));
    }

    let r = return_pct / 100.0;
    let c = fee_pct / 100.0;
    if r <= -1.0 {
        return Err(undefined("annual return must be > -100%"));
    }

    let log_base = (1.0 + r).ln();
    if log_base.abs() <= f64::EPSILON {
        return Err(undefined("a zero annual return has no growth base"));
    }

    let net_factor = 1.0 + r - c;
    if net_factor <= 0.0 {
        return Err(undefined("fees consume the whole return plus principal"));
    }

    let log_k = multiple.ln() / log_base;
    let log_term = net_factor.ln() / log_base;
    let denominator = 1.0 - log_term;
    if denominator.abs() <= 1e-12 {
        return Err(undefined("without a fee there is no drag to compound"));
    }

    let years = log_k / denominator;
    if !years.is_finite() {
        return Err(undefined("result is not finite"));
    }
    Ok(years)
}

pub fn years_to_double(return_pct: f64, fee_pct: f64) -> Result<f64, FeeDragError> {
    years_to_multiply(DOUBLING_MULTIPLE, return_pct, fee_pct)
}

pub fn format_years(years: f64) -> String {
    format!("{years:.1}")
}

fn undefined(msg: &str) -> FeeDragError {
    FeeDragError::BreakEvenUndefined(msg.to_string())
}
