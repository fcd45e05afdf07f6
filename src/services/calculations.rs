// src/services/calculations.rs
use crate::models::CurvePoint;
use std::collections::BTreeMap;

/// Starting value of every cumulative curve.
pub const CURVE_BASE: f64 = 100.0;

/// Turns a percentage into its growth factor: 5.0 -> 1.05.
pub fn growth_factor(pct: f64) -> f64 {
    1.0 + pct / 100.0
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Compounds monthly percentage returns into one annual percentage yield,
/// rounded to 4 decimals. Callers only invoke this for years with at least one month.
pub fn annual_yield(monthly_returns: &[f64]) -> f64 {
    let compounded = monthly_returns
        .iter()
        .fold(1.0, |acc, r| acc * growth_factor(*r));
    round_to((compounded - 1.0) * 100.0, 4)
}

/// Total percentage gain of a chain of annual returns.
pub fn compounded_total(returns: impl IntoIterator<Item = f64>) -> f64 {
    let product = returns
        .into_iter()
        .fold(1.0, |acc, r| acc * growth_factor(r));
    (product - 1.0) * 100.0
}

/// Walks `years` in ascending order and emits the running gain over `base`.
/// Years without a (finite) return become gaps and leave the running value untouched.
pub fn cumulative_curve(
    years: &[i32],
    annual_returns: &BTreeMap<i32, f64>,
    base: f64,
) -> Vec<CurvePoint> {
    let mut ordered = years.to_vec();
    ordered.sort_unstable();

    let mut cumulative = base;
    ordered
        .into_iter()
        .map(|year| match annual_returns.get(&year) {
            Some(r) if r.is_finite() => {
                cumulative *= growth_factor(*r);
                CurvePoint { year, value: Some(cumulative - base) }
            }
            _ => CurvePoint { year, value: None },
        })
        .collect()
}
