// src/models.rs
use serde::{Serialize, Deserialize};
use std::collections::BTreeMap;

/// First year any return can be recorded for.
pub const FLOOR_YEAR: i32 = 2000;

/// Year -> annual return percentage (12.34 means +12.34%).
pub type UserReturns = BTreeMap<i32, f64>;

/// "YYYY-MM" -> monthly return percentage, `None` when the source left it blank.
pub type MonthlyReturns = BTreeMap<String, Option<f64>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexDefinition {
    pub name: String,
    pub color: String,
    pub returns: BTreeMap<i32, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct EffectiveRange {
    pub start_year: i32,
    pub end_year: i32,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct CurvePoint {
    pub year: i32,
    /// Cumulative gain over the base, `None` for a year without data.
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurveSeries {
    pub label: String,
    pub color: String,
    pub points: Vec<CurvePoint>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Outperformance,
    Underperformance,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ComparisonRow {
    pub name: String,
    pub user_total_pct: f64,
    pub index_total_pct: f64,
    pub diff_pct: f64,
    pub verdict: Verdict,
}

impl ComparisonRow {
    pub fn new(name: impl Into<String>, user_total_pct: f64, index_total_pct: f64) -> Self {
        let diff_pct = user_total_pct - index_total_pct;
        let verdict = if diff_pct >= 0.0 {
            Verdict::Outperformance
        } else {
            Verdict::Underperformance
        };
        ComparisonRow {
            name: name.into(),
            user_total_pct,
            index_total_pct,
            diff_pct,
            verdict,
        }
    }

    /// e.g. "+2.5% (OUTPERFORMANCE)"
    pub fn badge(&self) -> String {
        let sign = if self.diff_pct > 0.0 { "+" } else { "" };
        let status = match self.verdict {
            Verdict::Outperformance => "OUTPERFORMANCE",
            Verdict::Underperformance => "UNDERPERFORMANCE",
        };
        format!("{}{:.1}% ({})", sign, self.diff_pct, status)
    }

    pub fn summary(&self) -> String {
        format!("You: {:.1}% | Index: {:.1}%", self.user_total_pct, self.index_total_pct)
    }
}

/// Everything the presentation layer needs to redraw after an event.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViewState {
    pub range: EffectiveRange,
    pub years: Vec<i32>,
    pub inputs: UserReturns,
    pub user_curve: Option<CurveSeries>,
    pub index_curves: Vec<CurveSeries>,
    pub comparison: Vec<ComparisonRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_diff_counts_as_outperformance() {
        let row = ComparisonRow::new("SPX500", 10.0, 10.0);
        assert_eq!(row.diff_pct, 0.0);
        assert_eq!(row.verdict, Verdict::Outperformance);
        assert_eq!(row.badge(), "0.0% (OUTPERFORMANCE)");
    }

    #[test]
    fn badge_and_summary_formatting() {
        let row = ComparisonRow::new("SPX500", -1.0, 10.26);
        assert_eq!(row.verdict, Verdict::Underperformance);
        assert_eq!(row.badge(), "-11.3% (UNDERPERFORMANCE)");
        assert_eq!(row.summary(), "You: -1.0% | Index: 10.3%");

        let win = ComparisonRow::new("NSDQ100", 20.0, 17.5);
        assert_eq!(win.badge(), "+2.5% (OUTPERFORMANCE)");
    }
}
