// src/services/comparison.rs
use crate::models::{ComparisonRow, IndexDefinition, UserReturns};
use crate::services::calculations::compounded_total;
use log::debug;

/// Compares the user's entered years against each index, restricted to the
/// years both sides have. Indices sharing no year with the user produce no row.
///
/// Unlike the chart curve, only years the user actually reported count here.
pub fn compare(user_returns: &UserReturns, indices: &[IndexDefinition]) -> Vec<ComparisonRow> {
    let years_entered: Vec<i32> = user_returns.keys().rev().copied().collect();
    if years_entered.is_empty() {
        return Vec::new();
    }

    indices
        .iter()
        .filter_map(|index| {
            let overlap: Vec<(f64, f64)> = years_entered
                .iter()
                .filter_map(|year| Some((*user_returns.get(year)?, *index.returns.get(year)?)))
                .collect();

            if overlap.is_empty() {
                debug!("No overlapping years with {}, skipping", index.name);
                return None;
            }

            Some(ComparisonRow::new(
                index.name.clone(),
                compounded_total(overlap.iter().map(|(user, _)| *user)),
                compounded_total(overlap.iter().map(|(_, idx)| *idx)),
            ))
        })
        .collect()
}
