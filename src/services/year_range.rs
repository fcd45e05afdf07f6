// src/services/year_range.rs
use crate::models::{EffectiveRange, FLOOR_YEAR};

/// Start year actually used for display and computation.
///
/// Never earlier than the request (older data is excluded), but moved forward
/// to the first year with data when that comes later. Clamped to `floor`.
pub fn resolve_effective_start(requested_start: i32, earliest_data_year: Option<i32>, floor: i32) -> i32 {
    let start = match earliest_data_year {
        Some(earliest) => requested_start.max(earliest),
        None => requested_start,
    };
    start.max(floor)
}

/// Inclusive ascending years; empty when `start > end`.
pub fn year_sequence(start: i32, end: i32) -> Vec<i32> {
    (start..=end).collect()
}

/// Range from a requested start up to the current year, without data adjustment.
pub fn effective_range(requested_start: i32, current_year: i32) -> EffectiveRange {
    EffectiveRange {
        start_year: resolve_effective_start(requested_start, None, FLOOR_YEAR),
        end_year: current_year,
    }
}

pub fn in_bounds(year: i32, current_year: i32) -> bool {
    (FLOOR_YEAR..=current_year).contains(&year)
}
