//! crates/swim_admin_core/src/stats.rs
//!
//! Derived statistics shown in workout set tables.

use crate::domain::SwimSet;

/// Metres covered by one set; repetition defaults to 1 when missing or zero.
pub fn set_distance(set: &SwimSet) -> u64 {
    let distance = u64::from(set.distance.unwrap_or(0));
    let repetition = match set.repetition {
        Some(0) | None => 1,
        Some(n) => u64::from(n),
    };
    distance * repetition
}

pub fn total_distance<'a>(sets: impl IntoIterator<Item = &'a SwimSet>) -> u64 {
    sets.into_iter().map(set_distance).sum()
}

/// Running totals aligned index-for-index with `sets`.
pub fn cumulative_distance<'a>(sets: impl IntoIterator<Item = &'a SwimSet>) -> Vec<u64> {
    sets.into_iter()
        .scan(0u64, |running, set| {
            *running += set_distance(set);
            Some(*running)
        })
        .collect()
}

/// Formats seconds as `MM:SS`. Minutes are not folded into hours.
pub fn format_rest_time(seconds: Option<u32>) -> String {
    let seconds = seconds.unwrap_or(0);
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
