//! crates/swim_admin_core/src/detail.rs
//!
//! The workout detail view: the workout, its set table with exercise names,
//! rest times and progressive distance totals.

use crate::aggregator::{swim_set_exercise, FetchAggregator};
use crate::domain::{EnrichedItem, EntityKind, Relation, Workout, ItemId};
use crate::error::RecoverableError;
use crate::ports::{AdminApiService, PortError, PortResult};
use crate::stats::{cumulative_distance, format_rest_time, total_distance};

#[derive(Debug, Clone)]
pub struct WorkoutDetail {
    pub workout: Workout,
    /// Rows carry `exerciseTitle`, `totalDistance`, `restTime` and `cumulativeDistance`.
    pub sets: Vec<EnrichedItem>,
    pub total_distance: u64,
    pub warnings: Vec<RecoverableError>,
}

pub async fn load_workout_detail(
    aggregator: &FetchAggregator,
    api: &dyn AdminApiService,
    workout_id: ItemId,
) -> PortResult<WorkoutDetail> {
    let workout = api
        .get(EntityKind::Workout, workout_id)
        .await?
        .into_workout()
        .ok_or_else(|| PortError::Unexpected(format!("Item {} is not a workout", workout_id)))?;

    let aggregated = aggregator
        .aggregate(
            api,
            api.list_related(Relation::WORKOUT_SWIM_SETS, workout_id),
            &[swim_set_exercise()],
        )
        .await?;

    let mut sets = aggregated.items;
    let rows: Vec<_> = sets
        .iter()
        .filter_map(|row| row.item.as_swim_set().cloned())
        .collect();
    let running = cumulative_distance(&rows);

    // Non-set members are skipped by the stats; keep them without totals.
    let mut running_iter = running.into_iter();
    for row in &mut sets {
        if let Some(set) = row.item.as_swim_set() {
            let rest = format_rest_time(set.rest_time_seconds);
            row.extras.insert("restTime", rest.into());
            if let Some(total) = running_iter.next() {
                row.extras.insert("cumulativeDistance", total.into());
            }
        }
    }

    Ok(WorkoutDetail {
        workout,
        total_distance: total_distance(&rows),
        sets,
        warnings: aggregated.warnings,
    })
}
