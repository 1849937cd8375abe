//! Shared fixtures for the core integration tests.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use swim_admin_core::domain::{Exercise, Item, ItemId, Page, Plan, SwimSet, Workout};
use swim_admin_core::memory::InMemoryApi;

pub fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 8, 0, 0).unwrap()
}

pub fn exercise(id: ItemId, title: &str, category: Option<&str>) -> Item {
    Item::Exercise(Exercise {
        id,
        title: title.to_string(),
        description: None,
        level: Some("beginner".to_string()),
        category: category.map(str::to_string),
        upload_id: None,
        created_at: at(1),
    })
}

pub fn workout(id: ItemId, title: &str, category: Option<&str>) -> Item {
    Item::Workout(Workout {
        id,
        title: title.to_string(),
        description: None,
        category: category.map(str::to_string),
        created_at: at(2),
    })
}

pub fn plan(id: ItemId, title: &str) -> Item {
    Item::Plan(Plan {
        id,
        title: title.to_string(),
        description: Some(format!("{title} plan")),
        category: None,
        created_at: at(3),
    })
}

pub fn page(id: ItemId, title: &str, content: &str) -> Item {
    Item::Page(Page {
        id,
        title: title.to_string(),
        content: Some(content.to_string()),
        upload_id: None,
        created_at: at(4),
    })
}

pub fn swim_set(
    id: ItemId,
    exercise_id: Option<ItemId>,
    distance: u32,
    repetition: Option<u32>,
    rest: Option<u32>,
) -> Item {
    Item::SwimSet(SwimSet {
        id,
        title: format!("Set {id}"),
        workout_id: None,
        exercise_id,
        distance: Some(distance),
        repetition,
        rest_time_seconds: rest,
        created_at: at(5),
    })
}

/// Two exercises and three swim-sets pointing at them.
pub fn seeded_sets() -> InMemoryApi {
    let api = InMemoryApi::new();
    api.insert(exercise(1, "Freestyle", Some("Technique")));
    api.insert(exercise(2, "Kick", Some("Legs")));
    api.insert(swim_set(10, Some(1), 100, Some(4), Some(30)));
    api.insert(swim_set(11, Some(2), 50, Some(2), Some(90)));
    api.insert(swim_set(12, None, 200, None, None));
    api
}
