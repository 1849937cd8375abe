//! Integration tests for the fetch aggregator.

mod common;

use common::{at, exercise, page, seeded_sets, swim_set};
use std::num::NonZeroUsize;
use std::time::Duration;
use swim_admin_core::aggregator::{
    default_rules, swim_set_exercise, EnrichmentRule, FetchAggregator,
};
use swim_admin_core::domain::{EntityKind, FieldValue, Item, Page, Record, Upload};
use swim_admin_core::error::RecoverableError;
use swim_admin_core::memory::InMemoryApi;
use swim_admin_core::ports::{AdminApiService, PortError};
use tokio_util::sync::CancellationToken;

fn text(value: Option<&FieldValue>) -> Option<&str> {
    value.and_then(FieldValue::as_text)
}

// ---------------------------------------------------------------------------
// Test: swim-sets get the exercise title and total distance
// ---------------------------------------------------------------------------

#[tokio::test]
async fn swim_sets_are_joined_with_their_exercise() {
    let api = seeded_sets();
    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await
        .unwrap();

    assert!(result.warnings.is_empty());
    let ids: Vec<_> = result.items.iter().map(Record::id).collect();
    assert_eq!(ids, vec![10, 11, 12]);

    assert_eq!(text(result.items[0].extra("exerciseTitle")), Some("Freestyle"));
    assert_eq!(text(result.items[1].extra("exerciseTitle")), Some("Kick"));
    assert_eq!(text(result.items[2].extra("exerciseTitle")), Some("No exercise"));

    assert_eq!(result.items[0].extra("totalDistance"), Some(&FieldValue::Number(400)));
    assert_eq!(result.items[2].extra("totalDistance"), Some(&FieldValue::Number(200)));
}

// ---------------------------------------------------------------------------
// Test: pages get the filename of their upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pages_are_joined_with_their_upload() {
    let api = InMemoryApi::new();
    api.insert(Item::Upload(Upload {
        id: 7,
        filename: "kick.mp4".to_string(),
        file_type: Some("video".to_string()),
        path: "/media/kick.mp4".to_string(),
        created_at: at(1),
    }));
    api.insert(Item::Page(Page {
        id: 40,
        title: "About".to_string(),
        content: None,
        upload_id: Some(7),
        created_at: at(4),
    }));
    api.insert(Item::Page(Page {
        id: 41,
        title: "Gallery".to_string(),
        content: None,
        upload_id: Some(8),
        created_at: at(4),
    }));
    api.insert(page(42, "Contact", "Write to us"));

    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::Page, &default_rules(EntityKind::Page))
        .await
        .unwrap();

    assert_eq!(text(result.items[0].extra("uploadFilename")), Some("kick.mp4"));
    assert_eq!(text(result.items[1].extra("uploadFilename")), Some("Upload #8"));
    assert_eq!(text(result.items[2].extra("uploadFilename")), Some("No upload"));
    assert_eq!(result.warnings.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: output order follows input order even when replies arrive reversed
// ---------------------------------------------------------------------------

#[tokio::test]
async fn order_is_preserved_when_lookups_settle_out_of_order() {
    let api = InMemoryApi::new();
    for id in 1..=5 {
        api.insert(exercise(id, &format!("Exercise {id}"), None));
        api.insert(swim_set(100 + id, Some(id), 50, None, None));
        // Earlier rows answer later.
        api.delay_get(EntityKind::Exercise, id, Duration::from_millis(60 - id as u64 * 10));
    }

    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await
        .unwrap();

    let titles: Vec<_> = result
        .items
        .iter()
        .map(|row| text(row.extra("exerciseTitle")).unwrap().to_string())
        .collect();
    assert_eq!(
        titles,
        (1..=5).map(|id| format!("Exercise {id}")).collect::<Vec<_>>()
    );
}

// ---------------------------------------------------------------------------
// Test: one failing lookup degrades to a placeholder and a warning
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_lookup_keeps_the_item_with_a_placeholder() {
    let api = seeded_sets();
    api.fail_get(EntityKind::Exercise, 2);

    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await
        .unwrap();

    assert_eq!(result.items.len(), 3);
    assert_eq!(text(result.items[1].extra("exerciseTitle")), Some("Exercise #2"));
    assert_eq!(result.items[1].extra("totalDistance"), Some(&FieldValue::Number(100)));

    assert_eq!(result.warnings.len(), 1);
    assert!(matches!(
        &result.warnings[0],
        RecoverableError::Enrichment { item_id: 11, related_id: 2, related: EntityKind::Exercise, .. }
    ));
}

#[tokio::test]
async fn missing_related_record_is_also_recovered() {
    let api = InMemoryApi::new();
    api.insert(swim_set(1, Some(99), 25, Some(4), None));

    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await
        .unwrap();

    assert_eq!(text(result.items[0].extra("exerciseTitle")), Some("Exercise #99"));
    assert!(matches!(
        &result.warnings[0],
        RecoverableError::Enrichment { source: PortError::NotFound(_), .. }
    ));
}

// ---------------------------------------------------------------------------
// Test: the primary list failing is terminal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn primary_failure_fails_the_whole_pipeline() {
    let api = seeded_sets();
    api.fail_list(EntityKind::SwimSet);

    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await;

    assert!(matches!(result, Err(PortError::Unexpected(_))));
}

// ---------------------------------------------------------------------------
// Test: the concurrency bound is honoured
// ---------------------------------------------------------------------------

#[tokio::test]
async fn concurrency_limit_caps_in_flight_lookups() {
    let api = InMemoryApi::new();
    for id in 1..=8 {
        api.insert(exercise(id, "e", None));
        api.insert(swim_set(100 + id, Some(id), 50, None, None));
        api.delay_get(EntityKind::Exercise, id, Duration::from_millis(10));
    }

    let aggregator = FetchAggregator::new().with_concurrency(NonZeroUsize::new(2));
    let result = aggregator
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await
        .unwrap();

    assert_eq!(result.items.len(), 8);
    assert!(api.peak_concurrent_gets() <= 2);
}

#[tokio::test]
async fn unbounded_fan_out_runs_lookups_together() {
    let api = InMemoryApi::new();
    for id in 1..=6 {
        api.insert(exercise(id, "e", None));
        api.insert(swim_set(100 + id, Some(id), 50, None, None));
        api.delay_get(EntityKind::Exercise, id, Duration::from_millis(20));
    }

    FetchAggregator::new()
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await
        .unwrap();

    assert_eq!(api.peak_concurrent_gets(), 6);
}

// ---------------------------------------------------------------------------
// Test: cancellation abandons the pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_token_stops_aggregation() {
    let api = seeded_sets();
    let token = CancellationToken::new();
    token.cancel();

    let result = FetchAggregator::new()
        .with_cancellation(token)
        .aggregate_list(&api, EntityKind::SwimSet, &[swim_set_exercise()])
        .await;

    assert_eq!(result.unwrap_err(), PortError::Cancelled);
}

// ---------------------------------------------------------------------------
// Test: custom rules and custom primary fetches
// ---------------------------------------------------------------------------

#[tokio::test]
async fn several_rules_patch_the_same_item() {
    let api = seeded_sets();
    let shout = EnrichmentRule::new("shout", "exerciseId", EntityKind::Exercise, |_, related| {
        let title = related.map_or("?".to_string(), |r: &Item| r.title().to_uppercase());
        vec![("exerciseShout", title.into())]
    });

    let primary = api.list(EntityKind::SwimSet);
    let result = FetchAggregator::new()
        .aggregate(&api, primary, &[swim_set_exercise(), shout])
        .await
        .unwrap();

    assert_eq!(text(result.items[0].extra("exerciseShout")), Some("FREESTYLE"));
    assert_eq!(text(result.items[0].extra("exerciseTitle")), Some("Freestyle"));
    assert_eq!(text(result.items[2].extra("exerciseShout")), Some("?"));
}

#[tokio::test]
async fn no_rules_returns_plain_items() {
    let api = seeded_sets();
    let result = FetchAggregator::new()
        .aggregate_list(&api, EntityKind::Exercise, &[])
        .await
        .unwrap();
    assert_eq!(result.items.len(), 2);
    assert!(result.items.iter().all(|row| row.extras.is_empty()));
}
