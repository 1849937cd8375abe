//! Shared helpers for the console integration tests.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use console_lib::config::Config;
use console_lib::web::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use swim_admin_core::domain::{Exercise, Item, ItemId, Page, Plan, SwimSet, Workout};
use swim_admin_core::memory::InMemoryApi;
use tower::ServiceExt;

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// A config with safe defaults; the upstream URL is never contacted.
pub fn test_config() -> Config {
    Config::from_lookup(|name: &str| match name {
        "UPSTREAM_API_URL" => Some("http://upstream.invalid".to_string()),
        "ADMIN_TOKEN" => Some(ADMIN_TOKEN.to_string()),
        "DEFAULT_PAGE_SIZE" => Some("5".to_string()),
        _ => None,
    })
    .expect("test config is valid")
}

/// Build the application router around an in-memory API, exactly as the
/// binary builds it around the REST adapter.
pub fn build_test_app(api: Arc<InMemoryApi>) -> Router {
    let state = AppState::new(api, Arc::new(test_config()));
    build_router(Arc::new(state))
}

// ---- Requests ----

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn admin_get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(ADMIN_TOKEN), None).await
}

pub async fn admin_send(app: Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    send(app, method, uri, Some(ADMIN_TOKEN), body).await
}

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Status plus decoded body, for one-line assertions.
pub async fn status_and_json(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    (status, body_json(response).await)
}

pub fn ids(json: &Value) -> Vec<i64> {
    json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_i64().unwrap())
        .collect()
}

// ---- Fixtures ----

pub fn at(day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap()
}

pub fn exercise(id: ItemId, title: &str, category: Option<&str>) -> Item {
    Item::Exercise(Exercise {
        id,
        title: title.to_string(),
        description: Some(format!("{title} drill")),
        level: None,
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
        description: None,
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

pub fn swim_set(id: ItemId, exercise_id: Option<ItemId>, distance: u32, repetition: u32, rest: u32) -> Item {
    Item::SwimSet(SwimSet {
        id,
        title: format!("Set {id}"),
        workout_id: None,
        exercise_id,
        distance: Some(distance),
        repetition: Some(repetition),
        rest_time_seconds: Some(rest),
        created_at: at(5),
    })
}

/// Exercises 1-2, swim-sets 10-12, workout 20, plans 30-31, page 40.
pub fn seeded_api() -> Arc<InMemoryApi> {
    let api = InMemoryApi::new();
    api.insert(exercise(1, "Freestyle", Some("Technique")));
    api.insert(exercise(2, "Kick", Some("Legs")));
    api.insert(swim_set(10, Some(1), 100, 4, 30));
    api.insert(swim_set(11, Some(2), 50, 2, 90));
    api.insert(swim_set(12, Some(99), 200, 1, 0));
    api.insert(workout(20, "Threshold", Some("Endurance")));
    api.insert(plan(30, "Base block"));
    api.insert(plan(31, "Taper"));
    api.insert(page(40, "About", "Kick sessions every Tuesday"));
    Arc::new(api)
}
