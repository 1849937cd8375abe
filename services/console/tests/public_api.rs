//! Integration tests for the public routes: health and search.

mod common;

use axum::http::StatusCode;
use common::{build_test_app, get, ids, seeded_api, status_and_json};
use swim_admin_core::domain::EntityKind;

// ---------------------------------------------------------------------------
// Test: GET /health returns 200
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_check_returns_ok() {
    let app = build_test_app(seeded_api());
    let (status, json) = status_and_json(get(app, "/health").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// ---------------------------------------------------------------------------
// Test: search spans collections and matches page content
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_matches_titles_and_bodies_across_collections() {
    let app = build_test_app(seeded_api());
    let (status, json) = status_and_json(get(app, "/search?q=KICK").await).await;

    assert_eq!(status, StatusCode::OK);
    // "About" matches on its content, "Kick" on its title; sorted by title.
    assert_eq!(ids(&json), vec![40, 2]);
    assert_eq!(json["total"], 2);
    assert_eq!(json["items"][0]["kind"], "pages");
    assert_eq!(json["items"][0]["snippet"], "Kick sessions every Tuesday");
}

// ---------------------------------------------------------------------------
// Test: search can be restricted to one kind
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_restricted_to_one_kind() {
    let app = build_test_app(seeded_api());
    let (status, json) = status_and_json(get(app, "/search?q=kick&kind=exercises").await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&json), vec![2]);
}

#[tokio::test]
async fn search_rejects_unknown_kind() {
    let app = build_test_app(seeded_api());
    let (status, json) = status_and_json(get(app, "/search?kind=lanes").await).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "BAD_REQUEST");
}

// ---------------------------------------------------------------------------
// Test: a failing collection fails the whole search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_fails_when_any_collection_fails() {
    let api = seeded_api();
    api.fail_list(EntityKind::Plan);
    let app = build_test_app(api);
    let (status, json) = status_and_json(get(app, "/search?q=a").await).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["code"], "UPSTREAM_ERROR");
}

// ---------------------------------------------------------------------------
// Test: paging uses the configured default page size
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_pages_with_default_page_size() {
    let app = build_test_app(seeded_api());
    let (_, first) = status_and_json(get(app.clone(), "/search").await).await;
    let (_, second) = status_and_json(get(app, "/search?page=1").await).await;

    // 2 exercises, 1 workout, 2 plans and 1 page.
    assert_eq!(first["total"], 6);
    assert_eq!(first["pageSize"], 5);
    assert_eq!(first["pageCount"], 2);
    assert_eq!(ids(&first).len(), 5);
    assert_eq!(ids(&second).len(), 1);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(seeded_api());
    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = build_test_app(seeded_api());
    let (status, json) = status_and_json(get(app, "/api-docs/openapi.json").await).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["paths"]["/admin/{kind}"].is_object());
    assert!(json["paths"]["/search"].is_object());
    let save_shapes = json["components"]["schemas"]["SaveRequest"]["oneOf"]
        .as_array()
        .unwrap();
    assert_eq!(save_shapes.len(), 5);
}
