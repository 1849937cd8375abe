//! services/console/src/web/rest.rs
//!
//! Contains the Axum handlers for the console's REST endpoints and the master
//! definition for the OpenAPI specification.

use crate::error::{WebError, WebResult};
use crate::web::protocol::{
    decode_body, parse_kind, warnings, ExerciseRequest, ItemPageResponse, ItemView,
    LinkReportView, ListParams, PageRequest, PlanRequest, SaveRequest, SaveResponse,
    SearchHitView, SearchParams, SearchResponse, SwimSetRequest, WarningView,
    WorkoutDetailResponse, WorkoutRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use swim_admin_core::aggregator::default_rules;
use swim_admin_core::detail::load_workout_detail;
use swim_admin_core::domain::{EntityKind, ItemId};
use swim_admin_core::forms::{ExerciseForm, PageForm, PlanForm, SwimSetForm, WorkoutForm};
use swim_admin_core::query::filter_sort_page;
use swim_admin_core::search::{search, SearchQuery};
use tracing::info;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        search_handler,
        list_handler,
        workout_detail_handler,
        create_handler,
        update_handler,
        delete_handler,
    ),
    components(
        schemas(
            HealthResponse,
            SearchResponse,
            SearchHitView,
            ItemPageResponse,
            ItemView,
            WarningView,
            WorkoutDetailResponse,
            SaveRequest,
            WorkoutRequest,
            PlanRequest,
            SwimSetRequest,
            ExerciseRequest,
            PageRequest,
            SaveResponse,
            LinkReportView,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Swim Admin Console", description = "Aggregated, filtered views and save flows over the training platform API.")
    )
)]
pub struct ApiDoc;

/// Declares the admin bearer token scheme.
struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "admin_token",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
}

//=========================================================================================
// Public Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "The console is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Search exercises, workouts, plans and pages at once.
#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses(
        (status = 200, description = "One page of matches", body = SearchResponse),
        (status = 400, description = "Invalid query parameters"),
        (status = 502, description = "A collection could not be fetched")
    )
)]
pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> WebResult<Json<SearchResponse>> {
    let query = SearchQuery {
        kind: params.kind()?,
        filter: params.to_filter(state.default_filter())?,
    };
    let page = search(state.api.as_ref(), &query).await?;
    Ok(Json(SearchResponse::from(page)))
}

//=========================================================================================
// Admin Handlers
//=========================================================================================

/// List a collection, enriched with related records, filtered and paged.
///
/// Lookups that fail are replaced with placeholders and reported in `warnings`.
#[utoipa::path(
    get,
    path = "/admin/{kind}",
    params(
        ("kind" = String, Path, description = "Collection segment, e.g. `swim-sets`."),
        ListParams
    ),
    responses(
        (status = 200, description = "One page of enriched items", body = ItemPageResponse),
        (status = 400, description = "Unknown collection or invalid parameters"),
        (status = 401, description = "Missing or invalid admin token"),
        (status = 502, description = "The collection could not be fetched")
    ),
    security(("admin_token" = []))
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
    Query(params): Query<ListParams>,
) -> WebResult<Json<ItemPageResponse>> {
    let kind = parse_kind(&segment)?;
    let filter = params.to_filter(state.default_filter())?;

    let aggregated = state
        .aggregator
        .aggregate_list(state.api.as_ref(), kind, &default_rules(kind))
        .await?;
    let page = filter_sort_page(&aggregated.items, &filter);
    Ok(Json(ItemPageResponse::new(
        page,
        warnings(&aggregated.warnings),
    )))
}

/// A workout with its sets, exercise names, rest times and running totals.
#[utoipa::path(
    get,
    path = "/admin/{kind}/{id}/detail",
    params(
        ("kind" = String, Path, description = "Only `workouts` has a detail view."),
        ("id" = i64, Path, description = "Workout id.")
    ),
    responses(
        (status = 200, description = "The workout detail", body = WorkoutDetailResponse),
        (status = 404, description = "No such workout"),
        (status = 502, description = "The workout or its sets could not be fetched")
    ),
    security(("admin_token" = []))
)]
pub async fn workout_detail_handler(
    State(state): State<Arc<AppState>>,
    Path((segment, id)): Path<(String, ItemId)>,
) -> WebResult<Json<WorkoutDetailResponse>> {
    if parse_kind(&segment)? != EntityKind::Workout {
        return Err(WebError::BadRequest(format!(
            "'{}' has no detail view",
            segment
        )));
    }
    let detail = load_workout_detail(&state.aggregator, state.api.as_ref(), id).await?;
    Ok(Json(WorkoutDetailResponse::from(detail)))
}

/// Create a record and link its selected associations.
#[utoipa::path(
    post,
    path = "/admin/{kind}",
    params(("kind" = String, Path, description = "Collection segment.")),
    request_body = SaveRequest,
    responses(
        (status = 201, description = "Saved; `warnings` lists links that failed", body = SaveResponse),
        (status = 400, description = "Malformed body or read-only collection"),
        (status = 422, description = "Validation failed; nothing was sent upstream"),
        (status = 502, description = "The record could not be saved")
    ),
    security(("admin_token" = []))
)]
pub async fn create_handler(
    State(state): State<Arc<AppState>>,
    Path(segment): Path<String>,
    Json(body): Json<Value>,
) -> WebResult<(StatusCode, Json<SaveResponse>)> {
    let kind = parse_kind(&segment)?;
    let response = save(&state, kind, None, body).await?;
    info!("Created {} {}", kind, response.item.id);
    Ok((StatusCode::CREATED, Json(response)))
}

/// Update a record and reconcile its associations with the submitted ids.
#[utoipa::path(
    put,
    path = "/admin/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Collection segment."),
        ("id" = i64, Path, description = "Record id.")
    ),
    request_body = SaveRequest,
    responses(
        (status = 200, description = "Saved; `warnings` lists links that failed", body = SaveResponse),
        (status = 400, description = "Malformed body or read-only collection"),
        (status = 404, description = "No such record"),
        (status = 422, description = "Validation failed; nothing was sent upstream"),
        (status = 502, description = "The record could not be saved")
    ),
    security(("admin_token" = []))
)]
pub async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path((segment, id)): Path<(String, ItemId)>,
    Json(body): Json<Value>,
) -> WebResult<Json<SaveResponse>> {
    let kind = parse_kind(&segment)?;
    let response = save(&state, kind, Some(id), body).await?;
    info!("Updated {} {}", kind, id);
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/admin/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "Collection segment."),
        ("id" = i64, Path, description = "Record id.")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such record"),
        (status = 502, description = "The record could not be deleted")
    ),
    security(("admin_token" = []))
)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path((segment, id)): Path<(String, ItemId)>,
) -> WebResult<StatusCode> {
    let kind = parse_kind(&segment)?;
    state.api.delete(kind, id).await?;
    info!("Deleted {} {}", kind, id);
    Ok(StatusCode::NO_CONTENT)
}

//=========================================================================================
// Save Dispatch
//=========================================================================================

/// Runs the form flow for `kind`. Edits start from the server's current
/// state so that omitted association lists stay as they are; the submitted
/// fields are validated before that state is loaded.
async fn save(
    state: &AppState,
    kind: EntityKind,
    existing: Option<ItemId>,
    body: Value,
) -> WebResult<SaveResponse> {
    let api = state.api.as_ref();
    match kind {
        EntityKind::Workout => {
            let request: WorkoutRequest = decode_body(body)?;
            request.validate()?;
            let mut form = match existing {
                Some(id) => WorkoutForm::load(api, id).await?,
                None => WorkoutForm::default(),
            };
            request.apply_to(&mut form);
            Ok(SaveResponse::from(form.save(api, existing).await?))
        }
        EntityKind::Plan => {
            let request: PlanRequest = decode_body(body)?;
            request.validate()?;
            let mut form = match existing {
                Some(id) => PlanForm::load(api, id).await?,
                None => PlanForm::default(),
            };
            request.apply_to(&mut form);
            Ok(SaveResponse::from(form.save(api, existing).await?))
        }
        EntityKind::SwimSet => {
            let form = SwimSetForm::from(decode_body::<SwimSetRequest>(body)?);
            Ok(SaveResponse::from_item(&form.save(api, existing).await?))
        }
        EntityKind::Exercise => {
            let form = ExerciseForm::from(decode_body::<ExerciseRequest>(body)?);
            Ok(SaveResponse::from_item(&form.save(api, existing).await?))
        }
        EntityKind::Page => {
            let form = PageForm::from(decode_body::<PageRequest>(body)?);
            Ok(SaveResponse::from_item(&form.save(api, existing).await?))
        }
        EntityKind::Upload | EntityKind::User => Err(WebError::BadRequest(format!(
            "{} cannot be edited from the console",
            kind
        ))),
    }
}
