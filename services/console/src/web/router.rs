//! services/console/src/web/router.rs
//!
//! Assembles the console's router: public routes, admin routes behind the
//! bearer-token middleware, and the Swagger UI.

use crate::web::middleware::require_auth;
use crate::web::rest::{
    create_handler, delete_handler, health_handler, list_handler, search_handler,
    update_handler, workout_detail_handler, ApiDoc,
};
use crate::web::state::AppState;
use axum::{
    middleware as axum_middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Builds the full application router around `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler));

    // Admin routes (bearer token required)
    let admin_routes = Router::new()
        .route("/admin/{kind}", get(list_handler).post(create_handler))
        .route("/admin/{kind}/{id}", put(update_handler).delete(delete_handler))
        .route("/admin/{kind}/{id}/detail", get(workout_detail_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    let api_router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .with_state(state);

    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}
