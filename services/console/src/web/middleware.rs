//! services/console/src/web/middleware.rs
//!
//! Authentication middleware for protecting the admin routes.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::web::state::AppState;

/// Middleware that checks the `Authorization: Bearer <ADMIN_TOKEN>` header.
///
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Compare against the configured admin token
    if !constant_time_eq(token.as_bytes(), state.config.admin_token.as_bytes()) {
        warn!("Rejected admin request to {}", req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }

    // 3. Continue to the handler
    Ok(next.run(req).await)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
