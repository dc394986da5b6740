// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! HTTP surface and pipeline wiring.
//!
//! All routes live under the `/budgeting-api` prefix. The liveness route is
//! open; everything else goes through token authentication, and the balance
//! route additionally through OTP verification. Recovery and request logging
//! wrap the whole router so even rejected requests are logged and panics are
//! converted, and CORS sits outermost.

use std::time::Duration;

use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use crate::middleware::{auth, logging, otp, recovery};
use crate::state::AppState;

pub mod users;

const CORS_MAX_AGE: Duration = Duration::from_secs(12 * 60 * 60);

pub fn cors_layer() -> CorsLayer {
    CorsLayer::very_permissive().max_age(CORS_MAX_AGE)
}

/// Liveness probe. Deliberately outside the envelope contract.
async fn health() -> Json<Value> {
    Json(json!({ "result": "OK" }))
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/budgeting-api/me", get(users::me))
        .route(
            "/budgeting-api/balance",
            get(users::balance)
                .layer(middleware::from_fn_with_state(state.clone(), otp::verify_otp)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::authorize));

    Router::new()
        .route("/budgeting-api/", get(health))
        .merge(protected)
        .layer(middleware::from_fn(logging::log_requests))
        .layer(middleware::from_fn_with_state(state.clone(), recovery::recover))
        .layer(cors_layer())
        .with_state(state)
}
