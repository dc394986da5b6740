// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Panic recovery stage.
//!
//! Creates the request context, then runs the rest of the pipeline under a
//! scoped unwind capture. A panic anywhere downstream is logged with full
//! request metadata, reported to the tracking sink and converted into the
//! generic system-error envelope; the worker keeps serving.
//!
//! Independent of panics, an error that reached the response (stashed in its
//! extensions) is forwarded to the tracking sink unless the configuration
//! restricts reporting to crashes only.

use std::backtrace::Backtrace;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt;
use tracing::info;

use crate::error::{panic_message, AppError};
use crate::logger::LOGGER_API_APP_PANIC;
use crate::serializers::Resp;
use crate::state::AppState;

use super::{request_meta, RequestContext};

pub async fn recover(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::obtain(&mut req);
    let mut meta = request_meta(&req, None);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => {
            if !state.config.tracking_only_crashes {
                if let Some(err) = response.extensions().get::<AppError>() {
                    meta.status = response.status().as_u16();
                    if let Some(user) = ctx.user() {
                        meta.user_id = user.id;
                        meta.email = user.email;
                    }
                    state.tracker.capture_message(&err.message, Some(&meta));
                }
            }
            response
        }
        Err(payload) => {
            let message = panic_message(payload);
            let stacktrace = Backtrace::force_capture().to_string();
            meta.status = StatusCode::BAD_REQUEST.as_u16();
            if let Some(user) = ctx.user() {
                meta.user_id = user.id;
                meta.email = user.email;
            }
            info!(
                app_category = LOGGER_API_APP_PANIC,
                ip = %meta.ip,
                method = %meta.method,
                path = %meta.path,
                raw_query = %meta.raw_query,
                status = meta.status,
                user_agent = %meta.user_agent,
                error = %message,
                stacktrace = %stacktrace,
                user_id = meta.user_id,
                email = %meta.email,
                "server is panic",
            );
            state.tracker.capture_message(&message, Some(&meta));
            (StatusCode::BAD_REQUEST, Json(Resp::panic())).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request as HttpRequest;
    use axum::routing::get;
    use axum::{middleware, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::test_support::{test_state, ScriptedBackend, StaticCore};

    async fn panicking() -> &'static str {
        panic!("boom")
    }

    fn app() -> Router {
        let state = test_state(ScriptedBackend::always_ok(7), Arc::new(StaticCore::none()));
        Router::new()
            .route("/panic", get(panicking))
            .route("/fine", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(state.clone(), recover))
            .with_state(state)
    }

    #[tokio::test]
    async fn panic_becomes_exact_system_error_envelope() {
        let response = app()
            .oneshot(HttpRequest::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            body,
            r#"{"result":true,"error":{"code":-1001,"message":"system error"}}"#.as_bytes()
        );
    }

    #[tokio::test]
    async fn process_keeps_serving_after_a_panic() {
        let app = app();
        let first = app
            .clone()
            .oneshot(HttpRequest::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::BAD_REQUEST);

        let second = app
            .oneshot(HttpRequest::builder().uri("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::OK);
    }
}
