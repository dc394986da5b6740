// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Request audit logging stage.
//!
//! Emits one response-time line per request with client and identity
//! metadata. Logging is opt-out per request via the context flag, defaulting
//! to on.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::info;

use crate::logger::LOGGER_API_RESPONSE_TIME;

use super::{request_meta, RequestContext};

pub async fn log_requests(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::obtain(&mut req);
    let meta = request_meta(&req, None);
    let start = Instant::now();

    let response = next.run(req).await;

    if ctx.log_enabled() {
        let latency = start.elapsed().as_secs_f64();
        let user = ctx.user();
        info!(
            app_category = LOGGER_API_RESPONSE_TIME,
            ip = %meta.ip,
            method = %meta.method,
            path = %meta.path,
            raw_query = %meta.raw_query,
            latency,
            status = response.status().as_u16(),
            user_agent = %meta.user_agent,
            user_id = user.as_ref().map(|u| u.id).unwrap_or_default(),
            email = %user.map(|u| u.email).unwrap_or_default(),
            "request info",
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Extension, Router};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/quiet",
                get(|Extension(ctx): Extension<RequestContext>| async move {
                    ctx.disable_logging();
                    "ok"
                }),
            )
            .route("/loud", get(|| async { "ok" }))
            .layer(middleware::from_fn(log_requests))
    }

    #[tokio::test]
    async fn passes_responses_through() {
        for path in ["/quiet", "/loud"] {
            let response = app()
                .oneshot(HttpRequest::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
    }
}
