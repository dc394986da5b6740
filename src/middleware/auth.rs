// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Token authentication stage.
//!
//! Extracts the bearer token from the `Authorization` header (exactly two
//! whitespace-separated tokens: scheme plus value) and resolves it against
//! the backend. An upstream 401 aborts immediately with invalid-credentials;
//! any other failure is retried up to [`AUTH_ATTEMPTS`] times before
//! aborting with bad-request. The call is cheap and idempotent, so the retry
//! loop carries no inter-attempt delay.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::error::{BAD_REQUEST, INVALID_CREDENTIALS};
use crate::state::AppState;

use super::{abort, request_meta, RequestContext};

/// Token resolution attempts per request.
pub const AUTH_ATTEMPTS: usize = 3;

pub async fn authorize(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::obtain(&mut req);
    let meta = request_meta(&req, Some(&ctx));

    let Some(token) = bearer_token(req.headers()) else {
        return abort(
            StatusCode::BAD_REQUEST,
            meta,
            BAD_REQUEST.err().with_stacktrace(),
        );
    };

    for _ in 0..AUTH_ATTEMPTS {
        match state.users.get_user_me(&token).await {
            Ok(user) => {
                ctx.set_user(user);
                ctx.set_token(token);
                return next.run(req).await;
            }
            Err(failure) if failure.http_status == Some(StatusCode::UNAUTHORIZED.as_u16()) => {
                return abort(
                    StatusCode::UNAUTHORIZED,
                    meta,
                    INVALID_CREDENTIALS.err().with_stacktrace(),
                );
            }
            Err(_) => {}
        }
    }
    abort(
        StatusCode::BAD_REQUEST,
        meta,
        BAD_REQUEST.err().with_stacktrace(),
    )
}

/// The token from `Authorization: <scheme> <token>`.
///
/// Rejects a missing header, a header that is not exactly two
/// whitespace-separated tokens, and an empty token value.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = raw.split_whitespace();
    let _scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some(token.to_string())
}
