// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! OTP step-up verification stage.
//!
//! Requires a previously authenticated user in the request context, fetches
//! the full profile from the core identity service and validates the
//! time-based code from the `OTP` header against the stored secret.
//!
//! A user whose profile has 2FA disabled fails this stage with the same
//! OTP-invalid error. That mirrors the upstream service's observed behavior;
//! whether such users should bypass the check instead is an open product
//! question, so the behavior is preserved deliberately.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{BAD_REQUEST, OTP_INVALID};
use crate::logger;
use crate::state::AppState;

use super::{abort, request_meta, RequestContext};

/// Header carrying the one-time code.
pub const OTP_HEADER: &str = "OTP";

const OTP_DIGITS: usize = 6;
const OTP_SKEW: u8 = 1;
const OTP_STEP: u64 = 30;

pub async fn verify_otp(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::obtain(&mut req);
    let meta = request_meta(&req, Some(&ctx));

    let user = match ctx.require_user() {
        Ok(user) => user,
        Err(err) => return abort(StatusCode::BAD_REQUEST, meta, err),
    };

    let profile = match state.users.get_core_user(user.id).await {
        Ok(profile) => profile,
        Err(err) => {
            logger::wrap_capture_error(err);
            return abort(
                StatusCode::BAD_REQUEST,
                meta,
                BAD_REQUEST.err().with_stacktrace(),
            );
        }
    };

    if !profile.two_fa_on {
        return abort(
            StatusCode::BAD_REQUEST,
            meta,
            OTP_INVALID.err().with_stacktrace(),
        );
    }

    let code = req
        .headers()
        .get(OTP_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if code.is_empty() || !totp_matches(code, &profile.secret) {
        return abort(
            StatusCode::BAD_REQUEST,
            meta,
            OTP_INVALID.err().with_stacktrace(),
        );
    }

    next.run(req).await
}

/// Validate a time-based code against a base32-encoded shared secret.
///
/// SHA-1, six digits, 30-second step, one step of skew; an undecodable or
/// too-short secret simply fails validation.
pub(crate) fn totp_matches(code: &str, secret: &str) -> bool {
    let Ok(bytes) = Secret::Encoded(secret.to_string()).to_bytes() else {
        return false;
    };
    let Ok(totp) = TOTP::new(Algorithm::SHA1, OTP_DIGITS, OTP_SKEW, OTP_STEP, bytes) else {
        return false;
    };
    totp.check_current(code).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header::AUTHORIZATION, Request as HttpRequest};
    use axum::routing::get;
    use axum::{middleware, Json, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::middleware::auth;
    use crate::models::CoreUser;
    use crate::serializers::Resp;
    use crate::test_support::{test_state, ScriptedBackend, StaticCore};

    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    fn profile(two_fa_on: bool) -> CoreUser {
        CoreUser {
            id: 7,
            email: "user7@example.com".into(),
            two_fa_on,
            secret: SECRET.into(),
        }
    }

    fn app(core: StaticCore) -> Router {
        let state = test_state(ScriptedBackend::always_ok(7), Arc::new(core));
        Router::new()
            .route("/budgeting-api/balance", get(|| async { Json(Resp::ok(0_u64)) }))
            .layer(middleware::from_fn_with_state(state.clone(), verify_otp))
            .layer(middleware::from_fn_with_state(state.clone(), auth::authorize))
            .with_state(state)
    }

    fn request(otp: Option<&str>) -> HttpRequest<Body> {
        let builder = HttpRequest::builder()
            .uri("/budgeting-api/balance")
            .header(AUTHORIZATION, "Bearer tok");
        let builder = match otp {
            Some(code) => builder.header(OTP_HEADER, code),
            None => builder,
        };
        builder.body(Body::empty()).unwrap()
    }

    async fn error_code(response: Response) -> i64 {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        value["error"]["code"].as_i64().unwrap()
    }

    fn current_code() -> String {
        let bytes = Secret::Encoded(SECRET.to_string()).to_bytes().unwrap();
        let totp = TOTP::new(Algorithm::SHA1, OTP_DIGITS, OTP_SKEW, OTP_STEP, bytes).unwrap();
        totp.generate_current().unwrap()
    }

    #[tokio::test]
    async fn two_fa_disabled_fails_with_otp_invalid() {
        let response = app(StaticCore::with(profile(false)))
            .oneshot(request(Some("123456")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, -1045);
    }

    #[tokio::test]
    async fn missing_code_fails_with_otp_invalid() {
        let response = app(StaticCore::with(profile(true)))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, -1045);
    }

    #[tokio::test]
    async fn wrong_code_fails_with_otp_invalid() {
        let response = app(StaticCore::with(profile(true)))
            .oneshot(request(Some("000000")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, -1045);
    }

    #[tokio::test]
    async fn correct_code_proceeds() {
        let response = app(StaticCore::with(profile(true)))
            .oneshot(request(Some(&current_code())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn profile_lookup_failure_aborts_with_bad_request() {
        let response = app(StaticCore::none())
            .oneshot(request(Some("123456")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error_code(response).await, -1007);
    }

    #[test]
    fn undecodable_secret_fails_validation() {
        assert!(!totp_matches("123456", "not base32 at all!!"));
    }
}
