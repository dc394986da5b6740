// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Request pipeline stages.
//!
//! Strictly ordered around every request: CORS, panic recovery, request
//! logging, route dispatch, then (for protected routes) token authentication
//! and OTP verification. The first three always apply; the router attaches
//! the last two selectively.
//!
//! A [`RequestContext`] is created at the top of the pipeline and discarded
//! at request end; it carries the authenticated user, the bearer token and
//! the per-request logging opt-out, and never outlives the request.

pub mod auth;
pub mod logging;
pub mod otp;
pub mod recovery;

use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    extract::{FromRequestParts, Request},
    http::{header::USER_AGENT, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::AppError;
use crate::logger::{self, RequestMeta};
use crate::models::User;
use crate::serializers::Resp;

/// Per-request mutable bag shared between pipeline stages.
///
/// Handles are cheap clones over the same request-scoped state.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<Mutex<ContextInner>>,
}

struct ContextInner {
    user: Option<User>,
    token: Option<String>,
    log_enabled: bool,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ContextInner {
                user: None,
                token: None,
                log_enabled: true,
            })),
        }
    }
}

impl RequestContext {
    /// Fetch the context from the request, inserting a fresh one if absent.
    pub fn obtain(req: &mut Request) -> Self {
        if let Some(ctx) = req.extensions().get::<RequestContext>() {
            return ctx.clone();
        }
        let ctx = RequestContext::default();
        req.extensions_mut().insert(ctx.clone());
        ctx
    }

    fn lock(&self) -> MutexGuard<'_, ContextInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn set_user(&self, user: User) {
        self.lock().user = Some(user);
    }

    pub fn set_token(&self, token: String) {
        self.lock().token = Some(token);
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    /// The authenticated user, or the generic system error when the auth
    /// stage did not run. Absence here is a programming error, not a
    /// client-facing condition, so the message stays generic.
    pub fn require_user(&self) -> Result<User, AppError> {
        match self.user() {
            Some(user) if user.id > 0 => Ok(user),
            _ => Err(crate::error::SYSTEM_ERROR.err().with_stacktrace()),
        }
    }

    /// Opt this request out of response-time logging.
    pub fn disable_logging(&self) {
        self.lock().log_enabled = false;
    }

    pub fn log_enabled(&self) -> bool {
        self.lock().log_enabled
    }
}

/// Pagination parameters from the query string.
///
/// Missing or invalid values fall back to the defaults; `limit` is clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub limit: u32,
}

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 500;

impl Default for Paging {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
    }
}

impl Paging {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut paging = Paging::default();
        let Some(query) = query else {
            return paging;
        };
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "page" => {
                    if let Ok(page) = value.parse::<u32>() {
                        paging.page = page;
                    }
                }
                "limit" => {
                    if let Ok(limit) = value.parse::<u32>() {
                        paging.limit = limit.min(MAX_LIMIT);
                    }
                }
                _ => {}
            }
        }
        paging
    }

    /// Row offset for the current page, saturating rather than overflowing.
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Paging {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Paging::from_query(parts.uri.query()))
    }
}

/// Build log metadata from the request, folding in the context user when
/// available.
pub(crate) fn request_meta(req: &Request, ctx: Option<&RequestContext>) -> RequestMeta {
    let user = ctx.and_then(RequestContext::user);
    RequestMeta {
        ip: client_ip(req),
        method: req.method().to_string(),
        path: req.uri().path().to_string(),
        raw_query: req.uri().query().unwrap_or_default().to_string(),
        status: 0,
        user_agent: header_str(req, USER_AGENT.as_str()),
        user_id: user.as_ref().map(|u| u.id).unwrap_or_default(),
        email: user.map(|u| u.email).unwrap_or_default(),
    }
}

fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }
    header_str(req, "x-real-ip")
}

fn header_str(req: &Request, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Abort the pipeline: log the error with request metadata, wrap it in the
/// envelope and stash it in response extensions for the tracking sink.
pub(crate) fn abort(status: StatusCode, mut meta: RequestMeta, err: AppError) -> Response {
    meta.status = status.as_u16();
    let err = logger::wrap_request_error(&meta, None, err);
    let mut response = (status, Json(Resp::err(err.clone()))).into_response();
    response.extensions_mut().insert(err);
    response
}
