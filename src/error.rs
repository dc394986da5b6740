// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Application error catalog.
//!
//! Every client-visible error is a clone of a named catalog entry carrying a
//! stable numeric code. Codes are part of the external API contract and are
//! never renumbered. Entries themselves are `const` and immutable; call sites
//! enrich a cloned [`AppError`] with a stack snapshot or structured extras.

use std::any::Any;
use std::backtrace::Backtrace;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde_json::Value;

use crate::serializers::Resp;

/// A named catalog entry: stable code plus default message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Catalog {
    pub code: i32,
    pub message: &'static str,
}

pub const SYSTEM_ERROR: Catalog = Catalog { code: -1001, message: "system error" };
pub const INVALID_EMAIL: Catalog = Catalog { code: -1002, message: "invalid email" };
pub const INVALID_PASSWORD: Catalog = Catalog { code: -1003, message: "invalid password" };
pub const EMAIL_NOT_EXISTS: Catalog = Catalog { code: -1004, message: "email doesn't exist" };
pub const EMAIL_ALREADY_EXISTS: Catalog = Catalog { code: -1005, message: "email already exists" };
pub const INVALID_CREDENTIALS: Catalog = Catalog { code: -1006, message: "invalid credentials" };
pub const BAD_REQUEST: Catalog = Catalog { code: -1007, message: "bad request" };
pub const BAD_PERMISSION: Catalog = Catalog { code: -1008, message: "bad permission" };
pub const BAD_BODY_REQUEST: Catalog = Catalog { code: -1009, message: "bad body request" };
pub const VERIFICATION_TOKEN_EXPIRED: Catalog =
    Catalog { code: -1010, message: "verification token expired" };
pub const OTP_INVALID: Catalog = Catalog { code: -1045, message: "OTP not matched or invalidated!" };

pub const NOT_ENOUGH_BALANCE: Catalog = Catalog { code: -222001, message: "not enough balance" };
pub const THIRD_PARTY: Catalog = Catalog { code: -222002, message: "third party error" };

impl Catalog {
    /// Clone this entry into a concrete [`AppError`].
    pub fn err(&self) -> AppError {
        AppError {
            code: self.code,
            message: self.message.to_string(),
            stacktrace: None,
            extra: None,
        }
    }

    /// Clone this entry keeping the code but substituting the message.
    pub fn with_message(&self, message: impl Into<String>) -> AppError {
        AppError {
            code: self.code,
            message: message.into(),
            stacktrace: None,
            extra: None,
        }
    }
}

/// A concrete application error.
///
/// Serializes as `{code, message}` only; the stack snapshot and extras are
/// for logging and never reach a client.
#[derive(Debug, Clone)]
pub struct AppError {
    pub code: i32,
    pub message: String,
    stacktrace: Option<String>,
    extra: Option<Value>,
}

impl AppError {
    /// Attach a stack snapshot captured at the call site.
    pub fn with_stacktrace(mut self) -> Self {
        self.stacktrace = Some(Backtrace::force_capture().to_string());
        self
    }

    /// Attach a structured extra payload for logging.
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }

    pub fn stacktrace(&self) -> Option<&str> {
        self.stacktrace.as_deref()
    }

    pub fn extra_json(&self) -> String {
        self.extra
            .as_ref()
            .map(|v| v.to_string())
            .unwrap_or_default()
    }

    /// HTTP status carried by the response envelope for this error.
    pub fn http_status(&self) -> StatusCode {
        if self.code == INVALID_CREDENTIALS.code {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::BAD_REQUEST
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl Serialize for AppError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AppError", 2)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("message", &self.message)?;
        state.end()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        let mut response = (status, Json(Resp::err(self.clone()))).into_response();
        // Kept in extensions so the recovery stage can forward the error to
        // the tracking sink.
        response.extensions_mut().insert(self);
        response
    }
}

/// Render a panic payload as text.
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
