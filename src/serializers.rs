// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Response envelope and response shaping.
//!
//! Every JSON response is wrapped in the fixed `{result, error, count}`
//! envelope; no endpoint returns a bare payload or a bare array. `count`
//! appears only on paginated list responses.

use serde::Serialize;
use serde_json::Value;

use crate::error::{AppError, SYSTEM_ERROR};
use crate::models::User;

/// The fixed response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Resp {
    pub result: Value,
    pub error: Option<AppError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

impl Resp {
    /// Success envelope around a payload.
    pub fn ok(result: impl Serialize) -> Self {
        Self {
            result: serde_json::to_value(result).unwrap_or(Value::Null),
            error: None,
            count: None,
        }
    }

    /// Failure envelope; `result` is null.
    pub fn err(error: AppError) -> Self {
        Self {
            result: Value::Null,
            error: Some(error),
            count: None,
        }
    }

    /// The envelope emitted when the recovery stage converts a panic.
    pub fn panic() -> Self {
        Self {
            result: Value::Bool(true),
            error: Some(SYSTEM_ERROR.err()),
            count: None,
        }
    }

    /// Attach a total row count (paginated list endpoints only).
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }
}

/// Client-facing user representation.
#[derive(Debug, Clone, Serialize)]
pub struct UserResp {
    pub id: u64,
    pub email: String,
}

impl From<&User> for UserResp {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BAD_REQUEST;

    #[test]
    fn success_envelope_has_null_error() {
        let json = serde_json::to_string(&Resp::ok(true)).unwrap();
        assert_eq!(json, r#"{"result":true,"error":null}"#);
    }

    #[test]
    fn failure_envelope_has_null_result() {
        let json = serde_json::to_string(&Resp::err(BAD_REQUEST.err())).unwrap();
        assert_eq!(
            json,
            r#"{"result":null,"error":{"code":-1007,"message":"bad request"}}"#
        );
    }

    #[test]
    fn panic_envelope_matches_contract_exactly() {
        let json = serde_json::to_string(&Resp::panic()).unwrap();
        assert_eq!(
            json,
            r#"{"result":true,"error":{"code":-1001,"message":"system error"}}"#
        );
    }

    #[test]
    fn count_is_omitted_unless_set() {
        let json = serde_json::to_string(&Resp::ok(Vec::<u64>::new()).with_count(7)).unwrap();
        assert_eq!(json, r#"{"result":[],"error":null,"count":7}"#);
    }

    #[test]
    fn user_resp_copies_identity_fields() {
        let user = User { id: 42, email: "a@b.c".into() };
        let resp = UserResp::from(&user);
        assert_eq!(resp.id, 42);
        assert_eq!(resp.email, "a@b.c");
    }
}
