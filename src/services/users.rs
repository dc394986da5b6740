// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! User service: the gateway's view of the two identity upstreams.
//!
//! Client-layer failures are wrapped with a stack snapshot here, at the point
//! they cross into application logic; the raw upstream message never reaches
//! a client (the system-error catalog entry substitutes a generic message at
//! the HTTP boundary).

use std::sync::Arc;

use crate::error::{AppError, SYSTEM_ERROR, THIRD_PARTY};
use crate::models::{CoreUser, User};

use super::{BackendApi, CoreApi};

/// Token resolution failure, preserving the upstream HTTP status so the auth
/// stage can special-case 401.
#[derive(Debug)]
pub struct AuthFailure {
    pub http_status: Option<u16>,
    pub error: AppError,
}

#[derive(Clone)]
pub struct UserService {
    backend: Arc<dyn BackendApi>,
    core: Arc<dyn CoreApi>,
}

impl UserService {
    pub fn new(backend: Arc<dyn BackendApi>, core: Arc<dyn CoreApi>) -> Self {
        Self { backend, core }
    }

    /// Resolve a bearer token to the calling user.
    pub async fn get_user_me(&self, token: &str) -> Result<User, AuthFailure> {
        self.backend.user_check(token).await.map_err(|e| AuthFailure {
            http_status: e.http_status(),
            error: SYSTEM_ERROR.with_message(e.to_string()).with_stacktrace(),
        })
    }

    /// Resolve a full profile, including second-factor material.
    pub async fn get_core_user(&self, user_id: u64) -> Result<CoreUser, AppError> {
        self.core
            .user_by_id(user_id)
            .await
            .map_err(|e| SYSTEM_ERROR.with_message(e.to_string()).with_stacktrace())
    }

    /// Forward the available-balance lookup to the backend.
    pub async fn get_available_balance(&self, token: &str) -> Result<u64, AppError> {
        self.backend
            .available_balance(token)
            .await
            .map_err(|e| THIRD_PARTY.with_message(e.to_string()).with_stacktrace())
    }
}
