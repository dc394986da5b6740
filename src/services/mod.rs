// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Upstream service clients.
//!
//! Each collaborator gets a small reqwest-backed client. The identity-facing
//! clients sit behind trait seams so the pipeline can be tested with doubles
//! instead of live upstreams.

pub mod backends;
pub mod core;
pub mod secrets;
pub mod users;

pub use users::UserService;

use async_trait::async_trait;

use crate::models::{CoreUser, User};

/// Upstream client failure.
///
/// A non-2xx response is surfaced distinctly from transport failure so
/// callers can special-case specific statuses (the auth stage cares about
/// 401).
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("failed request: {0}")]
    Transport(String),
    #[error("http response bad status {status} {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ClientError {
    /// The upstream HTTP status, when the failure was a status failure.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Token-check backend: resolves bearer tokens and balances.
#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn user_check(&self, token: &str) -> Result<User, ClientError>;
    async fn available_balance(&self, token: &str) -> Result<u64, ClientError>;
}

/// Core identity subsystem: resolves full profiles by internal id.
#[async_trait]
pub trait CoreApi: Send + Sync {
    async fn user_by_id(&self, user_id: u64) -> Result<CoreUser, ClientError>;
}
