// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Identity snapshots owned by the upstream services.
//!
//! The gateway never persists these; each is a read-only, per-request copy
//! attached to the request context and discarded at request end.

use serde::{Deserialize, Serialize};

/// User identity resolved from a bearer token by the backend service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    #[serde(default)]
    pub email: String,
}

/// Full profile from the core identity service, including second-factor
/// material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreUser {
    pub id: u64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub two_fa_on: bool,
    #[serde(default)]
    pub secret: String,
}
