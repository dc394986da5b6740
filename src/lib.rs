// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Budgeting API gateway.
//!
//! A thin HTTP gateway in front of the budgeting backend: it authenticates
//! bearer tokens against the upstream identity service, enforces an OTP
//! second factor on sensitive routes, wraps every response in a fixed
//! envelope and keeps serving through downstream panics.
//!
//! ## Modules
//!
//! - `api` - routes and pipeline wiring (Axum)
//! - `middleware` - request context plus the auth/OTP/logging/recovery stages
//! - `services` - reqwest clients for the backend, core identity, secrets
//! - `db` - PostgreSQL pool, transactions and the typed query helper
//! - `tracking` - fire-and-forget error-event sink

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod models;
pub mod serializers;
pub mod services;
pub mod state;
pub mod tracking;

#[cfg(test)]
pub(crate) mod test_support;
