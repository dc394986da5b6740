// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Shared fixtures for pipeline and handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::{Config, UrlConfig};
use crate::models::{CoreUser, User};
use crate::services::{BackendApi, ClientError, CoreApi, UserService};
use crate::state::AppState;
use crate::tracking::ErrorTracker;

pub(crate) fn test_config() -> Config {
    Config {
        env: "test".into(),
        secrets_url: "http://secrets.test".into(),
        tracking_dsn: String::new(),
        tracking_env: "test".into(),
        tracking_only_crashes: false,
        port: 0,
        log_path: String::new(),
        debug: false,
        mailer: None,
        backend: UrlConfig { url: "http://backend.test".into() },
        core: UrlConfig { url: "http://core.test".into() },
        db_url: String::new(),
    }
}

/// A pool that never connects; tests here exercise the pipeline, not the
/// database.
pub(crate) fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .connect_lazy("postgres://postgres@localhost:5432/budgeting_test")
        .expect("lazy pool")
}

pub(crate) fn test_state(backend: Arc<dyn BackendApi>, core: Arc<dyn CoreApi>) -> AppState {
    AppState::new(
        test_config(),
        UserService::new(backend, core),
        ErrorTracker::disabled(),
        lazy_pool(),
    )
}

enum Script {
    AlwaysOk,
    AlwaysStatus(u16),
    /// Transport failures until the given attempt (1-based) succeeds.
    FlakyUntil(usize),
}

/// Backend double with a per-call script and a call counter.
pub(crate) struct ScriptedBackend {
    calls: AtomicUsize,
    script: Script,
    user_id: u64,
    balance: u64,
    balance_fails: bool,
}

impl ScriptedBackend {
    pub(crate) fn always_ok(user_id: u64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Script::AlwaysOk,
            user_id,
            balance: 0,
            balance_fails: false,
        })
    }

    pub(crate) fn always_status(status: u16) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Script::AlwaysStatus(status),
            user_id: 0,
            balance: 0,
            balance_fails: false,
        })
    }

    pub(crate) fn flaky_until(succeeds_on: usize, user_id: u64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Script::FlakyUntil(succeeds_on),
            user_id,
            balance: 0,
            balance_fails: false,
        })
    }

    pub(crate) fn with_balance(user_id: u64, balance: u64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Script::AlwaysOk,
            user_id,
            balance,
            balance_fails: false,
        })
    }

    /// Authenticates fine but fails every balance lookup.
    pub(crate) fn with_failing_balance(user_id: u64) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            script: Script::AlwaysOk,
            user_id,
            balance: 0,
            balance_fails: true,
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn user(&self) -> User {
        User { id: self.user_id, email: format!("user{}@example.com", self.user_id) }
    }
}

#[async_trait]
impl BackendApi for ScriptedBackend {
    async fn user_check(&self, _token: &str) -> Result<User, ClientError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script {
            Script::AlwaysOk => Ok(self.user()),
            Script::AlwaysStatus(status) => {
                Err(ClientError::Status { status, body: "scripted".into() })
            }
            Script::FlakyUntil(succeeds_on) if attempt >= succeeds_on => Ok(self.user()),
            Script::FlakyUntil(_) => Err(ClientError::Transport("scripted outage".into())),
        }
    }

    async fn available_balance(&self, _token: &str) -> Result<u64, ClientError> {
        if self.balance_fails {
            return Err(ClientError::Status { status: 500, body: "reserve down".into() });
        }
        Ok(self.balance)
    }
}

/// Core-identity double returning a fixed profile.
pub(crate) struct StaticCore {
    user: Option<CoreUser>,
}

impl StaticCore {
    pub(crate) fn none() -> Self {
        Self { user: None }
    }

    pub(crate) fn with(user: CoreUser) -> Self {
        Self { user: Some(user) }
    }
}

#[async_trait]
impl CoreApi for StaticCore {
    async fn user_by_id(&self, _user_id: u64) -> Result<CoreUser, ClientError> {
        self.user
            .clone()
            .ok_or(ClientError::Status { status: 404, body: "no such user".into() })
    }
}
