// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::services::users::UserService;
use crate::tracking::ErrorTracker;

/// Shared application context, cloned into every handler and stage.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: UserService,
    pub tracker: ErrorTracker,
    pub db: PgPool,
}

impl AppState {
    pub fn new(config: Config, users: UserService, tracker: ErrorTracker, db: PgPool) -> Self {
        Self {
            config: Arc::new(config),
            users,
            tracker,
            db,
        }
    }
}
