// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

use std::net::SocketAddr;
use std::sync::Arc;

use budgeting_api::api::router;
use budgeting_api::config::{self, Config, DB_SECRET_NAME};
use budgeting_api::services::{backends, core, secrets, UserService};
use budgeting_api::state::AppState;
use budgeting_api::tracking::ErrorTracker;
use budgeting_api::{db, logger};

const DB_MIN_CONNECTIONS: u32 = 2;
const DB_MAX_CONNECTIONS: u32 = 20;

#[tokio::main]
async fn main() {
    let config_path = config::config_path();
    let mut config = Config::load(&config_path).expect("failed to load configuration");

    logger::init("budgeting-api", config.log_path(), true, config.debug)
        .expect("failed to initialize logging");

    let tracker = ErrorTracker::new(&config.tracking_dsn, &config.tracking_env);

    let secrets = secrets::Client::new(&config.secrets_url).expect("failed to build secrets client");
    config.db_url = secrets
        .get(DB_SECRET_NAME)
        .await
        .expect("failed to fetch database URL from secrets service");

    let pool = db::init(&config.db_url, DB_MIN_CONNECTIONS, DB_MAX_CONNECTIONS)
        .await
        .expect("failed to connect to database");

    let backend = backends::Client::new(&config.backend.url).expect("failed to build backend client");
    let core = core::Client::new(&config.core.url).expect("failed to build core client");
    let users = UserService::new(Arc::new(backend), Arc::new(core));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port()));
    let state = AppState::new(config, users, tracker, pool);
    let app = router(state);

    tracing::info!(%addr, "budgeting api listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c().await.expect("failed to listen for shutdown signal");
    tracing::info!("shutting down");
}
