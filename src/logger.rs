// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Structured logging sink.
//!
//! One process-wide `tracing` subscriber, initialised once at startup with
//! the application name, an optional log file (parent directory auto-created)
//! and optional stdout output. Every application line carries an
//! `app_category` field from the fixed set below, mirroring the categorised
//! sink of the upstream design.
//!
//! The `wrap_*` helpers are logging passthroughs: they log an error enriched
//! with request metadata and hand the same error back, so call sites can
//! log-and-return in a single expression.

use std::backtrace::Backtrace;
use std::fmt::Display;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::AppError;

pub const LOGGER_API_RESPONSE_TIME: &str = "api_response_time";
pub const LOGGER_API_APP_PANIC: &str = "api_app_panic";
pub const LOGGER_API_APP_ERROR: &str = "api_app_error";
pub const LOGGER_API_APP_REQUEST_ERROR: &str = "api_app_request_error";

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    #[error("failed to prepare log file {path}: {source}")]
    LogFile { path: String, source: io::Error },
    #[error("failed to install log subscriber: {0}")]
    Install(String),
}

/// Initialise the process-wide subscriber.
///
/// Fails if called twice or if the log file cannot be created.
pub fn init(
    app_name: &str,
    log_path: Option<&Path>,
    stdout: bool,
    debug: bool,
) -> Result<(), LoggerError> {
    let default_directive = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let stdout_layer = stdout.then(|| fmt::layer().json().with_current_span(false));

    let file_layer = match log_path {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir).map_err(|source| LoggerError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggerError::LogFile {
                    path: path.display().to_string(),
                    source,
                })?;
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_ansi(false)
                    .with_writer(Arc::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggerError::Install(e.to_string()))?;

    info!(app_name, "logger initialised");
    Ok(())
}

/// Request metadata attached to audit and error lines.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RequestMeta {
    pub ip: String,
    pub method: String,
    pub path: String,
    pub raw_query: String,
    pub status: u16,
    pub user_agent: String,
    pub user_id: u64,
    pub email: String,
}

/// Log `err` under `category` and return it unchanged.
pub fn wrap_error<E: Display>(category: &'static str, err: E) -> E {
    error!(app_category = category, error = %err, "{err}");
    err
}

/// Log `err` as an application error and return it unchanged.
pub fn wrap_capture_error<E: Display>(err: E) -> E {
    wrap_error(LOGGER_API_APP_ERROR, err)
}

/// Log `err` with full request metadata and return it unchanged.
///
/// Uses the stack snapshot already attached to the error when present,
/// otherwise captures one here.
pub fn wrap_request_error(meta: &RequestMeta, body: Option<&Value>, err: AppError) -> AppError {
    let stacktrace = match err.stacktrace() {
        Some(stack) => stack.to_string(),
        None => Backtrace::force_capture().to_string(),
    };
    let request_body_json = body.map(|v| v.to_string()).unwrap_or_default();
    info!(
        app_category = LOGGER_API_APP_REQUEST_ERROR,
        error = %err,
        ip = %meta.ip,
        method = %meta.method,
        path = %meta.path,
        raw_query = %meta.raw_query,
        status = meta.status,
        user_agent = %meta.user_agent,
        user_id = meta.user_id,
        email = %meta.email,
        stacktrace = %stacktrace,
        request_body_json = %request_body_json,
        "{}",
        err.message,
    );
    err
}
