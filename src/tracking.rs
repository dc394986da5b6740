// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Error-tracking sink client.
//!
//! Posts JSON events to the configured tracking endpoint so engineers get
//! alerted on panics and on request errors. Delivery is fire-and-forget:
//! failures are logged at debug level and never affect request handling.
//! An empty DSN disables the sink entirely.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::logger::RequestMeta;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ErrorTracker {
    inner: Option<Arc<Inner>>,
}

struct Inner {
    dsn: String,
    environment: String,
    http: reqwest::Client,
}

impl ErrorTracker {
    /// Build a tracker for the given DSN; an empty DSN yields a disabled
    /// tracker.
    pub fn new(dsn: &str, environment: &str) -> Self {
        if dsn.is_empty() {
            return Self::disabled();
        }
        let http = match reqwest::Client::builder().timeout(DELIVERY_TIMEOUT).build() {
            Ok(http) => http,
            Err(e) => {
                debug!(error = %e, "error tracker disabled: http client build failed");
                return Self::disabled();
            }
        };
        Self {
            inner: Some(Arc::new(Inner {
                dsn: dsn.to_string(),
                environment: environment.to_string(),
                http,
            })),
        }
    }

    /// A tracker that drops every event.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Queue an event for delivery.
    pub fn capture_message(&self, message: &str, meta: Option<&RequestMeta>) {
        let Some(inner) = self.inner.clone() else {
            return;
        };
        let event = json!({
            "event_id": Uuid::new_v4().to_string(),
            "timestamp": Utc::now().to_rfc3339(),
            "level": "error",
            "environment": inner.environment,
            "message": message,
            "request": meta,
        });
        tokio::spawn(async move {
            if let Err(e) = inner.http.post(&inner.dsn).json(&event).send().await {
                debug!(error = %e, "failed to deliver tracking event");
            }
        });
    }
}
