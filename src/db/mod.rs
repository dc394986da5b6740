// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! PostgreSQL access layer.
//!
//! Pool construction plus a panic-safe transaction wrapper. Query building
//! and the typed data-access helper live in [`dao`].

pub mod dao;

use std::panic::AssertUnwindSafe;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::tracking::ErrorTracker;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("commit failed: {0}")]
    Commit(sqlx::Error),
    #[error("transaction panicked: {0}")]
    Panic(String),
    #[error("unknown relation: {0}")]
    UnknownRelation(String),
    #[error("filter placeholder count does not match argument count: {0}")]
    FilterArity(String),
}

/// Connects a pool with the given connection bounds.
pub async fn init(db_url: &str, min_connections: u32, max_connections: u32) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .min_connections(min_connections)
        .max_connections(max_connections)
        .connect(db_url)
        .await?;
    Ok(pool)
}

/// Runs `callback` inside a transaction. A returned error or a panic rolls
/// the transaction back; a panic is additionally reported to the tracking
/// sink and surfaced as [`DbError::Panic`] instead of unwinding further.
pub async fn with_transaction<T, F>(
    pool: &PgPool,
    tracker: &ErrorTracker,
    callback: F,
) -> Result<T, DbError>
where
    F: for<'t> FnOnce(&'t mut Transaction<'static, Postgres>) -> BoxFuture<'t, Result<T, DbError>>,
{
    let mut tx = pool.begin().await?;

    // The callback runs inside the caught future so a panic while building
    // the future is converted too, not just one raised mid-poll.
    match AssertUnwindSafe(async { callback(&mut tx).await }).catch_unwind().await {
        Ok(Ok(value)) => {
            tx.commit().await.map_err(DbError::Commit)?;
            Ok(value)
        }
        Ok(Err(err)) => {
            tx.rollback().await.ok();
            Err(err)
        }
        Err(payload) => {
            tx.rollback().await.ok();
            let message = crate::error::panic_message(payload);
            tracker.capture_message(&message, None);
            Err(DbError::Panic(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_pool() -> Option<PgPool> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        PgPoolOptions::new().max_connections(2).connect_lazy(&url).ok()
    }

    #[tokio::test]
    async fn transaction_commits_on_ok() {
        let Some(pool) = test_pool() else { return };
        let tracker = ErrorTracker::disabled();
        let out = with_transaction(&pool, &tracker, |tx| {
            Box::pin(async move {
                let row: (i32,) = sqlx::query_as("SELECT 1").fetch_one(&mut **tx).await?;
                Ok(row.0)
            })
        })
        .await
        .unwrap();
        assert_eq!(out, 1);
    }

    #[tokio::test]
    async fn transaction_maps_panic_to_error() {
        let Some(pool) = test_pool() else { return };
        let tracker = ErrorTracker::disabled();
        let out: Result<(), _> = with_transaction(&pool, &tracker, |_tx| {
            Box::pin(async move { panic!("boom in tx") })
        })
        .await;
        match out {
            Err(DbError::Panic(message)) => assert!(message.contains("boom in tx")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn panic_while_building_the_future_is_converted_too() {
        let Some(pool) = test_pool() else { return };
        let tracker = ErrorTracker::disabled();
        let out: Result<(), _> =
            with_transaction(&pool, &tracker, |_tx| panic!("boom before poll")).await;
        match out {
            Err(DbError::Panic(message)) => assert!(message.contains("boom before poll")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
