// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Budgeting API Contributors

//! Typed data-access helper.
//!
//! [`Dao`] gives each entity type the same operation set: create, save,
//! delete, first, find and count, all against an explicit transaction so
//! callers decide the transaction boundary. [`QuerySpec`] carries filters
//! (`?` placeholders, rewritten to `$n` bindings), relation preloads,
//! ordering, row locking and pagination.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};

use crate::middleware::Paging;

use super::DbError;

/// A bindable query argument.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl SqlValue {
    fn push_bind(self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self {
            SqlValue::Int(v) => qb.push_bind(v),
            SqlValue::Float(v) => qb.push_bind(v),
            SqlValue::Text(v) => qb.push_bind(v),
            SqlValue::Bool(v) => qb.push_bind(v),
            SqlValue::Null => qb.push_bind(Option::<i64>::None),
        };
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v.into())
    }
}

impl From<u64> for SqlValue {
    fn from(v: u64) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

/// A persistable record type.
#[async_trait]
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin + Sized {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str = "id";

    fn id_value(&self) -> i64;
    fn insert_columns() -> &'static [&'static str];
    fn insert_values(&self) -> Vec<SqlValue>;

    /// Loads one named relation onto the entity. The default knows none.
    async fn load_relation(
        &mut self,
        relation: &str,
        _tx: &mut Transaction<'static, Postgres>,
    ) -> Result<(), DbError> {
        Err(DbError::UnknownRelation(relation.to_string()))
    }
}

/// Declarative query description consumed by [`Dao`] lookups.
#[derive(Debug, Default, Clone)]
pub struct QuerySpec {
    filters: Vec<(String, Vec<SqlValue>)>,
    preloads: Vec<String>,
    orders: Vec<String>,
    for_update: bool,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a conjunctive filter. `expr` uses `?` per argument.
    pub fn filter(mut self, expr: impl Into<String>, args: Vec<SqlValue>) -> Self {
        self.filters.push((expr.into(), args));
        self
    }

    pub fn preload(mut self, relation: impl Into<String>) -> Self {
        self.preloads.push(relation.into());
        self
    }

    pub fn order(mut self, expr: impl Into<String>) -> Self {
        self.orders.push(expr.into());
        self
    }

    /// Locks matched rows for the enclosing transaction.
    pub fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn paged(mut self, paging: &Paging) -> Self {
        self.limit = Some(paging.limit as i64);
        self.offset = Some(paging.offset() as i64);
        self
    }

    fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) -> Result<(), DbError> {
        if self.filters.is_empty() {
            return Ok(());
        }
        qb.push(" WHERE ");
        for (i, (expr, args)) in self.filters.iter().enumerate() {
            let placeholders = expr.matches('?').count();
            if placeholders != args.len() {
                return Err(DbError::FilterArity(expr.clone()));
            }
            if i > 0 {
                qb.push(" AND ");
            }
            qb.push("(");
            let mut parts = expr.split('?');
            if let Some(first) = parts.next() {
                qb.push(first);
            }
            for (part, arg) in parts.zip(args.iter().cloned()) {
                arg.push_bind(qb);
                qb.push(part);
            }
            qb.push(")");
        }
        Ok(())
    }

    fn build_select(&self, table: &str) -> Result<QueryBuilder<'static, Postgres>, DbError> {
        let mut qb = QueryBuilder::new("SELECT * FROM ");
        qb.push(table);
        self.push_where(&mut qb)?;
        if !self.orders.is_empty() {
            qb.push(" ORDER BY ");
            qb.push(self.orders.join(", "));
        }
        if let Some(limit) = self.limit {
            qb.push(" LIMIT ");
            qb.push_bind(limit);
        }
        if let Some(offset) = self.offset {
            qb.push(" OFFSET ");
            qb.push_bind(offset);
        }
        if self.for_update {
            qb.push(" FOR UPDATE");
        }
        Ok(qb)
    }

    fn build_count(&self, table: &str) -> Result<QueryBuilder<'static, Postgres>, DbError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
        qb.push(table);
        self.push_where(&mut qb)?;
        Ok(qb)
    }
}

/// Shared per-entity access helper. Cheap to clone; all lookups run on the
/// transaction handed in by the caller.
pub struct Dao<T: Entity> {
    pool: PgPool,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Clone for Dao<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> Dao<T> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn create(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        entity: &T,
    ) -> Result<(), DbError> {
        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(T::TABLE);
        qb.push(" (");
        qb.push(T::insert_columns().join(", "));
        qb.push(") VALUES (");
        let mut first = true;
        for value in entity.insert_values() {
            if !first {
                qb.push(", ");
            }
            first = false;
            value.push_bind(&mut qb);
        }
        qb.push(")");
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// Inserts, or updates every insert column when the id already exists.
    pub async fn save(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        entity: &T,
    ) -> Result<(), DbError> {
        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(T::TABLE);
        qb.push(" (");
        qb.push(T::insert_columns().join(", "));
        qb.push(") VALUES (");
        let mut first = true;
        for value in entity.insert_values() {
            if !first {
                qb.push(", ");
            }
            first = false;
            value.push_bind(&mut qb);
        }
        qb.push(") ON CONFLICT (");
        qb.push(T::ID_COLUMN);
        qb.push(") DO UPDATE SET ");
        for (i, column) in T::insert_columns().iter().enumerate() {
            if i > 0 {
                qb.push(", ");
            }
            qb.push(*column);
            qb.push(" = EXCLUDED.");
            qb.push(*column);
        }
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    pub async fn delete(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        entity: &T,
    ) -> Result<(), DbError> {
        let mut qb = QueryBuilder::new("DELETE FROM ");
        qb.push(T::TABLE);
        qb.push(" WHERE ");
        qb.push(T::ID_COLUMN);
        qb.push(" = ");
        qb.push_bind(entity.id_value());
        qb.build().execute(&mut **tx).await?;
        Ok(())
    }

    /// First matching row, or `None`.
    pub async fn first(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        spec: &QuerySpec,
    ) -> Result<Option<T>, DbError> {
        let narrowed = spec.clone().limit(1);
        let mut qb = narrowed.build_select(T::TABLE)?;
        let row = qb.build().fetch_optional(&mut **tx).await?;
        let Some(row) = row else { return Ok(None) };
        let mut entity = T::from_row(&row)?;
        for relation in &spec.preloads {
            entity.load_relation(relation, tx).await?;
        }
        Ok(Some(entity))
    }

    pub async fn find(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        spec: &QuerySpec,
    ) -> Result<Vec<T>, DbError> {
        let mut qb = spec.build_select(T::TABLE)?;
        let rows = qb.build().fetch_all(&mut **tx).await?;
        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            entities.push(T::from_row(&row)?);
        }
        for entity in &mut entities {
            for relation in &spec.preloads {
                entity.load_relation(relation, tx).await?;
            }
        }
        Ok(entities)
    }

    pub async fn count(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        spec: &QuerySpec,
    ) -> Result<u64, DbError> {
        let mut qb = spec.build_count(T::TABLE)?;
        let row: (i64,) = qb.build_query_as().fetch_one(&mut **tx).await?;
        Ok(row.0 as u64)
    }
}
