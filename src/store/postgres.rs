//! Postgres-backed implementation of the permission store.
//!
//! # What this module is
//! Implements [`PermissionStore`] using Postgres (via `sqlx`) against the
//! authoritative permission tables. Each collection maps to one table with at
//! least an `id` primary key and a `permissions` JSONB column holding the
//! packed rule set.
//!
//! # Key invariants
//! - Reads are full scans of one collection; writes touch only `permissions`.
//! - A collection's upsert batch runs inside a single transaction, so a
//!   collection is either fully rewritten or untouched. There is no
//!   transaction spanning collections; re-running after a mid-run failure is
//!   safe because the rewrite is idempotent.
//!
//! # Operational notes
//! - Embedded migrations run at connect time via `sqlx::migrate!` so the
//!   schema exists before the first query.
//! - Connection pooling and acquire timeouts are explicitly configured;
//!   hanging forever on a dead database is worse than failing the run.
//! - Database URLs may contain credentials; avoid logging them.
use super::{PermissionStore, StoreResult};
use crate::config::PostgresConfig;
use crate::model::record::{PermissionCollection, PermissionRecord};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Durable permission store backed by Postgres.
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the permission tables.
///
/// Kept separate from [`PermissionRecord`] so schema details stay localized
/// to this module, mirroring the domain/DB split used elsewhere in the
/// platform's stores.
#[derive(Debug, Clone, FromRow)]
struct DbPermissionRow {
    id: Uuid,
    permissions: Option<Value>,
}

impl PostgresStore {
    /// Connect to Postgres and run the embedded schema migrations.
    ///
    /// # Errors
    /// - Connection, pool setup, or migration failures.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;

        // Schema must exist before the first scan; fail the run otherwise.
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(anyhow::Error::new)?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl PermissionStore for PostgresStore {
    async fn load_records(
        &self,
        collection: PermissionCollection,
    ) -> StoreResult<Vec<PermissionRecord>> {
        // NOTE: `format!` injects the table name. This is safe here because
        // `table_name()` maps a closed enum to hard-coded identifiers. Do NOT
        // pass user input into this format string.
        let query = format!(
            "SELECT id, permissions FROM {} ORDER BY id",
            collection.table_name()
        );
        let rows: Vec<DbPermissionRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| PermissionRecord {
                id: row.id,
                permissions: row.permissions,
            })
            .collect())
    }

    async fn upsert_permissions(
        &self,
        collection: PermissionCollection,
        records: Vec<PermissionRecord>,
    ) -> StoreResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        // One transaction per collection: the staged batch lands atomically
        // or not at all.
        let mut tx = self.pool.begin().await?;
        let query = format!(
            "INSERT INTO {} (id, permissions) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET permissions = EXCLUDED.permissions",
            collection.table_name()
        );
        for record in &records {
            sqlx::query(&query)
                .bind(record.id)
                .bind(&record.permissions)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
