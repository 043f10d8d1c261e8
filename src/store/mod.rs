//! Storage backends for the permission collections.
use crate::model::record::{PermissionCollection, PermissionRecord};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Backing store for the three permission collections.
///
/// The migrator is the sole writer to the `permissions` column for the
/// duration of a run; any surrounding transactional envelope is the caller's
/// responsibility.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Load every record of a collection.
    async fn load_records(
        &self,
        collection: PermissionCollection,
    ) -> StoreResult<Vec<PermissionRecord>>;

    /// Bulk insert-or-update keyed by record id, overwriting only the
    /// `permissions` column. Atomic per collection.
    async fn upsert_permissions(
        &self,
        collection: PermissionCollection,
        records: Vec<PermissionRecord>,
    ) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
