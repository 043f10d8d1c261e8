//! Batch transformation of the permission collections.
//!
//! # Purpose
//! Drives the readValue rewrite across the three permission collections:
//! load all records, decode each packed rule set, apply the directional
//! rewrite, and bulk-upsert only the records whose rule set changed.
//!
//! # Failure semantics
//! A decode or store failure aborts the run immediately. Collections are
//! processed independently with no cross-collection transaction, so a failure
//! leaves earlier collections updated and later ones untouched. Re-running is
//! safe: both directions are idempotent, and the second pass stages nothing
//! for records already rewritten.
use crate::model::record::{PermissionCollection, PermissionRecord};
use crate::packed::{self, DecodeError};
use crate::store::{PermissionStore, StoreError};
use thiserror::Error;
use uuid::Uuid;

pub mod rewrite;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("decode permissions of {collection} record {id}")]
    Decode {
        collection: PermissionCollection,
        id: Uuid,
        #[source]
        source: DecodeError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Direction of a migration pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

/// Per-collection counts of records staged and rewritten by a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub project_roles: usize,
    pub identity_privileges: usize,
    pub user_privileges: usize,
}

impl MigrationReport {
    pub fn total(&self) -> usize {
        self.project_roles + self.identity_privileges + self.user_privileges
    }

    fn record(&mut self, collection: PermissionCollection, staged: usize) {
        match collection {
            PermissionCollection::ProjectRoles => self.project_roles = staged,
            PermissionCollection::IdentityPrivileges => self.identity_privileges = staged,
            PermissionCollection::UserPrivileges => self.user_privileges = staged,
        }
    }
}

/// Apply the forward rewrite across all three collections.
pub async fn up(store: &dyn PermissionStore) -> Result<MigrationReport, MigrateError> {
    run(store, Direction::Up).await
}

/// Apply the reverse rewrite across all three collections.
pub async fn down(store: &dyn PermissionStore) -> Result<MigrationReport, MigrateError> {
    run(store, Direction::Down).await
}

async fn run(
    store: &dyn PermissionStore,
    direction: Direction,
) -> Result<MigrationReport, MigrateError> {
    let mut report = MigrationReport::default();
    for collection in PermissionCollection::ALL {
        let records = store.load_records(collection).await?;
        let scanned = records.len();
        let mut staged = Vec::new();
        for record in records {
            if let Some(rewritten) = rewrite_record(collection, record, direction)? {
                staged.push(rewritten);
            }
        }
        let staged_count = staged.len();
        if !staged.is_empty() {
            store.upsert_permissions(collection, staged).await?;
        }
        tracing::info!(
            collection = %collection,
            direction = direction.as_str(),
            scanned,
            staged = staged_count,
            "collection processed"
        );
        report.record(collection, staged_count);
    }
    Ok(report)
}

/// Decode, rewrite, and re-encode one record. Returns `None` when no rule in
/// the record changed, which keeps the record out of the write-back batch.
fn rewrite_record(
    collection: PermissionCollection,
    record: PermissionRecord,
    direction: Direction,
) -> Result<Option<PermissionRecord>, MigrateError> {
    let rules = packed::unpack_rules(record.permissions.as_ref()).map_err(|source| {
        MigrateError::Decode {
            collection,
            id: record.id,
            source,
        }
    })?;
    let (rules, changed) = match direction {
        Direction::Up => rewrite::upgrade_rules(rules),
        Direction::Down => rewrite::downgrade_rules(rules),
    };
    if !changed {
        return Ok(None);
    }
    Ok(Some(PermissionRecord {
        id: record.id,
        permissions: Some(packed::pack_rules(&rules)),
    }))
}
