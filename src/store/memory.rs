//! In-memory implementation of the permission store.
//!
//! # Purpose
//! Implements [`PermissionStore`] entirely in memory using `HashMap`s guarded
//! by `tokio::sync::RwLock`. It exists for:
//! - local development and tests (no external dependencies)
//! - dry-running a migration against seeded data
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process exit.
//! - Upserts take one write lock per collection, so a collection's batch is
//!   applied atomically with respect to concurrent readers, matching the
//!   per-collection transaction the durable backend uses.
use super::{PermissionStore, StoreResult};
use crate::model::record::{PermissionCollection, PermissionRecord};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory permission store.
///
/// Records are keyed by id; only the packed rule set is stored, which is the
/// entire projection the migrator touches.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    project_roles: RwLock<HashMap<Uuid, Option<Value>>>,
    identity_privileges: RwLock<HashMap<Uuid, Option<Value>>>,
    user_privileges: RwLock<HashMap<Uuid, Option<Value>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, collection: PermissionCollection) -> &RwLock<HashMap<Uuid, Option<Value>>> {
        match collection {
            PermissionCollection::ProjectRoles => &self.project_roles,
            PermissionCollection::IdentityPrivileges => &self.identity_privileges,
            PermissionCollection::UserPrivileges => &self.user_privileges,
        }
    }

    /// Seed a record into a collection, replacing any record with the same id.
    pub async fn insert_record(&self, collection: PermissionCollection, record: PermissionRecord) {
        self.table(collection)
            .write()
            .await
            .insert(record.id, record.permissions);
    }

    /// Fetch a single record by id.
    pub async fn get_record(
        &self,
        collection: PermissionCollection,
        id: Uuid,
    ) -> Option<PermissionRecord> {
        self.table(collection)
            .read()
            .await
            .get(&id)
            .map(|permissions| PermissionRecord {
                id,
                permissions: permissions.clone(),
            })
    }

    pub async fn record_count(&self, collection: PermissionCollection) -> usize {
        self.table(collection).read().await.len()
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn load_records(
        &self,
        collection: PermissionCollection,
    ) -> StoreResult<Vec<PermissionRecord>> {
        let guard = self.table(collection).read().await;
        let mut records: Vec<PermissionRecord> = guard
            .iter()
            .map(|(id, permissions)| PermissionRecord {
                id: *id,
                permissions: permissions.clone(),
            })
            .collect();
        // Deterministic order keeps runs and test assertions stable.
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn upsert_permissions(
        &self,
        collection: PermissionCollection,
        records: Vec<PermissionRecord>,
    ) -> StoreResult<()> {
        let mut guard = self.table(collection).write().await;
        for record in records {
            guard.insert(record.id, record.permissions);
        }
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn load_records_returns_sorted_ids() {
        let store = InMemoryStore::new();
        for _ in 0..8 {
            store
                .insert_record(
                    PermissionCollection::ProjectRoles,
                    PermissionRecord {
                        id: Uuid::new_v4(),
                        permissions: None,
                    },
                )
                .await;
        }
        let records = store
            .load_records(PermissionCollection::ProjectRoles)
            .await
            .expect("load");
        assert_eq!(records.len(), 8);
        assert!(records.windows(2).all(|pair| pair[0].id < pair[1].id));
    }

    #[tokio::test]
    async fn upsert_overwrites_permissions_by_id() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert_record(
                PermissionCollection::UserPrivileges,
                PermissionRecord {
                    id,
                    permissions: Some(json!([["read", "secrets"]])),
                },
            )
            .await;

        store
            .upsert_permissions(
                PermissionCollection::UserPrivileges,
                vec![PermissionRecord {
                    id,
                    permissions: Some(json!([["read,readValue", "secrets"]])),
                }],
            )
            .await
            .expect("upsert");

        let record = store
            .get_record(PermissionCollection::UserPrivileges, id)
            .await
            .expect("record");
        assert_eq!(record.permissions, Some(json!([["read,readValue", "secrets"]])));
        assert_eq!(store.record_count(PermissionCollection::UserPrivileges).await, 1);
    }

    #[tokio::test]
    async fn collections_are_independent() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store
            .insert_record(
                PermissionCollection::ProjectRoles,
                PermissionRecord {
                    id,
                    permissions: None,
                },
            )
            .await;
        assert!(
            store
                .get_record(PermissionCollection::IdentityPrivileges, id)
                .await
                .is_none()
        );
        assert_eq!(store.backend_name(), "memory");
        assert!(!store.is_durable());
        store.health_check().await.expect("healthy");
    }
}
