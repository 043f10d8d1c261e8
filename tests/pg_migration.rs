#![cfg(feature = "pg-tests")]
//! Postgres end-to-end migration test.
//!
//! Requires a reachable database; set `LOCKBOX_MIGRATE_TEST_POSTGRES_URL` (or
//! `DATABASE_URL`). The test skips itself when no database is configured.
use lockbox_migrate::config::PostgresConfig;
use lockbox_migrate::migrate;
use lockbox_migrate::model::record::PermissionCollection;
use lockbox_migrate::store::PermissionStore;
use lockbox_migrate::store::postgres::PostgresStore;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

async fn pg_store() -> Option<(PostgresStore, sqlx::PgPool)> {
    let url = match std::env::var("LOCKBOX_MIGRATE_TEST_POSTGRES_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "skipping pg-tests: set LOCKBOX_MIGRATE_TEST_POSTGRES_URL or DATABASE_URL"
            );
            return None;
        }
    };
    let store = match PostgresStore::connect(&PostgresConfig {
        url: url.clone(),
        max_connections: 5,
        acquire_timeout_ms: 5_000,
    })
    .await
    {
        Ok(store) => store,
        Err(err) => {
            eprintln!("skipping pg-tests: cannot connect to postgres: {err}");
            return None;
        }
    };
    let pool = match PgPoolOptions::new().max_connections(2).connect(&url).await {
        Ok(pool) => pool,
        Err(err) => {
            eprintln!("skipping pg-tests: cannot open helper pool: {err}");
            return None;
        }
    };
    if let Err(err) = sqlx::query(
        "TRUNCATE project_roles, identity_additional_privileges, user_additional_privileges",
    )
    .execute(&pool)
    .await
    {
        eprintln!("skipping pg-tests: cannot reset tables: {err}");
        return None;
    }
    Some((store, pool))
}

async fn insert_role(pool: &sqlx::PgPool, slug: &str, permissions: Option<Value>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO project_roles (id, project_id, name, slug, permissions) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind("project-1")
    .bind(slug)
    .bind(slug)
    .bind(permissions)
    .execute(pool)
    .await
    .expect("insert role");
    id
}

async fn insert_user_privilege(pool: &sqlx::PgPool, permissions: Option<Value>) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO user_additional_privileges (id, user_id, project_id, slug, permissions) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(id)
    .bind("user-1")
    .bind("project-1")
    .bind("extra-access")
    .bind(permissions)
    .execute(pool)
    .await
    .expect("insert user privilege");
    id
}

async fn role_row(pool: &sqlx::PgPool, id: Uuid) -> (String, Option<Value>) {
    sqlx::query_as("SELECT name, permissions FROM project_roles WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("fetch role")
}

#[tokio::test]
async fn up_rewrites_only_secrets_read_grants_and_leaves_other_columns() {
    let Some((store, pool)) = pg_store().await else {
        return;
    };

    let secrets_role = insert_role(&pool, "viewer", Some(json!([["read", "secrets"]]))).await;
    let folders_role = insert_role(&pool, "browser", Some(json!([["list", "folders"]]))).await;
    let empty_role = insert_role(&pool, "blank", None).await;
    let privilege = insert_user_privilege(
        &pool,
        Some(json!([["read,edit", "secrets", { "environment": "prod" }]])),
    )
    .await;

    let report = migrate::up(&store).await.expect("up");
    assert_eq!(report.project_roles, 1);
    assert_eq!(report.identity_privileges, 0);
    assert_eq!(report.user_privileges, 1);

    let (name, permissions) = role_row(&pool, secrets_role).await;
    assert_eq!(name, "viewer");
    assert_eq!(permissions, Some(json!([["read,readValue", "secrets"]])));

    let (_, permissions) = role_row(&pool, folders_role).await;
    assert_eq!(permissions, Some(json!([["list", "folders"]])));
    let (_, permissions) = role_row(&pool, empty_role).await;
    assert_eq!(permissions, None);

    let records = store
        .load_records(PermissionCollection::UserPrivileges)
        .await
        .expect("load privileges");
    let record = records
        .iter()
        .find(|record| record.id == privilege)
        .expect("privilege present");
    assert_eq!(
        record.permissions,
        Some(json!([["read,edit,readValue", "secrets", { "environment": "prod" }]]))
    );

    // Second pass stages nothing; down restores the original grants.
    let report = migrate::up(&store).await.expect("second up");
    assert_eq!(report.total(), 0);

    let report = migrate::down(&store).await.expect("down");
    assert_eq!(report.total(), 2);
    let (_, permissions) = role_row(&pool, secrets_role).await;
    assert_eq!(permissions, Some(json!([["read", "secrets"]])));
}
