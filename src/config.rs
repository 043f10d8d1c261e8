use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;

// Migration runner configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct MigrateConfig {
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
struct MigrateConfigOverride {
    storage: Option<String>,
    postgres_url: Option<String>,
    postgres_max_connections: Option<u32>,
    postgres_acquire_timeout_ms: Option<u64>,
}

impl MigrateConfig {
    pub fn from_env() -> Result<Self> {
        let storage = std::env::var("LOCKBOX_MIGRATE_STORAGE")
            .map(|value| parse_storage(&value))
            .unwrap_or(Ok(StorageBackend::Postgres))?;
        let postgres = match std::env::var("LOCKBOX_MIGRATE_POSTGRES_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
        {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("LOCKBOX_MIGRATE_PG_MAX_CONNECTIONS", 5)?,
                acquire_timeout_ms: env_parse("LOCKBOX_MIGRATE_PG_ACQUIRE_TIMEOUT_MS", 5_000)?,
            }),
            Err(_) => None,
        };
        Ok(Self { storage, postgres })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("LOCKBOX_MIGRATE_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read LOCKBOX_MIGRATE_CONFIG: {path}"))?;
            let override_cfg: MigrateConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse migrate config yaml")?;
            if let Some(value) = override_cfg.storage {
                config.storage = parse_storage(&value)?;
            }
            if let Some(url) = override_cfg.postgres_url {
                let postgres = config.postgres.get_or_insert_with(|| PostgresConfig {
                    url: String::new(),
                    max_connections: 5,
                    acquire_timeout_ms: 5_000,
                });
                postgres.url = url;
            }
            if let Some(postgres) = config.postgres.as_mut() {
                if let Some(value) = override_cfg.postgres_max_connections {
                    postgres.max_connections = value;
                }
                if let Some(value) = override_cfg.postgres_acquire_timeout_ms {
                    postgres.acquire_timeout_ms = value;
                }
            }
        }
        Ok(config)
    }
}

fn parse_storage(value: &str) -> Result<StorageBackend> {
    match value {
        "memory" => Ok(StorageBackend::Memory),
        "postgres" => Ok(StorageBackend::Postgres),
        other => bail!("unknown storage backend: {other}"),
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value.parse().with_context(|| format!("parse {key}")),
        Err(_) => Ok(default),
    }
}
