// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{MemoryRecordStore, PgRecordStore, RecordStore},
    services::{
        catalog_service::CatalogService, classification_service::ClassificationService,
        entry_service::EntryService, workflow_service::EntryWorkflow,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub bind_addr: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let store_backend = match env::var("STORE_BACKEND").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("postgres") | Err(_) => StoreBackend::Postgres,
            Ok(other) => bail!("STORE_BACKEND inválido: '{}' (use 'postgres' ou 'memory')", other),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            bail!("DATABASE_URL deve ser definida");
        }

        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", 5)?;
        let acquire_secs = parse_or("DB_ACQUIRE_TIMEOUT_SECS", 3)?;
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            store_backend,
            database_url,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
            bind_addr,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} inválida: '{}'", key, raw)),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    /// Presente só no backend postgres (usado pelas migrações).
    pub db_pool: Option<PgPool>,
    pub catalog_service: CatalogService,
    pub entry_service: EntryService,
    pub classification_service: ClassificationService,
    pub workflow: EntryWorkflow,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let (db_pool, store): (Option<PgPool>, Arc<dyn RecordStore>) = match settings.store_backend {
            StoreBackend::Postgres => {
                let url = settings
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL deve ser definida")?;

                let pool = PgPoolOptions::new()
                    .max_connections(settings.db_max_connections)
                    .acquire_timeout(settings.db_acquire_timeout)
                    .connect(url)
                    .await?;

                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                (Some(pool.clone()), Arc::new(PgRecordStore::new(pool)))
            }
            StoreBackend::Memory => {
                tracing::warn!("Usando store em memória: os dados se perdem ao reiniciar.");
                (None, Arc::new(MemoryRecordStore::new()))
            }
        };

        // --- Monta o gráfico de dependências ---
        Ok(Self {
            db_pool,
            catalog_service: CatalogService::new(store.clone()),
            entry_service: EntryService::new(store.clone()),
            classification_service: ClassificationService::new(store.clone()),
            workflow: EntryWorkflow::new(store),
        })
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
        Self {
            db_pool: None,
            catalog_service: CatalogService::new(store.clone()),
            entry_service: EntryService::new(store.clone()),
            classification_service: ClassificationService::new(store.clone()),
            workflow: EntryWorkflow::new(store),
        }
    }
}
