use std::sync::Arc;

use anyhow::Context;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::{info, warn};

use crate::{
    ai::{
        extract::{DocumentExtractor, TextExtractor},
        summarize::{ChatCompletionsSummarizer, DisabledSummarizer, Summarizer},
    },
    config::{AppConfig, StorageBackendKind, StoreBackendKind},
    error::AppError,
    storage::{LocalStorage, Storage, StorageClient},
    store::{postgres::PgBackend, StoreRegistry, UnitOfWork},
};

#[derive(Clone)]
pub struct AppState {
    pub registry: StoreRegistry,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub extractor: Arc<dyn TextExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let registry = match config.store_backend {
            StoreBackendKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                let backend = PgBackend::connect(url, config.db_max_connections)
                    .await
                    .context("connecting to postgres")?;
                sqlx::migrate!("./migrations")
                    .run(backend.pool())
                    .await
                    .context("running migrations")?;
                StoreRegistry::new(Arc::new(backend))
            }
            StoreBackendKind::Memory => {
                warn!("in-memory store selected, data is lost on restart");
                StoreRegistry::memory()
            }
        };

        let storage: Arc<dyn StorageClient> = match config.storage_backend {
            StorageBackendKind::Local => Arc::new(LocalStorage::new(config.upload_dir.clone())),
            StorageBackendKind::S3 => {
                let s3 = config.s3.as_ref().context("MINIO_* settings are missing")?;
                Arc::new(Storage::new(s3).await.context("configuring S3 client")?)
            }
        };

        let summarizer: Arc<dyn Summarizer> = match &config.llm.api_key {
            Some(key) => Arc::new(ChatCompletionsSummarizer::new(&config.llm, key.clone())?),
            None => {
                warn!("LLM_API_KEY not set, AI endpoints will answer 502");
                Arc::new(DisabledSummarizer)
            }
        };

        info!(
            store = registry.backend_name(),
            storage = ?config.storage_backend,
            model = %config.llm.model,
            "application state ready"
        );

        Ok(Self {
            registry,
            config,
            storage,
            extractor: Arc::new(DocumentExtractor::default()),
            summarizer,
        })
    }

    /// In-memory store, object storage and scripted summarizer.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{ai::summarize::ScriptedSummarizer, storage::InMemoryStorage};

        let config = AppConfig::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".into()),
            "JWT_SECRET" => Some("test-secret".into()),
            "JWT_ISSUER" => Some("test".into()),
            "JWT_AUDIENCE" => Some("test".into()),
            _ => None,
        })
        .expect("test config");

        Self {
            registry: StoreRegistry::memory(),
            config: Arc::new(config),
            storage: Arc::new(InMemoryStorage::default()),
            extractor: Arc::new(DocumentExtractor::default()),
            summarizer: Arc::new(ScriptedSummarizer::default()),
        }
    }
}

/// Each request gets its own unit of work.
#[async_trait]
impl FromRequestParts<AppState> for UnitOfWork {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(state.registry.begin().await?)
    }
}
