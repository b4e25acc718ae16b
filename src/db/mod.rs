//! Database module - AppState and registry backends
//!
//! - `postgres` - PostgreSQL implementation of the document registry

pub mod postgres;

use anyhow::Context;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::document::{DocumentRenderer, GeneratedDocument, PartyRecord};
use crate::registry::{
    DocumentRepository, DocumentStatus, DocumentSummary, InMemoryDocumentRepository,
    NewDocument, RepositoryError,
};
use postgres::PostgresDocumentRepository;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub renderer: Arc<DocumentRenderer>,
    pub documents: Arc<dyn DocumentRepository + Send + Sync>,
    /// Verification lookups keyed by normalized code.
    pub verification_cache: Cache<String, DocumentSummary>,
}

impl AppState {
    /// Build the state from configuration, connecting to PostgreSQL when a
    /// database URL is configured.
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let documents: Arc<dyn DocumentRepository + Send + Sync> = match &config.database_url {
            Some(database_url) => {
                let pool = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(20)
                    .min_connections(2)
                    .acquire_timeout(Duration::from_secs(30))
                    .idle_timeout(Duration::from_secs(900))
                    .max_lifetime(Duration::from_secs(1800))
                    .connect(database_url)
                    .await
                    .context("failed to connect to DATABASE_URL")?;
                let repository = PostgresDocumentRepository::new(pool);
                repository
                    .migrate()
                    .await
                    .context("failed to run database migrations")?;
                log::info!("document registry backed by PostgreSQL");
                Arc::new(repository)
            }
            None => {
                log::info!(
                    "document registry kept in memory, up to {} MiB of files",
                    config.memory_registry_bytes / (1024 * 1024)
                );
                Arc::new(InMemoryDocumentRepository::with_budget(
                    config.memory_registry_bytes,
                ))
            }
        };

        Ok(Self::new_with_repository(config, documents))
    }

    pub fn new_with_repository(
        config: AppConfig,
        documents: Arc<dyn DocumentRepository + Send + Sync>,
    ) -> Self {
        let renderer = DocumentRenderer::new(config.renderer_settings());
        let verification_cache = Cache::builder()
            .time_to_live(Duration::from_secs(10 * 60))
            .max_capacity(1_000)
            .build();

        Self {
            config: Arc::new(config),
            renderer: Arc::new(renderer),
            documents,
            verification_cache,
        }
    }

    /// Record a freshly generated document in the registry.
    pub async fn record_document(
        &self,
        record: &PartyRecord,
        document: &GeneratedDocument,
    ) -> Result<DocumentSummary, RepositoryError> {
        let summary = self
            .documents
            .create(NewDocument::from_generated(record, document))
            .await?;
        self.verification_cache
            .insert(summary.verification_code.clone(), summary.clone())
            .await;
        Ok(summary)
    }

    /// Look up a document by verification code, cache first.
    pub async fn find_by_code(
        &self,
        code: &str,
    ) -> Result<Option<DocumentSummary>, RepositoryError> {
        let key = code.trim().to_ascii_uppercase();
        if let Some(summary) = self.verification_cache.get(&key).await {
            log::debug!("verification cache hit for {}", key);
            return Ok(Some(summary));
        }

        let found = self.documents.find_by_code(&key).await?;
        if let Some(summary) = &found {
            self.verification_cache
                .insert(key, summary.clone())
                .await;
        }
        Ok(found)
    }

    pub async fn update_document_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<DocumentSummary>, RepositoryError> {
        let updated = self.documents.update_status(id, status).await?;
        if let Some(summary) = &updated {
            self.verification_cache
                .insert(summary.verification_code.clone(), summary.clone())
                .await;
        }
        Ok(updated)
    }
}
