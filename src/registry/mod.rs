//! Registry of issued documents.
//!
//! Every generated file is recorded under its verification code so it can be
//! looked up later. Two backends implement [`DocumentRepository`]: PostgreSQL
//! (`crate::db::postgres`) and the bounded in-memory store below.

pub mod model;

use async_trait::async_trait;
use chrono::Utc;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use thiserror::Error;
use uuid::Uuid;

pub use model::{
    DocumentStatus, DocumentSummary, NewDocument, StoredDocument, UpdateStatusRequest,
};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored row is invalid: {0}")]
    InvalidRow(String),
}

#[async_trait]
pub trait DocumentRepository {
    /// All documents, newest first.
    async fn list(&self) -> Result<Vec<DocumentSummary>, RepositoryError>;

    async fn get(&self, id: Uuid) -> Result<Option<StoredDocument>, RepositoryError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<DocumentSummary>, RepositoryError>;

    async fn create(&self, document: NewDocument) -> Result<DocumentSummary, RepositoryError>;

    /// Returns `None` when no document has this id.
    async fn update_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<DocumentSummary>, RepositoryError>;
}

/// Per-entry overhead charged on top of the file bytes.
const ENTRY_OVERHEAD_BYTES: usize = 512;
const MAX_INDEXED_CODES: u64 = 100_000;
pub const DEFAULT_MEMORY_BUDGET_BYTES: u64 = 256 * 1024 * 1024;

fn entry_weight(_id: &Uuid, document: &StoredDocument) -> u32 {
    u32::try_from(document.bytes.len() + ENTRY_OVERHEAD_BYTES).unwrap_or(u32::MAX)
}

fn code_key(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Process-local registry; contents are lost on restart.
///
/// The file bytes held are bounded by a byte budget and the least recently
/// used documents are evicted first. An evicted code no longer verifies.
pub struct InMemoryDocumentRepository {
    documents: Cache<Uuid, StoredDocument>,
    codes: Cache<String, Uuid>,
}

impl Default for InMemoryDocumentRepository {
    fn default() -> Self {
        Self::with_budget(DEFAULT_MEMORY_BUDGET_BYTES)
    }
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(max_bytes: u64) -> Self {
        let documents = Cache::builder()
            .eviction_policy(EvictionPolicy::lru())
            .weigher(entry_weight)
            .max_capacity(max_bytes)
            .build();
        let codes = Cache::builder()
            .eviction_policy(EvictionPolicy::lru())
            .max_capacity(MAX_INDEXED_CODES)
            .build();
        Self { documents, codes }
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn list(&self) -> Result<Vec<DocumentSummary>, RepositoryError> {
        let mut summaries: Vec<DocumentSummary> = self
            .documents
            .iter()
            .map(|(_, document)| document.summary)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredDocument>, RepositoryError> {
        Ok(self.documents.get(&id).await)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<DocumentSummary>, RepositoryError> {
        let key = code_key(code);
        let Some(id) = self.codes.get(&key).await else {
            return Ok(None);
        };
        match self.documents.get(&id).await {
            Some(document) => Ok(Some(document.summary)),
            None => {
                self.codes.invalidate(&key).await;
                Ok(None)
            }
        }
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentSummary, RepositoryError> {
        let now = Utc::now();
        let summary = DocumentSummary {
            id: Uuid::new_v4(),
            kind: document.kind,
            format: document.format,
            verification_code: document.verification_code,
            grantor_name: document.grantor_name,
            grantor_tax_id: document.grantor_tax_id,
            filename: document.filename,
            issued_on: document.issued_on,
            status: DocumentStatus::Gerado,
            created_at: now,
            updated_at: now,
        };
        self.documents
            .insert(
                summary.id,
                StoredDocument {
                    summary: summary.clone(),
                    bytes: document.bytes,
                },
            )
            .await;
        self.codes
            .insert(code_key(&summary.verification_code), summary.id)
            .await;
        Ok(summary)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<DocumentSummary>, RepositoryError> {
        let Some(mut document) = self.documents.get(&id).await else {
            return Ok(None);
        };
        document.summary.status = status;
        document.summary.updated_at = Utc::now();
        let summary = document.summary.clone();
        self.documents.insert(id, document).await;
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{DocumentFormat, DocumentKind};
    use chrono::NaiveDate;

    fn new_document(code: &str, name: &str) -> NewDocument {
        NewDocument {
            kind: DocumentKind::Procuracao,
            format: DocumentFormat::Pdf,
            verification_code: code.to_string(),
            grantor_name: name.to_string(),
            grantor_tax_id: "123.456.789-00".to_string(),
            filename: format!("procuracao-{}.pdf", name.to_lowercase()),
            issued_on: NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(),
            bytes: b"%PDF-1.5".to_vec(),
        }
    }

    #[tokio::test]
    async fn test_create_then_lookup() {
        let repo = InMemoryDocumentRepository::new();
        let created = repo.create(new_document("ABCD-EFGH-JKMN", "Ana")).await.unwrap();
        assert_eq!(created.status, DocumentStatus::Gerado);

        let found = repo.find_by_code("abcd-efgh-jkmn").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);

        let stored = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(stored.bytes, b"%PDF-1.5".to_vec());
        assert!(repo.get(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let repo = InMemoryDocumentRepository::new();
        let first = repo.create(new_document("AAAA-AAAA-AAAA", "Ana")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.create(new_document("BBBB-BBBB-BBBB", "Bia")).await.unwrap();

        let ids: Vec<Uuid> = repo.list().await.unwrap().iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = InMemoryDocumentRepository::new();
        let created = repo.create(new_document("CCCC-CCCC-CCCC", "Caio")).await.unwrap();
        let updated = repo
            .update_status(created.id, DocumentStatus::Assinado)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, DocumentStatus::Assinado);
        assert!(updated.updated_at >= created.updated_at);
        assert!(repo
            .update_status(Uuid::new_v4(), DocumentStatus::Cancelado)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_memory_budget_evicts_least_recent_documents() {
        let budget = 3 * (1_000 + ENTRY_OVERHEAD_BYTES as u64);
        let repo = InMemoryDocumentRepository::with_budget(budget);
        let mut created = Vec::new();
        for i in 0..10 {
            let mut document = new_document(&format!("CODE-{:04}-AAAA", i), "Ana");
            document.bytes = vec![b'%'; 1_000];
            created.push(repo.create(document).await.unwrap());
            repo.documents.run_pending_tasks().await;
        }

        assert!(repo.documents.weighted_size() <= budget);
        assert!(repo.list().await.unwrap().len() <= 3);

        let newest = created.last().unwrap();
        assert!(repo.get(newest.id).await.unwrap().is_some());
        assert!(repo.find_by_code("CODE-0009-AAAA").await.unwrap().is_some());
        assert!(repo.get(created[0].id).await.unwrap().is_none());
        assert!(repo.find_by_code("CODE-0000-AAAA").await.unwrap().is_none());
    }
}
