//! PostgreSQL-backed document registry.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::document::{DocumentFormat, DocumentKind};
use crate::registry::{
    DocumentRepository, DocumentStatus, DocumentSummary, NewDocument, RepositoryError,
    StoredDocument,
};

const SUMMARY_COLUMNS: &str = "id, tipo, formato, codigo_verificacao, nome, cpf, arquivo, emitido_em, status, criado_em, atualizado_em";

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    tipo: String,
    formato: String,
    codigo_verificacao: String,
    nome: String,
    cpf: String,
    arquivo: String,
    emitido_em: NaiveDate,
    status: String,
    criado_em: DateTime<Utc>,
    atualizado_em: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct StoredRow {
    #[sqlx(flatten)]
    summary: DocumentRow,
    conteudo: Vec<u8>,
}

impl TryFrom<DocumentRow> for DocumentSummary {
    type Error = RepositoryError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let invalid = |column: &str, value: &str| {
            RepositoryError::InvalidRow(format!("{} has unknown value '{}'", column, value))
        };
        Ok(Self {
            id: row.id,
            kind: DocumentKind::from_str(&row.tipo).ok_or_else(|| invalid("tipo", &row.tipo))?,
            format: DocumentFormat::from_str(&row.formato)
                .ok_or_else(|| invalid("formato", &row.formato))?,
            status: DocumentStatus::from_str(&row.status)
                .ok_or_else(|| invalid("status", &row.status))?,
            verification_code: row.codigo_verificacao,
            grantor_name: row.nome,
            grantor_tax_id: row.cpf,
            filename: row.arquivo,
            issued_on: row.emitido_em,
            created_at: row.criado_em,
            updated_at: row.atualizado_em,
        })
    }
}

pub struct PostgresDocumentRepository {
    pool: PgPool,
}

impl PostgresDocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl DocumentRepository for PostgresDocumentRepository {
    async fn list(&self) -> Result<Vec<DocumentSummary>, RepositoryError> {
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM documentos ORDER BY criado_em DESC",
            SUMMARY_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DocumentSummary::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> Result<Option<StoredDocument>, RepositoryError> {
        let row: Option<StoredRow> = sqlx::query_as(&format!(
            "SELECT {}, conteudo FROM documentos WHERE id = $1",
            SUMMARY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| -> Result<StoredDocument, RepositoryError> {
            Ok(StoredDocument {
                summary: row.summary.try_into()?,
                bytes: row.conteudo,
            })
        })
        .transpose()
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<DocumentSummary>, RepositoryError> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM documentos WHERE codigo_verificacao = $1",
            SUMMARY_COLUMNS
        ))
        .bind(code.trim().to_ascii_uppercase())
        .fetch_optional(&self.pool)
        .await?;
        row.map(DocumentSummary::try_from).transpose()
    }

    async fn create(&self, document: NewDocument) -> Result<DocumentSummary, RepositoryError> {
        let row: DocumentRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO documentos (id, tipo, formato, codigo_verificacao, nome, cpf, arquivo, emitido_em, status, conteudo)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            SUMMARY_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(document.kind.as_str())
        .bind(document.format.as_str())
        .bind(&document.verification_code)
        .bind(&document.grantor_name)
        .bind(&document.grantor_tax_id)
        .bind(&document.filename)
        .bind(document.issued_on)
        .bind(DocumentStatus::Gerado.as_str())
        .bind(&document.bytes)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: DocumentStatus,
    ) -> Result<Option<DocumentSummary>, RepositoryError> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "UPDATE documentos SET status = $1, atualizado_em = NOW() WHERE id = $2 RETURNING {}",
            SUMMARY_COLUMNS
        ))
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DocumentSummary::try_from).transpose()
    }
}
