use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::document::{DocumentFormat, DocumentKind, GeneratedDocument, PartyRecord};

/// Lifecycle of an issued document. Only status changes after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Gerado,
    Enviado,
    Assinado,
    Cancelado,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gerado => "gerado",
            Self::Enviado => "enviado",
            Self::Assinado => "assinado",
            Self::Cancelado => "cancelado",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gerado" => Some(Self::Gerado),
            "enviado" => Some(Self::Enviado),
            "assinado" => Some(Self::Assinado),
            "cancelado" => Some(Self::Cancelado),
            _ => None,
        }
    }
}

/// Registry entry without the file bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DocumentSummary {
    pub id: Uuid,
    #[serde(rename = "tipo")]
    pub kind: DocumentKind,
    #[serde(rename = "formato")]
    pub format: DocumentFormat,
    #[serde(rename = "codigoVerificacao")]
    pub verification_code: String,
    #[serde(rename = "nome")]
    pub grantor_name: String,
    #[serde(rename = "cpf")]
    pub grantor_tax_id: String,
    #[serde(rename = "arquivo")]
    pub filename: String,
    #[serde(rename = "emitidoEm")]
    pub issued_on: NaiveDate,
    pub status: DocumentStatus,
    #[serde(rename = "criadoEm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "atualizadoEm")]
    pub updated_at: DateTime<Utc>,
}

/// Registry entry with the rendered file.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    pub summary: DocumentSummary,
    pub bytes: Vec<u8>,
}

/// Data recorded for a freshly generated document.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub format: DocumentFormat,
    pub verification_code: String,
    pub grantor_name: String,
    pub grantor_tax_id: String,
    pub filename: String,
    pub issued_on: NaiveDate,
    pub bytes: Vec<u8>,
}

impl NewDocument {
    pub fn from_generated(record: &PartyRecord, document: &GeneratedDocument) -> Self {
        Self {
            kind: document.kind,
            format: document.format,
            verification_code: document.verification_code.to_string(),
            grantor_name: record.name.trim().to_string(),
            grantor_tax_id: record.tax_id.trim().to_string(),
            filename: document.filename.clone(),
            issued_on: document.issued_on,
            bytes: document.bytes.clone(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: DocumentStatus,
}
