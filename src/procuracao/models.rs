use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::document::{DocumentFormat, DocumentKind, PartyRecord, RenderOptions, WitnessRecord};
use crate::registry::DocumentStatus;

/// Form submission: the grantor record plus signature, photo and witnesses.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct GenerateDocumentRequest {
    #[serde(flatten)]
    pub record: PartyRecord,
    /// Signature as a `data:image/png;base64,...` URL.
    #[serde(rename = "assinatura", default)]
    pub signature: String,
    #[serde(rename = "foto", default)]
    pub photo: Option<String>,
    #[serde(rename = "testemunhas", default)]
    pub witnesses: Vec<WitnessRecord>,
    #[serde(rename = "tipo", default)]
    pub kind: DocumentKind,
    #[serde(rename = "formato", default)]
    pub format: DocumentFormat,
}

impl GenerateDocumentRequest {
    pub fn into_parts(self) -> (PartyRecord, RenderOptions) {
        let options = RenderOptions {
            format: self.format,
            kind: self.kind,
            witnesses: self.witnesses,
            signature: self.signature,
            photo: self.photo,
            verification_code: None,
            issued_on: None,
        };
        (self.record, options)
    }
}

/// Public answer to a verification lookup. Carries no file bytes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VerificationResponse {
    #[serde(rename = "valido")]
    pub valid: bool,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "tipo")]
    pub kind: DocumentKind,
    #[serde(rename = "nome")]
    pub grantor_name: String,
    #[serde(rename = "emitidoEm")]
    pub issued_on: chrono::NaiveDate,
    pub status: DocumentStatus,
}
