//! Input records for the document renderer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::verification::VerificationCode;

/// Postal address of the grantor.
/// Missing keys deserialize as empty strings and are reported by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Address {
    #[serde(rename = "endereco")]
    #[schema(example = "Rua das Flores")]
    pub street: String,
    #[serde(rename = "numero")]
    #[schema(example = "120")]
    pub number: String,
    #[serde(rename = "complemento", default)]
    #[schema(example = "Apto 32")]
    pub complement: Option<String>,
    #[serde(rename = "bairro")]
    #[schema(example = "Centro")]
    pub district: String,
    #[serde(rename = "cidade")]
    #[schema(example = "Campinas")]
    pub city: String,
    #[serde(rename = "estado")]
    #[schema(example = "SP")]
    pub state: String,
    #[serde(rename = "cep")]
    #[schema(example = "13010-000")]
    pub postal_code: String,
}

impl Address {
    /// Single-line address as written in the grantor clause.
    pub fn one_line(&self) -> String {
        let mut line = format!("{}, nº {}", self.street.trim(), self.number.trim());
        if let Some(complement) = self.complement.as_deref().map(str::trim) {
            if !complement.is_empty() {
                line.push_str(", ");
                line.push_str(complement);
            }
        }
        format!(
            "{}, {}, {}/{}, CEP {}",
            line,
            self.district.trim(),
            self.city.trim(),
            self.state.trim(),
            self.postal_code.trim()
        )
    }
}

/// The grantor (outorgante) or client (contratante).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct PartyRecord {
    #[serde(rename = "nome")]
    #[schema(example = "Maria Souza")]
    pub name: String,
    #[serde(rename = "nacionalidade")]
    #[schema(example = "brasileira")]
    pub nationality: String,
    #[serde(rename = "estadoCivil")]
    #[schema(example = "casada")]
    pub marital_status: String,
    #[serde(rename = "profissao")]
    #[schema(example = "professora")]
    pub profession: String,
    #[serde(rename = "rg")]
    #[schema(example = "12.345.678-9")]
    pub national_id: String,
    #[serde(rename = "cpf")]
    #[schema(example = "111.222.333-44")]
    pub tax_id: String,
    #[serde(flatten)]
    pub address: Address,
    #[schema(example = "maria@example.com")]
    pub email: String,
    #[serde(rename = "telefone", default)]
    #[schema(example = "(19) 99999-0000")]
    pub phone: Option<String>,
}

/// A witness to the signature. Empty optional identifiers are not printed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct WitnessRecord {
    #[serde(rename = "nome", default)]
    #[schema(example = "Carlos Lima")]
    pub name: String,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub rg: Option<String>,
}

impl WitnessRecord {
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

/// The attorney receiving the powers. Fixed for this office.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counterparty {
    pub firm: &'static str,
    pub name: &'static str,
    pub bar_registration: &'static str,
    pub address: &'static str,
    pub email: &'static str,
    pub phone: &'static str,
}

pub const ATTORNEY: Counterparty = Counterparty {
    firm: "Almeida Santos Advocacia",
    name: "Ricardo Almeida Santos",
    bar_registration: "OAB/SP nº 234.567",
    address: "Avenida Paulista, nº 1000, conjunto 101, Bela Vista, São Paulo/SP, CEP 01310-100",
    email: "contato@almeidasantos.adv.br",
    phone: "(11) 3251-4000",
};

/// Which legal template to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    #[default]
    #[serde(alias = "procuration")]
    Procuracao,
    #[serde(alias = "contract")]
    Contrato,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procuracao => "procuracao",
            Self::Contrato => "contrato",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "procuracao" | "procuration" => Some(Self::Procuracao),
            "contrato" | "contract" => Some(Self::Contrato),
            _ => None,
        }
    }

    /// Contracts are countersigned by the attorney.
    pub fn requires_attorney_signature(&self) -> bool {
        matches!(self, Self::Contrato)
    }
}

/// Output container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// Optional visual elements that may be dropped during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetRole {
    Signature,
    Photo,
}

impl AssetRole {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Signature => "assinatura",
            Self::Photo => "foto",
        }
    }
}

/// Per-call rendering options.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub format: DocumentFormat,
    pub kind: DocumentKind,
    pub witnesses: Vec<WitnessRecord>,
    /// Signature as a `data:image/...;base64,` URL.
    pub signature: String,
    pub photo: Option<String>,
    /// Pins the verification code; a fresh one is generated when absent.
    pub verification_code: Option<VerificationCode>,
    /// Issuance date; defaults to today in local time.
    pub issued_on: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_party_record_deserialization() {
        let json = r#"{
            "nome": "Maria Souza",
            "nacionalidade": "brasileira",
            "estadoCivil": "casada",
            "profissao": "professora",
            "rg": "12.345.678-9",
            "cpf": "111.222.333-44",
            "endereco": "Rua das Flores",
            "numero": "120",
            "bairro": "Centro",
            "cidade": "Campinas",
            "estado": "SP",
            "cep": "13010-000",
            "email": "maria@example.com"
        }"#;

        let record: PartyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.name, "Maria Souza");
        assert_eq!(record.address.city, "Campinas");
        assert!(record.address.complement.is_none());
        assert!(record.phone.is_none());
    }

    #[test]
    fn test_address_one_line_skips_empty_complement() {
        let address = Address {
            street: "Rua A".to_string(),
            number: "1".to_string(),
            complement: Some("  ".to_string()),
            district: "Centro".to_string(),
            city: "Campinas".to_string(),
            state: "SP".to_string(),
            postal_code: "13010-000".to_string(),
        };
        assert_eq!(
            address.one_line(),
            "Rua A, nº 1, Centro, Campinas/SP, CEP 13010-000"
        );
    }

    #[test]
    fn test_kind_and_format_parsing() {
        assert_eq!(DocumentKind::from_str("contract"), Some(DocumentKind::Contrato));
        assert_eq!(DocumentKind::from_str("peca"), None);
        assert_eq!(DocumentFormat::from_str("docx"), Some(DocumentFormat::Docx));
        assert!(DocumentFormat::Docx.mime_type().contains("wordprocessingml"));
        assert!(DocumentKind::Contrato.requires_attorney_signature());
        assert!(!DocumentKind::Procuracao.requires_attorney_signature());
    }
}
