//! Input validation for document requests.
//!
//! Every missing field is collected so the caller can fix the whole form in
//! one pass. Identifiers (RG, CPF) are free text and are only checked for
//! presence.

use std::fmt;

use super::model::{PartyRecord, RenderOptions};

/// Maximum number of witnesses printed on a document.
pub const MAX_WITNESSES: usize = 2;

/// A single invalid field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Request field name as sent by the client, e.g. `estadoCivil`
    pub field: String,
    /// Human-readable message in Portuguese
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, format!("{} é obrigatório", label))
    }

    pub fn too_many_witnesses(count: usize) -> Self {
        Self::new(
            "testemunhas",
            format!(
                "No máximo {} testemunhas são permitidas ({} informadas)",
                MAX_WITNESSES, count
            ),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Collection of validation errors.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the offending fields, in the order they were checked.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    pub fn contains_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Validação falhou: {} campo(s) inválido(s): ",
            self.errors.len()
        )?;
        let parts: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validate that a string is not empty after trimming.
pub fn validate_required(value: &str, field: &str, label: &str, errors: &mut ValidationErrors) {
    if value.trim().is_empty() {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Required fields of the grantor record.
pub fn validate_party(record: &PartyRecord, errors: &mut ValidationErrors) {
    validate_required(&record.name, "nome", "Nome completo", errors);
    validate_required(&record.nationality, "nacionalidade", "Nacionalidade", errors);
    validate_required(&record.marital_status, "estadoCivil", "Estado civil", errors);
    validate_required(&record.profession, "profissao", "Profissão", errors);
    validate_required(&record.national_id, "rg", "RG", errors);
    validate_required(&record.tax_id, "cpf", "CPF", errors);
    validate_required(&record.email, "email", "E-mail", errors);

    let address = &record.address;
    validate_required(&address.street, "endereco", "Endereço", errors);
    validate_required(&address.number, "numero", "Número", errors);
    validate_required(&address.district, "bairro", "Bairro", errors);
    validate_required(&address.city, "cidade", "Cidade", errors);
    validate_required(&address.state, "estado", "Estado", errors);
    validate_required(&address.postal_code, "cep", "CEP", errors);
}

/// Options-level checks: the signature must be present and at most two
/// witnesses may be given. A present but undecodable signature is not a
/// validation failure; it is dropped later during rendering.
pub fn validate_options(options: &RenderOptions, errors: &mut ValidationErrors) {
    validate_required(&options.signature, "assinatura", "Assinatura", errors);

    let named = options.witnesses.iter().filter(|w| w.has_name()).count();
    if named > MAX_WITNESSES {
        errors.add(ValidationError::too_many_witnesses(named));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::model::{Address, WitnessRecord};

    fn complete_record() -> PartyRecord {
        PartyRecord {
            name: "Maria Souza".to_string(),
            nationality: "brasileira".to_string(),
            marital_status: "casada".to_string(),
            profession: "professora".to_string(),
            national_id: "12.345.678-9".to_string(),
            tax_id: "111.222.333-44".to_string(),
            address: Address {
                street: "Rua das Flores".to_string(),
                number: "120".to_string(),
                complement: None,
                district: "Centro".to_string(),
                city: "Campinas".to_string(),
                state: "SP".to_string(),
                postal_code: "13010-000".to_string(),
            },
            email: "maria@example.com".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_complete_record_passes() {
        let mut errors = ValidationErrors::new();
        validate_party(&complete_record(), &mut errors);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut record = complete_record();
        record.tax_id = "   ".to_string();
        record.address.city = String::new();

        let mut errors = ValidationErrors::new();
        validate_party(&record, &mut errors);

        assert_eq!(errors.fields(), vec!["cpf", "cidade"]);
        assert!(errors.to_string().contains("CPF é obrigatório"));
    }

    #[test]
    fn test_signature_required_and_witness_limit() {
        let witness = WitnessRecord {
            name: "Carlos Lima".to_string(),
            ..Default::default()
        };
        let options = RenderOptions {
            witnesses: vec![witness.clone(), witness.clone(), witness],
            ..Default::default()
        };

        let mut errors = ValidationErrors::new();
        validate_options(&options, &mut errors);

        assert!(errors.contains_field("assinatura"));
        assert!(errors.contains_field("testemunhas"));
    }

    #[test]
    fn test_unnamed_witnesses_do_not_count() {
        let options = RenderOptions {
            signature: "data:image/png;base64,AAAA".to_string(),
            witnesses: vec![WitnessRecord::default(); 3],
            ..Default::default()
        };

        let mut errors = ValidationErrors::new();
        validate_options(&options, &mut errors);
        assert!(errors.is_empty());
    }
}
