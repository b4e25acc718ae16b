//! Traits for the document pipeline.

use super::content::DocumentContent;
use super::model::{PartyRecord, RenderOptions};
use super::validation::{validate_options, validate_party, ValidationErrors};
use super::RenderError;

/// Trait for validating request objects.
pub trait Validator {
    /// Validate the state of the object, collecting every failure.
    fn validate(&self) -> Result<(), ValidationErrors>;
}

impl Validator for (&PartyRecord, &RenderOptions) {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_party(self.0, &mut errors);
        validate_options(self.1, &mut errors);
        errors.into_result()
    }
}

/// Writes composed document content into a concrete file format.
pub trait FormatRenderer {
    fn render(&self, content: &DocumentContent) -> Result<Vec<u8>, RenderError>;
}
