//! Document module - renders procurations and contracts to PDF or DOCX.
//!
//! The pipeline is split into small stages:
//! - `validation` - required-field checks, run before any rendering work
//! - `assets` - data-URL decoding for the signature and photo
//! - `content` - fixed clause text and the format-independent block list
//! - `pdf` / `docx` - format writers behind the `FormatRenderer` trait
//! - `renderer` - orchestration and graceful degradation of optional assets

pub mod assets;
pub mod common;
pub mod content;
pub mod docx;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod renderer;
pub mod traits;
pub mod validation;
pub mod verification;

pub use assets::{AssetDecodeError, RasterImage};
pub use model::{
    Address, AssetRole, Counterparty, DocumentFormat, DocumentKind, PartyRecord, RenderOptions,
    WitnessRecord, ATTORNEY,
};
pub use renderer::{DocumentRenderer, RendererSettings};
pub use traits::{FormatRenderer, Validator};
pub use validation::{ValidationError, ValidationErrors};
pub use verification::VerificationCode;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building the binary document itself.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PDF construction failed: {0}")]
    Pdf(String),
    #[error("DOCX construction failed: {0}")]
    Docx(#[from] zip::result::ZipError),
    #[error("failed to encode image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to encode QR code: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("failed to write document buffer: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that abort a render.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{0}")]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result of a successful render.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
    pub kind: DocumentKind,
    pub verification_code: VerificationCode,
    pub issued_on: NaiveDate,
    /// Optional visual elements dropped because their data-URL did not decode.
    pub omitted_assets: Vec<AssetRole>,
    /// Request fields whose text the PDF fonts could not show verbatim and
    /// that were transliterated. Always empty for DOCX.
    pub transliterated_fields: Vec<String>,
}

impl GeneratedDocument {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}
