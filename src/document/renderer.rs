//! Document rendering entry point.
//!
//! Validates the request, decodes the images, composes the block list and
//! hands it to the writer for the requested format.

use std::fs;
use std::path::PathBuf;

use log::{debug, info, warn};

use super::assets::{decode_data_url, RasterImage};
use super::common::{get_static_dir, sanitize_filename, today};
use super::content::{compose, ComposeInput};
use super::docx::DocxRenderer;
use super::model::{
    AssetRole, DocumentFormat, PartyRecord, RenderOptions, WitnessRecord, ATTORNEY,
};
use super::pdf::{is_win_ansi, PdfRenderer};
use super::traits::{FormatRenderer, Validator};
use super::verification::{qr_raster, VerificationCode};
use super::{DocumentError, GeneratedDocument};

/// Request fields the PDF standard fonts cannot show verbatim.
fn fields_outside_win_ansi(record: &PartyRecord, witnesses: &[WitnessRecord]) -> Vec<String> {
    let address = &record.address;
    let party = [
        ("nome", record.name.as_str()),
        ("nacionalidade", record.nationality.as_str()),
        ("estadoCivil", record.marital_status.as_str()),
        ("profissao", record.profession.as_str()),
        ("rg", record.national_id.as_str()),
        ("cpf", record.tax_id.as_str()),
        ("endereco", address.street.as_str()),
        ("numero", address.number.as_str()),
        ("complemento", address.complement.as_deref().unwrap_or_default()),
        ("bairro", address.district.as_str()),
        ("cidade", address.city.as_str()),
        ("estado", address.state.as_str()),
        ("cep", address.postal_code.as_str()),
        ("email", record.email.as_str()),
        ("telefone", record.phone.as_deref().unwrap_or_default()),
    ];
    let mut fields: Vec<String> = party
        .iter()
        .filter(|(_, value)| !is_win_ansi(value))
        .map(|(field, _)| field.to_string())
        .collect();

    for (i, witness) in witnesses.iter().enumerate() {
        let values = [
            ("nome", witness.name.as_str()),
            ("cpf", witness.cpf.as_deref().unwrap_or_default()),
            ("rg", witness.rg.as_deref().unwrap_or_default()),
        ];
        for (field, value) in values {
            if !is_win_ansi(value) {
                fields.push(format!("testemunhas[{}].{}", i, field));
            }
        }
    }
    fields
}

/// Construction-time settings for [`DocumentRenderer`].
#[derive(Debug, Clone, Default)]
pub struct RendererSettings {
    /// Letterhead logo. `None` renders without one.
    pub logo_path: Option<PathBuf>,
    /// Public base URL; when set, QR codes encode `{base}/verificar/{code}`.
    pub verification_base_url: Option<String>,
}

impl RendererSettings {
    /// Settings pointing at the bundled `static/logo.png`.
    pub fn with_bundled_logo() -> Self {
        Self {
            logo_path: Some(get_static_dir().join("logo.png")),
            verification_base_url: None,
        }
    }
}

/// Renders procurations and contracts. Cheap to share behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct DocumentRenderer {
    logo: Option<RasterImage>,
    verification_base_url: Option<String>,
}

impl DocumentRenderer {
    /// Build a renderer. A missing or unreadable logo is logged and skipped.
    pub fn new(settings: RendererSettings) -> Self {
        let logo = settings.logo_path.as_ref().and_then(|path| {
            match fs::read(path)
                .map_err(|e| e.to_string())
                .and_then(|bytes| RasterImage::from_bytes(&bytes).map_err(|e| e.to_string()))
            {
                Ok(image) => {
                    debug!("loaded letterhead logo from {}", path.display());
                    Some(image)
                }
                Err(e) => {
                    warn!(
                        "letterhead logo {} unavailable, rendering without it: {}",
                        path.display(),
                        e
                    );
                    None
                }
            }
        });

        Self {
            logo,
            verification_base_url: settings
                .verification_base_url
                .filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn has_logo(&self) -> bool {
        self.logo.is_some()
    }

    pub fn verification_base_url(&self) -> Option<&str> {
        self.verification_base_url.as_deref()
    }

    fn writer(format: DocumentFormat) -> &'static dyn FormatRenderer {
        match format {
            DocumentFormat::Pdf => &PdfRenderer,
            DocumentFormat::Docx => &DocxRenderer,
        }
    }

    /// Render one document.
    ///
    /// Validation failures abort before any rendering work. An image that
    /// fails to decode is left out and reported in `omitted_assets`.
    pub fn render(
        &self,
        record: &PartyRecord,
        options: &RenderOptions,
    ) -> Result<GeneratedDocument, DocumentError> {
        (record, options).validate()?;

        let mut omitted_assets = Vec::new();
        let signature = match decode_data_url(&options.signature) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("signature image could not be decoded, omitting it: {}", e);
                omitted_assets.push(AssetRole::Signature);
                None
            }
        };
        let photo = match options.photo.as_deref().map(str::trim) {
            Some(data_url) if !data_url.is_empty() => match decode_data_url(data_url) {
                Ok(image) => Some(image),
                Err(e) => {
                    warn!("photo could not be decoded, omitting it: {}", e);
                    omitted_assets.push(AssetRole::Photo);
                    None
                }
            },
            _ => None,
        };

        let transliterated_fields = match options.format {
            DocumentFormat::Pdf => fields_outside_win_ansi(record, &options.witnesses),
            DocumentFormat::Docx => Vec::new(),
        };
        if !transliterated_fields.is_empty() {
            warn!(
                "PDF fonts cannot show every character of {}, transliterating",
                transliterated_fields.join(", ")
            );
        }

        let verification_code = options
            .verification_code
            .clone()
            .unwrap_or_else(VerificationCode::generate);
        let issued_on = options.issued_on.unwrap_or_else(today);
        let payload = verification_code.payload(self.verification_base_url.as_deref());
        let qr = qr_raster(&payload)?;

        let content = compose(ComposeInput {
            kind: options.kind,
            record,
            attorney: &ATTORNEY,
            witnesses: &options.witnesses,
            logo: self.logo.as_ref(),
            signature,
            photo,
            issued_on,
            verification_code: verification_code.to_string(),
            verification_payload: payload,
            qr,
        });

        let bytes = Self::writer(options.format).render(&content)?;
        let filename = format!(
            "{}-{}.{}",
            options.kind.as_str(),
            sanitize_filename(&record.name, "documento"),
            options.format.extension()
        );

        info!(
            "rendered {} ({} bytes, code {})",
            filename,
            bytes.len(),
            verification_code
        );

        Ok(GeneratedDocument {
            filename,
            bytes,
            format: options.format,
            kind: options.kind,
            verification_code,
            issued_on,
            omitted_assets,
            transliterated_fields,
        })
    }
}
