//! Verification codes and their QR rasters.

use std::fmt;

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::assets::RasterImage;
use super::RenderError;

/// Uppercase alphabet without look-alike symbols (0/O, 1/I/L).
const ALPHABET: &[u8] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";
const CODE_LENGTH: usize = 12;
const GROUP: usize = 4;
/// Quiet zone around the symbol, in modules.
const QUIET_ZONE: u32 = 4;
/// Pixels per module in the raster.
const MODULE_PX: u32 = 4;

/// Opaque identifier printed on a document and used to look it up later.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String, example = "7KQ4-M2ZX-9HPA")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Generate a fresh random code, grouped as `XXXX-XXXX-XXXX`.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut code = String::with_capacity(CODE_LENGTH + CODE_LENGTH / GROUP);
        for i in 0..CODE_LENGTH {
            if i > 0 && i % GROUP == 0 {
                code.push('-');
            }
            code.push(ALPHABET[rng.gen_range(0..ALPHABET.len())] as char);
        }
        Self(code)
    }

    /// Wrap an externally supplied code, normalizing case and surrounding space.
    pub fn pinned(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text encoded in the QR symbol: the lookup URL when a public base URL
    /// is configured, otherwise the bare code.
    pub fn payload(&self, base_url: Option<&str>) -> String {
        match base_url.map(|b| b.trim_end_matches('/')) {
            Some(base) if !base.is_empty() => format!("{}/verificar/{}", base, self.0),
            _ => self.0.clone(),
        }
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render `payload` as a black-on-white QR raster.
pub fn qr_raster(payload: &str) -> Result<RasterImage, RenderError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * MODULE_PX;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let mx = (x / MODULE_PX) as i64 - QUIET_ZONE as i64;
        let my = (y / MODULE_PX) as i64 - QUIET_ZONE as i64;
        let inside = (0..modules as i64).contains(&mx) && (0..modules as i64).contains(&my);
        if inside && colors[(my as u32 * modules + mx as u32) as usize] == Color::Dark {
            Luma([0])
        } else {
            Luma([255])
        }
    });

    Ok(RasterImage::from_gray(&image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let code = VerificationCode::generate();
        let groups: Vec<&str> = code.as_str().split('-').collect();
        assert_eq!(groups.len(), 3);
        assert!(groups.iter().all(|g| g.len() == GROUP));
        assert!(code
            .as_str()
            .bytes()
            .filter(|b| *b != b'-')
            .all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_codes_differ() {
        assert_ne!(VerificationCode::generate(), VerificationCode::generate());
    }

    #[test]
    fn test_payload_with_and_without_base_url() {
        let code = VerificationCode::pinned(" abcd-efgh-jkmn ");
        assert_eq!(code.as_str(), "ABCD-EFGH-JKMN");
        assert_eq!(code.payload(None), "ABCD-EFGH-JKMN");
        assert_eq!(
            code.payload(Some("https://escritorio.example/")),
            "https://escritorio.example/verificar/ABCD-EFGH-JKMN"
        );
    }

    #[test]
    fn test_qr_raster_is_square_with_quiet_zone() {
        let raster = qr_raster("ABCD-EFGH-JKMN").unwrap();
        assert_eq!(raster.width(), raster.height());
        // Version 1 symbols are 21 modules wide.
        assert!(raster.width() >= (21 + 2 * QUIET_ZONE) * MODULE_PX);
    }
}
