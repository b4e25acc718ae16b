//! Data-URL image decoding for signatures and photos.

use std::io::{Cursor, Write};
use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use regex::Regex;
use thiserror::Error;

use super::RenderError;

/// Largest accepted decoded payload.
pub const MAX_ASSET_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum AssetDecodeError {
    #[error("asset is empty")]
    Empty,
    #[error("unsupported media type '{0}', expected an image")]
    UnsupportedMediaType(String),
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("asset exceeds {MAX_ASSET_BYTES} bytes")]
    TooLarge,
    #[error("payload is not a readable image: {0}")]
    Image(#[from] image::ImageError),
}

fn data_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^data:(?P<mime>[A-Za-z0-9.+/-]*)(?P<params>(?:;[^,;]*)*?);base64,(?P<data>.*)$")
            .expect("data-URL pattern is valid")
    })
}

/// An opaque RGB raster ready for embedding. Transparency is flattened onto
/// white so canvas signatures print as ink on paper.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pixels: RgbImage,
}

impl RasterImage {
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let pixels = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
            let [r, g, b, a] = rgba.get_pixel(x, y).0;
            let alpha = a as u16;
            let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
            Rgb([blend(r), blend(g), blend(b)])
        });
        Self { pixels }
    }

    pub fn from_gray(image: &GrayImage) -> Self {
        let pixels = RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let v = image.get_pixel(x, y).0[0];
            Rgb([v, v, v])
        });
        Self { pixels }
    }

    /// Decode raw image file bytes (PNG or JPEG).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetDecodeError> {
        if bytes.is_empty() {
            return Err(AssetDecodeError::Empty);
        }
        let image = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(image))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Height over width, used to scale into a bounding box.
    pub fn aspect_ratio(&self) -> f32 {
        if self.width() == 0 {
            return 1.0;
        }
        self.height() as f32 / self.width() as f32
    }

    /// Fit into a `max_width` x `max_height` box, preserving aspect ratio.
    pub fn fit_within(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let ratio = self.aspect_ratio();
        let mut width = max_width;
        let mut height = width * ratio;
        if height > max_height {
            height = max_height;
            width = height / ratio;
        }
        (width, height)
    }

    pub fn to_png(&self) -> Result<Vec<u8>, RenderError> {
        let mut buffer = Cursor::new(Vec::new());
        self.pixels.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }

    /// Zlib-compressed RGB samples for a PDF `/FlateDecode` image stream.
    pub fn to_flate_rgb(&self) -> Result<Vec<u8>, RenderError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(self.pixels.as_raw())?;
        Ok(encoder.finish()?)
    }
}

/// Decode a `data:image/...;base64,` URL. A bare base64 string without the
/// `data:` prefix is accepted as well.
pub fn decode_data_url(value: &str) -> Result<RasterImage, AssetDecodeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AssetDecodeError::Empty);
    }

    let payload = if trimmed.starts_with("data:") {
        let captures = data_url_pattern()
            .captures(trimmed)
            .ok_or_else(|| AssetDecodeError::UnsupportedMediaType("malformed data-URL".into()))?;
        let mime = captures.name("mime").map(|m| m.as_str()).unwrap_or_default();
        if !mime.to_ascii_lowercase().starts_with("image/") {
            return Err(AssetDecodeError::UnsupportedMediaType(mime.to_string()));
        }
        captures.name("data").map(|m| m.as_str()).unwrap_or_default()
    } else {
        trimmed
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() / 4 * 3 > MAX_ASSET_BYTES {
        return Err(AssetDecodeError::TooLarge);
    }
    let bytes = BASE64.decode(compact.as_bytes())?;
    RasterImage::from_bytes(&bytes)
}
