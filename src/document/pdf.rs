//! PDF writer built on the `lopdf` object model.
//!
//! A vertical cursor walks down the page. Every block reserves its height
//! first; when it would cross the bottom margin the current page is closed
//! and drawing continues at the top of a fresh page.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use unicode_normalization::UnicodeNormalization;

use super::assets::RasterImage;
use super::content::{Block, DocumentContent, SignatureBlock, Span};
use super::layout::{
    text_width, wrap_spans, FontFace, Line, CONTENT_WIDTH, MARGIN_BOTTOM, MARGIN_TOP, MARGIN_X,
    PAGE_HEIGHT, PAGE_WIDTH,
};
use super::traits::FormatRenderer;
use super::RenderError;

/// Baseline of the per-page footer, below the content area.
pub const FOOTER_Y: f32 = 34.0;

const BODY_SIZE: f32 = 11.0;
const BODY_LEADING: f32 = 15.5;
const PARAGRAPH_GAP: f32 = 8.0;
const SIGNATURE_LINE_WIDTH: f32 = 240.0;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Align {
    Left,
    Center,
    Right,
}

/// WinAnsi code of `ch`, if the standard fonts can show it.
fn win_ansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        ' '..='~' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Letters with no canonical decomposition, mapped to their base letter.
fn base_letter(ch: char) -> Option<char> {
    match ch {
        'Ł' => Some('L'),
        'ł' => Some('l'),
        'Đ' => Some('D'),
        'đ' => Some('d'),
        'Ħ' => Some('H'),
        'ħ' => Some('h'),
        'ı' => Some('i'),
        'Ŧ' => Some('T'),
        'ŧ' => Some('t'),
        _ => None,
    }
}

/// Whether the standard fonts can show `text` without substitution.
pub fn is_win_ansi(text: &str) -> bool {
    text.nfc().all(|ch| win_ansi_byte(ch).is_some())
}

/// Rewrite `text` using only characters the standard fonts can show.
///
/// Input is composed first, so decomposed accents still map to Latin-1
/// letters. Other accented letters lose their marks (`ễ` becomes `e`), a few
/// stroked letters map to their base (`Ł` becomes `L`) and anything else
/// becomes `?`.
pub fn to_win_ansi_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfc() {
        if win_ansi_byte(ch).is_some() {
            out.push(ch);
            continue;
        }
        let stripped: String = std::iter::once(ch)
            .nfd()
            .filter(|c| win_ansi_byte(*c).is_some())
            .collect();
        if !stripped.is_empty() {
            out.push_str(&stripped);
        } else {
            out.push(base_letter(ch).unwrap_or('?'));
        }
    }
    out
}

/// Encode text for the standard fonts' WinAnsi encoding.
pub fn win_ansi(text: &str) -> Vec<u8> {
    to_win_ansi_text(text)
        .chars()
        .map(|ch| win_ansi_byte(ch).unwrap_or(b'?'))
        .collect()
}

fn face_name(face: FontFace) -> &'static str {
    match face {
        FontFace::Regular => FONT_REGULAR,
        FontFace::Bold => FONT_BOLD,
    }
}

fn spans_to_faces(spans: &[Span]) -> Vec<(String, FontFace)> {
    spans
        .iter()
        .map(|s| {
            let face = if s.bold { FontFace::Bold } else { FontFace::Regular };
            (s.text.clone(), face)
        })
        .collect()
}

/// Stateless PDF renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfRenderer;

impl FormatRenderer for PdfRenderer {
    fn render(&self, content: &DocumentContent) -> Result<Vec<u8>, RenderError> {
        let mut writer = PdfWriter::new(&content.verification_code);
        for block in &content.blocks {
            writer.block(block)?;
        }
        writer.finish(&content.title)
    }
}

struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    xobjects: Dictionary,
    pages: Vec<ObjectId>,
    ops: Vec<Operation>,
    cursor: f32,
    footer: String,
}

impl PdfWriter {
    fn new(verification_code: &str) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            resources_id,
            xobjects: Dictionary::new(),
            pages: Vec::new(),
            ops: Vec::new(),
            cursor: PAGE_HEIGHT - MARGIN_TOP,
            footer: format!("Código de verificação: {}", verification_code),
        }
    }

    fn page_is_fresh(&self) -> bool {
        self.cursor >= PAGE_HEIGHT - MARGIN_TOP - f32::EPSILON
    }

    /// Break the page if `height` does not fit above the bottom margin.
    fn ensure_space(&mut self, height: f32) -> Result<(), RenderError> {
        if self.cursor - height < MARGIN_BOTTOM && !self.page_is_fresh() {
            self.close_page()?;
        }
        Ok(())
    }

    fn close_page(&mut self) -> Result<(), RenderError> {
        let page_number = self.pages.len() + 1;
        let footer = format!("{} | Página {}", self.footer, page_number);
        let width = text_width(&footer, FontFace::Regular, 8.0);
        self.draw_runs(
            &[(footer, FontFace::Regular)],
            8.0,
            (PAGE_WIDTH - width) / 2.0,
            FOOTER_Y,
        );

        let operations = std::mem::take(&mut self.ops);
        let encoded = Content { operations }
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = self.doc.add_object(Stream::new(Dictionary::new(), encoded));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Resources" => self.resources_id,
            "MediaBox" => vec![
                Object::from(0_i64),
                Object::from(0_i64),
                Object::from(PAGE_WIDTH),
                Object::from(PAGE_HEIGHT),
            ],
            "Contents" => content_id,
        });
        self.pages.push(page_id);
        self.cursor = PAGE_HEIGHT - MARGIN_TOP;
        Ok(())
    }

    fn draw_runs(&mut self, runs: &[(String, FontFace)], size: f32, x: f32, y: f32) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new("Td", vec![x.into(), y.into()]));
        for (text, face) in runs {
            self.ops.push(Operation::new(
                "Tf",
                vec![face_name(*face).into(), size.into()],
            ));
            self.ops.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(text), StringFormat::Literal)],
            ));
        }
        self.ops.push(Operation::new("ET", vec![]));
    }

    fn draw_line(&mut self, line: &Line, size: f32, leading: f32, align: Align) -> Result<(), RenderError> {
        self.ensure_space(leading)?;
        self.cursor -= leading;
        let x = match align {
            Align::Left => MARGIN_X,
            Align::Center => MARGIN_X + (CONTENT_WIDTH - line.width) / 2.0,
            Align::Right => MARGIN_X + CONTENT_WIDTH - line.width,
        };
        let runs: Vec<(String, FontFace)> = line
            .runs
            .iter()
            .map(|r| (r.text.clone(), r.face))
            .collect();
        let baseline = self.cursor + (leading - size) / 2.0;
        self.draw_runs(&runs, size, x, baseline);
        Ok(())
    }

    fn text(
        &mut self,
        spans: &[(String, FontFace)],
        size: f32,
        leading: f32,
        align: Align,
    ) -> Result<(), RenderError> {
        // Measure exactly what will be drawn.
        let spans: Vec<(String, FontFace)> = spans
            .iter()
            .map(|(text, face)| (to_win_ansi_text(text), *face))
            .collect();
        for line in wrap_spans(&spans, size, CONTENT_WIDTH) {
            self.draw_line(&line, size, leading, align)?;
        }
        Ok(())
    }

    fn gap(&mut self, height: f32) {
        // Gaps never force a page break; they are dropped at the page bottom.
        self.cursor = (self.cursor - height).max(MARGIN_BOTTOM);
    }

    fn register_image(&mut self, image: &RasterImage) -> Result<String, RenderError> {
        let name = format!("Im{}", self.xobjects.len() + 1);
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width() as i64,
                "Height" => image.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "FlateDecode",
            },
            image.to_flate_rgb()?,
        );
        let id = self.doc.add_object(stream);
        self.xobjects.set(name.clone(), id);
        Ok(name)
    }

    /// Draw an image with its top edge at the cursor, horizontally centered.
    fn image_centered(&mut self, image: &RasterImage, width: f32, height: f32) -> Result<(), RenderError> {
        let name = self.register_image(image)?;
        let x = MARGIN_X + (CONTENT_WIDTH - width) / 2.0;
        let y = self.cursor - height;
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                width.into(),
                0_f32.into(),
                0_f32.into(),
                height.into(),
                x.into(),
                y.into(),
            ],
        ));
        self.ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
        self.ops.push(Operation::new("Q", vec![]));
        self.cursor = y;
        Ok(())
    }

    fn rule(&mut self, width: f32, gray: f32) {
        let x1 = MARGIN_X + (CONTENT_WIDTH - width) / 2.0;
        let y = self.cursor;
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new("RG", vec![gray.into(), gray.into(), gray.into()]));
        self.ops.push(Operation::new("w", vec![0.6_f32.into()]));
        self.ops.push(Operation::new("m", vec![x1.into(), y.into()]));
        self.ops.push(Operation::new("l", vec![(x1 + width).into(), y.into()]));
        self.ops.push(Operation::new("S", vec![]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    fn block(&mut self, block: &Block) -> Result<(), RenderError> {
        match block {
            Block::Logo(image) => {
                let (width, height) = image.fit_within(160.0, 56.0);
                self.ensure_space(height)?;
                self.image_centered(image, width, height)?;
                self.gap(6.0);
            }
            Block::Letterhead { firm, lines } => {
                self.text(&[(firm.clone(), FontFace::Bold)], 13.0, 17.0, Align::Center)?;
                for line in lines {
                    self.text(&[(line.clone(), FontFace::Regular)], 8.5, 11.0, Align::Center)?;
                }
                self.gap(6.0);
                self.rule(CONTENT_WIDTH, 0.55);
                self.gap(18.0);
            }
            Block::Title(title) => {
                self.text(&[(title.clone(), FontFace::Bold)], 14.0, 19.0, Align::Center)?;
                self.gap(14.0);
            }
            Block::Heading(heading) => {
                // Keep a heading on the same page as the first line that follows it.
                self.ensure_space(16.0 + BODY_LEADING + 4.0)?;
                self.gap(4.0);
                self.text(&[(heading.clone(), FontFace::Bold)], BODY_SIZE, 16.0, Align::Left)?;
            }
            Block::Paragraph(spans) => {
                self.text(&spans_to_faces(spans), BODY_SIZE, BODY_LEADING, Align::Left)?;
                self.gap(PARAGRAPH_GAP);
            }
            Block::DateLine(text) => {
                self.gap(10.0);
                self.text(&[(text.clone(), FontFace::Regular)], BODY_SIZE, BODY_LEADING, Align::Right)?;
                self.gap(10.0);
            }
            Block::Photo { caption, image } => {
                let (width, height) = image.fit_within(120.0, 150.0);
                self.ensure_space(14.0 + height + 10.0)?;
                self.text(&[(caption.clone(), FontFace::Bold)], 9.0, 14.0, Align::Center)?;
                self.image_centered(image, width, height)?;
                self.gap(10.0);
            }
            Block::Signature(signature) => self.signature(signature)?,
            Block::Verification { code, payload, qr } => {
                let side = 84.0;
                let mut height = 12.0 + side + 13.0;
                if payload != code {
                    height += 11.0;
                }
                self.ensure_space(height)?;
                self.gap(12.0);
                self.image_centered(qr, side, side)?;
                self.text(
                    &[(format!("Código de verificação: {}", code), FontFace::Bold)],
                    9.0,
                    13.0,
                    Align::Center,
                )?;
                if payload != code {
                    self.text(&[(payload.clone(), FontFace::Regular)], 8.0, 11.0, Align::Center)?;
                }
            }
        }
        Ok(())
    }

    fn signature(&mut self, signature: &SignatureBlock) -> Result<(), RenderError> {
        let image_size = signature
            .image
            .as_ref()
            .map(|image| image.fit_within(200.0, 60.0));
        let image_height = image_size.map(|(_, h)| h).unwrap_or(28.0);
        let height = 10.0 + image_height + 4.0 + 15.0 + signature.details.len() as f32 * 12.0;

        // A signature block never splits across pages.
        self.ensure_space(height)?;
        self.gap(10.0);
        match (&signature.image, image_size) {
            (Some(image), Some((width, h))) => self.image_centered(image, width, h)?,
            _ => self.gap(image_height),
        }
        self.gap(4.0);
        self.rule(SIGNATURE_LINE_WIDTH, 0.0);
        self.text(&[(signature.name.clone(), FontFace::Bold)], 10.0, 15.0, Align::Center)?;
        for detail in &signature.details {
            self.text(&[(detail.clone(), FontFace::Regular)], 9.0, 12.0, Align::Center)?;
        }
        Ok(())
    }

    fn finish(mut self, title: &str) -> Result<Vec<u8>, RenderError> {
        if !self.ops.is_empty() || self.pages.is_empty() {
            self.close_page()?;
        }

        let regular_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut resources = dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => regular_id,
                FONT_BOLD => bold_id,
            },
        };
        if !self.xobjects.is_empty() {
            resources.set("XObject", self.xobjects.clone());
        }
        self.doc.objects.insert(self.resources_id, Object::Dictionary(resources));

        let kids: Vec<Object> = self.pages.iter().map(|id| Object::Reference(*id)).collect();
        let count = kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        let info_id = self.doc.add_object(dictionary! {
            "Title" => Object::String(win_ansi(title), StringFormat::Literal),
            "Producer" => Object::string_literal(concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))),
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(buffer)
    }
}
