//! DOCX writer. Produces a minimal WordprocessingML package inside a zip
//! container with the images stored under `word/media/`.

use std::fmt::Write as _;
use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

use super::assets::RasterImage;
use super::content::{Block, DocumentContent, SignatureBlock, Span};
use super::traits::FormatRenderer;
use super::RenderError;

/// EMU per typographic point.
const EMU_PER_PT: f32 = 12_700.0;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Arial" w:hAnsi="Arial" w:cs="Arial"/><w:sz w:val="22"/><w:lang w:val="pt-BR"/></w:rPr></w:rPrDefault><w:pPrDefault><w:pPr><w:spacing w:after="120" w:line="300" w:lineRule="auto"/></w:pPr></w:pPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style></w:styles>"#;

const DOCUMENT_NAMESPACES: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture""#;

/// Escape text for XML element and attribute content.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[derive(Debug, Clone, Copy)]
enum Justify {
    Left,
    Center,
    Both,
}

impl Justify {
    fn as_str(self) -> &'static str {
        match self {
            Justify::Left => "left",
            Justify::Center => "center",
            Justify::Both => "both",
        }
    }
}

struct ParagraphStyle {
    justify: Justify,
    after: u32,
    before: u32,
    keep_next: bool,
}

impl ParagraphStyle {
    fn new(justify: Justify) -> Self {
        Self {
            justify,
            after: 120,
            before: 0,
            keep_next: false,
        }
    }

    fn spacing(mut self, before: u32, after: u32) -> Self {
        self.before = before;
        self.after = after;
        self
    }

    fn keep_next(mut self) -> Self {
        self.keep_next = true;
        self
    }

    fn properties(&self) -> String {
        format!(
            r#"<w:pPr>{}<w:spacing w:before="{}" w:after="{}"/><w:jc w:val="{}"/></w:pPr>"#,
            if self.keep_next { "<w:keepNext/>" } else { "" },
            self.before,
            self.after,
            self.justify.as_str()
        )
    }
}

/// A text run; `size` is in half-points as WordprocessingML expects.
fn run(text: &str, bold: bool, size: u32) -> String {
    format!(
        r#"<w:r><w:rPr>{}<w:sz w:val="{}"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        if bold { "<w:b/>" } else { "" },
        size,
        escape_xml(text)
    )
}

fn paragraph(style: &ParagraphStyle, runs: &str) -> String {
    format!("<w:p>{}{}</w:p>", style.properties(), runs)
}

struct MediaEntry {
    relationship_id: String,
    path: String,
    png: Vec<u8>,
}

/// Stateless DOCX renderer.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxRenderer;

impl FormatRenderer for DocxRenderer {
    fn render(&self, content: &DocumentContent) -> Result<Vec<u8>, RenderError> {
        let mut body = DocxBody::default();
        for block in &content.blocks {
            body.block(block)?;
        }
        body.package(content)
    }
}

#[derive(Default)]
struct DocxBody {
    xml: String,
    media: Vec<MediaEntry>,
}

impl DocxBody {
    fn push(&mut self, paragraph_xml: String) {
        self.xml.push_str(&paragraph_xml);
    }

    fn inline_image(&mut self, image: &RasterImage, width_pt: f32, height_pt: f32) -> Result<String, RenderError> {
        let index = self.media.len() + 1;
        let relationship_id = format!("rIdImg{}", index);
        self.media.push(MediaEntry {
            relationship_id: relationship_id.clone(),
            path: format!("media/image{}.png", index),
            png: image.to_png()?,
        });

        let cx = (width_pt * EMU_PER_PT).round() as u64;
        let cy = (height_pt * EMU_PER_PT).round() as u64;
        Ok(format!(
            concat!(
                r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Imagem {id}"/>"#,
                r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="image{id}.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
            ),
            cx = cx,
            cy = cy,
            id = index,
            rid = relationship_id
        ))
    }

    fn block(&mut self, block: &Block) -> Result<(), RenderError> {
        match block {
            Block::Logo(image) => {
                let (w, h) = image.fit_within(160.0, 56.0);
                let drawing = self.inline_image(image, w, h)?;
                self.push(paragraph(&ParagraphStyle::new(Justify::Center), &drawing));
            }
            Block::Letterhead { firm, lines } => {
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Center).spacing(0, 40),
                    &run(firm, true, 26),
                ));
                for line in lines {
                    self.push(paragraph(
                        &ParagraphStyle::new(Justify::Center).spacing(0, 0),
                        &run(line, false, 17),
                    ));
                }
                self.push(
                    r#"<w:p><w:pPr><w:pBdr><w:bottom w:val="single" w:sz="6" w:space="1" w:color="8C8C8C"/></w:pBdr><w:spacing w:after="360"/></w:pPr></w:p>"#
                        .to_string(),
                );
            }
            Block::Title(title) => {
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Center).spacing(120, 360),
                    &run(title, true, 28),
                ));
            }
            Block::Heading(heading) => {
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Left).spacing(120, 80).keep_next(),
                    &run(heading, true, 22),
                ));
            }
            Block::Paragraph(spans) => {
                let runs: String = spans.iter().map(span_run).collect();
                self.push(paragraph(&ParagraphStyle::new(Justify::Both), &runs));
            }
            Block::DateLine(text) => {
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Center).spacing(240, 240),
                    &run(text, false, 22),
                ));
            }
            Block::Photo { caption, image } => {
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Center).spacing(120, 40).keep_next(),
                    &run(caption, true, 18),
                ));
                let (w, h) = image.fit_within(120.0, 150.0);
                let drawing = self.inline_image(image, w, h)?;
                self.push(paragraph(&ParagraphStyle::new(Justify::Center), &drawing));
            }
            Block::Signature(signature) => self.signature(signature)?,
            Block::Verification { code, payload, qr } => {
                let drawing = self.inline_image(qr, 84.0, 84.0)?;
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Center).spacing(240, 40).keep_next(),
                    &drawing,
                ));
                self.push(paragraph(
                    &ParagraphStyle::new(Justify::Center).spacing(0, 0),
                    &run(&format!("Código de verificação: {}", code), true, 18),
                ));
                if payload != code {
                    self.push(paragraph(
                        &ParagraphStyle::new(Justify::Center).spacing(0, 0),
                        &run(payload, false, 16),
                    ));
                }
            }
        }
        Ok(())
    }

    fn signature(&mut self, signature: &SignatureBlock) -> Result<(), RenderError> {
        // Every paragraph but the last keeps with the next one so the block
        // lands on a single page.
        let image_run = match &signature.image {
            Some(image) => {
                let (w, h) = image.fit_within(200.0, 60.0);
                self.inline_image(image, w, h)?
            }
            None => String::new(),
        };
        self.push(paragraph(
            &ParagraphStyle::new(Justify::Center).spacing(360, 0).keep_next(),
            &image_run,
        ));
        self.push(paragraph(
            &ParagraphStyle::new(Justify::Center).spacing(0, 0).keep_next(),
            &run("________________________________________", false, 22),
        ));

        let last = signature.details.len();
        let name_style = ParagraphStyle::new(Justify::Center).spacing(0, 0);
        let name_style = if last > 0 { name_style.keep_next() } else { name_style };
        self.push(paragraph(&name_style, &run(&signature.name, true, 20)));
        for (i, detail) in signature.details.iter().enumerate() {
            let style = ParagraphStyle::new(Justify::Center).spacing(0, 0);
            let style = if i + 1 < last { style.keep_next() } else { style };
            self.push(paragraph(&style, &run(detail, false, 18)));
        }
        Ok(())
    }

    fn document_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n<w:document {ns}><w:body>{body}",
                r#"<w:sectPr><w:footerReference w:type="default" r:id="rIdFooter"/>"#,
                r#"<w:pgSz w:w="11906" w:h="16838"/>"#,
                r#"<w:pgMar w:top="1134" w:right="1247" w:bottom="1276" w:left="1247" w:header="708" w:footer="567" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>"
            ),
            ns = DOCUMENT_NAMESPACES,
            body = self.xml
        )
    }

    fn document_rels(&self) -> String {
        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rIdStyles" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/><Relationship Id="rIdFooter" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#,
        );
        for entry in &self.media {
            let _ = write!(
                rels,
                r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="{}"/>"#,
                entry.relationship_id, entry.path
            );
        }
        rels.push_str("</Relationships>");
        rels
    }

    fn package(self, content: &DocumentContent) -> Result<Vec<u8>, RenderError> {
        let footer = footer_xml(&content.verification_code);
        let core = core_properties(&content.title, &content.verification_code);
        let document = self.document_xml();
        let document_rels = self.document_rels();

        // Fixed timestamps keep the archive byte-identical across runs.
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
        let parts: [(&str, &[u8]); 7] = [
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("docProps/core.xml", core.as_bytes()),
            ("word/document.xml", document.as_bytes()),
            ("word/_rels/document.xml.rels", document_rels.as_bytes()),
            ("word/styles.xml", STYLES.as_bytes()),
            ("word/footer1.xml", footer.as_bytes()),
        ];
        for (name, bytes) in parts {
            archive.start_file(name, options)?;
            archive.write_all(bytes)?;
        }
        for entry in &self.media {
            archive.start_file(format!("word/{}", entry.path), options)?;
            archive.write_all(&entry.png)?;
        }

        Ok(archive.finish()?.into_inner())
    }
}

fn span_run(span: &Span) -> String {
    run(&span.text, span.bold, 22)
}

fn footer_xml(verification_code: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:pPr><w:jc w:val="center"/></w:pPr>"#,
            "{code}",
            r#"<w:r><w:rPr><w:sz w:val="16"/></w:rPr><w:fldChar w:fldCharType="begin"/></w:r>"#,
            r#"<w:r><w:rPr><w:sz w:val="16"/></w:rPr><w:instrText xml:space="preserve"> PAGE </w:instrText></w:r>"#,
            r#"<w:r><w:rPr><w:sz w:val="16"/></w:rPr><w:fldChar w:fldCharType="separate"/></w:r>"#,
            r#"<w:r><w:rPr><w:sz w:val="16"/></w:rPr><w:t>1</w:t></w:r>"#,
            r#"<w:r><w:rPr><w:sz w:val="16"/></w:rPr><w:fldChar w:fldCharType="end"/></w:r>"#,
            "</w:p></w:ftr>"
        ),
        code = run(
            &format!("Código de verificação: {} | Página ", verification_code),
            false,
            16
        )
    )
}

fn core_properties(title: &str, verification_code: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            "\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/">"#,
            "<dc:title>{}</dc:title><dc:subject>{}</dc:subject><dc:creator>{}</dc:creator>",
            "</cp:coreProperties>"
        ),
        escape_xml(title),
        escape_xml(verification_code),
        env!("CARGO_PKG_NAME")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::content::SignatureRole;
    use image::GrayImage;
    use std::io::Read;
    use zip::ZipArchive;

    fn sample(signature_image: Option<RasterImage>) -> DocumentContent {
        DocumentContent {
            title: "PROCURAÇÃO".to_string(),
            verification_code: "ABCD-EFGH-JKMN".to_string(),
            blocks: vec![
                Block::Title("PROCURAÇÃO".to_string()),
                Block::Paragraph(vec![
                    Span::bold("OUTORGANTE:"),
                    Span::plain(" Ana & Filhos <Ltda>"),
                ]),
                Block::DateLine("Campinas, 18 de outubro de 2026.".to_string()),
                Block::Signature(SignatureBlock {
                    role: SignatureRole::Grantor,
                    image: signature_image,
                    name: "Ana Lima".to_string(),
                    details: vec!["OUTORGANTE".to_string()],
                }),
                Block::Verification {
                    code: "ABCD-EFGH-JKMN".to_string(),
                    payload: "https://escritorio.example/verificar/ABCD-EFGH-JKMN".to_string(),
                    qr: RasterImage::from_gray(&GrayImage::new(8, 8)),
                },
            ],
        }
    }

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml(r#"a<b>&"c'"#), "a&lt;b&gt;&amp;&quot;c&apos;");
    }

    #[test]
    fn test_package_contains_required_parts() {
        let bytes = DocxRenderer.render(&sample(None)).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        for part in [
            "[Content_Types].xml",
            "_rels/.rels",
            "word/document.xml",
            "word/_rels/document.xml.rels",
            "word/styles.xml",
            "word/media/image1.png",
        ] {
            assert!(names.contains(&part), "missing {}", part);
        }
    }

    #[test]
    fn test_text_is_escaped_and_date_centered() {
        let bytes = DocxRenderer.render(&sample(None)).unwrap();
        let document = read_part(&bytes, "word/document.xml");
        assert!(document.contains("Ana &amp; Filhos &lt;Ltda&gt;"));
        assert!(document.contains(r#"<w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:sz w:val="22"/></w:rPr><w:t xml:space="preserve">Campinas, 18 de outubro de 2026.</w:t>"#));
        assert!(document.contains(r#"<w:pgSz w:w="11906" w:h="16838"/>"#));
    }

    #[test]
    fn test_signature_image_is_embedded() {
        let signature = RasterImage::from_gray(&GrayImage::new(40, 10));
        let bytes = DocxRenderer.render(&sample(Some(signature))).unwrap();
        let rels = read_part(&bytes, "word/_rels/document.xml.rels");
        assert!(rels.contains("media/image1.png"));
        assert!(rels.contains("media/image2.png"));
        let document = read_part(&bytes, "word/document.xml");
        assert_eq!(document.matches("<w:drawing>").count(), 2);
    }

    #[test]
    fn test_output_is_deterministic() {
        assert_eq!(
            DocxRenderer.render(&sample(None)).unwrap(),
            DocxRenderer.render(&sample(None)).unwrap()
        );
    }
}
