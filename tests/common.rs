//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::NaiveDate;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{Document, Object};
use procuracao_server::document::common::get_static_dir;
use procuracao_server::document::{
    Address, DocumentFormat, DocumentKind, PartyRecord, RenderOptions, VerificationCode,
    WitnessRecord,
};
use procuracao_server::registry::InMemoryDocumentRepository;
use procuracao_server::{AppConfig, AppState};
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "segredo-de-teste";

/// A small opaque PNG standing in for a canvas signature.
pub fn signature_data_url() -> String {
    let mut image = RgbaImage::from_pixel(120, 40, Rgba([0, 0, 0, 0]));
    for x in 10..110 {
        image.put_pixel(x, 20 + (x % 7), Rgba([20, 20, 80, 255]));
    }
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode signature");
    format!("data:image/png;base64,{}", BASE64.encode(buffer.into_inner()))
}

/// A small JPEG standing in for a webcam authentication photo.
pub fn photo_data_url() -> String {
    let image = RgbImage::from_fn(60, 80, |x, y| Rgb([(x * 4) as u8, (y * 3) as u8, 140]));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Jpeg)
        .expect("encode photo");
    format!("data:image/jpeg;base64,{}", BASE64.encode(buffer.into_inner()))
}

pub fn maria() -> PartyRecord {
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
            complement: Some("Apto 32".to_string()),
            district: "Centro".to_string(),
            city: "Campinas".to_string(),
            state: "SP".to_string(),
            postal_code: "13010-000".to_string(),
        },
        email: "maria@example.com".to_string(),
        phone: Some("(19) 99999-0000".to_string()),
    }
}

pub fn carlos() -> WitnessRecord {
    WitnessRecord {
        name: "Carlos Lima".to_string(),
        cpf: Some("222.333.444-55".to_string()),
        rg: None,
    }
}

/// Options with the code and date pinned so output is reproducible.
pub fn pinned_options(format: DocumentFormat, kind: DocumentKind) -> RenderOptions {
    RenderOptions {
        format,
        kind,
        witnesses: Vec::new(),
        signature: signature_data_url(),
        photo: None,
        verification_code: Some(VerificationCode::pinned("7KQ4-M2ZX-9HPA")),
        issued_on: NaiveDate::from_ymd_opt(2026, 10, 18),
    }
}

/// JSON body as the public form submits it.
pub fn form_body() -> Value {
    json!({
        "nome": "Maria Souza",
        "nacionalidade": "brasileira",
        "estadoCivil": "casada",
        "profissao": "professora",
        "rg": "12.345.678-9",
        "cpf": "111.222.333-44",
        "endereco": "Rua das Flores",
        "numero": "120",
        "complemento": "Apto 32",
        "bairro": "Centro",
        "cidade": "Campinas",
        "estado": "SP",
        "cep": "13010-000",
        "email": "maria@example.com",
        "telefone": "(19) 99999-0000",
        "assinatura": signature_data_url()
    })
}

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url: None,
        jwt_secret: "integration-test-secret".to_string(),
        admin_username: ADMIN_USERNAME.to_string(),
        admin_password_hash: bcrypt::hash(ADMIN_PASSWORD, 4).expect("hash password"),
        logo_path: get_static_dir().join("logo.png"),
        public_base_url: Some("https://almeidasantos.example".to_string()),
        memory_registry_bytes: 64 * 1024 * 1024,
    }
}

pub fn test_state() -> AppState {
    state_with_config(test_config())
}

pub fn state_with_config(config: AppConfig) -> AppState {
    AppState::new_with_repository(
        config,
        Arc::new(InMemoryDocumentRepository::with_budget(64 * 1024 * 1024)),
    )
}

pub fn logo_path() -> PathBuf {
    get_static_dir().join("logo.png")
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|b| *b as char).collect()
}

/// Text of every page, one entry per `BT`..`ET` block, joined with spaces.
pub fn pdf_text(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).expect("parse PDF");
    let mut blocks = Vec::new();
    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).expect("page content"))
            .expect("decode content");
        let mut current = String::new();
        for op in content.operations {
            match op.operator.as_str() {
                "Tj" => {
                    if let Some(Object::String(text, _)) = op.operands.first() {
                        current.push_str(&latin1(text));
                    }
                }
                "ET" => blocks.push(std::mem::take(&mut current).trim().to_string()),
                _ => {}
            }
        }
    }
    blocks.join(" ")
}

/// `(page number, baseline y)` of every text block.
pub fn pdf_text_positions(bytes: &[u8]) -> Vec<(u32, f32)> {
    let doc = Document::load_mem(bytes).expect("parse PDF");
    let mut positions = Vec::new();
    for (number, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id).expect("page content"))
            .expect("decode content");
        for op in content.operations {
            if op.operator == "Td" {
                positions.push((number, op.operands[1].as_float().expect("numeric y")));
            }
        }
    }
    positions
}

pub fn pdf_page_count(bytes: &[u8]) -> usize {
    Document::load_mem(bytes).expect("parse PDF").get_pages().len()
}

/// Number of image XObjects embedded in the file.
pub fn pdf_image_count(bytes: &[u8]) -> usize {
    let doc = Document::load_mem(bytes).expect("parse PDF");
    doc.objects
        .values()
        .filter_map(|object| object.as_stream().ok())
        .filter(|stream| {
            stream
                .dict
                .get(b"Subtype")
                .and_then(|subtype| subtype.as_name())
                .map(|name| name == b"Image")
                .unwrap_or(false)
        })
        .count()
}

pub fn docx_part(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open DOCX zip");
    let mut file = archive.by_name(name).expect("DOCX part present");
    let mut text = String::new();
    file.read_to_string(&mut text).expect("read DOCX part");
    text
}

/// Number of images packaged under `word/media/`.
pub fn docx_media_count(bytes: &[u8]) -> usize {
    let archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("open DOCX zip");
    archive
        .file_names()
        .filter(|name| name.starts_with("word/media/"))
        .count()
}

/// Plain text of `word/document.xml`, one line per paragraph.
pub fn docx_text(bytes: &[u8]) -> String {
    let xml = docx_part(bytes, "word/document.xml");
    let paragraphs = xml.replace("</w:p>", "\n");
    let tags = regex::Regex::new(r"<[^>]*>").expect("tag pattern");
    tags.replace_all(&paragraphs, "")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}
