mod common;

use common::*;
use procuracao_server::document::layout::MARGIN_BOTTOM;
use procuracao_server::document::pdf::FOOTER_Y;
use procuracao_server::document::{
    AssetRole, DocumentError, DocumentFormat, DocumentKind, DocumentRenderer, RendererSettings,
    WitnessRecord, ATTORNEY,
};

fn renderer() -> DocumentRenderer {
    DocumentRenderer::new(RendererSettings {
        logo_path: Some(logo_path()),
        verification_base_url: None,
    })
}

#[test]
fn scenario_a_pdf_without_witnesses() {
    let options = pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao);
    let document = renderer().render(&maria(), &options).unwrap();

    assert!(document.bytes.starts_with(b"%PDF-"));
    assert_eq!(document.filename, "procuracao-maria-souza.pdf");
    let text = pdf_text(&document.bytes);
    assert!(text.contains("Maria Souza"));
    assert!(text.contains("111.222.333-44"));
    assert!(text.contains(ATTORNEY.bar_registration));
    assert!(text.contains("Campinas, 18 de outubro de 2026."));
    assert!(!text.contains("TESTEMUNHAS"));
}

#[test]
fn scenario_b_one_witness_adds_witness_block() {
    let mut options = pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao);
    options.witnesses = vec![carlos()];
    let document = renderer().render(&maria(), &options).unwrap();

    let text = pdf_text(&document.bytes);
    assert!(text.contains("TESTEMUNHAS"));
    assert!(text.contains("Carlos Lima"));
    assert!(text.contains("CPF: 222.333.444-55"));
}

#[test]
fn scenario_c_invalid_signature_still_renders_without_image() {
    let mut options = pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao);
    let with_signature = renderer().render(&maria(), &options).unwrap();

    options.signature = "data:image/png;base64,SGVsbG8sIG11bmRvIQ==".to_string();
    let without_signature = renderer().render(&maria(), &options).unwrap();

    assert_eq!(without_signature.omitted_assets, vec![AssetRole::Signature]);
    assert_eq!(
        pdf_image_count(&with_signature.bytes),
        pdf_image_count(&without_signature.bytes) + 1
    );
    let text = pdf_text(&without_signature.bytes);
    assert!(text.contains("Maria Souza"));
    assert!(text.contains("Código de verificação: 7KQ4-M2ZX-9HPA"));
}

#[test]
fn scenario_d_docx_matches_pdf_text() {
    let pdf = renderer()
        .render(&maria(), &pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao))
        .unwrap();
    let docx = renderer()
        .render(&maria(), &pinned_options(DocumentFormat::Docx, DocumentKind::Procuracao))
        .unwrap();

    assert!(docx.bytes.starts_with(b"PK"));
    assert_eq!(docx.filename, "procuracao-maria-souza.docx");
    assert_eq!(
        docx.mime_type(),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
    );

    let docx_text = docx_text(&docx.bytes);
    for expected in ["Maria Souza", "111.222.333-44", ATTORNEY.bar_registration] {
        assert!(docx_text.contains(expected), "DOCX misses {}", expected);
    }

    let pdf_words = words(&pdf_text(&pdf.bytes));
    for word in words(&docx_text) {
        if word.chars().all(|c| c == '_') {
            continue;
        }
        assert!(pdf_words.contains(&word), "PDF misses '{}'", word);
    }
}

#[test]
fn pinned_inputs_are_byte_identical() {
    for format in [DocumentFormat::Pdf, DocumentFormat::Docx] {
        let mut options = pinned_options(format, DocumentKind::Contrato);
        options.witnesses = vec![carlos()];
        let first = renderer().render(&maria(), &options).unwrap();
        let second = renderer().render(&maria(), &options).unwrap();
        assert_eq!(first.bytes, second.bytes, "{:?} output differs", format);
    }
}

#[test]
fn missing_fields_are_all_reported() {
    let mut record = maria();
    record.name = String::new();
    record.address.postal_code = "   ".to_string();
    let mut options = pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao);
    options.signature = String::new();

    match renderer().render(&record, &options) {
        Err(DocumentError::Validation(errors)) => {
            assert_eq!(errors.fields(), vec!["nome", "cep", "assinatura"]);
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("render should fail"),
    }
}

#[test]
fn witness_count_controls_signature_lines() {
    let renderer = renderer();
    let mut options = pinned_options(DocumentFormat::Docx, DocumentKind::Procuracao);

    let none = docx_text(&renderer.render(&maria(), &options).unwrap().bytes);
    assert!(!none.contains("TESTEMUNHAS"));

    options.witnesses = vec![carlos(), {
        let mut second = carlos();
        second.name = "Beatriz Nunes".to_string();
        second
    }];
    let two = docx_text(&renderer.render(&maria(), &options).unwrap().bytes);
    assert!(two.contains("TESTEMUNHAS"));
    assert!(two.contains("Carlos Lima"));
    assert!(two.contains("Beatriz Nunes"));

    options.witnesses.push(carlos());
    match renderer.render(&maria(), &options) {
        Err(DocumentError::Validation(errors)) => assert!(errors.contains_field("testemunhas")),
        _ => panic!("three witnesses must be rejected"),
    }
}

#[test]
fn contract_is_countersigned_by_attorney() {
    let document = renderer()
        .render(&maria(), &pinned_options(DocumentFormat::Pdf, DocumentKind::Contrato))
        .unwrap();
    assert_eq!(document.filename, "contrato-maria-souza.pdf");
    let text = pdf_text(&document.bytes);
    assert!(text.contains("CONTRATANTE"));
    assert!(text.contains("CLÁUSULA SEXTA - DO FORO"));
    assert!(text.contains(ATTORNEY.name));
}

#[test]
fn long_content_breaks_pages_inside_margins() {
    let mut record = maria();
    record.profession = "consultora em gestão de projetos de infraestrutura urbana ".repeat(80);
    let mut options = pinned_options(DocumentFormat::Pdf, DocumentKind::Contrato);
    options.witnesses = vec![carlos(), carlos()];
    let document = renderer().render(&record, &options).unwrap();

    assert!(pdf_page_count(&document.bytes) > 1);
    for (page, y) in pdf_text_positions(&document.bytes) {
        assert!(
            y == FOOTER_Y || y >= MARGIN_BOTTOM,
            "page {} has text at y = {}",
            page,
            y
        );
    }
    let text = pdf_text(&document.bytes);
    assert!(text.contains("Página 2"));
    assert!(text.contains("Código de verificação: 7KQ4-M2ZX-9HPA"));
}

#[test]
fn authentication_photo_is_embedded_in_pdf() {
    let mut options = pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao);
    let without_photo = renderer().render(&maria(), &options).unwrap();

    options.photo = Some(photo_data_url());
    let with_photo = renderer().render(&maria(), &options).unwrap();

    assert!(with_photo.omitted_assets.is_empty());
    assert_eq!(
        pdf_image_count(&with_photo.bytes),
        pdf_image_count(&without_photo.bytes) + 1
    );
    assert!(pdf_text(&with_photo.bytes).contains("FOTO DE AUTENTICAÇÃO"));
    assert!(!pdf_text(&without_photo.bytes).contains("FOTO DE AUTENTICAÇÃO"));
}

#[test]
fn authentication_photo_is_embedded_in_docx() {
    let mut options = pinned_options(DocumentFormat::Docx, DocumentKind::Contrato);
    let without_photo = renderer().render(&maria(), &options).unwrap();

    options.photo = Some(photo_data_url());
    let with_photo = renderer().render(&maria(), &options).unwrap();

    assert!(with_photo.omitted_assets.is_empty());
    assert_eq!(
        docx_media_count(&with_photo.bytes),
        docx_media_count(&without_photo.bytes) + 1
    );
    assert!(docx_text(&with_photo.bytes).contains("FOTO DE AUTENTICAÇÃO"));
}

#[test]
fn witness_prints_only_supplied_identifiers() {
    let mut options = pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao);
    let baseline = pdf_text(&renderer().render(&maria(), &options).unwrap().bytes);
    options.witnesses = vec![WitnessRecord {
        name: "Beatriz Nunes".to_string(),
        cpf: Some("   ".to_string()),
        rg: Some("33.444.555-6".to_string()),
    }];
    let text = pdf_text(&renderer().render(&maria(), &options).unwrap().bytes);

    assert!(text.contains("Beatriz Nunes"));
    assert!(text.contains("RG: 33.444.555-6"));
    // A blank CPF adds no line of its own.
    assert_eq!(text.matches("CPF:").count(), baseline.matches("CPF:").count());
}

#[test]
fn names_outside_pdf_fonts_are_transliterated_and_reported() {
    let mut record = maria();
    record.name = "Łucja Nguyễn".to_string();

    let pdf = renderer()
        .render(&record, &pinned_options(DocumentFormat::Pdf, DocumentKind::Procuracao))
        .unwrap();
    assert_eq!(pdf.transliterated_fields, vec!["nome"]);
    let text = pdf_text(&pdf.bytes);
    assert!(text.contains("Lucja Nguyen"));
    assert!(!text.contains("?ucja"));

    let docx = renderer()
        .render(&record, &pinned_options(DocumentFormat::Docx, DocumentKind::Procuracao))
        .unwrap();
    assert!(docx.transliterated_fields.is_empty());
    assert!(docx_text(&docx.bytes).contains("Łucja Nguyễn"));
}
