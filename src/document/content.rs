//! Fixed legal text and the format-independent block list.
//!
//! Both writers consume the same `DocumentContent`, so the PDF and the DOCX
//! of one request carry identical wording.

use chrono::NaiveDate;

use super::assets::RasterImage;
use super::common::format_portuguese_date;
use super::model::{Counterparty, DocumentKind, PartyRecord, WitnessRecord};

/// A piece of paragraph text, optionally bold.
#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRole {
    Grantor,
    Attorney,
    Witness,
}

/// Underline, name and qualification lines, with an optional image above.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureBlock {
    pub role: SignatureRole,
    pub image: Option<RasterImage>,
    pub name: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Logo(RasterImage),
    /// Firm name followed by contact lines, centered.
    Letterhead { firm: String, lines: Vec<String> },
    Title(String),
    Heading(String),
    Paragraph(Vec<Span>),
    /// Place and date of issuance.
    DateLine(String),
    Photo { caption: String, image: RasterImage },
    Signature(SignatureBlock),
    Verification {
        code: String,
        payload: String,
        qr: RasterImage,
    },
}

/// Everything a writer needs to produce one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContent {
    pub title: String,
    pub verification_code: String,
    pub blocks: Vec<Block>,
}

impl DocumentContent {
    pub fn signature_blocks(&self, role: SignatureRole) -> usize {
        self.blocks
            .iter()
            .filter(|b| matches!(b, Block::Signature(s) if s.role == role))
            .count()
    }
}

/// Inputs to composition after validation and asset decoding.
pub struct ComposeInput<'a> {
    pub kind: DocumentKind,
    pub record: &'a PartyRecord,
    pub attorney: &'a Counterparty,
    pub witnesses: &'a [WitnessRecord],
    pub logo: Option<&'a RasterImage>,
    pub signature: Option<RasterImage>,
    pub photo: Option<RasterImage>,
    pub issued_on: NaiveDate,
    pub verification_code: String,
    pub verification_payload: String,
    pub qr: RasterImage,
}

pub fn title_for(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Procuracao => "PROCURAÇÃO AD JUDICIA ET EXTRA",
        DocumentKind::Contrato => "CONTRATO DE PRESTAÇÃO DE SERVIÇOS ADVOCATÍCIOS",
    }
}

fn party_label(kind: DocumentKind) -> (&'static str, &'static str) {
    match kind {
        DocumentKind::Procuracao => ("OUTORGANTE", "OUTORGADO"),
        DocumentKind::Contrato => ("CONTRATANTE", "CONTRATADO"),
    }
}

/// Grantor qualification sentence.
pub fn grantor_text(record: &PartyRecord) -> String {
    let mut text = format!(
        "{}, {}, {}, {}, portador(a) da cédula de identidade RG nº {}, inscrito(a) no CPF sob o nº {}, residente e domiciliado(a) em {}, e-mail {}",
        record.name.trim(),
        record.nationality.trim(),
        record.marital_status.trim(),
        record.profession.trim(),
        record.national_id.trim(),
        record.tax_id.trim(),
        record.address.one_line(),
        record.email.trim(),
    );
    if let Some(phone) = record.phone.as_deref().map(str::trim) {
        if !phone.is_empty() {
            text.push_str(", telefone ");
            text.push_str(phone);
        }
    }
    text.push('.');
    text
}

/// Attorney qualification sentence.
pub fn attorney_text(attorney: &Counterparty) -> String {
    format!(
        "{}, advogado inscrito na {}, com escritório profissional na {}, e-mail {}, telefone {}.",
        attorney.name, attorney.bar_registration, attorney.address, attorney.email, attorney.phone
    )
}

const POWERS: &str = "Pelo presente instrumento, o(a) OUTORGANTE nomeia e constitui seu bastante procurador o OUTORGADO acima qualificado, a quem confere amplos poderes para o foro em geral, com a cláusula ad judicia et extra, em qualquer juízo, instância ou tribunal, podendo propor contra quem de direito as ações competentes e defendê-lo(a) nas contrárias, seguindo umas e outras até final decisão, usando os recursos legais e acompanhando-os, conferindo-lhe ainda poderes especiais para confessar, desistir, transigir, firmar compromissos ou acordos, receber e dar quitação, agir em juízo ou fora dele, representá-lo(a) perante repartições públicas federais, estaduais e municipais, autarquias, instituições financeiras e órgãos da administração pública direta e indireta, podendo ainda substabelecer esta a outrem, com ou sem reserva de iguais poderes, dando tudo por bom, firme e valioso.";

const CONTRACT_CLAUSES: [(&str, &str); 6] = [
    (
        "CLÁUSULA PRIMEIRA - DO OBJETO",
        "O presente contrato tem por objeto a prestação de serviços advocatícios pelo CONTRATADO ao CONTRATANTE, compreendendo consultoria jurídica, elaboração de peças e o acompanhamento das demandas judiciais e administrativas que lhe forem confiadas, até decisão final.",
    ),
    (
        "CLÁUSULA SEGUNDA - DOS HONORÁRIOS",
        "Pelos serviços prestados, o CONTRATANTE pagará ao CONTRATADO honorários fixados em conformidade com a Tabela de Honorários da Ordem dos Advogados do Brasil, Seção de São Paulo, acrescidos de 20% (vinte por cento) sobre o proveito econômico obtido, a título de honorários de êxito.",
    ),
    (
        "CLÁUSULA TERCEIRA - DA FORMA DE PAGAMENTO",
        "Os honorários iniciais serão pagos em até 3 (três) parcelas mensais e sucessivas, vencendo-se a primeira na data de assinatura deste instrumento. O atraso no pagamento implicará multa de 2% (dois por cento) e juros de 1% (um por cento) ao mês.",
    ),
    (
        "CLÁUSULA QUARTA - DAS DESPESAS",
        "Custas processuais, emolumentos, perícias, deslocamentos e demais despesas necessárias ao andamento dos serviços correrão por conta do CONTRATANTE, mediante prévia comunicação do CONTRATADO.",
    ),
    (
        "CLÁUSULA QUINTA - DA VIGÊNCIA E RESCISÃO",
        "Este contrato vigora até a conclusão dos serviços contratados, podendo ser rescindido por qualquer das partes mediante notificação por escrito com antecedência mínima de 30 (trinta) dias, assegurados os honorários proporcionais ao trabalho realizado.",
    ),
    (
        "CLÁUSULA SEXTA - DO FORO",
        "As partes elegem o foro da Comarca de São Paulo/SP para dirimir quaisquer dúvidas oriundas deste contrato, com renúncia a qualquer outro, por mais privilegiado que seja.",
    ),
];

fn witness_details(witness: &WitnessRecord) -> Vec<String> {
    let mut details = Vec::new();
    if let Some(cpf) = witness.cpf.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        details.push(format!("CPF: {}", cpf));
    }
    if let Some(rg) = witness.rg.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        details.push(format!("RG: {}", rg));
    }
    details
}

/// Assemble the ordered blocks for one document.
pub fn compose(input: ComposeInput<'_>) -> DocumentContent {
    let kind = input.kind;
    let (grantor_label, attorney_label) = party_label(kind);
    let attorney = input.attorney;
    let mut blocks = Vec::new();

    if let Some(logo) = input.logo {
        blocks.push(Block::Logo(logo.clone()));
    }
    blocks.push(Block::Letterhead {
        firm: attorney.firm.to_string(),
        lines: vec![
            attorney.address.to_string(),
            format!("{} | {}", attorney.email, attorney.phone),
        ],
    });
    blocks.push(Block::Title(title_for(kind).to_string()));

    blocks.push(Block::Paragraph(vec![
        Span::bold(format!("{}: ", grantor_label)),
        Span::plain(grantor_text(input.record)),
    ]));
    blocks.push(Block::Paragraph(vec![
        Span::bold(format!("{}: ", attorney_label)),
        Span::plain(attorney_text(attorney)),
    ]));

    match kind {
        DocumentKind::Procuracao => {
            blocks.push(Block::Heading("PODERES".to_string()));
            blocks.push(Block::Paragraph(vec![Span::plain(POWERS)]));
        }
        DocumentKind::Contrato => {
            blocks.push(Block::Paragraph(vec![Span::plain(
                "As partes acima qualificadas celebram o presente contrato de prestação de serviços advocatícios, que se regerá pelas cláusulas e condições seguintes.",
            )]));
            for (heading, text) in CONTRACT_CLAUSES {
                blocks.push(Block::Heading(heading.to_string()));
                blocks.push(Block::Paragraph(vec![Span::plain(text)]));
            }
        }
    }

    let witnesses: Vec<&WitnessRecord> =
        input.witnesses.iter().filter(|w| w.has_name()).collect();
    if !witnesses.is_empty() {
        blocks.push(Block::Heading("TESTEMUNHAS".to_string()));
        for witness in witnesses {
            blocks.push(Block::Signature(SignatureBlock {
                role: SignatureRole::Witness,
                image: None,
                name: witness.name.trim().to_string(),
                details: witness_details(witness),
            }));
        }
    }

    blocks.push(Block::DateLine(format!(
        "{}, {}.",
        input.record.address.city.trim(),
        format_portuguese_date(input.issued_on)
    )));

    if let Some(photo) = input.photo {
        blocks.push(Block::Photo {
            caption: "FOTO DE AUTENTICAÇÃO".to_string(),
            image: photo,
        });
    }

    blocks.push(Block::Signature(SignatureBlock {
        role: SignatureRole::Grantor,
        image: input.signature,
        name: input.record.name.trim().to_string(),
        details: vec![
            grantor_label.to_string(),
            format!("CPF: {}", input.record.tax_id.trim()),
        ],
    }));

    if kind.requires_attorney_signature() {
        blocks.push(Block::Signature(SignatureBlock {
            role: SignatureRole::Attorney,
            image: None,
            name: attorney.name.to_string(),
            details: vec![
                attorney_label.to_string(),
                attorney.bar_registration.to_string(),
            ],
        }));
    }

    blocks.push(Block::Verification {
        code: input.verification_code.clone(),
        payload: input.verification_payload,
        qr: input.qr,
    });

    DocumentContent {
        title: title_for(kind).to_string(),
        verification_code: input.verification_code,
        blocks,
    }
}
