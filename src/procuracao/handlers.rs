use actix_web::http::header::{self, ContentDisposition, DispositionParam, DispositionType};
use actix_web::http::Method;
use actix_web::{web, HttpResponse, Responder};

use super::models::{GenerateDocumentRequest, VerificationResponse};
use crate::document::{DocumentError, DocumentFormat, GeneratedDocument};
use crate::{AppState, ErrorResponse};

pub const VERIFICATION_HEADER: &str = "X-Verification-Code";
/// Comma-separated list of images left out of the file.
pub const OMITTED_ASSETS_HEADER: &str = "x-omitted-assets";
/// Comma-separated request fields transliterated for the PDF fonts.
pub const TRANSLITERATED_FIELDS_HEADER: &str = "x-transliterated-fields";

/// Attachment response for a rendered or stored file.
pub fn file_response(
    filename: &str,
    mime_type: &str,
    verification_code: &str,
    bytes: Vec<u8>,
) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(mime_type)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .insert_header((VERIFICATION_HEADER, verification_code.to_string()))
        .body(bytes)
}

fn list_header(response: &mut HttpResponse, name: &'static str, values: &[&str]) {
    if values.is_empty() {
        return;
    }
    if let Ok(value) = header::HeaderValue::from_str(&values.join(",")) {
        response
            .headers_mut()
            .insert(header::HeaderName::from_static(name), value);
    }
}

fn generated_response(document: GeneratedDocument) -> HttpResponse {
    let omitted: Vec<&str> = document.omitted_assets.iter().map(|a| a.label()).collect();
    let transliterated: Vec<&str> = document
        .transliterated_fields
        .iter()
        .map(String::as_str)
        .collect();
    let mut response = file_response(
        &document.filename,
        document.mime_type(),
        document.verification_code.as_str(),
        document.bytes,
    );
    list_header(&mut response, OMITTED_ASSETS_HEADER, &omitted);
    list_header(&mut response, TRANSLITERATED_FIELDS_HEADER, &transliterated);
    response
}

/// Validate, render on the blocking pool, record in the registry and answer
/// with the file.
pub async fn render_and_respond(
    state: &web::Data<AppState>,
    request: GenerateDocumentRequest,
) -> HttpResponse {
    let (record, options) = request.into_parts();
    let renderer = state.renderer.clone();

    let rendered = web::block(move || {
        let result = renderer.render(&record, &options);
        (record, result)
    })
    .await;

    let (record, document) = match rendered {
        Ok((record, Ok(document))) => (record, document),
        Ok((_, Err(DocumentError::Validation(errors)))) => {
            log::warn!("Rejected document request: {}", errors);
            return HttpResponse::BadRequest().json(ErrorResponse::validation(&errors));
        }
        Ok((_, Err(DocumentError::Render(e)))) => {
            log::error!("Document generation failed: {}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Falha ao gerar documento",
                &e.to_string(),
            ));
        }
        Err(e) => {
            log::error!("Render task failed: {:?}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse::new(
                "Falha ao gerar documento",
                &e.to_string(),
            ));
        }
    };

    // The file is still delivered when the registry write fails; the code
    // just won't be verifiable.
    if let Err(e) = state.record_document(&record, &document).await {
        log::error!(
            "Failed to record document {}: {}",
            document.verification_code,
            e
        );
    }

    generated_response(document)
}

/// Generate a procuration PDF from the public form.
#[utoipa::path(
    post,
    path = "/api/generate-pdf",
    tag = "Documentos",
    request_body = GenerateDocumentRequest,
    responses(
        (status = 200, description = "PDF attachment"),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 405, description = "Method not allowed", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_pdf(
    state: web::Data<AppState>,
    body: web::Json<GenerateDocumentRequest>,
) -> impl Responder {
    let mut request = body.into_inner();
    request.format = DocumentFormat::Pdf;
    render_and_respond(&state, request).await
}

/// Generate a procuration or contract in PDF or DOCX.
#[utoipa::path(
    post,
    path = "/api/documentos",
    tag = "Documentos",
    request_body = GenerateDocumentRequest,
    responses(
        (status = 200, description = "Document attachment"),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    )
)]
pub async fn generate_document(
    state: web::Data<AppState>,
    body: web::Json<GenerateDocumentRequest>,
) -> impl Responder {
    render_and_respond(&state, body.into_inner()).await
}

/// Check a verification code printed on a document.
#[utoipa::path(
    get,
    path = "/api/documentos/verificar/{codigo}",
    tag = "Documentos",
    params(("codigo" = String, Path, description = "Verification code, e.g. 7KQ4-M2ZX-9HPA")),
    responses(
        (status = 200, description = "Document found", body = VerificationResponse),
        (status = 404, description = "Unknown code", body = ErrorResponse)
    )
)]
pub async fn verify_document(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let code = path.into_inner();
    match state.find_by_code(&code).await {
        Ok(Some(summary)) => HttpResponse::Ok().json(VerificationResponse {
            valid: summary.status != crate::registry::DocumentStatus::Cancelado,
            code: summary.verification_code,
            kind: summary.kind,
            grantor_name: summary.grantor_name,
            issued_on: summary.issued_on,
            status: summary.status,
        }),
        Ok(None) => HttpResponse::NotFound().json(ErrorResponse::not_found(
            "Código de verificação não encontrado",
        )),
        Err(e) => {
            log::error!("Verification lookup failed for {}: {}", code, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Falha ao consultar documento"))
        }
    }
}

pub async fn preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}

pub async fn method_not_allowed() -> impl Responder {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, "POST, OPTIONS"))
        .json(ErrorResponse::new(
            "MethodNotAllowed",
            "Método não permitido",
        ))
}

/// Configure the public document routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/generate-pdf")
            .route(web::post().to(generate_pdf))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/documentos")
            .route(web::post().to(generate_document))
            .route(web::method(Method::OPTIONS).to(preflight))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/documentos/verificar/{codigo}").route(web::get().to(verify_document)),
    );
}
