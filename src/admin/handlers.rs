use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;

use crate::auth::AdminSession;
use crate::document::DocumentKind;
use crate::procuracao::handlers::{file_response, render_and_respond};
use crate::procuracao::models::GenerateDocumentRequest;
use crate::registry::{DocumentSummary, UpdateStatusRequest};
use crate::{AppState, ErrorResponse};

fn registry_failure(action: &str, e: impl std::fmt::Display) -> HttpResponse {
    log::error!("Failed to {}: {}", action, e);
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(&format!(
        "Failed to {}",
        action
    )))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::not_found("Documento não encontrado"))
}

/// List issued documents, newest first
#[utoipa::path(
    get,
    path = "/api/admin/documentos",
    tag = "Admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Issued documents", body = [DocumentSummary]),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn list_documents(_session: AdminSession, state: web::Data<AppState>) -> impl Responder {
    match state.documents.list().await {
        Ok(documents) => HttpResponse::Ok().json(documents),
        Err(e) => registry_failure("list documents", e),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/documentos/{id}",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document summary", body = DocumentSummary),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn get_document(
    _session: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    match state.documents.get(path.into_inner()).await {
        Ok(Some(document)) => HttpResponse::Ok().json(document.summary),
        Ok(None) => not_found(),
        Err(e) => registry_failure("load document", e),
    }
}

/// Download the stored file
#[utoipa::path(
    get,
    path = "/api/admin/documentos/{id}/arquivo",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Stored file"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn download_document(
    _session: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> impl Responder {
    match state.documents.get(path.into_inner()).await {
        Ok(Some(document)) => file_response(
            &document.summary.filename,
            document.summary.format.mime_type(),
            &document.summary.verification_code,
            document.bytes,
        ),
        Ok(None) => not_found(),
        Err(e) => registry_failure("load document", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/documentos/{id}/status",
    tag = "Admin",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Document ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = DocumentSummary),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Document not found", body = ErrorResponse)
    )
)]
pub async fn update_status(
    session: AdminSession,
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> impl Responder {
    let id = path.into_inner();
    match state.update_document_status(id, body.status).await {
        Ok(Some(summary)) => {
            log::info!(
                "{} set document {} to {}",
                session.username(),
                id,
                summary.status.as_str()
            );
            HttpResponse::Ok().json(summary)
        }
        Ok(None) => not_found(),
        Err(e) => registry_failure("update document status", e),
    }
}

/// Render a service contract
#[utoipa::path(
    post,
    path = "/api/admin/contratos",
    tag = "Admin",
    security(("bearer_auth" = [])),
    request_body = GenerateDocumentRequest,
    responses(
        (status = 200, description = "Contract attachment"),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn create_contract(
    _session: AdminSession,
    state: web::Data<AppState>,
    body: web::Json<GenerateDocumentRequest>,
) -> impl Responder {
    let mut request = body.into_inner();
    request.kind = DocumentKind::Contrato;
    render_and_respond(&state, request).await
}

/// Configure admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/documentos", web::get().to(list_documents))
            .route("/documentos/{id}", web::get().to(get_document))
            .route("/documentos/{id}/arquivo", web::get().to(download_document))
            .route("/documentos/{id}/status", web::put().to(update_status))
            .route("/contratos", web::post().to(create_contract)),
    );
}
