use actix_cors::Cors;
use actix_web::middleware::{Compress, Logger};
use actix_web::{error::InternalError, web, App, HttpResponse, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod document;
pub mod procuracao;
pub mod registry;

pub use crate::config::AppConfig;
pub use crate::db::AppState;

use crate::document::ValidationErrors;

/// Largest accepted JSON body; signature and photo travel as data-URLs.
pub const MAX_JSON_BODY_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
    /// Request fields that failed validation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, details: &str) -> Self {
        Self {
            error: error_type.to_string(),
            details: details.to_string(),
            fields: Vec::new(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(details: &str) -> Self {
        Self::new("NotFound", details)
    }

    pub fn bad_request(details: &str) -> Self {
        Self::new("BadRequest", details)
    }

    pub fn internal_error(details: &str) -> Self {
        Self::new("InternalServerError", details)
    }

    pub fn validation(errors: &ValidationErrors) -> Self {
        Self {
            fields: errors.fields().into_iter().map(str::to_string).collect(),
            ..Self::new("ValidationError", &errors.to_string())
        }
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::procuracao::handlers::generate_pdf,
        crate::procuracao::handlers::generate_document,
        crate::procuracao::handlers::verify_document,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::me,
        crate::admin::handlers::list_documents,
        crate::admin::handlers::get_document,
        crate::admin::handlers::download_document,
        crate::admin::handlers::update_status,
        crate::admin::handlers::create_contract
    ),
    components(
        schemas(
            procuracao::models::GenerateDocumentRequest,
            procuracao::models::VerificationResponse,
            document::PartyRecord,
            document::Address,
            document::WitnessRecord,
            document::DocumentKind,
            document::DocumentFormat,
            registry::DocumentSummary,
            registry::DocumentStatus,
            registry::UpdateStatusRequest,
            auth::model::LoginRequest,
            auth::model::RefreshRequest,
            auth::model::TokenResponse,
            auth::model::AdminInfo,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Documentos", description = "Procuration and contract generation."),
        (name = "Authentication", description = "Admin login and tokens."),
        (name = "Admin", description = "Issued document registry.")
    )
)]
pub struct ApiDoc;

/// JSON extractor settings: large bodies and JSON error responses.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY_BYTES)
        .error_handler(|err, _req| {
            log::warn!("Rejected malformed JSON body: {}", err);
            let response =
                HttpResponse::BadRequest().json(ErrorResponse::bad_request(&err.to_string()));
            InternalError::from_response(err, response).into()
        })
}

/// Register every `/api` route. Shared by the server and the API tests.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config()).service(
        web::scope("/api")
            .configure(procuracao::handlers::config)
            .configure(auth::handlers::config)
            .configure(admin::handlers::config),
    );
}

pub async fn run() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let bind_address = config.bind_address();
    let app_state = web::Data::new(AppState::from_config(config).await?);
    if !app_state.renderer.has_logo() {
        log::warn!("Rendering documents without a letterhead logo");
    }

    let prometheus = PrometheusMetricsBuilder::new("procuracao_server")
        .endpoint("/metrics")
        .build()
        .map_err(|e| anyhow::anyhow!("failed to create Prometheus metrics middleware: {}", e))?;

    log::info!(
        "Starting server at http://{}:{}",
        bind_address.0,
        bind_address.1
    );

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .send_wildcard()
            .allow_any_method()
            .allow_any_header()
            .expose_headers(vec![
                "Content-Disposition",
                procuracao::handlers::VERIFICATION_HEADER,
                procuracao::handlers::OMITTED_ASSETS_HEADER,
                procuracao::handlers::TRANSLITERATED_FIELDS_HEADER,
            ])
            .max_age(3600);

        App::new()
            .wrap(Compress::default())
            .wrap(Logger::default())
            .wrap(prometheus.clone())
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(configure_api)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .keep_alive(actix_web::http::KeepAlive::Os)
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
