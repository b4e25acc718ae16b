use actix_web::{web, HttpResponse, Responder};
use bcrypt::verify;

use super::jwt::{
    generate_access_token, generate_refresh_token, get_access_token_expiry, validate_token,
};
use super::middleware::AdminSession;
use super::model::{AdminInfo, LoginRequest, RefreshRequest, TokenResponse, TokenType};
use crate::{AppState, ErrorResponse};

fn token_error(e: jsonwebtoken::errors::Error) -> HttpResponse {
    log::error!("Failed to generate token: {:?}", e);
    HttpResponse::InternalServerError().json(ErrorResponse::internal_error(
        "Failed to generate token",
    ))
}

/// Login endpoint
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let config = &state.config;
    let username_ok = body.username == config.admin_username;

    // bcrypt is deliberately slow; keep it off the async worker.
    let password = body.password.clone();
    let password_hash = config.admin_password_hash.clone();
    let password_ok = match web::block(move || verify(password, &password_hash)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            log::error!("Configured admin password hash is invalid: {:?}", e);
            false
        }
        Err(e) => {
            log::error!("Password check task failed: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to verify credentials"));
        }
    };

    if !(username_ok && password_ok) {
        log::warn!("Rejected admin login for '{}'", body.username);
        return HttpResponse::Unauthorized().json(ErrorResponse::new(
            "Unauthorized",
            "Invalid username or password",
        ));
    }

    let access_token =
        match generate_access_token(&config.jwt_secret, &config.admin_username, &config.admin_username) {
            Ok(t) => t,
            Err(e) => return token_error(e),
        };
    let refresh_token =
        match generate_refresh_token(&config.jwt_secret, &config.admin_username, &config.admin_username) {
            Ok(t) => t,
            Err(e) => return token_error(e),
        };

    log::info!("Admin '{}' logged in", config.admin_username);
    HttpResponse::Ok().json(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: get_access_token_expiry(),
    })
}

/// Refresh access token
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "Authentication",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token refreshed", body = TokenResponse),
        (status = 401, description = "Invalid refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> impl Responder {
    let config = &state.config;
    let claims = match validate_token(&config.jwt_secret, &body.refresh_token) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Invalid refresh token: {:?}", e);
            return HttpResponse::Unauthorized().json(ErrorResponse::new(
                "Unauthorized",
                "Invalid or expired refresh token",
            ));
        }
    };

    if claims.token_type != TokenType::Refresh || claims.username != config.admin_username {
        return HttpResponse::Unauthorized()
            .json(ErrorResponse::new("Unauthorized", "Invalid token type"));
    }

    // Only the access token is reissued; the refresh token stays valid until it expires.
    let access_token = match generate_access_token(&config.jwt_secret, &claims.sub, &claims.username) {
        Ok(t) => t,
        Err(e) => return token_error(e),
    };

    HttpResponse::Ok().json(TokenResponse {
        access_token,
        refresh_token: body.refresh_token.clone(),
        token_type: "Bearer".to_string(),
        expires_in: get_access_token_expiry(),
    })
}

/// Current admin identity
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Authentication",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated admin", body = AdminInfo),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    )
)]
pub async fn me(session: AdminSession) -> impl Responder {
    HttpResponse::Ok().json(AdminInfo {
        username: session.username().to_string(),
    })
}

/// Configure auth routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/refresh", web::post().to(refresh_token))
            .route("/me", web::get().to(me)),
    );
}
