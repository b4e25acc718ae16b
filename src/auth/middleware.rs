use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::error::InternalError;
use actix_web::{web, Error, FromRequest, HttpRequest, HttpResponse};

use super::jwt::validate_token;
use super::model::{Claims, TokenType};
use crate::{AppState, ErrorResponse};

fn unauthorized(message: &'static str) -> Error {
    InternalError::from_response(
        message,
        HttpResponse::Unauthorized().json(ErrorResponse::new("Unauthorized", message)),
    )
    .into()
}

/// Extract token from Authorization header
fn extract_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Validate the bearer token of a request and return its claims
pub fn validate_request_token(req: &HttpRequest, secret: &str) -> Result<Claims, Error> {
    let token = extract_token(req).ok_or_else(|| unauthorized("Missing authorization token"))?;

    let claims = validate_token(secret, token).map_err(|e| {
        log::warn!("Token validation failed: {:?}", e);
        unauthorized("Invalid or expired token")
    })?;

    if claims.token_type != TokenType::Access {
        return Err(unauthorized("Invalid token type"));
    }

    Ok(claims)
}

/// Authenticated admin. Taking this as a handler argument protects the route.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl AdminSession {
    pub fn username(&self) -> &str {
        &self.claims.username
    }
}

impl FromRequest for AdminSession {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => validate_request_token(req, &state.config.jwt_secret)
                .map(|claims| AdminSession { claims }),
            None => {
                log::error!("AppState missing from app data, rejecting admin request");
                Err(unauthorized("Authentication unavailable"))
            }
        };
        ready(result)
    }
}
