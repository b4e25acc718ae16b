use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::model::{Claims, TokenType};

const ACCESS_TOKEN_EXPIRY_SECONDS: i64 = 15 * 60; // 15 minutes
const REFRESH_TOKEN_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60; // 7 days

fn generate_token(
    secret: &str,
    admin_id: &str,
    username: &str,
    token_type: TokenType,
    lifetime: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: admin_id.to_string(),
        username: username.to_string(),
        exp: now + lifetime as usize,
        iat: now,
        token_type,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Generate access token (short-lived)
pub fn generate_access_token(
    secret: &str,
    admin_id: &str,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    generate_token(
        secret,
        admin_id,
        username,
        TokenType::Access,
        ACCESS_TOKEN_EXPIRY_SECONDS,
    )
}

/// Generate refresh token (long-lived)
pub fn generate_refresh_token(
    secret: &str,
    admin_id: &str,
    username: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    generate_token(
        secret,
        admin_id,
        username,
        TokenType::Refresh,
        REFRESH_TOKEN_EXPIRY_SECONDS,
    )
}

/// Validate and decode a token
pub fn validate_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

pub fn get_access_token_expiry() -> i64 {
    ACCESS_TOKEN_EXPIRY_SECONDS
}
