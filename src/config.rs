//! Service configuration loaded from the environment (and `.env`).

use std::env;
use std::path::PathBuf;

use bcrypt::{hash, DEFAULT_COST};
use thiserror::Error;

use crate::document::{common::get_static_dir, RendererSettings};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_JWT_SECRET: &str = "procuracao-jwt-secret-change-in-production";
const DEFAULT_ADMIN_USERNAME: &str = "admin";
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
const DEFAULT_MEMORY_REGISTRY_MB: u64 = 256;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a valid port number, got '{0}'")]
    InvalidPort(String),
    #[error("MEMORY_REGISTRY_MB must be a positive number of megabytes, got '{0}'")]
    InvalidMemoryBudget(String),
    #[error("failed to hash the default admin password: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// PostgreSQL connection string. Without it the registry lives in memory.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub admin_username: String,
    /// bcrypt hash of the admin password.
    pub admin_password_hash: String,
    pub logo_path: PathBuf,
    /// Base URL printed into QR codes, e.g. `https://escritorio.example`.
    pub public_base_url: Option<String>,
    /// Upper bound for file bytes held by the in-memory registry. Oldest
    /// documents are evicted past it.
    pub memory_registry_bytes: u64,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port = match non_empty_var("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let memory_registry_mb = match non_empty_var("MEMORY_REGISTRY_MB") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|mb| *mb > 0)
                .ok_or(ConfigError::InvalidMemoryBudget(raw))?,
            None => DEFAULT_MEMORY_REGISTRY_MB,
        };

        let database_url = non_empty_var("DATABASE_URL");
        if database_url.is_none() {
            log::warn!("DATABASE_URL not set, issued documents are kept in memory only");
        }

        let jwt_secret = non_empty_var("JWT_SECRET").unwrap_or_else(|| {
            log::warn!("JWT_SECRET not set, using default secret. SET THIS IN PRODUCTION!");
            DEFAULT_JWT_SECRET.to_string()
        });

        let admin_username =
            non_empty_var("ADMIN_USERNAME").unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());
        let admin_password_hash = match non_empty_var("ADMIN_PASSWORD_HASH") {
            Some(hash) => hash,
            None => {
                log::warn!(
                    "ADMIN_PASSWORD_HASH not set, accepting {}/{} for admin login",
                    admin_username,
                    DEFAULT_ADMIN_PASSWORD
                );
                hash(DEFAULT_ADMIN_PASSWORD, DEFAULT_COST)?
            }
        };

        Ok(Self {
            host: non_empty_var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            database_url,
            jwt_secret,
            admin_username,
            admin_password_hash,
            logo_path: non_empty_var("LOGO_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| get_static_dir().join("logo.png")),
            public_base_url: non_empty_var("PUBLIC_BASE_URL"),
            memory_registry_bytes: memory_registry_mb * 1024 * 1024,
        })
    }

    pub fn renderer_settings(&self) -> RendererSettings {
        RendererSettings {
            logo_path: Some(self.logo_path.clone()),
            verification_base_url: self.public_base_url.clone(),
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_settings_carry_logo_and_base_url() {
        let config = AppConfig {
            host: "127.0.0.1".to_string(),
            port: 9000,
            database_url: None,
            jwt_secret: "secret".to_string(),
            admin_username: "admin".to_string(),
            admin_password_hash: String::new(),
            logo_path: PathBuf::from("/tmp/logo.png"),
            public_base_url: Some("https://escritorio.example".to_string()),
            memory_registry_bytes: 1024,
        };
        let settings = config.renderer_settings();
        assert_eq!(settings.logo_path, Some(PathBuf::from("/tmp/logo.png")));
        assert_eq!(
            settings.verification_base_url.as_deref(),
            Some("https://escritorio.example")
        );
        assert_eq!(config.bind_address(), ("127.0.0.1".to_string(), 9000));
    }
}
