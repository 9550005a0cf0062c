//! Configuration management for the API server
//!
//! This module loads configuration from environment variables and provides
//! a type-safe configuration struct.
//!
//! # Environment Variables
//!
//! - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8080)
//! - `CORS_ORIGINS`: Comma-separated origins (default: `*`)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `WEBHOOK_SECRET`: Provider signing secret; without it every webhook is rejected
//! - `WEBHOOK_TOLERANCE_SECS`: Allowed clock skew (default: 300)
//! - `IDENTITY_JWT_SECRET` or `IDENTITY_JWT_PUBLIC_KEY`: Caller token key (one required)
//! - `IDENTITY_JWT_ISSUER`: Expected `iss` claim (optional)
//! - `STORAGE_URL`, `STORAGE_SERVICE_KEY`: Blob storage service (required)
//! - `STORAGE_BUCKET`: Document bucket (default: project-documents)
//! - `MAX_UPLOAD_BYTES`, `ALLOWED_UPLOAD_TYPES`, `SIGNED_URL_TTL_SECS`: Upload rules
//! - `PROJECT_EDIT_POLICY`: `any_authenticated` (default) or `owner_only`
//!
//! # Example
//!
//! ```no_run
//! use collabhub_api::config::Config;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = Config::from_env()?;
//! println!("Server will listen on {}", config.bind_address());
//! # Ok(())
//! # }
//! ```

use std::env;
use std::str::FromStr;

use collabhub_shared::auth::{IdentityVerifier, ProjectEditPolicy};
use collabhub_shared::lifecycle::{
    LifecycleConfig, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_SIGNED_URL_TTL_SECS,
};
use collabhub_shared::storage::http::StorageConfig;
use collabhub_shared::webhook::{WebhookVerifier, DEFAULT_TOLERANCE_SECS};

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub webhook: WebhookConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// `*` allows any origin
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub secret: Option<String>,
    pub tolerance_secs: i64,
}

/// Key material for caller identity tokens
#[derive(Debug, Clone)]
pub enum IdentityKey {
    Secret(String),
    PublicKeyPem(String),
}

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub key: IdentityKey,
    pub issuer: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let lifecycle = LifecycleConfig {
            max_upload_bytes: parsed("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            allowed_upload_types: list(&var_or("ALLOWED_UPLOAD_TYPES", "application/pdf")),
            signed_url_ttl_secs: parsed("SIGNED_URL_TTL_SECS", DEFAULT_SIGNED_URL_TTL_SECS)?,
            edit_policy: ProjectEditPolicy::from_str(&var_or(
                "PROJECT_EDIT_POLICY",
                "any_authenticated",
            ))
            .map_err(|e| anyhow::anyhow!(e))?,
        };

        Ok(Self {
            api: ApiConfig {
                host: var_or("API_HOST", "0.0.0.0"),
                port: parsed("API_PORT", 8080)?,
                cors_origins: list(&var_or("CORS_ORIGINS", "*")),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                max_connections: parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            webhook: WebhookConfig {
                secret: optional("WEBHOOK_SECRET"),
                tolerance_secs: parsed("WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE_SECS)?,
            },
            identity: IdentityConfig::from_env()?,
            storage: StorageConfig {
                url: required("STORAGE_URL")?,
                service_key: required("STORAGE_SERVICE_KEY")?,
                bucket: var_or("STORAGE_BUCKET", "project-documents"),
            },
            lifecycle,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

impl IdentityConfig {
    fn from_env() -> anyhow::Result<Self> {
        let key = match (optional("IDENTITY_JWT_SECRET"), optional("IDENTITY_JWT_PUBLIC_KEY")) {
            (_, Some(pem)) => IdentityKey::PublicKeyPem(pem.replace("\\n", "\n")),
            (Some(secret), None) => {
                if secret.len() < 32 {
                    anyhow::bail!("IDENTITY_JWT_SECRET must be at least 32 characters long");
                }
                IdentityKey::Secret(secret)
            }
            (None, None) => anyhow::bail!(
                "IDENTITY_JWT_SECRET or IDENTITY_JWT_PUBLIC_KEY environment variable is required"
            ),
        };

        Ok(Self {
            key,
            issuer: optional("IDENTITY_JWT_ISSUER"),
        })
    }

    pub fn verifier(&self) -> anyhow::Result<IdentityVerifier> {
        let issuer = self.issuer.as_deref();
        Ok(match &self.key {
            IdentityKey::Secret(secret) => IdentityVerifier::hs256(secret, issuer),
            IdentityKey::PublicKeyPem(pem) => IdentityVerifier::rs256(pem, issuer)?,
        })
    }
}

impl WebhookConfig {
    /// `None` when no secret is configured
    pub fn verifier(&self) -> anyhow::Result<Option<WebhookVerifier>> {
        self.secret
            .as_deref()
            .map(|secret| {
                WebhookVerifier::new(secret)
                    .map(|v| v.with_tolerance(self.tolerance_secs))
                    .map_err(|e| anyhow::anyhow!("WEBHOOK_SECRET: {}", e))
            })
            .transpose()
    }
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn required(name: &str) -> anyhow::Result<String> {
    optional(name).ok_or_else(|| anyhow::anyhow!("{} environment variable is required", name))
}

fn var_or(name: &str, default: &str) -> String {
    optional(name).unwrap_or_else(|| default.to_string())
}

fn parsed<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        None => Ok(default),
    }
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/test".to_string(),
                max_connections: 10,
            },
            webhook: WebhookConfig {
                secret: None,
                tolerance_secs: DEFAULT_TOLERANCE_SECS,
            },
            identity: IdentityConfig {
                key: IdentityKey::Secret("test-secret-key-at-least-32-bytes-long".to_string()),
                issuer: None,
            },
            storage: StorageConfig {
                url: "http://localhost:54321".to_string(),
                service_key: "service".to_string(),
                bucket: "project-documents".to_string(),
            },
            lifecycle: LifecycleConfig::default(),
        }
    }

    #[test]
    fn test_bind_address() {
        assert_eq!(config().bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_list_parsing() {
        assert_eq!(
            list("application/pdf, image/png,,"),
            vec!["application/pdf".to_string(), "image/png".to_string()]
        );
    }

    #[test]
    fn test_webhook_verifier_absent_without_secret() {
        assert!(config().webhook.verifier().unwrap().is_none());

        let mut with_secret = config();
        with_secret.webhook.secret = Some("whsec_dGVzdC13ZWJob29rLXNpZ25pbmcta2V5".to_string());
        assert!(with_secret.webhook.verifier().unwrap().is_some());
    }
}
