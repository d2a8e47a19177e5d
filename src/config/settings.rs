//! Application settings loaded from environment variables.

use std::env;

use super::constants::{
    DEFAULT_AUDIT_RETENTION_MIN_DAYS, DEFAULT_DATABASE_URL, DEFAULT_JWT_TTL_MINUTES,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT, MIN_JWT_SECRET_LENGTH,
};

/// Application configuration
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub server_host: String,
    pub server_port: u16,
    /// Email of the account that may never be deleted, disabled or blocked.
    /// `None` means no account enjoys original-master protection.
    pub master_recovery_email: Option<String>,
    /// When true, a recovery key is cleared the moment it is consumed.
    /// Default false: the key stays valid until its expiry date.
    pub secret_key_single_use: bool,
    pub audit_retention_min_days: i64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_ttl_minutes", &self.jwt_ttl_minutes)
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("master_recovery_email", &self.master_recovery_email)
            .field("secret_key_single_use", &self.secret_key_single_use)
            .field("audit_retention_min_days", &self.audit_retention_min_days)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if JWT_SECRET is not set or is too short (security requirement).
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                // Development mode: use default but warn
                tracing::warn!("JWT_SECRET not set, using insecure default for development");
                "dev-secret-key-minimum-32-chars!!".to_string()
            } else {
                // Production mode: panic
                panic!("JWT_SECRET environment variable must be set in production");
            }
        });

        // Validate JWT secret length
        if jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            panic!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            );
        }

        let master_recovery_email = env::var("MASTER_RECOVERY_EMAIL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if master_recovery_email.is_none() {
            tracing::warn!("MASTER_RECOVERY_EMAIL not set, no account has original-master protection");
        }

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            jwt_ttl_minutes: env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_TTL_MINUTES),
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SERVER_PORT),
            master_recovery_email,
            secret_key_single_use: env::var("SECRET_KEY_SINGLE_USE")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            audit_retention_min_days: env::var("AUDIT_RETENTION_MIN_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_AUDIT_RETENTION_MIN_DAYS),
        }
    }

    /// Fixed configuration for unit and integration tests.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/gigbooks_test".to_string(),
            jwt_secret: "test-secret-key-for-testing-only-32chars".to_string(),
            jwt_ttl_minutes: DEFAULT_JWT_TTL_MINUTES,
            server_host: DEFAULT_SERVER_HOST.to_string(),
            server_port: DEFAULT_SERVER_PORT,
            master_recovery_email: Some("founder@gigbooks.dev".to_string()),
            secret_key_single_use: false,
            audit_retention_min_days: DEFAULT_AUDIT_RETENTION_MIN_DAYS,
        }
    }

    /// Get JWT secret bytes for token signing/verification.
    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
