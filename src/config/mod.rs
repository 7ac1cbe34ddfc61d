use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

use crate::auth::AuthPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres URL for the document store. None selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
    pub statement_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Firebase project whose ID tokens are accepted. None disables real verification.
    pub firebase_project_id: Option<String>,
    pub jwks_url: String,
    pub jwks_cache_secs: u64,
    /// Accept `dev_<id>` bearer tokens
    pub allow_dev_tokens: bool,
    /// Accept any bearer token when no verifier is configured (local testing only)
    pub allow_any_token: bool,
    /// Let development identities read other users' data
    pub dev_read_bypass: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let environment = match var("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(var)
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        // Database overrides
        if let Some(v) = var("DATABASE_URL") {
            self.database.url = non_empty(v);
        }
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = var("DATABASE_STATEMENT_TIMEOUT_MS") {
            self.database.statement_timeout_ms = v.parse().unwrap_or(self.database.statement_timeout_ms);
        }

        // Auth overrides
        if let Some(v) = var("FIREBASE_PROJECT_ID") {
            self.auth.firebase_project_id = non_empty(v);
        }
        if let Some(v) = var("AUTH_JWKS_URL") {
            self.auth.jwks_url = v;
        }
        if let Some(v) = var("AUTH_JWKS_CACHE_SECS") {
            self.auth.jwks_cache_secs = v.parse().unwrap_or(self.auth.jwks_cache_secs);
        }
        if let Some(v) = var("AUTH_ALLOW_DEV_TOKENS") {
            self.auth.allow_dev_tokens = v.parse().unwrap_or(self.auth.allow_dev_tokens);
        }
        if let Some(v) = var("AUTH_ALLOW_ANY_TOKEN") {
            self.auth.allow_any_token = v.parse().unwrap_or(self.auth.allow_any_token);
        }
        if let Some(v) = var("AUTH_DEV_READ_BYPASS") {
            self.auth.dev_read_bypass = v.parse().unwrap_or(self.auth.dev_read_bypass);
        }

        // Security overrides
        if let Some(v) = var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // The truncation fallback never leaves a developer machine
        if self.environment != Environment::Development && self.auth.allow_any_token {
            tracing::warn!("AUTH_ALLOW_ANY_TOKEN ignored outside development");
            self.auth.allow_any_token = false;
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                statement_timeout_ms: 30_000,
            },
            auth: AuthConfig {
                firebase_project_id: None,
                jwks_url: FIREBASE_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
                allow_dev_tokens: true,
                allow_any_token: true,
                dev_read_bypass: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["*".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                statement_timeout_ms: 10_000,
            },
            auth: AuthConfig {
                firebase_project_id: None,
                jwks_url: FIREBASE_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
                allow_dev_tokens: true,
                allow_any_token: false,
                dev_read_bypass: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.smartsaver.app".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                statement_timeout_ms: 5_000,
            },
            auth: AuthConfig {
                firebase_project_id: None,
                jwks_url: FIREBASE_JWKS_URL.to_string(),
                jwks_cache_secs: 3600,
                allow_dev_tokens: false,
                allow_any_token: false,
                dev_read_bypass: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://smartsaver.app".to_string()],
            },
        }
    }

    pub fn auth_policy(&self) -> AuthPolicy {
        AuthPolicy {
            allow_dev_tokens: self.auth.allow_dev_tokens,
            allow_any_token: self.auth.allow_any_token,
            dev_read_bypass: self.auth.dev_read_bypass,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.environment, Environment::Development);
        assert!(config.auth.allow_dev_tokens);
        assert!(config.auth.allow_any_token);
        assert!(config.auth.dev_read_bypass);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::from_lookup(lookup(&[("APP_ENV", "production")]));
        assert_eq!(config.environment, Environment::Production);
        assert!(!config.auth.allow_dev_tokens);
        assert!(!config.auth.allow_any_token);
        assert!(!config.auth.dev_read_bypass);
    }

    #[test]
    fn any_token_fallback_is_forced_off_outside_development() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APP_ENV", "staging"),
            ("AUTH_ALLOW_ANY_TOKEN", "true"),
        ]));
        assert!(!config.auth.allow_any_token);
    }

    #[test]
    fn overrides_apply_and_blank_values_clear() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/smartsaver"),
            ("DATABASE_MAX_CONNECTIONS", "3"),
            ("FIREBASE_PROJECT_ID", "  "),
            ("AUTH_DEV_READ_BYPASS", "false"),
            ("SECURITY_CORS_ORIGINS", "http://a.test, http://b.test"),
        ]));
        assert_eq!(config.database.url.as_deref(), Some("postgres://localhost/smartsaver"));
        assert_eq!(config.database.max_connections, 3);
        assert!(config.auth.firebase_project_id.is_none());
        assert!(!config.auth_policy().dev_read_bypass);
        assert_eq!(config.security.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn unparsable_override_keeps_default() {
        let config = AppConfig::from_lookup(lookup(&[("DATABASE_CONNECTION_TIMEOUT", "soon")]));
        assert_eq!(config.database.connection_timeout, 30);
    }
}
