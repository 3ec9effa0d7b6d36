use std::env;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signing secret of the development preset; production refuses to run with it.
pub const DEV_JWT_SECRET: &str = "registrar-dev-secret-change-me";

/// bcrypt of `admin123`, the development preset's admin password.
pub const DEV_ADMIN_PASSWORD_HASH: &str = "$2b$04$RvZfdh7Wf.af7dG07jYY7uI2SGesxT0IU15m.6XZf8mz6uGqXeE/O";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: Option<String>,
    pub max_connections: u32,
    /// Seconds to wait for a pooled connection
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// YAML fixture loaded into the memory backend
    #[serde(default)]
    pub fixture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub admin_user: String,
    /// bcrypt hash (`registrar hash-password`); admin login is disabled when unset
    #[serde(default)]
    pub admin_password_hash: Option<String>,
}

impl AppConfig {
    /// Reads `REGISTRAR_CONFIG` if set, otherwise the `APP_ENV` preset, then
    /// applies env var overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("REGISTRAR_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_yaml_file(path.trim())?,
            _ => Self::preset(Self::environment_from_env()),
        };
        Ok(base.with_env_overrides())
    }

    pub fn from_env() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "config file unusable, using environment preset");
            Self::preset(Self::environment_from_env()).with_env_overrides()
        })
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&source).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn environment_from_env() -> Environment {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn preset(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("REGISTRAR_PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_REQUEST_TIMEOUT_SECS") {
            self.server.request_timeout_secs = v.parse().unwrap_or(self.server.request_timeout_secs);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Storage overrides
        if let Ok(v) = env::var("STORAGE_BACKEND") {
            match v.to_ascii_lowercase().as_str() {
                "memory" => self.storage.backend = StorageBackend::Memory,
                "postgres" | "postgresql" => self.storage.backend = StorageBackend::Postgres,
                _ => {}
            }
        }
        if let Ok(v) = env::var("STORAGE_FIXTURE") {
            self.storage.fixture = Some(v);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("ADMIN_USER") {
            self.security.admin_user = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            self.security.admin_password_hash = Some(v).filter(|h| !h.is_empty());
        }

        self
    }

    /// Startup checks the server binary runs before binding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid("JWT_SECRET must be set".into()));
        }
        if self.environment == Environment::Production && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::Invalid(
                "refusing to run production with the development JWT secret".into(),
            ));
        }
        if self.storage.backend == StorageBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Invalid(
                "DATABASE_URL is required for the postgres backend".into(),
            ));
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8080,
                request_timeout_secs: 30,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                fixture: Some("fixtures/university.yaml".to_string()),
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                admin_user: "admin".to_string(),
                admin_password_hash: Some(DEV_ADMIN_PASSWORD_HASH.to_string()),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8080,
                request_timeout_secs: 15,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                fixture: None,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24,
                admin_user: "admin".to_string(),
                admin_password_hash: None,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8080,
                request_timeout_secs: 10,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
            },
            storage: StorageConfig {
                backend: StorageBackend::Postgres,
                fixture: None,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://registrar.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                admin_user: "admin".to_string(),
                admin_password_hash: None,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.security.jwt_secret, DEV_JWT_SECRET);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn development_admin_hash_is_bcrypt_of_admin123() {
        let config = AppConfig::development();
        let hash = config.security.admin_password_hash.expect("dev admin hash");
        assert!(crate::auth::verify_password("admin123", &hash));
        assert!(!crate::auth::verify_password("admin", &hash));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.storage.backend, StorageBackend::Postgres);
        assert_eq!(config.security.jwt_expiry_hours, 4);
        assert!(config.security.admin_password_hash.is_none());
    }

    #[test]
    fn production_refuses_the_development_secret() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/registrar".into());
        assert!(config.validate().is_err());

        config.security.jwt_secret = DEV_JWT_SECRET.into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("development JWT secret"));

        config.security.jwt_secret = "a-real-secret".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn postgres_backend_needs_a_url() {
        let mut config = AppConfig::staging();
        assert!(config.validate().is_err());
        config.database.url = Some("postgres://localhost/registrar".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn yaml_document_round_trips_through_serde() {
        let yaml = serde_yaml::to_string(&AppConfig::development()).unwrap();
        assert!(yaml.contains("environment: development"));
        let parsed: AppConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.server.port, 8080);
        assert_eq!(parsed.storage.fixture.as_deref(), Some("fixtures/university.yaml"));
    }
}
