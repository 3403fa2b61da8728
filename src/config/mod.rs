use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub ai: AiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub enable_query_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enable_request_logging: bool,
    /// Axum body limit. Must sit above `max_report_file_bytes` so oversized
    /// uploads reach the size check and get a 400 instead of a bare 413.
    pub max_request_size_bytes: usize,
    pub max_report_file_bytes: usize,
    pub vitals_list_limit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub bcrypt_cost: u32,
}

/// Cloudinary credentials. All three parts must be present for uploads to work;
/// the server still boots without them so auth and vitals stay usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub folder: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_QUERY_LOGGING") {
            self.database.enable_query_logging = v.parse().unwrap_or(self.database.enable_query_logging);
        }

        // API overrides
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_MAX_REPORT_FILE_BYTES") {
            self.api.max_report_file_bytes = v.parse().unwrap_or(self.api.max_report_file_bytes);
        }
        if let Ok(v) = env::var("API_VITALS_LIST_LIMIT") {
            self.api.vitals_list_limit = v.parse().unwrap_or(self.api.vitals_list_limit);
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
        if let Ok(v) = env::var("SECURITY_TOKEN_EXPIRY_DAYS") {
            self.security.token_expiry_days = v.parse().unwrap_or(self.security.token_expiry_days);
        }
        if let Ok(v) = env::var("SECURITY_BCRYPT_COST") {
            self.security.bcrypt_cost = v.parse().unwrap_or(self.security.bcrypt_cost);
        }

        // Storage overrides
        if let Ok(v) = env::var("CLOUDINARY_CLOUD_NAME") {
            self.storage.cloud_name = Some(v);
        }
        if let Ok(v) = env::var("CLOUDINARY_API_KEY") {
            self.storage.api_key = Some(v);
        }
        if let Ok(v) = env::var("CLOUDINARY_API_SECRET") {
            self.storage.api_secret = Some(v);
        }
        if let Ok(v) = env::var("CLOUDINARY_FOLDER") {
            self.storage.folder = v;
        }

        // AI overrides
        if let Ok(v) = env::var("GEMINI_API_KEY") {
            self.ai.api_key = Some(v);
        }
        if let Ok(v) = env::var("GEMINI_MODEL") {
            self.ai.model = v;
        }
        if let Ok(v) = env::var("GEMINI_TIMEOUT_SECS") {
            self.ai.timeout_secs = v.parse().unwrap_or(self.ai.timeout_secs);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                enable_query_logging: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 12 * 1024 * 1024,
                max_report_file_bytes: 10 * 1024 * 1024, // 10MB
                vitals_list_limit: 50,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "healthmate-dev-secret".to_string(),
                token_expiry_days: 7,
                bcrypt_cost: 10,
            },
            storage: StorageConfig {
                cloud_name: None,
                api_key: None,
                api_secret: None,
                folder: "healthmate/reports".to_string(),
            },
            ai: AiConfig {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: 60,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connection_timeout: 10,
                enable_query_logging: true,
            },
            api: ApiConfig {
                enable_request_logging: true,
                max_request_size_bytes: 12 * 1024 * 1024,
                max_report_file_bytes: 10 * 1024 * 1024,
                vitals_list_limit: 50,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.healthmate.example".to_string()],
                jwt_secret: "healthmate-dev-secret".to_string(),
                token_expiry_days: 7,
                bcrypt_cost: 10,
            },
            storage: StorageConfig {
                cloud_name: None,
                api_key: None,
                api_secret: None,
                folder: "healthmate/reports".to_string(),
            },
            ai: AiConfig {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: 60,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connection_timeout: 5,
                enable_query_logging: false,
            },
            api: ApiConfig {
                enable_request_logging: false,
                max_request_size_bytes: 12 * 1024 * 1024,
                max_report_file_bytes: 10 * 1024 * 1024,
                vitals_list_limit: 50,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.healthmate.example".to_string()],
                jwt_secret: "healthmate-dev-secret".to_string(),
                token_expiry_days: 7,
                bcrypt_cost: 10,
            },
            storage: StorageConfig {
                cloud_name: None,
                api_key: None,
                api_secret: None,
                folder: "healthmate/reports".to_string(),
            },
            ai: AiConfig {
                api_key: None,
                model: "gemini-2.5-flash".to_string(),
                timeout_secs: 60,
            },
        }
    }
}

impl StorageConfig {
    /// Returns (cloud_name, api_key, api_secret) when fully configured.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.cloud_name, &self.api_key, &self.api_secret) {
            (Some(cloud), Some(key), Some(secret)) => {
                Some((cloud.as_str(), key.as_str(), secret.as_str()))
            }
            _ => None,
        }
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

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.api.enable_request_logging);
        assert_eq!(config.security.token_expiry_days, 7);
        assert_eq!(config.security.bcrypt_cost, 10);
        assert_eq!(config.api.vitals_list_limit, 50);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.api.enable_request_logging);
        assert_eq!(config.database.max_connections, 50);
    }

    #[test]
    fn test_body_limit_exceeds_report_cap() {
        for config in [AppConfig::development(), AppConfig::staging(), AppConfig::production()] {
            assert!(config.api.max_request_size_bytes > config.api.max_report_file_bytes);
        }
    }

    #[test]
    fn test_storage_credentials_require_all_parts() {
        let mut storage = AppConfig::development().storage;
        assert!(storage.credentials().is_none());

        storage.cloud_name = Some("demo".to_string());
        storage.api_key = Some("key".to_string());
        assert!(storage.credentials().is_none());

        storage.api_secret = Some("secret".to_string());
        assert_eq!(storage.credentials(), Some(("demo", "key", "secret")));
    }
}
