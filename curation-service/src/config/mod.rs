use serde::Deserialize;
use service_core::config::{self as core_config, get_env, is_production};
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct CurationConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub store: StoreBackend,
    pub mongodb: MongoConfig,
    pub models: ModelConfig,
    pub google: GoogleConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub rate_limit: RateLimitConfig,
    pub rag: RagConfig,
    pub chat_history_limit: usize,
    pub allowed_origins: Vec<String>,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Chat and structured-output model.
    pub text_model: String,
    /// Image understanding model.
    pub vision_model: String,
    /// Poster generation model.
    pub image_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub provider_url: String,
    pub anon_key: String,
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub local_path: String,
    pub public_base_url: String,
    pub bucket_url: Option<String>,
    pub bucket: Option<String>,
    pub service_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Local,
    Bucket,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub signup_attempts: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RagConfig {
    pub library_path: Option<String>,
    pub max_passages: usize,
    pub max_chars: usize,
}

impl CurationConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        let store = get_env("STORE_BACKEND", Some("mongo"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The in-memory store needs no database settings.
        let mongodb = if store == StoreBackend::Mongo {
            MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("curation_db"), is_prod)?,
            }
        } else {
            MongoConfig {
                uri: String::new(),
                database: get_env("MONGODB_DATABASE", Some("curation_db"), false)?,
            }
        };

        let storage_backend: StorageBackend = get_env("STORAGE_BACKEND", Some("local"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let storage = StorageConfig {
            local_path: get_env("STORAGE_LOCAL_PATH", Some("storage"), false)?,
            public_base_url: get_env(
                "STORAGE_PUBLIC_BASE_URL",
                Some("http://localhost:8080/files"),
                is_prod,
            )?,
            bucket_url: env::var("STORAGE_BUCKET_URL").ok(),
            bucket: env::var("STORAGE_BUCKET").ok(),
            service_key: env::var("STORAGE_SERVICE_KEY").ok(),
            backend: storage_backend,
        };
        if storage.backend == StorageBackend::Bucket
            && (storage.bucket_url.is_none() || storage.bucket.is_none())
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STORAGE_BUCKET_URL and STORAGE_BUCKET are required for the bucket backend"
            )));
        }

        Ok(CurationConfig {
            common: common_config,
            store,
            mongodb,
            models: ModelConfig {
                text_model: get_env("CURATION_TEXT_MODEL", Some("gemini-2.0-flash"), false)?,
                vision_model: get_env("CURATION_VISION_MODEL", Some("gemini-2.0-flash"), false)?,
                image_model: get_env(
                    "CURATION_IMAGE_MODEL",
                    Some("imagen-3.0-generate-002"),
                    false,
                )?,
            },
            google: GoogleConfig {
                // Empty outside production switches to the offline providers.
                api_key: get_env("GOOGLE_API_KEY", Some(""), is_prod)?,
            },
            auth: AuthConfig {
                provider_url: get_env("AUTH_PROVIDER_URL", Some("http://localhost:9999"), is_prod)?,
                anon_key: get_env("AUTH_PROVIDER_ANON_KEY", Some(""), false)?,
                jwt_secret: get_env("AUTH_JWT_SECRET", None, is_prod)?,
            },
            storage,
            rate_limit: RateLimitConfig {
                login_attempts: parse_or("RATE_LIMIT_LOGIN_ATTEMPTS", 5),
                signup_attempts: parse_or("RATE_LIMIT_SIGNUP_ATTEMPTS", 3),
                window_seconds: parse_or("RATE_LIMIT_WINDOW_SECONDS", 60),
            },
            rag: RagConfig {
                library_path: env::var("RAG_LIBRARY_PATH").ok(),
                max_passages: parse_or("RAG_MAX_PASSAGES", 3),
                max_chars: parse_or("RAG_MAX_CHARS", 1500),
            },
            chat_history_limit: parse_or("CHAT_HISTORY_LIMIT", 12),
            allowed_origins: split_origins(&get_env(
                "ALLOWED_ORIGINS",
                Some("http://localhost:3000"),
                false,
            )?),
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
        })
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageBackend::Local),
            "bucket" => Ok(StorageBackend::Bucket),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid store backend: {}", s)),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_backend_parses_case_insensitively() {
        assert_eq!("Bucket".parse::<StorageBackend>(), Ok(StorageBackend::Bucket));
        assert_eq!("local".parse::<StorageBackend>(), Ok(StorageBackend::Local));
        assert!("s3".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn store_backend_accepts_mongodb_alias() {
        assert_eq!("mongodb".parse::<StoreBackend>(), Ok(StoreBackend::Mongo));
        assert_eq!("memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        assert_eq!(
            split_origins("http://a.test, http://b.test ,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn parse_or_falls_back_on_missing_value() {
        assert_eq!(parse_or("CURATION_TEST_UNSET_NUMBER", 42u32), 42);
    }
}
