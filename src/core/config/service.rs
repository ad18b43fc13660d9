use std::env;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::paths::AppPaths;
use super::validation::validate_config;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("{0} not found in environment variables")]
    MissingSecret(&'static str),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// The only origin allowed to make cross-origin requests.
    pub cors_allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: PathBuf,
    /// Skip checksum verification of the on-disk index. The artifact is not signed.
    pub allow_dangerous_deserialization: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("data").join("faiss_index"),
            allow_dangerous_deserialization: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages requested from the index.
    pub top_k: usize,
    /// Passages actually joined into the prompt context.
    pub context_passages: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            context_passages: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingBackend {
    Gemini,
    OpenaiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub backend: EmbeddingBackend,
    pub model: String,
    /// Overrides the backend's default endpoint.
    pub base_url: Option<String>,
    pub batch_size: usize,
    pub concurrency: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::Gemini,
            model: "models/text-embedding-004".to_string(),
            base_url: None,
            batch_size: 32,
            concurrency: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: "models/gemini-2.0-flash".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("RAG_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        self.paths.project_root.join("config.yml")
    }

    /// Loads `config.yml` (if any), applies environment overrides and validates.
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let path = self.config_path();
        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            parse_config(&contents).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            tracing::debug!("No config file at {}; using defaults", path.display());
            AppConfig::default()
        };

        apply_env_overrides(&mut config);
        validate_config(&config)?;
        Ok(config)
    }

    /// The Gemini key is only ever read from the environment (or `.env`).
    pub fn gemini_api_key(&self) -> Result<String, ConfigError> {
        env::var(GEMINI_API_KEY_ENV)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingSecret(GEMINI_API_KEY_ENV))
    }
}

pub fn parse_config(contents: &str) -> Result<AppConfig, serde_yaml::Error> {
    if contents.trim().is_empty() {
        return Ok(AppConfig::default());
    }
    serde_yaml::from_str(contents)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(host) = env::var("HOST") {
        config.server.host = host;
    }
    if let Some(port) = env::var("PORT").ok().and_then(|val| val.parse::<u16>().ok()) {
        config.server.port = port;
    }
    if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
        config.server.cors_allowed_origin = origin;
    }
    if let Ok(dir) = env::var("RAG_INDEX_DIR") {
        config.index.dir = PathBuf::from(dir);
    }
}
