use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_SERVER_URL: &str = "SPITCODE_OLLAMA_URL";
pub const ENV_MODEL: &str = "SPITCODE_MODEL";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ModelConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model_name() -> String {
    "qwen3:14b-q4_K_M".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_timeout_secs() -> u64 {
    600
}

impl ModelConfig {
    /// Request timeout; `timeout_secs: 0` disables it.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            name: default_model_name(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeechConfig {
    #[serde(default = "default_transcription_url")]
    pub transcription_url: String,
    /// Sent as the `model` form field; OpenAI-style servers require it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription_model: Option<String>,
    #[serde(default = "default_record_seconds")]
    pub record_seconds: u32,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Recorder binary (`arecord`, `rec`, `ffmpeg`). Auto-detected when unset.
    #[serde(default)]
    pub recorder: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_transcription_url() -> String {
    "http://localhost:8080/inference".to_string()
}

fn default_record_seconds() -> u32 {
    10
}

fn default_sample_rate() -> u32 {
    16_000
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            transcription_url: default_transcription_url(),
            transcription_model: None,
            record_seconds: default_record_seconds(),
            sample_rate: default_sample_rate(),
            recorder: None,
            language: None,
        }
    }
}

// ---------------------------------------------------------------------------
// RagConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,
    #[serde(default = "default_max_query_chars")]
    pub max_query_chars: usize,
    #[serde(default = "default_document_prefix")]
    pub document_prefix: String,
    #[serde(default = "default_query_prefix")]
    pub query_prefix: String,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("rag_docs")
}

fn default_top_k() -> usize {
    5
}

fn default_chunk_chars() -> usize {
    1200
}

fn default_embed_batch_size() -> usize {
    16
}

fn default_max_query_chars() -> usize {
    8000
}

// nomic-embed-text expects task prefixes on both sides.
fn default_document_prefix() -> String {
    "search_document: ".to_string()
}

fn default_query_prefix() -> String {
    "search_query: ".to_string()
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            top_k: default_top_k(),
            chunk_chars: default_chunk_chars(),
            embed_batch_size: default_embed_batch_size(),
            max_query_chars: default_max_query_chars(),
            document_prefix: default_document_prefix(),
            query_prefix: default_query_prefix(),
        }
    }
}

// ---------------------------------------------------------------------------
// PythonConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PythonConfig {
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub python: PythonConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: ModelConfig::default(),
            speech: SpeechConfig::default(),
            rag: RagConfig::default(),
            python: PythonConfig::default(),
        }
    }
}

impl Config {
    /// Load `.spitcode/config.yaml`, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Apply `SPITCODE_OLLAMA_URL` / `SPITCODE_MODEL` from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_SERVER_URL).ok().as_deref(),
            std::env::var(ENV_MODEL).ok().as_deref(),
        );
    }

    /// Override the model server URL and model name; empty values are ignored.
    pub fn apply_overrides(&mut self, server_url: Option<&str>, model: Option<&str>) {
        if let Some(url) = server_url.filter(|s| !s.trim().is_empty()) {
            self.model.base_url = url.trim().to_string();
        }
        if let Some(name) = model.filter(|s| !s.trim().is_empty()) {
            self.model.name = name.trim().to_string();
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        for (key, url) in [
            ("model.base_url", &self.model.base_url),
            ("speech.transcription_url", &self.speech.transcription_url),
        ] {
            if !is_http_url(url) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("{key} '{url}' is not an http(s) URL"),
                });
            }
        }

        if self.model.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "model.name is empty".to_string(),
            });
        }

        if self.rag.top_k == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "rag.top_k is 0: reviews will run without documentation context"
                    .to_string(),
            });
        }

        if self.rag.chunk_chars == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "rag.chunk_chars must be greater than 0".to_string(),
            });
        }

        if self.rag.embed_batch_size == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "rag.embed_batch_size must be greater than 0".to_string(),
            });
        }

        if self.speech.record_seconds == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "speech.record_seconds must be greater than 0".to_string(),
            });
        } else if self.speech.record_seconds > 300 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "speech.record_seconds={} (>300 is unusual)",
                    self.speech.record_seconds
                ),
            });
        }

        if self.model.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "model.timeout_secs is 0: requests will not time out".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// An absolute `http`/`https` URL with a host.
fn is_http_url(raw: &str) -> bool {
    match reqwest::Url::parse(raw.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
