//! Configuration settings for Griot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub catalog: CatalogSettings,
    pub context: ContextSettings,
    pub llm: ProviderConfig,
    pub server: ServerSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Where the video catalog is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path to the catalog file (.toml or .json).
    pub path: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: "metadata/videos.yaml".to_string(),
        }
    }
}

/// Knowledge document injected into chat prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ContextSettings {
    /// URL (http, https, file) or local path of the context document.
    /// When unset, the built-in persona text is used.
    pub location: Option<String>,
}

/// HTTP API server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Most messages forwarded per `/chat` request, the new one included.
    /// Older exchanges are dropped whole.
    pub max_history: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            max_history: 20,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Language-model backend selection.
///
/// Exactly one variant is configured per process. In TOML the variant is
/// chosen with the `provider` key of the `[llm]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider")]
pub enum ProviderConfig {
    #[serde(rename = "ollama")]
    Ollama(OllamaSettings),
    #[serde(rename = "vllm")]
    Vllm(OpenAiCompatibleSettings),
    #[serde(rename = "llamacpp", alias = "llama.cpp")]
    LlamaCpp(LlamaCppSettings),
    #[serde(rename = "hosted-inference", alias = "openshift-ai")]
    HostedInference(OpenAiCompatibleSettings),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Ollama(OllamaSettings::default())
    }
}

/// Settings for a local Ollama server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OllamaSettings {
    pub base_url: String,
    pub model: String,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Settings for OpenAI-compatible servers that take a model name and an
/// optional bearer token (vLLM, hosted inference endpoints).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OpenAiCompatibleSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for OpenAiCompatibleSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            model: "meta-llama/Llama-3.2-3B-Instruct".to_string(),
            api_key: None,
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Settings for a llama.cpp server. The server serves a single loaded
/// model, so no model name is sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlamaCppSettings {
    pub base_url: String,
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for LlamaCppSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            headers: HashMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ProviderConfig {
    /// Human-readable backend name used in logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            ProviderConfig::Ollama(_) => "Ollama",
            ProviderConfig::Vllm(_) => "vLLM",
            ProviderConfig::LlamaCpp(_) => "llama.cpp",
            ProviderConfig::HostedInference(_) => "Hosted inference",
        }
    }

    pub fn base_url(&self) -> &str {
        match self {
            ProviderConfig::Ollama(s) => &s.base_url,
            ProviderConfig::Vllm(s) | ProviderConfig::HostedInference(s) => &s.base_url,
            ProviderConfig::LlamaCpp(s) => &s.base_url,
        }
    }

    /// Model identifier, if this backend takes one.
    pub fn model(&self) -> Option<&str> {
        match self {
            ProviderConfig::Ollama(s) => Some(&s.model),
            ProviderConfig::Vllm(s) | ProviderConfig::HostedInference(s) => Some(&s.model),
            ProviderConfig::LlamaCpp(_) => None,
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        match self {
            ProviderConfig::Vllm(s) | ProviderConfig::HostedInference(s) => {
                s.api_key.as_deref().filter(|k| !k.is_empty())
            }
            ProviderConfig::Ollama(_) | ProviderConfig::LlamaCpp(_) => None,
        }
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        match self {
            ProviderConfig::Ollama(s) => &s.headers,
            ProviderConfig::Vllm(s) | ProviderConfig::HostedInference(s) => &s.headers,
            ProviderConfig::LlamaCpp(s) => &s.headers,
        }
    }

    pub fn timeout(&self) -> Duration {
        let secs = match self {
            ProviderConfig::Ollama(s) => s.timeout_secs,
            ProviderConfig::Vllm(s) | ProviderConfig::HostedInference(s) => s.timeout_secs,
            ProviderConfig::LlamaCpp(s) => s.timeout_secs,
        };
        Duration::from_secs(secs)
    }
}

impl std::fmt::Display for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.model() {
            Some(model) => write!(f, "{} ({} @ {})", self.label(), model, self.base_url()),
            None => write!(f, "{} (@ {})", self.label(), self.base_url()),
        }
    }
}

impl Settings {
    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::GriotError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("griot")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded catalog file path.
    pub fn catalog_path(&self) -> PathBuf {
        Self::expand_path(&self.catalog.path)
    }
}
