use serde::Deserialize;
use std::{fs, path::Path};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default)]
    pub qa: QaSection,
}

fn default_db_path() -> String {
    "analyses/analyses.db".to_string()
}

fn default_recent_limit() -> usize {
    5
}

/// Which endpoint answers questions about a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QaBackend {
    #[default]
    Disabled,
    Ollama,
    Remote,
}

#[derive(Debug, Deserialize)]
pub struct QaSection {
    #[serde(default)]
    pub backend: QaBackend,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
    #[serde(default = "Endpoint::ollama")]
    pub ollama: Endpoint,
    #[serde(default = "Endpoint::remote")]
    pub remote: Endpoint,
}

fn default_max_context_chars() -> usize {
    2000
}

impl Default for QaSection {
    fn default() -> Self {
        Self {
            backend: QaBackend::default(),
            max_context_chars: default_max_context_chars(),
            ollama: Endpoint::ollama(),
            remote: Endpoint::remote(),
        }
    }
}

/// An OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    pub base_url: String,
    pub model: String,
}

impl Endpoint {
    fn ollama() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "qwen2.5:3b".to_string(),
        }
    }

    fn remote() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            recent_limit: default_recent_limit(),
            qa: QaSection::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Like `load`, but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
