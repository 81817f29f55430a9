//! TOML configuration file loading
//!
//! Supports `~/.config/ghostreply/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Who the session talks to
    #[serde(default)]
    pub correspondent: CorrespondentFileConfig,

    /// Message history source
    #[serde(default)]
    pub store: StoreFileConfig,

    /// Completion backend
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Session defaults
    #[serde(default)]
    pub session: SessionFileConfig,

    /// API credentials
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// Reply delivery
    #[serde(default)]
    pub sink: SinkFileConfig,
}

/// Correspondent identity
#[derive(Debug, Default, Deserialize)]
pub struct CorrespondentFileConfig {
    /// Phone number or e-mail handle
    pub id: Option<String>,

    /// Display name used in prompts
    pub name: Option<String>,
}

/// Message store location
#[derive(Debug, Default, Deserialize)]
pub struct StoreFileConfig {
    /// Path to `chat.db` (`~` expanded)
    pub path: Option<String>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-3.5-turbo")
    pub model: Option<String>,

    /// OpenAI-compatible API root
    pub base_url: Option<String>,

    /// HTTP timeout for one completion
    pub request_timeout_secs: Option<u64>,
}

/// Session defaults
#[derive(Debug, Default, Deserialize)]
pub struct SessionFileConfig {
    pub max_messages: Option<u32>,
    pub prompt_extension: Option<String>,

    /// Extra blocked words, one per line (`~` expanded)
    pub blocklist_path: Option<String>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub openai_organization: Option<String>,
}

/// Reply delivery configuration
#[derive(Debug, Default, Deserialize)]
pub struct SinkFileConfig {
    /// Seconds allowed for one send
    pub timeout_secs: Option<u64>,

    /// Log replies instead of sending them
    pub dry_run: Option<bool>,
}

/// Load the TOML config file from `path`, or the standard path if `None`
///
/// Returns `ConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> ConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return ConfigFile::default();
    };

    if !path.exists() {
        return ConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                ConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            ConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/ghostreply/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("ghostreply").join("config.toml"))
}

/// Expand a leading `~/` to the home directory
#[must_use]
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
