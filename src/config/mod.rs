//! Configuration management for ghostreply
//!
//! Precedence, highest first: command-line flag, environment variable (both
//! handled by clap), config file, built-in default.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::generator::DEFAULT_BASE_URL;
use crate::sink::DEFAULT_SEND_TIMEOUT;
use crate::store::default_chat_db_path;
use crate::{Error, Result};

use self::file::{ConfigFile, expand_home};

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// History depth used when none is configured
pub const DEFAULT_MAX_MESSAGES: u32 = 15;

/// Display name used when none is configured
pub const DEFAULT_CORRESPONDENT_NAME: &str = "my friend";

/// HTTP timeout for one completion when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The conversation partner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correspondent {
    /// Phone number or e-mail handle as known to Messages
    pub id: String,

    /// Name used when describing the conversation to the model
    pub name: String,
}

/// Values supplied on the command line or through the environment
#[derive(Default)]
pub struct Overrides {
    pub correspondent_id: Option<String>,
    pub correspondent_name: Option<String>,
    pub chat_db_path: Option<PathBuf>,
    pub model: Option<String>,
    pub max_messages: Option<u32>,
    pub prompt_extension: Option<String>,
    pub api_key: Option<String>,
    pub organization: Option<String>,
    pub base_url: Option<String>,
    pub blocklist_path: Option<PathBuf>,
    pub send_timeout_secs: Option<u64>,
    pub dry_run: bool,
}

/// Resolved configuration
#[derive(Debug)]
pub struct Config {
    pub correspondent: Correspondent,

    /// Path to the Messages database
    pub chat_db_path: PathBuf,

    /// Default completion model
    pub model: String,

    /// Default history depth
    pub max_messages: u32,

    /// Default prompt extension
    pub prompt_extension: String,

    /// `OpenAI` API key (never logged)
    pub api_key: SecretString,

    /// `OpenAI` organization header
    pub organization: Option<String>,

    /// OpenAI-compatible API root
    pub base_url: String,

    /// Extra blocked words file
    pub blocklist_path: Option<PathBuf>,

    /// Time allowed for one completion request
    pub request_timeout: Duration,

    /// Time allowed for one send
    pub send_timeout: Duration,

    /// Log replies instead of sending them
    pub dry_run: bool,
}

impl Config {
    /// Load the config file (if any) and merge `overrides` over it
    ///
    /// # Errors
    ///
    /// Returns error if a required setting is missing or invalid
    pub fn load(overrides: Overrides, config_path: Option<&std::path::Path>) -> Result<Self> {
        Self::resolve(overrides, file::load_config_file(config_path))
    }

    /// Merge `overrides` over a parsed config file
    ///
    /// # Errors
    ///
    /// Returns error if the correspondent or API key is missing, or the
    /// history depth is zero
    pub fn resolve(overrides: Overrides, file: ConfigFile) -> Result<Self> {
        let id = overrides
            .correspondent_id
            .or(file.correspondent.id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "no correspondent configured (set TARGET_PHONE_NUMBER or --target)".to_string(),
                )
            })?;

        let name = overrides
            .correspondent_name
            .or(file.correspondent.name)
            .unwrap_or_else(|| DEFAULT_CORRESPONDENT_NAME.to_string());

        let api_key = overrides
            .api_key
            .or(file.api_keys.openai)
            .filter(|k| !k.is_empty())
            .map(SecretString::from)
            .ok_or_else(|| Error::Config("no API key configured (set OPENAI_API_KEY)".to_string()))?;

        let max_messages = overrides
            .max_messages
            .or(file.session.max_messages)
            .unwrap_or(DEFAULT_MAX_MESSAGES);
        if max_messages == 0 {
            return Err(Error::Config("max messages must be at least 1".to_string()));
        }

        let chat_db_path = overrides
            .chat_db_path
            .or_else(|| file.store.path.as_deref().map(expand_home))
            .unwrap_or_else(default_chat_db_path);

        let blocklist_path = overrides
            .blocklist_path
            .or_else(|| file.session.blocklist_path.as_deref().map(expand_home));

        let send_timeout = overrides
            .send_timeout_secs
            .or(file.sink.timeout_secs)
            .map_or(DEFAULT_SEND_TIMEOUT, Duration::from_secs);

        let request_timeout = file
            .llm
            .request_timeout_secs
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);

        Ok(Self {
            correspondent: Correspondent { id, name },
            chat_db_path,
            model: overrides
                .model
                .or(file.llm.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_messages,
            prompt_extension: overrides
                .prompt_extension
                .or(file.session.prompt_extension)
                .unwrap_or_default(),
            api_key,
            organization: overrides.organization.or(file.api_keys.openai_organization),
            base_url: overrides
                .base_url
                .or(file.llm.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            blocklist_path,
            request_timeout,
            send_timeout,
            dry_run: overrides.dry_run || file.sink.dry_run.unwrap_or(false),
        })
    }
}
