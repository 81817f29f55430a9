//! Session command parsing

use std::fmt;

use thiserror::Error;

/// Command accepted by the session loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the prompt that would be sent to the model
    Prompt,
    /// Change a session setting
    Set(Setting),
    /// Generate a reply and hold it without sending
    Preview,
    /// Send the held preview, or generate and send a fresh reply
    Reply,
    /// Print the current session settings
    Show,
    /// Print the command list
    Help,
    /// End the session
    Exit,
}

/// A session setting change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Setting {
    /// `set model <id>`
    Model(String),
    /// `set prm-ext <text...>`
    PromptExtension(String),
    /// `set max-msgs <n>`
    MaxMessages(u32),
}

impl Setting {
    /// Key used on the command line
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Model(_) => "model",
            Self::PromptExtension(_) => "prm-ext",
            Self::MaxMessages(_) => "max-msgs",
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(model) => write!(f, "model = {model}"),
            Self::PromptExtension(ext) if ext.is_empty() => write!(f, "prm-ext cleared"),
            Self::PromptExtension(ext) => write!(f, "prm-ext = {ext}"),
            Self::MaxMessages(n) => write!(f, "max-msgs = {n}"),
        }
    }
}

/// Why a command line was rejected
///
/// These never end the session; the loop reports them and reads the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid command: {0} (type `help` for the command list)")]
    Invalid(String),

    #[error("usage: set <model|prm-ext|max-msgs> <value>")]
    MissingKey,

    #[error("unknown setting `{0}` (expected model, prm-ext or max-msgs)")]
    UnknownKey(String),

    #[error("missing value for `{0}`")]
    MissingValue(&'static str),

    #[error("`{0}` takes a single value")]
    TooManyValues(&'static str),

    #[error("max-msgs must be a positive integer, got `{0}`")]
    InvalidNumber(String),
}

/// Usage text printed by `help`
pub const HELP: &str = "\
Commands:
  prompt                  show the prompt built from recent history
  preview                 generate a reply and hold it without sending
  reply                   send the held preview, or generate and send a new reply
  set model <id>          switch the completion model
  set prm-ext <text...>   append text to every prompt (empty clears)
  set max-msgs <n>        number of recent messages to include
  show                    print the current settings
  help                    print this list
  exit                    end the session";

impl Command {
    /// Parse one input line
    ///
    /// # Errors
    ///
    /// Returns a `CommandError` describing what was wrong with the line
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut tokens = line.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(CommandError::Invalid(String::new()));
        };

        let simple = match head {
            "prompt" => Some(Self::Prompt),
            "preview" => Some(Self::Preview),
            "reply" => Some(Self::Reply),
            "show" => Some(Self::Show),
            "help" => Some(Self::Help),
            "exit" => Some(Self::Exit),
            _ => None,
        };

        match (simple, head) {
            (Some(cmd), _) if tokens.next().is_none() => Ok(cmd),
            (None, "set") => {
                let args = line.trim_start().strip_prefix("set").unwrap_or_default();
                Self::parse_set(args).map(Self::Set)
            }
            _ => Err(CommandError::Invalid(line.trim().to_string())),
        }
    }

    fn parse_set(args: &str) -> Result<Setting, CommandError> {
        let args = args.trim_start();
        let (key, rest) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
        if key.is_empty() {
            return Err(CommandError::MissingKey);
        }
        let values: Vec<&str> = rest.split_whitespace().collect();

        match key {
            "model" => Ok(Setting::Model(single_value("model", &values)?.to_string())),
            "max-msgs" => {
                let raw = single_value("max-msgs", &values)?;
                match raw.parse::<u32>() {
                    Ok(n) if n > 0 => Ok(Setting::MaxMessages(n)),
                    _ => Err(CommandError::InvalidNumber(raw.to_string())),
                }
            }
            // Everything after the key, spacing intact
            "prm-ext" => Ok(Setting::PromptExtension(rest.trim_start().to_string())),
            other => Err(CommandError::UnknownKey(other.to_string())),
        }
    }
}

fn single_value<'a>(key: &'static str, values: &[&'a str]) -> Result<&'a str, CommandError> {
    match values {
        [] => Err(CommandError::MissingValue(key)),
        [value] => Ok(*value),
        _ => Err(CommandError::TooManyValues(key)),
    }
}
