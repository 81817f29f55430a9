//! Mutable session settings

use std::fmt;

use super::Setting;

/// Settings and pending preview for the running session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    /// Completion model identifier
    pub model: String,

    /// How many recent messages the next fetch asks for
    pub max_messages: u32,

    /// Text appended to every prompt
    pub prompt_extension: String,

    /// Generated reply waiting for `reply`
    pub preview: Option<String>,
}

impl SessionState {
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        max_messages: u32,
        prompt_extension: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            max_messages: max_messages.max(1),
            prompt_extension: prompt_extension.into(),
            preview: None,
        }
    }

    /// Apply a parsed `set` command
    pub fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::Model(model) => self.model = model,
            Setting::PromptExtension(ext) => self.prompt_extension = ext,
            Setting::MaxMessages(n) => self.max_messages = n.max(1),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model:    {}", self.model)?;
        writeln!(f, "max-msgs: {}", self.max_messages)?;
        if self.prompt_extension.is_empty() {
            writeln!(f, "prm-ext:  (none)")?;
        } else {
            writeln!(f, "prm-ext:  {}", self.prompt_extension)?;
        }
        write!(
            f,
            "preview:  {}",
            if self.preview.is_some() { "pending" } else { "none" }
        )
    }
}
