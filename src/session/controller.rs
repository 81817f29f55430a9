//! Session command loop
//!
//! One command runs to completion (history read, generation, dispatch) before
//! the next line is read. `execute` takes `&mut self`, so state changes are
//! ordered by construction.

use std::io::Write;
use std::sync::Arc;

use chrono::Utc;

use super::input::LineSource;
use super::{Command, HELP, SessionState, Setting};
use crate::Result;
use crate::config::Correspondent;
use crate::generator::ReplyGenerator;
use crate::prompt::{STOP_SEQUENCES, build_prompt};
use crate::sink::ReplySink;
use crate::store::MessageStore;
use crate::transcript::{Blocklist, format_transcript};

/// Text shown before each command line
pub const PROMPT_MARKER: &str = "ghostreply> ";

/// What a command produced, for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Built prompt, not sent anywhere
    Prompt(String),
    /// A setting changed
    Updated(Setting),
    /// Generated reply now held as the preview
    Preview(String),
    /// A reply went to the sink
    Sent { text: String, success: bool },
    /// Current settings
    State(String),
    /// Command list
    Help,
    /// Session over
    Exit,
}

impl Outcome {
    /// Render the outcome for the operator
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Prompt(prompt) => format!("Prompt:\n{prompt}"),
            Self::Updated(setting) => format!("ok: {setting}"),
            Self::Preview(text) => {
                format!("Preview (not sent, `reply` to send it):\n{text}")
            }
            Self::Sent {
                text,
                success: true,
            } => format!("Sent message: {text}"),
            Self::Sent {
                text,
                success: false,
            } => format!("Send failed, message not delivered: {text}"),
            Self::State(state) => state.clone(),
            Self::Help => HELP.to_string(),
            Self::Exit => "bye".to_string(),
        }
    }
}

/// Drives a session against its collaborators
pub struct SessionController {
    correspondent: Correspondent,
    state: SessionState,
    blocklist: Blocklist,
    store: Arc<dyn MessageStore>,
    generator: Arc<dyn ReplyGenerator>,
    sink: Arc<dyn ReplySink>,
}

impl SessionController {
    #[must_use]
    pub fn new(
        correspondent: Correspondent,
        state: SessionState,
        blocklist: Blocklist,
        store: Arc<dyn MessageStore>,
        generator: Arc<dyn ReplyGenerator>,
        sink: Arc<dyn ReplySink>,
    ) -> Self {
        Self {
            correspondent,
            state,
            blocklist,
            store,
            generator,
            sink,
        }
    }

    /// Current session state
    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    /// Fetch history and build the completion prompt
    ///
    /// # Errors
    ///
    /// Returns error if the message store fails
    pub async fn build_prompt(&self) -> Result<String> {
        let limit = self.state.max_messages;
        let mut messages = self.store.fetch(&self.correspondent.id, limit).await?;

        // Keep the newest `limit` even if a store over-delivers
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if messages.len() > limit {
            messages.drain(..messages.len() - limit);
        }

        let transcript = format_transcript(&messages, &self.blocklist);
        tracing::debug!(
            messages = messages.len(),
            transcript_chars = transcript.len(),
            "built transcript"
        );

        Ok(build_prompt(
            &transcript,
            &self.correspondent.name,
            &self.state.prompt_extension,
            Utc::now(),
        ))
    }

    async fn generate(&self) -> Result<String> {
        let prompt = self.build_prompt().await?;
        tracing::info!(
            model = %self.state.model,
            generator = self.generator.name(),
            "generating reply"
        );
        self.generator
            .complete(&prompt, &self.state.model, &STOP_SEQUENCES)
            .await
    }

    /// Run one command
    ///
    /// # Errors
    ///
    /// Returns error if the message store or the generator fails; the session
    /// cannot continue after that. Send failures are reported in the outcome.
    pub async fn execute(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(?command, "executing command");

        match command {
            Command::Prompt => Ok(Outcome::Prompt(self.build_prompt().await?)),
            Command::Set(setting) => {
                self.state.apply(setting.clone());
                tracing::info!(key = setting.key(), "setting updated");
                Ok(Outcome::Updated(setting))
            }
            Command::Preview => {
                self.state.preview = None;
                let text = self.generate().await?;
                self.state.preview = Some(text.clone());
                Ok(Outcome::Preview(text))
            }
            Command::Reply => {
                let text = match self.state.preview.take() {
                    Some(text) => text,
                    None => self.generate().await?,
                };
                let success = self.sink.send(&text).await;
                if !success {
                    tracing::warn!(sink = self.sink.name(), "reply was not delivered");
                }
                Ok(Outcome::Sent { text, success })
            }
            Command::Show => Ok(Outcome::State(self.state.to_string())),
            Command::Help => Ok(Outcome::Help),
            Command::Exit => {
                self.state.preview = None;
                Ok(Outcome::Exit)
            }
        }
    }

    /// Read, execute, and report commands until `exit` or end of input
    ///
    /// # Errors
    ///
    /// Returns the first fatal error (store, generator, input, or output)
    pub async fn run<I, W>(&mut self, input: &mut I, out: &mut W) -> Result<()>
    where
        I: LineSource,
        W: Write,
    {
        tracing::info!(correspondent = %self.correspondent.name, "session started");

        loop {
            let Some(line) = input.read_line(PROMPT_MARKER)? else {
                tracing::debug!("end of input");
                self.execute(Command::Exit).await?;
                break;
            };

            if line.trim().is_empty() {
                continue;
            }

            let command = match Command::parse(&line) {
                Ok(command) => command,
                Err(e) => {
                    writeln!(out, "error: {e}")?;
                    out.flush()?;
                    continue;
                }
            };

            let outcome = self.execute(command).await?;
            writeln!(out, "{}", outcome.render())?;
            out.flush()?;

            if outcome == Outcome::Exit {
                break;
            }
        }

        tracing::info!("session ended");
        Ok(())
    }
}
