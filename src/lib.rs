//! ghostreply - drafts iMessage replies with a language model
//!
//! Reads recent history with one correspondent from the Messages database,
//! turns it into a masked transcript, asks a model to continue the
//! conversation, and sends the result back through Messages.app once the
//! operator says so.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────┐   ┌───────────┐
//! │ MessageStore │──▶│ transcript │──▶│  prompt  │──▶│ Generator │
//! │  (chat.db)   │   │  (masking) │   │ (builder)│   │ (OpenAI)  │
//! └──────────────┘   └────────────┘   └──────────┘   └─────┬─────┘
//!                                                          │
//!                 ┌────────────────────────┐               │
//!                 │   SessionController    │◀──────────────┘
//!                 │ prompt/set/preview/... │──▶ ReplySink (osascript)
//!                 └────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod prompt;
pub mod session;
pub mod sink;
pub mod store;
pub mod transcript;

pub use config::{Config, Correspondent, Overrides};
pub use error::{Error, Result};
pub use generator::{OpenAiGenerator, ReplyGenerator};
pub use prompt::{STOP_SEQUENCES, build_prompt};
pub use session::{Command, CommandError, Outcome, SessionController, SessionState, Setting};
pub use sink::{AppleScriptSink, DryRunSink, ReplySink};
pub use store::{ChatDb, Message, MessageStore};
pub use transcript::{Blocklist, TranscriptLine, format_transcript};
