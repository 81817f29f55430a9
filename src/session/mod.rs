//! Interactive session: command parsing, state, and the command loop

mod command;
mod controller;
mod input;
mod state;

pub use command::{Command, CommandError, HELP, Setting};
pub use controller::{Outcome, PROMPT_MARKER, SessionController};
pub use input::{LineSource, ReaderInput, Readline};
pub use state::SessionState;
