//! Messages.app delivery through `osascript`

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::ReplySink;
use crate::store::normalize_correspondent;
use crate::{Error, Result};

/// Default time allowed for one `osascript` run
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(15);

/// Escape text for use inside an AppleScript string literal
#[must_use]
pub fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Build the script that sends `text` to `buddy` over iMessage
#[must_use]
pub fn build_send_script(buddy: &str, text: &str) -> String {
    format!(
        "tell application \"Messages\"\n\
         \tset targetService to 1st service whose service type = iMessage\n\
         \tset targetBuddy to buddy \"{}\" of targetService\n\
         \tsend \"{}\" to targetBuddy\n\
         end tell",
        escape_applescript(buddy),
        escape_applescript(text)
    )
}

/// Sends replies by scripting Messages.app
pub struct AppleScriptSink {
    program: PathBuf,
    buddy: String,
    timeout: Duration,
}

impl AppleScriptSink {
    /// Create a sink for `correspondent`
    ///
    /// Looks up `osascript` on PATH; if missing, sends will fail and report it.
    #[must_use]
    pub fn new(correspondent: &str, send_timeout: Duration) -> Self {
        let program = which::which("osascript").unwrap_or_else(|e| {
            tracing::warn!(error = %e, "osascript not found, replies cannot be sent");
            PathBuf::from("osascript")
        });

        Self {
            program,
            buddy: normalize_correspondent(correspondent),
            timeout: send_timeout,
        }
    }

    /// Use a different script runner (same `-e <script>` calling convention)
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Run the send script, surfacing failures as errors
    ///
    /// # Errors
    ///
    /// Returns error if the runner cannot start, times out, or exits non-zero
    pub async fn dispatch(&self, text: &str) -> Result<()> {
        let script = build_send_script(&self.buddy, text);

        let child = Command::new(&self.program)
            .arg("-e")
            .arg(&script)
            .kill_on_drop(true)
            .output();

        let output = timeout(self.timeout, child)
            .await
            .map_err(|_| Error::Send(format!("osascript timed out after {:?}", self.timeout)))?
            .map_err(|e| {
                Error::Send(format!(
                    "failed to run {}: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Send(format!(
                "osascript exited with code {code}: {}",
                stderr.trim()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl ReplySink for AppleScriptSink {
    async fn send(&self, text: &str) -> bool {
        match self.dispatch(text).await {
            Ok(()) => {
                tracing::info!(buddy = %self.buddy, chars = text.len(), "reply sent");
                true
            }
            Err(e) => {
                tracing::error!(buddy = %self.buddy, error = %e, "failed to send reply");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "applescript"
    }
}
