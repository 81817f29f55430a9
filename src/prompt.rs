//! Completion prompt builder

use chrono::{DateTime, SecondsFormat, Utc};

/// Stop sequences sent with every completion request
///
/// A newline ends the reply after one message; the actor markers catch a
/// model that starts writing the next transcript turn on the same line.
pub const STOP_SEQUENCES: [&str; 3] = ["\n", " me:", " them:"];

/// Build the instruction asking the model to continue the conversation
///
/// The extension is appended verbatim unless it is blank.
#[must_use]
pub fn build_prompt(
    transcript: &str,
    correspondent_name: &str,
    extension: &str,
    now: DateTime<Utc>,
) -> String {
    let mut sections = vec![
        format!("The following is a conversation with {correspondent_name}, a friend of mine."),
        transcript.to_string(),
    ];

    let mut closing = format!(
        "Please write a single response, in first person perspective, that best continues \
         the conversation. Reply with the message text only: do not start it with \"me\", \
         \"them\", \"@\", or a timestamp. The current time is {}.",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    if !extension.trim().is_empty() {
        closing.push(' ');
        closing.push_str(extension);
    }
    sections.push(closing);

    sections.join("\n\n")
}
