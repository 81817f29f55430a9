//! Transcript formatting
//!
//! Renders message history as a masked script, one line per message:
//!
//! ```text
//! them @ 2023-03-04T18:22:01.000Z: are we still on for tonight
//! me @ 2023-03-04T18:25:43.000Z: <funny attachment>
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::Result;
use crate::store::Message;

/// Placeholder glyph Messages inserts where an attachment sat in the text
pub const ATTACHMENT_GLYPH: char = '\u{fffc}';

/// Text rendered for a message that carried nothing but attachments
pub const ATTACHMENT_SENTINEL: &str = "<funny attachment>";

/// Character used to mask blocked words
pub const MASK_CHAR: char = '*';

const EMBEDDED_BLOCKLIST: &str = include_str!("../data/blocklist.txt");

/// Who wrote a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The operator running the session
    Me,
    /// The correspondent
    Them,
}

impl Actor {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Me => "me",
            Self::Them => "them",
        }
    }

    fn from_str(s: &str) -> Option<Self> {
        match s {
            "me" => Some(Self::Me),
            "them" => Some(Self::Them),
            _ => None,
        }
    }
}

/// Set of words masked out of transcripts
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    words: HashSet<String>,
}

impl Blocklist {
    /// Build a blocklist from arbitrary words (stored lowercase)
    #[must_use]
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        list.extend(words);
        list
    }

    /// The word list compiled into the binary
    #[must_use]
    pub fn embedded() -> Self {
        let mut list = Self::default();
        list.extend_from_text(EMBEDDED_BLOCKLIST);
        list
    }

    /// Add words from a file, one per line, `#` comments allowed
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        let before = self.words.len();
        self.extend_from_text(&content);
        tracing::debug!(
            path = %path.display(),
            added = self.words.len() - before,
            "loaded extra blocked words"
        );
        Ok(())
    }

    fn extend_from_text(&mut self, text: &str) {
        self.extend(
            text.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        );
    }

    fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.words
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
    }

    /// Whether a token matches a blocked word, ignoring case
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Mask a single token, keeping its character count
    #[must_use]
    pub fn mask<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if self.contains(token) {
            Cow::Owned(MASK_CHAR.to_string().repeat(token.chars().count()))
        } else {
            Cow::Borrowed(token)
        }
    }
}

/// Normalize and mask the text of one message
///
/// Whitespace runs collapse to a single space so the result always fits on
/// one line.
#[must_use]
pub fn mask_text(text: &str, blocklist: &Blocklist) -> String {
    let stripped: String = text.chars().filter(|c| *c != ATTACHMENT_GLYPH).collect();

    if stripped.trim().is_empty() {
        return ATTACHMENT_SENTINEL.to_string();
    }

    stripped
        .split_whitespace()
        .map(|token| blocklist.mask(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a timestamp the way transcript lines carry it
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Format ordered messages (oldest first) into a transcript
///
/// Messages without text are skipped.
#[must_use]
pub fn format_transcript(messages: &[Message], blocklist: &Blocklist) -> String {
    messages
        .iter()
        .filter_map(|message| {
            let text = message.text.as_deref()?;
            let line = TranscriptLine {
                actor: if message.is_from_me { Actor::Me } else { Actor::Them },
                timestamp: message.timestamp,
                text: mask_text(text, blocklist),
            };
            Some(line.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One rendered transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub actor: Actor,
    pub timestamp: DateTime<Utc>,
    /// Already masked text
    pub text: String,
}

impl TranscriptLine {
    /// Parse a line produced by [`format_transcript`]
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let (actor, rest) = line.split_once(" @ ")?;
        let (timestamp, text) = rest.split_once(": ")?;

        Some(Self {
            actor: Actor::from_str(actor)?,
            timestamp: DateTime::parse_from_rfc3339(timestamp)
                .ok()?
                .with_timezone(&Utc),
            text: text.to_string(),
        })
    }

    /// Turn the line back into a message
    #[must_use]
    pub fn into_message(self) -> Message {
        Message {
            text: Some(self.text),
            timestamp: self.timestamp,
            is_from_me: self.actor == Actor::Me,
        }
    }
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {}: {}",
            self.actor.as_str(),
            format_timestamp(&self.timestamp),
            self.text
        )
    }
}

/// Parse every line of a transcript, failing on the first malformed line
#[must_use]
pub fn parse_transcript(transcript: &str) -> Option<Vec<TranscriptLine>> {
    transcript.lines().map(TranscriptLine::parse).collect()
}
