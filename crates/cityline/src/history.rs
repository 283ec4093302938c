//! Chat-history schema and codec
//!
//! History travels between client and server as an opaque string. The schema
//! is explicit and versioned (`role`, `content`, `timestamp`) so the stored
//! form stays decoupled from any provider's message types.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;

/// Current history document version.
pub const HISTORY_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
}

/// One stored conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub role: HistoryRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: HistoryRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDocument {
    version: u32,
    messages: Vec<StoredMessage>,
}

/// Serialize a history to its transportable string form.
pub fn encode(messages: &[StoredMessage]) -> Result<String> {
    let doc = HistoryDocument {
        version: HISTORY_VERSION,
        messages: messages.to_vec(),
    };
    serde_json::to_string(&doc).context("Failed to serialize chat history")
}

/// Deserialize a history from its string form. The empty string is a fresh
/// conversation, not an error.
pub fn decode(raw: &str) -> Result<Vec<StoredMessage>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    let doc: HistoryDocument =
        serde_json::from_str(raw).context("Failed to parse chat history")?;
    if doc.version != HISTORY_VERSION {
        bail!(
            "Unsupported chat history version {} (expected {})",
            doc.version,
            HISTORY_VERSION
        );
    }
    Ok(doc.messages)
}

/// Convert stored turns into provider messages.
pub fn to_chat_messages(messages: &[StoredMessage]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|m| match m.role {
            HistoryRole::User => ChatMessage::user(&m.content),
            HistoryRole::Assistant => ChatMessage::assistant(&m.content),
        })
        .collect()
}
