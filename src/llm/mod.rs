//! Chat adapter over local and hosted language-model servers.
//!
//! [`LlmClient`] exposes one interface for every configured backend:
//! a single-shot [`LlmClient::chat`] and a fragment-by-fragment
//! [`LlmClient::chat_stream`]. Backend selection happens once, from
//! [`ProviderConfig`](crate::config::ProviderConfig).

mod client;
pub mod context;
mod conversation;
mod ollama;
mod openai_compat;

pub use client::LlmClient;
pub use context::{create_system_message, ContextLoader};
pub use conversation::Conversation;

use serde::{Deserialize, Serialize};

/// Shown to users when the backend cannot be reached.
pub const APOLOGY_MESSAGE: &str = "I apologize, but I'm having trouble connecting to the knowledge base right now. Please try again in a moment.";

/// Used when a backend answers successfully but without any text.
pub const EMPTY_REPLY_MESSAGE: &str = "I apologize, but I couldn't generate a response.";

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A completed, non-streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatReply {
    pub content: String,
}

/// What a streaming call reports to its callback.
///
/// A stream yields any number of `Fragment`s followed by exactly one
/// terminal event, either `Done` or `Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Fragment(String),
    Done,
    Error(String),
}

impl StreamEvent {
    /// Wire form sent to HTTP clients.
    pub fn to_chunk(&self) -> StreamChunk {
        match self {
            StreamEvent::Fragment(content) => StreamChunk {
                content: content.clone(),
                done: false,
                error: None,
            },
            StreamEvent::Done => StreamChunk {
                content: String::new(),
                done: true,
                error: None,
            },
            StreamEvent::Error(message) => StreamChunk {
                content: String::new(),
                done: true,
                error: Some(message.clone()),
            },
        }
    }
}

/// Serialized stream event: `{content, done, error?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub content: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization() {
        let json = serde_json::to_string(&ChatMessage::user("Hello")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"Hello"}"#);

        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"Hi"}"#).unwrap();
        assert_eq!(parsed, ChatMessage::assistant("Hi"));
    }

    #[test]
    fn test_stream_chunk_wire_form() {
        let fragment = serde_json::to_value(StreamEvent::Fragment("Hel".into()).to_chunk()).unwrap();
        assert_eq!(fragment, serde_json::json!({"content": "Hel", "done": false}));

        let done = serde_json::to_value(StreamEvent::Done.to_chunk()).unwrap();
        assert_eq!(done, serde_json::json!({"content": "", "done": true}));

        let error = StreamEvent::Error("boom".into()).to_chunk();
        assert!(error.done);
        assert_eq!(error.error.as_deref(), Some("boom"));
    }
}
