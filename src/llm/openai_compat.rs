//! OpenAI-style `/v1/chat/completions` wire format.
//!
//! Shared by vLLM, llama.cpp and hosted inference endpoints. Streaming
//! replies are server-sent events whose data is either the literal
//! `[DONE]` or a JSON chunk carrying `choices[0].delta.content`.

use super::ChatMessage;
use crate::error::ProviderError;
use eventsource_stream::{EventStreamError, Eventsource};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DONE_SENTINEL: &str = "[DONE]";

#[derive(Serialize, Debug)]
pub(super) struct ChatRequest<'a> {
    /// Omitted for servers that host a single model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
    pub messages: &'a [ChatMessage],
    pub max_tokens: u32,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: Option<AssistantMessage>,
}

#[derive(Deserialize, Debug)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    error: Option<serde_json::Value>,
}

#[derive(Deserialize, Debug)]
struct ChunkChoice {
    delta: Option<ChunkDelta>,
}

#[derive(Deserialize, Debug)]
struct ChunkDelta {
    content: Option<String>,
}

/// Whether a decoded event ended the model's turn.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum EventOutcome {
    Continue,
    Finished,
}

pub(super) fn endpoint(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

/// Extract `choices[0].message.content` from a non-streamed reply body.
pub(super) fn parse_reply(
    provider: &'static str,
    body: &str,
) -> Result<Option<String>, ProviderError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode {
            provider,
            message: e.to_string(),
        })?;
    Ok(response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content))
}

/// Decode the data of one server-sent event.
///
/// Malformed JSON is logged and skipped. An `error` object ends the
/// stream with that error.
pub(super) fn decode_event(
    provider: &'static str,
    data: &str,
    emit: &mut (dyn FnMut(String) + Send),
) -> Result<EventOutcome, ProviderError> {
    let data = data.trim();
    if data.is_empty() {
        return Ok(EventOutcome::Continue);
    }
    if data == DONE_SENTINEL {
        return Ok(EventOutcome::Finished);
    }

    let chunk: CompletionChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("Failed to parse {} stream chunk: {}", provider, e);
            return Ok(EventOutcome::Continue);
        }
    };

    if let Some(error) = chunk.error {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ProviderError::Backend { provider, message });
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content);

    if let Some(content) = content {
        if !content.is_empty() {
            emit(content);
        }
    }

    Ok(EventOutcome::Continue)
}

/// Read an SSE body until `[DONE]` or end of stream.
pub(super) async fn read_stream(
    provider: &'static str,
    response: reqwest::Response,
    emit: &mut (dyn FnMut(String) + Send),
) -> Result<(), ProviderError> {
    let mut events = response.bytes_stream().eventsource();

    while let Some(event) = events.next().await {
        let event = match event {
            Ok(event) => event,
            Err(EventStreamError::Transport(e)) => {
                return Err(ProviderError::from_reqwest(provider, e));
            }
            Err(e) => {
                warn!("Skipping malformed {} stream event: {}", provider, e);
                continue;
            }
        };

        if decode_event(provider, &event.data, emit)? == EventOutcome::Finished {
            return Ok(());
        }
    }

    debug!("{} stream ended without a [DONE] marker", provider);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(events: &[&str]) -> (Vec<String>, Vec<Result<EventOutcome, String>>) {
        let mut fragments = Vec::new();
        let mut outcomes = Vec::new();
        {
            let mut emit = |f: String| fragments.push(f);
            for data in events {
                outcomes.push(decode_event("vLLM", data, &mut emit).map_err(|e| e.to_string()));
            }
        }
        (fragments, outcomes)
    }

    #[test]
    fn test_request_shape_with_and_without_model() {
        let messages = vec![ChatMessage::system("ctx"), ChatMessage::user("Hi")];

        let with_model = serde_json::to_value(ChatRequest {
            model: Some("mistral"),
            messages: &messages,
            max_tokens: 1000,
            temperature: 0.5,
            stream: false,
        })
        .unwrap();
        assert_eq!(with_model["model"], "mistral");
        assert_eq!(with_model["max_tokens"], 1000);
        assert_eq!(with_model["temperature"], 0.5);
        assert_eq!(with_model["stream"], false);
        assert_eq!(with_model["messages"][0]["role"], "system");

        let without_model = serde_json::to_value(ChatRequest {
            model: None,
            messages: &messages,
            max_tokens: 1000,
            temperature: 0.5,
            stream: true,
        })
        .unwrap();
        assert!(without_model.get("model").is_none());

        assert_eq!(
            endpoint("https://inference.example.org"),
            "https://inference.example.org/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_reply() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Hello there"}}]}"#;
        assert_eq!(parse_reply("vLLM", body).unwrap().as_deref(), Some("Hello there"));
        assert_eq!(parse_reply("vLLM", r#"{"choices":[]}"#).unwrap(), None);
        assert!(parse_reply("vLLM", "<html>").is_err());
    }

    #[test]
    fn test_decode_events() {
        let (fragments, outcomes) = decode_all(&[
            r#"{"choices":[{"delta":{"role":"assistant"}}]}"#,
            r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
            "not json",
            r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
            "[DONE]",
        ]);
        assert_eq!(fragments, vec!["Hel", "lo"]);
        assert_eq!(outcomes.last(), Some(&Ok(EventOutcome::Finished)));
        assert!(outcomes[..4].iter().all(|o| o == &Ok(EventOutcome::Continue)));
    }

    #[test]
    fn test_decode_error_event() {
        let (fragments, outcomes) =
            decode_all(&[r#"{"error":{"message":"context length exceeded","code":400}}"#]);
        assert!(fragments.is_empty());
        assert!(outcomes[0]
            .as_ref()
            .unwrap_err()
            .contains("context length exceeded"));
    }
}
