//! Ollama `/api/chat` wire format.
//!
//! Streaming replies are newline-delimited JSON objects. Each object may
//! carry a `message.content` fragment; `done: true` ends the turn.

use super::ChatMessage;
use crate::error::ProviderError;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const PROVIDER: &str = "Ollama";

#[derive(Serialize, Debug)]
pub(super) struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

impl<'a> ChatRequest<'a> {
    pub(super) fn new(model: &'a str, messages: &'a [ChatMessage], stream: bool) -> Self {
        Self {
            model,
            messages,
            stream,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamLine {
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Whether a decoded line ended the model's turn.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum LineOutcome {
    Continue,
    Finished,
}

pub(super) fn endpoint(base_url: &str) -> String {
    format!("{}/api/chat", base_url.trim_end_matches('/'))
}

/// Extract `message.content` from a non-streamed reply body.
pub(super) fn parse_reply(body: &str) -> Result<Option<String>, ProviderError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode {
            provider: PROVIDER,
            message: e.to_string(),
        })?;
    Ok(response.message.and_then(|m| m.content))
}

/// Decode one NDJSON line, forwarding any text fragment to `emit`.
///
/// Unparseable lines are logged and skipped. A line carrying an `error`
/// field ends the stream with that error.
pub(super) fn decode_line(
    line: &str,
    emit: &mut (dyn FnMut(String) + Send),
) -> Result<LineOutcome, ProviderError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(LineOutcome::Continue);
    }

    let chunk: StreamLine = match serde_json::from_str(line) {
        Ok(chunk) => chunk,
        Err(e) => {
            warn!("Failed to parse Ollama stream chunk: {}", e);
            return Ok(LineOutcome::Continue);
        }
    };

    if let Some(message) = chunk.error {
        return Err(ProviderError::Backend {
            provider: PROVIDER,
            message,
        });
    }

    if let Some(content) = chunk.message.and_then(|m| m.content) {
        if !content.is_empty() {
            emit(content);
        }
    }

    if chunk.done {
        Ok(LineOutcome::Finished)
    } else {
        Ok(LineOutcome::Continue)
    }
}

/// Read an NDJSON body to completion.
///
/// Lines are reassembled across network chunks before decoding. A body that
/// ends without a `done` line is treated as complete.
pub(super) async fn read_stream(
    response: reqwest::Response,
    emit: &mut (dyn FnMut(String) + Send),
) -> Result<(), ProviderError> {
    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;
        buffer.extend_from_slice(&chunk);

        while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            if decode_line(&String::from_utf8_lossy(&line), emit)? == LineOutcome::Finished {
                return Ok(());
            }
        }
    }

    if !buffer.is_empty() {
        decode_line(&String::from_utf8_lossy(&buffer), emit)?;
    }

    debug!("Ollama stream ended without a done marker");
    Ok(())
}
