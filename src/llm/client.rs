//! Backend-independent chat client.

use super::{ollama, openai_compat, ChatMessage, ChatReply, StreamEvent, EMPTY_REPLY_MESSAGE};
use crate::config::ProviderConfig;
use crate::error::{GriotError, ProviderError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use tracing::{debug, info, instrument, warn};

/// Chat client bound to one configured backend.
///
/// Stateless between calls apart from its configuration and the pooled
/// HTTP client. Every call issues exactly one HTTP request, bounded by the
/// configured timeout.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    provider: ProviderConfig,
}

impl LlmClient {
    /// Create a client for `provider`, validating its headers.
    pub fn new(provider: ProviderConfig) -> Result<Self> {
        let headers = default_headers(&provider)?;

        let http = reqwest::Client::builder()
            .timeout(provider.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| GriotError::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!("Using {}", provider);
        Ok(Self { http, provider })
    }

    pub fn provider(&self) -> &ProviderConfig {
        &self.provider
    }

    /// Send a conversation and wait for the complete reply.
    #[instrument(skip(self, messages), fields(provider = self.provider.label(), messages = messages.len()))]
    pub async fn chat(&self, messages: &[ChatMessage]) -> std::result::Result<ChatReply, ProviderError> {
        let label = self.provider.label();
        let response = self.send(messages, false).await?;
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::from_reqwest(label, e))?;

        let content = match &self.provider {
            ProviderConfig::Ollama(_) => ollama::parse_reply(&body)?,
            ProviderConfig::Vllm(_)
            | ProviderConfig::LlamaCpp(_)
            | ProviderConfig::HostedInference(_) => openai_compat::parse_reply(label, &body)?,
        };

        let content = content
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| EMPTY_REPLY_MESSAGE.to_string());
        debug!("Received {} characters", content.len());

        Ok(ChatReply { content })
    }

    /// Send a conversation and deliver the reply fragment by fragment.
    ///
    /// `on_event` receives every text fragment in arrival order, then exactly
    /// one terminal event: [`StreamEvent::Done`] on completion or
    /// [`StreamEvent::Error`] on any failure. It is never called again after
    /// the terminal event, and this method never fails.
    #[instrument(skip(self, messages, on_event), fields(provider = self.provider.label(), messages = messages.len()))]
    pub async fn chat_stream<F>(&self, messages: &[ChatMessage], mut on_event: F)
    where
        F: FnMut(StreamEvent) + Send,
    {
        let outcome = {
            let mut emit = |fragment: String| on_event(StreamEvent::Fragment(fragment));
            self.stream_fragments(messages, &mut emit).await
        };

        match outcome {
            Ok(()) => {
                debug!("Stream complete");
                on_event(StreamEvent::Done);
            }
            Err(e) => {
                warn!("Stream failed: {}", e);
                on_event(StreamEvent::Error(e.to_string()));
            }
        }
    }

    async fn stream_fragments(
        &self,
        messages: &[ChatMessage],
        emit: &mut (dyn FnMut(String) + Send),
    ) -> std::result::Result<(), ProviderError> {
        let response = self.send(messages, true).await?;

        match &self.provider {
            ProviderConfig::Ollama(_) => ollama::read_stream(response, emit).await,
            ProviderConfig::Vllm(_)
            | ProviderConfig::LlamaCpp(_)
            | ProviderConfig::HostedInference(_) => {
                openai_compat::read_stream(self.provider.label(), response, emit).await
            }
        }
    }

    /// Issue the request and reject non-success statuses.
    async fn send(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> std::result::Result<reqwest::Response, ProviderError> {
        let label = self.provider.label();

        let request = match &self.provider {
            ProviderConfig::Ollama(s) => self
                .http
                .post(ollama::endpoint(&s.base_url))
                .json(&ollama::ChatRequest::new(&s.model, messages, stream)),
            ProviderConfig::Vllm(s) | ProviderConfig::HostedInference(s) => self
                .http
                .post(openai_compat::endpoint(&s.base_url))
                .json(&openai_compat::ChatRequest {
                    model: Some(&s.model),
                    messages,
                    max_tokens: s.max_tokens,
                    temperature: s.temperature,
                    stream,
                }),
            ProviderConfig::LlamaCpp(s) => self
                .http
                .post(openai_compat::endpoint(&s.base_url))
                .json(&openai_compat::ChatRequest {
                    model: None,
                    messages,
                    max_tokens: s.max_tokens,
                    temperature: s.temperature,
                    stream,
                }),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(label, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} request failed with status {}: {}", label, status, body);
            return Err(ProviderError::Status {
                provider: label,
                status,
            });
        }

        Ok(response)
    }
}

/// Authorization plus configured extra headers. Extra headers win on conflict.
fn default_headers(provider: &ProviderConfig) -> std::result::Result<HeaderMap, ProviderError> {
    let mut headers = HeaderMap::new();

    if let Some(key) = provider.api_key() {
        let value = HeaderValue::from_str(&format!("Bearer {}", key.trim())).map_err(|e| {
            ProviderError::InvalidHeader {
                name: AUTHORIZATION.to_string(),
                reason: e.to_string(),
            }
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    for (name, value) in provider.headers() {
        let invalid = |reason: String| ProviderError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LlamaCppSettings, OllamaSettings, OpenAiCompatibleSettings};
    use crate::llm::test_support::spawn_backend;
    use axum::http::{HeaderMap as AxumHeaders, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::Value;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Captured = Arc<Mutex<Vec<(AxumHeaders, Value)>>>;

    fn ollama(base_url: String) -> ProviderConfig {
        ProviderConfig::Ollama(OllamaSettings {
            base_url,
            ..Default::default()
        })
    }

    fn vllm(base_url: String) -> ProviderConfig {
        ProviderConfig::Vllm(OpenAiCompatibleSettings {
            base_url,
            model: "mistral".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
    }

    /// Backend that records each request and answers with a fixed body.
    fn recording_backend(
        path: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> (Router, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let sink = captured.clone();
        let router = Router::new().route(
            path,
            post(move |headers: AxumHeaders, Json(request): Json<Value>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push((headers, request));
                    ([("content-type", content_type)], body)
                }
            }),
        );
        (router, captured)
    }

    async fn collect_stream(client: &LlmClient) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        client
            .chat_stream(&[ChatMessage::user("Tell me a story")], |event| {
                events.push(event)
            })
            .await;
        events
    }

    #[tokio::test]
    async fn test_ollama_chat() {
        let (router, captured) = recording_backend(
            "/api/chat",
            "application/json",
            r#"{"message":{"role":"assistant","content":"Welcome to the archive."},"done":true}"#,
        );
        let client = LlmClient::new(ollama(spawn_backend(router).await)).unwrap();

        let reply = client.chat(&[ChatMessage::user("Hello")]).await.unwrap();
        assert_eq!(reply.content, "Welcome to the archive.");

        let requests = captured.lock().unwrap();
        let (headers, body) = &requests[0];
        assert_eq!(body["model"], "llama3.2");
        assert_eq!(body["stream"], false);
        assert_eq!(body["messages"][0]["content"], "Hello");
        assert!(headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_ollama_stream_fragments_then_done() {
        let (router, _) = recording_backend(
            "/api/chat",
            "application/x-ndjson",
            concat!(
                "{\"message\":{\"role\":\"assistant\",\"content\":\"Hel\"},\"done\":false}\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\"lo\"},\"done\":false}\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n",
                "{\"message\":{\"role\":\"assistant\",\"content\":\"ignored\"},\"done\":false}\n",
            ),
        );
        let client = LlmClient::new(ollama(spawn_backend(router).await)).unwrap();

        let events = collect_stream(&client).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Fragment("Hel".into()),
                StreamEvent::Fragment("lo".into()),
                StreamEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_vllm_chat_sends_auth_and_headers() {
        let (router, captured) = recording_backend(
            "/v1/chat/completions",
            "application/json",
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi"}}]}"#,
        );
        let base_url = spawn_backend(router).await;
        let mut config = OpenAiCompatibleSettings {
            base_url,
            model: "mistral".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        config
            .headers
            .insert("X-Archive".to_string(), "griot".to_string());
        let client = LlmClient::new(ProviderConfig::HostedInference(config)).unwrap();

        let reply = client.chat(&[ChatMessage::user("Hello")]).await.unwrap();
        assert_eq!(reply.content, "Hi");

        let requests = captured.lock().unwrap();
        let (headers, body) = &requests[0];
        assert_eq!(headers["authorization"], "Bearer sk-test");
        assert_eq!(headers["x-archive"], "griot");
        assert_eq!(body["model"], "mistral");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn test_llamacpp_omits_model() {
        let (router, captured) = recording_backend(
            "/v1/chat/completions",
            "application/json",
            r#"{"choices":[{"message":{"content":"Ok"}}]}"#,
        );
        let base_url = spawn_backend(router).await;
        let client = LlmClient::new(ProviderConfig::LlamaCpp(LlamaCppSettings {
            base_url,
            ..Default::default()
        }))
        .unwrap();

        client.chat(&[ChatMessage::user("Hello")]).await.unwrap();

        let requests = captured.lock().unwrap();
        assert!(requests[0].1.get("model").is_none());
    }

    #[tokio::test]
    async fn test_empty_reply_uses_fallback_text() {
        let (router, _) = recording_backend(
            "/v1/chat/completions",
            "application/json",
            r#"{"choices":[{"message":{"content":""}}]}"#,
        );
        let client = LlmClient::new(vllm(spawn_backend(router).await)).unwrap();

        let reply = client.chat(&[ChatMessage::user("Hello")]).await.unwrap();
        assert_eq!(reply.content, EMPTY_REPLY_MESSAGE);
    }

    #[tokio::test]
    async fn test_sse_stream_fragments_then_done() {
        let (router, captured) = recording_backend(
            "/v1/chat/completions",
            "text/event-stream",
            concat!(
                "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n\n",
                "data: {broken\n\n",
                "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\n\n",
                "data: [DONE]\n\n",
            ),
        );
        let client = LlmClient::new(vllm(spawn_backend(router).await)).unwrap();

        let events = collect_stream(&client).await;
        assert_eq!(
            events,
            vec![
                StreamEvent::Fragment("Hel".into()),
                StreamEvent::Fragment("lo".into()),
                StreamEvent::Done,
            ]
        );
        assert_eq!(captured.lock().unwrap()[0].1["stream"], true);
    }

    #[tokio::test]
    async fn test_stream_without_marker_still_completes() {
        let (router, _) = recording_backend(
            "/v1/chat/completions",
            "text/event-stream",
            "data: {\"choices\":[{\"delta\":{\"content\":\"partial\"}}]}\n\n",
        );
        let client = LlmClient::new(vllm(spawn_backend(router).await)).unwrap();

        let events = collect_stream(&client).await;
        assert_eq!(
            events,
            vec![StreamEvent::Fragment("partial".into()), StreamEvent::Done]
        );
    }

    #[tokio::test]
    async fn test_server_error_yields_single_terminal_error() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
        );
        let client = LlmClient::new(ollama(spawn_backend(router).await)).unwrap();

        let events = collect_stream(&client).await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            StreamEvent::Error(message) => {
                assert!(!message.is_empty());
                assert!(message.contains("500"));
            }
            other => panic!("expected error event, got {:?}", other),
        }

        let err = client.chat(&[ChatMessage::user("Hi")]).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Status { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR
        ));
    }

    #[tokio::test]
    async fn test_backend_error_line_ends_stream() {
        let (router, _) = recording_backend(
            "/api/chat",
            "application/x-ndjson",
            concat!(
                "{\"message\":{\"content\":\"Hel\"},\"done\":false}\n",
                "{\"error\":\"out of memory\"}\n",
            ),
        );
        let client = LlmClient::new(ollama(spawn_backend(router).await)).unwrap();

        let events = collect_stream(&client).await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], StreamEvent::Fragment("Hel".into()));
        assert!(matches!(&events[1], StreamEvent::Error(m) if m.contains("out of memory")));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_transport_error() {
        let client = LlmClient::new(ollama("http://127.0.0.1:1".to_string())).unwrap();

        let err = client.chat(&[ChatMessage::user("Hi")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Transport { .. }));

        let events = collect_stream(&client).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Error(_)));
    }

    #[tokio::test]
    async fn test_timeout_is_reported() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "{}"
            }),
        );
        let base_url = spawn_backend(router).await;
        let client = LlmClient::new(ProviderConfig::Ollama(OllamaSettings {
            base_url,
            timeout_secs: 1,
            ..Default::default()
        }))
        .unwrap();

        let err = client.chat(&[ChatMessage::user("Hi")]).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout { .. }));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let mut settings = OllamaSettings::default();
        settings
            .headers
            .insert("bad header".to_string(), "x".to_string());

        let err = LlmClient::new(ProviderConfig::Ollama(settings)).unwrap_err();
        assert!(err.to_string().contains("bad header"));
    }

    #[test]
    fn test_default_headers() {
        let headers = default_headers(&vllm("http://localhost".to_string())).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");

        let headers = default_headers(&ollama("http://localhost".to_string())).unwrap();
        assert!(headers.is_empty());
    }
}
