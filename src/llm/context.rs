//! Knowledge-document loading and system prompt construction.

use super::ChatMessage;
use crate::config::{Prompts, Settings};
use crate::error::{GriotError, Result};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const FETCH_TIMEOUT_SECS: u64 = 10;

/// Loads the static knowledge document injected into chat prompts.
///
/// Loading never fails: any problem falls back to the built-in persona.
#[derive(Debug, Clone)]
pub struct ContextLoader {
    http: reqwest::Client,
    location: Option<String>,
    fallback: String,
}

impl ContextLoader {
    /// `location` may be an `http(s)://` URL, a `file://` URL or a local path.
    pub fn new(location: Option<String>, fallback: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            http,
            location: location.filter(|l| !l.trim().is_empty()),
            fallback: fallback.into(),
        }
    }

    pub fn from_settings(settings: &Settings, prompts: &Prompts) -> Self {
        Self::new(
            settings.context.location.clone(),
            prompts.chat.fallback_context.clone(),
        )
    }

    /// Fetch the context document, or the fallback text on any failure.
    #[instrument(skip(self), fields(location = ?self.location))]
    pub async fn load(&self) -> String {
        let Some(location) = &self.location else {
            debug!("No context document configured, using default context");
            return self.fallback.clone();
        };

        match self.fetch(location).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!("Context document is empty, using default context");
                self.fallback.clone()
            }
            Err(e) => {
                warn!("Failed to load context document, using default context: {}", e);
                self.fallback.clone()
            }
        }
    }

    async fn fetch(&self, location: &str) -> Result<String> {
        match url::Url::parse(location) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
                let response = self
                    .http
                    .get(url)
                    .send()
                    .await
                    .map_err(|e| GriotError::Context(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(GriotError::Context(format!("{} returned {}", location, status)));
                }

                response
                    .text()
                    .await
                    .map_err(|e| GriotError::Context(e.to_string()))
            }
            Ok(url) if url.scheme() == "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|_| GriotError::Context(format!("Invalid file URL: {}", location)))?;
                Ok(tokio::fs::read_to_string(path).await?)
            }
            // Anything else, including Windows drive letters, is a filesystem path.
            _ => Ok(tokio::fs::read_to_string(Settings::expand_path(location)).await?),
        }
    }
}

/// Build the system message for `user_query` using the default template.
pub fn create_system_message(context: &str, user_query: &str) -> ChatMessage {
    render_system_message(&Prompts::default(), context, user_query)
}

/// Build the system message for `user_query` from the configured template.
pub fn render_system_message(prompts: &Prompts, context: &str, user_query: &str) -> ChatMessage {
    let mut vars = HashMap::new();
    vars.insert("context".to_string(), context.to_string());
    vars.insert("query".to_string(), user_query.to_string());

    ChatMessage::system(prompts.render_with_custom(&prompts.chat.system, &vars))
}
