//! Chat-completion client used to rewrite scraped articles.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. Each article
//! becomes one request holding a single user message: the configured
//! rewrite instruction, a blank line, then the article text. The first
//! choice's message content is returned verbatim.
//!
//! Calls are not retried; a failed call fails the current topic only.

use crate::config::{Credentials, Settings};
use crate::error::PipelineError;
use crate::utils::{ensure_success, truncate_for_log};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    store: bool,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Client for the rewrite API.
pub struct ChatClient {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    store: bool,
    instruction: String,
}

impl fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("store", &self.store)
            .finish()
    }
}

impl ChatClient {
    pub fn new(client: Client, settings: &Settings, credentials: &Credentials) -> Self {
        Self {
            client,
            endpoint: format!(
                "{}/chat/completions",
                settings.openai_base_url.trim_end_matches('/')
            ),
            api_key: credentials.openai_api_key.clone(),
            model: settings.model.clone(),
            store: settings.store,
            instruction: settings.rewrite_instruction.clone(),
        }
    }

    /// The user message sent for `text`.
    fn prompt(&self, text: &str) -> String {
        if self.instruction.trim().is_empty() {
            text.to_string()
        } else {
            format!("{}\n\n{}", self.instruction, text)
        }
    }

    /// Rewrite `text` and return the model's answer.
    ///
    /// # Errors
    ///
    /// Transport failures, non-success statuses (bad key, rate limiting, …)
    /// and responses without a first choice carrying text content.
    #[instrument(level = "info", skip_all, fields(model = %self.model, chars = text.chars().count()))]
    pub async fn rewrite(&self, text: &str) -> Result<String, PipelineError> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            store: self.store,
            messages: vec![ChatMessage {
                role: "user",
                content: self.prompt(text),
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let body = ensure_success("openai", response).await?.text().await?;

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| PipelineError::MalformedResponse {
                service: "openai",
                reason: e.to_string(),
            })?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                warn!(body = %truncate_for_log(&body, 300), "Completion had no content");
                PipelineError::MalformedResponse {
                    service: "openai",
                    reason: "no choice with message content".to_string(),
                }
            })?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            chars = content.chars().count(),
            "Article rewritten"
        );
        Ok(content)
    }
}
