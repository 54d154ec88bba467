//! Transformation service client
//!
//! The [`Transformer`] trait is the seam between the pipeline and the external
//! service. [`ChatTransformer`] implements it against an OpenAI-compatible chat
//! completions endpoint, asking for a strict JSON response.

use crate::config::TransformSettings;
use crate::transform::chunker::{CONTEXT_END_MARKER, CONTEXT_START_MARKER, NEW_CONTENT_MARKER};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Fixed instructions sent with every chunk
///
/// Names the same context markers that [`chunk_input`](super::chunk_input)
/// wraps around the overlap.
pub fn instructions() -> String {
    format!(
        "You convert the text of a web page into clean, well-structured Markdown \
         documentation. Keep every fact, code sample and step; drop navigation, cookie \
         banners and other page chrome. Do not invent content. Respond with a JSON object \
         holding a short `title`, a one-sentence `description` and the converted \
         `transformedContent`. If the input contains a section fenced by {} and {}, use it \
         only to understand the text after {} and never include it in transformedContent.",
        CONTEXT_START_MARKER, CONTEXT_END_MARKER, NEW_CONTENT_MARKER
    )
}

/// Classification of a failed transformation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformErrorKind {
    /// Request could not be sent or the response could not be read
    Transport,
    /// Service answered with a non-success status
    HttpStatus(u16),
    /// Response did not match the expected schema
    Schema,
}

impl fmt::Display for TransformErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => write!(f, "transport failure"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Schema => write!(f, "invalid response"),
        }
    }
}

/// A failed transformation call
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct TransformError {
    pub kind: TransformErrorKind,
    pub message: String,
}

impl TransformError {
    pub fn new(kind: TransformErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Prefixes the message with the chunk it came from
    pub fn in_chunk(mut self, index: usize, total: usize) -> Self {
        self.message = format!("chunk {}/{}: {}", index + 1, total, self.message);
        self
    }
}

/// Structured result of one transformation
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransformOutput {
    pub title: String,
    pub description: String,
    #[serde(rename = "transformedContent")]
    pub transformed_content: String,
}

impl TransformOutput {
    /// Parses and checks the JSON document returned by the service
    pub fn from_json(raw: &str) -> Result<Self, TransformError> {
        let output: Self = serde_json::from_str(raw)
            .map_err(|e| TransformError::new(TransformErrorKind::Schema, e.to_string()))?;

        if output.title.trim().is_empty() {
            return Err(TransformError::new(TransformErrorKind::Schema, "empty title"));
        }
        if output.transformed_content.trim().is_empty() {
            return Err(TransformError::new(
                TransformErrorKind::Schema,
                "empty transformedContent",
            ));
        }

        Ok(output)
    }
}

/// Turns one chunk of page content into structured output
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Makes exactly one attempt; failures are returned, never retried
    async fn transform(&self, input: &str) -> Result<TransformOutput, TransformError>;
}

/// Transformer backed by a chat completions endpoint
#[derive(Debug, Clone)]
pub struct ChatTransformer {
    client: Client,
    url: String,
    model: String,
    api_key: String,
    instructions: String,
}

impl ChatTransformer {
    pub fn new(settings: &TransformSettings, api_key: String) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/chat/completions", settings.endpoint.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
            instructions: instructions(),
        })
    }

    fn request_body(&self, input: &str) -> serde_json::Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.instructions },
                { "role": "user", "content": input },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "page_transformation",
                    "strict": true,
                    "schema": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "description": { "type": "string" },
                            "transformedContent": { "type": "string" },
                        },
                        "required": ["title", "description", "transformedContent"],
                        "additionalProperties": false,
                    },
                },
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl Transformer for ChatTransformer {
    async fn transform(&self, input: &str) -> Result<TransformOutput, TransformError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(input))
            .send()
            .await
            .map_err(|e| TransformError::new(TransformErrorKind::Transport, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransformError::new(
                TransformErrorKind::HttpStatus(status.as_u16()),
                format!("{} {}", status, body.trim()),
            ));
        }

        let chat: ChatResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                TransformError::new(TransformErrorKind::Schema, e.to_string())
            } else {
                TransformError::new(TransformErrorKind::Transport, e.to_string())
            }
        })?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TransformError::new(TransformErrorKind::Schema, "response has no content"))?;

        TransformOutput::from_json(&content)
    }
}
