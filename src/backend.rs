use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;

use crate::config::Config;
use crate::lmstudio::LmStudioClient;
use crate::metrics;
use crate::ollama::OllamaClient;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Ollama,
    Lmstudio,
}

impl BackendKind {
    pub const ALL: [BackendKind; 2] = [BackendKind::Ollama, BackendKind::Lmstudio];
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Ollama => f.write_str("ollama"),
            BackendKind::Lmstudio => f.write_str("lmstudio"),
        }
    }
}

/// Failures from the local model servers. One request per call; the caller
/// decides what to show, nothing is retried here.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot reach backend at {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("backend returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("backend returned an empty response")]
    EmptyResponse,

    #[error("invalid response payload: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user<T: Into<String>>(content: T) -> Self {
        ChatMessage { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant<T: Into<String>>(content: T) -> Self {
        ChatMessage { role: "assistant".to_string(), content: content.into() }
    }
}

pub enum BackendClient {
    Ollama(OllamaClient),
    LmStudio(LmStudioClient),
}

impl BackendClient {
    pub fn from_config(config: &Config) -> Self {
        match config.backend {
            BackendKind::Ollama => BackendClient::Ollama(OllamaClient::new(config.ollama.host.clone())),
            BackendKind::Lmstudio => {
                BackendClient::LmStudio(LmStudioClient::new(config.lmstudio.host.clone()))
            }
        }
    }

    pub async fn fetch_models(&self) -> Result<Vec<String>, BackendError> {
        match self {
            BackendClient::Ollama(client) => client.fetch_models().await,
            BackendClient::LmStudio(client) => client.fetch_models().await,
        }
    }

    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, BackendError> {
        let started = Instant::now();
        let result = match self {
            BackendClient::Ollama(client) => client.generate(prompt, model).await,
            // LM Studio serves whichever model is loaded; it ignores the name.
            BackendClient::LmStudio(client) => client.generate(prompt).await,
        };

        let tokens_received = result.as_deref().map(metrics::estimate_tokens).unwrap_or(0);
        metrics::record_request(
            started.elapsed(),
            result.is_ok(),
            metrics::estimate_tokens(prompt),
            tokens_received,
        );
        result
    }

    pub async fn chat(&self, messages: &[ChatMessage], model: &str) -> Result<String, BackendError> {
        match self {
            BackendClient::Ollama(_) => {
                // Ollama's generate endpoint takes a single prompt, so the
                // transcript is flattened into one.
                self.generate(&flatten_transcript(messages), model).await
            }
            BackendClient::LmStudio(client) => {
                let started = Instant::now();
                let result = client.chat(messages).await;
                let sent: u64 = messages.iter().map(|m| metrics::estimate_tokens(&m.content)).sum();
                let received = result.as_deref().map(metrics::estimate_tokens).unwrap_or(0);
                metrics::record_request(started.elapsed(), result.is_ok(), sent, received);
                result
            }
        }
    }
}

fn flatten_transcript(messages: &[ChatMessage]) -> String {
    let mut prompt = String::new();
    for message in messages {
        let speaker = if message.role == "assistant" { "Assistant" } else { "User" };
        prompt.push_str(&format!("{}: {}\n", speaker, message.content));
    }
    prompt.push_str("Assistant:");
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_transcript() {
        let messages = vec![
            ChatMessage::user("hello"),
            ChatMessage::assistant("hi there"),
            ChatMessage::user("translate this"),
        ];
        let prompt = flatten_transcript(&messages);
        assert_eq!(
            prompt,
            "User: hello\nAssistant: hi there\nUser: translate this\nAssistant:"
        );
    }

    #[tokio::test]
    async fn test_generate_against_unreachable_endpoint() {
        let client = BackendClient::Ollama(OllamaClient::new("http://127.0.0.1:1".to_string()));
        let result = client.generate("hello", "llama3").await;
        assert!(matches!(result, Err(BackendError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_fetch_models_against_unreachable_endpoint() {
        let client =
            BackendClient::LmStudio(LmStudioClient::new("http://127.0.0.1:1/v1".to_string()));
        let result = client.fetch_models().await;
        assert!(matches!(result, Err(BackendError::Connection { .. })));
    }
}
