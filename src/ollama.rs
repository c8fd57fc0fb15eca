use serde::{Deserialize, Serialize};

use crate::backend::BackendError;

macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if std::env::var("SCRIBEBAR_DEBUG").is_ok() {
            eprintln!($($arg)*);
        }
    };
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: String) -> Self {
        OllamaClient {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn fetch_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| BackendError::Connection { url: url.clone(), source: e })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Connection { url: url.clone(), source: e })?;

        if !status.is_success() {
            return Err(BackendError::Api { status: status.as_u16(), message: body });
        }

        let tags: TagsResponse = serde_json::from_str(&body)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Single blocking request against /api/generate. No retry, no streaming.
    pub async fn generate(&self, prompt: &str, model: &str) -> Result<String, BackendError> {
        debug_eprintln!("ollama generate: model={} prompt_len={}", model, prompt.len());

        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest { model, prompt, stream: false };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| BackendError::Connection { url: url.clone(), source: e })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BackendError::Connection { url: url.clone(), source: e })?;

        if !status.is_success() {
            return Err(BackendError::Api { status: status.as_u16(), message: body });
        }

        extract_generation(&body)
    }
}

fn extract_generation(body: &str) -> Result<String, BackendError> {
    let parsed: GenerateResponse = serde_json::from_str(body)?;
    let text = parsed.response.trim().to_string();
    if text.is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_generation() {
        let text = extract_generation("{\"response\": \"  Corrected text.  \"}").unwrap();
        assert_eq!(text, "Corrected text.");
    }

    #[test]
    fn test_empty_generation_is_an_error() {
        assert!(matches!(
            extract_generation("{\"response\": \"\"}"),
            Err(BackendError::EmptyResponse)
        ));
        assert!(matches!(
            extract_generation("{}"),
            Err(BackendError::EmptyResponse)
        ));
    }

    #[test]
    fn test_garbage_payload_is_invalid() {
        assert!(matches!(
            extract_generation("not json"),
            Err(BackendError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_tags_parsing() {
        let tags: TagsResponse =
            serde_json::from_str("{\"models\": [{\"name\": \"llama3:8b\"}, {\"name\": \"qwen2.5\"}]}")
                .unwrap();
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["llama3:8b", "qwen2.5"]);
    }
}
