use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, ChatMessage};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

pub struct LmStudioClient {
    base_url: String,
    client: reqwest::Client,
}

impl LmStudioClient {
    pub fn new(base_url: String) -> Self {
        LmStudioClient {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub async fn fetch_models(&self) -> Result<Vec<String>, BackendError> {
        let url = format!("{}/models", self.base_url);
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

        let models: ModelsResponse = serde_json::from_str(&body)?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let messages = [ChatMessage::user(prompt)];
        self.chat(&messages).await
    }

    /// Single blocking request against /chat/completions. LM Studio answers
    /// with whichever model is loaded, so no model name is sent.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest { messages, temperature: 0.7, stream: false };

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

        extract_completion(&body)
    }
}

fn extract_completion(body: &str) -> Result<String, BackendError> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let text = parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(BackendError::EmptyResponse);
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_completion() {
        let body = "{\"choices\": [{\"message\": {\"role\": \"assistant\", \"content\": \" Hello. \"}}]}";
        assert_eq!(extract_completion(body).unwrap(), "Hello.");
    }

    #[test]
    fn test_no_choices_is_empty_response() {
        assert!(matches!(
            extract_completion("{\"choices\": []}"),
            Err(BackendError::EmptyResponse)
        ));
        assert!(matches!(
            extract_completion("{\"choices\": [{\"message\": {\"content\": \"   \"}}]}"),
            Err(BackendError::EmptyResponse)
        ));
    }

    #[test]
    fn test_models_parsing() {
        let models: ModelsResponse =
            serde_json::from_str("{\"data\": [{\"id\": \"qwen2.5-7b-instruct\"}]}").unwrap();
        let ids: Vec<String> = models.data.into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["qwen2.5-7b-instruct"]);
    }
}
