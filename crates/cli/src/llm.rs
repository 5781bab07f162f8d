use crate::config::LlmConfig;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wings_relevance::{GenerationRequest, GenerationResponse, RelevanceError, Result, TextGenerator};

const MAX_ERROR_BODY_CHARS: usize = 500;

/// [`TextGenerator`] backed by an OpenAI-compatible chat completions endpoint
pub struct HttpTextGenerator {
    client: reqwest::Client,
    endpoint: reqwest::Url,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl HttpTextGenerator {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        let endpoint = reqwest::Url::parse(&config.endpoint)
            .with_context(|| format!("Invalid LLM endpoint {}", config.endpoint))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        let api_key = config.api_key();
        if api_key.is_none() {
            log::debug!(
                "{} is not set, calling {} without credentials",
                config.api_key_env,
                endpoint
            );
        }

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for HttpTextGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            max_tokens: request.max_tokens,
            temperature: 0.0,
        };

        let mut call = self
            .client
            .post(self.endpoint.clone())
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }

        let resp = call
            .send()
            .await
            .map_err(|e| RelevanceError::Generation(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| RelevanceError::Generation(e.to_string()))?;

        if !status.is_success() {
            return Err(RelevanceError::Generation(format!(
                "{} returned {}: {}",
                self.endpoint,
                status,
                excerpt(&text)
            )));
        }

        let text = extract_text(&text)?;
        log::debug!("Generation reply: {:?}", text);
        Ok(GenerationResponse { text })
    }
}

/// Text of the first choice in a chat completions body
fn extract_text(body: &str) -> Result<String> {
    let parsed: ChatCompletion = serde_json::from_str(body).map_err(|e| {
        RelevanceError::Generation(format!("Unexpected response ({e}): {}", excerpt(body)))
    })?;
    parsed
        .choices
        .into_iter()
        .find_map(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| RelevanceError::Generation("Response contained no choices".to_string()))
}

fn excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_choice_content_is_used() {
        let body = r#"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": " 0.82\n"}, "finish_reason": "stop"}
            ]
        }"#;
        assert_eq!(extract_text(body).unwrap(), "0.82");
    }

    #[test]
    fn empty_choices_is_an_error() {
        let err = extract_text(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, RelevanceError::Generation(_)));
    }

    #[test]
    fn non_json_body_is_an_error() {
        let err = extract_text("<html>bad gateway</html>").unwrap_err();
        assert!(err.to_string().contains("bad gateway"));
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m",
            messages: [ChatMessage {
                role: "user",
                content: "hi",
            }],
            max_tokens: 10,
            temperature: 0.0,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "max_tokens": 10,
                "temperature": 0.0
            })
        );
    }

    #[test]
    fn long_bodies_are_cut() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        assert_eq!(excerpt(&body).chars().count(), MAX_ERROR_BODY_CHARS + 1);
    }

    #[test]
    fn generator_builds_from_default_config() {
        let config = LlmConfig {
            api_key_env: String::new(),
            ..Default::default()
        };
        let generator = HttpTextGenerator::new(&config).unwrap();
        assert_eq!(generator.model, "gpt-4o-mini");
        assert!(generator.api_key.is_none());
    }
}
