use crate::error::{RelevanceError, Result};
use async_trait::async_trait;

/// Prompt handed to a [`TextGenerator`]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
}

/// "Given a prompt, return text."
///
/// Timeouts and retries belong to the implementation. Callers treat any
/// error as a degraded signal.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

/// Generator that always fails; every semantic signal falls back to 0
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse> {
        Err(RelevanceError::GeneratorDisabled)
    }
}
