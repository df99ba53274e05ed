//! Inference Service Client
//!
//! Every agent talks to the language-model provider through the
//! [`InferenceClient`] trait so that tests can substitute a scripted fake and
//! the provider is injected once at startup instead of living in a hidden
//! module-level singleton.

use anyhow::{Context, Result};
use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
};
use async_trait::async_trait;

/// Sampling temperature shared by all analysis calls. Low on purpose: the
/// agents return structured verdicts, not prose.
const ANALYSIS_TEMPERATURE: f32 = 0.3;

/// A client capable of producing a strict-JSON completion for a
/// system-prompt/user-message pair.
///
/// Implementations must return the raw JSON text of the model's reply; the
/// calling agent owns parsing and the conversion of any failure into its own
/// conservative default payload.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Requests a single chat completion constrained to a JSON object body.
    async fn complete_json(&self, system: &str, user: &str) -> Result<String>;
}

/// An [`InferenceClient`] for any OpenAI-compatible chat-completions API.
pub struct OpenAIInferenceClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAIInferenceClient {
    /// Creates a new client.
    ///
    /// # Arguments
    ///
    /// * `config` - The OpenAI client configuration (API key, base URL).
    /// * `model` - The chat model identifier to use (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

#[async_trait]
impl InferenceClient for OpenAIInferenceClient {
    async fn complete_json(&self, system: &str, user: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
            ])
            .temperature(ANALYSIS_TEMPERATURE)
            .response_format(ResponseFormat::JsonObject)
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .first()
            .context("No response choice from inference service")?
            .message
            .content
            .as_ref()
            .context("No content in inference response")?;

        Ok(content.clone())
    }
}
