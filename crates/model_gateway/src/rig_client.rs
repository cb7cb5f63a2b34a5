//! Rig LLM client adapter.
//!
//! Wraps a Rig OpenAI agent behind the [`LlmClient`] trait.

use async_trait::async_trait;

use agent_mesh_core::{
    config::LlmConfig,
    traits::{ChatMessage, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::openai;
use secrecy::{ExposeSecret, Secret};

/// Configuration for [`RigLlmClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct RigConfig {
    pub model: String,
    pub temperature: f64,
    /// Preamble prepended by Rig to every prompt.
    pub system_prompt: Option<String>,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            system_prompt: None,
        }
    }
}

impl RigConfig {
    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

impl From<&LlmConfig> for RigConfig {
    fn from(config: &LlmConfig) -> Self {
        Self::openai(config.model.clone()).with_temperature(f64::from(config.temperature))
    }
}

/// OpenAI chat model reached through Rig.
///
/// The credential comes from [`LlmConfig::api_key`], whichever source set it.
pub struct RigLlmClient {
    config: RigConfig,
    api_key: Secret<String>,
}

impl RigLlmClient {
    pub fn new(config: RigConfig, api_key: Secret<String>) -> Self {
        Self { config, api_key }
    }

    /// Fails when no API key is configured.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::ModelProvider("no OpenAI API key configured".to_string()))?;
        Ok(Self::new(RigConfig::from(config), api_key))
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Flatten a chat transcript into one prompt.
    fn build_prompt(&self, messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .map(|msg| {
                let label = match msg.role.as_str() {
                    "system" => "System",
                    "user" => "User",
                    "assistant" => "Assistant",
                    other => other,
                };
                format!("{}: {}\n\n", label, msg.content)
            })
            .collect()
    }

    fn openai_client(&self) -> Result<openai::Client> {
        openai::Client::new(self.api_key.expose_secret().as_str())
            .map_err(|e| Error::ModelProvider(format!("Failed to build OpenAI client: {}", e)))
    }

    async fn call_openai(&self, prompt: &str) -> Result<LlmResponse> {
        let client = self.openai_client()?;
        let mut builder = client.agent(&self.config.model).temperature(self.config.temperature);
        if let Some(ref system) = self.config.system_prompt {
            builder = builder.preamble(system);
        }
        let agent = builder.build();

        let response: String = agent
            .prompt(prompt)
            .await
            .map_err(|e| Error::ModelProvider(format!("OpenAI error: {}", e)))?;

        // Rig's prompt API does not report usage; estimate at 4 chars/token.
        Ok(LlmResponse {
            usage: LlmUsage {
                prompt_tokens: (prompt.len() / 4) as u64,
                completion_tokens: (response.len() / 4) as u64,
                total_tokens: ((prompt.len() + response.len()) / 4) as u64,
            },
            ..LlmResponse::text(response)
        })
    }
}

#[async_trait]
impl LlmClient for RigLlmClient {
    async fn complete(&self, prompt: &str) -> Result<LlmResponse> {
        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling LLM");
        self.call_openai(prompt).await
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<LlmResponse> {
        let prompt = self.build_prompt(messages);
        self.complete(&prompt).await
    }
}
