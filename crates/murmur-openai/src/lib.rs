// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI Chat Completions provider adapter for Murmur.
//!
//! This crate implements [`ProviderAdapter`] for `POST /chat/completions`.
//! A missing or empty reply is returned as an empty completion, not an error,
//! so the engine can treat it as a no-response.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use murmur_config::OpenAiConfig;
use murmur_core::error::MurmurError;
use murmur_core::traits::{PluginAdapter, ProviderAdapter};
use murmur_core::types::{AdapterType, CompletionRequest, CompletionResponse, HealthStatus};
use tracing::{debug, info};

use crate::client::OpenAiClient;
use crate::types::{ChatCompletionRequest, ChatMessage};

/// OpenAI provider implementing [`ProviderAdapter`].
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    /// Creates a provider from the `[openai]` config section.
    ///
    /// The API key must already be resolved (config loading falls back to
    /// `OPENAI_API_KEY`).
    pub fn new(config: &OpenAiConfig) -> Result<Self, MurmurError> {
        let api_key = require_api_key(&config.api_key)?;
        let client = OpenAiClient::new(
            api_key,
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        info!(
            model = %config.model,
            endpoint = %client.endpoint(),
            "OpenAI provider initialized"
        );
        Ok(Self { client })
    }

    /// Creates a provider with an existing client (for testing).
    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }
}

fn require_api_key(key: &Option<String>) -> Result<&str, MurmurError> {
    match key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key),
        _ => Err(MurmurError::Config(
            "OpenAI API key not found. Set openai.api_key in config or the OPENAI_API_KEY environment variable.".into(),
        )),
    }
}

/// Maps the engine's request onto the wire format, system prompt first.
fn to_chat_request(request: &CompletionRequest) -> ChatCompletionRequest {
    let system = request
        .system_prompt
        .as_deref()
        .filter(|prompt| !prompt.trim().is_empty())
        .map(|prompt| ChatMessage {
            role: "system".to_string(),
            content: prompt.to_string(),
        });

    let messages = system
        .into_iter()
        .chain(request.messages.iter().map(|turn| ChatMessage {
            role: turn.role.to_string(),
            content: turn.content.clone(),
        }))
        .collect();

    ChatCompletionRequest {
        model: request.model.clone(),
        messages,
        max_tokens: request.max_tokens,
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        // No test request: it would spend tokens.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        debug!("OpenAI provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, MurmurError> {
        let chat_request = to_chat_request(&request);
        let response = self.client.complete(&chat_request).await?;

        Ok(CompletionResponse {
            content: response.first_text(),
            finish_reason: response.finish_reason().map(str::to_string),
            model: response.model.unwrap_or(request.model),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::Turn;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(system_prompt: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".into(),
            system_prompt: system_prompt.map(str::to_string),
            messages: vec![
                Turn::user("<@UBOT> hi"),
                Turn::assistant("hello"),
                Turn::user("<@UBOT> again"),
            ],
            max_tokens: 200,
        }
    }

    #[test]
    fn api_key_is_required() {
        assert!(require_api_key(&None).is_err());
        assert!(require_api_key(&Some("  ".into())).is_err());
        assert_eq!(require_api_key(&Some("sk-1".into())).unwrap(), "sk-1");
    }

    #[test]
    fn chat_request_keeps_turn_order_behind_system_prompt() {
        let chat = to_chat_request(&request(Some("Be brief.")));
        let roles: Vec<&str> = chat.messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(chat.messages[0].content, "Be brief.");
        assert_eq!(chat.max_tokens, 200);

        let bare = to_chat_request(&request(Some("   ")));
        assert_eq!(bare.messages.len(), 3);
    }

    #[test]
    fn new_rejects_missing_key() {
        let config = OpenAiConfig::default();
        let err = OpenAiProvider::new(&config).err().unwrap();
        assert!(matches!(err, MurmurError::Config(_)));
    }

    #[tokio::test]
    async fn complete_maps_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-4o", "max_tokens": 200})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-2024-08-06",
                "choices": [{"message": {"role": "assistant", "content": " Sure. "}, "finish_reason": "stop"}]
            })))
            .mount(&server)
            .await;

        let config = OpenAiConfig {
            api_key: Some("sk-test".into()),
            base_url: server.uri(),
            ..OpenAiConfig::default()
        };
        let provider = OpenAiProvider::new(&config).unwrap();
        let resp = provider.complete(request(None)).await.unwrap();
        assert_eq!(resp.content, "Sure.");
        assert_eq!(resp.model, "gpt-4o-2024-08-06");
        assert_eq!(resp.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn missing_choices_is_an_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})))
            .mount(&server)
            .await;

        let client = OpenAiClient::new("sk-test", &server.uri(), Duration::from_secs(5)).unwrap();
        let provider = OpenAiProvider::with_client(client);
        let resp = provider.complete(request(None)).await.unwrap();
        assert!(resp.usable_text().is_none());
        assert_eq!(resp.model, "gpt-4o");
    }
}
