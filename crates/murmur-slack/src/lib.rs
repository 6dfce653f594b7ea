// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slack Web API chat platform adapter for Murmur.
//!
//! Implements [`ChatPlatformAdapter`] over four Web API methods:
//! `auth.test`, `conversations.list`, `conversations.history` and
//! `chat.postMessage`. The bot never joins channels itself; it only polls
//! the ones it has been invited to.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use murmur_config::SlackConfig;
use murmur_core::error::MurmurError;
use murmur_core::traits::{ChatPlatformAdapter, PluginAdapter};
use murmur_core::types::{
    AdapterType, ChannelId, ChannelInfo, HealthStatus, MessageId, RawMessage,
};
use tracing::{debug, info, warn};

use crate::client::SlackClient;
use crate::types::SlackMessage;

/// Slack workspace adapter implementing [`ChatPlatformAdapter`].
pub struct SlackPlatform {
    client: SlackClient,
    channel_types: String,
}

impl SlackPlatform {
    /// Creates the adapter from the `[slack]` config section.
    ///
    /// The bot token must already be resolved (config loading falls back to
    /// `SLACK_BOT_TOKEN`).
    pub fn new(config: &SlackConfig) -> Result<Self, MurmurError> {
        let token = match config.bot_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(MurmurError::Config(
                    "Slack bot token not found. Set slack.bot_token in config or the SLACK_BOT_TOKEN environment variable.".into(),
                ));
            }
        };

        let client = SlackClient::new(
            token,
            &config.api_base,
            Duration::from_secs(config.request_timeout_secs),
        )?;
        info!(api_base = %config.api_base, "Slack adapter initialized");

        Ok(Self::with_client(client, &config.channel_types))
    }

    /// Creates the adapter with an existing client (for testing).
    pub fn with_client(client: SlackClient, channel_types: &str) -> Self {
        Self {
            client,
            channel_types: channel_types.to_string(),
        }
    }
}

/// Converts a history entry; entries without a `ts` cannot be tracked and are dropped.
fn to_raw_message(message: SlackMessage) -> Option<RawMessage> {
    let ts = message.ts.filter(|ts| !ts.trim().is_empty())?;
    Some(RawMessage {
        id: MessageId::new(ts),
        text: message.text.unwrap_or_default(),
        author: message.user,
    })
}

#[async_trait]
impl PluginAdapter for SlackPlatform {
    fn name(&self) -> &str {
        "slack"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatPlatform
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        match self.client.auth_test().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        debug!("Slack adapter shutting down");
        Ok(())
    }
}

#[async_trait]
impl ChatPlatformAdapter for SlackPlatform {
    async fn bot_identity(&self) -> Result<String, MurmurError> {
        self.client.auth_test().await
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, MurmurError> {
        let channels = self.client.list_conversations(&self.channel_types).await?;
        Ok(channels
            .into_iter()
            .filter(|channel| channel.is_member)
            .map(|channel| {
                let name = channel.name.unwrap_or_else(|| channel.id.clone());
                ChannelInfo {
                    id: ChannelId::new(channel.id),
                    name,
                }
            })
            .collect())
    }

    async fn history(
        &self,
        channel: &ChannelId,
        limit: usize,
    ) -> Result<Vec<RawMessage>, MurmurError> {
        let messages = self.client.history(channel.as_str(), limit).await?;
        let total = messages.len();
        let converted: Vec<RawMessage> = messages.into_iter().filter_map(to_raw_message).collect();
        if converted.len() < total {
            warn!(
                channel = %channel,
                dropped = total - converted.len(),
                "history entries without ts skipped"
            );
        }
        Ok(converted)
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageId, MurmurError> {
        let ts = self.client.post_message(channel.as_str(), text).await?;
        Ok(MessageId::new(ts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn platform(server: &MockServer) -> SlackPlatform {
        let client =
            SlackClient::new("xoxb-test", &server.uri(), Duration::from_secs(5)).unwrap();
        SlackPlatform::with_client(client, "public_channel,private_channel")
    }

    #[test]
    fn missing_token_is_config_error() {
        let config = SlackConfig {
            bot_token: Some("   ".into()),
            ..SlackConfig::default()
        };
        let err = SlackPlatform::new(&config).err().expect("blank token rejected");
        assert!(matches!(err, MurmurError::Config(_)));
        assert!(err.to_string().contains("SLACK_BOT_TOKEN"));
    }

    #[test]
    fn message_without_ts_is_dropped() {
        let message = SlackMessage {
            ts: None,
            text: Some("<@UBOT> hi".into()),
            user: Some("U1".into()),
            subtype: None,
        };
        assert!(to_raw_message(message).is_none());
    }

    #[test]
    fn message_without_text_becomes_empty() {
        let message = SlackMessage {
            ts: Some("5.000001".into()),
            text: None,
            user: None,
            subtype: Some("bot_message".into()),
        };
        let raw = to_raw_message(message).unwrap();
        assert_eq!(raw.id.as_str(), "5.000001");
        assert_eq!(raw.text, "");
        assert_eq!(raw.author, None);
    }

    #[tokio::test]
    async fn list_channels_keeps_memberships_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "channels": [
                    {"id": "C1", "name": "general", "is_member": true},
                    {"id": "C2", "name": "random", "is_member": false},
                    {"id": "C3", "is_member": true}
                ]
            })))
            .mount(&server)
            .await;

        let channels = platform(&server).list_channels().await.unwrap();
        assert_eq!(
            channels,
            vec![
                ChannelInfo {
                    id: ChannelId::new("C1"),
                    name: "general".into(),
                },
                ChannelInfo {
                    id: ChannelId::new("C3"),
                    name: "C3".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn history_maps_to_raw_messages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "messages": [
                    {"type": "message", "ts": "1712345678.000100", "text": "<@UBOT> hi", "user": "U1"},
                    {"type": "message", "subtype": "tombstone"}
                ]
            })))
            .mount(&server)
            .await;

        let messages = platform(&server)
            .history(&ChannelId::new("C1"), 10)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].id, MessageId::new("1712345678.000100"));
        assert!(messages[0].mentions("UBOT"));
        assert_eq!(messages[0].author.as_deref(), Some("U1"));
    }

    #[tokio::test]
    async fn not_in_channel_surfaces_as_chat_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "not_in_channel"})),
            )
            .mount(&server)
            .await;

        let err = platform(&server)
            .post_message(&ChannelId::new("C1"), "hello")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not_in_channel"));
    }

    #[tokio::test]
    async fn health_check_reports_auth_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth.test"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "token_revoked"})),
            )
            .mount(&server)
            .await;

        let status = platform(&server).health_check().await.unwrap();
        assert!(matches!(status, HealthStatus::Unhealthy(ref m) if m.contains("token_revoked")));
    }
}
