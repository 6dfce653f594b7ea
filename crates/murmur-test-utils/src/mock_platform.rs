// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat platform for deterministic testing.
//!
//! `MockPlatform` implements `ChatPlatformAdapter` with injectable channels
//! and histories, captured posts, and switchable failures.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use murmur_core::traits::adapter::PluginAdapter;
use murmur_core::traits::chat::ChatPlatformAdapter;
use murmur_core::types::{
    AdapterType, ChannelId, ChannelInfo, HealthStatus, MessageId, RawMessage, mention_token,
};
use murmur_core::MurmurError;

/// Author id used for messages built by [`mention`].
pub const HUMAN_ID: &str = "UHUMAN";

/// Builds a message from [`HUMAN_ID`] that mentions `bot_id`.
pub fn mention(bot_id: &str, ts: &str, text: &str) -> RawMessage {
    RawMessage {
        id: MessageId::new(ts),
        text: format!("{} {text}", mention_token(bot_id)),
        author: Some(HUMAN_ID.to_string()),
    }
}

/// A message captured by [`MockPlatform::post_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: ChannelId,
    pub text: String,
}

#[derive(Debug, Default)]
struct Failures {
    identity: bool,
    listing: bool,
    history: HashSet<ChannelId>,
    /// Posts allowed before every further post fails.
    posts_allowed: Option<usize>,
}

#[derive(Debug, Default)]
struct Workspace {
    channels: Vec<ChannelInfo>,
    histories: HashMap<ChannelId, Vec<RawMessage>>,
    posted: Vec<PostedMessage>,
    history_calls: Vec<(ChannelId, usize)>,
    failures: Failures,
}

/// An in-memory chat workspace.
pub struct MockPlatform {
    bot_id: String,
    workspace: Arc<Mutex<Workspace>>,
}

impl MockPlatform {
    /// Create a workspace whose bot identity is `bot_id`.
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            workspace: Arc::new(Mutex::new(Workspace::default())),
        }
    }

    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Add a channel the bot is a member of.
    pub async fn add_channel(&self, id: &str, name: &str) {
        self.workspace.lock().await.channels.push(ChannelInfo {
            id: ChannelId::new(id),
            name: name.to_string(),
        });
    }

    /// Replace the history returned for `channel`.
    pub async fn set_history(&self, channel: &str, messages: Vec<RawMessage>) {
        self.workspace
            .lock()
            .await
            .histories
            .insert(ChannelId::new(channel), messages);
    }

    /// Append one message to `channel`'s history.
    pub async fn push_message(&self, channel: &str, message: RawMessage) {
        self.workspace
            .lock()
            .await
            .histories
            .entry(ChannelId::new(channel))
            .or_default()
            .push(message);
    }

    pub async fn fail_identity(&self) {
        self.workspace.lock().await.failures.identity = true;
    }

    pub async fn fail_listing(&self) {
        self.workspace.lock().await.failures.listing = true;
    }

    pub async fn fail_history(&self, channel: &str) {
        self.workspace
            .lock()
            .await
            .failures
            .history
            .insert(ChannelId::new(channel));
    }

    /// Let `count` more posts succeed, then fail every post after that.
    pub async fn fail_posts_after(&self, count: usize) {
        self.workspace.lock().await.failures.posts_allowed = Some(count);
    }

    /// Clear all injected failures.
    pub async fn heal(&self) {
        self.workspace.lock().await.failures = Failures::default();
    }

    /// Every captured post, in order.
    pub async fn posted(&self) -> Vec<PostedMessage> {
        self.workspace.lock().await.posted.clone()
    }

    /// Texts posted to `channel`, in order.
    pub async fn posted_texts(&self, channel: &ChannelId) -> Vec<String> {
        self.workspace
            .lock()
            .await
            .posted
            .iter()
            .filter(|p| &p.channel == channel)
            .map(|p| p.text.clone())
            .collect()
    }

    pub async fn post_count(&self) -> usize {
        self.workspace.lock().await.posted.len()
    }

    /// `(channel, limit)` of every history request, in order.
    pub async fn history_calls(&self) -> Vec<(ChannelId, usize)> {
        self.workspace.lock().await.history_calls.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockPlatform {
    fn name(&self) -> &str {
        "mock-platform"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatPlatform
    }

    async fn health_check(&self) -> Result<HealthStatus, MurmurError> {
        if self.workspace.lock().await.failures.identity {
            return Ok(HealthStatus::Unhealthy("identity lookup failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), MurmurError> {
        Ok(())
    }
}

#[async_trait]
impl ChatPlatformAdapter for MockPlatform {
    async fn bot_identity(&self) -> Result<String, MurmurError> {
        if self.workspace.lock().await.failures.identity {
            return Err(MurmurError::chat("invalid_auth"));
        }
        Ok(self.bot_id.clone())
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, MurmurError> {
        let workspace = self.workspace.lock().await;
        if workspace.failures.listing {
            return Err(MurmurError::chat("ratelimited"));
        }
        Ok(workspace.channels.clone())
    }

    async fn history(
        &self,
        channel: &ChannelId,
        limit: usize,
    ) -> Result<Vec<RawMessage>, MurmurError> {
        let mut workspace = self.workspace.lock().await;
        workspace.history_calls.push((channel.clone(), limit));
        if workspace.failures.history.contains(channel) {
            return Err(MurmurError::chat("channel_not_found"));
        }
        Ok(workspace
            .histories
            .get(channel)
            .map(|messages| messages.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn post_message(
        &self,
        channel: &ChannelId,
        text: &str,
    ) -> Result<MessageId, MurmurError> {
        let mut workspace = self.workspace.lock().await;
        if let Some(allowed) = workspace.failures.posts_allowed.as_mut() {
            if *allowed == 0 {
                return Err(MurmurError::chat("msg_too_long"));
            }
            *allowed -= 1;
        }
        workspace.posted.push(PostedMessage {
            channel: channel.clone(),
            text: text.to_string(),
        });
        Ok(MessageId::new(format!(
            "9000000000.{:06}",
            workspace.posted.len()
        )))
    }
}
