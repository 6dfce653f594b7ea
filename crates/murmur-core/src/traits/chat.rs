// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat platform adapter trait (Slack and friends).

use async_trait::async_trait;

use crate::error::MurmurError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelId, ChannelInfo, MessageId, RawMessage};

/// Adapter for a polled chat workspace.
///
/// The engine never assumes the history endpoint returns messages in any
/// particular order, nor that it only returns messages not seen before.
#[async_trait]
pub trait ChatPlatformAdapter: PluginAdapter {
    /// Returns the bot's own participant identifier.
    async fn bot_identity(&self) -> Result<String, MurmurError>;

    /// Lists the channels the bot is a member of.
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, MurmurError>;

    /// Returns up to `limit` recent messages of a channel.
    async fn history(
        &self,
        channel: &ChannelId,
        limit: usize,
    ) -> Result<Vec<RawMessage>, MurmurError>;

    /// Posts one message, which must fit within the platform size limit.
    async fn post_message(&self, channel: &ChannelId, text: &str)
    -> Result<MessageId, MurmurError>;
}
