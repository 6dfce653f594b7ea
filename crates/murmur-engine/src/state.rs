// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide engine state shared by the poll cycle and the sweep.
//!
//! [`EngineState`] owns the three stores and is created once at startup. The
//! cycle and the cleanup task each hold a [`SharedState`] handle and lock it
//! for one step at a time; the lock is never held across an await on a
//! collaborator.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use murmur_config::EngineConfig;
use murmur_core::{ChannelId, MessageId, Turn};
use tokio::sync::Mutex;

use crate::activity::ActivityTracker;
use crate::conversation::ConversationStore;
use crate::dedup::Deduplicator;

/// Handle to the single mutex-guarded [`EngineState`].
pub type SharedState = Arc<Mutex<EngineState>>;

/// Converts a configured period into a chrono delta, saturating on overflow.
pub(crate) fn horizon(period: Duration) -> TimeDelta {
    TimeDelta::from_std(period).unwrap_or(TimeDelta::MAX)
}

/// Outcome of one cleanup sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Handled message ids dropped from the deduplicator.
    pub expired_messages: usize,
    /// Channels whose history and activity were forgotten.
    pub forgotten_channels: Vec<ChannelId>,
}

/// Deduplicator, conversation histories and channel activity.
#[derive(Debug)]
pub struct EngineState {
    pub dedup: Deduplicator,
    pub conversations: ConversationStore,
    pub activity: ActivityTracker,
}

impl EngineState {
    pub fn new(conversations: ConversationStore) -> Self {
        Self {
            dedup: Deduplicator::new(),
            conversations,
            activity: ActivityTracker::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(ConversationStore::from_config(config))
    }

    /// Wraps the state in the shared handle.
    pub fn shared(self) -> SharedState {
        Arc::new(Mutex::new(self))
    }

    /// Admits a mention: marks it seen, touches the channel, records the
    /// user turn and returns the context to send for completion.
    pub fn admit(
        &mut self,
        channel: &ChannelId,
        id: &MessageId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Vec<Turn> {
        self.dedup.mark_seen(channel, id, now);
        self.activity.touch(channel, now);
        self.conversations.append_user_turn(channel, content);
        self.conversations.context_for(channel)
    }

    /// Expires handled ids, then forgets every idle channel.
    pub fn sweep(
        &mut self,
        now: DateTime<Utc>,
        message_expiry: Duration,
        channel_expiry: Duration,
    ) -> SweepReport {
        let expired_messages = self.dedup.sweep(now, message_expiry);
        let forgotten_channels = self.activity.sweep(now, channel_expiry);
        for channel in &forgotten_channels {
            self.conversations.forget(channel);
        }
        SweepReport {
            expired_messages,
            forgotten_channels,
        }
    }
}
