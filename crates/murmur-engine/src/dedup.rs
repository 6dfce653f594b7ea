// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Handled-message memory.
//!
//! The [`Deduplicator`] remembers every inbound message the engine has
//! admitted, together with when it was first seen, so a message returned by
//! several consecutive history fetches is answered at most once.
//!
//! Slack message ids (`ts`) are only unique within a channel, so entries are
//! keyed by channel and id together.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use murmur_core::{ChannelId, MessageId};

use crate::state::horizon;

/// Set of handled `(channel, id)` pairs with their first-seen time.
#[derive(Debug, Default)]
pub struct Deduplicator {
    entries: HashMap<(ChannelId, MessageId), DateTime<Utc>>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether message `id` of `channel` has already been handled.
    pub fn seen(&self, channel: &ChannelId, id: &MessageId) -> bool {
        self.entries.contains_key(&(channel.clone(), id.clone()))
    }

    /// Records message `id` of `channel` as handled at `now`.
    ///
    /// Returns `false` and leaves the original first-seen time untouched if
    /// the message was already present.
    pub fn mark_seen(&mut self, channel: &ChannelId, id: &MessageId, now: DateTime<Utc>) -> bool {
        let key = (channel.clone(), id.clone());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, now);
        true
    }

    /// First-seen time of message `id` of `channel`, if it is remembered.
    pub fn first_seen(&self, channel: &ChannelId, id: &MessageId) -> Option<DateTime<Utc>> {
        self.entries.get(&(channel.clone(), id.clone())).copied()
    }

    /// Drops every entry older than `expiry` at `now`; returns how many went.
    ///
    /// An entry exactly `expiry` old is retained.
    pub fn sweep(&mut self, now: DateTime<Utc>, expiry: Duration) -> usize {
        let expiry = horizon(expiry);
        let before = self.entries.len();
        self.entries
            .retain(|_, first_seen| now.signed_duration_since(*first_seen) <= expiry);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
