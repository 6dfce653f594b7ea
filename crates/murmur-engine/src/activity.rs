// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Last-activity tracking per channel.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use murmur_core::ChannelId;

use crate::state::horizon;

/// Last-active timestamp per channel. Drives conversation eviction.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_active: HashMap<ChannelId, DateTime<Utc>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `channel` active at `now`.
    pub fn touch(&mut self, channel: &ChannelId, now: DateTime<Utc>) {
        self.last_active.insert(channel.clone(), now);
    }

    pub fn last_active(&self, channel: &ChannelId) -> Option<DateTime<Utc>> {
        self.last_active.get(channel).copied()
    }

    /// Whether `channel` has been idle longer than `horizon` at `now`.
    ///
    /// A channel with no recorded activity counts as expired.
    pub fn expired(&self, channel: &ChannelId, now: DateTime<Utc>, idle: Duration) -> bool {
        match self.last_active.get(channel) {
            Some(last) => now.signed_duration_since(*last) > horizon(idle),
            None => true,
        }
    }

    /// Removes and returns every channel idle longer than `idle`.
    ///
    /// The caller forgets each returned channel's history. The list is sorted
    /// so log output is stable.
    pub fn sweep(&mut self, now: DateTime<Utc>, idle: Duration) -> Vec<ChannelId> {
        let limit = horizon(idle);
        let mut expired: Vec<ChannelId> = self
            .last_active
            .iter()
            .filter(|(_, last)| now.signed_duration_since(**last) > limit)
            .map(|(channel, _)| channel.clone())
            .collect();
        for channel in &expired {
            self.last_active.remove(channel);
        }
        expired.sort();
        expired
    }

    pub fn remove(&mut self, channel: &ChannelId) -> bool {
        self.last_active.remove(channel).is_some()
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.last_active.contains_key(channel)
    }

    pub fn len(&self) -> usize {
        self.last_active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_active.is_empty()
    }
}
