// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel conversation history.
//!
//! Each channel keeps an ordered, bounded list of turns, oldest first. The
//! list is sent verbatim as completion context, so its order matters and
//! trimming only ever removes from the head.

use std::collections::{HashMap, VecDeque};

use murmur_config::{EngineConfig, TrimPolicy};
use murmur_core::{ChannelId, Turn};

/// Bounded turn histories keyed by channel.
#[derive(Debug)]
pub struct ConversationStore {
    histories: HashMap<ChannelId, VecDeque<Turn>>,
    max_turns: usize,
    policy: TrimPolicy,
    head_count: usize,
}

impl ConversationStore {
    /// Creates a store with a fixed bound and trimming policy.
    ///
    /// `head_count` is only consulted under [`TrimPolicy::Head`] and is
    /// clamped to `1..=max_turns`, so a trimmed history is never emptied.
    pub fn new(max_turns: usize, policy: TrimPolicy, head_count: usize) -> Self {
        let max_turns = max_turns.max(1);
        Self {
            histories: HashMap::new(),
            max_turns,
            policy,
            head_count: head_count.clamp(1, max_turns),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.history_max_turns,
            config.trim_policy,
            config.trim_head_count,
        )
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn policy(&self) -> TrimPolicy {
        self.policy
    }

    /// Appends a user turn, creating the channel's history if needed, then trims.
    pub fn append_user_turn(&mut self, channel: &ChannelId, content: impl Into<String>) {
        self.histories
            .entry(channel.clone())
            .or_default()
            .push_back(Turn::user(content));
        self.trim(channel);
    }

    /// Appends an assistant turn to an existing history, then trims.
    ///
    /// Returns `false` without creating anything when the channel has no
    /// history, which happens when a sweep forgot it mid-cycle.
    pub fn append_assistant_turn(&mut self, channel: &ChannelId, content: impl Into<String>) -> bool {
        let Some(history) = self.histories.get_mut(channel) else {
            return false;
        };
        history.push_back(Turn::assistant(content));
        self.trim(channel);
        true
    }

    /// Cuts the channel's history back to the bound, removing from the head.
    ///
    /// Returns the number of turns removed. Calling it on a history already
    /// within bound is a no-op.
    pub fn trim(&mut self, channel: &ChannelId) -> usize {
        let Some(history) = self.histories.get_mut(channel) else {
            return 0;
        };
        let step = match self.policy {
            TrimPolicy::Pairs => 2,
            TrimPolicy::Head => self.head_count,
        };

        let before = history.len();
        while history.len() > self.max_turns {
            let drop = step.min(history.len());
            history.drain(..drop);
        }
        before - history.len()
    }

    /// The channel's turns in context order. Empty if the channel is unknown.
    pub fn context_for(&self, channel: &ChannelId) -> Vec<Turn> {
        self.histories
            .get(channel)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Deletes the channel's history; returns whether one existed.
    pub fn forget(&mut self, channel: &ChannelId) -> bool {
        self.histories.remove(channel).is_some()
    }

    pub fn contains(&self, channel: &ChannelId) -> bool {
        self.histories.contains_key(channel)
    }

    pub fn channels(&self) -> impl Iterator<Item = &ChannelId> {
        self.histories.keys()
    }

    /// Number of channels with a history.
    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}
