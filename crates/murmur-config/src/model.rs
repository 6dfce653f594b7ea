// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Murmur.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Murmur configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MurmurConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Slack Web API settings.
    #[serde(default)]
    pub slack: SlackConfig,

    /// OpenAI Chat Completions settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Conversation-state and deduplication engine tunables.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Placeholder written in place of credentials by [`MurmurConfig::to_redacted_toml`].
pub const REDACTED: &str = "<redacted>";

impl MurmurConfig {
    /// Renders the effective configuration as TOML, credentials replaced by
    /// [`REDACTED`]. Unset credentials are omitted.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut shown = self.clone();
        for secret in [&mut shown.slack.bot_token, &mut shown.openai.api_key] {
            if secret.is_some() {
                *secret = Some(REDACTED.to_string());
            }
        }
        toml::to_string_pretty(&shown)
    }
}

/// Bot identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used in logs.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// System instruction sent ahead of every conversation. Not stored in history.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
        }
    }
}

fn default_agent_name() -> String {
    "murmur".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Slack Web API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SlackConfig {
    /// Bot token (`xoxb-...`). `None` falls back to `SLACK_BOT_TOKEN`.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Base URL of the Web API.
    #[serde(default = "default_slack_api_base")]
    pub api_base: String,

    /// Number of recent messages fetched per channel per cycle.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Conversation types passed to `conversations.list`.
    #[serde(default = "default_channel_types")]
    pub channel_types: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_slack_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base: default_slack_api_base(),
            history_limit: default_history_limit(),
            channel_types: default_channel_types(),
            request_timeout_secs: default_slack_request_timeout(),
        }
    }
}

fn default_slack_api_base() -> String {
    "https://slack.com/api".to_string()
}

fn default_history_limit() -> usize {
    10
}

fn default_channel_types() -> String {
    "public_channel,private_channel".to_string()
}

fn default_slack_request_timeout() -> u64 {
    30
}

/// OpenAI Chat Completions configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to `OPENAI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL; `/chat/completions` is appended.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for every completion.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens to generate per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in seconds. Bounds abandoned generation calls.
    #[serde(default = "default_openai_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_openai_request_timeout(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_openai_request_timeout() -> u64 {
    60
}

/// How a conversation history is cut back once it exceeds its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimPolicy {
    /// Drop the two oldest turns at a time, keeping user/assistant alternation.
    #[default]
    Pairs,
    /// Drop `trim_head_count` turns at a time from the head, regardless of role.
    Head,
}

/// Engine tunables: thresholds, expiry horizons, history bound and periods.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Messages older than this (relative to the cycle time) are never answered.
    #[serde(default = "default_message_threshold")]
    pub message_threshold_secs: u64,

    /// How long a handled message id is remembered. Must be at least
    /// `message_threshold_secs`, or a still-fresh message could be answered twice.
    #[serde(default = "default_message_expiry")]
    pub message_expiry_secs: u64,

    /// Idle time after which a channel's conversation history is forgotten.
    #[serde(default = "default_channel_expiry")]
    pub channel_expiry_secs: u64,

    /// Maximum number of turns kept per channel.
    #[serde(default = "default_history_max_turns")]
    pub history_max_turns: usize,

    /// Trimming policy applied when the history exceeds `history_max_turns`.
    #[serde(default)]
    pub trim_policy: TrimPolicy,

    /// Turns dropped per step under the `head` policy.
    #[serde(default = "default_trim_head_count")]
    pub trim_head_count: usize,

    /// Deadline for one completion call.
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: u64,

    /// Maximum characters per posted chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Period of the background cleanup sweep.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Period between poll cycles in `serve` mode.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            message_threshold_secs: default_message_threshold(),
            message_expiry_secs: default_message_expiry(),
            channel_expiry_secs: default_channel_expiry(),
            history_max_turns: default_history_max_turns(),
            trim_policy: TrimPolicy::default(),
            trim_head_count: default_trim_head_count(),
            generation_timeout_secs: default_generation_timeout(),
            chunk_size: default_chunk_size(),
            sweep_interval_secs: default_sweep_interval(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl EngineConfig {
    pub fn message_threshold(&self) -> Duration {
        Duration::from_secs(self.message_threshold_secs)
    }

    pub fn message_expiry(&self) -> Duration {
        Duration::from_secs(self.message_expiry_secs)
    }

    pub fn channel_expiry(&self) -> Duration {
        Duration::from_secs(self.channel_expiry_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_message_threshold() -> u64 {
    45
}

fn default_message_expiry() -> u64 {
    6 * 3600
}

fn default_channel_expiry() -> u64 {
    24 * 3600
}

fn default_history_max_turns() -> usize {
    10
}

fn default_trim_head_count() -> usize {
    1
}

fn default_generation_timeout() -> u64 {
    15
}

fn default_chunk_size() -> usize {
    4000
}

fn default_sweep_interval() -> u64 {
    3600 // 1 hour
}

fn default_poll_interval() -> u64 {
    30
}
