// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-zero periods, Slack's page-size cap, and trim policy bounds.

use crate::diagnostic::ConfigError;
use crate::model::{MurmurConfig, TrimPolicy};

/// Largest `limit` accepted by Slack's `conversations.history`.
pub const SLACK_HISTORY_LIMIT_MAX: usize = 999;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MurmurConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.agent.log_level.trim().to_ascii_lowercase().as_str()) {
        fail(format!(
            "agent.log_level must be one of {}, got `{}`",
            LOG_LEVELS.join(", "),
            config.agent.log_level
        ));
    }

    if config.slack.api_base.trim().is_empty() {
        fail("slack.api_base must not be empty".to_string());
    }
    if config.openai.base_url.trim().is_empty() {
        fail("openai.base_url must not be empty".to_string());
    }
    if config.openai.model.trim().is_empty() {
        fail("openai.model must not be empty".to_string());
    }

    let history_limit = config.slack.history_limit;
    if history_limit == 0 || history_limit > SLACK_HISTORY_LIMIT_MAX {
        fail(format!(
            "slack.history_limit must be between 1 and {SLACK_HISTORY_LIMIT_MAX}, got {history_limit}"
        ));
    }

    let engine = &config.engine;
    let positive = [
        ("slack.request_timeout_secs", config.slack.request_timeout_secs),
        ("openai.request_timeout_secs", config.openai.request_timeout_secs),
        ("openai.max_tokens", u64::from(config.openai.max_tokens)),
        ("engine.message_threshold_secs", engine.message_threshold_secs),
        ("engine.message_expiry_secs", engine.message_expiry_secs),
        ("engine.channel_expiry_secs", engine.channel_expiry_secs),
        ("engine.generation_timeout_secs", engine.generation_timeout_secs),
        ("engine.sweep_interval_secs", engine.sweep_interval_secs),
        ("engine.poll_interval_secs", engine.poll_interval_secs),
        ("engine.chunk_size", engine.chunk_size as u64),
        ("engine.history_max_turns", engine.history_max_turns as u64),
    ];
    for (key, value) in positive {
        if value == 0 {
            fail(format!("{key} must be greater than zero"));
        }
    }

    // A handled id must outlive the window in which its message still counts as fresh.
    if engine.message_expiry_secs < engine.message_threshold_secs {
        fail(format!(
            "engine.message_expiry_secs ({}) must be at least engine.message_threshold_secs ({})",
            engine.message_expiry_secs, engine.message_threshold_secs
        ));
    }

    match engine.trim_policy {
        TrimPolicy::Pairs => {
            if engine.history_max_turns < 2 {
                fail(format!(
                    "engine.history_max_turns must be at least 2 with trim_policy = \"pairs\", got {}",
                    engine.history_max_turns
                ));
            }
        }
        TrimPolicy::Head => {
            if engine.trim_head_count == 0 || engine.trim_head_count > engine.history_max_turns {
                fail(format!(
                    "engine.trim_head_count must be between 1 and history_max_turns ({}), got {}",
                    engine.history_max_turns, engine.trim_head_count
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
