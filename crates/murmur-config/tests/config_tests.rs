// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Murmur configuration system.

use std::io::Write;

use figment::Figment;
use figment::providers::{Format, Serialized, Toml};
use murmur_config::diagnostic::ConfigError;
use murmur_config::model::{MurmurConfig, REDACTED, TrimPolicy};
use murmur_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

/// Every section with every key deserializes.
#[test]
fn full_toml_deserializes_into_murmur_config() {
    let toml = r#"
[agent]
name = "helper"
log_level = "debug"
system_prompt = "Be brief."

[slack]
bot_token = "xoxb-1"
api_base = "http://localhost:9000/api"
history_limit = 25
channel_types = "public_channel"
request_timeout_secs = 5

[openai]
api_key = "sk-1"
base_url = "http://localhost:9001/v1"
model = "gpt-4o-mini"
max_tokens = 300
request_timeout_secs = 20

[engine]
message_threshold_secs = 60
message_expiry_secs = 7200
channel_expiry_secs = 3600
history_max_turns = 6
trim_policy = "head"
trim_head_count = 2
generation_timeout_secs = 10
chunk_size = 3000
sweep_interval_secs = 600
poll_interval_secs = 15
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.agent.name, "helper");
    assert_eq!(config.agent.system_prompt.as_deref(), Some("Be brief."));
    assert_eq!(config.slack.bot_token.as_deref(), Some("xoxb-1"));
    assert_eq!(config.slack.history_limit, 25);
    assert_eq!(config.slack.channel_types, "public_channel");
    assert_eq!(config.openai.model, "gpt-4o-mini");
    assert_eq!(config.openai.max_tokens, 300);
    assert_eq!(config.engine.trim_policy, TrimPolicy::Head);
    assert_eq!(config.engine.trim_head_count, 2);
    assert_eq!(config.engine.chunk_size, 3000);
    assert_eq!(config.engine.poll_interval().as_secs(), 15);
}

/// An empty file yields the documented defaults.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.agent.name, "murmur");
    assert_eq!(config.agent.log_level, "info");
    assert_eq!(config.slack.api_base, "https://slack.com/api");
    assert_eq!(config.slack.history_limit, 10);
    assert_eq!(config.openai.base_url, "https://api.openai.com/v1");
    assert_eq!(config.openai.max_tokens, 200);
    assert_eq!(config.engine.message_threshold_secs, 45);
    assert_eq!(config.engine.message_expiry_secs, 6 * 3600);
    assert_eq!(config.engine.channel_expiry_secs, 24 * 3600);
    assert_eq!(config.engine.history_max_turns, 10);
    assert_eq!(config.engine.trim_policy, TrimPolicy::Pairs);
    assert_eq!(config.engine.generation_timeout_secs, 15);
    assert_eq!(config.engine.chunk_size, 4000);
    assert_eq!(config.engine.sweep_interval_secs, 3600);
}

/// A misspelled key is rejected with a suggestion.
#[test]
fn unknown_engine_key_reports_suggestion() {
    let toml = "[engine]\nmessage_treshold_secs = 30\n";
    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key,
            suggestion,
            valid_keys,
            ..
        } => {
            assert_eq!(key, "message_treshold_secs");
            assert_eq!(suggestion.as_deref(), Some("message_threshold_secs"));
            assert!(valid_keys.contains("sweep_interval_secs"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown top-level sections are rejected too.
#[test]
fn unknown_section_is_rejected() {
    let err = load_config_from_str("[telegram]\nbot_token = \"x\"\n")
        .expect_err("unknown section should fail");
    assert!(format!("{err}").contains("telegram"));
}

/// Wrong value types surface as errors, not silent defaults.
#[test]
fn wrong_type_is_rejected() {
    let errors = load_and_validate_str("[engine]\nchunk_size = \"big\"\n")
        .expect_err("string chunk size should fail");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { .. } | ConfigError::Other(_))),
        "got {errors:?}"
    );
}

#[test]
fn unknown_trim_policy_is_rejected() {
    assert!(load_config_from_str("[engine]\ntrim_policy = \"tail\"\n").is_err());
}

/// Validation failures are all reported together.
#[test]
fn validation_errors_are_collected() {
    let toml = r#"
[agent]
log_level = "loud"

[engine]
chunk_size = 0
sweep_interval_secs = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("invalid values");
    assert_eq!(errors.len(), 3, "got {errors:?}");
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

/// Later layers override earlier ones, key by key.
#[test]
fn later_layers_override_earlier() {
    let config: MurmurConfig = Figment::new()
        .merge(Serialized::defaults(MurmurConfig::default()))
        .merge(Toml::string("[engine]\nchunk_size = 1000\nhistory_max_turns = 4\n"))
        .merge(Toml::string("[engine]\nchunk_size = 2000\n"))
        .merge(("engine.poll_interval_secs", 5))
        .extract()
        .expect("merged config");

    assert_eq!(config.engine.chunk_size, 2000);
    assert_eq!(config.engine.history_max_turns, 4);
    assert_eq!(config.engine.poll_interval_secs, 5);
    assert_eq!(config.engine.message_threshold_secs, 45);
}

/// `--config <path>` loads one file and validates it.
#[test]
fn explicit_path_loads_and_validates() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[engine]\nhistory_max_turns = 5\nchunk_size = 1200").expect("write");

    let config = load_and_validate_path(file.path()).expect("valid file");
    assert_eq!(config.engine.history_max_turns, 5);
    assert_eq!(config.engine.chunk_size, 1200);
}

#[test]
fn explicit_path_unknown_key_is_diagnosed() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[slack]\nbot_tken = \"xoxb\"").expect("write");

    let errors = load_and_validate_path(file.path()).expect_err("typo should fail");
    match &errors[0] {
        ConfigError::UnknownKey { suggestion, .. } => {
            assert_eq!(suggestion.as_deref(), Some("bot_token"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// The rendered effective config hides credentials and loads back unchanged.
#[test]
fn redacted_toml_hides_credentials() {
    let mut config = load_and_validate_str("[engine]\ntrim_policy = \"head\"\n").expect("valid");
    config.slack.bot_token = Some("xoxb-secret".into());

    let rendered = config.to_redacted_toml().expect("serializable");
    assert!(!rendered.contains("xoxb-secret"));
    assert!(rendered.contains(REDACTED));
    assert!(!rendered.contains("api_key"), "unset key omitted:\n{rendered}");

    let reloaded = load_config_from_str(&rendered).expect("rendered config reloads");
    assert_eq!(reloaded.engine.trim_policy, TrimPolicy::Head);
    assert_eq!(reloaded.slack.bot_token.as_deref(), Some(REDACTED));
}
