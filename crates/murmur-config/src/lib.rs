// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Murmur.
//!
//! Provides TOML configuration parsing with strict validation (`deny_unknown_fields`),
//! XDG file hierarchy lookup, `MURMUR_*` environment overrides, and diagnostic
//! error rendering with typo suggestions.
//!
//! # Usage
//!
//! ```no_run
//! use murmur_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("chunk size: {}", config.engine.chunk_size);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{AgentConfig, EngineConfig, MurmurConfig, OpenAiConfig, SlackConfig, TrimPolicy};

/// Environment variable consulted when `slack.bot_token` is unset.
pub const SLACK_TOKEN_ENV: &str = "SLACK_BOT_TOKEN";

/// Environment variable consulted when `openai.api_key` is unset.
pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Load configuration from the XDG hierarchy and validate it.
///
/// On a Figment error the TOML sources are re-read so unknown keys can be
/// pointed at in the file they came from.
pub fn load_and_validate() -> Result<MurmurConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => finish(config),
        Err(err) => Err(diagnostic::figment_to_config_errors(
            err,
            &collect_toml_sources(),
        )),
    }
}

/// Load one specific file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<MurmurConfig, Vec<ConfigError>> {
    match loader::load_config_from_path(path) {
        Ok(config) => finish(config),
        Err(err) => {
            let sources: Vec<_> = std::fs::read_to_string(path)
                .map(|content| vec![(path.display().to_string(), content)])
                .unwrap_or_default();
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<MurmurConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

fn finish(mut config: MurmurConfig) -> Result<MurmurConfig, Vec<ConfigError>> {
    apply_credential_fallbacks(&mut config, |name| std::env::var(name).ok());
    validation::validate_config(&config)?;
    Ok(config)
}

/// Fill unset credentials from the conventional environment variables.
///
/// Values from the config file or `MURMUR_*` overrides always win. Blank
/// values count as unset.
pub fn apply_credential_fallbacks(
    config: &mut MurmurConfig,
    lookup: impl Fn(&str) -> Option<String>,
) {
    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

    if !present(&config.slack.bot_token) {
        config.slack.bot_token = lookup(SLACK_TOKEN_ENV).filter(|v| !v.trim().is_empty());
        if config.slack.bot_token.is_some() {
            tracing::debug!(var = SLACK_TOKEN_ENV, "slack token taken from environment");
        }
    }
    if !present(&config.openai.api_key) {
        config.openai.api_key = lookup(OPENAI_KEY_ENV).filter(|v| !v.trim().is_empty());
        if config.openai.api_key.is_some() {
            tracing::debug!(var = OPENAI_KEY_ENV, "openai key taken from environment");
        }
    }
}

/// Collect TOML source file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string(loader::LOCAL_CONFIG_FILE) {
        let path = std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_CONFIG_FILE).display().to_string())
            .unwrap_or_else(|_| loader::LOCAL_CONFIG_FILE.to_string());
        sources.push((path, content));
    }

    if let Some(path) = loader::user_config_path()
        && let Ok(content) = std::fs::read_to_string(&path)
    {
        sources.push((path.display().to_string(), content));
    }

    let system_path = Path::new(loader::SYSTEM_CONFIG_PATH);
    if let Ok(content) = std::fs::read_to_string(system_path) {
        sources.push((system_path.display().to_string(), content));
    }

    sources
}
