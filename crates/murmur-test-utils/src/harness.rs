// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end engine testing.
//!
//! `TestHarness` assembles a complete [`MurmurEngine`] over a
//! [`MockPlatform`] and a [`MockProvider`], and drives poll cycles and
//! sweeps at explicit points in time.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use murmur_config::{AgentConfig, EngineConfig, MurmurConfig};
use murmur_core::{ChannelId, ChatPlatformAdapter, MurmurError, ProviderAdapter, Turn};
use murmur_engine::{CycleReport, MurmurEngine, SweepReport};

use crate::mock_platform::{MockPlatform, mention};
use crate::mock_provider::MockProvider;

/// Bot identity used unless overridden.
pub const DEFAULT_BOT_ID: &str = "UBOT";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    engine: EngineConfig,
    system_prompt: Option<String>,
    bot_id: String,
    channels: Vec<(String, String)>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            engine: EngineConfig::default(),
            system_prompt: None,
            bot_id: DEFAULT_BOT_ID.to_string(),
            channels: Vec::new(),
        }
    }

    /// Set mock provider responses.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    /// Use these engine tunables instead of the defaults.
    pub fn with_engine_config(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_bot_id(mut self, bot_id: impl Into<String>) -> Self {
        self.bot_id = bot_id.into();
        self
    }

    /// Add a channel the bot is a member of.
    pub fn with_channel(mut self, id: &str, name: &str) -> Self {
        self.channels.push((id.to_string(), name.to_string()));
        self
    }

    /// Build the harness.
    pub async fn build(self) -> TestHarness {
        let mock_platform = Arc::new(MockPlatform::new(self.bot_id));
        for (id, name) in &self.channels {
            mock_platform.add_channel(id, name).await;
        }
        let mock_provider = Arc::new(MockProvider::with_responses(self.responses));

        let config = MurmurConfig {
            agent: AgentConfig {
                system_prompt: self.system_prompt,
                ..AgentConfig::default()
            },
            engine: self.engine,
            ..MurmurConfig::default()
        };

        let engine = MurmurEngine::new(
            &config,
            Arc::clone(&mock_platform) as Arc<dyn ChatPlatformAdapter>,
            Arc::clone(&mock_provider) as Arc<dyn ProviderAdapter>,
        );

        TestHarness {
            mock_platform,
            mock_provider,
            engine,
            config,
        }
    }
}

/// A complete engine wired to mock collaborators.
pub struct TestHarness {
    pub mock_platform: Arc<MockPlatform>,
    pub mock_provider: Arc<MockProvider>,
    pub engine: MurmurEngine,
    pub config: MurmurConfig,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn bot_id(&self) -> &str {
        self.mock_platform.bot_id()
    }

    /// Append a message from a human that mentions the bot.
    pub async fn inject_mention(&self, channel: &str, ts: &str, text: &str) {
        self.mock_platform
            .push_message(channel, mention(self.bot_id(), ts, text))
            .await;
    }

    /// Run one full poll cycle as of `now`.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, MurmurError> {
        self.engine.poller().run_cycle(now).await
    }

    /// Run one cleanup sweep as of `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        self.engine.cleanup().sweep_at(now).await
    }

    /// Current conversation history of `channel`.
    pub async fn context_for(&self, channel: &str) -> Vec<Turn> {
        self.engine
            .state()
            .lock()
            .await
            .conversations
            .context_for(&ChannelId::new(channel))
    }

    /// Texts posted into `channel` so far.
    pub async fn replies_in(&self, channel: &str) -> Vec<String> {
        self.mock_platform
            .posted_texts(&ChannelId::new(channel))
            .await
    }
}
