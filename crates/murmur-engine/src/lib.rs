// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation-state and deduplication engine for Murmur.
//!
//! The [`MurmurEngine`] owns the process-wide state and wires it to:
//! - a [`Poller`] that runs poll cycles against the chat platform
//! - a [`CleanupScheduler`] that expires handled ids and idle channels
//! - a [`Responder`] that posts replies in size-limited chunks

pub mod activity;
pub mod cleanup;
pub mod conversation;
pub mod cycle;
pub mod deadline;
pub mod dedup;
pub mod responder;
pub mod shutdown;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use murmur_config::MurmurConfig;
use murmur_core::{ChatPlatformAdapter, MurmurError, ProviderAdapter};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use activity::ActivityTracker;
pub use cleanup::CleanupScheduler;
pub use conversation::ConversationStore;
pub use cycle::{ChannelBatch, CycleProcessor, CycleReport, GenerationSettings, Poller};
pub use deadline::{DeadlineOutcome, with_deadline};
pub use dedup::Deduplicator;
pub use responder::{Responder, split_into_chunks};
pub use state::{EngineState, SharedState, SweepReport};

/// The assembled engine: shared state, poller and cleanup task.
pub struct MurmurEngine {
    state: SharedState,
    poller: Poller,
    cleanup: CleanupScheduler,
    poll_interval: Duration,
}

impl MurmurEngine {
    /// Builds the engine around one freshly created [`EngineState`].
    pub fn new(
        config: &MurmurConfig,
        platform: Arc<dyn ChatPlatformAdapter>,
        provider: Arc<dyn ProviderAdapter>,
    ) -> Self {
        let engine = &config.engine;
        let state = EngineState::from_config(engine).shared();

        let responder = Responder::new(Arc::clone(&platform), engine.chunk_size);
        let processor = CycleProcessor::new(
            Arc::clone(&state),
            provider,
            responder,
            GenerationSettings::from_config(config),
            engine.message_threshold(),
        );
        let poller = Poller::new(platform, processor, config.slack.history_limit);
        let cleanup = CleanupScheduler::from_config(Arc::clone(&state), engine);

        Self {
            state,
            poller,
            cleanup,
            poll_interval: engine.poll_interval(),
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn cleanup(&self) -> &CleanupScheduler {
        &self.cleanup
    }

    /// Runs a single cycle at the current time.
    pub async fn run_once(&self) -> Result<CycleReport, MurmurError> {
        self.poller.run_cycle(Utc::now()).await
    }

    /// Polls and sweeps until `cancel` fires, then waits for the sweep task.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            poll_interval = ?self.poll_interval,
            sweep_interval = ?self.cleanup.period(),
            "engine started"
        );
        let sweeper = self.cleanup.clone().spawn(cancel.child_token());

        self.poller.run(self.poll_interval, cancel.clone()).await;

        cancel.cancel();
        if let Err(e) = sweeper.await {
            warn!(error = %e, "cleanup task ended abnormally");
        }
        info!("engine stopped");
    }
}
