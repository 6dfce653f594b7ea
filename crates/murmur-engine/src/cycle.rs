// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One poll cycle: filter, admit, generate, respond.
//!
//! [`CycleProcessor`] works on messages that have already been fetched and
//! is the part of a cycle that touches engine state. [`Poller`] adds the
//! platform calls around it (identity, channel listing, history) and the
//! long-running poll loop.
//!
//! Channels and messages are handled strictly one after another. The state
//! lock is taken for each filtering or bookkeeping step and released before
//! any collaborator call, so a cleanup sweep may run in between. Everything
//! below tolerates that: a swept history is recreated by the next user turn
//! and an assistant turn for a swept channel is dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use murmur_config::MurmurConfig;
use murmur_core::{
    ChannelId, ChatPlatformAdapter, CompletionRequest, MessageId, MurmurError, ProviderAdapter,
    RawMessage,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::deadline::{DeadlineOutcome, with_deadline};
use crate::responder::Responder;
use crate::state::{SharedState, horizon};

/// Messages fetched from one channel in a cycle, in the platform's order.
#[derive(Debug, Clone)]
pub struct ChannelBatch {
    pub channel: ChannelId,
    pub messages: Vec<RawMessage>,
}

/// Counters for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub channels: usize,
    pub history_failures: usize,
    pub skipped_seen: usize,
    pub skipped_unmentioned: usize,
    pub skipped_stale: usize,
    /// Replies with usable text.
    pub responses: usize,
    pub generation_failures: usize,
    pub timeouts: usize,
    pub empty_results: usize,
    pub deliveries: usize,
    pub delivery_failures: usize,
}

impl CycleReport {
    /// Messages that passed every filter and were sent for completion.
    pub fn admitted(&self) -> usize {
        self.responses + self.generation_failures + self.timeouts + self.empty_results
    }

    pub fn skipped(&self) -> usize {
        self.skipped_seen + self.skipped_unmentioned + self.skipped_stale
    }
}

/// Why a message was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    Seen,
    Unmentioned,
    Stale,
}

/// Completion settings applied to every request.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub max_tokens: u32,
    pub system_prompt: Option<String>,
    pub timeout: Duration,
}

impl GenerationSettings {
    pub fn from_config(config: &MurmurConfig) -> Self {
        Self {
            model: config.openai.model.clone(),
            max_tokens: config.openai.max_tokens,
            system_prompt: config.agent.system_prompt.clone(),
            timeout: config.engine.generation_timeout(),
        }
    }
}

/// Whether a message sent at `id`'s timestamp is too old to answer at `now`.
///
/// Ids without a numeric timestamp cannot be aged and count as stale. A
/// message exactly `threshold` old is still answered.
pub fn is_stale(id: &MessageId, now: DateTime<Utc>, threshold: Duration) -> bool {
    match id.timestamp() {
        Some(sent) => now.signed_duration_since(sent) > horizon(threshold),
        None => true,
    }
}

/// Processes fetched messages against the shared engine state.
pub struct CycleProcessor {
    state: SharedState,
    provider: Arc<dyn ProviderAdapter>,
    responder: Responder,
    settings: GenerationSettings,
    message_threshold: Duration,
}

impl CycleProcessor {
    pub fn new(
        state: SharedState,
        provider: Arc<dyn ProviderAdapter>,
        responder: Responder,
        settings: GenerationSettings,
        message_threshold: Duration,
    ) -> Self {
        Self {
            state,
            provider,
            responder,
            settings,
            message_threshold,
        }
    }

    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Runs one cycle over already-fetched batches.
    pub async fn process(
        &self,
        now: DateTime<Utc>,
        bot_id: &str,
        batches: Vec<ChannelBatch>,
    ) -> CycleReport {
        let mut report = CycleReport::default();
        for batch in batches {
            report.channels += 1;
            self.process_channel(now, bot_id, &batch.channel, batch.messages, &mut report)
                .await;
        }
        report
    }

    /// Handles one channel's messages in order, adding to `report`.
    pub async fn process_channel(
        &self,
        now: DateTime<Utc>,
        bot_id: &str,
        channel: &ChannelId,
        messages: Vec<RawMessage>,
        report: &mut CycleReport,
    ) {
        for message in messages {
            self.process_message(now, bot_id, channel, message, report)
                .await;
        }
    }

    async fn process_message(
        &self,
        now: DateTime<Utc>,
        bot_id: &str,
        channel: &ChannelId,
        message: RawMessage,
        report: &mut CycleReport,
    ) {
        let admitted = {
            let mut state = self.state.lock().await;
            let skip = if state.dedup.seen(channel, &message.id) {
                Some(Skip::Seen)
            } else if !message.mentions(bot_id) {
                Some(Skip::Unmentioned)
            } else if is_stale(&message.id, now, self.message_threshold) {
                Some(Skip::Stale)
            } else {
                None
            };

            match skip {
                Some(reason) => Err(reason),
                None => Ok(state.admit(channel, &message.id, &message.text, now)),
            }
        };

        let context = match admitted {
            Ok(context) => context,
            Err(reason) => {
                match reason {
                    Skip::Seen => report.skipped_seen += 1,
                    Skip::Unmentioned => report.skipped_unmentioned += 1,
                    Skip::Stale => report.skipped_stale += 1,
                }
                debug!(channel = %channel, message_id = %message.id, ?reason, "message skipped");
                return;
            }
        };

        info!(
            channel = %channel,
            message_id = %message.id,
            context_turns = context.len(),
            "mention admitted"
        );

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system_prompt: self.settings.system_prompt.clone(),
            messages: context,
            max_tokens: self.settings.max_tokens,
        };
        let provider = Arc::clone(&self.provider);
        let outcome =
            with_deadline(self.settings.timeout, async move { provider.complete(request).await })
                .await;

        let response = match outcome {
            DeadlineOutcome::Completed(response) => response,
            DeadlineOutcome::TimedOut => {
                report.timeouts += 1;
                warn!(
                    channel = %channel,
                    message_id = %message.id,
                    timeout = ?self.settings.timeout,
                    "generation timed out"
                );
                return;
            }
            DeadlineOutcome::Failed(e) => {
                report.generation_failures += 1;
                warn!(channel = %channel, message_id = %message.id, error = %e, "generation failed");
                return;
            }
        };

        let Some(text) = response.usable_text() else {
            report.empty_results += 1;
            info!(channel = %channel, message_id = %message.id, "generation returned no text");
            return;
        };

        report.responses += 1;
        {
            let mut state = self.state.lock().await;
            if !state.conversations.append_assistant_turn(channel, text) {
                debug!(channel = %channel, "history swept before reply was recorded");
            }
        }

        match self.responder.deliver(channel, text).await {
            Ok(_) => report.deliveries += 1,
            Err(e) => {
                report.delivery_failures += 1;
                error!(channel = %channel, message_id = %message.id, error = %e, "reply delivery failed");
            }
        }
    }
}

/// Drives cycles against a chat platform.
pub struct Poller {
    platform: Arc<dyn ChatPlatformAdapter>,
    processor: CycleProcessor,
    history_limit: usize,
}

impl Poller {
    pub fn new(
        platform: Arc<dyn ChatPlatformAdapter>,
        processor: CycleProcessor,
        history_limit: usize,
    ) -> Self {
        Self {
            platform,
            processor,
            history_limit,
        }
    }

    pub fn processor(&self) -> &CycleProcessor {
        &self.processor
    }

    /// Runs one full cycle at `now`.
    ///
    /// Fails only when the bot identity or the channel list cannot be
    /// fetched. A channel whose history cannot be fetched is logged, counted
    /// and skipped.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleReport, MurmurError> {
        let bot_id = self.platform.bot_identity().await?;
        let channels = self.platform.list_channels().await?;
        debug!(bot_id = %bot_id, channels = channels.len(), "cycle started");

        let mut report = CycleReport::default();
        for info in channels {
            report.channels += 1;
            match self.platform.history(&info.id, self.history_limit).await {
                Ok(messages) => {
                    self.processor
                        .process_channel(now, &bot_id, &info.id, messages, &mut report)
                        .await;
                }
                Err(e) => {
                    report.history_failures += 1;
                    warn!(channel = %info.id, name = %info.name, error = %e, "history fetch failed");
                }
            }
        }

        info!(
            channels = report.channels,
            admitted = report.admitted(),
            skipped = report.skipped(),
            responses = report.responses,
            deliveries = report.deliveries,
            "cycle finished"
        );
        Ok(report)
    }

    /// Runs a cycle every `period` until `cancel` fires.
    ///
    /// The first cycle starts immediately. A failed cycle is logged and the
    /// loop waits for the next tick. Cancellation is observed between cycles,
    /// so a running cycle always finishes.
    pub async fn run(&self, period: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.run_cycle(Utc::now()).await {
                        error!(error = %e, "poll cycle aborted");
                    }
                }
            }
        }
        info!("poll loop stopped");
    }
}
