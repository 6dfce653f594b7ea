// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic expiry of handled ids and idle conversations.

use std::time::Duration;

use chrono::{DateTime, Utc};
use murmur_config::EngineConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::state::{SharedState, SweepReport};

/// Background task sweeping the shared engine state on a fixed period.
#[derive(Clone)]
pub struct CleanupScheduler {
    state: SharedState,
    message_expiry: Duration,
    channel_expiry: Duration,
    period: Duration,
}

impl CleanupScheduler {
    pub fn new(
        state: SharedState,
        message_expiry: Duration,
        channel_expiry: Duration,
        period: Duration,
    ) -> Self {
        Self {
            state,
            message_expiry,
            channel_expiry,
            period,
        }
    }

    pub fn from_config(state: SharedState, config: &EngineConfig) -> Self {
        Self::new(
            state,
            config.message_expiry(),
            config.channel_expiry(),
            config.sweep_interval(),
        )
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Runs one sweep as of `now`.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let report = self
            .state
            .lock()
            .await
            .sweep(now, self.message_expiry, self.channel_expiry);

        if report.expired_messages > 0 || !report.forgotten_channels.is_empty() {
            info!(
                expired_messages = report.expired_messages,
                forgotten_channels = report.forgotten_channels.len(),
                "cleanup sweep"
            );
        } else {
            debug!("cleanup sweep found nothing to expire");
        }
        report
    }

    /// Sweeps once per period until `cancel` fires.
    ///
    /// The first sweep happens one full period after start.
    pub async fn run(self, cancel: CancellationToken) {
        let start = tokio::time::Instant::now() + self.period;
        let mut ticker = tokio::time::interval_at(start, self.period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_at(Utc::now()).await;
                }
            }
        }
        debug!("cleanup scheduler stopped");
    }

    /// Spawns [`run`](Self::run) onto the current runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
