// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur serve` and `murmur poll` command implementations.
//!
//! Both build the Slack adapter, the OpenAI provider and one
//! [`MurmurEngine`]. `serve` keeps polling until SIGINT/SIGTERM; `poll` runs a
//! single cycle, so nothing but the staleness threshold guards against
//! answering a mention twice across invocations.

use std::sync::Arc;

use murmur_config::MurmurConfig;
use murmur_core::error::MurmurError;
use murmur_core::{ChatPlatformAdapter, ProviderAdapter};
use murmur_engine::MurmurEngine;
use murmur_engine::shutdown;
use murmur_openai::OpenAiProvider;
use murmur_slack::SlackPlatform;
use tracing::{info, warn};

/// Runs the `murmur serve` command.
pub async fn run_serve(config: MurmurConfig) -> Result<(), MurmurError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting murmur serve");

    let (platform, provider) = build_adapters(&config)?;
    let engine = MurmurEngine::new(&config, Arc::clone(&platform), Arc::clone(&provider));

    let cancel = shutdown::install_signal_handler();
    engine.run(cancel).await;

    shutdown_adapters(platform.as_ref(), provider.as_ref()).await;
    info!("murmur serve stopped");
    Ok(())
}

/// Runs the `murmur poll` command: one cycle, then exit.
///
/// Fails when the bot identity or the channel list cannot be fetched.
pub async fn run_poll(config: MurmurConfig) -> Result<(), MurmurError> {
    init_tracing(&config.agent.log_level);

    let (platform, provider) = build_adapters(&config)?;
    let engine = MurmurEngine::new(&config, Arc::clone(&platform), Arc::clone(&provider));

    let report = engine.run_once().await;
    shutdown_adapters(platform.as_ref(), provider.as_ref()).await;

    let report = report?;
    info!(
        channels = report.channels,
        responses = report.responses,
        deliveries = report.deliveries,
        "poll complete"
    );
    Ok(())
}

pub(crate) type Adapters = (Arc<dyn ChatPlatformAdapter>, Arc<dyn ProviderAdapter>);

pub(crate) fn build_adapters(config: &MurmurConfig) -> Result<Adapters, MurmurError> {
    let platform = SlackPlatform::new(&config.slack)?;
    let provider = OpenAiProvider::new(&config.openai)?;
    Ok((Arc::new(platform), Arc::new(provider)))
}

async fn shutdown_adapters(platform: &dyn ChatPlatformAdapter, provider: &dyn ProviderAdapter) {
    if let Err(e) = platform.shutdown().await {
        warn!(adapter = platform.name(), error = %e, "adapter shutdown failed");
    }
    if let Err(e) = provider.shutdown().await {
        warn!(adapter = provider.name(), error = %e, "adapter shutdown failed");
    }
}

/// Initialize the tracing subscriber with an env filter.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("murmur={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
