// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `murmur check-config` command implementation.

use murmur_config::MurmurConfig;
use murmur_core::error::MurmurError;
use murmur_core::{HealthStatus, PluginAdapter};

use crate::serve;

/// Prints the effective settings of an already validated config.
///
/// With `health`, also builds both adapters and prints one status line per
/// adapter. An unhealthy adapter is reported, not treated as a failure;
/// missing credentials are.
pub async fn run_check_config(config: &MurmurConfig, health: bool) -> Result<(), MurmurError> {
    println!("{}", render(config)?);

    if health {
        let (platform, provider) = serve::build_adapters(config)?;
        println!();
        println!("{}", describe(platform.as_ref()).await);
        println!("{}", describe(provider.as_ref()).await);
    }
    Ok(())
}

fn render(config: &MurmurConfig) -> Result<String, MurmurError> {
    let settings = config
        .to_redacted_toml()
        .map_err(|e| MurmurError::Internal(format!("failed to render config: {e}")))?;
    Ok(format!(
        "# murmur: configuration is valid\n{}",
        settings.trim_end()
    ))
}

/// One status line: `# <name> <version> (<type>): <health>`.
async fn describe<A: PluginAdapter + ?Sized>(adapter: &A) -> String {
    let status = match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => "healthy".to_string(),
        Ok(HealthStatus::Degraded(reason)) => format!("degraded: {reason}"),
        Ok(HealthStatus::Unhealthy(reason)) => format!("unhealthy: {reason}"),
        Err(e) => format!("check failed: {e}"),
    };
    format!(
        "# {} {} ({}): {status}",
        adapter.name(),
        adapter.version(),
        adapter.adapter_type()
    )
}
