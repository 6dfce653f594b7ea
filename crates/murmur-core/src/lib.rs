// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Murmur mention responder.
//!
//! This crate provides the trait definitions for the two external
//! collaborators (chat platform and completion provider), the shared error
//! type, and the message/turn types the engine passes between them.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::MurmurError;
pub use types::{
    AdapterType, ChannelId, ChannelInfo, CompletionRequest, CompletionResponse, HealthStatus,
    MessageId, RawMessage, Role, Turn,
};

pub use traits::{ChatPlatformAdapter, PluginAdapter, ProviderAdapter};
