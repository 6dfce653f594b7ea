// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Murmur mention responder.

use thiserror::Error;

/// The primary error type used across all Murmur adapter traits and engine operations.
#[derive(Debug, Error)]
pub enum MurmurError {
    /// Configuration errors (missing credentials, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Chat platform errors (auth failure, listing failure, post rejected).
    #[error("chat platform error: {message}")]
    Chat {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text-completion provider errors (HTTP failure, malformed response).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// A multi-chunk reply was only partially posted.
    #[error("delivered {delivered} of {total} chunks: {message}")]
    Delivery {
        delivered: usize,
        total: usize,
        message: String,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MurmurError {
    /// Shorthand for a chat platform error without an underlying source.
    pub fn chat(message: impl Into<String>) -> Self {
        Self::Chat {
            message: message.into(),
            source: None,
        }
    }

    /// Shorthand for a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            source: None,
        }
    }
}
