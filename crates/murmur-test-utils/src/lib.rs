// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Murmur integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without Slack or OpenAI.
//!
//! # Components
//!
//! - [`MockProvider`] - Mock completion provider with scripted replies
//! - [`MockPlatform`] - Mock chat workspace with injectable history and captured posts
//! - [`TestHarness`] - A full engine wired to both mocks

pub mod harness;
pub mod mock_platform;
pub mod mock_provider;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_platform::{MockPlatform, PostedMessage, mention};
pub use mock_provider::{MockProvider, MockReply};
