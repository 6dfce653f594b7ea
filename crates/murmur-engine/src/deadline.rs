// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deadline primitive for collaborator calls.
//!
//! The call runs as its own task and is raced against a timer. When the
//! timer wins, the task is detached rather than aborted; it ends on its own
//! once the HTTP client's request timeout fires.

use std::future::Future;
use std::time::Duration;

use murmur_core::MurmurError;

/// How a deadline-bounded call ended.
#[derive(Debug)]
pub enum DeadlineOutcome<T> {
    Completed(T),
    TimedOut,
    Failed(MurmurError),
}

impl<T> DeadlineOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Collapses the outcome into a `Result`, mapping a timeout to
    /// [`MurmurError::Timeout`].
    pub fn into_result(self, limit: Duration) -> Result<T, MurmurError> {
        match self {
            Self::Completed(value) => Ok(value),
            Self::TimedOut => Err(MurmurError::Timeout { duration: limit }),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Runs `call` with a deadline of `limit`.
///
/// A completion that is ready at the same instant as the timer wins.
pub async fn with_deadline<T, F>(limit: Duration, call: F) -> DeadlineOutcome<T>
where
    F: Future<Output = Result<T, MurmurError>> + Send + 'static,
    T: Send + 'static,
{
    let mut task = tokio::spawn(call);
    tokio::select! {
        biased;
        joined = &mut task => match joined {
            Ok(Ok(value)) => DeadlineOutcome::Completed(value),
            Ok(Err(err)) => DeadlineOutcome::Failed(err),
            Err(join_err) => DeadlineOutcome::Failed(MurmurError::Internal(format!(
                "deadline task ended abnormally: {join_err}"
            ))),
        },
        _ = tokio::time::sleep(limit) => DeadlineOutcome::TimedOut,
    }
}
