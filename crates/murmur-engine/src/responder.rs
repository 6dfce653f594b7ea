// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply delivery with size-limited chunking.

use std::sync::Arc;

use murmur_core::{ChannelId, ChatPlatformAdapter, MurmurError};
use tracing::{debug, warn};

/// Splits `text` into ordered, contiguous chunks of at most `limit` characters.
///
/// Splits fall on `char` boundaries, so multi-byte text is never cut inside a
/// code point. Concatenating the chunks gives back `text`; text at or below
/// the limit is a single chunk and empty text has none. A zero limit is
/// treated as one.
pub fn split_into_chunks(text: &str, limit: usize) -> Vec<&str> {
    let limit = limit.max(1);
    let mut chunks = Vec::with_capacity(text.len() / limit + 1);
    let mut rest = text;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(offset, _)| offset);
        let (chunk, tail) = rest.split_at(cut);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

/// Posts generated replies back into a channel.
#[derive(Clone)]
pub struct Responder {
    platform: Arc<dyn ChatPlatformAdapter>,
    chunk_size: usize,
}

impl Responder {
    pub fn new(platform: Arc<dyn ChatPlatformAdapter>, chunk_size: usize) -> Self {
        Self {
            platform,
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Posts `text` to `channel` as one message per chunk, in order.
    ///
    /// Stops at the first failed post. Chunks already posted stay posted and
    /// the failure is returned as [`MurmurError::Delivery`]. Returns the
    /// number of chunks posted on success.
    pub async fn deliver(&self, channel: &ChannelId, text: &str) -> Result<usize, MurmurError> {
        let chunks = split_into_chunks(text, self.chunk_size);
        let total = chunks.len();

        for (delivered, chunk) in chunks.into_iter().enumerate() {
            if let Err(e) = self.platform.post_message(channel, chunk).await {
                warn!(
                    channel = %channel,
                    delivered,
                    total,
                    error = %e,
                    "reply chunk was not posted"
                );
                return Err(MurmurError::Delivery {
                    delivered,
                    total,
                    message: e.to_string(),
                });
            }
        }

        debug!(channel = %channel, chunks = total, "reply delivered");
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_test_utils::MockPlatform;
    use proptest::prelude::*;

    #[test]
    fn short_text_is_one_chunk() {
        assert_eq!(split_into_chunks("hello", 4000), vec!["hello"]);
        let exact = "x".repeat(4000);
        assert_eq!(split_into_chunks(&exact, 4000).len(), 1);
    }

    #[test]
    fn long_text_splits_at_limit() {
        let text = "a".repeat(4001);
        let chunks = split_into_chunks(&text, 4000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4000);
        assert_eq!(chunks[1], "a");
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(split_into_chunks("", 10).is_empty());
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let chunks = split_into_chunks("héllo wörld", 4);
        assert_eq!(chunks, vec!["héll", "o wö", "rld"]);
    }

    #[tokio::test]
    async fn deliver_posts_chunks_in_order() {
        let platform = Arc::new(MockPlatform::new("UBOT"));
        let responder = Responder::new(platform.clone(), 3);
        let channel = ChannelId::new("C1");

        let posted = responder.deliver(&channel, "abcdefgh").await.unwrap();
        assert_eq!(posted, 3);
        assert_eq!(platform.posted_texts(&channel).await, vec!["abc", "def", "gh"]);
    }

    #[tokio::test]
    async fn partial_delivery_reports_progress() {
        let platform = Arc::new(MockPlatform::new("UBOT"));
        platform.fail_posts_after(1).await;
        let responder = Responder::new(platform.clone(), 2);
        let channel = ChannelId::new("C1");

        let err = responder.deliver(&channel, "aabbcc").await.unwrap_err();
        match err {
            MurmurError::Delivery {
                delivered, total, ..
            } => {
                assert_eq!(delivered, 1);
                assert_eq!(total, 3);
            }
            other => panic!("expected Delivery, got {other:?}"),
        }
        // No rollback of what already went out.
        assert_eq!(platform.posted_texts(&channel).await, vec!["aa"]);
    }

    proptest! {
        #[test]
        fn chunks_round_trip(text in "\\PC{0,300}", limit in 1usize..50) {
            let chunks = split_into_chunks(&text, limit);
            prop_assert_eq!(chunks.concat(), text.clone());
            for chunk in &chunks {
                prop_assert!(!chunk.is_empty());
                prop_assert!(chunk.chars().count() <= limit);
            }
            if text.chars().count() <= limit {
                prop_assert!(chunks.len() <= 1);
            }
        }
    }
}
