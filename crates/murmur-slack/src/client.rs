// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Slack Web API.

use std::collections::HashSet;
use std::time::Duration;

use murmur_core::MurmurError;
use reqwest::Url;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{
    AuthTestResponse, ConversationsHistoryResponse, ConversationsListResponse,
    PostMessageRequest, PostMessageResponse, SlackChannel, SlackEnvelope, SlackMessage,
};

/// Page size requested from `conversations.list`.
const LIST_PAGE_SIZE: &str = "200";

/// Bearer-authenticated Slack Web API client.
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
}

impl SlackClient {
    pub fn new(bot_token: &str, api_base: &str, timeout: Duration) -> Result<Self, MurmurError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bot_token.trim())).map_err(|e| {
                MurmurError::Config(format!("invalid bot token header value: {e}"))
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| MurmurError::Chat {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    /// `auth.test`: the bot's own user id.
    pub async fn auth_test(&self) -> Result<String, MurmurError> {
        let response: AuthTestResponse = self.get("auth.test", &[]).await?;
        response
            .user_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| MurmurError::chat("slack auth.test did not return user_id"))
    }

    /// `conversations.list` across all pages. Stops early if the server hands
    /// back a cursor it already gave.
    pub async fn list_conversations(&self, types: &str) -> Result<Vec<SlackChannel>, MurmurError> {
        let mut channels = Vec::new();
        let mut cursor: Option<String> = None;
        let mut visited = HashSet::new();

        loop {
            let mut params = vec![
                ("types", types),
                ("exclude_archived", "true"),
                ("limit", LIST_PAGE_SIZE),
            ];
            if let Some(cursor) = cursor.as_deref() {
                params.push(("cursor", cursor));
            }

            let page: ConversationsListResponse = self.get("conversations.list", &params).await?;
            let next = page.next_cursor().map(str::to_string);
            channels.extend(page.channels);

            match next {
                Some(next) if !visited.insert(next.clone()) => {
                    warn!(cursor = %next, "conversations.list repeated a cursor, stopping");
                    break;
                }
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(count = channels.len(), "conversations listed");
        Ok(channels)
    }

    /// `conversations.history`: up to `limit` recent messages of `channel`.
    pub async fn history(&self, channel: &str, limit: usize) -> Result<Vec<SlackMessage>, MurmurError> {
        let limit = limit.to_string();
        let response: ConversationsHistoryResponse = self
            .get(
                "conversations.history",
                &[("channel", channel), ("limit", limit.as_str())],
            )
            .await?;
        Ok(response.messages)
    }

    /// `chat.postMessage`: returns the new message's `ts`.
    pub async fn post_message(&self, channel: &str, text: &str) -> Result<String, MurmurError> {
        let url = self.method_url("chat.postMessage", &[])?;
        let request = self
            .http
            .post(url)
            .json(&PostMessageRequest { channel, text });
        let response: PostMessageResponse = self.send("chat.postMessage", request).await?;
        response
            .ts
            .ok_or_else(|| MurmurError::chat("slack chat.postMessage response missing ts"))
    }

    fn method_url(&self, method: &str, params: &[(&str, &str)]) -> Result<Url, MurmurError> {
        Url::parse_with_params(&format!("{}/{method}", self.api_base), params).map_err(|e| {
            MurmurError::Chat {
                message: format!("invalid slack url for {method}: {e}"),
                source: Some(Box::new(e)),
            }
        })
    }

    async fn get<T>(&self, method: &str, params: &[(&str, &str)]) -> Result<T, MurmurError>
    where
        T: DeserializeOwned + SlackEnvelope,
    {
        let url = self.method_url(method, params)?;
        self.send(method, self.http.get(url)).await
    }

    /// Sends a request and unwraps Slack's `ok`/`error` envelope.
    async fn send<T>(&self, method: &str, request: reqwest::RequestBuilder) -> Result<T, MurmurError>
    where
        T: DeserializeOwned + SlackEnvelope,
    {
        let response = request.send().await.map_err(|e| MurmurError::Chat {
            message: format!("slack {method} request failed: {e}"),
            source: Some(Box::new(e)),
        })?;

        let status = response.status();
        debug!(method, status = %status, "slack response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MurmurError::chat(format!(
                "slack {method} returned {status}: {body}"
            )));
        }

        let parsed: T = response.json().await.map_err(|e| MurmurError::Chat {
            message: format!("failed to decode slack {method}: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !parsed.ok() {
            return Err(MurmurError::chat(format!(
                "slack {method} failed: {}",
                parsed.error().unwrap_or("unknown_error")
            )));
        }
        Ok(parsed)
    }
}
