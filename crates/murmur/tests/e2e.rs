// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Murmur pipeline.
//!
//! The first group drives the engine over mock collaborators via
//! `TestHarness`. The second wires the real Slack and OpenAI adapters to
//! wiremock servers and runs the engine exactly as `murmur poll` and
//! `murmur serve` do.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use murmur_config::MurmurConfig;
use murmur_core::types::datetime_from_epoch_seconds;
use murmur_core::{ChatPlatformAdapter, ProviderAdapter, Role};
use murmur_engine::MurmurEngine;
use murmur_openai::OpenAiProvider;
use murmur_slack::SlackPlatform;
use murmur_test_utils::TestHarness;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn at(secs: f64) -> DateTime<Utc> {
    datetime_from_epoch_seconds(secs).unwrap()
}

// ---- Mock collaborators ----

#[tokio::test]
async fn mentions_in_two_channels_keep_separate_histories() {
    let harness = TestHarness::builder()
        .with_channel("C1", "general")
        .with_channel("C2", "random")
        .with_mock_responses(vec!["one".into(), "two".into()])
        .build()
        .await;
    harness.inject_mention("C1", "100.0", "first").await;
    harness.inject_mention("C2", "101.0", "second").await;

    let report = harness.run_cycle_at(at(110.0)).await.unwrap();
    assert_eq!(report.channels, 2);
    assert_eq!(report.responses, 2);

    let c1 = harness.context_for("C1").await;
    let c2 = harness.context_for("C2").await;
    assert_eq!(c1.len(), 2);
    assert_eq!(c2.len(), 2);
    assert!(c1[0].content.ends_with("first"));
    assert!(c2[0].content.ends_with("second"));

    let requests = harness.mock_provider.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.messages.len() == 1));
}

#[tokio::test]
async fn system_prompt_travels_with_every_request_but_not_history() {
    let harness = TestHarness::builder()
        .with_channel("C1", "general")
        .with_system_prompt("Answer in one sentence.")
        .with_mock_responses(vec!["sure".into()])
        .build()
        .await;
    harness.inject_mention("C1", "100.0", "explain rust").await;
    harness.run_cycle_at(at(101.0)).await.unwrap();

    let requests = harness.mock_provider.requests().await;
    assert_eq!(
        requests[0].system_prompt.as_deref(),
        Some("Answer in one sentence.")
    );
    let history = harness.context_for("C1").await;
    assert_eq!(
        history.iter().map(|t| t.role).collect::<Vec<_>>(),
        vec![Role::User, Role::Assistant]
    );
}

#[tokio::test]
async fn long_reply_is_posted_in_chunks() {
    let long = "x".repeat(9_000);
    let harness = TestHarness::builder()
        .with_channel("C1", "general")
        .with_mock_responses(vec![long.clone()])
        .build()
        .await;
    harness.inject_mention("C1", "100.0", "write a lot").await;

    let report = harness.run_cycle_at(at(101.0)).await.unwrap();
    assert_eq!(report.deliveries, 1);

    let replies = harness.replies_in("C1").await;
    assert_eq!(
        replies.iter().map(|r| r.chars().count()).collect::<Vec<_>>(),
        vec![4000, 4000, 1000]
    );
    assert_eq!(replies.concat(), long);
}

#[tokio::test]
async fn failed_generation_is_not_retried_but_later_mentions_are_answered() {
    let harness = TestHarness::builder()
        .with_channel("C1", "general")
        .build()
        .await;
    harness.mock_provider.add_error("upstream unavailable").await;
    harness.mock_provider.add_response("back online").await;

    harness.inject_mention("C1", "100.0", "are you there?").await;
    let first = harness.run_cycle_at(at(101.0)).await.unwrap();
    assert_eq!(first.generation_failures, 1);
    assert!(harness.replies_in("C1").await.is_empty());

    harness.inject_mention("C1", "110.0", "hello again").await;
    let second = harness.run_cycle_at(at(111.0)).await.unwrap();
    assert_eq!(second.skipped_seen, 1);
    assert_eq!(second.responses, 1);
    assert_eq!(harness.replies_in("C1").await, vec!["back online"]);

    // The unanswered user turn stays in context ahead of the new one.
    let history = harness.context_for("C1").await;
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::User);
    assert_eq!(history[2].role, Role::Assistant);
}

// ---- Real adapters over HTTP ----

struct Servers {
    slack: MockServer,
    openai: MockServer,
}

impl Servers {
    async fn start() -> Self {
        Self {
            slack: MockServer::start().await,
            openai: MockServer::start().await,
        }
    }

    fn config(&self) -> MurmurConfig {
        let mut config = MurmurConfig::default();
        config.slack.bot_token = Some("xoxb-test".into());
        config.slack.api_base = self.slack.uri();
        config.openai.api_key = Some("sk-test".into());
        config.openai.base_url = self.openai.uri();
        config
    }

    fn engine(&self) -> MurmurEngine {
        let config = self.config();
        let platform: Arc<dyn ChatPlatformAdapter> =
            Arc::new(SlackPlatform::new(&config.slack).unwrap());
        let provider: Arc<dyn ProviderAdapter> =
            Arc::new(OpenAiProvider::new(&config.openai).unwrap());
        MurmurEngine::new(&config, platform, provider)
    }

    async fn mount_workspace(&self, ts: &str) {
        Mock::given(method("GET"))
            .and(path("/auth.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true, "user_id": "UBOT"
            })))
            .mount(&self.slack)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversations.list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "channels": [
                    {"id": "C1", "name": "general", "is_member": true},
                    {"id": "C9", "name": "elsewhere", "is_member": false}
                ]
            })))
            .mount(&self.slack)
            .await;
        Mock::given(method("GET"))
            .and(path("/conversations.history"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "messages": [
                    {"type": "message", "ts": ts, "user": "U1", "text": "<@UBOT> what's up?"},
                    {"type": "message", "ts": "1000000000.000200", "user": "U2", "text": "unrelated chatter"}
                ]
            })))
            .mount(&self.slack)
            .await;
    }

    async fn mount_completion(&self, reply: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 200,
                "messages": [{"role": "user", "content": "<@UBOT> what's up?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "model": "gpt-4o",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": reply},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&self.openai)
            .await;
    }

    async fn expect_post(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/chat.postMessage"))
            .and(body_json(serde_json::json!({"channel": "C1", "text": text})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true, "channel": "C1", "ts": "9999999999.000001"
            })))
            .expect(1)
            .mount(&self.slack)
            .await;
    }
}

/// A `ts` a few seconds in the past, inside the staleness threshold.
fn recent_ts() -> String {
    format!("{}.000100", Utc::now().timestamp() - 5)
}

#[tokio::test]
async fn one_shot_cycle_answers_a_fresh_mention() {
    let servers = Servers::start().await;
    servers.mount_workspace(&recent_ts()).await;
    servers.mount_completion("  All quiet here.  ").await;
    servers.expect_post("All quiet here.").await;

    let report = servers.engine().run_once().await.unwrap();
    assert_eq!(report.channels, 1);
    assert_eq!(report.responses, 1);
    assert_eq!(report.deliveries, 1);
    assert_eq!(report.skipped_unmentioned, 1);
}

#[tokio::test]
async fn one_shot_cycle_ignores_old_mentions() {
    let servers = Servers::start().await;
    servers.mount_workspace("1000000000.000100").await;

    let report = servers.engine().run_once().await.unwrap();
    assert_eq!(report.skipped_stale, 1);
    assert_eq!(report.responses, 0);
    assert!(servers.openai.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_token_aborts_the_cycle() {
    let servers = Servers::start().await;
    Mock::given(method("GET"))
        .and(path("/auth.test"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"ok": false, "error": "invalid_auth"})),
        )
        .mount(&servers.slack)
        .await;

    let err = servers.engine().run_once().await.unwrap_err();
    assert!(err.to_string().contains("invalid_auth"));
}

#[tokio::test]
async fn serve_loop_answers_then_stops_on_cancel() {
    let servers = Servers::start().await;
    servers.mount_workspace(&recent_ts()).await;
    servers.mount_completion("hello from serve").await;
    servers.expect_post("hello from serve").await;

    let cancel = CancellationToken::new();
    let task = tokio::spawn(servers.engine().run(cancel.clone()));

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let posted = servers
            .slack
            .received_requests()
            .await
            .unwrap()
            .iter()
            .any(|r| r.url.path() == "/chat.postMessage");
        if posted || tokio::time::Instant::now() > deadline {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("engine stops after cancel")
        .unwrap();
}
