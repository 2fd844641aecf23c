//! Axum endpoint orchestrating the webhook ingestion pipeline.
//!
//! One inbound request runs parse -> repo config lookup -> signature check
//! -> subscription filter -> format -> dispatch. Only validation and
//! authentication failures produce non-200 responses; everything downstream
//! of authentication degrades to a 200 so the sender does not retry.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use hubcast_core::{BridgeConfig, RepositoryPolicy};
use hubcast_dispatch::BotRegistry;
use hubcast_format::{render_event, RenderOptions};
use hubcast_store::SqliteSubscriptionStore;

use crate::webhook_signature::verify_webhook_signature;

const GITHUB_EVENT_HEADER: &str = "x-github-event";
const GITHUB_SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Shared state behind the webhook endpoint.
pub struct WebhookServerState {
    pub config: BridgeConfig,
    pub store: SqliteSubscriptionStore,
    pub bots: BotRegistry,
}

/// Builds the router serving the webhook path plus a health probe.
pub fn build_webhook_router(state: Arc<WebhookServerState>) -> Router {
    let path = state.config.path.clone();
    Router::new()
        .route(&path, post(handle_github_webhook))
        .route("/healthz", get(handle_health))
        .with_state(state)
}

/// Binds `bind` and serves the webhook router until ctrl-c.
pub async fn run_webhook_server(bind: &str, state: Arc<WebhookServerState>) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve webhook bound address")?;
    tracing::info!(addr = %local_addr, path = %state.config.path, "webhook server listening");

    let app = build_webhook_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook server exited unexpectedly")
}

async fn handle_health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn handle_github_webhook(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let event = header_value(&headers, GITHUB_EVENT_HEADER).unwrap_or("");

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                "bad request: payload is not valid json".to_string(),
            )
        }
    };
    let Some(full_name) = payload
        .pointer("/repository/full_name")
        .and_then(Value::as_str)
    else {
        return (
            StatusCode::BAD_REQUEST,
            "bad request: repository info missing".to_string(),
        );
    };

    let policy = match state.config.repository(full_name) {
        Some(repo_config) => {
            // Verify over the raw body bytes, never a re-serialized payload.
            let signature = header_value(&headers, GITHUB_SIGNATURE_HEADER).unwrap_or("");
            if let Err(error) = verify_webhook_signature(&body, signature, &repo_config.secret) {
                tracing::warn!(repo = full_name, %error, "webhook signature rejected");
                return (
                    StatusCode::FORBIDDEN,
                    "forbidden: signature verification failed".to_string(),
                );
            }
            repo_config.policy()
        }
        None if state.config.allow_unknown_repositories => RepositoryPolicy::default(),
        None => {
            return (
                StatusCode::FORBIDDEN,
                format!("forbidden: repository {full_name} is not configured"),
            );
        }
    };

    let subscriptions = match state.store.list_for_repo(full_name) {
        Ok(subscriptions) => subscriptions,
        Err(error) => {
            tracing::error!(repo = full_name, %error, "subscription lookup failed");
            return (StatusCode::OK, "webhook received".to_string());
        }
    };
    let interested: Vec<_> = subscriptions
        .into_iter()
        .filter(|sub| sub.allows_event(event) || policy.forward_unknown_events)
        .collect();
    if interested.is_empty() {
        return (
            StatusCode::OK,
            "no subscription for this repository or event".to_string(),
        );
    }

    if event == "watch" && !policy.forward_watch {
        return (
            StatusCode::OK,
            "watch forwarding disabled for this repository".to_string(),
        );
    }

    let options = RenderOptions {
        forward_watch: policy.forward_watch,
        forward_unknown_events: policy.forward_unknown_events,
    };
    let Some(text) = render_event(event, &payload, &options) else {
        return (
            StatusCode::OK,
            "no message produced for this event".to_string(),
        );
    };

    let summary = state.bots.dispatch(&interested, &text);
    tracing::info!(
        repo = full_name,
        event,
        delivered = summary.delivered,
        skipped = summary.skipped,
        failed = summary.failed,
        "webhook dispatched"
    );
    (StatusCode::OK, "webhook received".to_string())
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
}
