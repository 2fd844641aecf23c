//! Fan-out of formatted notifications to live bot connections.
//!
//! The bot registry is the narrow seam to the host messaging framework: the
//! host registers whatever outbound connections it holds, and dispatch sends
//! one message per subscription to every connection on the matching platform.
//! A failing connection is logged and skipped; it never aborts the batch.

use std::sync::Arc;

use anyhow::Result;
use hubcast_store::Subscription;

/// One live outbound connection owned by the host messaging framework.
pub trait BotConnection: Send + Sync {
    /// Platform identifier this connection serves (compared case-insensitively).
    fn platform(&self) -> &str;
    /// Sends plain text to a target id on this connection.
    fn send_text(&self, target: &str, text: &str) -> Result<()>;
}

/// Per-batch delivery accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub delivered: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Registry of currently live bot connections.
#[derive(Clone, Default)]
pub struct BotRegistry {
    connections: Vec<Arc<dyn BotConnection>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection: Arc<dyn BotConnection>) {
        self.connections.push(connection);
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Delivers `text` once per subscription through every connection whose
    /// platform matches. Subscriptions with no live connection are skipped
    /// silently; per-pair send failures are logged and do not stop the batch.
    pub fn dispatch(&self, subscriptions: &[Subscription], text: &str) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for subscription in subscriptions {
            let mut matched = false;
            for connection in &self.connections {
                if !connection
                    .platform()
                    .eq_ignore_ascii_case(&subscription.platform)
                {
                    continue;
                }
                matched = true;
                match connection.send_text(&subscription.target, text) {
                    Ok(()) => summary.delivered += 1,
                    Err(error) => {
                        summary.failed += 1;
                        tracing::error!(
                            platform = %subscription.platform,
                            target = %subscription.target,
                            %error,
                            "failed to deliver webhook notification"
                        );
                    }
                }
            }
            if !matched {
                summary.skipped += 1;
            }
        }
        summary
    }
}
