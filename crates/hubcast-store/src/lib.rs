//! Subscription records and the SQLite-backed store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod sqlite;

pub use sqlite::SqliteSubscriptionStore;

/// Result type for subscription store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid persisted value for '{field}': {value}")]
    InvalidPersistedValue { field: &'static str, value: String },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Kind of messaging target a subscription points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Group,
    User,
    Channel,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::User => "user",
            Self::Channel => "channel",
        }
    }
}

/// One stored subscription: a messaging target interested in a repository.
///
/// The tuple `(platform, kind, target, repo)` is unique; subscribing twice
/// to the same tuple updates `events` in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub platform: String,
    pub kind: TargetKind,
    pub target: String,
    pub repo: String,
    /// Either the literal `all` or a comma-separated set of event names.
    pub events: String,
}

impl Subscription {
    /// Returns true when this subscription's event filter admits `event`.
    ///
    /// An empty filter and the literal `all` admit every event type.
    pub fn allows_event(&self, event: &str) -> bool {
        let filter = self.events.trim();
        if filter.is_empty() || filter == "all" {
            return true;
        }
        filter.split(',').any(|entry| entry.trim() == event)
    }
}

/// Outcome of an insert-or-update subscribe call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

fn target_kind_to_db(kind: TargetKind) -> &'static str {
    kind.as_str()
}

fn target_kind_from_db(value: &str) -> StoreResult<TargetKind> {
    match value {
        "group" => Ok(TargetKind::Group),
        "user" => Ok(TargetKind::User),
        "channel" => Ok(TargetKind::Channel),
        _ => Err(StoreError::InvalidPersistedValue {
            field: "kind",
            value: value.to_string(),
        }),
    }
}
