//! Static catalog of webhook event types the bridge knows how to format.

/// Reference entry for one recognized event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTypeInfo {
    pub name: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

/// Recognized event types, in the order they are presented to users.
pub const EVENT_CATALOG: &[EventTypeInfo] = &[
    EventTypeInfo {
        name: "star",
        emoji: "⭐",
        description: "repository starred or unstarred",
    },
    EventTypeInfo {
        name: "push",
        emoji: "🚀",
        description: "commits pushed to a branch",
    },
    EventTypeInfo {
        name: "workflow_run",
        emoji: "⚙️",
        description: "workflow run completed",
    },
    EventTypeInfo {
        name: "issues",
        emoji: "📝",
        description: "issue opened, closed, or changed",
    },
    EventTypeInfo {
        name: "pull_request",
        emoji: "🔀",
        description: "pull request activity",
    },
    EventTypeInfo {
        name: "release",
        emoji: "🏷️",
        description: "release published or changed",
    },
    EventTypeInfo {
        name: "issue_comment",
        emoji: "💬",
        description: "new comment on an issue",
    },
    EventTypeInfo {
        name: "fork",
        emoji: "⑂",
        description: "repository forked",
    },
    EventTypeInfo {
        name: "watch",
        emoji: "👀",
        description: "repository watched",
    },
];

pub fn is_known_event(name: &str) -> bool {
    EVENT_CATALOG.iter().any(|entry| entry.name == name)
}
