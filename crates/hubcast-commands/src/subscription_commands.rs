use hubcast_core::{BridgeConfig, EVENT_CATALOG};
use hubcast_store::{SqliteSubscriptionStore, StoreError, Subscription, UpsertOutcome};

use crate::session_context::SessionContext;

const REPLY_NO_TARGET: &str =
    "Could not resolve a subscription target; run this command from a group, direct message, or channel.";

/// Subscribes the invoking session's target to a configured repository.
///
/// Without a repository argument, replies with a numbered menu of the
/// configured repositories. A numeric argument addresses that menu. The
/// events argument defaults to `all`.
pub fn subscribe_command(
    config: &BridgeConfig,
    store: &SqliteSubscriptionStore,
    session: &SessionContext,
    repo: Option<&str>,
    events: Option<&str>,
) -> String {
    let Some(repo_arg) = repo.map(str::trim).filter(|repo| !repo.is_empty()) else {
        if config.repositories.is_empty() {
            return "No repositories are configured for subscription.".to_string();
        }
        let menu = config
            .repositories
            .iter()
            .enumerate()
            .map(|(index, entry)| format!("{index}: {}", entry.repo))
            .collect::<Vec<_>>()
            .join("\n");
        return format!("Choose a repository to subscribe:\n{menu}");
    };

    let repo_name = if repo_arg.chars().all(|ch| ch.is_ascii_digit()) {
        match repo_arg
            .parse::<usize>()
            .ok()
            .and_then(|index| config.repositories.get(index))
        {
            Some(entry) => entry.repo.clone(),
            None => return "Invalid repository index.".to_string(),
        }
    } else {
        repo_arg.to_string()
    };

    if config.repository(&repo_name).is_none() {
        return format!("Repository {repo_name} is not in the configured list.");
    }

    let Some((target, kind)) = session.resolve_target() else {
        return REPLY_NO_TARGET.to_string();
    };
    let events = events
        .map(str::trim)
        .filter(|events| !events.is_empty())
        .unwrap_or("all");

    let subscription = Subscription {
        platform: session.platform.clone(),
        kind,
        target: target.to_string(),
        repo: repo_name.clone(),
        events: events.to_string(),
    };
    match store.upsert(&subscription) {
        Ok(UpsertOutcome::Created) => format!("Subscribed to {repo_name} (events: {events})."),
        Ok(UpsertOutcome::Updated) => {
            format!("Updated subscription for {repo_name} (events: {events}).")
        }
        Err(error) => store_failure(error),
    }
}

/// Removes a subscription for the invoking session's target.
///
/// An explicit target argument requires the admin flag. Without a repository
/// argument the sole subscription is removed directly; with several, a
/// numbered list is returned and a numeric argument addresses it.
pub fn unsubscribe_command(
    store: &SqliteSubscriptionStore,
    session: &SessionContext,
    repo: Option<&str>,
    target_override: Option<&str>,
) -> String {
    let target = if let Some(target) = target_override {
        if !session.admin {
            return "Only administrators may remove another target's subscriptions.".to_string();
        }
        target.to_string()
    } else {
        match session.resolve_target() {
            Some((target, _)) => target.to_string(),
            None => return REPLY_NO_TARGET.to_string(),
        }
    };
    let platform = session.platform.as_str();

    let Some(repo_arg) = repo.map(str::trim).filter(|repo| !repo.is_empty()) else {
        let subscriptions = match store.list_for_target(platform, &target) {
            Ok(subscriptions) => subscriptions,
            Err(error) => return store_failure(error),
        };
        return match subscriptions.as_slice() {
            [] => "No subscriptions found for this target.".to_string(),
            [only] => match store.remove(platform, &target, &only.repo) {
                Ok(_) => format!("Unsubscribed from {}.", only.repo),
                Err(error) => store_failure(error),
            },
            _ => format!(
                "Current subscriptions:\n{}\nRun unsubscribe again with an index or repository name.",
                numbered_subscriptions(&subscriptions)
            ),
        };
    };

    if repo_arg.chars().all(|ch| ch.is_ascii_digit()) {
        let subscriptions = match store.list_for_target(platform, &target) {
            Ok(subscriptions) => subscriptions,
            Err(error) => return store_failure(error),
        };
        let Some(chosen) = repo_arg
            .parse::<usize>()
            .ok()
            .and_then(|index| subscriptions.get(index))
        else {
            return "Invalid subscription index.".to_string();
        };
        return match store.remove(platform, &target, &chosen.repo) {
            Ok(_) => format!("Unsubscribed from {}.", chosen.repo),
            Err(error) => store_failure(error),
        };
    }

    match store.remove(platform, &target, repo_arg) {
        Ok(removed) if removed > 0 => format!("Unsubscribed from {repo_arg}."),
        Ok(_) => {
            let subscriptions = match store.list_for_target(platform, &target) {
                Ok(subscriptions) => subscriptions,
                Err(error) => return store_failure(error),
            };
            if subscriptions.is_empty() {
                format!("No subscription found for {repo_arg}, and this target has no subscriptions.")
            } else {
                format!(
                    "No subscription found for {repo_arg}.\nCurrent subscriptions:\n{}",
                    numbered_subscriptions(&subscriptions)
                )
            }
        }
        Err(error) => store_failure(error),
    }
}

/// Lists the caller's subscriptions, or every stored row for admins.
pub fn list_command(store: &SqliteSubscriptionStore, session: &SessionContext) -> String {
    if session.admin {
        let subscriptions = match store.list_all() {
            Ok(subscriptions) => subscriptions,
            Err(error) => return store_failure(error),
        };
        if subscriptions.is_empty() {
            return "No subscriptions recorded.".to_string();
        }
        let rows = subscriptions
            .iter()
            .map(|sub| {
                format!(
                    "target: {} | repo: {} | events: {} | platform: {}",
                    sub.target, sub.repo, sub.events, sub.platform
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        return format!("All subscriptions:\n{rows}");
    }

    let Some((target, _)) = session.resolve_target() else {
        return REPLY_NO_TARGET.to_string();
    };
    let subscriptions = match store.list_for_target(&session.platform, target) {
        Ok(subscriptions) => subscriptions,
        Err(error) => return store_failure(error),
    };
    if subscriptions.is_empty() {
        return "No subscriptions for this target.".to_string();
    }
    let rows = subscriptions
        .iter()
        .map(|sub| format!("- {} (events: {})", sub.repo, sub.events))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Subscribed repositories:\n{rows}")
}

/// Static reference list of recognized event types.
pub fn types_command() -> String {
    let rows = EVENT_CATALOG
        .iter()
        .map(|entry| format!("{} {:<13} {}", entry.emoji, entry.name, entry.description))
        .collect::<Vec<_>>()
        .join("\n");
    [
        "📋 supported event types",
        "══════════════════════",
        rows.as_str(),
        "══════════════════════",
        "note: names match the webhook event header",
    ]
    .join("\n")
}

fn numbered_subscriptions(subscriptions: &[Subscription]) -> String {
    subscriptions
        .iter()
        .enumerate()
        .map(|(index, sub)| format!("{index}: {} (events: {})", sub.repo, sub.events))
        .collect::<Vec<_>>()
        .join("\n")
}

fn store_failure(error: StoreError) -> String {
    tracing::error!(%error, "subscription store operation failed");
    "Subscription storage is currently unavailable; try again later.".to_string()
}

#[cfg(test)]
mod tests {
    use super::{list_command, subscribe_command, types_command, unsubscribe_command};
    use crate::session_context::SessionContext;
    use hubcast_core::BridgeConfig;
    use hubcast_store::SqliteSubscriptionStore;
    use tempfile::tempdir;

    fn config() -> BridgeConfig {
        BridgeConfig::from_toml_str(
            r#"
            [[repositories]]
            repo = "acme/widgets"
            secret = "s3cr3t"

            [[repositories]]
            repo = "acme/gears"
            secret = "other"
            "#,
        )
        .expect("parse config")
    }

    fn group_session(guild: &str) -> SessionContext {
        SessionContext {
            platform: "chat".to_string(),
            guild_id: Some(guild.to_string()),
            ..SessionContext::default()
        }
    }

    fn store(temp: &tempfile::TempDir) -> SqliteSubscriptionStore {
        SqliteSubscriptionStore::new(temp.path().join("subs.sqlite")).expect("create store")
    }

    #[test]
    fn subscribe_without_repo_lists_the_configured_menu() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let reply = subscribe_command(&config(), &store, &group_session("g1"), None, None);
        assert!(reply.contains("0: acme/widgets"));
        assert!(reply.contains("1: acme/gears"));
    }

    #[test]
    fn subscribe_creates_then_updates_the_same_row() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let session = group_session("g1");

        let first = subscribe_command(&config(), &store, &session, Some("acme/widgets"), None);
        assert_eq!(first, "Subscribed to acme/widgets (events: all).");

        let second = subscribe_command(
            &config(),
            &store,
            &session,
            Some("acme/widgets"),
            Some("push,star"),
        );
        assert_eq!(
            second,
            "Updated subscription for acme/widgets (events: push,star)."
        );

        let rows = store.list_for_target("chat", "g1").expect("list target");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].events, "push,star");
    }

    #[test]
    fn subscribe_accepts_a_menu_index() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let reply = subscribe_command(&config(), &store, &group_session("g1"), Some("1"), None);
        assert_eq!(reply, "Subscribed to acme/gears (events: all).");

        let bad = subscribe_command(&config(), &store, &group_session("g1"), Some("9"), None);
        assert_eq!(bad, "Invalid repository index.");
    }

    #[test]
    fn subscribe_rejects_unconfigured_repositories() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let reply = subscribe_command(
            &config(),
            &store,
            &group_session("g1"),
            Some("unknown/repo"),
            None,
        );
        assert_eq!(reply, "Repository unknown/repo is not in the configured list.");
        assert!(store.list_all().expect("list all").is_empty());
    }

    #[test]
    fn unsubscribe_without_repo_removes_the_sole_subscription() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let session = group_session("g1");
        subscribe_command(&config(), &store, &session, Some("acme/widgets"), None);

        let reply = unsubscribe_command(&store, &session, None, None);
        assert_eq!(reply, "Unsubscribed from acme/widgets.");
        assert!(store.list_all().expect("list all").is_empty());
    }

    #[test]
    fn unsubscribe_without_repo_lists_when_several_exist() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let session = group_session("g1");
        subscribe_command(&config(), &store, &session, Some("acme/widgets"), None);
        subscribe_command(&config(), &store, &session, Some("acme/gears"), None);

        let reply = unsubscribe_command(&store, &session, None, None);
        assert!(reply.contains("0: acme/gears"));
        assert!(reply.contains("1: acme/widgets"));
        assert_eq!(store.list_all().expect("list all").len(), 2);

        let by_index = unsubscribe_command(&store, &session, Some("0"), None);
        assert_eq!(by_index, "Unsubscribed from acme/gears.");
    }

    #[test]
    fn unsubscribe_other_target_requires_admin() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let owner = group_session("g1");
        subscribe_command(&config(), &store, &owner, Some("acme/widgets"), None);

        let denied = unsubscribe_command(&store, &group_session("g2"), Some("acme/widgets"), Some("g1"));
        assert_eq!(
            denied,
            "Only administrators may remove another target's subscriptions."
        );

        let mut admin = group_session("g2");
        admin.admin = true;
        let allowed = unsubscribe_command(&store, &admin, Some("acme/widgets"), Some("g1"));
        assert_eq!(allowed, "Unsubscribed from acme/widgets.");
        assert!(store.list_all().expect("list all").is_empty());
    }

    #[test]
    fn unsubscribe_unknown_repo_replies_with_current_list() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        let session = group_session("g1");
        subscribe_command(&config(), &store, &session, Some("acme/widgets"), None);

        let reply = unsubscribe_command(&store, &session, Some("acme/gears"), None);
        assert!(reply.starts_with("No subscription found for acme/gears."));
        assert!(reply.contains("0: acme/widgets"));
    }

    #[test]
    fn list_shows_own_rows_and_admin_shows_all() {
        let temp = tempdir().expect("tempdir");
        let store = store(&temp);
        subscribe_command(&config(), &store, &group_session("g1"), Some("acme/widgets"), None);
        subscribe_command(&config(), &store, &group_session("g2"), Some("acme/gears"), None);

        let own = list_command(&store, &group_session("g1"));
        assert!(own.contains("acme/widgets"));
        assert!(!own.contains("acme/gears"));

        let mut admin = group_session("g1");
        admin.admin = true;
        let all = list_command(&store, &admin);
        assert!(all.contains("acme/widgets"));
        assert!(all.contains("acme/gears"));
    }

    #[test]
    fn types_lists_every_catalog_entry() {
        let reply = types_command();
        for name in [
            "star",
            "push",
            "workflow_run",
            "issues",
            "pull_request",
            "release",
            "issue_comment",
            "fork",
            "watch",
        ] {
            assert!(reply.contains(name), "missing {name}");
        }
    }
}
