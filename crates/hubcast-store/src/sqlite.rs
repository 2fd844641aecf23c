//! SQLite-backed subscription store with durable persistence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{params, Connection, OptionalExtension};

use crate::{target_kind_from_db, target_kind_to_db, StoreResult, Subscription, UpsertOutcome};

/// Persistent store keyed by `(platform, kind, target, repo)`.
///
/// Opens a fresh connection per call; the uniqueness invariant is enforced
/// by the table's composite primary key, so concurrent identical subscribe
/// calls degrade to an events update instead of a duplicate-key failure.
#[derive(Debug, Clone)]
pub struct SqliteSubscriptionStore {
    db_path: PathBuf,
}

impl SqliteSubscriptionStore {
    /// Creates a SQLite-backed store at `path`, creating schema if needed.
    pub fn new(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self { db_path };
        let connection = store.open_connection()?;
        store.initialize_schema(&connection)?;
        Ok(store)
    }

    fn open_connection(&self) -> StoreResult<Connection> {
        let connection = Connection::open(&self.db_path)?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            "#,
        )?;
        Ok(connection)
    }

    fn initialize_schema(&self, connection: &Connection) -> StoreResult<()> {
        connection.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                platform TEXT NOT NULL,
                kind TEXT NOT NULL,
                target TEXT NOT NULL,
                repo TEXT NOT NULL,
                events TEXT NOT NULL,
                PRIMARY KEY (platform, kind, target, repo)
            );

            CREATE INDEX IF NOT EXISTS idx_subscriptions_repo ON subscriptions (repo);
            "#,
        )?;
        Ok(())
    }

    /// Inserts a subscription, or updates `events` when the key already exists.
    pub fn upsert(&self, subscription: &Subscription) -> StoreResult<UpsertOutcome> {
        let connection = self.open_connection()?;
        let exists = connection
            .query_row(
                r#"
                SELECT 1 FROM subscriptions
                WHERE platform = ?1 AND kind = ?2 AND target = ?3 AND repo = ?4
                "#,
                params![
                    subscription.platform,
                    target_kind_to_db(subscription.kind),
                    subscription.target,
                    subscription.repo
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        connection.execute(
            r#"
            INSERT INTO subscriptions (platform, kind, target, repo, events)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(platform, kind, target, repo)
                DO UPDATE SET events = excluded.events
            "#,
            params![
                subscription.platform,
                target_kind_to_db(subscription.kind),
                subscription.target,
                subscription.repo,
                subscription.events
            ],
        )?;

        Ok(if exists.is_some() {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Created
        })
    }

    /// Fetches every subscription for a repository full name.
    pub fn list_for_repo(&self, repo: &str) -> StoreResult<Vec<Subscription>> {
        self.query_subscriptions(
            r#"
            SELECT platform, kind, target, repo, events FROM subscriptions
            WHERE repo = ?1
            ORDER BY platform ASC, target ASC
            "#,
            params![repo],
        )
    }

    /// Fetches every subscription owned by one messaging target.
    pub fn list_for_target(&self, platform: &str, target: &str) -> StoreResult<Vec<Subscription>> {
        self.query_subscriptions(
            r#"
            SELECT platform, kind, target, repo, events FROM subscriptions
            WHERE platform = ?1 AND target = ?2
            ORDER BY repo ASC
            "#,
            params![platform, target],
        )
    }

    /// Fetches every stored subscription.
    pub fn list_all(&self) -> StoreResult<Vec<Subscription>> {
        self.query_subscriptions(
            r#"
            SELECT platform, kind, target, repo, events FROM subscriptions
            ORDER BY platform ASC, target ASC, repo ASC
            "#,
            params![],
        )
    }

    /// Deletes one target's subscription to a repository. Returns rows removed.
    pub fn remove(&self, platform: &str, target: &str, repo: &str) -> StoreResult<usize> {
        let connection = self.open_connection()?;
        let removed = connection.execute(
            "DELETE FROM subscriptions WHERE platform = ?1 AND target = ?2 AND repo = ?3",
            params![platform, target, repo],
        )?;
        Ok(removed)
    }

    /// Deletes every subscription owned by one target. Returns rows removed.
    pub fn remove_target(&self, platform: &str, target: &str) -> StoreResult<usize> {
        let connection = self.open_connection()?;
        let removed = connection.execute(
            "DELETE FROM subscriptions WHERE platform = ?1 AND target = ?2",
            params![platform, target],
        )?;
        Ok(removed)
    }

    fn query_subscriptions(
        &self,
        sql: &str,
        bind: impl rusqlite::Params,
    ) -> StoreResult<Vec<Subscription>> {
        let connection = self.open_connection()?;
        let mut statement = connection.prepare(sql)?;
        let mut rows = statement.query(bind)?;

        let mut subscriptions = Vec::new();
        while let Some(row) = rows.next()? {
            subscriptions.push(Subscription {
                platform: row.get(0)?,
                kind: target_kind_from_db(&row.get::<_, String>(1)?)?,
                target: row.get(2)?,
                repo: row.get(3)?,
                events: row.get(4)?,
            });
        }
        Ok(subscriptions)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSubscriptionStore;
    use crate::{Subscription, TargetKind, UpsertOutcome};
    use tempfile::tempdir;

    fn subscription(target: &str, repo: &str, events: &str) -> Subscription {
        Subscription {
            platform: "chat".to_string(),
            kind: TargetKind::Group,
            target: target.to_string(),
            repo: repo.to_string(),
            events: events.to_string(),
        }
    }

    #[test]
    fn duplicate_subscribe_updates_events_in_place() {
        let temp = tempdir().expect("create tempdir");
        let store =
            SqliteSubscriptionStore::new(temp.path().join("subs.sqlite")).expect("create store");

        let first = store
            .upsert(&subscription("g1", "acme/widgets", "all"))
            .expect("first upsert");
        assert_eq!(first, UpsertOutcome::Created);

        let second = store
            .upsert(&subscription("g1", "acme/widgets", "push,star"))
            .expect("second upsert");
        assert_eq!(second, UpsertOutcome::Updated);

        let rows = store.list_for_repo("acme/widgets").expect("list repo");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].events, "push,star");
    }

    #[test]
    fn persists_subscriptions_across_reopen() {
        let temp = tempdir().expect("create tempdir");
        let db_path = temp.path().join("subs.sqlite");

        {
            let store = SqliteSubscriptionStore::new(&db_path).expect("create store");
            store
                .upsert(&subscription("g1", "acme/widgets", "push"))
                .expect("upsert");
        }

        let reopened = SqliteSubscriptionStore::new(&db_path).expect("reopen store");
        let rows = reopened.list_all().expect("list all");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].repo, "acme/widgets");
        assert_eq!(rows[0].kind, TargetKind::Group);
    }

    #[test]
    fn remove_deletes_only_the_named_repo() {
        let temp = tempdir().expect("create tempdir");
        let store =
            SqliteSubscriptionStore::new(temp.path().join("subs.sqlite")).expect("create store");
        store
            .upsert(&subscription("g1", "acme/widgets", "all"))
            .expect("upsert widgets");
        store
            .upsert(&subscription("g1", "acme/gears", "all"))
            .expect("upsert gears");

        let removed = store.remove("chat", "g1", "acme/widgets").expect("remove");
        assert_eq!(removed, 1);

        let remaining = store.list_for_target("chat", "g1").expect("list target");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].repo, "acme/gears");

        let missing = store.remove("chat", "g1", "acme/widgets").expect("remove again");
        assert_eq!(missing, 0);
    }

    #[test]
    fn remove_target_clears_every_row_for_that_target() {
        let temp = tempdir().expect("create tempdir");
        let store =
            SqliteSubscriptionStore::new(temp.path().join("subs.sqlite")).expect("create store");
        store
            .upsert(&subscription("g1", "acme/widgets", "all"))
            .expect("upsert widgets");
        store
            .upsert(&subscription("g1", "acme/gears", "all"))
            .expect("upsert gears");
        store
            .upsert(&subscription("g2", "acme/widgets", "all"))
            .expect("upsert other target");

        let removed = store.remove_target("chat", "g1").expect("remove target");
        assert_eq!(removed, 2);

        let remaining = store.list_all().expect("list all");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].target, "g2");
    }
}
