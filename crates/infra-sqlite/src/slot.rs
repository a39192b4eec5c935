// SQLite DurableSlot Implementation
//
// Several processes may open the same database file, one slot handle per
// view. Writes bump a global version; a polling task per handle turns rows
// with a version above the last one seen into change notifications.

use antrean_core::error::{AppError, Result};
use antrean_core::port::durable_slot::CHANGE_CHANNEL_CAPACITY;
use antrean_core::port::{DurableSlot, SlotChange, TimeProvider, ViewId};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Default change feed polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

// Helper to convert sqlx::Error to AppError with structured information
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLite error codes: https://www.sqlite.org/rescode.html
            Some(code) => match code.as_ref() {
                "5" => AppError::Storage(format!(
                    "Database locked (SQLITE_BUSY): {}",
                    db_err.message()
                )),
                "13" => AppError::Storage(format!("Database full: {}", db_err.message())),
                other => AppError::Storage(format!(
                    "Database error [{}]: {}",
                    other,
                    db_err.message()
                )),
            },
            None => AppError::Storage(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::RowNotFound => AppError::Storage("Row not found".to_string()),
        sqlx::Error::ColumnNotFound(col) => AppError::Storage(format!("Column not found: {}", col)),
        // Connection, pool, protocol errors
        _ => AppError::Storage(err.to_string()),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ChangeRow {
    key: String,
    origin: String,
    version: i64,
}

pub struct SqliteSlot {
    pool: SqlitePool,
    view_id: ViewId,
    time_provider: Arc<dyn TimeProvider>,
    changes: broadcast::Sender<SlotChange>,
    poller: JoinHandle<()>,
}

impl SqliteSlot {
    /// Open a slot handle for `view_id` and start its change feed
    ///
    /// Only writes made after opening are reported.
    pub async fn open(
        pool: SqlitePool,
        view_id: ViewId,
        time_provider: Arc<dyn TimeProvider>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let start_version = current_version(&pool).await?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);

        let poller = tokio::spawn(poll_changes(
            pool.clone(),
            changes.clone(),
            start_version,
            poll_interval,
        ));

        info!(view = %view_id, start_version, ?poll_interval, "SQLite slot opened");

        Ok(Self {
            pool,
            view_id,
            time_provider,
            changes,
            poller,
        })
    }
}

impl Drop for SqliteSlot {
    fn drop(&mut self) {
        self.poller.abort();
    }
}

#[async_trait]
impl DurableSlot for SqliteSlot {
    fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    async fn read(&self, key: &str) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM slot_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        // Identical values leave the row (and its version) untouched
        let result = sqlx::query(
            r#"
            INSERT INTO slot_entries (key, value, origin, version, updated_at)
            VALUES (?, ?, ?, (SELECT COALESCE(MAX(version), 0) + 1 FROM slot_entries), ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                origin = excluded.origin,
                version = excluded.version,
                updated_at = excluded.updated_at
            WHERE slot_entries.value <> excluded.value
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(self.view_id.as_str())
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(key, changed = result.rows_affected() > 0, "Slot write");
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<SlotChange> {
        self.changes.subscribe()
    }
}

async fn current_version(pool: &SqlitePool) -> Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COALESCE(MAX(version), 0) FROM slot_entries")
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)
}

async fn poll_changes(
    pool: SqlitePool,
    changes: broadcast::Sender<SlotChange>,
    mut last_version: i64,
    poll_interval: Duration,
) {
    let mut tick = tokio::time::interval(poll_interval);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tick.tick().await;

        let rows: Vec<ChangeRow> = match sqlx::query_as(
            "SELECT key, origin, version FROM slot_entries WHERE version > ? ORDER BY version ASC",
        )
        .bind(last_version)
        .fetch_all(&pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %map_sqlx_error(e), "Change feed poll failed");
                continue;
            }
        };

        for row in rows {
            last_version = row.version;
            // No receivers is fine: nobody is listening yet
            let _ = changes.send(SlotChange {
                key: row.key,
                origin: ViewId::new(row.origin),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use antrean_core::port::time_provider::SystemTimeProvider;

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    async fn open(pool: &SqlitePool, view: &str) -> SqliteSlot {
        SqliteSlot::open(
            pool.clone(),
            ViewId::new(view),
            Arc::new(SystemTimeProvider),
            Duration::from_millis(10),
        )
        .await
        .unwrap()
    }

    async fn version_of(pool: &SqlitePool, key: &str) -> i64 {
        sqlx::query_scalar("SELECT version FROM slot_entries WHERE key = ?")
            .bind(key)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_read_write() {
        let pool = setup_test_db().await;
        let slot = open(&pool, "admin").await;

        assert_eq!(slot.read("queueList").await.unwrap(), None);
        slot.write("queueList", "[]").await.unwrap();
        assert_eq!(slot.read("queueList").await.unwrap().as_deref(), Some("[]"));
        slot.write("queueList", "[1]").await.unwrap();
        assert_eq!(slot.read("queueList").await.unwrap().as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_identical_write_keeps_version() {
        let pool = setup_test_db().await;
        let slot = open(&pool, "admin").await;

        slot.write("a", "1").await.unwrap();
        slot.write("b", "1").await.unwrap();
        let before = version_of(&pool, "a").await;

        slot.write("a", "1").await.unwrap();
        assert_eq!(version_of(&pool, "a").await, before);

        slot.write("a", "2").await.unwrap();
        assert_eq!(version_of(&pool, "a").await, version_of(&pool, "b").await + 1);
    }

    #[tokio::test]
    async fn test_change_feed_reports_other_views_writes() {
        let pool = setup_test_db().await;
        let admin = open(&pool, "admin").await;
        let display = open(&pool, "display").await;
        let mut rx = display.subscribe();

        admin.write("queueList", "[]").await.unwrap();

        let change = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("change within timeout")
            .unwrap();
        assert_eq!(change.key, "queueList");
        assert_eq!(change.origin, ViewId::new("admin"));
    }

    #[tokio::test]
    async fn test_change_feed_skips_history() {
        let pool = setup_test_db().await;
        let admin = open(&pool, "admin").await;
        admin.write("old", "1").await.unwrap();

        let late = open(&pool, "late").await;
        let mut rx = late.subscribe();
        admin.write("new", "1").await.unwrap();

        let change = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("change within timeout")
            .unwrap();
        assert_eq!(change.key, "new");
    }
}
