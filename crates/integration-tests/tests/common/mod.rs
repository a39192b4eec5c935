//! Shared fixtures: two views on one SQLite file, like two terminals

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use antrean_core::application::{
    ChangeSubscription, Collaborators, QueueSnapshot, QueueStore, QueueView,
};
use antrean_core::port::announcer::mocks::RecordingAnnouncer;
use antrean_core::port::id_provider::UuidProvider;
use antrean_core::port::time_provider::SystemTimeProvider;
use antrean_core::port::{FixedAnswer, SilentSignal, ViewId};
use antrean_infra_sqlite::{create_pool, run_migrations, SqliteSlot};
use sqlx::SqlitePool;

pub const POLL: Duration = Duration::from_millis(20);
pub const WAIT: Duration = Duration::from_secs(3);

/// Database file removed (with its WAL companions) on drop
pub struct TempDb {
    pub path: PathBuf,
}

impl TempDb {
    pub fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!("antrean-{}-{}.db", name, uuid::Uuid::new_v4()));
        Self { path }
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// A separate pool per view, as separate processes would have
    pub async fn pool(&self) -> SqlitePool {
        let pool = create_pool(&self.url()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.url(), suffix));
        }
    }
}

pub async fn slot(pool: &SqlitePool, view: &str) -> Arc<SqliteSlot> {
    Arc::new(
        SqliteSlot::open(
            pool.clone(),
            ViewId::new(view),
            Arc::new(SystemTimeProvider),
            POLL,
        )
        .await
        .unwrap(),
    )
}

pub fn store(slot: Arc<SqliteSlot>) -> QueueStore {
    QueueStore::new(slot, Arc::new(UuidProvider), Arc::new(SystemTimeProvider))
}

pub async fn view(pool: &SqlitePool, name: &str, confirm: bool) -> QueueView {
    QueueView::open(
        slot(pool, name).await,
        Arc::new(UuidProvider),
        Arc::new(SystemTimeProvider),
        Collaborators {
            confirmation: Arc::new(FixedAnswer(confirm)),
            announcer: Arc::new(RecordingAnnouncer::new()),
            signal: Arc::new(SilentSignal),
        },
        "kaibete motor",
    )
    .await
}

/// Next snapshot satisfying `accept`, skipping intermediate refreshes
pub async fn wait_for(
    subscription: &mut ChangeSubscription,
    accept: impl Fn(&QueueSnapshot) -> bool,
) -> QueueSnapshot {
    tokio::time::timeout(WAIT, async {
        loop {
            let snapshot = subscription.next().await.expect("change bus alive");
            if accept(&snapshot) {
                return snapshot;
            }
        }
    })
    .await
    .expect("expected snapshot within timeout")
}
