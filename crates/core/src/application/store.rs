// Queue Store - sole owner of the persisted queue
//
// Whole-list read-modify-write: every save rewrites `queueList`, then bumps
// the companion `queueList:lastUpdate` stamp so a change notification fires
// even when the serialized list is byte-identical to what was stored.

use crate::domain::{EntryId, QueueList};
use crate::error::{AppError, Result};
use crate::port::{DurableSlot, IdProvider, TimeProvider};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Slot key holding the serialized queue
pub const QUEUE_KEY: &str = "queueList";

/// Companion key holding the last save time (epoch ms, decimal)
pub const LAST_UPDATE_KEY: &str = "queueList:lastUpdate";

/// True for keys whose change means the queue may have changed
pub fn is_queue_key(key: &str) -> bool {
    key == QUEUE_KEY || key == LAST_UPDATE_KEY
}

pub struct QueueStore {
    slot: Arc<dyn DurableSlot>,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
    last_stamp: AtomicI64,
}

impl QueueStore {
    pub fn new(
        slot: Arc<dyn DurableSlot>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            slot,
            id_provider,
            time_provider,
            last_stamp: AtomicI64::new(0),
        }
    }

    pub fn slot(&self) -> &Arc<dyn DurableSlot> {
        &self.slot
    }

    /// Read the queue. Never fails: unreadable or corrupted data yields an
    /// empty queue and a warning.
    pub async fn load(&self) -> QueueList {
        match self.try_load().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, key = QUEUE_KEY, "Queue data unreadable, using empty queue");
                QueueList::new()
            }
        }
    }

    /// Read the queue ahead of a read-modify-write
    ///
    /// Corrupted data counts as an empty queue, as in `load`, since the
    /// caller is about to overwrite it. A failed read is an error: saving
    /// on top of it would replace the stored queue.
    pub async fn load_for_update(&self) -> Result<QueueList> {
        match self.try_load().await {
            Err(AppError::Corruption(e)) => {
                warn!(error = %e, key = QUEUE_KEY, "Queue data unreadable, starting from empty queue");
                Ok(QueueList::new())
            }
            other => other,
        }
    }

    /// Read the queue, surfacing corruption as `AppError::Corruption`
    pub async fn try_load(&self) -> Result<QueueList> {
        let Some(raw) = self.slot.read(QUEUE_KEY).await? else {
            return Ok(QueueList::new());
        };

        // A stored JSON null counts as an empty queue
        let parsed: Option<QueueList> =
            serde_json::from_str(&raw).map_err(|e| AppError::Corruption(e.to_string()))?;

        let mut list = parsed.unwrap_or_default();
        self.repair(&mut list);
        Ok(list)
    }

    /// Persist the full queue, then bump the companion stamp
    pub async fn save(&self, list: &QueueList) -> Result<()> {
        let json = serde_json::to_string(list)?;
        self.slot.write(QUEUE_KEY, &json).await?;

        let stamp = self.next_stamp().await;
        self.slot.write(LAST_UPDATE_KEY, &stamp.to_string()).await?;

        debug!(entries = list.len(), stamp, view = %self.slot.view_id(), "Queue saved");
        Ok(())
    }

    fn repair(&self, list: &mut QueueList) {
        let before = list.len();
        list.retain(|e| e.is_complete());
        let dropped = before - list.len();
        if dropped > 0 {
            warn!(dropped, "Skipped stored queue entries with blank fields");
        }

        // Records written before ids existed get one now; it sticks on next save
        for entry in list.iter_mut().filter(|e| e.id.is_unassigned()) {
            entry.id = EntryId::new(self.id_provider.generate_id());
        }
    }

    /// Strictly increasing stamp, also past whatever another view stored
    async fn next_stamp(&self) -> i64 {
        let stored = match self.slot.read(LAST_UPDATE_KEY).await {
            Ok(value) => value.and_then(|s| s.trim().parse::<i64>().ok()).unwrap_or(0),
            Err(e) => {
                debug!(error = %e, "Could not read last update stamp");
                0
            }
        };
        let now = self.time_provider.now_millis();

        let mut last = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1).max(stored + 1);
            match self
                .last_stamp
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}
