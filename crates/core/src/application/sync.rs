// Sync Listener - mirrors other views' writes into this view
//
// Idle -> Refreshing -> Idle on every relevant change notification written
// by a different view. The writer re-renders through its own controller, so
// same-origin notifications are ignored.

use crate::application::change_bus::{ChangeBus, ChangeCause};
use crate::application::view::ShutdownToken;
use crate::application::store::{is_queue_key, QueueStore};
use crate::error::Result;
use crate::port::{SlotChange, ViewId};
use std::sync::Arc;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{debug, info, warn};

/// Listener state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    /// Re-reading the store after a remote change (transient)
    Refreshing,
}

pub struct SyncListener {
    store: Arc<QueueStore>,
    bus: Arc<ChangeBus>,
    view_id: ViewId,
    changes: broadcast::Receiver<SlotChange>,
    state: SyncState,
    refreshes: u64,
}

impl SyncListener {
    /// Subscribes immediately so no change after construction is missed
    pub fn new(store: Arc<QueueStore>, bus: Arc<ChangeBus>) -> Self {
        let view_id = store.slot().view_id().clone();
        let changes = store.slot().subscribe();
        Self {
            store,
            bus,
            view_id,
            changes,
            state: SyncState::Idle,
            refreshes: 0,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Number of refreshes performed so far
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }

    /// True if this notification should trigger a refresh
    pub fn is_relevant(&self, change: &SlotChange) -> bool {
        is_queue_key(&change.key) && change.origin != self.view_id
    }

    /// Process one notification. Returns `true` if the view was refreshed.
    pub async fn handle(&mut self, change: &SlotChange) -> bool {
        if !self.is_relevant(change) {
            return false;
        }
        debug!(key = %change.key, origin = %change.origin, "Remote queue change");
        self.refresh().await;
        true
    }

    /// Drop notifications already queued. The refresh that follows reads
    /// the latest state, which covers all of them.
    fn drain_pending(&mut self) -> usize {
        let mut drained = 0;
        loop {
            match self.changes.try_recv() {
                Ok(_) => drained += 1,
                Err(TryRecvError::Lagged(skipped)) => drained += skipped as usize,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return drained,
            }
        }
    }

    async fn refresh(&mut self) {
        self.state = SyncState::Refreshing;
        let list = self.store.load().await;
        self.bus.publish(list, ChangeCause::Remote);
        self.refreshes += 1;
        self.state = SyncState::Idle;
    }

    /// Run until shutdown or until the change feed closes
    pub async fn run(mut self, mut shutdown: ShutdownToken) -> Result<()> {
        info!(view = %self.view_id, "Sync listener started");

        loop {
            if shutdown.is_shutdown() {
                break;
            }

            tokio::select! {
                received = self.changes.recv() => match received {
                    Ok(change) => {
                        self.handle(&change).await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        let pending = self.drain_pending();
                        warn!(skipped, pending, "Change feed lagged, refreshing once");
                        self.refresh().await;
                    }
                    Err(RecvError::Closed) => {
                        info!("Change feed closed");
                        break;
                    }
                },
                _ = shutdown.wait() => break,
            }
        }

        info!(view = %self.view_id, refreshes = self.refreshes, "Sync listener stopped");
        Ok(())
    }
}
