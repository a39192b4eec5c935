// Queue View - wires store, bus, controller and sync listener for one view
//
// The view also owns the stop signal of its background loops: closing the
// view stops the sync listener and any render loop it spawned.

use crate::application::change_bus::{render_loop, ChangeBus, ChangeCause, ChangeSubscription};
use crate::application::controller::{Collaborators, QueueController};
use crate::application::store::QueueStore;
use crate::application::sync::SyncListener;
use crate::error::Result;
use crate::port::{DurableSlot, IdProvider, TimeProvider, ViewId, ViewRenderer};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Observes a view being closed
#[derive(Clone)]
pub struct ShutdownToken {
    closed: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// A close signal paired with its first token
    pub(crate) fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, closed) = watch::channel(false);
        (tx, Self { closed })
    }

    pub fn is_shutdown(&self) -> bool {
        *self.closed.borrow()
    }

    /// Resolves once the view is closed (immediately if it already is)
    pub async fn wait(&mut self) {
        let _ = self.closed.wait_for(|closed| *closed).await;
    }
}

/// One running view (admin or public display)
pub struct QueueView {
    view_id: ViewId,
    controller: Arc<QueueController>,
    bus: Arc<ChangeBus>,
    listener: Option<SyncListener>,
    close: watch::Sender<bool>,
}

impl QueueView {
    /// Open a view on `slot` and publish the initial snapshot
    ///
    /// The sync listener subscribes before the initial load so a write
    /// landing in between is not lost.
    pub async fn open(
        slot: Arc<dyn DurableSlot>,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
        collaborators: Collaborators,
        shop_name: impl Into<String>,
    ) -> Self {
        let view_id = slot.view_id().clone();
        let store = Arc::new(QueueStore::new(slot, id_provider.clone(), time_provider));
        let bus = Arc::new(ChangeBus::new());
        let listener = SyncListener::new(store.clone(), bus.clone());

        let initial = store.load().await;
        info!(view = %view_id, entries = initial.len(), "View opened");
        bus.publish(initial, ChangeCause::Initial);

        let controller = Arc::new(QueueController::new(
            store,
            bus.clone(),
            id_provider,
            collaborators,
            shop_name,
        ));
        let (close, _) = ShutdownToken::channel();

        Self {
            view_id,
            controller,
            bus,
            listener: Some(listener),
            close,
        }
    }

    pub fn view_id(&self) -> &ViewId {
        &self.view_id
    }

    pub fn controller(&self) -> Arc<QueueController> {
        self.controller.clone()
    }

    pub fn bus(&self) -> Arc<ChangeBus> {
        self.bus.clone()
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        self.bus.subscribe()
    }

    /// Token that resolves when this view is closed
    pub fn shutdown_token(&self) -> ShutdownToken {
        ShutdownToken {
            closed: self.close.subscribe(),
        }
    }

    /// Start following other views' writes. `None` if already started.
    pub fn spawn_sync(&mut self) -> Option<JoinHandle<Result<()>>> {
        let listener = self.listener.take()?;
        Some(tokio::spawn(listener.run(self.shutdown_token())))
    }

    /// Render every snapshot of this view until it is closed
    pub fn spawn_render(&self, renderer: Arc<dyn ViewRenderer>, is_admin: bool) -> JoinHandle<()> {
        tokio::spawn(render_loop(
            self.subscribe(),
            renderer,
            is_admin,
            self.shutdown_token(),
        ))
    }

    /// Stop the background loops started from this view
    pub fn close(&self) {
        self.close.send_replace(true);
        info!(view = %self.view_id, "View closed");
    }
}
