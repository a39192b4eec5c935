// Change Bus - one "list changed" stream per view
//
// Local mutations and remote refreshes both publish here; renderers only
// ever subscribe, they never read the store themselves.

use crate::application::view::ShutdownToken;
use crate::domain::QueueList;
use crate::port::ViewRenderer;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Why a snapshot was published
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    /// First load when the view opened
    Initial,
    /// This view mutated the queue
    Local,
    /// Another view's write was picked up
    Remote,
}

/// Read-only queue snapshot
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub list: Arc<QueueList>,
    pub cause: ChangeCause,
    /// Increments on every publish
    pub revision: u64,
}

pub struct ChangeBus {
    tx: watch::Sender<QueueSnapshot>,
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeBus {
    /// Bus starting with an empty queue at revision 0
    pub fn new() -> Self {
        let (tx, _) = watch::channel(QueueSnapshot {
            list: Arc::new(QueueList::new()),
            cause: ChangeCause::Initial,
            revision: 0,
        });
        Self { tx }
    }

    /// Replace the current snapshot and wake every subscriber
    pub fn publish(&self, list: QueueList, cause: ChangeCause) {
        let list = Arc::new(list);
        self.tx.send_modify(|snapshot| {
            snapshot.revision += 1;
            snapshot.list = list;
            snapshot.cause = cause;
        });
        debug!(?cause, "Queue snapshot published");
    }

    pub fn current(&self) -> QueueSnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

/// Latest-value subscription: intermediate snapshots may be skipped
pub struct ChangeSubscription {
    rx: watch::Receiver<QueueSnapshot>,
}

impl ChangeSubscription {
    /// Wait for a snapshot newer than the last one seen. `None` once the bus is gone.
    pub async fn next(&mut self) -> Option<QueueSnapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    pub fn latest(&self) -> QueueSnapshot {
        self.rx.borrow().clone()
    }
}

/// Render the current snapshot, then every new one until shutdown
pub async fn render_loop(
    mut subscription: ChangeSubscription,
    renderer: Arc<dyn ViewRenderer>,
    is_admin: bool,
    mut shutdown: ShutdownToken,
) {
    renderer.render(&subscription.latest().list, is_admin);
    loop {
        if shutdown.is_shutdown() {
            break;
        }
        tokio::select! {
            next = subscription.next() => match next {
                Some(snapshot) => renderer.render(&snapshot.list, is_admin),
                None => break,
            },
            _ = shutdown.wait() => break,
        }
    }
}
