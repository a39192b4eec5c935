// Durable Slot Port
//
// Shared string-keyed storage visible to every view, plus a broadcast of
// changes. This is the only coordination medium between views.

use crate::error::Result;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Capacity of change notification channels
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Identity of one running view (one process or one in-process instance)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ViewId(String);

impl ViewId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ViewId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Notification that a key's value changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotChange {
    pub key: String,
    /// View that performed the write
    pub origin: ViewId,
}

/// Durable key-value slot, opened on behalf of one view
///
/// Writes are attributed to `view_id()`. Implementations notify subscribers
/// only when a key's stored value actually changes.
#[async_trait]
pub trait DurableSlot: Send + Sync {
    /// View this handle writes as
    fn view_id(&self) -> &ViewId;

    /// Read a key. `None` if never written.
    async fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write a key, last writer wins
    async fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Subscribe to changes written by any view, including this one
    fn subscribe(&self) -> broadcast::Receiver<SlotChange>;
}

// ============================================================================
// In-process medium shared by several views
// ============================================================================

pub mod memory {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    struct Shared {
        values: Mutex<HashMap<String, String>>,
        changes: broadcast::Sender<SlotChange>,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
    }

    /// In-memory storage medium. Clone to share; open one slot per view.
    #[derive(Clone)]
    pub struct MemoryMedium {
        shared: Arc<Shared>,
    }

    impl Default for MemoryMedium {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MemoryMedium {
        pub fn new() -> Self {
            let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
            Self {
                shared: Arc::new(Shared {
                    values: Mutex::new(HashMap::new()),
                    changes,
                    fail_writes: AtomicBool::new(false),
                    fail_reads: AtomicBool::new(false),
                }),
            }
        }

        /// Open a handle writing as `view_id`
        pub fn open_view(&self, view_id: impl Into<String>) -> MemorySlot {
            MemorySlot {
                view_id: ViewId::new(view_id),
                medium: self.clone(),
            }
        }

        /// Peek at a stored value without going through a view
        pub fn get(&self, key: &str) -> Option<String> {
            self.shared.values.lock().unwrap().get(key).cloned()
        }

        /// Make every subsequent write fail (for error-path tests)
        pub fn set_fail_writes(&self, fail: bool) {
            self.shared.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Make every subsequent slot read fail, like a busy database
        pub fn set_fail_reads(&self, fail: bool) {
            self.shared.fail_reads.store(fail, Ordering::SeqCst);
        }

        fn fetch(&self, key: &str) -> Result<Option<String>> {
            if self.shared.fail_reads.load(Ordering::SeqCst) {
                return Err(AppError::Storage(format!("read of '{key}' rejected")));
            }
            Ok(self.get(key))
        }

        fn store(&self, origin: &ViewId, key: &str, value: &str) -> Result<()> {
            if self.shared.fail_writes.load(Ordering::SeqCst) {
                return Err(AppError::Storage(format!("write to '{key}' rejected")));
            }

            let changed = {
                let mut values = self.shared.values.lock().unwrap();
                match values.get(key) {
                    Some(current) if current == value => false,
                    _ => {
                        values.insert(key.to_string(), value.to_string());
                        true
                    }
                }
            };

            if changed {
                // No receivers is fine: nobody is listening yet
                let _ = self.shared.changes.send(SlotChange {
                    key: key.to_string(),
                    origin: origin.clone(),
                });
            }
            Ok(())
        }
    }

    /// One view's handle onto a `MemoryMedium`
    #[derive(Clone)]
    pub struct MemorySlot {
        view_id: ViewId,
        medium: MemoryMedium,
    }

    #[async_trait]
    impl DurableSlot for MemorySlot {
        fn view_id(&self) -> &ViewId {
            &self.view_id
        }

        async fn read(&self, key: &str) -> Result<Option<String>> {
            self.medium.fetch(key)
        }

        async fn write(&self, key: &str, value: &str) -> Result<()> {
            self.medium.store(&self.view_id, key, value)
        }

        fn subscribe(&self) -> broadcast::Receiver<SlotChange> {
            self.medium.shared.changes.subscribe()
        }
    }

}
