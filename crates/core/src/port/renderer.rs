// View Renderer Port

use crate::domain::QueueList;

/// Produces a visible rendition of the queue
///
/// Admin views additionally expose per-entry actions keyed by the entry's
/// current position.
pub trait ViewRenderer: Send + Sync {
    fn render(&self, list: &QueueList, is_admin: bool);
}

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every rendered list
    #[derive(Clone, Default)]
    pub struct RecordingRenderer {
        frames: Arc<Mutex<Vec<(QueueList, bool)>>>,
    }

    impl RecordingRenderer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn frames(&self) -> Vec<(QueueList, bool)> {
            self.frames.lock().unwrap().clone()
        }

        pub fn last(&self) -> Option<QueueList> {
            self.frames.lock().unwrap().last().map(|(list, _)| list.clone())
        }
    }

    impl ViewRenderer for RecordingRenderer {
        fn render(&self, list: &QueueList, is_admin: bool) {
            self.frames.lock().unwrap().push((list.clone(), is_admin));
        }
    }
}
