// Announcement & Audible Signal Ports

use crate::domain::AnnouncementScript;
use crate::error::Result;
use async_trait::async_trait;

/// Speaks an announcement. Fire and forget: no completion is reported.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, script: &AnnouncementScript) -> Result<()>;
}

/// Short audible confirmation after a status change
pub trait AudibleSignal: Send + Sync {
    fn beep(&self);
}

/// Signal that does nothing (display-only views, tests)
pub struct SilentSignal;

impl AudibleSignal for SilentSignal {
    fn beep(&self) {}
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Records spoken sentences
    #[derive(Clone, Default)]
    pub struct RecordingAnnouncer {
        spoken: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingAnnouncer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn spoken(&self) -> Vec<String> {
            self.spoken.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Announcer for RecordingAnnouncer {
        async fn announce(&self, script: &AnnouncementScript) -> Result<()> {
            self.spoken.lock().unwrap().push(script.sentence.clone());
            Ok(())
        }
    }

    /// Counts beeps
    #[derive(Clone, Default)]
    pub struct CountingSignal {
        count: Arc<AtomicUsize>,
    }

    impl CountingSignal {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl AudibleSignal for CountingSignal {
        fn beep(&self) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }
}
