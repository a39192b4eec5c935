// Domain Layer - Pure queue model, no I/O

pub mod announcement;
pub mod entry;
pub mod error;
pub mod status;

// Re-exports
pub use announcement::{spell_digits, AnnouncementScript, DEFAULT_SHOP_NAME};
pub use entry::{EntryId, NewEntry, QueueEntry, QueueList};
pub use error::DomainError;
pub use status::{normalize, Status};
