// Application Layer - Queue store, intents and cross-view sync

pub mod change_bus;
pub mod controller;
pub mod store;
pub mod sync;
pub mod view;

// Re-exports
pub use change_bus::{render_loop, ChangeBus, ChangeCause, ChangeSubscription, QueueSnapshot};
pub use controller::{Collaborators, Mutation, QueueController};
pub use store::{QueueStore, LAST_UPDATE_KEY, QUEUE_KEY};
pub use sync::{SyncListener, SyncState};
pub use view::{QueueView, ShutdownToken};
