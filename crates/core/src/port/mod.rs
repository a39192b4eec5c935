// Port Layer - Interfaces for external dependencies

pub mod announcer;
pub mod confirmation;
pub mod durable_slot;
pub mod id_provider; // For deterministic testing
pub mod renderer;
pub mod time_provider;

// Re-exports
pub use announcer::{Announcer, AudibleSignal, SilentSignal};
pub use confirmation::{ConfirmationPrompt, FixedAnswer};
pub use durable_slot::{DurableSlot, SlotChange, ViewId};
pub use id_provider::IdProvider;
pub use renderer::ViewRenderer;
pub use time_provider::TimeProvider;
