// Antrean Core - Queue state machine, sync protocol & ports
// NO infrastructure dependencies: storage, speech and rendering are ports

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
