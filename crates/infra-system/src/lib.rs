// Antrean Infrastructure - System Adapters
// Implements: Announcer (speech engine subprocess), AudibleSignal (terminal bell)

pub mod speech_announcer;
pub mod terminal_bell;

pub use speech_announcer::{SpeechAnnouncer, SpeechConfig, DEFAULT_SPEECH_PROGRAM};
pub use terminal_bell::TerminalBell;
