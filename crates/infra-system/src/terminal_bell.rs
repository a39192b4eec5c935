// Terminal bell: audible signal on status changes
use std::io::Write;
use tracing::debug;

use antrean_core::port::AudibleSignal;

/// ASCII BEL
const BEL: &[u8] = b"\x07";

/// Rings the terminal bell on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalBell;

impl AudibleSignal for TerminalBell {
    fn beep(&self) {
        let mut stderr = std::io::stderr().lock();
        // A missing or closed terminal just means no sound
        if let Err(e) = stderr.write_all(BEL).and_then(|_| stderr.flush()) {
            debug!(error = %e, "Bell unavailable");
        }
    }
}
