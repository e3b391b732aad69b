//! Diagnostics receiver used by the command line

use std::error::Error;

use emu_utils::{Diagnostics, FileRole};

/// Forwards reports to the log and keeps a tally for the final summary
///
/// The libraries already log source errors at `warn`, so nothing is printed
/// here directly.
#[derive(Debug, Default)]
pub struct ConsoleDiagnostics {
    source_errors: usize,
    failed: bool,
}

impl ConsoleDiagnostics {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of source errors seen so far
    pub fn source_errors(&self) -> usize {
        self.source_errors
    }

    /// Whether a fatal error was reported
    pub fn failed(&self) -> bool {
        self.failed
    }
}

impl Diagnostics for ConsoleDiagnostics {
    fn on_debug_message(&mut self, message: &str) {
        log::debug!("{message}");
    }

    fn on_source_error(&mut self, file: FileRole, offset: u64, message: &str) {
        self.source_errors += 1;
        log::debug!("source error in {} at 0x{offset:X}: {message}", file.key());
    }

    // The error itself is returned to and printed by the caller
    fn on_fatal_error(&mut self, error: &dyn Error) {
        self.failed = true;
        log::debug!("operation aborted: {error}");
    }
}
