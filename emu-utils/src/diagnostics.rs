//! Progress and diagnostics reporting
//!
//! Operations run synchronously on the caller's thread and call back into a
//! [`Diagnostics`] implementation as they go. Implementations must not block.

use std::error::Error;

use crate::FileRole;

/// Receiver for progress and error reports
pub trait Diagnostics {
    /// Informational trace line
    fn on_debug_message(&mut self, message: &str);

    /// Recoverable problem tied to a byte offset in one of the inputs.
    /// The operation carries on after reporting it.
    fn on_source_error(&mut self, file: FileRole, offset: u64, message: &str);

    /// Unrecoverable failure. The operation stops after reporting it.
    fn on_fatal_error(&mut self, error: &dyn Error);
}

impl<D: Diagnostics + ?Sized> Diagnostics for &mut D {
    fn on_debug_message(&mut self, message: &str) {
        (**self).on_debug_message(message);
    }

    fn on_source_error(&mut self, file: FileRole, offset: u64, message: &str) {
        (**self).on_source_error(file, offset, message);
    }

    fn on_fatal_error(&mut self, error: &dyn Error) {
        (**self).on_fatal_error(error);
    }
}

/// Forwards every report to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn on_debug_message(&mut self, message: &str) {
        log::debug!("{message}");
    }

    fn on_source_error(&mut self, file: FileRole, offset: u64, message: &str) {
        log::warn!("{file} @ 0x{offset:X}: {message}");
    }

    fn on_fatal_error(&mut self, error: &dyn Error) {
        log::error!("{error}");
    }
}

/// Discards every report
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn on_debug_message(&mut self, _message: &str) {}

    fn on_source_error(&mut self, _file: FileRole, _offset: u64, _message: &str) {}

    fn on_fatal_error(&mut self, _error: &dyn Error) {}
}

/// A single captured report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// See [`Diagnostics::on_debug_message`]
    Debug(String),
    /// See [`Diagnostics::on_source_error`]
    SourceError {
        /// File the problem was found in
        file: FileRole,
        /// Byte offset into that file
        offset: u64,
        /// Description of the problem
        message: String,
    },
    /// See [`Diagnostics::on_fatal_error`]; holds the error's display text
    Fatal(String),
}

/// Keeps every report in order of arrival
#[derive(Debug, Default, Clone)]
pub struct RecordingDiagnostics {
    events: Vec<DiagnosticEvent>,
}

impl RecordingDiagnostics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All captured events
    pub fn events(&self) -> &[DiagnosticEvent] {
        &self.events
    }

    /// Captured debug lines
    pub fn debug_messages(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|event| match event {
            DiagnosticEvent::Debug(message) => Some(message.as_str()),
            _ => None,
        })
    }

    /// Number of source errors reported
    pub fn source_error_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, DiagnosticEvent::SourceError { .. }))
            .count()
    }

    /// Number of fatal errors reported
    pub fn fatal_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, DiagnosticEvent::Fatal(_)))
            .count()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn on_debug_message(&mut self, message: &str) {
        self.events.push(DiagnosticEvent::Debug(message.to_string()));
    }

    fn on_source_error(&mut self, file: FileRole, offset: u64, message: &str) {
        self.events.push(DiagnosticEvent::SourceError {
            file,
            offset,
            message: message.to_string(),
        });
    }

    fn on_fatal_error(&mut self, error: &dyn Error) {
        self.events.push(DiagnosticEvent::Fatal(error.to_string()));
    }
}
