//! Shared plumbing for the emutil ROM tools.
//!
//! Every operation (patch application, header inspection) reports what it is
//! doing through a [`Diagnostics`] implementation supplied by the caller. The
//! [`FileRole`] enum names the files an operation reads or writes so that
//! recoverable problems can be tied back to a specific input.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod diagnostics;
pub mod file_role;

pub use diagnostics::{
    DiagnosticEvent, Diagnostics, LogDiagnostics, NullDiagnostics, RecordingDiagnostics,
};
pub use file_role::FileRole;
