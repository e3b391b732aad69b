//! emutil library
//!
//! Command-line plumbing around the `emu-bps` and `emu-sms` crates: the
//! operation registry, parameter validation and terminal output.

pub mod cli;
pub mod commands;
pub mod diagnostics;
pub mod operation;
pub mod utils;
