//! BPS patch support
//!
//! This crate decodes BPS binary patches and applies them to a source ROM to
//! reconstruct the patched image. BPS is the format most ROM translations and
//! hacks are distributed in.
//!
//! # Patch File Format
//!
//! ```text
//! "BPS1"
//! varint  source size
//! varint  target size
//! varint  metadata size
//! bytes   metadata (not interpreted)
//! ...     action stream
//! u32 LE  checksum trailer
//! ```
//!
//! Each action starts with a varint word: the low two bits select the action
//! kind and `(word >> 2) + 1` is its length.
//!
//! # Actions
//!
//! - **SourceRead** - copy from the source at the current output position
//! - **TargetRead** - copy literal bytes embedded in the patch
//! - **SourceCopy** - copy from a relative position in the source
//! - **TargetCopy** - copy from already written output (may overlap)
//!
//! # Trailer Layouts
//!
//! By default the trailer is a single CRC-32 of the patched image
//! ([`TrailerLayout::TargetOnly`]). Patches carrying the conventional
//! source/target/patch CRC triple are read with [`TrailerLayout::Full`].
//!
//! # Example
//!
//! ```rust,no_run
//! use emu_bps::{ApplyOptions, PatchFile, TrailerLayout, apply_patch};
//! use emu_utils::LogDiagnostics;
//!
//! let source = std::fs::read("game.sms")?;
//! let patch_data = std::fs::read("translation.bps")?;
//!
//! let patch = PatchFile::parse(&patch_data, TrailerLayout::Full)?;
//! let patched = apply_patch(&patch, &source, &ApplyOptions::default(), &mut LogDiagnostics)?;
//! std::fs::write("game-translated.sms", patched)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod action;
pub mod apply;
pub mod checksum;
pub mod error;
pub mod header;
pub mod varint;

pub use action::{ActionKind, ActionStats, ActionSummary, PatchAction, PatchActions};
pub use apply::{ApplyOptions, apply_patch};
pub use checksum::{ChecksumKind, ChecksumPolicy};
pub use error::{BpsError, Result};
pub use header::{BPS_MAGIC, PatchFile, PatchHeader, PatchTrailer, TrailerLayout};
