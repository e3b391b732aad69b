//! Sega Master System / Game Gear ROM inspection
//!
//! Locates the 16-byte header block inside a ROM image, reads the declared
//! checksum and size code, and recomputes the checksum the way the console
//! BIOS does: a wrapping 16-bit sum of every byte up to the declared size,
//! skipping the header block itself.
//!
//! # Header Location
//!
//! The header offset is chosen from the image length alone:
//!
//! | Image size | Header offset |
//! |------------|---------------|
//! | 8 KiB      | `0x1FF0`      |
//! | 16 KiB     | `0x3FF0`      |
//! | otherwise  | `0x7FF0`      |
//!
//! This is a heuristic that holds for the vast majority of dumps, not a
//! guarantee; mapper and region metadata are not consulted.
//!
//! # Example
//!
//! ```rust,no_run
//! use emu_sms::{RomImage, inspect};
//! use emu_utils::LogDiagnostics;
//!
//! let image = RomImage::open("sonic.gg")?;
//! let report = inspect(&image, &mut LogDiagnostics)?;
//!
//! println!("checksum ok: {}", report.header.has_checksum_match());
//! for error in report.header.validation_errors() {
//!     println!("{}: {}", error.code(), error.user_message());
//! }
//! # Ok::<(), emu_sms::SmsError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod checksum;
pub mod digest;
pub mod error;
pub mod header;
pub mod inspector;
pub mod size;

pub use checksum::compute_checksum;
pub use digest::RomDigests;
pub use error::{Result, SmsError};
pub use header::{HEADER_SIZE, Region, RomHeaderRecord, header_offset};
pub use inspector::{RomImage, RomKind, RomReport, ValidationError, inspect};
pub use size::{MAX_ROM_SIZE, check_rom_size, standard_rom_size};
