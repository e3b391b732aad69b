//! Master System / Game Gear ROM command implementations

use anyhow::Result;
use clap::Subcommand;
use std::path::{Path, PathBuf};

use emu_sms::{RomKind, RomReport};
use emu_utils::FileRole;

use crate::diagnostics::ConsoleDiagnostics;
use crate::operation::{OperationKind, OperationParams, Outcome};
use crate::utils::{ReportTable, format_bytes, format_checksum};

#[derive(Subcommand)]
pub enum SmsCommands {
    /// Display header, checksum and digests of a ROM image
    Info {
        /// Path to the ROM image
        rom: PathBuf,

        /// Treat the image as a Game Gear ROM regardless of its extension
        #[arg(long)]
        game_gear: bool,

        /// Print the report as JSON
        #[cfg(feature = "serde")]
        #[arg(long)]
        json: bool,
    },

    /// Validate a ROM image, failing if problems are found
    Validate {
        /// Path to the ROM image
        rom: PathBuf,

        /// Treat the image as a Game Gear ROM regardless of its extension
        #[arg(long)]
        game_gear: bool,
    },
}

pub fn execute(command: SmsCommands, quiet: bool) -> Result<()> {
    match command {
        #[cfg(feature = "serde")]
        SmsCommands::Info {
            rom,
            game_gear,
            json,
        } => execute_info(rom, game_gear, json),
        #[cfg(not(feature = "serde"))]
        SmsCommands::Info { rom, game_gear } => execute_info(rom, game_gear, false),
        SmsCommands::Validate { rom, game_gear } => execute_validate(rom, game_gear, quiet),
    }
}

fn run_inspection(rom: &Path, game_gear: bool) -> Result<RomReport> {
    let mut params = OperationParams::new().with_file(FileRole::InputRom, rom);
    if game_gear {
        params.rom_kind = Some(RomKind::GameGear);
    }
    let operation = OperationKind::InspectSmsRom.build(params)?;

    let mut diagnostics = ConsoleDiagnostics::new();
    match operation.run(&mut diagnostics)? {
        Outcome::Inspected(report) => Ok(report),
        Outcome::Patched { .. } => {
            anyhow::bail!("Unexpected outcome from {}", OperationKind::InspectSmsRom)
        }
    }
}

fn execute_info(rom: PathBuf, game_gear: bool, json: bool) -> Result<()> {
    use console::style;

    let report = run_inspection(&rom, game_gear)?;

    if json {
        #[cfg(feature = "serde")]
        {
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }
    }

    let header = &report.header;
    println!("\n{}", style("ROM Information").bold().underlined());
    println!("File: {}", style(rom.display()).cyan());
    println!("Console: {}", style(header.kind).yellow());
    println!(
        "Size: {} ({} bytes)",
        style(format_bytes(header.actual_size as u64)).green(),
        header.actual_size
    );

    println!("\n{}", style("Header").bold());
    let mut table = ReportTable::fields();
    table
        .field("Offset", format!("0x{:04X}", header.header_offset))
        .field(
            "TMR SEGA",
            if header.signature_present {
                "present"
            } else {
                "missing"
            },
        )
        .field("Region", header.region())
        .field("Size code", format!("0x{:X}", header.size_region_code & 0x0F))
        .field(
            "Declared size",
            header
                .declared_size()
                .map(|size| format!("{} bytes ({}K)", size, size / 1024))
                .unwrap_or_else(|| "unknown".to_string()),
        )
        .field(
            "Declared checksum",
            format_checksum(Some(header.declared_checksum)),
        )
        .field("Computed checksum", format_checksum(header.computed_checksum));
    table.print();

    println!("\n{}", style("Digests").bold());
    let mut table = ReportTable::new(&["Scheme", "Digest"]);
    for (scheme, digest) in report.digests.entries() {
        table.row([scheme.to_string(), digest.to_string()]);
    }
    table.print();

    println!();
    print_validation(&report);

    Ok(())
}

fn execute_validate(rom: PathBuf, game_gear: bool, quiet: bool) -> Result<()> {
    use console::style;

    let report = run_inspection(&rom, game_gear)?;

    if report.is_valid() {
        if !quiet {
            println!(
                "✓ ROM '{}' is valid ({})",
                style(rom.display()).cyan(),
                style(report.header.kind).yellow()
            );
        }
        return Ok(());
    }

    if !quiet {
        print_validation(&report);
    }
    anyhow::bail!(
        "Validation failed: {} problem(s) found in {}",
        report.validation_errors.len(),
        rom.display()
    )
}

fn print_validation(report: &RomReport) {
    use console::style;

    if report.is_valid() {
        println!("{} No validation errors", style("✓").green());
        return;
    }
    for error in &report.validation_errors {
        println!(
            "{} [{}] {}",
            style("✗").red(),
            style(error.code()).red().bold(),
            error.user_message()
        );
    }
}
