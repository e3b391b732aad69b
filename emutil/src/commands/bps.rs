//! BPS patch command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::fs;
use std::path::PathBuf;

use emu_bps::{ActionKind, ActionSummary, ApplyOptions, PatchFile, TrailerLayout};
use emu_utils::FileRole;

use crate::diagnostics::ConsoleDiagnostics;
use crate::operation::{OperationKind, OperationParams, Outcome};
use crate::utils::{ReportTable, create_spinner, format_bytes, format_crc, format_share};

#[derive(Subcommand)]
pub enum BpsCommands {
    /// Apply a BPS patch to a ROM image
    Apply {
        /// Path to the unpatched ROM
        rom: PathBuf,

        /// Path to the BPS patch
        patch: PathBuf,

        /// Path to write the patched ROM to
        #[arg(short, long)]
        output: PathBuf,

        /// Overwrite the output file if it exists
        #[arg(short, long)]
        force: bool,

        /// Checksum trailer layout ("target-only" or "full")
        #[arg(long, env = "EMUTIL_BPS_TRAILER", default_value = "target-only")]
        trailer: TrailerLayout,

        /// Fail on checksum mismatches instead of warning
        #[arg(long)]
        strict: bool,
    },

    /// Display information about a BPS patch
    Info {
        /// Path to the BPS patch
        patch: PathBuf,

        /// Checksum trailer layout ("target-only" or "full")
        #[arg(long, env = "EMUTIL_BPS_TRAILER", default_value = "target-only")]
        trailer: TrailerLayout,

        /// Print the information as JSON
        #[cfg(feature = "serde")]
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(command: BpsCommands, quiet: bool) -> Result<()> {
    match command {
        BpsCommands::Apply {
            rom,
            patch,
            output,
            force,
            trailer,
            strict,
        } => execute_apply(rom, patch, output, force, trailer, strict, quiet),
        #[cfg(feature = "serde")]
        BpsCommands::Info {
            patch,
            trailer,
            json,
        } => execute_info(patch, trailer, json),
        #[cfg(not(feature = "serde"))]
        BpsCommands::Info { patch, trailer } => execute_info(patch, trailer, false),
    }
}

fn execute_apply(
    rom: PathBuf,
    patch: PathBuf,
    output: PathBuf,
    force: bool,
    trailer: TrailerLayout,
    strict: bool,
    quiet: bool,
) -> Result<()> {
    use console::style;

    let mut params = OperationParams::new()
        .with_file(FileRole::InputRom, &rom)
        .with_file(FileRole::PatchFile, &patch)
        .with_file(FileRole::OutputRom, &output);
    params.overwrite = force;
    params.trailer = trailer;
    if strict {
        params.apply_options = ApplyOptions::strict();
    }
    let operation = OperationKind::PatchBps.build(params)?;

    let spinner = create_spinner("Applying patch...", quiet);
    let mut diagnostics = ConsoleDiagnostics::new();
    let result = operation.run(&mut diagnostics);
    spinner.finish_and_clear();

    let Outcome::Patched { output, size } = result? else {
        anyhow::bail!("Unexpected outcome from {}", OperationKind::PatchBps);
    };

    if !quiet {
        println!(
            "✓ Wrote {} ({}) to {}",
            style("patched ROM").green(),
            format_bytes(size as u64),
            style(output.display()).cyan()
        );
        if diagnostics.source_errors() > 0 {
            println!(
                "{} {} problem(s) reported while patching; the output may be incorrect",
                style("!").yellow().bold(),
                diagnostics.source_errors()
            );
        }
    }

    Ok(())
}

/// Patch information as exported with `--json`
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
struct PatchInfo {
    source_size: u64,
    target_size: u64,
    metadata: Option<String>,
    trailer: String,
    source_crc: Option<u32>,
    target_crc: u32,
    patch_crc: Option<u32>,
    patch_crc_valid: Option<bool>,
    actions: u64,
}

fn execute_info(path: PathBuf, trailer: TrailerLayout, json: bool) -> Result<()> {
    use console::style;

    let data =
        fs::read(&path).with_context(|| format!("Failed to open file: {}", path.display()))?;
    let patch = PatchFile::parse(&data, trailer)
        .with_context(|| format!("Failed to parse BPS patch: {}", path.display()))?;
    let summary =
        ActionSummary::collect(patch.actions()).context("Failed to decode action stream")?;

    let info = PatchInfo {
        source_size: patch.header.source_size,
        target_size: patch.header.target_size,
        metadata: patch
            .header
            .metadata_text()
            .filter(|text| !text.is_empty())
            .map(|text| text.into_owned()),
        trailer: patch.layout.to_string(),
        source_crc: patch.trailer.source_crc,
        target_crc: patch.trailer.target_crc,
        patch_crc: patch.trailer.patch_crc,
        patch_crc_valid: patch
            .trailer
            .patch_crc
            .map(|declared| declared == patch.computed_patch_crc()),
        actions: summary.total_actions(),
    };

    if json {
        #[cfg(feature = "serde")]
        {
            println!("{}", serde_json::to_string_pretty(&info)?);
            return Ok(());
        }
    }

    println!("\n{}", style("BPS Patch Information").bold().underlined());
    println!("File: {}", style(path.display()).cyan());
    println!("Patch size: {}", format_bytes(patch.len() as u64));
    println!(
        "Source size: {} ({} bytes)",
        style(format_bytes(info.source_size)).green(),
        info.source_size
    );
    println!(
        "Target size: {} ({} bytes)",
        style(format_bytes(info.target_size)).green(),
        info.target_size
    );
    match &info.metadata {
        Some(text) => println!("Metadata: {}", style(text).yellow()),
        None => println!(
            "Metadata: {} bytes",
            style(patch.header.metadata.len()).dim()
        ),
    }

    println!("\n{}", style("Checksums").bold());
    println!("Trailer layout: {}", style(&info.trailer).yellow());
    if let Some(crc) = info.source_crc {
        println!("Source CRC32: {}", format_crc(crc));
    }
    println!("Target CRC32: {}", format_crc(info.target_crc));
    if let (Some(crc), Some(valid)) = (info.patch_crc, info.patch_crc_valid) {
        let status = if valid {
            style("valid").green()
        } else {
            style("MISMATCH").red()
        };
        println!("Patch CRC32: {} ({})", format_crc(crc), status);
    }

    println!("\n{}", style("Actions").bold());
    println!("Total actions: {}", style(info.actions).green());
    let mut table = ReportTable::new(&["Action", "Count", "Bytes", "Share"]);
    for kind in [
        ActionKind::SourceRead,
        ActionKind::TargetRead,
        ActionKind::SourceCopy,
        ActionKind::TargetCopy,
    ] {
        let stats = summary.stats(kind);
        table.row([
            kind.to_string(),
            stats.count.to_string(),
            stats.bytes.to_string(),
            format_share(stats.bytes, summary.total_bytes()),
        ]);
    }
    table.print();

    if summary.total_bytes() != info.target_size {
        println!(
            "{} actions describe {} bytes but the target is {} bytes",
            style("!").yellow().bold(),
            summary.total_bytes(),
            info.target_size
        );
    }

    Ok(())
}
