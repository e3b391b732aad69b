//! Operation registry and parameter validation
//!
//! Every operation the tool can run is listed in [`OperationKind`]. A kind is
//! turned into a runnable [`Operation`] with [`OperationKind::build`], which
//! checks that every file the operation needs was supplied. The file system
//! checks happen in [`Operation::validate`], before any input is read.

use std::fmt;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use emu_bps::{ApplyOptions, PatchFile, TrailerLayout, apply_patch};
use emu_sms::{RomImage, RomKind, RomReport, inspect};
use emu_utils::{Diagnostics, FileRole};
use thiserror::Error;

/// Problems with the parameters of an operation
#[derive(Debug, Error)]
pub enum ParamError {
    /// A file the operation needs was not given
    #[error("{role} not specified")]
    Missing {
        /// Role of the missing file
        role: FileRole,
    },

    /// An input file does not exist
    #[error("{role} not found: {}", .path.display())]
    NotFound {
        /// Role of the file
        role: FileRole,
        /// Path as given
        path: PathBuf,
    },

    /// An input file exists but cannot be opened
    #[error("{role} is not readable: {}", .path.display())]
    Unreadable {
        /// Role of the file
        role: FileRole,
        /// Path as given
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: io::Error,
    },

    /// The directory an output would be written to cannot take it
    #[error("Cannot write to directory {}", .path.display())]
    OutputDirNotWritable {
        /// The directory
        path: PathBuf,
    },

    /// The output exists and overwriting was not allowed
    #[error("{} already exists (use --force to overwrite)", .path.display())]
    OutputExists {
        /// The existing file
        path: PathBuf,
    },
}

/// Every operation the tool offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Apply a BPS patch to a ROM
    PatchBps,
    /// Inspect an SMS or Game Gear ROM
    InspectSmsRom,
}

impl OperationKind {
    /// All registered operations
    pub const ALL: [OperationKind; 2] = [OperationKind::PatchBps, OperationKind::InspectSmsRom];

    /// Stable identifier
    pub fn id(self) -> &'static str {
        match self {
            OperationKind::PatchBps => "PATCH_BPS",
            OperationKind::InspectSmsRom => "INSPECT_SMS_ROM",
        }
    }

    /// Look up an operation by identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            OperationKind::PatchBps => "Apply BPS Patch",
            OperationKind::InspectSmsRom => "Inspect SMS/Game Gear ROM",
        }
    }

    /// Files the operation takes, inputs first
    pub fn file_roles(self) -> &'static [FileRole] {
        match self {
            OperationKind::PatchBps => &[FileRole::InputRom, FileRole::PatchFile, FileRole::OutputRom],
            OperationKind::InspectSmsRom => &[FileRole::InputRom],
        }
    }

    /// Bind parameters to this operation
    pub fn build(self, params: OperationParams) -> std::result::Result<Operation, ParamError> {
        match self {
            OperationKind::PatchBps => Ok(Operation::PatchBps(PatchParams {
                source: params.require(FileRole::InputRom)?,
                patch: params.require(FileRole::PatchFile)?,
                output: params.require(FileRole::OutputRom)?,
                trailer: params.trailer,
                options: params.apply_options,
                overwrite: params.overwrite,
            })),
            OperationKind::InspectSmsRom => Ok(Operation::InspectSmsRom(InspectParams {
                rom: params.require(FileRole::InputRom)?,
                kind: params.rom_kind,
            })),
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Untyped parameters collected from the command line
#[derive(Debug, Clone, Default)]
pub struct OperationParams {
    files: Vec<(FileRole, PathBuf)>,
    /// Replace an existing output file
    pub overwrite: bool,
    /// Trailer layout of patch files
    pub trailer: TrailerLayout,
    /// Checksum policy for patch application
    pub apply_options: ApplyOptions,
    /// Console to assume instead of guessing from the extension
    pub rom_kind: Option<RomKind>,
}

impl OperationParams {
    /// Empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a file to a role, replacing any earlier assignment
    pub fn with_file(mut self, role: FileRole, path: impl Into<PathBuf>) -> Self {
        self.files.retain(|(existing, _)| *existing != role);
        self.files.push((role, path.into()));
        self
    }

    /// Path assigned to a role
    pub fn file(&self, role: FileRole) -> Option<&Path> {
        self.files
            .iter()
            .find(|(existing, _)| *existing == role)
            .map(|(_, path)| path.as_path())
    }

    fn require(&self, role: FileRole) -> std::result::Result<PathBuf, ParamError> {
        self.file(role)
            .map(Path::to_path_buf)
            .ok_or(ParamError::Missing { role })
    }
}

/// Typed parameters of [`OperationKind::PatchBps`]
#[derive(Debug, Clone)]
pub struct PatchParams {
    /// Unpatched ROM
    pub source: PathBuf,
    /// BPS patch
    pub patch: PathBuf,
    /// Where the patched ROM goes
    pub output: PathBuf,
    /// Trailer layout of the patch
    pub trailer: TrailerLayout,
    /// Checksum policy
    pub options: ApplyOptions,
    /// Replace an existing output file
    pub overwrite: bool,
}

/// Typed parameters of [`OperationKind::InspectSmsRom`]
#[derive(Debug, Clone)]
pub struct InspectParams {
    /// ROM to inspect
    pub rom: PathBuf,
    /// Console to assume; guessed from the extension when `None`
    pub kind: Option<RomKind>,
}

/// An operation with its parameters bound
#[derive(Debug, Clone)]
pub enum Operation {
    /// See [`OperationKind::PatchBps`]
    PatchBps(PatchParams),
    /// See [`OperationKind::InspectSmsRom`]
    InspectSmsRom(InspectParams),
}

/// What a successful operation produced
#[derive(Debug)]
pub enum Outcome {
    /// The patched ROM was written
    Patched {
        /// Path written
        output: PathBuf,
        /// Size of the patched ROM
        size: usize,
    },
    /// The ROM was inspected
    Inspected(RomReport),
}

impl Operation {
    /// Which operation this is
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::PatchBps(_) => OperationKind::PatchBps,
            Operation::InspectSmsRom(_) => OperationKind::InspectSmsRom,
        }
    }

    /// Check the file system: inputs exist and are readable, the output
    /// directory is writable and an existing output may be replaced
    pub fn validate(&self) -> std::result::Result<(), ParamError> {
        match self {
            Operation::PatchBps(params) => {
                check_input(FileRole::InputRom, &params.source)?;
                check_input(FileRole::PatchFile, &params.patch)?;
                if !FileRole::PatchFile.matches_path(&params.patch) {
                    log::warn!(
                        "{} does not look like a {}",
                        params.patch.display(),
                        FileRole::PatchFile.pattern_description()
                    );
                }
                check_output(&params.output, params.overwrite)
            }
            Operation::InspectSmsRom(params) => check_input(FileRole::InputRom, &params.rom),
        }
    }

    /// Validate and run, reporting progress to `diagnostics`
    ///
    /// Any failure is passed to [`Diagnostics::on_fatal_error`] before it is
    /// returned.
    pub fn run(&self, diagnostics: &mut dyn Diagnostics) -> Result<Outcome> {
        log::info!("Running {}", self.kind());
        let result = self
            .validate()
            .map_err(anyhow::Error::from)
            .and_then(|()| match self {
                Operation::PatchBps(params) => run_patch(params, diagnostics),
                Operation::InspectSmsRom(params) => run_inspect(params, diagnostics),
            });

        if let Err(error) = &result {
            diagnostics.on_fatal_error(&**error);
        }
        result
    }
}

fn run_patch(params: &PatchParams, diagnostics: &mut dyn Diagnostics) -> Result<Outcome> {
    let source = fs::read(&params.source)
        .with_context(|| format!("Failed to read {}", params.source.display()))?;
    let patch_data = fs::read(&params.patch)
        .with_context(|| format!("Failed to read {}", params.patch.display()))?;

    let patch = PatchFile::parse(&patch_data, params.trailer)
        .with_context(|| format!("Failed to parse patch {}", params.patch.display()))?;
    let target = apply_patch(&patch, &source, &params.options, diagnostics)
        .context("Failed to apply patch")?;

    fs::write(&params.output, &target)
        .with_context(|| format!("Failed to write {}", params.output.display()))?;
    log::info!("Wrote {} bytes to {}", target.len(), params.output.display());

    Ok(Outcome::Patched {
        output: params.output.clone(),
        size: target.len(),
    })
}

fn run_inspect(params: &InspectParams, diagnostics: &mut dyn Diagnostics) -> Result<Outcome> {
    let mut image = RomImage::open(&params.rom)
        .with_context(|| format!("Failed to load ROM {}", params.rom.display()))?;
    if let Some(kind) = params.kind {
        image = image.with_kind(kind);
    }

    let report = inspect(&image, diagnostics)
        .with_context(|| format!("Failed to inspect {}", params.rom.display()))?;
    Ok(Outcome::Inspected(report))
}

fn check_input(role: FileRole, path: &Path) -> std::result::Result<(), ParamError> {
    if !path.is_file() {
        return Err(ParamError::NotFound {
            role,
            path: path.to_path_buf(),
        });
    }
    File::open(path).map_err(|source| ParamError::Unreadable {
        role,
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn check_output(path: &Path, overwrite: bool) -> std::result::Result<(), ParamError> {
    if path.exists() && !overwrite {
        return Err(ParamError::OutputExists {
            path: path.to_path_buf(),
        });
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let writable = fs::metadata(parent)
        .map(|metadata| metadata.is_dir() && !metadata.permissions().readonly())
        .unwrap_or(false);
    if !writable {
        return Err(ParamError::OutputDirNotWritable {
            path: parent.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_registry_ids() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_id(kind.id()), Some(kind));
        }
        assert_eq!(OperationKind::from_id("UNKNOWN"), None);
        assert_eq!(OperationKind::PatchBps.to_string(), "Apply BPS Patch");
        assert_eq!(
            OperationKind::InspectSmsRom.display_name(),
            "Inspect SMS/Game Gear ROM"
        );
    }

    #[test]
    fn test_build_requires_every_role() {
        let params = OperationParams::new()
            .with_file(FileRole::InputRom, "game.sms")
            .with_file(FileRole::PatchFile, "fix.bps");
        let err = OperationKind::PatchBps.build(params.clone()).unwrap_err();
        assert!(matches!(
            err,
            ParamError::Missing {
                role: FileRole::OutputRom
            }
        ));

        let operation = OperationKind::InspectSmsRom.build(params).unwrap();
        assert_eq!(operation.kind(), OperationKind::InspectSmsRom);
    }

    #[test]
    fn test_with_file_replaces() {
        let params = OperationParams::new()
            .with_file(FileRole::InputRom, "a.sms")
            .with_file(FileRole::InputRom, "b.sms");
        assert_eq!(params.file(FileRole::InputRom), Some(Path::new("b.sms")));
    }

    #[test]
    fn test_validate_missing_input() {
        let temp_dir = TempDir::new().unwrap();
        let operation = OperationKind::InspectSmsRom
            .build(OperationParams::new().with_file(FileRole::InputRom, temp_dir.path().join("x.sms")))
            .unwrap();
        assert!(matches!(
            operation.validate(),
            Err(ParamError::NotFound {
                role: FileRole::InputRom,
                ..
            })
        ));
    }

    #[test]
    fn test_validate_existing_output() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("game.sms");
        let patch = temp_dir.path().join("fix.bps");
        let output = temp_dir.path().join("out.sms");
        for path in [&source, &patch, &output] {
            fs::write(path, b"x").unwrap();
        }

        let params = OperationParams::new()
            .with_file(FileRole::InputRom, &source)
            .with_file(FileRole::PatchFile, &patch)
            .with_file(FileRole::OutputRom, &output);

        let operation = OperationKind::PatchBps.build(params.clone()).unwrap();
        assert!(matches!(
            operation.validate(),
            Err(ParamError::OutputExists { .. })
        ));

        let params = OperationParams {
            overwrite: true,
            ..params
        };
        let operation = OperationKind::PatchBps.build(params).unwrap();
        assert!(operation.validate().is_ok());
    }
}
