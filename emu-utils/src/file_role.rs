//! Roles of the files an operation touches

use std::fmt;
use std::path::Path;

/// A file taking part in an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileRole {
    /// ROM image read as input (patch source or inspection target)
    InputRom,
    /// BPS patch definition
    PatchFile,
    /// ROM image written as output
    OutputRom,
}

impl FileRole {
    /// Stable key for this role
    pub fn key(self) -> &'static str {
        match self {
            FileRole::InputRom => "InputRom",
            FileRole::PatchFile => "InputPatch",
            FileRole::OutputRom => "OutputRom",
        }
    }

    /// Human-readable name
    pub fn display_name(self) -> &'static str {
        match self {
            FileRole::InputRom => "Source ROM",
            FileRole::PatchFile => "Patch file",
            FileRole::OutputRom => "Output ROM",
        }
    }

    /// Whether the operation writes to this file
    pub fn is_output(self) -> bool {
        matches!(self, FileRole::OutputRom)
    }

    /// Extensions conventionally used for this role, lowercase and without
    /// the dot. An empty slice means any name is accepted.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileRole::PatchFile => &["bps"],
            FileRole::InputRom | FileRole::OutputRom => &[],
        }
    }

    /// Description of the accepted file names
    pub fn pattern_description(self) -> &'static str {
        match self {
            FileRole::InputRom => "Source ROM",
            FileRole::PatchFile => "BPS patch definition (*.bps)",
            FileRole::OutputRom => "Output ROM",
        }
    }

    /// Check whether a path has one of the conventional extensions
    pub fn matches_path(self, path: &Path) -> bool {
        let extensions = self.extensions();
        if extensions.is_empty() {
            return true;
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
