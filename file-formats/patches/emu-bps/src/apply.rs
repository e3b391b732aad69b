//! Patch application logic
//!
//! Replays the action stream of a [`PatchFile`] against a source buffer to
//! build the patched image.

use emu_utils::{Diagnostics, FileRole};

use crate::action::PatchAction;
use crate::checksum::{ChecksumKind, ChecksumPolicy, crc32, verify_crc};
use crate::header::PatchFile;
use crate::{BpsError, Result};

/// Options controlling patch application
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyOptions {
    /// How checksum and size disagreements are handled
    pub checksum_policy: ChecksumPolicy,
}

impl ApplyOptions {
    /// Options that turn every checksum mismatch into an error
    pub fn strict() -> Self {
        Self {
            checksum_policy: ChecksumPolicy::Strict,
        }
    }
}

/// Apply a patch file to source data
///
/// # Arguments
///
/// * `patch` - The parsed patch file
/// * `source` - The original ROM image
/// * `options` - Checksum policy
/// * `diagnostics` - Receives a trace line per action and any checksum problems
///
/// # Returns
///
/// The patched image, exactly `patch.header.target_size` bytes long
///
/// # Errors
///
/// Returns error if:
/// - The source size differs from the size declared in the patch (nothing is written)
/// - The action stream is malformed
/// - An action reads or writes outside the source or target buffer
/// - A checksum disagrees and the policy is [`ChecksumPolicy::Strict`]
pub fn apply_patch(
    patch: &PatchFile,
    source: &[u8],
    options: &ApplyOptions,
    diagnostics: &mut dyn Diagnostics,
) -> Result<Vec<u8>> {
    let header = &patch.header;
    if header.source_size != source.len() as u64 {
        return Err(BpsError::SizeMismatch {
            declared: header.source_size,
            actual: source.len() as u64,
        });
    }

    diagnostics.on_debug_message(&format!("Output file size: {}", header.target_size));
    diagnostics.on_debug_message(&format!("Metadata length: {}", header.metadata.len()));

    let policy = options.checksum_policy;
    if let Some(expected) = patch.trailer.patch_crc {
        verify_crc(
            ChecksumKind::Patch,
            expected,
            patch.computed_patch_crc(),
            policy,
            (patch.len() - 4) as u64,
            diagnostics,
        )?;
    }
    if let Some(expected) = patch.trailer.source_crc {
        verify_crc(
            ChecksumKind::Source,
            expected,
            crc32(source),
            policy,
            0,
            diagnostics,
        )?;
    }

    let target_size = usize::try_from(header.target_size).map_err(|_| {
        BpsError::out_of_range(0, format!("target size {} is not addressable", header.target_size))
    })?;

    log::debug!(
        "Applying BPS patch: {} -> {} bytes ({} bytes of actions)",
        source.len(),
        target_size,
        patch.actions_len()
    );

    let mut builder = TargetBuilder::new(source, target_size)?;
    for action in patch.actions() {
        builder.execute(action?, diagnostics)?;
    }

    if builder.output_pos != target_size {
        let error = BpsError::IncompleteTarget {
            expected: target_size as u64,
            written: builder.output_pos as u64,
        };
        match policy {
            ChecksumPolicy::Strict => return Err(error),
            ChecksumPolicy::Lenient => {
                log::warn!("{error}");
                diagnostics.on_source_error(
                    FileRole::PatchFile,
                    patch.len() as u64,
                    &error.to_string(),
                );
            }
        }
    }

    verify_crc(
        ChecksumKind::Target,
        patch.trailer.target_crc,
        crc32(&builder.target),
        policy,
        builder.source_cursor as u64,
        diagnostics,
    )?;

    log::debug!("BPS patch applied: {} bytes", builder.target.len());

    Ok(builder.target)
}

/// Output buffer plus the three positions the actions move
struct TargetBuilder<'s> {
    source: &'s [u8],
    target: Vec<u8>,
    output_pos: usize,
    source_cursor: usize,
    target_cursor: usize,
}

impl<'s> TargetBuilder<'s> {
    /// The declared target size is untrusted, so the buffer is reserved
    /// fallibly.
    fn new(source: &'s [u8], target_size: usize) -> Result<Self> {
        let mut target = Vec::new();
        target.try_reserve_exact(target_size).map_err(|err| {
            BpsError::out_of_range(0, format!("cannot allocate {target_size} byte target: {err}"))
        })?;
        target.resize(target_size, 0);

        Ok(Self {
            source,
            target,
            output_pos: 0,
            source_cursor: 0,
            target_cursor: 0,
        })
    }

    fn execute(&mut self, action: PatchAction<'_>, diagnostics: &mut dyn Diagnostics) -> Result<()> {
        match action {
            PatchAction::SourceRead { length } => {
                let len = self.length(length)?;
                diagnostics.on_debug_message(&format!(
                    "Copy {len} from same pos ({})",
                    self.output_pos
                ));
                let start = self.output_pos;
                let data = self.source_slice(start, len)?;
                self.write(data)?;
            }
            PatchAction::TargetRead { data } => {
                diagnostics.on_debug_message(&format!("Read {} bytes of target", data.len()));
                self.write(data)?;
            }
            PatchAction::SourceCopy { length, delta } => {
                let len = self.length(length)?;
                self.source_cursor = self.moved(self.source_cursor, delta, "source")?;
                diagnostics.on_debug_message(&format!(
                    "Copy {len} bytes from 0x{:x} to {}",
                    self.source_cursor, self.output_pos
                ));
                let data = self.source_slice(self.source_cursor, len)?;
                self.write(data)?;
                self.source_cursor += len;
            }
            PatchAction::TargetCopy { length, delta } => {
                let len = self.length(length)?;
                self.target_cursor = self.moved(self.target_cursor, delta, "target")?;
                diagnostics.on_debug_message(&format!(
                    "Clone {len} bytes from {} to {}",
                    self.target_cursor, self.output_pos
                ));
                self.clone_from_target(len)?;
                self.target_cursor += len;
            }
        }
        Ok(())
    }

    fn length(&self, length: u64) -> Result<usize> {
        usize::try_from(length).map_err(|_| {
            BpsError::out_of_range(self.output_pos, format!("action length {length} is not addressable"))
        })
    }

    fn moved(&self, cursor: usize, delta: i64, which: &str) -> Result<usize> {
        isize::try_from(delta)
            .ok()
            .and_then(|delta| cursor.checked_add_signed(delta))
            .ok_or_else(|| {
                BpsError::out_of_range(
                    self.output_pos,
                    format!("{which} cursor {cursor} moved by {delta} leaves the buffer"),
                )
            })
    }

    fn source_slice(&self, start: usize, len: usize) -> Result<&'s [u8]> {
        let source: &'s [u8] = self.source;
        start
            .checked_add(len)
            .and_then(|end| source.get(start..end))
            .ok_or_else(|| {
                BpsError::out_of_range(
                    self.output_pos,
                    format!(
                        "read of {len} bytes at source offset {start} exceeds source size {}",
                        source.len()
                    ),
                )
            })
    }

    fn write_end(&self, len: usize) -> Result<usize> {
        self.output_pos
            .checked_add(len)
            .filter(|&end| end <= self.target.len())
            .ok_or_else(|| {
                BpsError::out_of_range(
                    self.output_pos,
                    format!(
                        "write of {len} bytes exceeds target size {}",
                        self.target.len()
                    ),
                )
            })
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let end = self.write_end(data.len())?;
        self.target[self.output_pos..end].copy_from_slice(data);
        self.output_pos = end;
        Ok(())
    }

    /// Copy from already written output. Source and destination may overlap,
    /// so bytes are copied one at a time in increasing order.
    fn clone_from_target(&mut self, len: usize) -> Result<()> {
        let end = self.write_end(len)?;
        if self.target_cursor >= self.output_pos {
            return Err(BpsError::out_of_range(
                self.output_pos,
                format!(
                    "target copy from offset {} reads data not yet written",
                    self.target_cursor
                ),
            ));
        }

        let from = self.target_cursor;
        for i in 0..len {
            self.target[self.output_pos + i] = self.target[from + i];
        }
        self.output_pos = end;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionKind;
    use crate::header::{BPS_MAGIC, TrailerLayout};
    use crate::varint::{encode_signed_offset, encode_varint};
    use emu_utils::{NullDiagnostics, RecordingDiagnostics};
    use pretty_assertions::assert_eq;

    /// Helper to assemble a patch with a target-only trailer
    struct PatchBuilder {
        body: Vec<u8>,
        source_size: u64,
        target_size: u64,
    }

    impl PatchBuilder {
        fn new(source_size: u64, target_size: u64) -> Self {
            Self {
                body: Vec::new(),
                source_size,
                target_size,
            }
        }

        fn action(mut self, kind: ActionKind, length: u64) -> Self {
            encode_varint(kind.encode_word(length), &mut self.body);
            self
        }

        fn literal(mut self, bytes: &[u8]) -> Self {
            self = self.action(ActionKind::TargetRead, bytes.len() as u64);
            self.body.extend_from_slice(bytes);
            self
        }

        fn copy(mut self, kind: ActionKind, length: u64, delta: i64) -> Self {
            self = self.action(kind, length);
            encode_signed_offset(delta, &mut self.body);
            self
        }

        fn build(self, target_crc: u32) -> PatchFile {
            let mut data = BPS_MAGIC.to_vec();
            encode_varint(self.source_size, &mut data);
            encode_varint(self.target_size, &mut data);
            encode_varint(0, &mut data);
            data.extend_from_slice(&self.body);
            data.extend_from_slice(&target_crc.to_le_bytes());
            PatchFile::parse(&data, TrailerLayout::TargetOnly).expect("test patch should parse")
        }
    }

    fn apply(patch: &PatchFile, source: &[u8]) -> Result<Vec<u8>> {
        apply_patch(patch, source, &ApplyOptions::default(), &mut NullDiagnostics)
    }

    #[test]
    fn test_source_read_is_positional() {
        let source = [1u8, 2, 3, 4, 5, 6];
        let expected = [1u8, 2, 0xEE, 4, 5, 6];
        let patch = PatchBuilder::new(6, 6)
            .action(ActionKind::SourceRead, 2)
            .literal(&[0xEE])
            .action(ActionKind::SourceRead, 3)
            .build(crc32(&expected));

        assert_eq!(apply(&patch, &source).unwrap(), expected);
    }

    #[test]
    fn test_source_copy_moves_cursor() {
        let source = [10u8, 20, 30, 40];
        // Copy bytes 2..4, then jump back to 0 (cursor is at 4, delta -4)
        let expected = [30u8, 40, 10, 20];
        let patch = PatchBuilder::new(4, 4)
            .copy(ActionKind::SourceCopy, 2, 2)
            .copy(ActionKind::SourceCopy, 2, -4)
            .build(crc32(&expected));

        assert_eq!(apply(&patch, &source).unwrap(), expected);
    }

    #[test]
    fn test_target_copy_expands_run() {
        let expected = vec![0x42u8; 9];
        let patch = PatchBuilder::new(0, 9)
            .literal(&[0x42])
            .copy(ActionKind::TargetCopy, 8, 0)
            .build(crc32(&expected));

        assert_eq!(apply(&patch, &[]).unwrap(), expected);
    }

    #[test]
    fn test_target_copy_repeats_pattern() {
        let expected = [1u8, 2, 3, 1, 2, 3, 1, 2];
        let patch = PatchBuilder::new(0, 8)
            .literal(&[1, 2, 3])
            .copy(ActionKind::TargetCopy, 5, 0)
            .build(crc32(&expected));

        assert_eq!(apply(&patch, &[]).unwrap(), expected);
    }

    #[test]
    fn test_target_copy_of_unwritten_data_fails() {
        let patch = PatchBuilder::new(0, 4)
            .literal(&[1])
            .copy(ActionKind::TargetCopy, 2, 1)
            .build(0);

        assert!(matches!(
            apply(&patch, &[]),
            Err(BpsError::OutOfRange { offset: 1, .. })
        ));
    }

    #[test]
    fn test_negative_cursor_fails() {
        let patch = PatchBuilder::new(4, 2)
            .copy(ActionKind::SourceCopy, 2, -1)
            .build(0);

        assert!(matches!(
            apply(&patch, &[0; 4]),
            Err(BpsError::OutOfRange { offset: 0, .. })
        ));
    }

    #[test]
    fn test_write_past_target_fails() {
        let patch = PatchBuilder::new(0, 2).literal(&[1, 2, 3]).build(0);
        assert!(matches!(
            apply(&patch, &[]),
            Err(BpsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_huge_declared_target_fails_without_allocating() {
        let patch = PatchBuilder::new(0, 1 << 62).build(0);
        assert!(matches!(
            apply(&patch, &[]),
            Err(BpsError::OutOfRange { offset: 0, .. })
        ));
    }

    #[test]
    fn test_source_read_past_source_fails() {
        let patch = PatchBuilder::new(2, 4)
            .action(ActionKind::SourceRead, 4)
            .build(0);
        assert!(matches!(
            apply(&patch, &[1, 2]),
            Err(BpsError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_incomplete_target_lenient_and_strict() {
        let expected = [7u8, 0, 0];
        let patch = PatchBuilder::new(0, 3).literal(&[7]).build(crc32(&expected));

        let mut diagnostics = RecordingDiagnostics::new();
        let output =
            apply_patch(&patch, &[], &ApplyOptions::default(), &mut diagnostics).unwrap();
        assert_eq!(output, expected);
        assert_eq!(diagnostics.source_error_count(), 1);

        assert!(matches!(
            apply_patch(&patch, &[], &ApplyOptions::strict(), &mut NullDiagnostics),
            Err(BpsError::IncompleteTarget {
                expected: 3,
                written: 1
            })
        ));
    }

    #[test]
    fn test_strict_target_crc_mismatch_fails() {
        let patch = PatchBuilder::new(0, 1).literal(&[9]).build(0);
        assert!(matches!(
            apply_patch(&patch, &[], &ApplyOptions::strict(), &mut NullDiagnostics),
            Err(BpsError::ChecksumMismatch {
                kind: ChecksumKind::Target,
                ..
            })
        ));
    }

    #[test]
    fn test_each_action_is_traced() {
        let expected = [1u8, 1];
        let patch = PatchBuilder::new(0, 2)
            .literal(&[1])
            .copy(ActionKind::TargetCopy, 1, 0)
            .build(crc32(&expected));

        let mut diagnostics = RecordingDiagnostics::new();
        apply_patch(&patch, &[], &ApplyOptions::default(), &mut diagnostics).unwrap();
        let messages: Vec<_> = diagnostics.debug_messages().collect();
        assert!(messages.contains(&"Read 1 bytes of target"));
        assert!(messages.contains(&"Clone 1 bytes from 0 to 1"));
    }
}
