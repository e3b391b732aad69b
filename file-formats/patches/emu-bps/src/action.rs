//! Decoding of the BPS action stream

use std::fmt;
use std::io::Cursor;

use crate::varint::{read_signed_offset, read_varint};
use crate::{BpsError, Result};

/// Kind of a patch action, stored in the low two bits of the action word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Copy from the source at the current output position
    SourceRead,
    /// Copy literal bytes from the patch
    TargetRead,
    /// Copy from the source at the relative source cursor
    SourceCopy,
    /// Copy from already written output at the relative target cursor
    TargetCopy,
}

impl ActionKind {
    /// Decode the kind from an action word
    pub fn from_word(word: u64) -> Self {
        match word & 0b11 {
            0 => ActionKind::SourceRead,
            1 => ActionKind::TargetRead,
            2 => ActionKind::SourceCopy,
            _ => ActionKind::TargetCopy,
        }
    }

    /// Value stored in the action word
    pub fn to_bits(self) -> u64 {
        match self {
            ActionKind::SourceRead => 0,
            ActionKind::TargetRead => 1,
            ActionKind::SourceCopy => 2,
            ActionKind::TargetCopy => 3,
        }
    }

    /// Build the action word for this kind and a length of at least 1.
    ///
    /// Actions cannot be empty, so a length of 0 encodes the same word as 1.
    pub fn encode_word(self, length: u64) -> u64 {
        (length.saturating_sub(1) << 2) | self.to_bits()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::SourceRead => write!(f, "SourceRead"),
            ActionKind::TargetRead => write!(f, "TargetRead"),
            ActionKind::SourceCopy => write!(f, "SourceCopy"),
            ActionKind::TargetCopy => write!(f, "TargetCopy"),
        }
    }
}

/// One decoded action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchAction<'a> {
    /// Copy `length` bytes from the source at the output position
    SourceRead {
        /// Number of bytes
        length: u64,
    },
    /// Copy the embedded literal bytes
    TargetRead {
        /// Literal bytes, borrowed from the patch
        data: &'a [u8],
    },
    /// Move the source cursor by `delta`, then copy `length` bytes from it
    SourceCopy {
        /// Number of bytes
        length: u64,
        /// Signed adjustment of the source cursor
        delta: i64,
    },
    /// Move the target cursor by `delta`, then copy `length` bytes from it
    TargetCopy {
        /// Number of bytes
        length: u64,
        /// Signed adjustment of the target cursor
        delta: i64,
    },
}

impl PatchAction<'_> {
    /// Kind of this action
    pub fn kind(&self) -> ActionKind {
        match self {
            PatchAction::SourceRead { .. } => ActionKind::SourceRead,
            PatchAction::TargetRead { .. } => ActionKind::TargetRead,
            PatchAction::SourceCopy { .. } => ActionKind::SourceCopy,
            PatchAction::TargetCopy { .. } => ActionKind::TargetCopy,
        }
    }

    /// Number of output bytes this action produces
    pub fn length(&self) -> u64 {
        match self {
            PatchAction::SourceRead { length }
            | PatchAction::SourceCopy { length, .. }
            | PatchAction::TargetCopy { length, .. } => *length,
            PatchAction::TargetRead { data } => data.len() as u64,
        }
    }
}

/// Lazy iterator over the actions of a patch
///
/// Stops after the first error.
#[derive(Debug)]
pub struct PatchActions<'a> {
    reader: Cursor<&'a [u8]>,
    failed: bool,
}

impl<'a> PatchActions<'a> {
    /// Iterate over `data[start..]`. Offsets in errors are relative to `data`.
    pub(crate) fn new(data: &'a [u8], start: usize) -> Self {
        let mut reader = Cursor::new(data);
        reader.set_position(start as u64);
        Self {
            reader,
            failed: false,
        }
    }

    /// Position of the next action in the patch file
    pub fn offset(&self) -> u64 {
        self.reader.position()
    }

    fn read_action(&mut self) -> Result<PatchAction<'a>> {
        let word = read_varint(&mut self.reader)?;
        let length = (word >> 2) + 1;

        let action = match ActionKind::from_word(word) {
            ActionKind::SourceRead => PatchAction::SourceRead { length },
            ActionKind::TargetRead => {
                let data: &'a [u8] = *self.reader.get_ref();
                let start = self.reader.position() as usize;
                let end = usize::try_from(length)
                    .ok()
                    .and_then(|length| start.checked_add(length))
                    .filter(|&end| end <= data.len())
                    .ok_or_else(|| {
                        BpsError::invalid_format(
                            start as u64,
                            format!("TargetRead of {length} bytes runs past the action stream"),
                        )
                    })?;
                self.reader.set_position(end as u64);
                PatchAction::TargetRead {
                    data: &data[start..end],
                }
            }
            ActionKind::SourceCopy => PatchAction::SourceCopy {
                length,
                delta: read_signed_offset(&mut self.reader)?,
            },
            ActionKind::TargetCopy => PatchAction::TargetCopy {
                length,
                delta: read_signed_offset(&mut self.reader)?,
            },
        };

        log::trace!("{} action, length {}", action.kind(), length);
        Ok(action)
    }
}

impl<'a> Iterator for PatchActions<'a> {
    type Item = Result<PatchAction<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.position() as usize >= self.reader.get_ref().len() {
            return None;
        }

        let action = self.read_action();
        self.failed = action.is_err();
        Some(action)
    }
}

/// Count and byte total for one action kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionStats {
    /// Number of actions
    pub count: u64,
    /// Output bytes produced by them
    pub bytes: u64,
}

/// Per-kind totals over a whole action stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSummary {
    /// SourceRead totals
    pub source_read: ActionStats,
    /// TargetRead totals
    pub target_read: ActionStats,
    /// SourceCopy totals
    pub source_copy: ActionStats,
    /// TargetCopy totals
    pub target_copy: ActionStats,
}

impl ActionSummary {
    /// Walk the stream and total it up
    pub fn collect<'a, I>(actions: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<PatchAction<'a>>>,
    {
        let mut summary = ActionSummary::default();
        for action in actions {
            let action = action?;
            let stats = summary.stats_mut(action.kind());
            stats.count += 1;
            stats.bytes = stats.bytes.saturating_add(action.length());
        }
        Ok(summary)
    }

    /// Totals for one kind
    pub fn stats(&self, kind: ActionKind) -> ActionStats {
        match kind {
            ActionKind::SourceRead => self.source_read,
            ActionKind::TargetRead => self.target_read,
            ActionKind::SourceCopy => self.source_copy,
            ActionKind::TargetCopy => self.target_copy,
        }
    }

    fn stats_mut(&mut self, kind: ActionKind) -> &mut ActionStats {
        match kind {
            ActionKind::SourceRead => &mut self.source_read,
            ActionKind::TargetRead => &mut self.target_read,
            ActionKind::SourceCopy => &mut self.source_copy,
            ActionKind::TargetCopy => &mut self.target_copy,
        }
    }

    /// Total number of actions
    pub fn total_actions(&self) -> u64 {
        self.source_read.count
            + self.target_read.count
            + self.source_copy.count
            + self.target_copy.count
    }

    /// Total output bytes described by the stream
    pub fn total_bytes(&self) -> u64 {
        self.source_read
            .bytes
            .saturating_add(self.target_read.bytes)
            .saturating_add(self.source_copy.bytes)
            .saturating_add(self.target_copy.bytes)
    }
}
