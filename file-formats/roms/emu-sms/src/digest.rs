//! Content digests for identifying ROM dumps

use md5::{Digest, Md5};
use sha1::Sha1;

/// Digests of a whole ROM image, as lowercase hex
///
/// These are informational only and take part in no validation.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct RomDigests {
    /// CRC-32 (IEEE)
    pub crc32: String,
    /// MD5
    pub md5: String,
    /// SHA-1
    pub sha1: String,
}

impl RomDigests {
    /// Hash `data` with every supported scheme
    pub fn compute(data: &[u8]) -> Self {
        let md5 = Md5::digest(data);
        let sha1 = Sha1::digest(data);

        Self {
            crc32: format!("{:08x}", crc32fast::hash(data)),
            md5: hex::encode(md5),
            sha1: hex::encode(sha1),
        }
    }

    /// `(scheme, digest)` pairs in display order
    pub fn entries(&self) -> [(&'static str, &str); 3] {
        [
            ("CRC32", self.crc32.as_str()),
            ("MD5", self.md5.as_str()),
            ("SHA-1", self.sha1.as_str()),
        ]
    }
}
