//! Decoder limits.

use crate::constants::{MAX_BENCODE_DEPTH, MAX_MESSAGE_LEN, MAX_SCRAPE_HASHES};

/// Limits enforced while decoding untrusted input.
///
/// The defaults match the protocol constants in [`crate::constants`]; callers
/// that talk to unusual peers or trackers can relax or tighten them.
///
/// # Examples
///
/// ```
/// use bitwire::CodecLimits;
///
/// let limits = CodecLimits::default().with_max_message_len(64 * 1024);
/// assert_eq!(limits.max_message_len, 64 * 1024);
/// assert_eq!(limits.max_bencode_depth, 64);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum list/dictionary nesting in bencode input.
    pub max_bencode_depth: usize,
    /// Maximum announced length of a peer wire frame.
    pub max_message_len: usize,
    /// Maximum info hashes in a single UDP scrape request.
    pub max_scrape_hashes: usize,
}

impl CodecLimits {
    pub fn with_max_bencode_depth(mut self, depth: usize) -> Self {
        self.max_bencode_depth = depth;
        self
    }

    pub fn with_max_message_len(mut self, len: usize) -> Self {
        self.max_message_len = len;
        self
    }

    pub fn with_max_scrape_hashes(mut self, count: usize) -> Self {
        self.max_scrape_hashes = count;
        self
    }
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_bencode_depth: MAX_BENCODE_DEPTH,
            max_message_len: MAX_MESSAGE_LEN,
            max_scrape_hashes: MAX_SCRAPE_HASHES,
        }
    }
}
