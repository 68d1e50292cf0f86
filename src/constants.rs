//! Protocol constants.
//!
//! Wire-level values fixed by BEP-3 and BEP-15, plus the default limits the
//! decoders enforce. Tunable limits are collected in [`crate::CodecLimits`].

// ============================================================================
// Client identification
// ============================================================================

/// Client ID prefix for peer ID generation (Azureus-style)
pub const CLIENT_PREFIX: &[u8; 8] = b"-BW0001-";

// ============================================================================
// Bencode
// ============================================================================

/// Maximum nesting of lists and dictionaries accepted by the decoder
pub const MAX_BENCODE_DEPTH: usize = 64;

// ============================================================================
// Peer wire protocol (BEP-3)
// ============================================================================

/// Protocol identifier sent in the handshake
pub const PROTOCOL: &[u8; 19] = b"BitTorrent protocol";

/// Handshake size: pstrlen + pstr + reserved + info_hash + peer_id
pub const HANDSHAKE_LEN: usize = 1 + 19 + 8 + 20 + 20;

/// Size of the big-endian length prefix in front of every message
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Standard block size (16 KiB); the last block of a piece may be shorter
pub const BLOCK_SIZE: u32 = 16384;

/// Largest frame the dispatcher buffers (a 16 KiB block plus headroom for
/// bitfields of very large torrents)
pub const MAX_MESSAGE_LEN: usize = 2 * 1024 * 1024;

/// Length of a SHA-1 digest (info hash, piece hash, peer id)
pub const HASH_LEN: usize = 20;

// ============================================================================
// UDP tracker protocol (BEP-15)
// ============================================================================

/// Magic constant sent as the connection id of a connect request
pub const UDP_PROTOCOL_ID: u64 = 0x41727101980;

/// Connect action
pub const ACTION_CONNECT: u32 = 0;

/// Announce action
pub const ACTION_ANNOUNCE: u32 = 1;

/// Scrape action
pub const ACTION_SCRAPE: u32 = 2;

/// Error action
pub const ACTION_ERROR: u32 = 3;

/// Maximum info hashes in one scrape request (fits a 1500 byte MTU)
pub const MAX_SCRAPE_HASHES: usize = 74;

/// `num_want` value asking the tracker for its default peer count
pub const NUM_WANT_DEFAULT: i32 = -1;
