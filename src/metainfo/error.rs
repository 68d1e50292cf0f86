use thiserror::Error;

use crate::bencode::BencodeError;

/// Errors that can occur when building [`TorrentMetadata`](super::TorrentMetadata).
#[derive(Debug, Error)]
pub enum MetainfoError {
    /// The torrent file contains invalid bencode.
    #[error("bencode error: {0}")]
    Bencode(#[from] BencodeError),

    /// A required field is missing from the torrent file.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field has the wrong bencode type or an unusable value.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),

    /// `piece length` is zero or negative.
    #[error("invalid piece length: {0}")]
    InvalidPieceLength(i64),

    /// The `pieces` string is not a whole number of 20-byte digests.
    #[error("pieces length {0} is not a multiple of 20")]
    InvalidPiecesLength(usize),

    /// The number of piece digests does not match the content length.
    #[error("expected {expected} piece hashes, found {actual}")]
    PieceCountMismatch { expected: u64, actual: usize },

    /// A file path component is empty, a traversal, or contains a separator.
    #[error("invalid path component: {0:?}")]
    InvalidPath(String),

    /// An info hash string is not 40 hex characters.
    #[error("invalid info hash")]
    InvalidInfoHash,

    /// An I/O error occurred while reading the torrent file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
