//! bitwire - BitTorrent wire codecs
//!
//! Pure, synchronous encoders and decoders for the byte formats a BitTorrent
//! client has to get exactly right. Sockets, scheduling and disk I/O are left
//! to the caller.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 Bencode encoding/decoding
//! - [`metainfo`] - BEP-3 torrent metainfo, info hash and piece geometry
//! - [`peer`] - BEP-3 peer wire messages, handshake, frame dispatch and blocks
//! - [`tracker`] - BEP-15 UDP tracker frames
//! - [`constants`] - Protocol constants and default limits

pub mod bencode;
mod config;
pub mod constants;
pub mod metainfo;
pub mod peer;
pub mod tracker;

pub use bencode::{decode, encode, BencodeError, Value};
pub use config::CodecLimits;
pub use metainfo::{FileEntry, InfoHash, MetainfoError, TorrentMetadata, TorrentRecord};
pub use peer::{
    Bitfield, Block, BlockState, Dispatcher, Handshake, Message, MessageId, PeerError, PeerId,
};
pub use tracker::{
    AnnounceRequest, AnnounceResponse, ConnectRequest, ConnectResponse, ErrorResponse, Response,
    ScrapeRequest, ScrapeResponse, TrackerError, TrackerEvent, TransactionId,
};
