//! Torrent metainfo ([BEP-3]).
//!
//! A torrent file is a bencoded dictionary:
//!
//! - **info** - core metadata, hashed to produce the info hash
//!   - `name` - suggested file or directory name
//!   - `piece length` - bytes per piece
//!   - `pieces` - concatenated SHA-1 digests, one per piece
//!   - `length` (single file) or `files` (list of `{length, path}`)
//! - **announce** - primary tracker URL
//! - **announce-list** - tracker tiers ([BEP-12])
//! - **creation date**, **comment**, **created by** - optional
//!
//! [`TorrentMetadata`] validates all of this in one constructor.
//!
//! ```no_run
//! use bitwire::metainfo::TorrentMetadata;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let torrent = TorrentMetadata::from_file("example.torrent")?;
//!
//! println!("Info hash: {}", torrent.info_hash());
//! println!("Pieces: {} x {} bytes", torrent.pieces_count(), torrent.piece_length());
//! for (path, length) in torrent.layout(Path::new("/downloads")) {
//!     println!("  {} ({} bytes)", path.display(), length);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html
//! [BEP-12]: http://bittorrent.org/beps/bep_0012.html

mod error;
mod info_hash;
mod record;
mod torrent;

pub use error::MetainfoError;
pub use info_hash::InfoHash;
pub use record::TorrentRecord;
pub use torrent::{FileEntry, TorrentMetadata};
