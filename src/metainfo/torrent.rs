use super::error::MetainfoError;
use super::info_hash::InfoHash;
use super::record::TorrentRecord;
use crate::bencode::{encode, Decoder, Value};
use crate::config::CodecLimits;
use crate::constants::HASH_LEN;
use crate::peer::{Bitfield, Block};
use bytes::Bytes;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

type Dict = BTreeMap<Bytes, Value>;

/// A parsed torrent file.
///
/// Built once by a validating constructor that derives every field (file
/// layout, piece table, info hash) in one pass; a torrent that fails any
/// check produces no value at all. The result is immutable and can be shared
/// freely between threads.
///
/// # Examples
///
/// ```
/// use bitwire::metainfo::TorrentMetadata;
///
/// let data = b"d8:announce18:udp://tracker:69694:infod6:lengthi1000e4:name5:a.txt\
/// 12:piece lengthi500e6:pieces40:\
/// \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\
/// \x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00ee";
///
/// let torrent = TorrentMetadata::from_bytes(data).unwrap();
/// assert_eq!(torrent.name(), "a.txt");
/// assert_eq!(torrent.pieces_count(), 2);
/// assert_eq!(torrent.announce_list(), &[vec!["udp://tracker:6969".to_string()]]);
/// ```
#[derive(Debug, Clone)]
pub struct TorrentMetadata {
    announce_list: Vec<Vec<String>>,
    comment: Option<String>,
    created_by: Option<String>,
    creation_date: Option<i64>,
    name: String,
    piece_length: u64,
    piece_hashes: Vec<[u8; HASH_LEN]>,
    files: Vec<FileEntry>,
    total_length: u64,
    multi_file: bool,
    private: bool,
    info_hash: InfoHash,
    raw_info: Bytes,
}

/// A file within a torrent.
///
/// For single-file torrents the path is the torrent name. For multi-file
/// torrents it is the torrent name followed by the listed components, so the
/// content of every torrent lives under one entry in the save directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the save directory.
    pub path: PathBuf,
    /// Size of the file in bytes.
    pub length: u64,
    /// Byte offset of the file within the concatenated torrent content.
    pub offset: u64,
}

impl FileEntry {
    /// Returns the file's location under `save_dir`.
    pub fn resolve(&self, save_dir: &Path) -> PathBuf {
        save_dir.join(&self.path)
    }
}

impl TorrentMetadata {
    /// Reads and parses a torrent file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, MetainfoError> {
        let path = path.as_ref();
        trace!(path = %path.display(), "reading torrent file");
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parses a torrent from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The data is not valid bencode, or the root is not a dictionary
    /// - `info` is missing or not a dictionary
    /// - `name`, `piece length` or `pieces` is missing, or the piece length is
    ///   not positive
    /// - The `pieces` length is not a multiple of 20, or the digest count
    ///   disagrees with the content length
    /// - Neither `length` nor a valid `files` list is present
    pub fn from_bytes(data: &[u8]) -> Result<Self, MetainfoError> {
        Self::from_bytes_with(data, &CodecLimits::default())
    }

    /// Like [`from_bytes`](Self::from_bytes), decoding under `limits`.
    pub fn from_bytes_with(data: &[u8], limits: &CodecLimits) -> Result<Self, MetainfoError> {
        let root = Decoder::new(data).with_limits(limits).decode()?;
        let dict = root.as_dict().ok_or(MetainfoError::InvalidField("root"))?;

        let info_value = dict
            .get(b"info".as_slice())
            .ok_or(MetainfoError::MissingField("info"))?;
        let info = info_value
            .as_dict()
            .ok_or(MetainfoError::InvalidField("info"))?;

        // Hash the canonical re-encoding, not the source bytes, so the hash
        // does not depend on the key order the file was written with.
        let raw_info = Bytes::from(encode(info_value));
        let info_hash = InfoHash::from_info_bytes(&raw_info);

        let name = get_str(info, "name")?
            .ok_or(MetainfoError::MissingField("name"))?
            .to_string();
        check_component(&name)?;

        let piece_length = get_int(info, "piece length")?
            .ok_or(MetainfoError::MissingField("piece length"))?;
        // Block offsets within a piece are 32-bit on the wire.
        if piece_length <= 0 || piece_length > i64::from(u32::MAX) {
            return Err(MetainfoError::InvalidPieceLength(piece_length));
        }
        let piece_length = piece_length as u64;

        let pieces = info
            .get(b"pieces".as_slice())
            .ok_or(MetainfoError::MissingField("pieces"))?
            .as_bytes()
            .ok_or(MetainfoError::InvalidField("pieces"))?;
        if pieces.len() % HASH_LEN != 0 {
            return Err(MetainfoError::InvalidPiecesLength(pieces.len()));
        }
        let piece_hashes: Vec<[u8; HASH_LEN]> = pieces
            .chunks_exact(HASH_LEN)
            .map(|chunk| {
                let mut digest = [0u8; HASH_LEN];
                digest.copy_from_slice(chunk);
                digest
            })
            .collect();

        let multi_file = info.contains_key(b"files".as_slice());
        let files = match info.get(b"files".as_slice()) {
            Some(list) => parse_files(&name, list)?,
            None => {
                let length = get_length(info, "length")?
                    .ok_or(MetainfoError::MissingField("length or files"))?;
                vec![FileEntry {
                    path: PathBuf::from(&name),
                    length,
                    offset: 0,
                }]
            }
        };
        let total_length = files
            .iter()
            .try_fold(0u64, |acc, f| acc.checked_add(f.length))
            .ok_or(MetainfoError::InvalidField("length"))?;

        let expected = total_length.div_ceil(piece_length);
        if expected != piece_hashes.len() as u64 {
            return Err(MetainfoError::PieceCountMismatch {
                expected,
                actual: piece_hashes.len(),
            });
        }

        let private = get_int(info, "private")?.is_some_and(|v| v == 1);

        let announce_list = parse_announce_list(dict)?;
        let comment = get_str(dict, "comment")?.map(String::from);
        let created_by = get_str(dict, "created by")?.map(String::from);
        let creation_date = get_int(dict, "creation date")?;

        debug!(
            %name,
            %info_hash,
            pieces = piece_hashes.len(),
            files = files.len(),
            total_length,
            "parsed torrent"
        );

        Ok(Self {
            announce_list,
            comment,
            created_by,
            creation_date,
            name,
            piece_length,
            piece_hashes,
            files,
            total_length,
            multi_file,
            private,
            info_hash,
            raw_info,
        })
    }

    /// Tracker tiers, each an ordered group of fallback URLs.
    pub fn announce_list(&self) -> &[Vec<String>] {
        &self.announce_list
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    /// Unix timestamp when the torrent was created.
    pub fn creation_date(&self) -> Option<i64> {
        self.creation_date
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn piece_length(&self) -> u64 {
        self.piece_length
    }

    pub fn piece_hashes(&self) -> &[[u8; HASH_LEN]] {
        &self.piece_hashes
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// If true, clients should only use trackers listed in the torrent.
    pub fn is_private(&self) -> bool {
        self.private
    }

    pub fn info_hash(&self) -> InfoHash {
        self.info_hash
    }

    /// The canonical bencoding of the `info` dictionary the info hash was
    /// computed over.
    pub fn raw_info(&self) -> &Bytes {
        &self.raw_info
    }

    /// Number of pieces: `ceil(total_length / piece_length)`.
    ///
    /// This is how many bits of a peer's bitfield are meaningful.
    pub fn pieces_count(&self) -> usize {
        self.total_length.div_ceil(self.piece_length) as usize
    }

    /// Returns `true` for torrents built from a `files` list.
    pub fn is_multi_file(&self) -> bool {
        self.multi_file
    }

    /// Size of the piece at `index`; only the last piece may be short.
    pub fn piece_size(&self, index: usize) -> Option<u64> {
        if index >= self.pieces_count() {
            return None;
        }
        let start = index as u64 * self.piece_length;
        Some((self.total_length - start).min(self.piece_length))
    }

    /// Checks downloaded piece data against its SHA-1 digest.
    pub fn verify_piece(&self, index: usize, data: &[u8]) -> bool {
        match self.piece_hashes.get(index) {
            Some(expected) => Sha1::digest(data).as_slice() == expected.as_slice(),
            None => false,
        }
    }

    /// An all-zero bitfield with one bit per piece.
    pub fn empty_bitfield(&self) -> Bitfield {
        Bitfield::new(self.pieces_count())
    }

    /// Splits the piece at `index` into request-sized empty blocks.
    pub fn blocks_for_piece(&self, index: usize) -> Option<Vec<Block>> {
        let piece_index = u32::try_from(index).ok()?;
        let size = u32::try_from(self.piece_size(index)?).ok()?;
        Some(Block::partition(piece_index, size))
    }

    /// Every file with its path resolved under `save_dir`.
    pub fn layout(&self, save_dir: &Path) -> Vec<(PathBuf, u64)> {
        self.files
            .iter()
            .map(|f| (f.resolve(save_dir), f.length))
            .collect()
    }

    /// All tracker URLs in tier order, without duplicates.
    pub fn trackers(&self) -> Vec<&str> {
        let mut trackers: Vec<&str> = Vec::new();
        for url in self.announce_list.iter().flatten() {
            if !trackers.contains(&url.as_str()) {
                trackers.push(url);
            }
        }
        trackers
    }

    /// Flat projection for storing the torrent in a database.
    pub fn record(&self, torrent_path: &Path, save_dir: &Path) -> TorrentRecord {
        TorrentRecord {
            name: self.name.clone(),
            info_hash: self.info_hash.to_hex(),
            torrent_path: torrent_path.to_path_buf(),
            path_to_save: save_dir.to_path_buf(),
            created_by: self.created_by.clone(),
            comment: self.comment.clone(),
            creation_date: self.creation_date,
        }
    }
}

fn get_str<'a>(dict: &'a Dict, key: &'static str) -> Result<Option<&'a str>, MetainfoError> {
    dict.get(key.as_bytes())
        .map(|v| v.as_str().ok_or(MetainfoError::InvalidField(key)))
        .transpose()
}

fn get_int(dict: &Dict, key: &'static str) -> Result<Option<i64>, MetainfoError> {
    dict.get(key.as_bytes())
        .map(|v| v.as_integer().ok_or(MetainfoError::InvalidField(key)))
        .transpose()
}

fn get_length(dict: &Dict, key: &'static str) -> Result<Option<u64>, MetainfoError> {
    match get_int(dict, key)? {
        Some(len) if len < 0 => Err(MetainfoError::InvalidField(key)),
        other => Ok(other.map(|len| len as u64)),
    }
}

fn check_component(component: &str) -> Result<(), MetainfoError> {
    if component.is_empty()
        || component == "."
        || component == ".."
        || component.contains(['/', '\\', '\0'])
    {
        return Err(MetainfoError::InvalidPath(component.to_string()));
    }
    Ok(())
}

fn parse_files(name: &str, value: &Value) -> Result<Vec<FileEntry>, MetainfoError> {
    let list = value
        .as_list()
        .ok_or(MetainfoError::InvalidField("files"))?;

    let mut files = Vec::with_capacity(list.len());
    let mut offset = 0u64;

    for entry in list {
        let entry = entry
            .as_dict()
            .ok_or(MetainfoError::InvalidField("files"))?;

        let length = get_length(entry, "length")?
            .ok_or(MetainfoError::MissingField("file length"))?;

        let components = entry
            .get(b"path".as_slice())
            .ok_or(MetainfoError::MissingField("file path"))?
            .as_list()
            .filter(|c| !c.is_empty())
            .ok_or(MetainfoError::InvalidField("file path"))?;

        let mut path = PathBuf::from(name);
        for component in components {
            let component = component
                .as_str()
                .ok_or(MetainfoError::InvalidField("file path"))?;
            check_component(component)?;
            path.push(component);
        }

        files.push(FileEntry {
            path,
            length,
            offset,
        });
        offset = offset
            .checked_add(length)
            .ok_or(MetainfoError::InvalidField("file length"))?;
    }

    Ok(files)
}

fn parse_announce_list(dict: &Dict) -> Result<Vec<Vec<String>>, MetainfoError> {
    if let Some(tiers) = dict.get(b"announce-list".as_slice()) {
        let tiers = tiers
            .as_list()
            .ok_or(MetainfoError::InvalidField("announce-list"))?;
        return tiers
            .iter()
            .map(|tier| -> Result<Vec<String>, MetainfoError> {
                tier.as_list()
                    .ok_or(MetainfoError::InvalidField("announce-list"))?
                    .iter()
                    .map(|url| {
                        url.as_str()
                            .map(String::from)
                            .ok_or(MetainfoError::InvalidField("announce-list"))
                    })
                    .collect()
            })
            .collect();
    }

    Ok(get_str(dict, "announce")?
        .map(|url| vec![vec![url.to_string()]])
        .unwrap_or_default())
}
