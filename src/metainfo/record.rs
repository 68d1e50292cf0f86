use std::path::PathBuf;

/// The flat projection of a torrent that a persistence layer stores.
///
/// Produced by [`TorrentMetadata::record`](super::TorrentMetadata::record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorrentRecord {
    pub name: String,
    /// Hex-encoded info hash.
    pub info_hash: String,
    /// Where the `.torrent` file was loaded from.
    pub torrent_path: PathBuf,
    /// Directory the content is saved under.
    pub path_to_save: PathBuf,
    pub created_by: Option<String>,
    pub comment: Option<String>,
    pub creation_date: Option<i64>,
}

impl TorrentRecord {
    /// Returns the record as ordered `(column, value)` pairs, skipping
    /// absent optional values.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("info_hash", self.info_hash.clone()),
            ("torrent_path", self.torrent_path.display().to_string()),
            ("path_to_save", self.path_to_save.display().to_string()),
        ];
        if let Some(created_by) = &self.created_by {
            fields.push(("created_by", created_by.clone()));
        }
        if let Some(comment) = &self.comment {
            fields.push(("comment", comment.clone()));
        }
        if let Some(date) = self.creation_date {
            fields.push(("creation_date", date.to_string()));
        }
        fields
    }
}
