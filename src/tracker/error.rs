use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    #[error("truncated datagram: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    #[error("malformed datagram: {0}")]
    Malformed(String),

    #[error("unknown action: {0}")]
    UnknownAction(u32),

    #[error("unknown announce event: {0}")]
    UnknownEvent(u32),

    /// The tracker answered with an error response.
    #[error("tracker returned error: {0}")]
    Rejected(String),

    #[error("field not set: {0}")]
    UninitializedField(&'static str),

    #[error("scrape of {count} info hashes exceeds limit {max}")]
    TooManyHashes { count: usize, max: usize },
}
