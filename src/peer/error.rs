use super::block::BlockState;
use thiserror::Error;

/// Errors produced while framing or decoding peer wire messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    /// The buffer ends before the announced frame does. Not a protocol
    /// violation: buffer more bytes and retry.
    #[error("truncated message: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// The id byte is not in the dispatch table.
    #[error("unknown message id: {0}")]
    UnknownMessageId(u8),

    /// A decoded id or protocol string differs from the expected constant.
    #[error("protocol mismatch: {0}")]
    ProtocolMismatch(String),

    /// The announced length does not fit the message id.
    #[error("invalid length {length} for message id {id}")]
    InvalidLength { id: u8, length: usize },

    /// The announced length exceeds the configured frame limit.
    #[error("message length {length} exceeds limit {max}")]
    MessageTooLarge { length: usize, max: usize },

    /// A port message carried a value wider than 16 bits.
    #[error("invalid port value: {0}")]
    InvalidPort(u32),

    /// A bitfield has the wrong size or sets spare bits.
    #[error("invalid bitfield: {0}")]
    InvalidBitfield(String),

    /// A block was asked to make a transition its state does not allow.
    #[error("block is {found:?}, expected {expected:?}")]
    InvalidBlockState {
        expected: BlockState,
        found: BlockState,
    },

    /// A piece message does not match the block it was offered to.
    #[error("block mismatch: {0}")]
    BlockMismatch(String),
}
