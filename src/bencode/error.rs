use thiserror::Error;

/// A violation of the bencode grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BencodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    #[error("invalid string length at offset {0}")]
    InvalidStringLength(usize),

    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("dictionary key at offset {0} is not a byte string")]
    NonStringKey(usize),

    #[error("duplicate dictionary key: {0}")]
    DuplicateKey(String),

    #[error("trailing data at offset {0}")]
    TrailingData(usize),

    #[error("nesting deeper than {0} levels")]
    NestingTooDeep(usize),
}
