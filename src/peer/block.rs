use super::error::PeerError;
use super::message::Message;
use crate::constants::BLOCK_SIZE;
use bytes::Bytes;
use std::time::{Duration, Instant};

/// Where a block is in its request cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// Not requested yet, or its request timed out.
    Empty,
    /// A `request` was sent and the `piece` has not arrived.
    Pending,
    /// The data arrived.
    Full,
}

/// A request-sized slice of a piece.
///
/// Owned and driven by whichever scheduler tracks in-flight requests; the
/// codec only produces and consumes the `request`, `piece` and `cancel`
/// messages that correlate with these transitions:
///
/// ```text
/// Empty --request--> Pending --piece--> Full
///   ^                   |
///   +-----timeout-------+
/// ```
#[derive(Debug, Clone)]
pub struct Block {
    piece_index: u32,
    offset: u32,
    size: u32,
    state: BlockState,
    data: Bytes,
    last_sent: Option<Instant>,
}

impl Block {
    pub fn new(piece_index: u32, offset: u32, size: u32) -> Self {
        Self {
            piece_index,
            offset,
            size,
            state: BlockState::Empty,
            data: Bytes::new(),
            last_sent: None,
        }
    }

    /// Splits a piece into [`BLOCK_SIZE`] blocks; the last one takes the
    /// remainder.
    pub fn partition(piece_index: u32, piece_size: u32) -> Vec<Block> {
        (0..piece_size)
            .step_by(BLOCK_SIZE as usize)
            .map(|offset| {
                let size = (piece_size - offset).min(BLOCK_SIZE);
                Block::new(piece_index, offset, size)
            })
            .collect()
    }

    pub fn piece_index(&self) -> u32 {
        self.piece_index
    }

    /// Byte offset within the piece.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    /// The received data; empty until the block is full.
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// When the request for this block was last sent.
    pub fn last_sent(&self) -> Option<Instant> {
        self.last_sent
    }

    pub fn request_message(&self) -> Message {
        Message::Request {
            piece_index: self.piece_index,
            block_offset: self.offset,
            block_length: self.size,
        }
    }

    pub fn cancel_message(&self) -> Message {
        Message::Cancel {
            piece_index: self.piece_index,
            block_offset: self.offset,
            block_length: self.size,
        }
    }

    /// Empty -> Pending. Returns the `request` to send.
    pub fn mark_requested(&mut self, now: Instant) -> Result<Message, PeerError> {
        self.expect_state(BlockState::Empty)?;
        self.state = BlockState::Pending;
        self.last_sent = Some(now);
        Ok(self.request_message())
    }

    /// Pending -> Full, if `message` is the `piece` answering this block.
    pub fn accept(&mut self, message: &Message) -> Result<(), PeerError> {
        self.expect_state(BlockState::Pending)?;

        let Message::Piece {
            piece_index,
            block_offset,
            block,
        } = message
        else {
            return Err(PeerError::BlockMismatch(format!(
                "expected a piece message, got {:?}",
                message.id()
            )));
        };

        if (*piece_index, *block_offset) != (self.piece_index, self.offset) {
            return Err(PeerError::BlockMismatch(format!(
                "piece {piece_index} offset {block_offset} does not match piece {} offset {}",
                self.piece_index, self.offset
            )));
        }
        if block.len() != self.size as usize {
            return Err(PeerError::BlockMismatch(format!(
                "got {} bytes, expected {}",
                block.len(),
                self.size
            )));
        }

        self.data = block.clone();
        self.state = BlockState::Full;
        Ok(())
    }

    /// Pending -> Empty, for a request the scheduler gave up on.
    pub fn reset(&mut self) -> Result<(), PeerError> {
        self.expect_state(BlockState::Pending)?;
        self.state = BlockState::Empty;
        self.last_sent = None;
        Ok(())
    }

    /// Returns `true` if the block has been pending for at least `timeout`.
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        match (self.state, self.last_sent) {
            (BlockState::Pending, Some(sent)) => now.saturating_duration_since(sent) >= timeout,
            _ => false,
        }
    }

    fn expect_state(&self, expected: BlockState) -> Result<(), PeerError> {
        if self.state != expected {
            return Err(PeerError::InvalidBlockState {
                expected,
                found: self.state,
            });
        }
        Ok(())
    }
}
