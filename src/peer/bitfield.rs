use super::error::PeerError;
use super::message::Message;
use bytes::Bytes;
use tracing::warn;

/// A bitfield representing which pieces a peer has.
///
/// Bits are numbered from the high bit of the first byte: bit 0 of the array
/// is piece 0. Spare bits past the last piece are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
    piece_count: usize,
}

impl Bitfield {
    /// Creates an empty bitfield for the given number of pieces.
    pub fn new(piece_count: usize) -> Self {
        Self {
            bits: vec![0; piece_count.div_ceil(8)],
            piece_count,
        }
    }

    /// Creates a bitfield with every piece set.
    pub fn full(piece_count: usize) -> Self {
        let mut bf = Self {
            bits: vec![0xFF; piece_count.div_ceil(8)],
            piece_count,
        };
        bf.clear_spare_bits();
        bf
    }

    /// Validates a received bitfield payload.
    ///
    /// The payload must be exactly `ceil(piece_count / 8)` bytes with every
    /// spare bit clear; peers sending anything else should be dropped.
    pub fn from_payload(payload: &[u8], piece_count: usize) -> Result<Self, PeerError> {
        let expected = piece_count.div_ceil(8);
        if payload.len() != expected {
            return Err(PeerError::InvalidBitfield(format!(
                "{} bytes for {} pieces, expected {}",
                payload.len(),
                piece_count,
                expected
            )));
        }

        let bf = Self {
            bits: payload.to_vec(),
            piece_count,
        };
        if bf.spare_bits_set() {
            warn!(piece_count, "bitfield has spare bits set");
            return Err(PeerError::InvalidBitfield("spare bits set".into()));
        }
        Ok(bf)
    }

    pub fn has(&self, index: usize) -> bool {
        if index >= self.piece_count {
            return false;
        }
        (self.bits[index / 8] >> (7 - index % 8)) & 1 == 1
    }

    /// Marks a piece as available. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize) {
        if index < self.piece_count {
            self.bits[index / 8] |= 1 << (7 - index % 8);
        }
    }

    pub fn clear(&mut self, index: usize) {
        if index < self.piece_count {
            self.bits[index / 8] &= !(1 << (7 - index % 8));
        }
    }

    /// Number of pieces available.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.count() == self.piece_count
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&b| b == 0)
    }

    pub fn piece_count(&self) -> usize {
        self.piece_count
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    /// Indices of pieces this bitfield has and `ours` lacks.
    pub fn missing_from(&self, ours: &Bitfield) -> Vec<usize> {
        (0..self.piece_count)
            .filter(|&i| self.has(i) && !ours.has(i))
            .collect()
    }

    /// Wraps the bitfield in a wire message.
    pub fn to_message(&self) -> Message {
        Message::Bitfield(Bytes::copy_from_slice(&self.bits))
    }

    fn spare_mask(&self) -> u8 {
        match self.piece_count % 8 {
            0 => 0,
            used => 0xFF >> used,
        }
    }

    fn spare_bits_set(&self) -> bool {
        self.bits
            .last()
            .is_some_and(|&last| last & self.spare_mask() != 0)
    }

    fn clear_spare_bits(&mut self) {
        let mask = self.spare_mask();
        if let Some(last) = self.bits.last_mut() {
            *last &= !mask;
        }
    }
}
