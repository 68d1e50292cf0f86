use super::error::PeerError;
use super::message::{Message, MessageId};
use crate::config::CodecLimits;
use crate::constants::LENGTH_PREFIX_LEN;
use bytes::{Buf, Bytes, BytesMut};
use tracing::{debug, trace};

/// Decodes the payload that follows a message id.
type PayloadDecoder = fn(&[u8]) -> Result<Message, PeerError>;

/// Payload decoders indexed by message id.
const DECODERS: [PayloadDecoder; 10] = [
    decode_choke,
    decode_unchoke,
    decode_interested,
    decode_not_interested,
    decode_have,
    decode_bitfield,
    decode_request,
    decode_piece,
    decode_cancel,
    decode_port,
];

/// Resolves length-prefixed frames to [`Message`] variants.
///
/// The dispatcher reads the 4-byte length, then (for a nonzero length) the id
/// byte, and hands the payload to the decoder registered for that id. It
/// never reads past the announced length.
///
/// # Examples
///
/// ```
/// use bitwire::peer::{Dispatcher, Message};
/// use bytes::BytesMut;
///
/// let dispatcher = Dispatcher::default();
/// let mut buf = BytesMut::new();
/// buf.extend_from_slice(&Message::Interested.encode());
/// buf.extend_from_slice(&Message::Have { piece_index: 7 }.encode()[..6]);
///
/// assert_eq!(dispatcher.next_frame(&mut buf).unwrap(), Some(Message::Interested));
/// // The `have` frame is incomplete, so nothing is consumed.
/// assert_eq!(dispatcher.next_frame(&mut buf).unwrap(), None);
/// assert_eq!(buf.len(), 6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    max_message_len: usize,
}

/// One frame located at the front of a buffer.
struct Frame<'a> {
    /// Bytes the frame occupies, length prefix included.
    len: usize,
    id: Option<u8>,
    payload: &'a [u8],
}

impl Dispatcher {
    pub fn with_limits(limits: &CodecLimits) -> Self {
        Self {
            max_message_len: limits.max_message_len,
        }
    }

    /// Decodes the frame at the front of `data`.
    pub fn dispatch(&self, data: &[u8]) -> Result<Message, PeerError> {
        self.decode_frame(data).map(|(message, _)| message)
    }

    /// Decodes the frame at the front of `data` and returns it together with
    /// the number of bytes it occupied.
    pub fn decode_frame(&self, data: &[u8]) -> Result<(Message, usize), PeerError> {
        let frame = self.split(data)?;
        let Some(id) = frame.id else {
            return Ok((Message::KeepAlive, frame.len));
        };

        let decoder = DECODERS.get(id as usize).ok_or_else(|| {
            debug!(id, "unknown peer message id");
            PeerError::UnknownMessageId(id)
        })?;
        let message = decoder(frame.payload)?;
        Ok((message, frame.len))
    }

    /// Like [`dispatch`](Self::dispatch), but fails with
    /// [`PeerError::ProtocolMismatch`] unless the frame carries `expected`.
    pub fn dispatch_as(&self, expected: MessageId, data: &[u8]) -> Result<Message, PeerError> {
        let frame = self.split(data)?;
        if frame.id != Some(expected as u8) {
            let found = frame
                .id
                .map_or_else(|| "keep-alive".to_string(), |id| format!("id {id}"));
            return Err(PeerError::ProtocolMismatch(format!(
                "expected {expected:?} (id {}), found {found}",
                expected as u8
            )));
        }
        DECODERS[expected as usize](frame.payload)
    }

    /// Splits the next complete message off a receive buffer.
    ///
    /// Returns `Ok(None)` without consuming anything when the buffer does not
    /// yet hold a whole frame.
    pub fn next_frame(&self, buf: &mut BytesMut) -> Result<Option<Message>, PeerError> {
        match self.decode_frame(buf) {
            Ok((message, used)) => {
                buf.advance(used);
                Ok(Some(message))
            }
            Err(PeerError::Truncated { needed, available }) => {
                trace!(needed, available, "partial peer frame");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn split<'a>(&self, data: &'a [u8]) -> Result<Frame<'a>, PeerError> {
        if data.len() < LENGTH_PREFIX_LEN {
            return Err(PeerError::Truncated {
                needed: LENGTH_PREFIX_LEN,
                available: data.len(),
            });
        }

        let length = (&data[..LENGTH_PREFIX_LEN]).get_u32() as usize;
        if length > self.max_message_len {
            return Err(PeerError::MessageTooLarge {
                length,
                max: self.max_message_len,
            });
        }

        let total = LENGTH_PREFIX_LEN + length;
        if data.len() < total {
            return Err(PeerError::Truncated {
                needed: total,
                available: data.len(),
            });
        }

        if length == 0 {
            return Ok(Frame {
                len: total,
                id: None,
                payload: &[],
            });
        }

        Ok(Frame {
            len: total,
            id: Some(data[LENGTH_PREFIX_LEN]),
            payload: &data[LENGTH_PREFIX_LEN + 1..total],
        })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_limits(&CodecLimits::default())
    }
}

fn expect_len(id: MessageId, payload: &[u8], len: usize) -> Result<(), PeerError> {
    if payload.len() != len {
        return Err(PeerError::InvalidLength {
            id: id as u8,
            length: payload.len() + 1,
        });
    }
    Ok(())
}

fn decode_choke(payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::Choke, payload, 0)?;
    Ok(Message::Choke)
}

fn decode_unchoke(payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::Unchoke, payload, 0)?;
    Ok(Message::Unchoke)
}

fn decode_interested(payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::Interested, payload, 0)?;
    Ok(Message::Interested)
}

fn decode_not_interested(payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::NotInterested, payload, 0)?;
    Ok(Message::NotInterested)
}

fn decode_have(mut payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::Have, payload, 4)?;
    Ok(Message::Have {
        piece_index: payload.get_u32(),
    })
}

fn decode_bitfield(payload: &[u8]) -> Result<Message, PeerError> {
    Ok(Message::Bitfield(Bytes::copy_from_slice(payload)))
}

fn decode_request(mut payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::Request, payload, 12)?;
    Ok(Message::Request {
        piece_index: payload.get_u32(),
        block_offset: payload.get_u32(),
        block_length: payload.get_u32(),
    })
}

fn decode_piece(mut payload: &[u8]) -> Result<Message, PeerError> {
    if payload.len() < 8 {
        return Err(PeerError::InvalidLength {
            id: MessageId::Piece as u8,
            length: payload.len() + 1,
        });
    }
    let piece_index = payload.get_u32();
    let block_offset = payload.get_u32();
    Ok(Message::Piece {
        piece_index,
        block_offset,
        block: Bytes::copy_from_slice(payload),
    })
}

fn decode_cancel(mut payload: &[u8]) -> Result<Message, PeerError> {
    expect_len(MessageId::Cancel, payload, 12)?;
    Ok(Message::Cancel {
        piece_index: payload.get_u32(),
        block_offset: payload.get_u32(),
        block_length: payload.get_u32(),
    })
}

/// Accepts the zero-extended 4-byte form this crate writes as well as the
/// 2-byte form of BEP-5.
fn decode_port(mut payload: &[u8]) -> Result<Message, PeerError> {
    let listen_port = match payload.len() {
        2 => payload.get_u16(),
        4 => {
            let wide = payload.get_u32();
            u16::try_from(wide).map_err(|_| PeerError::InvalidPort(wide))?
        }
        len => {
            return Err(PeerError::InvalidLength {
                id: MessageId::Port as u8,
                length: len + 1,
            })
        }
    };
    Ok(Message::Port { listen_port })
}
