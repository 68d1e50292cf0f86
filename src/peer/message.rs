use super::dispatch::Dispatcher;
use super::error::PeerError;
use crate::constants::{HANDSHAKE_LEN, HASH_LEN, LENGTH_PREFIX_LEN, PROTOCOL};
use bytes::{BufMut, Bytes, BytesMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageId {
    Choke = 0,
    Unchoke = 1,
    Interested = 2,
    NotInterested = 3,
    Have = 4,
    Bitfield = 5,
    Request = 6,
    Piece = 7,
    Cancel = 8,
    Port = 9,
}

impl MessageId {
    /// Announced length (id byte plus payload) of fixed-size messages.
    pub fn fixed_len(self) -> Option<usize> {
        match self {
            MessageId::Choke
            | MessageId::Unchoke
            | MessageId::Interested
            | MessageId::NotInterested => Some(1),
            MessageId::Have | MessageId::Port => Some(5),
            MessageId::Request | MessageId::Cancel => Some(13),
            MessageId::Bitfield | MessageId::Piece => None,
        }
    }
}

impl TryFrom<u8> for MessageId {
    type Error = PeerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MessageId::Choke),
            1 => Ok(MessageId::Unchoke),
            2 => Ok(MessageId::Interested),
            3 => Ok(MessageId::NotInterested),
            4 => Ok(MessageId::Have),
            5 => Ok(MessageId::Bitfield),
            6 => Ok(MessageId::Request),
            7 => Ok(MessageId::Piece),
            8 => Ok(MessageId::Cancel),
            9 => Ok(MessageId::Port),
            _ => Err(PeerError::UnknownMessageId(value)),
        }
    }
}

/// The first message on every peer connection.
///
/// Layout: `pstrlen(19) | "BitTorrent protocol" | reserved(8) | info_hash(20)
/// | peer_id(20)`, 68 bytes with no length prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub info_hash: [u8; HASH_LEN],
    pub peer_id: [u8; HASH_LEN],
    /// Extension bits; all zero for handshakes this crate creates.
    pub reserved: [u8; 8],
}

impl Handshake {
    pub fn new(info_hash: [u8; HASH_LEN], peer_id: [u8; HASH_LEN]) -> Self {
        Self {
            info_hash,
            peer_id,
            reserved: [0u8; 8],
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HANDSHAKE_LEN);
        buf.put_u8(PROTOCOL.len() as u8);
        buf.put_slice(PROTOCOL);
        buf.put_slice(&self.reserved);
        buf.put_slice(&self.info_hash);
        buf.put_slice(&self.peer_id);
        buf.freeze()
    }

    /// Decodes a handshake from the front of `data`; bytes past the first
    /// 68 are left for the message decoder.
    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        if data.len() < HANDSHAKE_LEN {
            return Err(PeerError::Truncated {
                needed: HANDSHAKE_LEN,
                available: data.len(),
            });
        }

        if data[0] as usize != PROTOCOL.len() || &data[1..20] != PROTOCOL {
            return Err(PeerError::ProtocolMismatch(format!(
                "handshake protocol {:?}",
                String::from_utf8_lossy(&data[1..20])
            )));
        }

        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&data[20..28]);

        let mut info_hash = [0u8; HASH_LEN];
        info_hash.copy_from_slice(&data[28..48]);

        let mut peer_id = [0u8; HASH_LEN];
        peer_id.copy_from_slice(&data[48..68]);

        Ok(Self {
            info_hash,
            peer_id,
            reserved,
        })
    }
}

/// A framed peer wire message.
///
/// Every message is `length(4, big-endian) | id(1) | payload`, where the
/// length counts everything after itself. `KeepAlive` is a bare zero length.
///
/// # Examples
///
/// ```
/// use bitwire::peer::Message;
///
/// let request = Message::Request {
///     piece_index: 3,
///     block_offset: 0,
///     block_length: 16384,
/// };
/// let bytes = request.encode();
/// assert_eq!(bytes.len(), 17);
/// assert_eq!(bytes[4], 6);
/// assert_eq!(&bytes[5..9], &3u32.to_be_bytes());
///
/// assert_eq!(Message::decode(&bytes).unwrap(), request);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    KeepAlive,
    Choke,
    Unchoke,
    Interested,
    NotInterested,
    Have {
        piece_index: u32,
    },
    /// Raw bitfield bytes, spare bits included, exactly as sent. Validate
    /// against a piece count with [`Bitfield::from_payload`](super::Bitfield::from_payload).
    Bitfield(Bytes),
    Request {
        piece_index: u32,
        block_offset: u32,
        block_length: u32,
    },
    Piece {
        piece_index: u32,
        block_offset: u32,
        block: Bytes,
    },
    Cancel {
        piece_index: u32,
        block_offset: u32,
        block_length: u32,
    },
    /// DHT listen port. Sent zero-extended in a 4-byte field.
    Port {
        listen_port: u16,
    },
}

impl Message {
    /// The dispatch id, or `None` for keep-alive.
    pub fn id(&self) -> Option<MessageId> {
        Some(match self {
            Message::KeepAlive => return None,
            Message::Choke => MessageId::Choke,
            Message::Unchoke => MessageId::Unchoke,
            Message::Interested => MessageId::Interested,
            Message::NotInterested => MessageId::NotInterested,
            Message::Have { .. } => MessageId::Have,
            Message::Bitfield(_) => MessageId::Bitfield,
            Message::Request { .. } => MessageId::Request,
            Message::Piece { .. } => MessageId::Piece,
            Message::Cancel { .. } => MessageId::Cancel,
            Message::Port { .. } => MessageId::Port,
        })
    }

    /// Total encoded size including the length prefix.
    pub fn encoded_len(&self) -> usize {
        LENGTH_PREFIX_LEN + self.body_len()
    }

    fn body_len(&self) -> usize {
        match self {
            Message::KeepAlive => 0,
            Message::Bitfield(bits) => 1 + bits.len(),
            Message::Piece { block, .. } => 9 + block.len(),
            other => other
                .id()
                .and_then(MessageId::fixed_len)
                .unwrap_or_default(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Appends the framed message to `buf`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_u32(self.body_len() as u32);
        let Some(id) = self.id() else {
            return;
        };
        buf.put_u8(id as u8);

        match self {
            Message::KeepAlive
            | Message::Choke
            | Message::Unchoke
            | Message::Interested
            | Message::NotInterested => {}
            Message::Have { piece_index } => buf.put_u32(*piece_index),
            Message::Bitfield(bits) => buf.put_slice(bits),
            Message::Request {
                piece_index,
                block_offset,
                block_length,
            }
            | Message::Cancel {
                piece_index,
                block_offset,
                block_length,
            } => {
                buf.put_u32(*piece_index);
                buf.put_u32(*block_offset);
                buf.put_u32(*block_length);
            }
            Message::Piece {
                piece_index,
                block_offset,
                block,
            } => {
                buf.put_u32(*piece_index);
                buf.put_u32(*block_offset);
                buf.put_slice(block);
            }
            Message::Port { listen_port } => buf.put_u32(u32::from(*listen_port)),
        }
    }

    /// Decodes the frame at the front of `data` with the default dispatcher.
    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        Dispatcher::default().dispatch(data)
    }

    /// Decodes the frame at the front of `data`, requiring it to carry
    /// `expected`; any other id fails with [`PeerError::ProtocolMismatch`].
    pub fn decode_as(expected: MessageId, data: &[u8]) -> Result<Self, PeerError> {
        Dispatcher::default().dispatch_as(expected, data)
    }
}
