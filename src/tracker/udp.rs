use std::fmt;
use std::net::Ipv4Addr;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use rand::Rng as _;

use super::error::TrackerError;
use crate::config::CodecLimits;
use crate::constants::{
    ACTION_ANNOUNCE, ACTION_CONNECT, ACTION_SCRAPE, HASH_LEN, NUM_WANT_DEFAULT, UDP_PROTOCOL_ID,
};

/// Request identifier echoed back by the tracker.
///
/// Responses carry the id of the request they answer; comparing it with the
/// outstanding request is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId(pub u32);

impl TransactionId {
    pub fn random() -> Self {
        Self(rand::rng().random())
    }
}

impl From<u32> for TransactionId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerEvent {
    #[default]
    None,
    Started,
    Stopped,
    Completed,
}

impl TrackerEvent {
    pub fn as_udp_id(&self) -> u32 {
        match self {
            TrackerEvent::None => 0,
            TrackerEvent::Completed => 1,
            TrackerEvent::Started => 2,
            TrackerEvent::Stopped => 3,
        }
    }
}

impl TryFrom<u32> for TrackerEvent {
    type Error = TrackerError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            0 => Ok(TrackerEvent::None),
            1 => Ok(TrackerEvent::Completed),
            2 => Ok(TrackerEvent::Started),
            3 => Ok(TrackerEvent::Stopped),
            other => Err(TrackerError::UnknownEvent(other)),
        }
    }
}

/// First datagram of a tracker exchange: magic, action 0, transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest {
    pub transaction_id: TransactionId,
}

impl ConnectRequest {
    pub const LEN: usize = 16;

    /// A request with a fresh random transaction id.
    pub fn new() -> Self {
        Self {
            transaction_id: TransactionId::random(),
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::LEN);
        buf.put_u64(UDP_PROTOCOL_ID);
        buf.put_u32(ACTION_CONNECT);
        buf.put_u32(self.transaction_id.0);
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        ensure_len(data, Self::LEN)?;
        let mut buf = data;

        let magic = buf.get_u64();
        if magic != UDP_PROTOCOL_ID {
            return Err(TrackerError::ProtocolMismatch(format!(
                "connect magic {magic:#x}, expected {UDP_PROTOCOL_ID:#x}"
            )));
        }
        expect_action(buf.get_u32(), ACTION_CONNECT)?;

        Ok(Self {
            transaction_id: TransactionId(buf.get_u32()),
        })
    }
}

impl Default for ConnectRequest {
    fn default() -> Self {
        Self::new()
    }
}

/// Announce (action 1), sent with the connection id from a connect response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceRequest {
    pub connection_id: u64,
    pub transaction_id: TransactionId,
    pub info_hash: [u8; HASH_LEN],
    pub peer_id: [u8; HASH_LEN],
    pub downloaded: u64,
    pub left: u64,
    pub uploaded: u64,
    pub event: TrackerEvent,
    /// `0.0.0.0` lets the tracker use the datagram's source address.
    pub ip: Ipv4Addr,
    pub key: u32,
    /// Negative asks for the tracker's default.
    pub num_want: i32,
    pub port: u16,
}

impl AnnounceRequest {
    pub const LEN: usize = 98;

    /// A request with random transaction id and key, no event, zeroed
    /// transfer counters and the tracker's default peer count.
    pub fn new(
        connection_id: u64,
        info_hash: [u8; HASH_LEN],
        peer_id: [u8; HASH_LEN],
        port: u16,
    ) -> Self {
        Self {
            connection_id,
            transaction_id: TransactionId::random(),
            info_hash,
            peer_id,
            downloaded: 0,
            left: 0,
            uploaded: 0,
            event: TrackerEvent::None,
            ip: Ipv4Addr::UNSPECIFIED,
            key: rand::rng().random(),
            num_want: NUM_WANT_DEFAULT,
            port,
        }
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::LEN);
        buf.put_u64(self.connection_id);
        buf.put_u32(ACTION_ANNOUNCE);
        buf.put_u32(self.transaction_id.0);
        buf.put_slice(&self.info_hash);
        buf.put_slice(&self.peer_id);
        buf.put_u64(self.downloaded);
        buf.put_u64(self.left);
        buf.put_u64(self.uploaded);
        buf.put_u32(self.event.as_udp_id());
        buf.put_u32(u32::from(self.ip));
        buf.put_u32(self.key);
        buf.put_i32(self.num_want);
        buf.put_u16(self.port);
        buf.freeze()
    }

    /// Decodes the 98-byte request. BEP-41 options after it are ignored.
    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        ensure_len(data, Self::LEN)?;
        let mut buf = data;

        let connection_id = buf.get_u64();
        expect_action(buf.get_u32(), ACTION_ANNOUNCE)?;
        let transaction_id = TransactionId(buf.get_u32());

        let mut info_hash = [0u8; HASH_LEN];
        buf.copy_to_slice(&mut info_hash);
        let mut peer_id = [0u8; HASH_LEN];
        buf.copy_to_slice(&mut peer_id);

        Ok(Self {
            connection_id,
            transaction_id,
            info_hash,
            peer_id,
            downloaded: buf.get_u64(),
            left: buf.get_u64(),
            uploaded: buf.get_u64(),
            event: TrackerEvent::try_from(buf.get_u32())?,
            ip: Ipv4Addr::from(buf.get_u32()),
            key: buf.get_u32(),
            num_want: buf.get_i32(),
            port: buf.get_u16(),
        })
    }
}

/// Scrape (action 2) for one or more info hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub connection_id: u64,
    pub transaction_id: TransactionId,
    pub info_hashes: Vec<[u8; HASH_LEN]>,
}

impl ScrapeRequest {
    pub const HEADER_LEN: usize = 16;

    pub fn new(connection_id: u64, info_hashes: Vec<[u8; HASH_LEN]>) -> Self {
        Self {
            connection_id,
            transaction_id: TransactionId::random(),
            info_hashes,
        }
    }

    pub fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + HASH_LEN * self.info_hashes.len()
    }

    /// Encodes with the default scrape limit.
    pub fn encode(&self) -> Result<Bytes, TrackerError> {
        self.encode_with(&CodecLimits::default())
    }

    /// Fails with [`TrackerError::TooManyHashes`] when the request would
    /// carry more hashes than `limits` allows.
    pub fn encode_with(&self, limits: &CodecLimits) -> Result<Bytes, TrackerError> {
        if self.info_hashes.len() > limits.max_scrape_hashes {
            return Err(TrackerError::TooManyHashes {
                count: self.info_hashes.len(),
                max: limits.max_scrape_hashes,
            });
        }

        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u64(self.connection_id);
        buf.put_u32(ACTION_SCRAPE);
        buf.put_u32(self.transaction_id.0);
        for info_hash in &self.info_hashes {
            buf.put_slice(info_hash);
        }
        Ok(buf.freeze())
    }

    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        ensure_len(data, Self::HEADER_LEN)?;
        let mut buf = data;

        let connection_id = buf.get_u64();
        expect_action(buf.get_u32(), ACTION_SCRAPE)?;
        let transaction_id = TransactionId(buf.get_u32());

        if buf.len() % HASH_LEN != 0 {
            return Err(TrackerError::Malformed(format!(
                "scrape request carries {} trailing bytes, not a multiple of {HASH_LEN}",
                buf.len()
            )));
        }

        let mut info_hashes = Vec::with_capacity(buf.len() / HASH_LEN);
        while buf.has_remaining() {
            let mut info_hash = [0u8; HASH_LEN];
            buf.copy_to_slice(&mut info_hash);
            info_hashes.push(info_hash);
        }

        Ok(Self {
            connection_id,
            transaction_id,
            info_hashes,
        })
    }
}

pub(super) fn ensure_len(data: &[u8], needed: usize) -> Result<(), TrackerError> {
    if data.len() < needed {
        return Err(TrackerError::Truncated {
            needed,
            available: data.len(),
        });
    }
    Ok(())
}

pub(super) fn expect_action(found: u32, expected: u32) -> Result<(), TrackerError> {
    if found != expected {
        return Err(TrackerError::ProtocolMismatch(format!(
            "action {found}, expected {expected}"
        )));
    }
    Ok(())
}
