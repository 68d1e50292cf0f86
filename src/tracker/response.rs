use std::net::{Ipv4Addr, SocketAddrV4};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

use super::error::TrackerError;
use super::udp::{ensure_len, expect_action, TransactionId};
use crate::constants::{ACTION_ANNOUNCE, ACTION_CONNECT, ACTION_ERROR, ACTION_SCRAPE};

/// Action plus transaction id, the common prefix of every response.
const RESPONSE_HEADER_LEN: usize = 8;
const COMPACT_PEER_LEN: usize = 6;
const SCRAPE_STATS_LEN: usize = 12;

/// Reads the response header, turning an error response into
/// [`TrackerError::Rejected`]. Returns the body after the header.
fn read_header(
    data: &[u8],
    expected: u32,
    min_len: usize,
) -> Result<(TransactionId, &[u8]), TrackerError> {
    ensure_len(data, RESPONSE_HEADER_LEN)?;
    let mut buf = data;

    let action = buf.get_u32();
    if action == ACTION_ERROR {
        let error = ErrorResponse::decode(data)?;
        return Err(TrackerError::Rejected(error.message));
    }
    expect_action(action, expected)?;
    ensure_len(data, min_len)?;

    Ok((TransactionId(buf.get_u32()), buf))
}

fn required<T>(value: Option<T>, field: &'static str) -> Result<T, TrackerError> {
    value.ok_or(TrackerError::UninitializedField(field))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectResponse {
    transaction_id: TransactionId,
    connection_id: u64,
}

impl ConnectResponse {
    pub const LEN: usize = 16;

    pub fn builder() -> ConnectResponseBuilder {
        ConnectResponseBuilder::default()
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Id to send with announce and scrape requests.
    pub fn connection_id(&self) -> u64 {
        self.connection_id
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::LEN);
        buf.put_u32(ACTION_CONNECT);
        buf.put_u32(self.transaction_id.0);
        buf.put_u64(self.connection_id);
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        let (transaction_id, mut body) = read_header(data, ACTION_CONNECT, Self::LEN)?;
        Ok(Self {
            transaction_id,
            connection_id: body.get_u64(),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConnectResponseBuilder {
    transaction_id: Option<TransactionId>,
    connection_id: Option<u64>,
}

impl ConnectResponseBuilder {
    pub fn transaction_id(mut self, id: impl Into<TransactionId>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn connection_id(mut self, id: u64) -> Self {
        self.connection_id = Some(id);
        self
    }

    pub fn build(self) -> Result<ConnectResponse, TrackerError> {
        Ok(ConnectResponse {
            transaction_id: required(self.transaction_id, "transaction_id")?,
            connection_id: required(self.connection_id, "connection_id")?,
        })
    }
}

/// Announce reply: re-announce interval, swarm counts and compact IPv4 peers.
///
/// # Examples
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddrV4};
/// use bitwire::tracker::{AnnounceResponse, TrackerError, TransactionId};
///
/// let response = AnnounceResponse::builder()
///     .transaction_id(TransactionId(7))
///     .interval(1800)
///     .leechers(3)
///     .seeders(10)
///     .peer(SocketAddrV4::new(Ipv4Addr::new(10, 0, 0, 1), 6881))
///     .build()
///     .unwrap();
/// assert_eq!(response.encode().len(), 26);
///
/// let missing = AnnounceResponse::builder()
///     .transaction_id(TransactionId(7))
///     .build();
/// assert_eq!(missing.unwrap_err(), TrackerError::UninitializedField("interval"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnounceResponse {
    transaction_id: TransactionId,
    interval: u32,
    leechers: u32,
    seeders: u32,
    peers: Vec<SocketAddrV4>,
}

impl AnnounceResponse {
    pub const HEADER_LEN: usize = 20;

    pub fn builder() -> AnnounceResponseBuilder {
        AnnounceResponseBuilder::default()
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    /// Seconds to wait before announcing again.
    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn leechers(&self) -> u32 {
        self.leechers
    }

    pub fn seeders(&self) -> u32 {
        self.seeders
    }

    pub fn peers(&self) -> &[SocketAddrV4] {
        &self.peers
    }

    pub fn encoded_len(&self) -> usize {
        Self::HEADER_LEN + COMPACT_PEER_LEN * self.peers.len()
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32(ACTION_ANNOUNCE);
        buf.put_u32(self.transaction_id.0);
        buf.put_u32(self.interval);
        buf.put_u32(self.leechers);
        buf.put_u32(self.seeders);
        for peer in &self.peers {
            buf.put_slice(&peer.ip().octets());
            buf.put_u16(peer.port());
        }
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        let (transaction_id, mut body) = read_header(data, ACTION_ANNOUNCE, Self::HEADER_LEN)?;
        let interval = body.get_u32();
        let leechers = body.get_u32();
        let seeders = body.get_u32();
        let peers = parse_compact_peers(body)?;
        trace!(%transaction_id, peers = peers.len(), "decoded announce response");

        Ok(Self {
            transaction_id,
            interval,
            leechers,
            seeders,
            peers,
        })
    }
}

fn parse_compact_peers(data: &[u8]) -> Result<Vec<SocketAddrV4>, TrackerError> {
    if data.len() % COMPACT_PEER_LEN != 0 {
        return Err(TrackerError::Malformed(format!(
            "peer list of {} bytes is not a multiple of {COMPACT_PEER_LEN}",
            data.len()
        )));
    }
    Ok(data
        .chunks_exact(COMPACT_PEER_LEN)
        .map(|chunk| {
            let ip = Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
            let port = u16::from_be_bytes([chunk[4], chunk[5]]);
            SocketAddrV4::new(ip, port)
        })
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct AnnounceResponseBuilder {
    transaction_id: Option<TransactionId>,
    interval: Option<u32>,
    leechers: Option<u32>,
    seeders: Option<u32>,
    peers: Vec<SocketAddrV4>,
}

impl AnnounceResponseBuilder {
    pub fn transaction_id(mut self, id: impl Into<TransactionId>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn interval(mut self, seconds: u32) -> Self {
        self.interval = Some(seconds);
        self
    }

    pub fn leechers(mut self, count: u32) -> Self {
        self.leechers = Some(count);
        self
    }

    pub fn seeders(mut self, count: u32) -> Self {
        self.seeders = Some(count);
        self
    }

    pub fn peer(mut self, addr: SocketAddrV4) -> Self {
        self.peers.push(addr);
        self
    }

    pub fn peers(mut self, addrs: impl IntoIterator<Item = SocketAddrV4>) -> Self {
        self.peers.extend(addrs);
        self
    }

    pub fn build(self) -> Result<AnnounceResponse, TrackerError> {
        Ok(AnnounceResponse {
            transaction_id: required(self.transaction_id, "transaction_id")?,
            interval: required(self.interval, "interval")?,
            leechers: required(self.leechers, "leechers")?,
            seeders: required(self.seeders, "seeders")?,
            peers: self.peers,
        })
    }
}

/// Swarm counts for one scraped info hash, in request order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrapeStats {
    pub seeders: u32,
    pub completed: u32,
    pub leechers: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResponse {
    transaction_id: TransactionId,
    stats: Vec<ScrapeStats>,
}

impl ScrapeResponse {
    pub fn builder() -> ScrapeResponseBuilder {
        ScrapeResponseBuilder::default()
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn stats(&self) -> &[ScrapeStats] {
        &self.stats
    }

    pub fn encoded_len(&self) -> usize {
        RESPONSE_HEADER_LEN + SCRAPE_STATS_LEN * self.stats.len()
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        buf.put_u32(ACTION_SCRAPE);
        buf.put_u32(self.transaction_id.0);
        for stats in &self.stats {
            buf.put_u32(stats.seeders);
            buf.put_u32(stats.completed);
            buf.put_u32(stats.leechers);
        }
        buf.freeze()
    }

    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        let (transaction_id, mut body) = read_header(data, ACTION_SCRAPE, RESPONSE_HEADER_LEN)?;
        if body.len() % SCRAPE_STATS_LEN != 0 {
            return Err(TrackerError::Malformed(format!(
                "scrape body of {} bytes is not a multiple of {SCRAPE_STATS_LEN}",
                body.len()
            )));
        }

        let mut stats = Vec::with_capacity(body.len() / SCRAPE_STATS_LEN);
        while body.has_remaining() {
            stats.push(ScrapeStats {
                seeders: body.get_u32(),
                completed: body.get_u32(),
                leechers: body.get_u32(),
            });
        }

        Ok(Self {
            transaction_id,
            stats,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScrapeResponseBuilder {
    transaction_id: Option<TransactionId>,
    stats: Vec<ScrapeStats>,
}

impl ScrapeResponseBuilder {
    pub fn transaction_id(mut self, id: impl Into<TransactionId>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn stats(mut self, stats: ScrapeStats) -> Self {
        self.stats.push(stats);
        self
    }

    pub fn build(self) -> Result<ScrapeResponse, TrackerError> {
        Ok(ScrapeResponse {
            transaction_id: required(self.transaction_id, "transaction_id")?,
            stats: self.stats,
        })
    }
}

/// Action 3: the tracker refused the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    transaction_id: TransactionId,
    message: String,
}

impl ErrorResponse {
    pub fn builder() -> ErrorResponseBuilder {
        ErrorResponseBuilder::default()
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(RESPONSE_HEADER_LEN + self.message.len());
        buf.put_u32(ACTION_ERROR);
        buf.put_u32(self.transaction_id.0);
        buf.put_slice(self.message.as_bytes());
        buf.freeze()
    }

    /// Invalid UTF-8 in the message is replaced rather than rejected.
    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        ensure_len(data, RESPONSE_HEADER_LEN)?;
        let mut buf = data;
        expect_action(buf.get_u32(), ACTION_ERROR)?;
        let transaction_id = TransactionId(buf.get_u32());
        let message = String::from_utf8_lossy(buf).into_owned();
        debug!(%transaction_id, %message, "tracker error response");

        Ok(Self {
            transaction_id,
            message,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ErrorResponseBuilder {
    transaction_id: Option<TransactionId>,
    message: Option<String>,
}

impl ErrorResponseBuilder {
    pub fn transaction_id(mut self, id: impl Into<TransactionId>) -> Self {
        self.transaction_id = Some(id.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn build(self) -> Result<ErrorResponse, TrackerError> {
        Ok(ErrorResponse {
            transaction_id: required(self.transaction_id, "transaction_id")?,
            message: required(self.message, "message")?,
        })
    }
}

/// Any datagram a UDP tracker sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Connect(ConnectResponse),
    Announce(AnnounceResponse),
    Scrape(ScrapeResponse),
    Error(ErrorResponse),
}

impl Response {
    /// Decodes a datagram according to its action field.
    ///
    /// Unlike the per-type decoders, an error response decodes to
    /// [`Response::Error`] instead of failing.
    pub fn decode(data: &[u8]) -> Result<Self, TrackerError> {
        ensure_len(data, RESPONSE_HEADER_LEN)?;
        match (&data[..4]).get_u32() {
            ACTION_CONNECT => ConnectResponse::decode(data).map(Response::Connect),
            ACTION_ANNOUNCE => AnnounceResponse::decode(data).map(Response::Announce),
            ACTION_SCRAPE => ScrapeResponse::decode(data).map(Response::Scrape),
            ACTION_ERROR => ErrorResponse::decode(data).map(Response::Error),
            other => {
                debug!(action = other, "unknown tracker action");
                Err(TrackerError::UnknownAction(other))
            }
        }
    }

    pub fn action(&self) -> u32 {
        match self {
            Response::Connect(_) => ACTION_CONNECT,
            Response::Announce(_) => ACTION_ANNOUNCE,
            Response::Scrape(_) => ACTION_SCRAPE,
            Response::Error(_) => ACTION_ERROR,
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        match self {
            Response::Connect(r) => r.transaction_id(),
            Response::Announce(r) => r.transaction_id(),
            Response::Scrape(r) => r.transaction_id(),
            Response::Error(r) => r.transaction_id(),
        }
    }

    pub fn encode(&self) -> Bytes {
        match self {
            Response::Connect(r) => r.encode(),
            Response::Announce(r) => r.encode(),
            Response::Scrape(r) => r.encode(),
            Response::Error(r) => r.encode(),
        }
    }
}
