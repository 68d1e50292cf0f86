//! UDP tracker protocol frames (BEP-15)
//!
//! Every datagram is a fixed big-endian layout:
//!
//! | Frame             | Size      |
//! |-------------------|-----------|
//! | connect request   | 16        |
//! | connect response  | 16        |
//! | announce request  | 98        |
//! | announce response | 20 + 6n   |
//! | scrape request    | 16 + 20n  |
//! | scrape response   | 8 + 12n   |
//! | error response    | 8 + text  |
//!
//! Requests are plain structs. Responses are produced by decoding a datagram
//! or through a builder that refuses to finish until every required field
//! is set, so an encodable response is always complete.
//!
//! The codec surfaces each frame's [`TransactionId`]; matching responses to
//! outstanding requests and retrying timeouts belong to the caller.
//!
//! # Examples
//!
//! ```
//! use bitwire::tracker::{ConnectRequest, ConnectResponse, Response};
//!
//! let request = ConnectRequest::new();
//! assert_eq!(request.encode().len(), 16);
//!
//! let reply = ConnectResponse::builder()
//!     .transaction_id(request.transaction_id)
//!     .connection_id(0x1234)
//!     .build()
//!     .unwrap()
//!     .encode();
//!
//! let response = Response::decode(&reply).unwrap();
//! assert_eq!(response.transaction_id(), request.transaction_id);
//! ```

mod error;
mod response;
mod udp;

pub use error::TrackerError;
pub use response::{
    AnnounceResponse, AnnounceResponseBuilder, ConnectResponse, ConnectResponseBuilder,
    ErrorResponse, ErrorResponseBuilder, Response, ScrapeResponse, ScrapeResponseBuilder,
    ScrapeStats,
};
pub use udp::{AnnounceRequest, ConnectRequest, ScrapeRequest, TrackerEvent, TransactionId};
