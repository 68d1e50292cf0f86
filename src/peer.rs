//! Peer wire protocol ([BEP-3]).
//!
//! After a 68-byte [`Handshake`], peers exchange length-prefixed
//! [`Message`]s. The [`Dispatcher`] resolves a raw frame to its variant
//! through a fixed id table:
//!
//! | id | message | announced length |
//! |----|---------|------------------|
//! | - | keep-alive | 0 |
//! | 0-3 | choke, unchoke, interested, not interested | 1 |
//! | 4 | have | 5 |
//! | 5 | bitfield | 1 + bitfield bytes |
//! | 6 | request | 13 |
//! | 7 | piece | 9 + block bytes |
//! | 8 | cancel | 13 |
//! | 9 | port | 5 |
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod bitfield;
mod block;
mod dispatch;
mod error;
mod message;
mod peer_id;

pub use bitfield::Bitfield;
pub use block::{Block, BlockState};
pub use dispatch::Dispatcher;
pub use error::PeerError;
pub use message::{Handshake, Message, MessageId};
pub use peer_id::PeerId;

#[cfg(test)]
mod tests;
