//! Bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format used for `.torrent` files and tracker
//! metadata.
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Examples
//!
//! ```
//! use bitwire::bencode::{decode, encode, Value};
//!
//! let value = decode(b"d3:cow3:moo4:spaml1:a1:bee").unwrap();
//! assert_eq!(value.get(b"cow").and_then(|v| v.as_str()), Some("moo"));
//! assert_eq!(value.get(b"spam").and_then(|v| v.as_list()).map(|l| l.len()), Some(2));
//!
//! // Canonical input survives a round trip byte for byte.
//! assert_eq!(encode(&value), b"d3:cow3:moo4:spaml1:a1:bee");
//! ```
//!
//! # Errors
//!
//! Every grammar violation is a [`BencodeError`]: truncated input, an unknown
//! type prefix, unterminated lists or dictionaries, string lengths running
//! past the buffer, non-canonical integers, non-string or duplicate
//! dictionary keys, trailing bytes and excessive nesting.
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod decode;
mod encode;
mod error;
mod value;

pub use decode::{decode, Decoder};
pub use encode::{encode, encode_into};
pub use error::BencodeError;
pub use value::Value;

#[cfg(test)]
mod tests;
