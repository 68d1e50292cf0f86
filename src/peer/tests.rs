use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};

use super::*;
use crate::config::CodecLimits;

#[test]
fn test_handshake_layout() {
    let handshake = Handshake::new([1u8; 20], [2u8; 20]);
    let encoded = handshake.encode();

    assert_eq!(encoded.len(), 68);
    assert_eq!(encoded[0], 19);
    assert_eq!(&encoded[1..20], b"BitTorrent protocol");
    assert_eq!(&encoded[20..28], &[0u8; 8]);
    assert_eq!(&encoded[28..48], &[1u8; 20]);
    assert_eq!(&encoded[48..68], &[2u8; 20]);

    assert_eq!(Handshake::decode(&encoded).unwrap(), handshake);
}

#[test]
fn test_handshake_errors() {
    let encoded = Handshake::new([1u8; 20], [2u8; 20]).encode();
    assert_eq!(
        Handshake::decode(&encoded[..40]),
        Err(PeerError::Truncated {
            needed: 68,
            available: 40
        })
    );

    let mut wrong = encoded.to_vec();
    wrong[1] = b'b';
    assert!(matches!(
        Handshake::decode(&wrong),
        Err(PeerError::ProtocolMismatch(_))
    ));
}

#[test]
fn test_fixed_messages_roundtrip_with_table_lengths() {
    let cases = [
        (Message::KeepAlive, 4),
        (Message::Choke, 5),
        (Message::Unchoke, 5),
        (Message::Interested, 5),
        (Message::NotInterested, 5),
        (Message::Have { piece_index: 42 }, 9),
        (
            Message::Request {
                piece_index: 1,
                block_offset: 16384,
                block_length: 16384,
            },
            17,
        ),
        (
            Message::Cancel {
                piece_index: 1,
                block_offset: 0,
                block_length: 16384,
            },
            17,
        ),
        (Message::Port { listen_port: 6881 }, 9),
    ];

    let dispatcher = Dispatcher::default();
    for (message, total) in cases {
        let encoded = message.encode();
        assert_eq!(encoded.len(), total, "{message:?}");
        assert_eq!(message.encoded_len(), total);

        let (decoded, used) = dispatcher.decode_frame(&encoded).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(used, total);
    }
}

#[test]
fn test_request_layout() {
    let encoded = Message::Request {
        piece_index: 3,
        block_offset: 0,
        block_length: 16384,
    }
    .encode();

    assert_eq!(encoded.len(), 17);
    assert_eq!(&encoded[..4], &13u32.to_be_bytes());
    assert_eq!(encoded[4], 6);
    assert_eq!(&encoded[5..9], &3u32.to_be_bytes());
    assert_eq!(&encoded[9..13], &0u32.to_be_bytes());
    assert_eq!(&encoded[13..17], &16384u32.to_be_bytes());
}

#[test]
fn test_port_is_zero_extended() {
    let encoded = Message::Port { listen_port: 0x1AE1 }.encode();
    assert_eq!(&encoded[..], &[0, 0, 0, 5, 9, 0, 0, 0x1A, 0xE1]);

    // Two-byte form from other clients.
    let short = [0, 0, 0, 3, 9, 0x1A, 0xE1];
    assert_eq!(
        Message::decode(&short).unwrap(),
        Message::Port { listen_port: 6881 }
    );

    let too_wide = [0, 0, 0, 5, 9, 0, 1, 0, 0];
    assert_eq!(Message::decode(&too_wide), Err(PeerError::InvalidPort(65536)));
}

#[test]
fn test_bitfield_preserves_bits() {
    let raw = Bytes::from_static(&[0b1010_0000, 0b0000_0111]);
    let message = Message::Bitfield(raw.clone());
    let encoded = message.encode();

    assert_eq!(encoded.len(), 5 + 2);
    assert_eq!(&encoded[..5], &[0, 0, 0, 3, 5]);
    assert_eq!(Message::decode(&encoded).unwrap(), Message::Bitfield(raw));
}

#[test]
fn test_piece_message() {
    let block = Bytes::from_static(b"hello world");
    let message = Message::Piece {
        piece_index: 2,
        block_offset: 16384,
        block: block.clone(),
    };

    let encoded = message.encode();
    assert_eq!(encoded.len(), 13 + block.len());
    assert_eq!(&encoded[..4], &(9 + block.len() as u32).to_be_bytes());
    assert_eq!(Message::decode(&encoded).unwrap(), message);

    let empty = Message::Piece {
        piece_index: 0,
        block_offset: 0,
        block: Bytes::new(),
    };
    assert_eq!(Message::decode(&empty.encode()).unwrap(), empty);
}

#[test]
fn test_truncated_frames() {
    let encoded = Message::Have { piece_index: 9 }.encode();

    assert_eq!(
        Message::decode(&encoded[..2]),
        Err(PeerError::Truncated {
            needed: 4,
            available: 2
        })
    );
    assert_eq!(
        Message::decode(&encoded[..7]),
        Err(PeerError::Truncated {
            needed: 9,
            available: 7
        })
    );
}

#[test]
fn test_unknown_message_id() {
    let frame = [0, 0, 0, 1, 99];
    assert_eq!(Message::decode(&frame), Err(PeerError::UnknownMessageId(99)));

    // Fast extension ids are not part of this table.
    let frame = [0, 0, 0, 1, 14];
    assert_eq!(Message::decode(&frame), Err(PeerError::UnknownMessageId(14)));
    assert_eq!(MessageId::try_from(10), Err(PeerError::UnknownMessageId(10)));
}

#[test]
fn test_invalid_fixed_lengths() {
    let choke_with_payload = [0, 0, 0, 2, 0, 0];
    assert_eq!(
        Message::decode(&choke_with_payload),
        Err(PeerError::InvalidLength { id: 0, length: 2 })
    );

    let short_have = [0, 0, 0, 3, 4, 0, 0];
    assert_eq!(
        Message::decode(&short_have),
        Err(PeerError::InvalidLength { id: 4, length: 3 })
    );

    let short_piece = [0, 0, 0, 5, 7, 0, 0, 0, 1];
    assert_eq!(
        Message::decode(&short_piece),
        Err(PeerError::InvalidLength { id: 7, length: 5 })
    );
}

#[test]
fn test_decode_ignores_bytes_past_frame() {
    let mut data = Message::Unchoke.encode().to_vec();
    data.extend_from_slice(&[0xde, 0xad]);

    let (message, used) = Dispatcher::default().decode_frame(&data).unwrap();
    assert_eq!(message, Message::Unchoke);
    assert_eq!(used, 5);
}

#[test]
fn test_decode_as() {
    let choke = Message::Choke.encode();
    assert_eq!(
        Message::decode_as(MessageId::Choke, &choke).unwrap(),
        Message::Choke
    );
    assert!(matches!(
        Message::decode_as(MessageId::Unchoke, &choke),
        Err(PeerError::ProtocolMismatch(_))
    ));
    assert!(matches!(
        Message::decode_as(MessageId::Port, &Message::KeepAlive.encode()),
        Err(PeerError::ProtocolMismatch(_))
    ));
}

#[test]
fn test_message_too_large() {
    let dispatcher = Dispatcher::with_limits(&CodecLimits::default().with_max_message_len(16));
    let frame = [0, 0, 0, 17, 7];
    assert_eq!(
        dispatcher.dispatch(&frame),
        Err(PeerError::MessageTooLarge {
            length: 17,
            max: 16
        })
    );
}

#[test]
fn test_next_frame_stream() {
    let dispatcher = Dispatcher::default();
    let mut stream = BytesMut::new();
    for message in [
        Message::KeepAlive,
        Message::Unchoke,
        Message::Piece {
            piece_index: 0,
            block_offset: 0,
            block: Bytes::from_static(&[9; 32]),
        },
    ] {
        message.encode_into(&mut stream);
    }
    let whole = stream.split().freeze();

    // Feed one byte at a time.
    let mut buf = BytesMut::new();
    let mut decoded = Vec::new();
    for byte in whole.iter() {
        buf.extend_from_slice(&[*byte]);
        while let Some(message) = dispatcher.next_frame(&mut buf).unwrap() {
            decoded.push(message);
        }
    }

    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[0], Message::KeepAlive);
    assert_eq!(decoded[1], Message::Unchoke);
    assert!(matches!(&decoded[2], Message::Piece { block, .. } if block.len() == 32));
    assert!(buf.is_empty());
}

#[test]
fn test_next_frame_propagates_errors() {
    let mut buf = BytesMut::from(&[0u8, 0, 0, 1, 42][..]);
    assert_eq!(
        Dispatcher::default().next_frame(&mut buf),
        Err(PeerError::UnknownMessageId(42))
    );
}

#[test]
fn test_bitfield() {
    let mut bf = Bitfield::new(100);
    assert!(!bf.has(0));
    assert!(bf.is_empty());

    bf.set(0);
    bf.set(99);
    bf.set(100);
    assert!(bf.has(0));
    assert!(bf.has(99));
    assert!(!bf.has(100));

    bf.clear(0);
    assert!(!bf.has(0));
    assert_eq!(bf.count(), 1);
    assert_eq!(bf.as_bytes().len(), 13);
}

#[test]
fn test_bitfield_from_payload() {
    let bf = Bitfield::from_payload(&[0x80, 0x40], 10).unwrap();
    assert!(bf.has(0));
    assert!(!bf.has(1));
    assert!(bf.has(9));

    assert!(matches!(
        Bitfield::from_payload(&[0x80, 0x20], 10),
        Err(PeerError::InvalidBitfield(_))
    ));
    assert!(matches!(
        Bitfield::from_payload(&[0x80], 10),
        Err(PeerError::InvalidBitfield(_))
    ));
    assert!(Bitfield::from_payload(&[0xFF], 8).unwrap().is_complete());
}

#[test]
fn test_bitfield_full_and_message() {
    let full = Bitfield::full(10);
    assert_eq!(full.as_bytes(), &[0xFF, 0xC0]);
    assert!(full.is_complete());

    let mut ours = Bitfield::new(10);
    ours.set(1);
    assert_eq!(full.missing_from(&ours), vec![0, 2, 3, 4, 5, 6, 7, 8, 9]);

    let Message::Bitfield(raw) = full.to_message() else {
        panic!("expected bitfield message");
    };
    assert_eq!(Bitfield::from_payload(&raw, 10).unwrap(), full);
}

#[test]
fn test_block_partition() {
    let blocks = Block::partition(4, 40_000);
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[0].size(), 16384);
    assert_eq!(blocks[1].offset(), 16384);
    assert_eq!(blocks[2].offset(), 32768);
    assert_eq!(blocks[2].size(), 40_000 - 32768);
    assert!(blocks.iter().all(|b| b.piece_index() == 4));

    assert!(Block::partition(0, 0).is_empty());
}

#[test]
fn test_block_lifecycle() {
    let start = Instant::now();
    let mut block = Block::new(3, 16384, 4);
    assert_eq!(block.state(), BlockState::Empty);

    let request = block.mark_requested(start).unwrap();
    assert_eq!(
        request,
        Message::Request {
            piece_index: 3,
            block_offset: 16384,
            block_length: 4
        }
    );
    assert_eq!(block.state(), BlockState::Pending);
    assert_eq!(block.last_sent(), Some(start));
    assert!(matches!(
        block.mark_requested(start),
        Err(PeerError::InvalidBlockState {
            expected: BlockState::Empty,
            found: BlockState::Pending
        })
    ));

    let piece = Message::Piece {
        piece_index: 3,
        block_offset: 16384,
        block: Bytes::from_static(b"data"),
    };
    block.accept(&piece).unwrap();
    assert_eq!(block.state(), BlockState::Full);
    assert_eq!(block.data(), &Bytes::from_static(b"data"));
    assert!(block.reset().is_err());
}

#[test]
fn test_block_rejects_mismatched_piece() {
    let mut block = Block::new(3, 0, 4);
    assert!(block.accept(&Message::Choke).is_err());

    block.mark_requested(Instant::now()).unwrap();
    let wrong_offset = Message::Piece {
        piece_index: 3,
        block_offset: 4,
        block: Bytes::from_static(b"data"),
    };
    assert!(matches!(
        block.accept(&wrong_offset),
        Err(PeerError::BlockMismatch(_))
    ));
    let wrong_size = Message::Piece {
        piece_index: 3,
        block_offset: 0,
        block: Bytes::from_static(b"dat"),
    };
    assert!(matches!(
        block.accept(&wrong_size),
        Err(PeerError::BlockMismatch(_))
    ));
    assert_eq!(block.state(), BlockState::Pending);
}

#[test]
fn test_block_timeout_and_reset() {
    let start = Instant::now();
    let timeout = Duration::from_secs(30);
    let mut block = Block::new(0, 0, 16384);
    assert!(!block.is_expired(start + timeout, timeout));

    block.mark_requested(start).unwrap();
    assert!(!block.is_expired(start + Duration::from_secs(29), timeout));
    assert!(block.is_expired(start + timeout, timeout));

    block.reset().unwrap();
    assert_eq!(block.state(), BlockState::Empty);
    assert_eq!(block.last_sent(), None);
    assert_eq!(
        block.cancel_message(),
        Message::Cancel {
            piece_index: 0,
            block_offset: 0,
            block_length: 16384
        }
    );
}

#[test]
fn test_peer_id() {
    let id1 = PeerId::generate();
    let id2 = PeerId::generate();
    assert_ne!(id1, id2);
    assert_eq!(id1.client_id(), Some("BW0001"));
    assert!(PeerId::from_bytes(&[0u8; 19]).is_none());
    assert_eq!(PeerId::from_bytes(id1.as_bytes()), Some(id1));
}
