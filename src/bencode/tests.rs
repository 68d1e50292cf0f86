use std::collections::BTreeMap;

use bytes::Bytes;

use super::*;

#[test]
fn test_decode_integer() {
    assert_eq!(decode(b"i42e").unwrap(), Value::Integer(42));
    assert_eq!(decode(b"i-42e").unwrap(), Value::Integer(-42));
    assert_eq!(decode(b"i0e").unwrap(), Value::Integer(0));
    assert_eq!(
        decode(b"i9223372036854775807e").unwrap(),
        Value::Integer(i64::MAX)
    );
}

#[test]
fn test_decode_integer_invalid() {
    assert!(matches!(decode(b"i-0e"), Err(BencodeError::InvalidInteger(_))));
    assert!(matches!(decode(b"i03e"), Err(BencodeError::InvalidInteger(_))));
    assert!(matches!(decode(b"ie"), Err(BencodeError::InvalidInteger(_))));
    assert!(matches!(decode(b"i-e"), Err(BencodeError::InvalidInteger(_))));
    assert!(matches!(decode(b"i+5e"), Err(BencodeError::InvalidInteger(_))));
    assert!(matches!(decode(b"i1.5e"), Err(BencodeError::InvalidInteger(_))));
    assert!(matches!(
        decode(b"i99999999999999999999e"),
        Err(BencodeError::InvalidInteger(_))
    ));
    assert_eq!(decode(b"i42"), Err(BencodeError::UnexpectedEof));
}

#[test]
fn test_decode_bytes() {
    assert_eq!(
        decode(b"4:spam").unwrap(),
        Value::Bytes(Bytes::from_static(b"spam"))
    );
    assert_eq!(decode(b"0:").unwrap(), Value::Bytes(Bytes::new()));
    assert_eq!(
        decode(b"3:\x00\xff\x10").unwrap(),
        Value::Bytes(Bytes::from_static(&[0x00, 0xff, 0x10]))
    );
}

#[test]
fn test_decode_bytes_overrun() {
    assert_eq!(decode(b"10:short"), Err(BencodeError::UnexpectedEof));
    assert_eq!(decode(b"4"), Err(BencodeError::UnexpectedEof));
    assert!(matches!(
        decode(b"18446744073709551616:x"),
        Err(BencodeError::InvalidStringLength(0))
    ));
}

#[test]
fn test_decode_list() {
    let result = decode(b"l4:spami42ee").unwrap();
    let list = result.as_list().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0], Value::string("spam"));
    assert_eq!(list[1], Value::Integer(42));

    assert_eq!(decode(b"le").unwrap(), Value::List(vec![]));
}

#[test]
fn test_decode_unterminated() {
    assert_eq!(decode(b"l4:spam"), Err(BencodeError::UnexpectedEof));
    assert_eq!(decode(b"d3:cow3:moo"), Err(BencodeError::UnexpectedEof));
    assert_eq!(decode(b"d3:cow"), Err(BencodeError::UnexpectedEof));
    assert_eq!(decode(b""), Err(BencodeError::UnexpectedEof));
}

#[test]
fn test_decode_unknown_prefix() {
    assert_eq!(
        decode(b"x"),
        Err(BencodeError::UnexpectedChar { ch: 'x', pos: 0 })
    );
    assert_eq!(
        decode(b"l4:spamqe"),
        Err(BencodeError::UnexpectedChar { ch: 'q', pos: 7 })
    );
}

#[test]
fn test_decode_dict() {
    let result = decode(b"d3:cow3:moo4:spam4:eggse").unwrap();
    let dict = result.as_dict().unwrap();
    assert_eq!(dict.len(), 2);
    assert_eq!(
        dict.get(&Bytes::from_static(b"cow")),
        Some(&Value::string("moo"))
    );
}

#[test]
fn test_decode_dict_rejects_bad_keys() {
    assert_eq!(decode(b"di1e3:mooe"), Err(BencodeError::NonStringKey(1)));
    assert!(matches!(
        decode(b"d3:cowi1e3:cowi2ee"),
        Err(BencodeError::DuplicateKey(k)) if k == "cow"
    ));
}

#[test]
fn test_decode_unsorted_keys_are_normalised() {
    let unsorted = decode(b"d4:spami1e3:cowi2ee").unwrap();
    assert_eq!(encode(&unsorted), b"d3:cowi2e4:spami1ee");
}

#[test]
fn test_trailing_data_error() {
    assert_eq!(decode(b"i42eextra"), Err(BencodeError::TrailingData(4)));
}

#[test]
fn test_decode_prefix() {
    let (value, used) = Decoder::new(b"i42eextra").decode_prefix().unwrap();
    assert_eq!(value, Value::Integer(42));
    assert_eq!(used, 4);
}

#[test]
fn test_nesting_limit() {
    let mut deep = vec![b'l'; 70];
    deep.extend(vec![b'e'; 70]);
    assert_eq!(decode(&deep), Err(BencodeError::NestingTooDeep(64)));

    assert!(Decoder::new(b"llleee").with_max_depth(2).decode().is_ok());
    assert_eq!(
        Decoder::new(b"lllleeee").with_max_depth(2).decode(),
        Err(BencodeError::NestingTooDeep(2))
    );
}

#[test]
fn test_encode_integer() {
    assert_eq!(encode(&Value::Integer(42)), b"i42e");
    assert_eq!(encode(&Value::Integer(-42)), b"i-42e");
    assert_eq!(encode(&Value::Integer(0)), b"i0e");
    assert_eq!(encode(&Value::Integer(i64::MIN)), b"i-9223372036854775808e");
}

#[test]
fn test_encode_bytes() {
    assert_eq!(encode(&Value::string("spam")), b"4:spam");
    assert_eq!(encode(&Value::Bytes(Bytes::new())), b"0:");
}

#[test]
fn test_encode_dict_sorts_keys() {
    let mut dict = BTreeMap::new();
    dict.insert(Bytes::from_static(b"zeta"), Value::Integer(1));
    dict.insert(Bytes::from_static(b"alpha"), Value::Integer(2));
    dict.insert(Bytes::from_static(b"Beta"), Value::Integer(3));
    assert_eq!(
        encode(&Value::Dict(dict)),
        b"d4:Betai3e5:alphai2e4:zetai1ee"
    );
}

#[test]
fn test_roundtrip_canonical_document() {
    let original = b"d8:announce15:http://test.com4:infod4:name4:test12:piece lengthi16384eee";
    let decoded = decode(original).unwrap();
    assert_eq!(encode(&decoded), original);
}

#[test]
fn test_roundtrip_value_tree() {
    let value = Value::dict([
        ("list", Value::List(vec![Value::Integer(-7), Value::string("")])),
        ("nested", Value::dict([("inner", Value::Integer(0))])),
        ("raw", Value::from(&[0u8, 1, 2, 255][..])),
    ]);
    assert_eq!(decode(&encode(&value)).unwrap(), value);
}

#[test]
fn test_encode_into_appends() {
    let mut buf = b"prefix".to_vec();
    encode_into(&Value::Integer(1), &mut buf);
    assert_eq!(buf, b"prefixi1e");
}

#[test]
fn test_value_accessors() {
    let value = Value::Integer(42);
    assert_eq!(value.as_integer(), Some(42));
    assert!(value.as_bytes().is_none());

    let value = Value::string("test");
    assert_eq!(value.as_str(), Some("test"));
    assert!(value.as_integer().is_none());

    let value = Value::Bytes(Bytes::from_static(&[0xff, 0xfe]));
    assert!(value.as_str().is_none());
    assert!(value.as_bytes().is_some());

    let value = Value::List(vec![]);
    assert!(value.as_list().is_some());
    assert!(value.as_dict().is_none());
    assert!(value.get(b"key").is_none());
}

#[test]
fn test_decoder_with_limits() {
    let limits = crate::CodecLimits::default().with_max_bencode_depth(1);
    assert_eq!(
        Decoder::new(b"lllleeee").with_limits(&limits).decode(),
        Err(BencodeError::NestingTooDeep(1))
    );
    assert!(Decoder::new(b"llee").with_limits(&limits).decode().is_ok());
    assert!(decode(b"lllleeee").is_ok());
}
