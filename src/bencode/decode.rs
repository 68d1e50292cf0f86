use super::error::BencodeError;
use super::value::Value;
use crate::config::CodecLimits;
use crate::constants::MAX_BENCODE_DEPTH;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Decodes a complete bencode document.
///
/// The whole input must be consumed by a single value; anything after it is
/// reported as [`BencodeError::TrailingData`].
pub fn decode(data: &[u8]) -> Result<Value, BencodeError> {
    Decoder::new(data).decode()
}

/// A cursor over bencode input.
///
/// Dictionary keys may arrive in any order (they are normalised on decode)
/// but must be unique.
pub struct Decoder<'a> {
    data: &'a [u8],
    pos: usize,
    max_depth: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            max_depth: MAX_BENCODE_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Applies the bencode limits from `limits`.
    pub fn with_limits(self, limits: &CodecLimits) -> Self {
        self.with_max_depth(limits.max_bencode_depth)
    }

    /// Decodes one value and requires the input to end right after it.
    pub fn decode(mut self) -> Result<Value, BencodeError> {
        let value = self.decode_value(0)?;
        if self.pos != self.data.len() {
            return Err(BencodeError::TrailingData(self.pos));
        }
        Ok(value)
    }

    /// Decodes one value and returns it with the number of bytes consumed,
    /// leaving any following bytes untouched.
    pub fn decode_prefix(mut self) -> Result<(Value, usize), BencodeError> {
        let value = self.decode_value(0)?;
        Ok((value, self.pos))
    }

    fn peek(&self) -> Result<u8, BencodeError> {
        self.data
            .get(self.pos)
            .copied()
            .ok_or(BencodeError::UnexpectedEof)
    }

    fn decode_value(&mut self, depth: usize) -> Result<Value, BencodeError> {
        if depth > self.max_depth {
            return Err(BencodeError::NestingTooDeep(self.max_depth));
        }

        match self.peek()? {
            b'i' => self.decode_integer(),
            b'l' => self.decode_list(depth),
            b'd' => self.decode_dict(depth),
            b'0'..=b'9' => self.decode_bytes().map(Value::Bytes),
            c => Err(BencodeError::UnexpectedChar {
                ch: c as char,
                pos: self.pos,
            }),
        }
    }

    /// Returns the bytes up to (not including) `delim` and steps past it.
    fn take_until(&mut self, delim: u8) -> Result<&'a [u8], BencodeError> {
        let data: &'a [u8] = self.data;
        let rest = &data[self.pos..];
        let len = rest
            .iter()
            .position(|&b| b == delim)
            .ok_or(BencodeError::UnexpectedEof)?;
        self.pos += len + 1;
        Ok(&rest[..len])
    }

    fn decode_integer(&mut self) -> Result<Value, BencodeError> {
        self.pos += 1;
        let digits = self.take_until(b'e')?;

        let text = std::str::from_utf8(digits)
            .map_err(|_| BencodeError::InvalidInteger("invalid utf8".into()))?;

        let unsigned = text.strip_prefix('-').unwrap_or(text);
        if unsigned.is_empty() || !unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return Err(BencodeError::InvalidInteger(text.into()));
        }
        if text == "-0" || (unsigned.starts_with('0') && unsigned.len() > 1) {
            return Err(BencodeError::InvalidInteger(format!("{text} (leading zero)")));
        }

        text.parse()
            .map(Value::Integer)
            .map_err(|_| BencodeError::InvalidInteger(text.into()))
    }

    fn decode_bytes(&mut self) -> Result<Bytes, BencodeError> {
        let start = self.pos;
        let prefix = self.take_until(b':')?;

        if !prefix.iter().all(u8::is_ascii_digit) || (prefix.len() > 1 && prefix[0] == b'0') {
            return Err(BencodeError::InvalidStringLength(start));
        }
        let len: usize = std::str::from_utf8(prefix)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or(BencodeError::InvalidStringLength(start))?;

        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(BencodeError::UnexpectedEof)?;

        let bytes = Bytes::copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(bytes)
    }

    fn decode_list(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut list = Vec::new();

        while self.peek()? != b'e' {
            list.push(self.decode_value(depth + 1)?);
        }

        self.pos += 1;
        Ok(Value::List(list))
    }

    fn decode_dict(&mut self, depth: usize) -> Result<Value, BencodeError> {
        self.pos += 1;
        let mut dict = BTreeMap::new();

        while self.peek()? != b'e' {
            if !self.peek()?.is_ascii_digit() {
                return Err(BencodeError::NonStringKey(self.pos));
            }
            let key = self.decode_bytes()?;
            let value = self.decode_value(depth + 1)?;

            if dict.contains_key(&key) {
                return Err(BencodeError::DuplicateKey(
                    String::from_utf8_lossy(&key).into_owned(),
                ));
            }
            dict.insert(key, value);
        }

        self.pos += 1;
        Ok(Value::Dict(dict))
    }
}
