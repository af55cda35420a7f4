// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Parser helpers.
//!
//! Reading the message prefix and the header block, and decoding the integer
//! and string encodings used inside header values.
//!

use std::collections::HashMap;

use crate::error::ProtocolError;

use super::constants::PubSubStatefulMessageFlags;

/// Longest identifier a notification may carry.
pub const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Cursor over the bytes of a single message.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> PayloadReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Read exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// * `ProtocolError::Truncated` - fewer than `len` bytes remain
    ///
    pub fn read_exact(&mut self, len: usize, what: &str) -> Result<&'a [u8], ProtocolError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                ProtocolError::Truncated(format!(
                    "{} needs {} bytes, {} remain",
                    what,
                    len,
                    self.data.len() - self.position
                ))
            })?;
        let data = self.data;
        self.position = end;
        Ok(&data[end - len..end])
    }

    /// Read a big-endian `u16`.
    pub fn read_u16(&mut self, what: &str) -> Result<u16, ProtocolError> {
        let bytes = self.read_exact(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Read a `u16` length followed by that many bytes.
    pub fn read_length_prefixed(&mut self, what: &str) -> Result<&'a [u8], ProtocolError> {
        let len = self.read_u16(what)?;
        self.read_exact(usize::from(len), what)
    }

    /// Consume and return every remaining byte.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let data = self.data;
        let rest = &data[self.position..];
        self.position = data.len();
        rest
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}

/// Read the flags and the raw message type from the start of a message.
///
/// # Errors
///
/// * `ProtocolError::Truncated` - the message is shorter than 4 bytes
///
pub fn parse_prefix(
    payload: &mut PayloadReader<'_>,
) -> Result<(PubSubStatefulMessageFlags, u16), ProtocolError> {
    let flags = PubSubStatefulMessageFlags::from_bits(payload.read_u16("flags")?);
    let message_type = payload.read_u16("message type")?;
    Ok((flags, message_type))
}

/// Header values pulled out of a message so far.
///
/// With minimal headers each `take` reads the next values in order. With
/// expanded headers the whole block is read on the first `take` and later
/// calls are served from it, so messages whose header set depends on an
/// earlier header (streams) can be parsed the same way in both modes.
#[derive(Debug)]
pub struct MessageHeaders {
    minimal: bool,
    expanded: Option<HashMap<String, Vec<u8>>>,
}

impl MessageHeaders {
    /// Headers for a message carrying `flags`.
    pub fn new(flags: PubSubStatefulMessageFlags) -> Self {
        Self {
            minimal: flags.contains(PubSubStatefulMessageFlags::MINIMAL_HEADERS),
            expanded: None,
        }
    }

    /// Take the values for `names`, in order.
    ///
    /// # Errors
    ///
    /// * `ProtocolError::Truncated` - the header block is cut short
    /// * `ProtocolError::MissingHeader` - an expanded block lacks one of `names`
    /// * `ProtocolError::DuplicateHeader` - an expanded block repeats a name
    ///
    pub fn take(
        &mut self,
        payload: &mut PayloadReader<'_>,
        names: &[&str],
    ) -> Result<Vec<Vec<u8>>, ProtocolError> {
        if self.minimal {
            return names
                .iter()
                .map(|name| payload.read_length_prefixed(name).map(<[u8]>::to_vec))
                .collect();
        }

        if self.expanded.is_none() {
            self.expanded = Some(parse_expanded_headers(payload)?);
        }
        let headers = self.expanded.get_or_insert_with(HashMap::new);
        names
            .iter()
            .map(|name| {
                headers
                    .remove(*name)
                    .ok_or_else(|| ProtocolError::MissingHeader((*name).to_owned()))
            })
            .collect()
    }

    /// Take the values for `names`, in order, as a fixed size array.
    pub fn take_array<const N: usize>(
        &mut self,
        payload: &mut PayloadReader<'_>,
        names: &[&str; N],
    ) -> Result<[Vec<u8>; N], ProtocolError> {
        self.take(payload, names)?
            .try_into()
            .map_err(|values: Vec<Vec<u8>>| {
                ProtocolError::InvalidParameter(format!(
                    "expected {} header values, got {}",
                    N,
                    values.len()
                ))
            })
    }
}

/// Parse an expanded header block into a lower-cased name to value map.
fn parse_expanded_headers(
    payload: &mut PayloadReader<'_>,
) -> Result<HashMap<String, Vec<u8>>, ProtocolError> {
    let count = payload.read_u16("header count")?;
    let mut headers = HashMap::with_capacity(usize::from(count));
    for _ in 0..count {
        let name = payload.read_length_prefixed("header name")?;
        let name = std::str::from_utf8(name)
            .map_err(|_| ProtocolError::InvalidHeader("header name is not utf-8".to_owned()))?
            .to_ascii_lowercase();
        let value = payload.read_length_prefixed(&name)?.to_vec();
        if headers.contains_key(&name) {
            return Err(ProtocolError::DuplicateHeader(name));
        }
        headers.insert(name, value);
    }
    log::trace!("parsed {} expanded headers", count);
    Ok(headers)
}

/// Parse every expected header of a message that has a fixed header set.
pub fn parse_simple_headers<const N: usize>(
    flags: PubSubStatefulMessageFlags,
    payload: &mut PayloadReader<'_>,
    names: &[&str; N],
) -> Result<[Vec<u8>; N], ProtocolError> {
    MessageHeaders::new(flags).take_array(payload, names)
}

/// Decode a big-endian unsigned integer of at most `max_bytes` bytes.
pub fn parse_unsigned(value: &[u8], max_bytes: usize, name: &str) -> Result<u64, ProtocolError> {
    if value.len() > max_bytes || value.len() > 8 {
        return Err(ProtocolError::InvalidHeader(format!(
            "{} must be at most {} bytes",
            name, max_bytes
        )));
    }
    Ok(value
        .iter()
        .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte)))
}

/// Decode a big-endian unsigned integer of exactly `N` bytes.
pub fn parse_fixed<const N: usize>(value: &[u8], name: &str) -> Result<[u8; N], ProtocolError> {
    match <[u8; N]>::try_from(value) {
        Ok(array) => Ok(array),
        Err(_) => Err(ProtocolError::InvalidHeader(format!(
            "{} must be exactly {} bytes",
            name, N
        ))),
    }
}

/// Decode a big-endian two's complement integer of 1 or 2 bytes.
pub fn parse_signed_i16(value: &[u8], name: &str) -> Result<i16, ProtocolError> {
    match value {
        [byte] => Ok(i16::from(*byte as i8)),
        [high, low] => Ok(i16::from_be_bytes([*high, *low])),
        _ => Err(ProtocolError::InvalidHeader(format!("{} must be 1 or 2 bytes", name))),
    }
}

/// Decode a single byte boolean that must be 0 or 1.
pub fn parse_bool(value: &[u8], name: &str) -> Result<bool, ProtocolError> {
    match value {
        [0] => Ok(false),
        [1] => Ok(true),
        _ => Err(ProtocolError::InvalidHeader(format!("{} must be 0 or 1", name))),
    }
}

/// Decode a UTF-8 header value.
pub fn parse_utf8(value: Vec<u8>, name: &str) -> Result<String, ProtocolError> {
    String::from_utf8(value)
        .map_err(|_| ProtocolError::InvalidHeader(format!("{} must be valid utf-8", name)))
}

/// Decode an authorization header; an empty value means no authorization.
pub fn parse_authorization(value: Vec<u8>) -> Result<Option<String>, ProtocolError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_utf8(value, "authorization").map(Some)
}

/// Check an identifier does not exceed [`MAX_IDENTIFIER_LENGTH`].
pub fn check_identifier(identifier: Vec<u8>) -> Result<Vec<u8>, ProtocolError> {
    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ProtocolError::InvalidHeader(format!(
            "x-identifier must be at most {} bytes",
            MAX_IDENTIFIER_LENGTH
        )));
    }
    Ok(identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expanded(headers: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = (headers.len() as u16).to_be_bytes().to_vec();
        for (name, value) in headers {
            out.extend_from_slice(&(name.len() as u16).to_be_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&(value.len() as u16).to_be_bytes());
            out.extend_from_slice(value);
        }
        out
    }

    #[test]
    fn test_minimal_headers_in_order() {
        let data = [0, 1, b'a', 0, 2, b'b', b'c', 9, 9];
        let mut reader = PayloadReader::new(&data);
        let values = parse_simple_headers(
            PubSubStatefulMessageFlags::MINIMAL_HEADERS,
            &mut reader,
            &["x-one", "x-two"],
        )
        .unwrap();
        assert_eq!(values, [b"a".to_vec(), b"bc".to_vec()]);
        assert_eq!(reader.read_remaining(), &[9, 9]);
    }

    #[test]
    fn test_expanded_headers_any_order_and_case() {
        let data = expanded(&[("X-Two", b"2"), ("x-extra", b"?"), ("x-one", b"1")]);
        let mut reader = PayloadReader::new(&data);
        let values = parse_simple_headers(
            PubSubStatefulMessageFlags::NONE,
            &mut reader,
            &["x-one", "x-two"],
        )
        .unwrap();
        assert_eq!(values, [b"1".to_vec(), b"2".to_vec()]);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_expanded_headers_incremental_take() {
        let data = expanded(&[("x-a", b"a"), ("x-b", b"b")]);
        let mut reader = PayloadReader::new(&data);
        let mut headers = MessageHeaders::new(PubSubStatefulMessageFlags::NONE);
        assert_eq!(
            headers.take(&mut reader, &["x-a"]).unwrap(),
            vec![b"a".to_vec()]
        );
        assert_eq!(
            headers.take(&mut reader, &["x-b"]).unwrap(),
            vec![b"b".to_vec()]
        );
    }

    #[test]
    fn test_missing_and_duplicate_headers() {
        let data = expanded(&[("x-one", b"1")]);
        let result = parse_simple_headers(
            PubSubStatefulMessageFlags::NONE,
            &mut PayloadReader::new(&data),
            &["x-one", "x-two"],
        );
        assert_eq!(
            result,
            Err(ProtocolError::MissingHeader("x-two".to_owned()))
        );

        let data = expanded(&[("x-one", b"1"), ("X-ONE", b"2")]);
        let result = parse_simple_headers(
            PubSubStatefulMessageFlags::NONE,
            &mut PayloadReader::new(&data),
            &["x-one"],
        );
        assert_eq!(
            result,
            Err(ProtocolError::DuplicateHeader("x-one".to_owned()))
        );
    }

    #[test]
    fn test_truncated_minimal_header() {
        let data = [0, 5, b'a'];
        let result = parse_simple_headers(
            PubSubStatefulMessageFlags::MINIMAL_HEADERS,
            &mut PayloadReader::new(&data),
            &["x-topic"],
        );
        assert!(matches!(result, Err(ProtocolError::Truncated(_))));
    }

    #[test]
    fn test_integer_decoding() {
        assert_eq!(parse_unsigned(&[], 8, "x").unwrap(), 0);
        assert_eq!(parse_unsigned(&[1, 0], 8, "x").unwrap(), 256);
        assert!(parse_unsigned(&[0; 9], 8, "x").is_err());
        assert!(parse_unsigned(&[1, 2, 3], 2, "x").is_err());
        assert_eq!(parse_signed_i16(&[0xff], "x").unwrap(), -1);
        assert_eq!(parse_signed_i16(&[0xff, 0xfe], "x").unwrap(), -2);
        assert_eq!(parse_signed_i16(&[0, 22], "x").unwrap(), 22);
        assert!(parse_signed_i16(&[], "x").is_err());
        assert_eq!(parse_fixed::<2>(&[1, 2], "x").unwrap(), [1, 2]);
        assert!(parse_fixed::<2>(&[1], "x").is_err());
    }

    #[test]
    fn test_bool_and_authorization() {
        assert!(parse_bool(&[1], "x").unwrap());
        assert!(!parse_bool(&[0], "x").unwrap());
        assert!(parse_bool(&[2], "x").is_err());
        assert!(parse_bool(&[], "x").is_err());
        assert_eq!(parse_authorization(Vec::new()).unwrap(), None);
        assert_eq!(
            parse_authorization(b"token".to_vec()).unwrap(),
            Some("token".to_owned())
        );
        assert!(check_identifier(vec![0; 65]).is_err());
    }
}
