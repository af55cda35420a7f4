// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Serializer helpers.
//!

use crate::error::ProtocolError;

use super::constants::PubSubStatefulMessageFlags;

/// Messages that can be written to the wire.
pub trait SerializeMessage {
    /// Serialize the message, choosing the header encoding.
    ///
    /// # Errors
    ///
    /// * `ProtocolError::HeaderTooLong` - a header name or value exceeds 65535 bytes
    ///
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError>;
}

/// Encode `n` big-endian without leading zero bytes; zero is empty.
pub fn int_to_minimal_unsigned(n: u64) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    bytes[skip..].to_vec()
}

fn length_prefix(len: usize, what: &str) -> Result<[u8; 2], ProtocolError> {
    u16::try_from(len)
        .map(u16::to_be_bytes)
        .map_err(|_| ProtocolError::HeaderTooLong(format!("{} is {} bytes", what, len)))
}

/// Write the flags and the message type.
pub fn write_prefix(out: &mut Vec<u8>, minimal_headers: bool, message_type: u16) {
    let flags = PubSubStatefulMessageFlags::for_headers(minimal_headers);
    out.extend_from_slice(&flags.bits().to_be_bytes());
    out.extend_from_slice(&message_type.to_be_bytes());
}

/// Write a header block for `names` and `values`, which must be the same length.
pub fn write_headers<V: AsRef<[u8]>>(
    out: &mut Vec<u8>,
    names: &[&str],
    values: &[V],
    minimal_headers: bool,
) -> Result<(), ProtocolError> {
    if names.len() != values.len() {
        return Err(ProtocolError::InvalidParameter(format!(
            "{} header names for {} values",
            names.len(),
            values.len()
        )));
    }

    if !minimal_headers {
        out.extend_from_slice(&length_prefix(names.len(), "header count")?);
    }
    for (name, value) in names.iter().zip(values) {
        let value = value.as_ref();
        if !minimal_headers {
            out.extend_from_slice(&length_prefix(name.len(), "header name")?);
            out.extend_from_slice(name.as_bytes());
        }
        out.extend_from_slice(&length_prefix(value.len(), name)?);
        out.extend_from_slice(value);
    }
    Ok(())
}

/// Serialize a message made of a fixed header set followed by `payload`.
pub fn serialize_simple_message<T, V>(
    message_type: T,
    names: &[&str],
    values: &[V],
    minimal_headers: bool,
    payload: &[u8],
) -> Result<Vec<u8>, ProtocolError>
where
    T: Into<u16>,
    V: AsRef<[u8]>,
{
    let header_size: usize = values.iter().map(|v| v.as_ref().len() + 2).sum();
    let mut out = Vec::with_capacity(4 + 2 + header_size + payload.len());
    write_prefix(&mut out, minimal_headers, message_type.into());
    write_headers(&mut out, names, values, minimal_headers)?;
    out.extend_from_slice(payload);
    Ok(out)
}
