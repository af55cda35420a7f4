// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Compression negotiation.
//!
//! Compressor id 0 means no compression and id 1 means compression without a
//! dictionary. Preset dictionaries use ids below 65536; dictionaries trained
//! on the connection use ids from 65536 upwards.
//!

use crate::error::ProtocolError;
use crate::stateful::constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
};
use crate::stateful::generic_parser::B2SMessageParser;
use crate::stateful::parser_helpers::{
    parse_fixed, parse_signed_i16, parse_simple_headers, parse_unsigned, PayloadReader,
};
use crate::stateful::serializer_helpers::{
    int_to_minimal_unsigned, serialize_simple_message, SerializeMessage,
};

/// Highest zstandard compression level.
pub const MAX_COMPRESSION_LEVEL: i16 = 22;
/// Lowest id a trained dictionary may use.
pub const MIN_CUSTOM_DICTIONARY_ID: u64 = 65536;
/// `max_size` value meaning there is no upper bound.
pub const UNBOUNDED_MAX_SIZE: u64 = u64::MAX;

const HEADERS: [&str; 4] = [
    "x-identifier",
    "x-compression-level",
    "x-min-size",
    "x-max-size",
];

/// Settings common to both kinds of dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CompressorHints {
    /// Level the broadcaster compresses at; the subscriber may choose another.
    pub compression_level: i16,
    /// Smallest payload the broadcaster applies this compressor to.
    pub min_size: u32,
    /// Largest payload the broadcaster applies this compressor to.
    pub max_size: u64,
}

impl CompressorHints {
    fn parse(level: &[u8], min_size: &[u8], max_size: &[u8]) -> Result<Self, ProtocolError> {
        let compression_level = parse_signed_i16(level, "x-compression-level")?;
        if compression_level > MAX_COMPRESSION_LEVEL {
            return Err(ProtocolError::InvalidHeader(format!(
                "x-compression-level must be at most {}",
                MAX_COMPRESSION_LEVEL
            )));
        }
        Ok(Self {
            compression_level,
            min_size: u32::from_be_bytes(parse_fixed::<4>(min_size, "x-min-size")?),
            max_size: u64::from_be_bytes(parse_fixed::<8>(max_size, "x-max-size")?),
        })
    }

    fn values(&self, identifier: u64) -> Result<[Vec<u8>; 4], ProtocolError> {
        if self.compression_level > MAX_COMPRESSION_LEVEL {
            return Err(ProtocolError::InvalidParameter(format!(
                "compression level must be at most {}",
                MAX_COMPRESSION_LEVEL
            )));
        }
        Ok([
            int_to_minimal_unsigned(identifier),
            self.compression_level.to_be_bytes().to_vec(),
            self.min_size.to_be_bytes().to_vec(),
            self.max_size.to_be_bytes().to_vec(),
        ])
    }

    /// Whether the broadcaster would compress a payload of `len` bytes.
    pub fn applies_to(&self, len: u64) -> bool {
        let below_max = self.max_size == UNBOUNDED_MAX_SIZE || len <= self.max_size;
        len >= u64::from(self.min_size) && below_max
    }
}

/// Broadcaster to subscriber: a preset dictionary may now be used.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SEnableZstdPreset {
    /// Dictionary id; 1 is compression without a dictionary, 0 is never used.
    pub identifier: u16,
    #[serde(flatten)]
    pub hints: CompressorHints,
}

impl B2SMessageParser for B2SEnableZstdPreset {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::EnableZstdPreset]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [identifier, level, min_size, max_size] =
            parse_simple_headers(flags, payload, &HEADERS)?;
        let identifier = parse_unsigned(&identifier, 2, "x-identifier")? as u16;
        if identifier == 0 {
            return Err(ProtocolError::InvalidHeader(
                "x-identifier 0 is reserved for no compression".to_owned(),
            ));
        }
        Ok(Self {
            identifier,
            hints: CompressorHints::parse(&level, &min_size, &max_size)?,
        })
    }
}

impl SerializeMessage for B2SEnableZstdPreset {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        if self.identifier == 0 {
            return Err(ProtocolError::InvalidParameter(
                "preset dictionary id must be at least 1".to_owned(),
            ));
        }
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::EnableZstdPreset,
            &HEADERS,
            &self.hints.values(u64::from(self.identifier))?,
            minimal_headers,
            &[],
        )
    }
}

/// Broadcaster to subscriber: a dictionary trained on this connection may now be used.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SEnableZstdCustom {
    /// Dictionary id, at least [`MIN_CUSTOM_DICTIONARY_ID`].
    pub identifier: u64,
    #[serde(flatten)]
    pub hints: CompressorHints,
    /// The dictionary itself.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub dictionary: Vec<u8>,
}

impl B2SMessageParser for B2SEnableZstdCustom {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::EnableZstdCustom]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [identifier, level, min_size, max_size] =
            parse_simple_headers(flags, payload, &HEADERS)?;
        let identifier = parse_unsigned(&identifier, 8, "x-identifier")?;
        if identifier < MIN_CUSTOM_DICTIONARY_ID {
            return Err(ProtocolError::InvalidHeader(format!(
                "custom dictionary x-identifier must be at least {}",
                MIN_CUSTOM_DICTIONARY_ID
            )));
        }
        Ok(Self {
            identifier,
            hints: CompressorHints::parse(&level, &min_size, &max_size)?,
            dictionary: payload.read_remaining().to_vec(),
        })
    }
}

impl SerializeMessage for B2SEnableZstdCustom {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        if self.identifier < MIN_CUSTOM_DICTIONARY_ID {
            return Err(ProtocolError::InvalidParameter(format!(
                "custom dictionary id must be at least {}",
                MIN_CUSTOM_DICTIONARY_ID
            )));
        }
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::EnableZstdCustom,
            &HEADERS,
            &self.hints.values(self.identifier)?,
            minimal_headers,
            &self.dictionary,
        )
    }
}
