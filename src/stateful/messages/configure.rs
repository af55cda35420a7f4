// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Connection configuration.
//!
//! `Configure` is the first message a subscriber sends; the broadcaster answers
//! with `ConfirmConfigure`. Each side contributes 32 random bytes to the
//! connection nonce.
//!

use crate::error::ProtocolError;
use crate::stateful::constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
    SubscriberToBroadcasterStatefulMessageType,
};
use crate::stateful::generic_parser::{B2SMessageParser, S2BMessageParser};
use crate::stateful::parser_helpers::{parse_bool, parse_fixed, parse_simple_headers, PayloadReader};
use crate::stateful::serializer_helpers::{serialize_simple_message, SerializeMessage};

/// Subscriber to broadcaster: configure the connection.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BConfigure {
    /// The subscriber's contribution to the connection nonce.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub subscriber_nonce: [u8; 32],
    /// Whether the subscriber accepts zstandard compressed messages.
    pub enable_zstd: bool,
    /// Whether the subscriber accepts dictionaries trained on this connection.
    pub enable_training: bool,
    /// Preset dictionary the subscriber suggests, 0 for none.
    pub initial_dict: u16,
}

const CONFIGURE_HEADERS: [&str; 4] = [
    "x-subscriber-nonce",
    "x-enable-zstd",
    "x-enable-training",
    "x-initial-dict",
];

impl S2BMessageParser for S2BConfigure {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::Configure]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let headers = parse_simple_headers(flags, payload, &CONFIGURE_HEADERS)?;
        Ok(Self {
            subscriber_nonce: parse_fixed::<32>(&headers[0], "x-subscriber-nonce")?,
            enable_zstd: parse_bool(&headers[1], "x-enable-zstd")?,
            enable_training: parse_bool(&headers[2], "x-enable-training")?,
            initial_dict: u16::from_be_bytes(parse_fixed::<2>(&headers[3], "x-initial-dict")?),
        })
    }
}

impl SerializeMessage for S2BConfigure {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        let values: [&[u8]; 4] = [
            &self.subscriber_nonce,
            &[u8::from(self.enable_zstd)],
            &[u8::from(self.enable_training)],
            &self.initial_dict.to_be_bytes(),
        ];
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::Configure,
            &CONFIGURE_HEADERS,
            &values,
            minimal_headers,
            &[],
        )
    }
}

/// Broadcaster to subscriber: configuration accepted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SConfirmConfigure {
    /// The broadcaster's contribution to the connection nonce.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub broadcaster_nonce: [u8; 32],
}

const CONFIRM_CONFIGURE_HEADERS: [&str; 1] = ["x-broadcaster-nonce"];

impl B2SMessageParser for B2SConfirmConfigure {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ConfirmConfigure]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let headers = parse_simple_headers(flags, payload, &CONFIRM_CONFIGURE_HEADERS)?;
        Ok(Self {
            broadcaster_nonce: parse_fixed::<32>(&headers[0], "x-broadcaster-nonce")?,
        })
    }
}

impl SerializeMessage for B2SConfirmConfigure {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmConfigure,
            &CONFIRM_CONFIGURE_HEADERS,
            &[&self.broadcaster_nonce],
            minimal_headers,
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stateful::generic_parser::{B2SMessage, S2BMessage};

    #[test]
    fn test_configure_both_header_modes() {
        let message = S2BConfigure {
            subscriber_nonce: [7; 32],
            enable_zstd: true,
            enable_training: false,
            initial_dict: 3,
        };
        for minimal in [true, false] {
            let bytes = message.serialize(minimal).unwrap();
            assert_eq!(
                S2BMessage::parse(&bytes).unwrap(),
                S2BMessage::Configure(message.clone())
            );
        }
    }

    #[test]
    fn test_configure_minimal_layout() {
        let message = S2BConfigure {
            subscriber_nonce: [0; 32],
            enable_zstd: false,
            enable_training: true,
            initial_dict: 0x0102,
        };
        let bytes = message.serialize(true).unwrap();
        assert_eq!(&bytes[..4], &[0, 1, 0, 1]);
        assert_eq!(&bytes[4..6], &[0, 32]);
        assert_eq!(&bytes[38..], &[0, 1, 0, 0, 1, 1, 0, 2, 1, 2]);
    }

    #[test]
    fn test_configure_rejects_short_nonce() {
        let short_nonce = [1u8; 31];
        let values: [&[u8]; 4] = [&short_nonce, &[0], &[0], &[0, 0]];
        let bytes = serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::Configure,
            &CONFIGURE_HEADERS,
            &values,
            true,
            &[],
        )
        .unwrap();
        assert!(matches!(
            S2BMessage::parse(&bytes),
            Err(ProtocolError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_confirm_configure() {
        let message = B2SConfirmConfigure {
            broadcaster_nonce: [9; 32],
        };
        let bytes = message.serialize(false).unwrap();
        assert_eq!(
            B2SMessage::parse(&bytes).unwrap(),
            B2SMessage::ConfirmConfigure(message)
        );
    }
}
