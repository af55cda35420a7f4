// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Subscription confirmations.
//!
//! Glob patterns are confirmed independently of each other, even when one
//! covers another.
//!

use crate::error::ProtocolError;
use crate::stateful::constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
};
use crate::stateful::generic_parser::B2SMessageParser;
use crate::stateful::parser_helpers::{parse_simple_headers, parse_utf8, PayloadReader};
use crate::stateful::serializer_helpers::{serialize_simple_message, SerializeMessage};

const EXACT_HEADERS: [&str; 1] = ["x-topic"];
const GLOB_HEADERS: [&str; 1] = ["x-glob"];

/// Broadcaster to subscriber: now subscribed to a topic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SConfirmSubscribeExact {
    #[serde(serialize_with = "hex::serde::serialize")]
    pub topic: Vec<u8>,
}

/// Broadcaster to subscriber: now subscribed to a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SConfirmSubscribeGlob {
    pub glob: String,
}

/// Broadcaster to subscriber: no longer subscribed to a topic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SConfirmUnsubscribeExact {
    #[serde(serialize_with = "hex::serde::serialize")]
    pub topic: Vec<u8>,
}

/// Broadcaster to subscriber: no longer subscribed to a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SConfirmUnsubscribeGlob {
    pub glob: String,
}

impl B2SMessageParser for B2SConfirmSubscribeExact {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ConfirmSubscribeExact]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [topic] = parse_simple_headers(flags, payload, &EXACT_HEADERS)?;
        Ok(Self { topic })
    }
}

impl SerializeMessage for B2SConfirmSubscribeExact {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmSubscribeExact,
            &EXACT_HEADERS,
            &[&self.topic],
            minimal_headers,
            &[],
        )
    }
}

impl B2SMessageParser for B2SConfirmSubscribeGlob {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ConfirmSubscribeGlob]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [glob] = parse_simple_headers(flags, payload, &GLOB_HEADERS)?;
        Ok(Self {
            glob: parse_utf8(glob, "x-glob")?,
        })
    }
}

impl SerializeMessage for B2SConfirmSubscribeGlob {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmSubscribeGlob,
            &GLOB_HEADERS,
            &[self.glob.as_bytes()],
            minimal_headers,
            &[],
        )
    }
}

impl B2SMessageParser for B2SConfirmUnsubscribeExact {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ConfirmUnsubscribeExact]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [topic] = parse_simple_headers(flags, payload, &EXACT_HEADERS)?;
        Ok(Self { topic })
    }
}

impl SerializeMessage for B2SConfirmUnsubscribeExact {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmUnsubscribeExact,
            &EXACT_HEADERS,
            &[&self.topic],
            minimal_headers,
            &[],
        )
    }
}

impl B2SMessageParser for B2SConfirmUnsubscribeGlob {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ConfirmUnsubscribeGlob]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [glob] = parse_simple_headers(flags, payload, &GLOB_HEADERS)?;
        Ok(Self {
            glob: parse_utf8(glob, "x-glob")?,
        })
    }
}

impl SerializeMessage for B2SConfirmUnsubscribeGlob {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmUnsubscribeGlob,
            &GLOB_HEADERS,
            &[self.glob.as_bytes()],
            minimal_headers,
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stateful::generic_parser::B2SMessage;

    #[test]
    fn test_confirm_subscribe_exact_minimal_layout() {
        let message = B2SConfirmSubscribeExact {
            topic: b"ab".to_vec(),
        };
        let bytes = message.serialize(true).unwrap();
        assert_eq!(bytes, vec![0, 1, 0, 2, 0, 2, b'a', b'b']);
        assert_eq!(
            B2SMessage::parse(&bytes).unwrap(),
            B2SMessage::ConfirmSubscribeExact(message)
        );
    }

    #[test]
    fn test_confirmations_in_expanded_mode() {
        let messages = vec![
            B2SMessage::ConfirmSubscribeGlob(B2SConfirmSubscribeGlob {
                glob: "a/*".to_owned(),
            }),
            B2SMessage::ConfirmUnsubscribeExact(B2SConfirmUnsubscribeExact {
                topic: b"a/b".to_vec(),
            }),
            B2SMessage::ConfirmUnsubscribeGlob(B2SConfirmUnsubscribeGlob {
                glob: "a/**".to_owned(),
            }),
        ];
        for message in messages {
            let bytes = message.serialize(false).unwrap();
            assert_eq!(B2SMessage::parse(&bytes).unwrap(), message);
        }
    }

    #[test]
    fn test_glob_with_invalid_utf8() {
        let bytes = serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmSubscribeGlob,
            &GLOB_HEADERS,
            &[[0xc3u8, 0x28]],
            true,
            &[],
        )
        .unwrap();
        assert!(matches!(
            B2SMessage::parse(&bytes),
            Err(ProtocolError::InvalidHeader(_))
        ));
    }
}
