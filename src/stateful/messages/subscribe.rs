// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Subscription requests.
//!
//! Subscribing or unsubscribing twice to the same exact topic or glob
//! disconnects the subscriber, so each request is answered by exactly one
//! confirmation.
//!

use crate::error::ProtocolError;
use crate::stateful::constants::{
    PubSubStatefulMessageFlags, SubscriberToBroadcasterStatefulMessageType,
};
use crate::stateful::generic_parser::S2BMessageParser;
use crate::stateful::parser_helpers::{
    parse_authorization, parse_simple_headers, parse_utf8, PayloadReader,
};
use crate::stateful::serializer_helpers::{serialize_simple_message, SerializeMessage};

const EXACT_HEADERS: [&str; 2] = ["authorization", "x-topic"];
const GLOB_HEADERS: [&str; 2] = ["authorization", "x-glob"];

fn authorization_bytes(authorization: &Option<String>) -> &[u8] {
    authorization.as_deref().unwrap_or_default().as_bytes()
}

/// Subscriber to broadcaster: subscribe to one topic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BSubscribeExact {
    /// Authorization for `websocket:<nonce>:<ctr>`, if any.
    pub authorization: Option<String>,
    /// The topic to subscribe to.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub topic: Vec<u8>,
}

/// Subscriber to broadcaster: subscribe to every topic matching a glob.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BSubscribeGlob {
    /// Authorization for `websocket:<nonce>:<ctr>`, if any.
    pub authorization: Option<String>,
    /// The glob pattern to subscribe to.
    pub glob: String,
}

/// Subscriber to broadcaster: undo an exact subscription.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BUnsubscribeExact {
    /// Authorization for `websocket:<nonce>:<ctr>`, if any.
    pub authorization: Option<String>,
    /// The topic to unsubscribe from.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub topic: Vec<u8>,
}

/// Subscriber to broadcaster: undo a glob subscription.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BUnsubscribeGlob {
    /// Authorization for `websocket:<nonce>:<ctr>`, if any.
    pub authorization: Option<String>,
    /// The glob pattern to unsubscribe from.
    pub glob: String,
}

impl S2BMessageParser for S2BSubscribeExact {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::SubscribeExact]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [authorization, topic] = parse_simple_headers(flags, payload, &EXACT_HEADERS)?;
        Ok(Self {
            authorization: parse_authorization(authorization)?,
            topic,
        })
    }
}

impl SerializeMessage for S2BSubscribeExact {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::SubscribeExact,
            &EXACT_HEADERS,
            &[
                authorization_bytes(&self.authorization),
                self.topic.as_slice(),
            ],
            minimal_headers,
            &[],
        )
    }
}

impl S2BMessageParser for S2BSubscribeGlob {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::SubscribeGlob]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [authorization, glob] = parse_simple_headers(flags, payload, &GLOB_HEADERS)?;
        Ok(Self {
            authorization: parse_authorization(authorization)?,
            glob: parse_utf8(glob, "x-glob")?,
        })
    }
}

impl SerializeMessage for S2BSubscribeGlob {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::SubscribeGlob,
            &GLOB_HEADERS,
            &[
                authorization_bytes(&self.authorization),
                self.glob.as_bytes(),
            ],
            minimal_headers,
            &[],
        )
    }
}

impl S2BMessageParser for S2BUnsubscribeExact {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::UnsubscribeExact]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [authorization, topic] = parse_simple_headers(flags, payload, &EXACT_HEADERS)?;
        Ok(Self {
            authorization: parse_authorization(authorization)?,
            topic,
        })
    }
}

impl SerializeMessage for S2BUnsubscribeExact {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::UnsubscribeExact,
            &EXACT_HEADERS,
            &[
                authorization_bytes(&self.authorization),
                self.topic.as_slice(),
            ],
            minimal_headers,
            &[],
        )
    }
}

impl S2BMessageParser for S2BUnsubscribeGlob {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::UnsubscribeGlob]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [authorization, glob] = parse_simple_headers(flags, payload, &GLOB_HEADERS)?;
        Ok(Self {
            authorization: parse_authorization(authorization)?,
            glob: parse_utf8(glob, "x-glob")?,
        })
    }
}

impl SerializeMessage for S2BUnsubscribeGlob {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::UnsubscribeGlob,
            &GLOB_HEADERS,
            &[
                authorization_bytes(&self.authorization),
                self.glob.as_bytes(),
            ],
            minimal_headers,
            &[],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stateful::generic_parser::S2BMessage;

    #[test]
    fn test_subscribe_exact_with_authorization() {
        let message = S2BSubscribeExact {
            authorization: Some("Bearer abc".to_owned()),
            topic: b"orders/1".to_vec(),
        };
        let bytes = message.serialize(true).unwrap();
        assert_eq!(
            S2BMessage::parse(&bytes).unwrap(),
            S2BMessage::SubscribeExact(message)
        );
    }

    #[test]
    fn test_empty_authorization_is_none() {
        let message = S2BUnsubscribeGlob {
            authorization: None,
            glob: "orders/*".to_owned(),
        };
        let bytes = message.serialize(false).unwrap();
        let S2BMessage::UnsubscribeGlob(parsed) = S2BMessage::parse(&bytes).unwrap() else {
            panic!("wrong message type");
        };
        assert_eq!(parsed.authorization, None);
        assert_eq!(parsed.glob, "orders/*");
    }

    #[test]
    fn test_glob_must_be_utf8() {
        let values: [&[u8]; 2] = [b"", &[0xff, 0xfe]];
        let bytes = serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::SubscribeGlob,
            &GLOB_HEADERS,
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
    fn test_exact_topic_is_binary() {
        let message = S2BUnsubscribeExact {
            authorization: None,
            topic: vec![0, 159, 146, 150],
        };
        let bytes = message.serialize(true).unwrap();
        assert_eq!(
            S2BMessage::parse(&bytes).unwrap(),
            S2BMessage::UnsubscribeExact(message)
        );
    }

    #[test]
    fn test_subscribe_glob_expanded() {
        let message = S2BSubscribeGlob {
            authorization: Some("token".to_owned()),
            glob: "a/**".to_owned(),
        };
        let bytes = message.serialize(false).unwrap();
        assert_eq!(
            S2BMessage::parse(&bytes).unwrap(),
            S2BMessage::SubscribeGlob(message)
        );
    }
}
