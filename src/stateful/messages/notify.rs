// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Notifications.
//!
//! Headers shared by every message that starts a notification, and the
//! single message `Notify`.
//!

use sha2::{Digest, Sha512};

use crate::error::ProtocolError;
use crate::stateful::constants::{
    PubSubStatefulMessageFlags, SubscriberToBroadcasterStatefulMessageType,
};
use crate::stateful::generic_parser::S2BMessageParser;
use crate::stateful::parser_helpers::{
    check_identifier, parse_authorization, parse_fixed, parse_unsigned, MessageHeaders,
    PayloadReader,
};
use crate::stateful::serializer_helpers::{
    int_to_minimal_unsigned, serialize_simple_message, SerializeMessage,
};

/// Headers describing a whole notification, sent once per notification.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NotificationHeaders {
    /// Topic of the notification.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub topic: Vec<u8>,
    /// Compressor used on the body, 0 for none.
    pub compressor_id: u64,
    /// Total length of the compressed body.
    pub compressed_length: u64,
    /// Total length of the body once decompressed.
    pub decompressed_length: u64,
    /// SHA-512 of the whole compressed body.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub compressed_sha512: [u8; 64],
}

pub(crate) const NOTIFICATION_HEADER_NAMES: [&str; 5] = [
    "x-topic",
    "x-compressor",
    "x-compressed-length",
    "x-decompressed-length",
    "x-compressed-sha512",
];

impl NotificationHeaders {
    /// Describe `compressed_body` with a freshly computed digest.
    pub fn for_body(
        topic: Vec<u8>,
        compressor_id: u64,
        decompressed_length: u64,
        compressed_body: &[u8],
    ) -> Self {
        Self {
            topic,
            compressor_id,
            compressed_length: compressed_body.len() as u64,
            decompressed_length,
            compressed_sha512: sha512(compressed_body),
        }
    }

    pub(crate) fn from_values(values: [Vec<u8>; 5]) -> Result<Self, ProtocolError> {
        let [topic, compressor, compressed, decompressed, digest] = values;
        Ok(Self {
            topic,
            compressor_id: parse_unsigned(&compressor, 8, "x-compressor")?,
            compressed_length: parse_unsigned(&compressed, 8, "x-compressed-length")?,
            decompressed_length: parse_unsigned(&decompressed, 8, "x-decompressed-length")?,
            compressed_sha512: parse_fixed::<64>(&digest, "x-compressed-sha512")?,
        })
    }

    pub(crate) fn to_values(&self) -> [Vec<u8>; 5] {
        [
            self.topic.clone(),
            int_to_minimal_unsigned(self.compressor_id),
            int_to_minimal_unsigned(self.compressed_length),
            int_to_minimal_unsigned(self.decompressed_length),
            self.compressed_sha512.to_vec(),
        ]
    }

    /// Whether `compressed_body` matches the declared length and digest.
    pub fn matches(&self, compressed_body: &[u8]) -> bool {
        compressed_body.len() as u64 == self.compressed_length
            && sha512(compressed_body) == self.compressed_sha512
    }
}

/// SHA-512 of `data`.
pub fn sha512(data: &[u8]) -> [u8; 64] {
    let mut digest = [0u8; 64];
    digest.copy_from_slice(&Sha512::digest(data));
    digest
}

/// Subscriber to broadcaster: publish a notification in a single message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BNotify {
    /// Authorization for `websocket:<nonce>:<ctr>`, if any.
    pub authorization: Option<String>,
    /// Identifier the broadcaster echoes back in `ConfirmNotify`; max 64 bytes.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
    /// Description of the body.
    #[serde(flatten)]
    pub headers: NotificationHeaders,
    /// The compressed body.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub compressed_payload: Vec<u8>,
}

impl S2BNotify {
    /// Whether the body hashes to the declared digest.
    pub fn verify_sha512(&self) -> bool {
        self.headers.matches(&self.compressed_payload)
    }
}

const NOTIFY_LEADING_HEADERS: [&str; 2] = ["authorization", "x-identifier"];

impl S2BMessageParser for S2BNotify {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::Notify]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let mut headers = MessageHeaders::new(flags);
        let [authorization, identifier] = headers.take_array(payload, &NOTIFY_LEADING_HEADERS)?;
        let values = headers.take_array(payload, &NOTIFICATION_HEADER_NAMES)?;
        let notification = NotificationHeaders::from_values(values)?;
        let compressed_payload = payload.read_remaining().to_vec();
        if compressed_payload.len() as u64 != notification.compressed_length {
            return Err(ProtocolError::InvalidParameter(format!(
                "notify body is {} bytes but x-compressed-length is {}",
                compressed_payload.len(),
                notification.compressed_length
            )));
        }
        Ok(Self {
            authorization: parse_authorization(authorization)?,
            identifier: check_identifier(identifier)?,
            headers: notification,
            compressed_payload,
        })
    }
}

impl SerializeMessage for S2BNotify {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        check_identifier(self.identifier.clone())?;
        let mut names = NOTIFY_LEADING_HEADERS.to_vec();
        names.extend_from_slice(&NOTIFICATION_HEADER_NAMES);
        let mut values = vec![
            self.authorization.clone().unwrap_or_default().into_bytes(),
            self.identifier.clone(),
        ];
        values.extend(self.headers.to_values());
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::Notify,
            &names,
            &values,
            minimal_headers,
            &self.compressed_payload,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stateful::generic_parser::S2BMessage;

    fn notify(body: &[u8]) -> S2BNotify {
        S2BNotify {
            authorization: Some("auth".to_owned()),
            identifier: b"n-1".to_vec(),
            headers: NotificationHeaders::for_body(b"topic".to_vec(), 0, body.len() as u64, body),
            compressed_payload: body.to_vec(),
        }
    }

    #[test]
    fn test_notify_in_both_header_modes() {
        let message = notify(b"hello world");
        for minimal in [true, false] {
            let bytes = message.serialize(minimal).unwrap();
            let S2BMessage::Notify(parsed) = S2BMessage::parse(&bytes).unwrap() else {
                panic!("wrong message type");
            };
            assert!(parsed.verify_sha512());
            assert_eq!(parsed, message);
        }
    }

    #[test]
    fn test_notify_body_length_must_match() {
        let mut message = notify(b"hello");
        message.headers.compressed_length = 4;
        let bytes = message.serialize(true).unwrap();
        assert!(matches!(
            S2BMessage::parse(&bytes),
            Err(ProtocolError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_tampered_body_fails_verification() {
        let mut message = notify(b"hello");
        message.compressed_payload = b"jello".to_vec();
        assert!(!message.verify_sha512());
    }

    #[test]
    fn test_identifier_too_long() {
        let mut message = notify(b"x");
        message.identifier = vec![1; 65];
        assert!(matches!(
            message.serialize(true),
            Err(ProtocolError::InvalidHeader(_))
        ));
    }
}
