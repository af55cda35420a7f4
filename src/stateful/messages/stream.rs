// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Streamed notifications.
//!
//! `NotifyStream` (subscriber to broadcaster) and `ReceiveStream` (broadcaster
//! to subscriber) split one notification across several messages. Every part
//! carries the authorization, identifier and part id; part 0 additionally
//! carries the [`NotificationHeaders`].
//!

use crate::error::ProtocolError;
use crate::stateful::constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
    SubscriberToBroadcasterStatefulMessageType,
};
use crate::stateful::generic_parser::{B2SMessageParser, S2BMessageParser};
use crate::stateful::parser_helpers::{
    check_identifier, parse_authorization, parse_unsigned, MessageHeaders, PayloadReader,
};
use crate::stateful::serializer_helpers::{
    int_to_minimal_unsigned, serialize_simple_message, SerializeMessage,
};

use super::notify::{NotificationHeaders, NOTIFICATION_HEADER_NAMES};

const PART_HEADERS: [&str; 3] = ["authorization", "x-identifier", "x-part-id"];

/// One part of a streamed notification, in either direction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StreamPart {
    /// Authorization for `websocket:<nonce>:<ctr>`, if any.
    pub authorization: Option<String>,
    /// Relates the parts of one notification; max 64 bytes.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
    /// Starts at 0 and increments by 1 for each part.
    pub part_id: u64,
    /// Present exactly on part 0.
    pub first: Option<NotificationHeaders>,
    /// Bytes to append to the compressed body.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub payload: Vec<u8>,
}

impl StreamPart {
    fn parse(
        flags: PubSubStatefulMessageFlags,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let mut headers = MessageHeaders::new(flags);
        let [authorization, identifier, part_id] = headers.take_array(payload, &PART_HEADERS)?;
        let part_id = parse_unsigned(&part_id, 8, "x-part-id")?;
        let first = if part_id == 0 {
            Some(NotificationHeaders::from_values(
                headers.take_array(payload, &NOTIFICATION_HEADER_NAMES)?,
            )?)
        } else {
            None
        };
        Ok(Self {
            authorization: parse_authorization(authorization)?,
            identifier: check_identifier(identifier)?,
            part_id,
            first,
            payload: payload.read_remaining().to_vec(),
        })
    }

    fn serialize<T: Into<u16>>(
        &self,
        message_type: T,
        minimal_headers: bool,
    ) -> Result<Vec<u8>, ProtocolError> {
        check_identifier(self.identifier.clone())?;
        let mut names = PART_HEADERS.to_vec();
        let mut values = vec![
            self.authorization.clone().unwrap_or_default().into_bytes(),
            self.identifier.clone(),
            int_to_minimal_unsigned(self.part_id),
        ];
        match (self.part_id, &self.first) {
            (0, Some(first)) => {
                names.extend_from_slice(&NOTIFICATION_HEADER_NAMES);
                values.extend(first.to_values());
            }
            (0, None) => {
                return Err(ProtocolError::InvalidParameter(
                    "part 0 must carry the notification headers".to_owned(),
                ))
            }
            (_, Some(_)) => {
                return Err(ProtocolError::InvalidParameter(
                    "only part 0 may carry the notification headers".to_owned(),
                ))
            }
            (_, None) => {}
        }
        serialize_simple_message(
            message_type,
            &names,
            &values,
            minimal_headers,
            &self.payload,
        )
    }
}

/// Subscriber to broadcaster: one part of a published notification.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BNotifyStream {
    #[serde(flatten)]
    pub part: StreamPart,
}

impl S2BMessageParser for S2BNotifyStream {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::NotifyStream]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            part: StreamPart::parse(flags, payload)?,
        })
    }
}

impl SerializeMessage for S2BNotifyStream {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        self.part.serialize(
            SubscriberToBroadcasterStatefulMessageType::NotifyStream,
            minimal_headers,
        )
    }
}

/// Broadcaster to subscriber: one part of a notification on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SReceiveStream {
    #[serde(flatten)]
    pub part: StreamPart,
}

impl B2SMessageParser for B2SReceiveStream {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ReceiveStream]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        Ok(Self {
            part: StreamPart::parse(flags, payload)?,
        })
    }
}

impl SerializeMessage for B2SReceiveStream {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        self.part.serialize(
            BroadcasterToSubscriberStatefulMessageType::ReceiveStream,
            minimal_headers,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stateful::generic_parser::{B2SMessage, S2BMessage};

    fn first_part() -> StreamPart {
        StreamPart {
            authorization: Some("a".to_owned()),
            identifier: b"id".to_vec(),
            part_id: 0,
            first: Some(NotificationHeaders::for_body(b"t".to_vec(), 1, 10, b"abcd")),
            payload: b"ab".to_vec(),
        }
    }

    #[test]
    fn test_first_part_in_both_header_modes() {
        let message = S2BNotifyStream { part: first_part() };
        for minimal in [true, false] {
            let bytes = message.serialize(minimal).unwrap();
            assert_eq!(
                S2BMessage::parse(&bytes).unwrap(),
                S2BMessage::NotifyStream(message.clone())
            );
        }
    }

    #[test]
    fn test_later_part_has_no_notification_headers() {
        let message = B2SReceiveStream {
            part: StreamPart {
                authorization: None,
                identifier: b"id".to_vec(),
                part_id: 1,
                first: None,
                payload: b"cd".to_vec(),
            },
        };
        let first = B2SReceiveStream { part: first_part() };
        for minimal in [true, false] {
            let bytes = message.serialize(minimal).unwrap();
            assert!(bytes.len() < first.serialize(minimal).unwrap().len());
            assert_eq!(
                B2SMessage::parse(&bytes).unwrap(),
                B2SMessage::ReceiveStream(message.clone())
            );
        }
    }

    #[test]
    fn test_receive_stream_first_part_in_both_header_modes() {
        let message = B2SReceiveStream { part: first_part() };
        for minimal in [true, false] {
            let bytes = message.serialize(minimal).unwrap();
            assert_eq!(
                B2SMessage::parse(&bytes).unwrap(),
                B2SMessage::ReceiveStream(message.clone())
            );
        }
    }

    #[test]
    fn test_part_zero_requires_notification_headers() {
        let mut part = first_part();
        part.first = None;
        assert!(S2BNotifyStream { part }.serialize(true).is_err());

        let mut part = first_part();
        part.part_id = 2;
        assert!(S2BNotifyStream { part }.serialize(true).is_err());
    }

    #[test]
    fn test_expanded_part_zero_missing_topic() {
        let values: [&[u8]; 3] = [b"", b"id", b""];
        let bytes = serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::NotifyStream,
            &PART_HEADERS,
            &values,
            false,
            b"",
        )
        .unwrap();
        assert_eq!(
            S2BMessage::parse(&bytes),
            Err(ProtocolError::MissingHeader("x-topic".to_owned()))
        );
    }
}
