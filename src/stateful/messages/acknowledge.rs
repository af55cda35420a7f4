// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Acknowledgements.
//!
//! Flow control and completion messages for notifications in both directions.
//!

use crate::error::ProtocolError;
use crate::stateful::constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
    SubscriberToBroadcasterStatefulMessageType,
};
use crate::stateful::generic_parser::{B2SMessageParser, S2BMessageParser};
use crate::stateful::parser_helpers::{
    check_identifier, parse_simple_headers, parse_unsigned, PayloadReader,
};
use crate::stateful::serializer_helpers::{
    int_to_minimal_unsigned, serialize_simple_message, SerializeMessage,
};

const IDENTIFIER_PART_HEADERS: [&str; 2] = ["x-identifier", "x-part-id"];
const IDENTIFIER_HEADERS: [&str; 1] = ["x-identifier"];
const CONFIRM_NOTIFY_HEADERS: [&str; 2] = ["x-identifier", "x-subscribers"];

/// Subscriber to broadcaster: ready for the part after `part_id`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BContinueReceive {
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
    /// Last part received.
    pub part_id: u64,
}

impl S2BMessageParser for S2BContinueReceive {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::ContinueReceive]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [identifier, part_id] = parse_simple_headers(flags, payload, &IDENTIFIER_PART_HEADERS)?;
        Ok(Self {
            identifier: check_identifier(identifier)?,
            part_id: parse_unsigned(&part_id, 8, "x-part-id")?,
        })
    }
}

impl SerializeMessage for S2BContinueReceive {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::ContinueReceive,
            &IDENTIFIER_PART_HEADERS,
            &[
                check_identifier(self.identifier.clone())?,
                int_to_minimal_unsigned(self.part_id),
            ],
            minimal_headers,
            &[],
        )
    }
}

/// Subscriber to broadcaster: the notification was received and processed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct S2BConfirmReceive {
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
}

impl S2BMessageParser for S2BConfirmReceive {
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType] {
        &[SubscriberToBroadcasterStatefulMessageType::ConfirmReceive]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [identifier] = parse_simple_headers(flags, payload, &IDENTIFIER_HEADERS)?;
        Ok(Self {
            identifier: check_identifier(identifier)?,
        })
    }
}

impl SerializeMessage for S2BConfirmReceive {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            SubscriberToBroadcasterStatefulMessageType::ConfirmReceive,
            &IDENTIFIER_HEADERS,
            &[check_identifier(self.identifier.clone())?],
            minimal_headers,
            &[],
        )
    }
}

/// Broadcaster to subscriber: the notification was processed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SConfirmNotify {
    /// Identifier assigned by the subscriber; max 64 bytes.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
    /// How many subscribers were successfully notified.
    pub subscribers: u64,
}

impl B2SMessageParser for B2SConfirmNotify {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ConfirmNotify]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [identifier, subscribers] =
            parse_simple_headers(flags, payload, &CONFIRM_NOTIFY_HEADERS)?;
        Ok(Self {
            identifier: check_identifier(identifier)?,
            subscribers: parse_unsigned(&subscribers, 8, "x-subscribers")?,
        })
    }
}

impl SerializeMessage for B2SConfirmNotify {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ConfirmNotify,
            &CONFIRM_NOTIFY_HEADERS,
            &[
                check_identifier(self.identifier.clone())?,
                int_to_minimal_unsigned(self.subscribers),
            ],
            minimal_headers,
            &[],
        )
    }
}

/// Broadcaster to subscriber: expecting the part after `part_id`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct B2SContinueNotify {
    /// Identifier assigned by the subscriber; max 64 bytes.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
    /// The part id the broadcaster received.
    pub part_id: u64,
}

impl B2SMessageParser for B2SContinueNotify {
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType] {
        &[BroadcasterToSubscriberStatefulMessageType::ContinueNotify]
    }

    fn parse(
        flags: PubSubStatefulMessageFlags,
        _message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError> {
        let [identifier, part_id] = parse_simple_headers(flags, payload, &IDENTIFIER_PART_HEADERS)?;
        Ok(Self {
            identifier: check_identifier(identifier)?,
            part_id: parse_unsigned(&part_id, 8, "x-part-id")?,
        })
    }
}

impl SerializeMessage for B2SContinueNotify {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        serialize_simple_message(
            BroadcasterToSubscriberStatefulMessageType::ContinueNotify,
            &IDENTIFIER_PART_HEADERS,
            &[
                check_identifier(self.identifier.clone())?,
                int_to_minimal_unsigned(self.part_id),
            ],
            minimal_headers,
            &[],
        )
    }
}
