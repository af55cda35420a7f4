// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Generic parser.
//!
//! Parser traits implemented by every message, and the tagged unions that
//! decode a whole message for either direction.
//!

use crate::error::ProtocolError;

use super::constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
    SubscriberToBroadcasterStatefulMessageType,
};
use super::messages::{
    B2SConfirmConfigure, B2SConfirmNotify, B2SConfirmSubscribeExact, B2SConfirmSubscribeGlob,
    B2SConfirmUnsubscribeExact, B2SConfirmUnsubscribeGlob, B2SContinueNotify, B2SEnableZstdCustom,
    B2SEnableZstdPreset, B2SReceiveStream, S2BConfigure, S2BConfirmReceive, S2BContinueReceive,
    S2BNotify, S2BNotifyStream, S2BSubscribeExact, S2BSubscribeGlob, S2BUnsubscribeExact,
    S2BUnsubscribeGlob,
};
use super::parser_helpers::{parse_prefix, PayloadReader};
use super::serializer_helpers::SerializeMessage;

/// Parses the subscriber to broadcaster messages of the types it is relevant for.
pub trait S2BMessageParser: Sized {
    /// Message types this parser handles.
    fn relevant_types() -> &'static [SubscriberToBroadcasterStatefulMessageType];

    /// Parse the headers and body following the message prefix.
    ///
    /// # Arguments
    ///
    /// * `flags` - Flags from the message prefix
    /// * `message_type` - One of [`S2BMessageParser::relevant_types`]
    /// * `payload` - Reader positioned after the prefix
    ///
    fn parse(
        flags: PubSubStatefulMessageFlags,
        message_type: SubscriberToBroadcasterStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError>;
}

/// Parses the broadcaster to subscriber messages of the types it is relevant for.
pub trait B2SMessageParser: Sized {
    /// Message types this parser handles.
    fn relevant_types() -> &'static [BroadcasterToSubscriberStatefulMessageType];

    /// Parse the headers and body following the message prefix.
    ///
    /// # Arguments
    ///
    /// * `flags` - Flags from the message prefix
    /// * `message_type` - One of [`B2SMessageParser::relevant_types`]
    /// * `payload` - Reader positioned after the prefix
    ///
    fn parse(
        flags: PubSubStatefulMessageFlags,
        message_type: BroadcasterToSubscriberStatefulMessageType,
        payload: &mut PayloadReader<'_>,
    ) -> Result<Self, ProtocolError>;
}

/// Any message a subscriber can send to a broadcaster.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum S2BMessage {
    Configure(S2BConfigure),
    SubscribeExact(S2BSubscribeExact),
    SubscribeGlob(S2BSubscribeGlob),
    UnsubscribeExact(S2BUnsubscribeExact),
    UnsubscribeGlob(S2BUnsubscribeGlob),
    Notify(S2BNotify),
    NotifyStream(S2BNotifyStream),
    ContinueReceive(S2BContinueReceive),
    ConfirmReceive(S2BConfirmReceive),
}

impl S2BMessage {
    /// Parse a complete message.
    ///
    /// # Errors
    ///
    /// * `ProtocolError::Truncated` - the message is cut short
    /// * `ProtocolError::UnknownMessageType` - the type is not a subscriber to broadcaster type
    /// * any error of the specific message parser
    ///
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        use SubscriberToBroadcasterStatefulMessageType as T;

        let mut payload = PayloadReader::new(data);
        let (flags, raw_type) = parse_prefix(&mut payload)?;
        let message_type = T::try_from(raw_type)?;
        log::trace!(
            "parsing {} ({} bytes, flags {:#06x})",
            message_type,
            data.len(),
            flags.bits()
        );
        let reader = &mut payload;
        let message = match message_type {
            T::Configure => Self::Configure(S2BConfigure::parse(flags, message_type, reader)?),
            T::SubscribeExact => {
                Self::SubscribeExact(S2BSubscribeExact::parse(flags, message_type, reader)?)
            }
            T::SubscribeGlob => {
                Self::SubscribeGlob(S2BSubscribeGlob::parse(flags, message_type, reader)?)
            }
            T::UnsubscribeExact => {
                Self::UnsubscribeExact(S2BUnsubscribeExact::parse(flags, message_type, reader)?)
            }
            T::UnsubscribeGlob => {
                Self::UnsubscribeGlob(S2BUnsubscribeGlob::parse(flags, message_type, reader)?)
            }
            T::Notify => Self::Notify(S2BNotify::parse(flags, message_type, reader)?),
            T::NotifyStream => {
                Self::NotifyStream(S2BNotifyStream::parse(flags, message_type, reader)?)
            }
            T::ContinueReceive => {
                Self::ContinueReceive(S2BContinueReceive::parse(flags, message_type, reader)?)
            }
            T::ConfirmReceive => {
                Self::ConfirmReceive(S2BConfirmReceive::parse(flags, message_type, reader)?)
            }
        };
        if payload.remaining() != 0 {
            log::debug!("{} left {} unread bytes", message_type, payload.remaining());
        }
        Ok(message)
    }

    /// Discriminator of this message.
    pub fn message_type(&self) -> SubscriberToBroadcasterStatefulMessageType {
        use SubscriberToBroadcasterStatefulMessageType as T;

        match self {
            Self::Configure(_) => T::Configure,
            Self::SubscribeExact(_) => T::SubscribeExact,
            Self::SubscribeGlob(_) => T::SubscribeGlob,
            Self::UnsubscribeExact(_) => T::UnsubscribeExact,
            Self::UnsubscribeGlob(_) => T::UnsubscribeGlob,
            Self::Notify(_) => T::Notify,
            Self::NotifyStream(_) => T::NotifyStream,
            Self::ContinueReceive(_) => T::ContinueReceive,
            Self::ConfirmReceive(_) => T::ConfirmReceive,
        }
    }
}

impl SerializeMessage for S2BMessage {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::Configure(message) => message.serialize(minimal_headers),
            Self::SubscribeExact(message) => message.serialize(minimal_headers),
            Self::SubscribeGlob(message) => message.serialize(minimal_headers),
            Self::UnsubscribeExact(message) => message.serialize(minimal_headers),
            Self::UnsubscribeGlob(message) => message.serialize(minimal_headers),
            Self::Notify(message) => message.serialize(minimal_headers),
            Self::NotifyStream(message) => message.serialize(minimal_headers),
            Self::ContinueReceive(message) => message.serialize(minimal_headers),
            Self::ConfirmReceive(message) => message.serialize(minimal_headers),
        }
    }
}

/// Any message a broadcaster can send to a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum B2SMessage {
    ConfirmConfigure(B2SConfirmConfigure),
    ConfirmSubscribeExact(B2SConfirmSubscribeExact),
    ConfirmSubscribeGlob(B2SConfirmSubscribeGlob),
    ConfirmUnsubscribeExact(B2SConfirmUnsubscribeExact),
    ConfirmUnsubscribeGlob(B2SConfirmUnsubscribeGlob),
    ConfirmNotify(B2SConfirmNotify),
    ContinueNotify(B2SContinueNotify),
    ReceiveStream(B2SReceiveStream),
    EnableZstdPreset(B2SEnableZstdPreset),
    EnableZstdCustom(B2SEnableZstdCustom),
}

impl B2SMessage {
    /// Parse a complete message.
    ///
    /// # Errors
    ///
    /// * `ProtocolError::Truncated` - the message is cut short
    /// * `ProtocolError::UnknownMessageType` - the type is not a broadcaster to subscriber type
    /// * any error of the specific message parser
    ///
    pub fn parse(data: &[u8]) -> Result<Self, ProtocolError> {
        use BroadcasterToSubscriberStatefulMessageType as T;

        let mut payload = PayloadReader::new(data);
        let (flags, raw_type) = parse_prefix(&mut payload)?;
        let message_type = T::try_from(raw_type)?;
        log::trace!(
            "parsing {} ({} bytes, flags {:#06x})",
            message_type,
            data.len(),
            flags.bits()
        );
        let reader = &mut payload;
        let message = match message_type {
            T::ConfirmConfigure => {
                Self::ConfirmConfigure(B2SConfirmConfigure::parse(flags, message_type, reader)?)
            }
            T::ConfirmSubscribeExact => Self::ConfirmSubscribeExact(
                B2SConfirmSubscribeExact::parse(flags, message_type, reader)?,
            ),
            T::ConfirmSubscribeGlob => Self::ConfirmSubscribeGlob(
                B2SConfirmSubscribeGlob::parse(flags, message_type, reader)?,
            ),
            T::ConfirmUnsubscribeExact => Self::ConfirmUnsubscribeExact(
                B2SConfirmUnsubscribeExact::parse(flags, message_type, reader)?,
            ),
            T::ConfirmUnsubscribeGlob => Self::ConfirmUnsubscribeGlob(
                B2SConfirmUnsubscribeGlob::parse(flags, message_type, reader)?,
            ),
            T::ConfirmNotify => {
                Self::ConfirmNotify(B2SConfirmNotify::parse(flags, message_type, reader)?)
            }
            T::ContinueNotify => {
                Self::ContinueNotify(B2SContinueNotify::parse(flags, message_type, reader)?)
            }
            T::ReceiveStream => {
                Self::ReceiveStream(B2SReceiveStream::parse(flags, message_type, reader)?)
            }
            T::EnableZstdPreset => {
                Self::EnableZstdPreset(B2SEnableZstdPreset::parse(flags, message_type, reader)?)
            }
            T::EnableZstdCustom => {
                Self::EnableZstdCustom(B2SEnableZstdCustom::parse(flags, message_type, reader)?)
            }
        };
        if payload.remaining() != 0 {
            log::debug!("{} left {} unread bytes", message_type, payload.remaining());
        }
        Ok(message)
    }

    /// Discriminator of this message.
    pub fn message_type(&self) -> BroadcasterToSubscriberStatefulMessageType {
        use BroadcasterToSubscriberStatefulMessageType as T;

        match self {
            Self::ConfirmConfigure(_) => T::ConfirmConfigure,
            Self::ConfirmSubscribeExact(_) => T::ConfirmSubscribeExact,
            Self::ConfirmSubscribeGlob(_) => T::ConfirmSubscribeGlob,
            Self::ConfirmUnsubscribeExact(_) => T::ConfirmUnsubscribeExact,
            Self::ConfirmUnsubscribeGlob(_) => T::ConfirmUnsubscribeGlob,
            Self::ConfirmNotify(_) => T::ConfirmNotify,
            Self::ContinueNotify(_) => T::ContinueNotify,
            Self::ReceiveStream(_) => T::ReceiveStream,
            Self::EnableZstdPreset(_) => T::EnableZstdPreset,
            Self::EnableZstdCustom(_) => T::EnableZstdCustom,
        }
    }
}

impl SerializeMessage for B2SMessage {
    fn serialize(&self, minimal_headers: bool) -> Result<Vec<u8>, ProtocolError> {
        match self {
            Self::ConfirmConfigure(message) => message.serialize(minimal_headers),
            Self::ConfirmSubscribeExact(message) => message.serialize(minimal_headers),
            Self::ConfirmSubscribeGlob(message) => message.serialize(minimal_headers),
            Self::ConfirmUnsubscribeExact(message) => message.serialize(minimal_headers),
            Self::ConfirmUnsubscribeGlob(message) => message.serialize(minimal_headers),
            Self::ConfirmNotify(message) => message.serialize(minimal_headers),
            Self::ContinueNotify(message) => message.serialize(minimal_headers),
            Self::ReceiveStream(message) => message.serialize(minimal_headers),
            Self::EnableZstdPreset(message) => message.serialize(minimal_headers),
            Self::EnableZstdCustom(message) => message.serialize(minimal_headers),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn s2b_relevant_types() -> Vec<&'static [SubscriberToBroadcasterStatefulMessageType]> {
        vec![
            S2BConfigure::relevant_types(),
            S2BSubscribeExact::relevant_types(),
            S2BSubscribeGlob::relevant_types(),
            S2BUnsubscribeExact::relevant_types(),
            S2BUnsubscribeGlob::relevant_types(),
            S2BNotify::relevant_types(),
            S2BNotifyStream::relevant_types(),
            S2BContinueReceive::relevant_types(),
            S2BConfirmReceive::relevant_types(),
        ]
    }

    fn b2s_relevant_types() -> Vec<&'static [BroadcasterToSubscriberStatefulMessageType]> {
        vec![
            B2SConfirmConfigure::relevant_types(),
            B2SConfirmSubscribeExact::relevant_types(),
            B2SConfirmSubscribeGlob::relevant_types(),
            B2SConfirmUnsubscribeExact::relevant_types(),
            B2SConfirmUnsubscribeGlob::relevant_types(),
            B2SConfirmNotify::relevant_types(),
            B2SContinueNotify::relevant_types(),
            B2SReceiveStream::relevant_types(),
            B2SEnableZstdPreset::relevant_types(),
            B2SEnableZstdCustom::relevant_types(),
        ]
    }

    #[test]
    fn test_every_s2b_type_has_one_parser() {
        let mut counts = HashMap::new();
        for types in s2b_relevant_types() {
            for message_type in types {
                *counts.entry(*message_type).or_insert(0) += 1;
            }
        }
        for message_type in SubscriberToBroadcasterStatefulMessageType::ALL {
            assert_eq!(counts.get(message_type), Some(&1), "{}", message_type);
        }
    }

    #[test]
    fn test_every_b2s_type_has_one_parser() {
        let mut counts = HashMap::new();
        for types in b2s_relevant_types() {
            for message_type in types {
                *counts.entry(*message_type).or_insert(0) += 1;
            }
        }
        for message_type in BroadcasterToSubscriberStatefulMessageType::ALL {
            assert_eq!(counts.get(message_type), Some(&1), "{}", message_type);
        }
    }

    #[test]
    fn test_message_type_matches_wire() {
        let message = S2BMessage::ConfirmReceive(S2BConfirmReceive {
            identifier: b"x".to_vec(),
        });
        let bytes = message.serialize(true).unwrap();
        assert_eq!(
            u16::from_be_bytes([bytes[2], bytes[3]]),
            u16::from(message.message_type())
        );
    }

    #[test]
    fn test_prefix_errors() {
        assert!(matches!(
            S2BMessage::parse(&[0, 1, 0]),
            Err(ProtocolError::Truncated(_))
        ));
        assert_eq!(
            B2SMessage::parse(&[0, 1, 0, 42]),
            Err(ProtocolError::UnknownMessageType(42))
        );
        assert_eq!(
            S2BMessage::parse(&[0, 1, 0, 10]),
            Err(ProtocolError::UnknownMessageType(10))
        );
    }

    #[test]
    fn test_direction_matters() {
        let bytes = S2BConfirmReceive {
            identifier: b"abc".to_vec(),
        }
        .serialize(true)
        .unwrap();
        // type 9 in the other direction is EnableZstdPreset, which needs more headers
        assert!(matches!(B2SMessage::parse(&bytes), Err(ProtocolError::Truncated(_))));
    }

    #[test]
    fn test_json_output_is_tagged() {
        let message = B2SMessage::ConfirmNotify(B2SConfirmNotify {
            identifier: vec![0xab],
            subscribers: 3,
        });
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "CONFIRM_NOTIFY");
        assert_eq!(json["identifier"], "ab");
        assert_eq!(json["subscribers"], 3);
    }
}
