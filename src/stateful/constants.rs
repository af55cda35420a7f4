// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Stateful protocol constants.
//!
//! Message flags and the per-direction message type discriminators. Both
//! discriminator enums start at 1 and are encoded as big-endian `u16`.
//!

use std::fmt;
use std::ops::BitOr;

use serde::Serialize;

use crate::error::ProtocolError;

/// Flags sent in the first two bytes of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct PubSubStatefulMessageFlags(u16);

impl PubSubStatefulMessageFlags {
    /// No flags set; headers are sent as (name, value) pairs.
    pub const NONE: Self = Self(0);
    /// Headers are sent as values only, in the order defined by the message type.
    ///
    /// Useful once every broadcaster and subscriber runs the same version; the
    /// expanded form tolerates version mismatches at the cost of overhead.
    pub const MINIMAL_HEADERS: Self = Self(1 << 0);

    /// Build flags from their wire representation. Unknown bits are kept.
    pub fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Wire representation.
    pub fn bits(self) -> u16 {
        self.0
    }

    /// Whether every bit in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Flags for the requested header mode.
    pub fn for_headers(minimal_headers: bool) -> Self {
        if minimal_headers {
            Self::MINIMAL_HEADERS
        } else {
            Self::NONE
        }
    }
}

impl BitOr for PubSubStatefulMessageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

macro_rules! message_type_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident = $value:literal,)+ }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        #[repr(u16)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            /// Every message type for this direction, in discriminator order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];
        }

        impl TryFrom<u16> for $name {
            type Error = ProtocolError;

            fn try_from(value: u16) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(ProtocolError::UnknownMessageType(other)),
                }
            }
        }

        impl From<$name> for u16 {
            fn from(value: $name) -> u16 {
                value as u16
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Debug::fmt(self, f)
            }
        }
    };
}

message_type_enum! {
    /// Message types a subscriber can send to a broadcaster.
    SubscriberToBroadcasterStatefulMessageType {
        /// First message on the wire; negotiates compression and the connection nonce.
        Configure = 1,
        /// Subscribe to a specific topic.
        SubscribeExact = 2,
        /// Subscribe to every topic matching a glob pattern.
        SubscribeGlob = 3,
        /// Undo a previous exact subscription.
        UnsubscribeExact = 4,
        /// Undo a previous glob subscription.
        UnsubscribeGlob = 5,
        /// Publish a notification contained in a single message.
        Notify = 6,
        /// Publish a notification split across several messages.
        NotifyStream = 7,
        /// Ask the broadcaster for the next part of a received stream.
        ContinueReceive = 8,
        /// Acknowledge a fully received and processed notification.
        ConfirmReceive = 9,
    }
}

message_type_enum! {
    /// Message types a broadcaster can send to a subscriber.
    BroadcasterToSubscriberStatefulMessageType {
        /// Response to `Configure`, carrying the broadcaster's nonce contribution.
        ConfirmConfigure = 1,
        /// The subscriber now receives notifications for a topic.
        ConfirmSubscribeExact = 2,
        /// The subscriber now receives notifications for a glob pattern.
        ConfirmSubscribeGlob = 3,
        /// The subscriber no longer receives notifications for a topic.
        ConfirmUnsubscribeExact = 4,
        /// The subscriber no longer receives notifications for a glob pattern.
        ConfirmUnsubscribeGlob = 5,
        /// The broadcaster finished processing a notification.
        ConfirmNotify = 6,
        /// The broadcaster expects more parts of a streamed notification.
        ContinueNotify = 7,
        /// A notification on a subscribed topic, possibly split across messages.
        ReceiveStream = 8,
        /// A preset compression dictionary may now be used.
        EnableZstdPreset = 9,
        /// A freshly trained compression dictionary may now be used.
        EnableZstdCustom = 10,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_types_start_at_one() {
        assert_eq!(
            SubscriberToBroadcasterStatefulMessageType::try_from(1).unwrap(),
            SubscriberToBroadcasterStatefulMessageType::Configure
        );
        assert_eq!(
            u16::from(SubscriberToBroadcasterStatefulMessageType::ConfirmReceive),
            9
        );
        assert_eq!(
            u16::from(BroadcasterToSubscriberStatefulMessageType::EnableZstdCustom),
            10
        );
    }

    #[test]
    fn test_unknown_message_type() {
        assert_eq!(
            SubscriberToBroadcasterStatefulMessageType::try_from(0),
            Err(ProtocolError::UnknownMessageType(0))
        );
        assert_eq!(
            BroadcasterToSubscriberStatefulMessageType::try_from(11),
            Err(ProtocolError::UnknownMessageType(11))
        );
    }

    #[test]
    fn test_flags() {
        let flags = PubSubStatefulMessageFlags::from_bits(0b101);
        assert!(flags.contains(PubSubStatefulMessageFlags::MINIMAL_HEADERS));
        assert_eq!(flags.bits(), 0b101);
        let expanded = PubSubStatefulMessageFlags::for_headers(false);
        assert!(!expanded.contains(PubSubStatefulMessageFlags::MINIMAL_HEADERS));
        assert_eq!(
            PubSubStatefulMessageFlags::NONE | PubSubStatefulMessageFlags::MINIMAL_HEADERS,
            PubSubStatefulMessageFlags::MINIMAL_HEADERS
        );
    }
}
