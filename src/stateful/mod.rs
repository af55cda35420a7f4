// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Stateful protocol.
//!
//! Binary messages exchanged over a long lived connection between a
//! subscriber and a broadcaster. Every message starts with two big-endian
//! `u16` values, the flags and the message type, followed by a header block
//! and the body.
//!

pub mod auth;
pub mod constants;
pub mod generic_parser;
pub mod messages;
pub mod parser_helpers;
pub mod serializer_helpers;
pub mod stream_assembler;

pub use constants::{
    BroadcasterToSubscriberStatefulMessageType, PubSubStatefulMessageFlags,
    SubscriberToBroadcasterStatefulMessageType,
};
pub use generic_parser::{B2SMessage, B2SMessageParser, S2BMessage, S2BMessageParser};
pub use serializer_helpers::SerializeMessage;
pub use stream_assembler::{split_notification, AssembledNotification, StreamAssembler};
