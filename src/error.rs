// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Protocol errors.
//!
//! This module contains the different errors that can be returned while parsing,
//! serializing or reassembling stateful pub/sub messages.
//!

use thiserror::Error;

/// Protocol errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Invalid parameter.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    /// The message ended before a declared length was satisfied.
    #[error("Unexpected end of message: {0}")]
    Truncated(String),
    /// The message type is not known for the direction.
    #[error("Unknown message type: {0}")]
    UnknownMessageType(u16),
    /// A required header is absent.
    #[error("Missing header: {0}")]
    MissingHeader(String),
    /// A header name appeared more than once in an expanded header block.
    #[error("Duplicate header: {0}")]
    DuplicateHeader(String),
    /// A header value is malformed.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
    /// A header name or value does not fit in 65535 bytes.
    #[error("Header too long: {0}")]
    HeaderTooLong(String),
    /// A streamed notification broke the part sequence rules.
    #[error("Stream error: {0}")]
    Stream(String),
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}
