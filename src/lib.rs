// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

pub mod cli;
pub mod config;
pub mod error;
pub mod settings;
pub mod stateful;
pub use clap;

pub use error::ProtocolError;
pub use settings::PubSubSettings;
pub use stateful::{B2SMessage, S2BMessage, SerializeMessage};
