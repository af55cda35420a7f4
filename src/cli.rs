// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Command line interface.
//!
//! Inspect and produce stateful messages from a shell. Output is returned as
//! text so the binary only has to print it.
//!

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    config::build_config,
    error::ProtocolError,
    settings::PubSubSettings,
    stateful::{
        auth::{connection_nonce, generate_nonce, websocket_url},
        messages::{NotificationHeaders, S2BNotifyStream},
        split_notification, B2SMessage, S2BMessage, SerializeMessage, StreamAssembler,
    },
};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(name = "lonelypsp", version, about = "Stateful pub/sub message tool")]
pub struct Args {
    /// Configuration file (json, yaml or toml).
    #[arg(short, long, default_value = "")]
    pub config: String,
    /// Ignore LONELYPSP_* environment variables.
    #[arg(long)]
    pub no_env: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Which side sent a message.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Subscriber to broadcaster.
    S2b,
    /// Broadcaster to subscriber.
    B2s,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode a hex encoded message and print it as JSON.
    Decode {
        #[arg(value_enum)]
        direction: Direction,
        /// The message, hex encoded.
        message: String,
    },
    /// Print a random 32 byte nonce contribution, hex encoded.
    Nonce,
    /// Print the url an authorization header signs.
    AuthUrl {
        /// Subscriber nonce contribution, hex encoded.
        subscriber_nonce: String,
        /// Broadcaster nonce contribution, hex encoded.
        broadcaster_nonce: String,
        /// Counter value; negative for subscriber messages.
        #[arg(allow_negative_numbers = true)]
        counter: i64,
    },
    /// Split a compressed body into NOTIFY_STREAM messages, one hex line each.
    Split {
        /// Topic of the notification.
        #[arg(long)]
        topic: String,
        /// Identifier shared by every part.
        #[arg(long)]
        identifier: String,
        /// Compressor used on the body, 0 for none.
        #[arg(long, default_value_t = 0)]
        compressor: u64,
        /// Decompressed length; defaults to the body length.
        #[arg(long)]
        decompressed_length: Option<u64>,
        /// File holding the compressed body.
        file: PathBuf,
    },
    /// Rebuild notifications from NOTIFY_STREAM messages, one hex line each,
    /// and print them as JSON.
    Assemble {
        /// File holding the parts, as printed by `split`.
        file: PathBuf,
    },
}

/// Load settings and run a command.
///
/// # Errors
///
/// * `ProtocolError::Config` - the settings cannot be loaded
/// * any error of the command
///
pub fn run(args: Args) -> Result<String, ProtocolError> {
    let settings = build_config(!args.no_env, &args.config)?;
    execute(&settings, args.command)
}

/// Run a command with the given settings.
pub fn execute(settings: &PubSubSettings, command: Command) -> Result<String, ProtocolError> {
    match command {
        Command::Decode { direction, message } => {
            let bytes = decode_hex(&message, "message")?;
            match direction {
                Direction::S2b => to_json(&S2BMessage::parse(&bytes)?),
                Direction::B2s => to_json(&B2SMessage::parse(&bytes)?),
            }
        }
        Command::Nonce => Ok(hex::encode(generate_nonce())),
        Command::AuthUrl {
            subscriber_nonce,
            broadcaster_nonce,
            counter,
        } => {
            let subscriber = decode_nonce(&subscriber_nonce, "subscriber nonce")?;
            let broadcaster = decode_nonce(&broadcaster_nonce, "broadcaster nonce")?;
            Ok(websocket_url(&connection_nonce(&subscriber, &broadcaster), counter))
        }
        Command::Split {
            topic,
            identifier,
            compressor,
            decompressed_length,
            file,
        } => {
            let body = read_file(&file)?;
            let headers = NotificationHeaders::for_body(
                topic.into_bytes(),
                compressor,
                decompressed_length.unwrap_or(body.len() as u64),
                &body,
            );
            let parts = split_notification(
                identifier.as_bytes(),
                headers,
                &body,
                settings.stream_part_size,
                |_| None,
            )?;
            log::debug!("split {} bytes into {} parts", body.len(), parts.len());
            let lines = parts
                .into_iter()
                .map(|part| {
                    S2BNotifyStream { part }
                        .serialize(settings.minimal_headers)
                        .map(hex::encode)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(lines.join("\n"))
        }
        Command::Assemble { file } => {
            let bytes = read_file(&file)?;
            let text = String::from_utf8_lossy(&bytes);
            let mut assembler = StreamAssembler::new(settings.max_notification_size);
            let mut notifications = Vec::new();
            for line in text.lines().filter(|line| !line.trim().is_empty()) {
                let message = S2BMessage::parse(&decode_hex(line, "part")?)?;
                let S2BMessage::NotifyStream(message) = message else {
                    return Err(ProtocolError::InvalidParameter(
                        "every line must be a NOTIFY_STREAM message".to_owned(),
                    ));
                };
                if let Some(notification) = assembler.push(message.part)? {
                    notifications.push(notification);
                }
            }
            if assembler.in_progress() {
                return Err(ProtocolError::Stream("stream ended before its last part".to_owned()));
            }
            log::debug!("assembled {} notifications", notifications.len());
            to_json(&notifications)
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, ProtocolError> {
    std::fs::read(path)
        .map_err(|e| ProtocolError::Io(format!("Error reading {}: {}", path.display(), e)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ProtocolError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ProtocolError::InvalidParameter(format!("Error encoding json: {}", e)))
}

fn decode_hex(value: &str, what: &str) -> Result<Vec<u8>, ProtocolError> {
    hex::decode(value.trim())
        .map_err(|e| ProtocolError::InvalidParameter(format!("Invalid {}: {}", what, e)))
}

fn decode_nonce(value: &str, what: &str) -> Result<[u8; 32], ProtocolError> {
    <[u8; 32]>::try_from(decode_hex(value, what)?.as_slice())
        .map_err(|_| ProtocolError::InvalidParameter(format!("{} must be 32 bytes", what)))
}
