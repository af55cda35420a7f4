// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Connection authorization.
//!
//! Authorization headers on a stateful connection sign the url
//! `websocket:<nonce>:<ctr>`. The nonce is `SHA256(subscriber_nonce ||
//! broadcaster_nonce)`; the counter is negative for messages from the
//! subscriber and positive for messages from the broadcaster, and moves by one
//! for every authorized message, including every part of a stream.
//!

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a 32 byte nonce contribution.
pub fn generate_nonce() -> [u8; 32] {
    let mut nonce = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}

/// Combine both contributions into the connection nonce.
pub fn connection_nonce(subscriber_nonce: &[u8; 32], broadcaster_nonce: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(subscriber_nonce);
    hasher.update(broadcaster_nonce);
    let mut nonce = [0u8; 32];
    nonce.copy_from_slice(&hasher.finalize());
    nonce
}

/// The url an authorization header signs for the given counter value.
pub fn websocket_url(connection_nonce: &[u8; 32], counter: i64) -> String {
    let counter = if counter < 0 {
        format!("-{:x}", counter.unsigned_abs())
    } else {
        format!("{:x}", counter)
    };
    let nonce = URL_SAFE.encode(connection_nonce);
    format!("websocket:{}:{}", nonce, counter)
}

/// Both authorization counters of one connection.
///
/// Each side tracks both counters so it can sign its own messages and check
/// the other side's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCounters {
    subscriber: i64,
    broadcaster: i64,
}

impl Default for AuthCounters {
    fn default() -> Self {
        Self {
            subscriber: -1,
            broadcaster: 1,
        }
    }
}

impl AuthCounters {
    /// Counters for a freshly configured connection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the counter for the next authorized subscriber message.
    pub fn next_subscriber(&mut self) -> i64 {
        let counter = self.subscriber;
        self.subscriber -= 1;
        counter
    }

    /// Take the counter for the next authorized broadcaster message.
    pub fn next_broadcaster(&mut self) -> i64 {
        let counter = self.broadcaster;
        self.broadcaster += 1;
        counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_encoding() {
        let nonce = [0u8; 32];
        let url = websocket_url(&nonce, 0x10ff_ffff_ffff_ffff);
        assert!(url.ends_with(":10ffffffffffffff"));
        assert!(websocket_url(&nonce, -0x1a).ends_with(":-1a"));
        assert!(websocket_url(&nonce, i64::MIN).ends_with(":-8000000000000000"));
    }

    #[test]
    fn test_nonce_is_base64url() {
        let url = websocket_url(&[0xfb; 32], 1);
        let encoded = url
            .strip_prefix("websocket:")
            .and_then(|rest| rest.strip_suffix(":1"))
            .unwrap();
        assert!(!encoded.contains('+') && !encoded.contains('/'));
        assert_eq!(URL_SAFE.decode(encoded).unwrap(), vec![0xfb; 32]);
    }

    #[test]
    fn test_connection_nonce_order_matters() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(connection_nonce(&a, &b), connection_nonce(&b, &a));

        let mut joined = a.to_vec();
        joined.extend_from_slice(&b);
        assert_eq!(
            connection_nonce(&a, &b).as_slice(),
            Sha256::digest(&joined).as_slice()
        );
    }

    #[test]
    fn test_counters() {
        let mut counters = AuthCounters::new();
        assert_eq!(counters.next_subscriber(), -1);
        assert_eq!(counters.next_subscriber(), -2);
        assert_eq!(counters.next_broadcaster(), 1);
        assert_eq!(counters.next_broadcaster(), 2);
        assert_eq!(counters.next_subscriber(), -3);
    }

    #[test]
    fn test_generated_nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }
}
