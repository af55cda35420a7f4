// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

/// Default largest payload per stream part, 16 MiB.
pub const DEFAULT_STREAM_PART_SIZE: usize = 16 * 1024 * 1024;
/// Default largest compressed notification accepted, 1 GiB.
pub const DEFAULT_MAX_NOTIFICATION_SIZE: u64 = 1024 * 1024 * 1024;

/// Codec settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PubSubSettings {
    /// Send headers as values only.
    pub minimal_headers: bool,
    /// Largest payload per stream part when splitting notifications.
    pub stream_part_size: usize,
    /// Largest compressed notification accepted when assembling streams.
    pub max_notification_size: u64,
}

impl Default for PubSubSettings {
    fn default() -> Self {
        Self {
            minimal_headers: true,
            stream_part_size: DEFAULT_STREAM_PART_SIZE,
            max_notification_size: DEFAULT_MAX_NOTIFICATION_SIZE,
        }
    }
}
