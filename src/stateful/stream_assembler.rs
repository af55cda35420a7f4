// Copyright 2024 Kore Ledger
// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Stream assembly.
//!
//! Splitting a notification into stream parts and rebuilding it on the other
//! side. Streams may never be weaved: a new notification can only start once
//! the previous one is complete.
//!

use crate::error::ProtocolError;

use super::messages::{NotificationHeaders, StreamPart};

/// A notification rebuilt from its parts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AssembledNotification {
    /// Identifier shared by every part.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub identifier: Vec<u8>,
    /// Headers from part 0.
    pub headers: NotificationHeaders,
    /// The complete compressed body, already checked against its digest.
    #[serde(serialize_with = "hex::serde::serialize")]
    pub compressed_payload: Vec<u8>,
}

#[derive(Debug)]
struct InProgress {
    identifier: Vec<u8>,
    headers: NotificationHeaders,
    last_part_id: u64,
    body: Vec<u8>,
}

/// Rebuilds streamed notifications from consecutive parts.
#[derive(Debug)]
pub struct StreamAssembler {
    max_notification_size: u64,
    current: Option<InProgress>,
}

impl StreamAssembler {
    /// Create an assembler refusing notifications larger than `max_notification_size`.
    pub fn new(max_notification_size: u64) -> Self {
        Self {
            max_notification_size,
            current: None,
        }
    }

    /// Whether a notification is partially received.
    pub fn in_progress(&self) -> bool {
        self.current.is_some()
    }

    /// Identifier and last part id of the notification being received.
    pub fn position(&self) -> Option<(&[u8], u64)> {
        self.current
            .as_ref()
            .map(|current| (current.identifier.as_slice(), current.last_part_id))
    }

    /// Add a part.
    ///
    /// Returns the notification once its last part arrives. Any error leaves
    /// the assembler empty, since the connection cannot recover the stream.
    ///
    /// # Errors
    ///
    /// * `ProtocolError::Stream` - the part breaks the sequence, exceeds the
    ///   declared or configured length, or the digest does not match
    ///
    pub fn push(
        &mut self,
        part: StreamPart,
    ) -> Result<Option<AssembledNotification>, ProtocolError> {
        let result = self.accept(part);
        if result.is_err() {
            self.current = None;
        }
        result
    }

    fn accept(&mut self, part: StreamPart) -> Result<Option<AssembledNotification>, ProtocolError> {
        match self.current.as_mut() {
            None => {
                let Some(headers) = part.first else {
                    return Err(ProtocolError::Stream(format!(
                        "stream must start at part 0, got part {}",
                        part.part_id
                    )));
                };
                if headers.compressed_length > self.max_notification_size {
                    return Err(ProtocolError::Stream(format!(
                        "notification of {} bytes exceeds the limit of {}",
                        headers.compressed_length, self.max_notification_size
                    )));
                }
                log::debug!(
                    "starting stream of {} bytes in parts of {}",
                    headers.compressed_length,
                    part.payload.len()
                );
                self.current = Some(InProgress {
                    identifier: part.identifier,
                    headers,
                    last_part_id: 0,
                    body: part.payload,
                });
            }
            Some(current) => {
                if part.identifier != current.identifier {
                    return Err(ProtocolError::Stream(
                        "a new notification started before the previous one completed".to_owned(),
                    ));
                }
                if part.part_id != current.last_part_id + 1 {
                    return Err(ProtocolError::Stream(format!(
                        "expected part {}, got part {}",
                        current.last_part_id + 1,
                        part.part_id
                    )));
                }
                current.last_part_id = part.part_id;
                current.body.extend_from_slice(&part.payload);
            }
        }

        let Some(current) = self.current.as_ref() else {
            return Ok(None);
        };
        let received = current.body.len() as u64;
        if received > current.headers.compressed_length {
            return Err(ProtocolError::Stream(format!(
                "received {} bytes but x-compressed-length is {}",
                received, current.headers.compressed_length
            )));
        }
        if received < current.headers.compressed_length {
            log::trace!(
                "part {} received, {} of {} bytes",
                current.last_part_id,
                received,
                current.headers.compressed_length
            );
            return Ok(None);
        }

        let Some(done) = self.current.take() else {
            return Ok(None);
        };
        if !done.headers.matches(&done.body) {
            return Err(ProtocolError::Stream(
                "x-compressed-sha512 does not match the received body".to_owned(),
            ));
        }
        Ok(Some(AssembledNotification {
            identifier: done.identifier,
            headers: done.headers,
            compressed_payload: done.body,
        }))
    }
}

/// Split a compressed body into stream parts of at most `part_size` bytes.
///
/// # Arguments
///
/// * `identifier` - Identifier shared by every part, max 64 bytes
/// * `headers` - Description of the whole body, sent with part 0
/// * `compressed_body` - The body to split
/// * `part_size` - Largest payload per part
/// * `authorize` - Produces the authorization for a part id; called once per part
///
/// # Errors
///
/// * `ProtocolError::InvalidParameter` - `part_size` is 0 or `headers` do not describe the body
///
pub fn split_notification<F>(
    identifier: &[u8],
    headers: NotificationHeaders,
    compressed_body: &[u8],
    part_size: usize,
    mut authorize: F,
) -> Result<Vec<StreamPart>, ProtocolError>
where
    F: FnMut(u64) -> Option<String>,
{
    if part_size == 0 {
        return Err(ProtocolError::InvalidParameter("part size must be positive".to_owned()));
    }
    if !headers.matches(compressed_body) {
        return Err(ProtocolError::InvalidParameter(
            "headers do not describe the compressed body".to_owned(),
        ));
    }

    let mut chunks: Vec<&[u8]> = compressed_body.chunks(part_size).collect();
    if chunks.is_empty() {
        chunks.push(&[]);
    }
    let mut first = Some(headers);
    Ok(chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let part_id = index as u64;
            StreamPart {
                authorization: authorize(part_id),
                identifier: identifier.to_vec(),
                part_id,
                first: first.take(),
                payload: chunk.to_vec(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(body: &[u8]) -> NotificationHeaders {
        NotificationHeaders::for_body(b"topic".to_vec(), 0, body.len() as u64, body)
    }

    #[test]
    fn test_split_then_assemble() {
        let body: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let authorize = |id: u64| Some(format!("auth-{}", id));
        let parts = split_notification(b"id", headers(&body), &body, 300, authorize).unwrap();
        assert_eq!(parts.len(), 4);
        assert!(parts[0].first.is_some());
        assert!(parts[1..].iter().all(|part| part.first.is_none()));
        assert_eq!(parts[3].authorization.as_deref(), Some("auth-3"));
        assert_eq!(parts[3].payload.len(), 100);

        let mut assembler = StreamAssembler::new(1 << 20);
        let mut result = None;
        for part in parts {
            assert!(result.is_none());
            result = assembler.push(part).unwrap();
        }
        let notification = result.unwrap();
        assert_eq!(notification.compressed_payload, body);
        assert_eq!(notification.identifier, b"id".to_vec());
        assert!(!assembler.in_progress());
    }

    #[test]
    fn test_empty_body_is_one_part() {
        let parts = split_notification(b"e", headers(b""), b"", 16, |_| None).unwrap();
        assert_eq!(parts.len(), 1);
        let mut assembler = StreamAssembler::new(16);
        let notification = assembler.push(parts[0].clone()).unwrap().unwrap();
        assert!(notification.compressed_payload.is_empty());
    }

    #[test]
    fn test_weaving_rejected() {
        let body = b"0123456789";
        let mut assembler = StreamAssembler::new(100);
        let parts = split_notification(b"a", headers(body), body, 4, |_| None).unwrap();
        assert!(assembler.push(parts[0].clone()).unwrap().is_none());
        assert_eq!(assembler.position(), Some((&b"a"[..], 0)));

        let other = split_notification(b"b", headers(body), body, 4, |_| None).unwrap();
        assert!(matches!(
            assembler.push(other[0].clone()),
            Err(ProtocolError::Stream(_))
        ));
        assert!(!assembler.in_progress());
    }

    #[test]
    fn test_skipped_part_rejected() {
        let body = b"0123456789";
        let parts = split_notification(b"a", headers(body), body, 4, |_| None).unwrap();
        let mut assembler = StreamAssembler::new(100);
        assembler.push(parts[0].clone()).unwrap();
        assert!(assembler.push(parts[2].clone()).is_err());
    }

    #[test]
    fn test_must_start_at_part_zero() {
        let body = b"0123456789";
        let parts = split_notification(b"a", headers(body), body, 4, |_| None).unwrap();
        let mut assembler = StreamAssembler::new(100);
        assert!(assembler.push(parts[1].clone()).is_err());
    }

    #[test]
    fn test_limits_and_digest() {
        let body = b"0123456789";
        let parts = split_notification(b"a", headers(body), body, 4, |_| None).unwrap();
        let mut assembler = StreamAssembler::new(5);
        assert!(assembler.push(parts[0].clone()).is_err());

        let mut tampered = parts.clone();
        tampered[2].payload = b"xy".to_vec();
        let mut assembler = StreamAssembler::new(100);
        assembler.push(tampered[0].clone()).unwrap();
        assembler.push(tampered[1].clone()).unwrap();
        assert!(matches!(
            assembler.push(tampered[2].clone()),
            Err(ProtocolError::Stream(_))
        ));

        let mut overlong = parts;
        overlong[2].payload = b"89!".to_vec();
        let mut assembler = StreamAssembler::new(100);
        assembler.push(overlong[0].clone()).unwrap();
        assembler.push(overlong[1].clone()).unwrap();
        assert!(assembler.push(overlong[2].clone()).is_err());
    }

    #[test]
    fn test_split_validates_arguments() {
        let body = b"abc";
        assert!(split_notification(b"a", headers(body), body, 0, |_| None).is_err());
        assert!(split_notification(b"a", headers(b"abd"), body, 2, |_| None).is_err());
    }
}
