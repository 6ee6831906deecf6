//! Stdin processor for host event payloads
//!
//! Reads all of stdin under a byte cap and a per-read timeout, then
//! parses the body as a [`HookPayload`]. Nothing here is fatal: an
//! oversized body is truncated and flagged, an unparseable or empty body
//! decodes to an empty payload (a user poking `run <id>` from a shell is
//! a supported case), and the hook proceeds with whatever context it has.

use bytes::BytesMut;
use claudekit_core::constants::limits::STDIN_READ_TIMEOUT_MS;
use claudekit_core::constants::sizes::{MAX_STDIN_BYTES, STDIN_BUFFER_CAPACITY};
use claudekit_core::payload::HookPayload;
use std::time::Duration;
use tokio::io::{stdin, AsyncReadExt};

/// Result of decoding stdin
#[derive(Debug, Clone, Default)]
pub struct DecodedPayload {
    pub payload: HookPayload,
    /// The body exceeded the cap and was cut at the cap
    pub truncated: bool,
    /// The body was non-empty but did not parse as JSON
    pub parse_error: Option<String>,
}

/// Bounded stdin reader
pub struct StdinProcessor {
    buffer: BytesMut,
    max_bytes: usize,
    read_timeout: Duration,
}

impl StdinProcessor {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(STDIN_BUFFER_CAPACITY),
            max_bytes: MAX_STDIN_BYTES,
            read_timeout: Duration::from_millis(STDIN_READ_TIMEOUT_MS),
        }
    }

    #[cfg(test)]
    fn with_cap(max_bytes: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(STDIN_BUFFER_CAPACITY),
            max_bytes,
            read_timeout: Duration::from_millis(STDIN_READ_TIMEOUT_MS),
        }
    }

    /// Read and decode the event payload from stdin.
    pub async fn read_payload(&mut self) -> DecodedPayload {
        let truncated = self.read_stdin_to_buffer().await;
        let decoded = Self::decode(&self.buffer, truncated);
        if decoded.truncated {
            tracing::warn!(
                cap_bytes = self.max_bytes,
                "stdin payload exceeded cap; truncated"
            );
        }
        if let Some(reason) = &decoded.parse_error {
            tracing::warn!("payload did not parse ({reason}); proceeding with empty context");
        }
        decoded
    }

    /// Read stdin up to the cap. Returns true when input was truncated.
    ///
    /// The first read carries a timeout so an interactive invocation with
    /// nothing piped in degrades to an empty payload instead of hanging.
    /// Bytes past the cap are drained and discarded so the writing host
    /// never sees a broken pipe.
    async fn read_stdin_to_buffer(&mut self) -> bool {
        self.buffer.clear();
        let mut stdin = stdin();
        let mut chunk = vec![0u8; STDIN_BUFFER_CAPACITY];
        let mut first_read = true;
        let mut truncated = false;

        loop {
            let read = if first_read {
                match tokio::time::timeout(self.read_timeout, stdin.read(&mut chunk)).await {
                    Ok(result) => result,
                    Err(_) => return false, // no payload piped in
                }
            } else {
                stdin.read(&mut chunk).await
            };
            first_read = false;

            match read {
                Ok(0) => return truncated,
                Ok(n) => {
                    let room = self.max_bytes.saturating_sub(self.buffer.len());
                    if n > room {
                        self.buffer.extend_from_slice(&chunk[..room]);
                        truncated = true;
                    } else {
                        self.buffer.extend_from_slice(&chunk[..n]);
                    }
                }
                Err(err) => {
                    tracing::debug!("stdin read error: {err}");
                    return truncated;
                }
            }
        }
    }

    /// Decode a raw body into a payload, tolerating everything.
    pub fn decode(body: &[u8], truncated: bool) -> DecodedPayload {
        let trimmed: &[u8] = {
            let text = body;
            let start = text.iter().position(|b| !b.is_ascii_whitespace());
            match start {
                Some(start) => &text[start..],
                None => &[],
            }
        };
        if trimmed.is_empty() {
            return DecodedPayload {
                payload: HookPayload::default(),
                truncated,
                parse_error: None,
            };
        }
        match serde_json::from_slice::<HookPayload>(trimmed) {
            Ok(payload) => DecodedPayload {
                payload,
                truncated,
                parse_error: None,
            },
            Err(err) => DecodedPayload {
                payload: HookPayload::default(),
                truncated,
                parse_error: Some(err.to_string()),
            },
        }
    }
}

impl Default for StdinProcessor {
    fn default() -> Self {
        Self::new()
    }
}
