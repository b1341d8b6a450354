//! Buffered, timeout-bounded message framing.
//!
//! [`FrameReader`] turns a raw byte stream into discrete protocol
//! messages. Frames are delimited by the two-byte terminator; the
//! reader reassembles frames split across arbitrary partial reads, so
//! framing is read-boundary independent.
//!
//! # Per-message limits
//!
//! Each call to [`FrameReader::read_message`] carries the maximum
//! sensible length for the message the protocol expects next. The
//! limit bounds the *unterminated* buffer: a client that streams bytes
//! without ever terminating is cut off with a syntax error instead of
//! growing the buffer forever. A frame that arrives already terminated
//! is returned whole regardless of length and left to field
//! validation.
//!
//! # Recharge interrupt
//!
//! The client may announce `RECHARGING` between any two messages. The
//! reader services the interrupt itself: it waits (with the longer
//! recharge timeout) for a `FULL POWER` frame and resumes framing,
//! so higher-level code never sees either token. Any other frame
//! during the wait is a logic error. Absorbing the interrupt here,
//! inside the single low-level read primitive, keeps the check out of
//! every call site.

use std::time::Duration;

use bytes::{Buf, BytesMut};
use rover_core::RoverConfig;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

use super::error::{SessionError, SessionResult};
use super::wire::{FULL_POWER, RECHARGING, TERMINATOR};

/// Initial capacity of the receive buffer.
const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Longest unterminated buffer that can still become a valid recharge
/// acknowledgement (`FULL POWER` plus terminator).
const MAX_RECHARGE_PENDING: usize = FULL_POWER.len() + TERMINATOR.len();

/// Read timeouts for the framing layer.
#[derive(Debug, Clone, Copy)]
pub struct FramingConfig {
    /// Budget for an ordinary protocol read.
    pub read_timeout: Duration,

    /// Budget for each read while a recharge is in progress.
    pub recharge_timeout: Duration,
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_millis(rover_core::config::DEFAULT_READ_TIMEOUT_MS),
            recharge_timeout: Duration::from_millis(
                rover_core::config::DEFAULT_RECHARGE_TIMEOUT_MS,
            ),
        }
    }
}

impl From<&RoverConfig> for FramingConfig {
    fn from(config: &RoverConfig) -> Self {
        Self {
            read_timeout: config.read_timeout(),
            recharge_timeout: config.recharge_timeout(),
        }
    }
}

/// Incremental frame extractor over a read half.
///
/// Owns the accumulated unread bytes for one connection. Never shared:
/// each session has exactly one reader.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: BytesMut,
    config: FramingConfig,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, config: FramingConfig) -> Self {
        Self {
            reader,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Return the next protocol message, reading from the network as
    /// needed and transparently servicing recharge interrupts.
    ///
    /// `limit` is the longest unterminated buffer tolerated for the
    /// message expected at this point in the protocol.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Syntax`] when the unterminated buffer exceeds
    ///   `limit` or a frame is not valid UTF-8
    /// - [`SessionError::Logic`] when a recharge interrupt is not
    ///   acknowledged with `FULL POWER`
    /// - [`SessionError::Timeout`] when a read exceeds its budget
    /// - [`SessionError::ConnectionClosed`] on EOF
    pub async fn read_message(&mut self, limit: usize) -> SessionResult<String> {
        loop {
            if let Some(frame) = self.extract_frame()? {
                if frame == RECHARGING {
                    debug!("recharge interrupt, awaiting FULL POWER");
                    self.await_full_power().await?;
                    continue;
                }
                return Ok(frame);
            }
            if self.buffer.len() > limit {
                warn!(
                    buffered = self.buffer.len(),
                    limit, "unterminated message exceeds limit"
                );
                self.buffer.clear();
                return Err(SessionError::syntax(format!(
                    "unterminated message exceeds {limit} bytes"
                )));
            }
            self.fill(self.config.read_timeout).await?;
        }
    }

    /// Wait out a recharge interrupt.
    ///
    /// Only a `FULL POWER` frame resumes normal framing. A different
    /// frame, or pending bytes that can no longer be a prefix of the
    /// acknowledgement, is a logic error. Each read gets the longer
    /// recharge budget.
    async fn await_full_power(&mut self) -> SessionResult<()> {
        loop {
            if let Some(frame) = self.extract_frame()? {
                if frame == FULL_POWER {
                    debug!("recharge complete");
                    return Ok(());
                }
                return Err(SessionError::logic(format!(
                    "expected FULL POWER after RECHARGING, got {frame:?}"
                )));
            }
            if self.buffer.len() > MAX_RECHARGE_PENDING {
                return Err(SessionError::logic(
                    "unterminated data during recharge cannot be FULL POWER",
                ));
            }
            self.fill(self.config.recharge_timeout).await?;
        }
    }

    /// Split the buffer on the first terminator occurrence.
    ///
    /// Returns `None` when no complete frame is buffered yet.
    fn extract_frame(&mut self) -> SessionResult<Option<String>> {
        let Some(pos) = self
            .buffer
            .windows(TERMINATOR.len())
            .position(|window| window == TERMINATOR)
        else {
            return Ok(None);
        };
        let frame = self.buffer.split_to(pos);
        self.buffer.advance(TERMINATOR.len());
        let frame = String::from_utf8(frame.to_vec())
            .map_err(|_| SessionError::syntax("frame is not valid UTF-8"))?;
        Ok(Some(frame))
    }

    /// One network read with the given budget, appending to the
    /// buffer.
    async fn fill(&mut self, budget: Duration) -> SessionResult<()> {
        match tokio::time::timeout(budget, self.reader.read_buf(&mut self.buffer)).await {
            Ok(Ok(0)) => Err(SessionError::ConnectionClosed),
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                self.buffer.clear();
                Err(SessionError::timeout(budget))
            },
        }
    }
}
