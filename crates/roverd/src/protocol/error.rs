//! Session error taxonomy and wire-reply mapping.
//!
//! Every failure raised by the frame reader, the handshake, or the
//! navigation loop propagates unhandled to the session boundary, which
//! is the single place an error kind becomes a wire response. Protocol
//! violations get exactly one response message before the connection
//! closes; timeouts and transport failures get none.

use std::io;
use std::time::Duration;

use rover_core::navigation::NavigationError;
use thiserror::Error;

use super::wire::ServerMessage;

/// Terminal session failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed or oversized input: unterminated buffer past its
    /// limit, non-numeric field, name too long, bad coordinate triple.
    #[error("syntax error: {reason}")]
    Syntax {
        /// Description of the malformed input.
        reason: String,
    },

    /// Key id parsed as a number but falls outside the table domain.
    #[error("key id {key_id} out of range")]
    KeyOutOfRange {
        /// The rejected id.
        key_id: u64,
    },

    /// Client hash did not match the expected value.
    #[error("login failed: client hash mismatch")]
    LoginFailed,

    /// Protocol violation: bad recharge acknowledgement or a movement
    /// contract breach.
    #[error("logic error: {reason}")]
    Logic {
        /// Description of the violation.
        reason: String,
    },

    /// No data arrived within the operation's time budget.
    #[error("read timed out after {duration_ms} ms")]
    Timeout {
        /// The exceeded budget in milliseconds.
        duration_ms: u64,
    },

    /// Peer closed the connection mid-session.
    #[error("connection closed by peer")]
    ConnectionClosed,

    /// Transport failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Create a syntax error.
    pub fn syntax(reason: impl Into<String>) -> Self {
        Self::Syntax {
            reason: reason.into(),
        }
    }

    /// Create a logic error.
    pub fn logic(reason: impl Into<String>) -> Self {
        Self::Logic {
            reason: reason.into(),
        }
    }

    /// Create a timeout error from the exceeded budget.
    #[must_use]
    pub fn timeout(budget: Duration) -> Self {
        Self::Timeout {
            duration_ms: u64::try_from(budget.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// The wire response owed to the client for this error, if any.
    ///
    /// Timeouts, closed connections, and transport failures produce no
    /// response; the connection is simply dropped.
    #[must_use]
    pub const fn wire_reply(&self) -> Option<ServerMessage> {
        match self {
            Self::Syntax { .. } => Some(ServerMessage::SyntaxError),
            Self::KeyOutOfRange { .. } => Some(ServerMessage::KeyOutOfRange),
            Self::LoginFailed => Some(ServerMessage::LoginFailed),
            Self::Logic { .. } => Some(ServerMessage::LogicError),
            Self::Timeout { .. } | Self::ConnectionClosed | Self::Io(_) => None,
        }
    }

    /// Whether this error indicates the client broke the protocol, as
    /// opposed to going silent or the transport failing.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        self.wire_reply().is_some()
    }
}

impl From<NavigationError> for SessionError {
    fn from(err: NavigationError) -> Self {
        match err {
            NavigationError::MalformedReport { .. } => Self::syntax(err.to_string()),
            NavigationError::PositionUnknown | NavigationError::HeadingUnknown { .. } => {
                Self::logic(err.to_string())
            },
        }
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use rover_core::navigation::Heading;

    use super::*;

    #[test]
    fn violations_map_to_their_wire_replies() {
        assert_eq!(
            SessionError::syntax("x").wire_reply(),
            Some(ServerMessage::SyntaxError)
        );
        assert_eq!(
            SessionError::KeyOutOfRange { key_id: 5 }.wire_reply(),
            Some(ServerMessage::KeyOutOfRange)
        );
        assert_eq!(
            SessionError::LoginFailed.wire_reply(),
            Some(ServerMessage::LoginFailed)
        );
        assert_eq!(
            SessionError::logic("x").wire_reply(),
            Some(ServerMessage::LogicError)
        );
    }

    #[test]
    fn silent_failures_get_no_reply() {
        assert_eq!(
            SessionError::timeout(Duration::from_secs(1)).wire_reply(),
            None
        );
        assert_eq!(SessionError::ConnectionClosed.wire_reply(), None);
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe");
        assert_eq!(SessionError::from(io_err).wire_reply(), None);
    }

    #[test]
    fn navigation_errors_split_between_syntax_and_logic() {
        let malformed = rover_core::navigation::Position::parse_report("nope").unwrap_err();
        assert!(matches!(
            SessionError::from(malformed),
            SessionError::Syntax { .. }
        ));
        assert!(matches!(
            SessionError::from(NavigationError::HeadingUnknown {
                desired: Heading::Left
            }),
            SessionError::Logic { .. }
        ));
        assert!(matches!(
            SessionError::from(NavigationError::PositionUnknown),
            SessionError::Logic { .. }
        ));
    }
}
