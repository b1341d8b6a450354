//! Wire-level constants and the server message vocabulary.
//!
//! Every protocol message is a plain-text payload followed by the
//! two-byte terminator `0x07 0x08` (BEL BS). Neither byte may appear
//! inside a payload. The vocabulary is fixed; there is no runtime
//! extensibility.

use std::borrow::Cow;

use bytes::{BufMut, Bytes, BytesMut};
use rover_core::navigation::Command;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Message terminator: BEL followed by BS.
pub const TERMINATOR: &[u8] = b"\x07\x08";

/// Client token announcing a recharge interrupt.
pub const RECHARGING: &str = "RECHARGING";

/// Client token ending a recharge interrupt.
pub const FULL_POWER: &str = "FULL POWER";

/// Longest accepted rover name.
pub const MAX_NAME_LEN: usize = 18;

/// Longest accepted key id message.
pub const MAX_KEY_ID_LEN: usize = 3;

/// Longest accepted client hash message.
pub const MAX_HASH_LEN: usize = 7;

/// Longest accepted coordinate report.
pub const MAX_REPORT_LEN: usize = 10;

/// Longest accepted secret message.
pub const MAX_SECRET_LEN: usize = 98;

/// A message the server can put on the wire.
///
/// All payloads are fixed literals except the server hash, which is
/// computed per session during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerMessage {
    /// `102 MOVE` - move forward one cell.
    Move,
    /// `103 TURN LEFT` - rotate counter-clockwise.
    TurnLeft,
    /// `104 TURN RIGHT` - rotate clockwise.
    TurnRight,
    /// `105 GET MESSAGE` - request the secret payload.
    GetMessage,
    /// `106 LOGOUT` - graceful termination.
    Logout,
    /// `107 KEY REQUEST` - request the key id.
    KeyRequest,
    /// `200 OK` - handshake accepted.
    Ok,
    /// `300 LOGIN FAILED` - hash mismatch.
    LoginFailed,
    /// `301 SYNTAX ERROR` - malformed input.
    SyntaxError,
    /// `302 LOGIC ERROR` - protocol violation.
    LogicError,
    /// `303 KEY OUT OF RANGE` - key id not in the table domain.
    KeyOutOfRange,
    /// Decimal challenge hash computed from the rover name.
    ServerHash(u16),
}

impl ServerMessage {
    /// The message payload, without the terminator. Only the server
    /// hash allocates; every other variant is a fixed literal.
    #[must_use]
    pub fn payload(&self) -> Cow<'static, str> {
        match self {
            Self::Move => Cow::Borrowed("102 MOVE"),
            Self::TurnLeft => Cow::Borrowed("103 TURN LEFT"),
            Self::TurnRight => Cow::Borrowed("104 TURN RIGHT"),
            Self::GetMessage => Cow::Borrowed("105 GET MESSAGE"),
            Self::Logout => Cow::Borrowed("106 LOGOUT"),
            Self::KeyRequest => Cow::Borrowed("107 KEY REQUEST"),
            Self::Ok => Cow::Borrowed("200 OK"),
            Self::LoginFailed => Cow::Borrowed("300 LOGIN FAILED"),
            Self::SyntaxError => Cow::Borrowed("301 SYNTAX ERROR"),
            Self::LogicError => Cow::Borrowed("302 LOGIC ERROR"),
            Self::KeyOutOfRange => Cow::Borrowed("303 KEY OUT OF RANGE"),
            Self::ServerHash(hash) => Cow::Owned(hash.to_string()),
        }
    }

    /// Payload plus terminator, ready for the socket.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let payload = self.payload();
        let mut buf = BytesMut::with_capacity(payload.len() + TERMINATOR.len());
        buf.put_slice(payload.as_bytes());
        buf.put_slice(TERMINATOR);
        buf.freeze()
    }
}

impl From<Command> for ServerMessage {
    fn from(command: Command) -> Self {
        match command {
            Command::Move => Self::Move,
            Command::TurnLeft => Self::TurnLeft,
            Command::TurnRight => Self::TurnRight,
            Command::PickUp => Self::GetMessage,
        }
    }
}

/// Write one terminated message to the peer.
///
/// # Errors
///
/// Propagates the underlying I/O error; the session treats it as
/// terminal.
pub async fn send_message<W>(writer: &mut W, message: ServerMessage) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&message.encode()).await
}
