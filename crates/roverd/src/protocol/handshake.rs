//! Authentication handshake.
//!
//! Sequence, each read going through the frame reader (and therefore
//! subject to recharge interrupts and per-message limits):
//!
//! ```text
//! Client                                  Server
//!   |  -- rover name ------------------->   |
//!   |  <-- 107 KEY REQUEST ---------------  |
//!   |  -- key id ----------------------->   |
//!   |  <-- server hash (decimal) ---------  |
//!   |  -- client hash ------------------>   |
//!   |  <-- 200 OK / 300 LOGIN FAILED -----  |
//! ```
//!
//! Both hashes derive from the byte sum of the rover name and the key
//! pair selected by the id; see [`rover_core::auth`].

use rover_core::auth::{KeyId, client_hash, server_hash};
use rover_core::navigation::Rover;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::error::{SessionError, SessionResult};
use super::framing::FrameReader;
use super::wire::{MAX_HASH_LEN, MAX_KEY_ID_LEN, MAX_NAME_LEN, ServerMessage, send_message};

/// Run the server side of the handshake.
///
/// On success the client has proven knowledge of the shared key table
/// and a [`Rover`] is created for the validated name.
///
/// # Errors
///
/// - [`SessionError::Syntax`] for an overlong name, a non-numeric key
///   id or hash, or a hash outside `[0, 65536)`
/// - [`SessionError::KeyOutOfRange`] for a numeric key id outside
///   `{0..=4}`
/// - [`SessionError::LoginFailed`] when the client hash does not match
/// - framing errors propagated from the reads
pub async fn authenticate<R, W>(
    frames: &mut FrameReader<R>,
    writer: &mut W,
) -> SessionResult<Rover>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let name = frames.read_message(MAX_NAME_LEN).await?;
    if name.len() > MAX_NAME_LEN {
        return Err(SessionError::syntax(format!(
            "rover name of {} bytes exceeds {MAX_NAME_LEN}",
            name.len()
        )));
    }
    send_message(writer, ServerMessage::KeyRequest).await?;

    let key_raw = frames.read_message(MAX_KEY_ID_LEN).await?;
    let key_value = parse_decimal(&key_raw)
        .ok_or_else(|| SessionError::syntax(format!("key id {key_raw:?} is not a number")))?;
    let key_id = u32::try_from(key_value)
        .ok()
        .and_then(KeyId::new)
        .ok_or(SessionError::KeyOutOfRange { key_id: key_value })?;
    debug!(key_id = key_value, "key id accepted");

    send_message(writer, ServerMessage::ServerHash(server_hash(&name, key_id))).await?;

    let hash_raw = frames.read_message(MAX_HASH_LEN).await?;
    let hash_value = parse_decimal(&hash_raw)
        .ok_or_else(|| SessionError::syntax(format!("client hash {hash_raw:?} is not a number")))?;
    if hash_value >= 65536 {
        return Err(SessionError::syntax(format!(
            "client hash {hash_value} outside 16-bit range"
        )));
    }
    if hash_value != u64::from(client_hash(&name, key_id)) {
        return Err(SessionError::LoginFailed);
    }
    send_message(writer, ServerMessage::Ok).await?;
    info!(rover = %name, "authenticated");
    Ok(Rover::new(name))
}

/// Parse a non-empty, all-digit decimal token.
///
/// No sign, no whitespace. Returns `None` for anything else,
/// including values past `u64::MAX`.
fn parse_decimal(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}
