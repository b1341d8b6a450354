//! Key tables and challenge-response hashing for the login handshake.
//!
//! Both sides of the protocol derive a 16-bit hash from the rover's
//! name and a shared key selected by a small integer id. The server
//! proves itself first by sending the hash computed with the *server*
//! key; the client answers with the hash computed with the *client*
//! key for the same id. The tables are process-wide immutable
//! constants.
//!
//! # Hash definition
//!
//! ```text
//! checksum    = sum of the name's bytes
//! server hash = (checksum * 1000 + SERVER_KEYS[id]) mod 65536
//! client hash = (checksum * 1000 + CLIENT_KEYS[id]) mod 65536
//! ```

/// Number of key pairs both tables hold. Valid ids are `0..KEY_COUNT`.
pub const KEY_COUNT: u32 = 5;

/// Server-side authentication keys, indexed by key id.
const SERVER_KEYS: [u16; KEY_COUNT as usize] = [23019, 32037, 18789, 16443, 18189];

/// Client-side authentication keys, indexed by key id.
const CLIENT_KEYS: [u16; KEY_COUNT as usize] = [32037, 29295, 13603, 29533, 21952];

/// A validated key id in `{0..=4}`.
///
/// Construction is the only place the range check happens; everything
/// downstream can index the tables infallibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyId(u8);

impl KeyId {
    /// Validate a parsed key id.
    ///
    /// Returns `None` when the id falls outside the table domain.
    /// An out-of-domain id is a distinct protocol error (key out of
    /// range), not a missing-entry lookup, so the caller keeps the
    /// raw value for its error report.
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        if raw < KEY_COUNT {
            #[allow(clippy::cast_possible_truncation)]
            Some(Self(raw as u8))
        } else {
            None
        }
    }

    /// Server key for this id.
    #[must_use]
    pub const fn server_key(self) -> u16 {
        SERVER_KEYS[self.0 as usize]
    }

    /// Client key for this id.
    #[must_use]
    pub const fn client_key(self) -> u16 {
        CLIENT_KEYS[self.0 as usize]
    }
}

/// Sum of the name's bytes.
///
/// Names are short (at most 18 bytes), so the sum stays well inside
/// `u32`.
#[must_use]
pub fn name_checksum(name: &str) -> u32 {
    name.bytes().map(u32::from).sum()
}

/// Hash the server sends as its challenge response.
#[must_use]
pub fn server_hash(name: &str, key_id: KeyId) -> u16 {
    hash(name_checksum(name), key_id.server_key())
}

/// Hash the client is expected to answer with.
#[must_use]
pub fn client_hash(name: &str, key_id: KeyId) -> u16 {
    hash(name_checksum(name), key_id.client_key())
}

const fn hash(checksum: u32, key: u16) -> u16 {
    #[allow(clippy::cast_possible_truncation)]
    let h = (checksum.wrapping_mul(1000).wrapping_add(key as u32)) % 65536;
    h as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_id_accepts_table_domain() {
        for raw in 0..KEY_COUNT {
            assert!(KeyId::new(raw).is_some(), "id {raw} must be valid");
        }
    }

    #[test]
    fn key_id_rejects_out_of_domain() {
        assert!(KeyId::new(5).is_none());
        assert!(KeyId::new(u32::MAX).is_none());
    }

    #[test]
    fn key_tables_match_protocol_constants() {
        let id0 = KeyId::new(0).unwrap();
        let id4 = KeyId::new(4).unwrap();
        assert_eq!(id0.server_key(), 23019);
        assert_eq!(id0.client_key(), 32037);
        assert_eq!(id4.server_key(), 18189);
        assert_eq!(id4.client_key(), 21952);
    }

    #[test]
    fn checksum_is_byte_sum() {
        // 'M' + 'n' + 'a' + 'u' = 77 + 110 + 97 + 117
        assert_eq!(name_checksum("Mnau"), 401);
        assert_eq!(name_checksum(""), 0);
    }

    /// Fixture from the reference session: name "Mnau", key id 0.
    #[test]
    fn hash_fixture_mnau_key_zero() {
        let id = KeyId::new(0).unwrap();
        assert_eq!(server_hash("Mnau", id), 30803);
        assert_eq!(client_hash("Mnau", id), 39821);
    }

    #[test]
    fn hash_wraps_modulo_65536() {
        // Long-ish name pushes checksum * 1000 far past u16::MAX.
        let id = KeyId::new(2).unwrap();
        let name = "Oompa Loompa";
        let expected = (name_checksum(name) * 1000 + 18789) % 65536;
        assert_eq!(u32::from(server_hash(name, id)), expected);
    }

    #[test]
    fn server_and_client_hashes_differ_per_table() {
        let id = KeyId::new(1).unwrap();
        assert_ne!(server_hash("Rover", id), client_hash("Rover", id));
    }
}
