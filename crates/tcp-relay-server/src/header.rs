//! Fixed 16-byte connection/frame header: `magic: u32 big-endian` ∥ `unique: 12 bytes`.

use thiserror::Error;

pub const HEADER_LEN: usize = 16;
pub const UNIQUE_LEN: usize = 12;

pub const MAGIC_RATS: u32 = 0x5241_5453;
pub const MAGIC_RATL: u32 = 0x5241_544C;
pub const MAGIC_RATA: u32 = 0x5241_5441;
pub const MAGIC_RATP: u32 = 0x5241_5450;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magic {
    /// Session open: new host (all-zero unique) or new client (session id).
    Rats,
    /// Host-side link for a specific link id.
    Ratl,
    /// Address disclosure frame.
    Rata,
    /// Keepalive.
    Ratp,
}

impl Magic {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            MAGIC_RATS => Some(Magic::Rats),
            MAGIC_RATL => Some(Magic::Ratl),
            MAGIC_RATA => Some(Magic::Rata),
            MAGIC_RATP => Some(Magic::Ratp),
            _ => None,
        }
    }

    pub fn to_u32(self) -> u32 {
        match self {
            Magic::Rats => MAGIC_RATS,
            Magic::Ratl => MAGIC_RATL,
            Magic::Rata => MAGIC_RATA,
            Magic::Ratp => MAGIC_RATP,
        }
    }
}

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("buffer too short for a 16-byte header")]
    TooShort,
    #[error("unrecognized magic {0:#010x}")]
    BadMagic(u32),
}

/// A decoded 16-byte header: 4-byte magic followed by a 12-byte body, which
/// callers interpret as a session id, link id, or (for RATA) a link id
/// followed by a 16-byte encoded address split across the next frame's body.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub magic: Magic,
    pub unique: [u8; UNIQUE_LEN],
}

impl Header {
    pub fn new(magic: Magic, unique: [u8; UNIQUE_LEN]) -> Self {
        Self { magic, unique }
    }

    /// Encode into the on-wire layout.
    ///
    /// Offsets (bytes):
    /// - 0..4   magic (u32 big-endian)
    /// - 4..16  unique (opaque 12-byte id)
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&self.magic.to_u32().to_be_bytes());
        out[4..16].copy_from_slice(&self.unique);
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Header, HeaderError> {
        if buf.len() < HEADER_LEN {
            return Err(HeaderError::TooShort);
        }
        let magic_value = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
        let magic = Magic::from_u32(magic_value).ok_or(HeaderError::BadMagic(magic_value))?;
        let mut unique = [0u8; UNIQUE_LEN];
        unique.copy_from_slice(&buf[4..16]);
        Ok(Header { magic, unique })
    }

    pub fn unique_is_zero(&self) -> bool {
        self.unique == [0u8; UNIQUE_LEN]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let header = Header::new(Magic::Ratl, [7u8; UNIQUE_LEN]);
        let bytes = header.encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        let decoded = Header::decode(&bytes).unwrap();
        assert_eq!(decoded.magic, Magic::Ratl);
        assert_eq!(decoded.unique, [7u8; UNIQUE_LEN]);
    }

    #[test]
    fn magic_bytes_match_ascii() {
        assert_eq!(MAGIC_RATS.to_be_bytes(), *b"RATS");
        assert_eq!(MAGIC_RATL.to_be_bytes(), *b"RATL");
        assert_eq!(MAGIC_RATA.to_be_bytes(), *b"RATA");
        assert_eq!(MAGIC_RATP.to_be_bytes(), *b"RATP");
    }

    #[test]
    fn rejects_short_buffer() {
        assert!(matches!(Header::decode(&[0u8; 10]), Err(HeaderError::TooShort)));
    }

    #[test]
    fn rejects_unknown_magic() {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(Header::decode(&buf), Err(HeaderError::BadMagic(_))));
    }

    #[test]
    fn all_zero_unique_is_detected() {
        let header = Header::new(Magic::Rats, [0u8; UNIQUE_LEN]);
        assert!(header.unique_is_zero());
    }
}
