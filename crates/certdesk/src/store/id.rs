use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

const ID_LEN: usize = 12;
const COUNTER_MASK: u32 = 0x00ff_ffff;

static ID_SEQUENCE: AtomicU32 = AtomicU32::new(0);

/// Store-generated document identifier: 4 bytes of unix seconds, 5 random bytes and a
/// 3 byte process counter, rendered as 24 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId([u8; ID_LEN]);

impl DocumentId {
    pub fn generate() -> Self {
        let seconds = chrono::Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        let entropy = uuid::Uuid::new_v4().into_bytes();
        let sequence = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; ID_LEN];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&entropy[..5]);
        bytes[9..].copy_from_slice(&sequence.to_be_bytes()[1..]);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    /// Seconds since the unix epoch at which the id was generated.
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for DocumentId {
    type Err = DocumentIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.len() != ID_LEN * 2 {
            return Err(DocumentIdError::Length {
                value: raw.to_string(),
                found: trimmed.len(),
            });
        }
        // from_str_radix alone would accept a leading '+' in a pair
        if !trimmed.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return Err(DocumentIdError::NotHex {
                value: raw.to_string(),
            });
        }

        let mut bytes = [0u8; ID_LEN];
        for (index, slot) in bytes.iter_mut().enumerate() {
            let pair = &trimmed[index * 2..index * 2 + 2];
            *slot = u8::from_str_radix(pair, 16).map_err(|_| DocumentIdError::NotHex {
                value: raw.to_string(),
            })?;
        }
        Ok(Self(bytes))
    }
}

impl Serialize for DocumentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DocumentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentIdError {
    #[error("'{value}' is not a valid document id: expected 24 hex characters, found {found}")]
    Length { value: String, found: usize },
    #[error("'{value}' is not a valid document id: contains non-hex characters")]
    NotHex { value: String },
}
