use crate::error::{DocStoreError, Result};
use rand::Rng;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;

/// 12-byte document identifier: 4 bytes of big-endian unix seconds, 5 bytes
/// fixed per process, 3 bytes of a wrapping counter. Rendered as 24
/// lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

const COUNTER_MASK: u32 = 0x00ff_ffff;

impl ObjectId {
    pub fn new() -> Self {
        let seconds = chrono::Utc::now().timestamp() as u32;
        let unique = PROCESS_UNIQUE.get_or_init(|| rand::thread_rng().gen());
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::thread_rng().gen::<u32>() & COUNTER_MASK))
            .fetch_add(1, Ordering::Relaxed)
            & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(unique);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        Self(bytes)
    }

    /// Whether `s` is 24 hex characters
    pub fn is_valid(s: &str) -> bool {
        s.len() == 24 && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn parse(s: &str) -> Result<Self> {
        if !Self::is_valid(s) {
            return Err(DocStoreError::InvalidObjectId(s.to_string()));
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| DocStoreError::InvalidObjectId(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Creation time in unix seconds
    pub fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = DocStoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ObjectId::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_valid_and_distinct() {
        let a = ObjectId::new();
        let b = ObjectId::new();

        assert_ne!(a, b);
        assert!(ObjectId::is_valid(&a.to_string()));
        assert_eq!(a.to_string().len(), 24);
    }

    #[test]
    fn test_timestamp_is_now() {
        let before = chrono::Utc::now().timestamp() as u32;
        let id = ObjectId::new();
        let after = chrono::Utc::now().timestamp() as u32;

        assert!(id.timestamp() >= before && id.timestamp() <= after);
    }

    #[test]
    fn test_parse() {
        let id = ObjectId::parse("65f0c0ffee0000000000abcd").unwrap();
        assert_eq!(id.to_string(), "65f0c0ffee0000000000abcd");

        // Uppercase hex is accepted, output is lowercase
        let id = ObjectId::parse("65F0C0FFEE0000000000ABCD").unwrap();
        assert_eq!(id.to_string(), "65f0c0ffee0000000000abcd");

        assert!(ObjectId::parse("not-an-id").is_err());
        assert!(ObjectId::parse("65f0c0ffee0000000000abc").is_err());
        assert!(ObjectId::parse("65f0c0ffee0000000000abcz").is_err());
        assert!(!ObjectId::is_valid(""));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let id = ObjectId::parse("65f0c0ffee0000000000abcd").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"65f0c0ffee0000000000abcd\"");

        let back: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<ObjectId>("\"zzz\"").is_err());
    }
}
