use std::{cmp::Ordering, fmt, str::FromStr};

use bson::oid::ObjectId;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Opaque 12-byte document identifier.
///
/// Ids are timestamp-prefixed, so their byte order follows insertion order.
/// Recipe pagination relies on that ordering for its cursor. On the wire and
/// in the database an id is its 24-character lowercase hex rendering.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Id(ObjectId);

impl Id {
    /// Sorts before every generated id; the cursor of the first page.
    pub fn min() -> Self {
        Self(ObjectId::from_bytes([0; 12]))
    }

    pub fn new() -> Self {
        Self(ObjectId::new())
    }

    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(ObjectId::from_bytes(bytes))
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.0.bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_hex()
    }
}

impl Default for Id {
    fn default() -> Self {
        Self::new()
    }
}

impl Ord for Id {
    fn cmp(&self, other: &Self) -> Ordering {
        self.bytes().cmp(&other.bytes())
    }
}

impl PartialOrd for Id {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.to_hex())
    }
}

impl FromStr for Id {
    type Err = bson::oid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s).map(Id)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        hex.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_rendering_is_24_chars_and_parses_back() {
        let id = Id::new();
        let hex = id.to_string();
        assert_eq!(hex.len(), 24);
        assert_eq!(hex.parse::<Id>().unwrap(), id);
    }

    #[test]
    fn min_sorts_before_generated_ids() {
        assert!(Id::min() < Id::new());
        assert_eq!(Id::min().to_hex(), "0".repeat(24));
    }

    #[test]
    fn later_ids_sort_after_earlier_ones() {
        let a = Id::from_bytes([0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 9]);
        let b = Id::from_bytes([0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0]);
        assert!(a < b);
    }

    #[test]
    fn serializes_as_plain_hex_string() {
        let id: Id = "5f1d7a3b9c8e4a0012345678".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"5f1d7a3b9c8e4a0012345678\"");
        let back: Id = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn rejects_malformed_hex() {
        assert!("not-an-id".parse::<Id>().is_err());
        assert!(serde_json::from_str::<Id>("\"abc\"").is_err());
    }
}
