//! Outlet identifiers.
//!
//! PDU descriptions name outlets either by number (`3`) or by string
//! (`"3"`, `"uplink"`). Both forms are normalized to the same string so that
//! reservation sets and port lookups agree no matter how the id was written.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Normalized identifier of one outlet on a PDU.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(String);

impl PortId {
    /// Create an id from anything that converts into one.
    pub fn new(id: impl Into<PortId>) -> Self {
        id.into()
    }

    /// The normalized string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PortId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PortId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortId {
    fn from(s: &str) -> Self {
        PortId(s.trim().to_string())
    }
}

impl From<String> for PortId {
    fn from(s: String) -> Self {
        if s.trim().len() == s.len() {
            PortId(s)
        } else {
            PortId(s.trim().to_string())
        }
    }
}

impl From<&String> for PortId {
    fn from(s: &String) -> Self {
        PortId::from(s.as_str())
    }
}

impl From<&PortId> for PortId {
    fn from(id: &PortId) -> Self {
        id.clone()
    }
}

macro_rules! port_id_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for PortId {
                fn from(n: $t) -> Self {
                    PortId(n.to_string())
                }
            }
        )*
    };
}

port_id_from_int!(u8, u16, u32, u64, usize, i32, i64);

impl Serialize for PortId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPortId {
    Int(i64),
    Str(String),
}

impl<'de> Deserialize<'de> for PortId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawPortId::deserialize(deserializer)? {
            RawPortId::Int(n) => PortId::from(n),
            RawPortId::Str(s) => PortId::from(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_integer_and_string_forms_match() {
        assert_eq!(PortId::from(3u32), PortId::from("3"));
        assert_eq!(PortId::from(" 7 "), PortId::from(7i64));
        assert_eq!(PortId::from("uplink").as_str(), "uplink");
    }

    #[test]
    fn test_borrow_allows_str_lookup() {
        let mut set = HashSet::new();
        set.insert(PortId::from(12u16));
        assert!(set.contains("12"));
    }

    #[test]
    fn test_deserialize_mixed_list() {
        let ids: Vec<PortId> = serde_json::from_str(r#"[1, "2", "aux"]"#).unwrap();
        assert_eq!(
            ids,
            vec![PortId::from(1u8), PortId::from("2"), PortId::from("aux")]
        );
    }

    #[test]
    fn test_serializes_as_string() {
        let json = serde_json::to_string(&PortId::from(4u8)).unwrap();
        assert_eq!(json, "\"4\"");
    }
}
