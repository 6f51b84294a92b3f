//! Protocol version negotiation.

use serde::{Deserialize, Serialize};

/// The ACP protocol version spoken by a peer.
///
/// Versions are plain non-negative integers on the wire. Early pre-release
/// builds of the protocol sent a version *string*; those are accepted on
/// decode and mapped to version 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProtocolVersion(u16);

impl ProtocolVersion {
    /// The legacy pre-release protocol.
    pub const V0: ProtocolVersion = ProtocolVersion(0);
    /// The first stable protocol version.
    pub const V1: ProtocolVersion = ProtocolVersion(1);
    /// The most recent version this crate implements.
    pub const LATEST: ProtocolVersion = ProtocolVersion::V1;

    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl Default for ProtocolVersion {
    fn default() -> Self {
        ProtocolVersion::LATEST
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ProtocolVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;

        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProtocolVersion;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a non-negative integer protocol version")
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Self::Value, E> {
                u16::try_from(value)
                    .map(ProtocolVersion)
                    .map_err(|_| E::custom(format!("protocol version {value} out of range")))
            }

            fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u64::try_from(value)
                    .map_err(|_| E::custom(format!("protocol version {value} out of range")))
                    .and_then(|value| self.visit_u64(value))
            }

            fn visit_str<E: serde::de::Error>(self, _value: &str) -> Result<Self::Value, E> {
                // String versions predate the numbering scheme.
                Ok(ProtocolVersion::V0)
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn encodes_as_bare_integer() {
        assert_eq!(
            serde_json::to_value(ProtocolVersion::LATEST).unwrap(),
            json!(1)
        );
    }

    #[test]
    fn decodes_integer() {
        let version: ProtocolVersion = serde_json::from_value(json!(1)).unwrap();
        assert_eq!(version, ProtocolVersion::V1);
    }

    #[test]
    fn legacy_string_decodes_as_v0() {
        let version: ProtocolVersion = serde_json::from_value(json!("0.0.9")).unwrap();
        assert_eq!(version, ProtocolVersion::V0);
    }

    #[test]
    fn rejects_negative_versions() {
        assert!(serde_json::from_value::<ProtocolVersion>(json!(-1)).is_err());
    }
}
