//! Serde adapter for logical time values.
//!
//! Logical times are full range `u64` counters and JSON numbers cannot carry
//! those exactly, so they travel as decimal strings. Use through
//! `#[serde(with = "...")]`.

use serde::de::Visitor;
use std::fmt;
use std::result::Result as StdResult;

pub fn serialize<S>(value: &u64, serializer: S) -> StdResult<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&value.to_string())
}

struct LtVisitor;

impl Visitor<'_> for LtVisitor {
    type Value = u64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "decimal string for a logical time")
    }

    fn visit_str<E>(self, value: &str) -> StdResult<Self::Value, E>
    where
        E: serde::de::Error,
    {
        value
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid logical time: {value}")))
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> StdResult<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(LtVisitor)
}
