use crate::{Error, Result};
use derive_more::{From, Into};
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::result::Result as StdResult;
use std::str::FromStr;

/// 256-bit identifier. Account ids inside a workchain, transaction hashes and
/// block file hashes are all values of this type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From, Into)]
pub struct HashBytes([u8; 32]);

impl HashBytes {
    /// The all-zero id.
    pub const ZERO: Self = Self([0; 32]);

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn encode_hex(&self) -> String {
        format!("0x{}", faster_hex::hex_string(self.as_slice()))
    }

    pub fn decode_hex(value: &str) -> Result<Self> {
        let hex = value
            .strip_prefix("0x")
            .ok_or_else(|| Error::InvalidHexPrefix(value.to_owned()))?;
        if hex.len() != 64 {
            return Err(Error::UnexpectedLength {
                expected: 64,
                got: hex.len(),
            });
        }
        let mut data = [0; 32];
        faster_hex::hex_decode(hex.as_bytes(), &mut data).map_err(Error::DecodeHex)?;
        Ok(Self(data))
    }
}

impl AsRef<[u8]> for HashBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for HashBytes {
    type Error = Error;

    fn try_from(buf: &[u8]) -> Result<Self> {
        let data: [u8; 32] = buf.try_into().map_err(|_| Error::UnexpectedLength {
            expected: 32,
            got: buf.len(),
        })?;
        Ok(Self(data))
    }
}

impl FromStr for HashBytes {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode_hex(s)
    }
}

impl fmt::Display for HashBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_hex())
    }
}

impl fmt::Debug for HashBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_hex())
    }
}

struct HashBytesVisitor;

impl Visitor<'_> for HashBytesVisitor {
    type Value = HashBytes;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "hex string for a 32 byte id")
    }

    fn visit_str<E>(self, value: &str) -> StdResult<Self::Value, E>
    where
        E: serde::de::Error,
    {
        HashBytes::decode_hex(value).map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for HashBytes {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(HashBytesVisitor)
    }
}

impl Serialize for HashBytes {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.encode_hex())
    }
}
