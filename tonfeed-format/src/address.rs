use crate::{Error, HashBytes, Result};
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::result::Result as StdResult;
use std::str::FromStr;

/// Standard internal address: a signed 8-bit workchain plus a 256-bit account
/// id inside that workchain.
///
/// The textual form is the raw one, `workchain:hex`, for example
/// `0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8`.
/// The user-facing base64 form is out of scope here: nodes and storage both
/// speak the raw form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub workchain: i8,
    pub account: HashBytes,
}

impl Address {
    pub fn new(workchain: i8, account: impl Into<HashBytes>) -> Self {
        Self {
            workchain,
            account: account.into(),
        }
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (workchain, account) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidAddress(s.to_owned()))?;
        let workchain = workchain
            .parse::<i8>()
            .map_err(|_| Error::InvalidAddress(s.to_owned()))?;
        if account.len() != 64 {
            return Err(Error::InvalidAddress(s.to_owned()));
        }
        let mut data = [0; 32];
        faster_hex::hex_decode(account.as_bytes(), &mut data)
            .map_err(|_| Error::InvalidAddress(s.to_owned()))?;
        Ok(Self {
            workchain,
            account: data.into(),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.workchain,
            faster_hex::hex_string(self.account.as_slice())
        )
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

struct AddressVisitor;

impl Visitor<'_> for AddressVisitor {
    type Value = Address;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "raw address string, workchain:hex")
    }

    fn visit_str<E>(self, value: &str) -> StdResult<Self::Value, E>
    where
        E: serde::de::Error,
    {
        value
            .parse()
            .map_err(|e: Error| serde::de::Error::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(AddressVisitor)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
