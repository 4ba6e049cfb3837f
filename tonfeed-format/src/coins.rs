use crate::{Error, Result};
use derive_more::{From, Into};
use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::result::Result as StdResult;
use std::str::FromStr;

/// Number of nanotons in one toncoin.
pub const NANO_PER_COIN: u128 = 1_000_000_000;

/// Coin amount in nanotons.
///
/// Serializes as a decimal string of the raw nanoton value because amounts
/// routinely exceed the integer range JSON numbers can carry exactly.
/// [`Display`](fmt::Display) renders whole coins with a fractional part,
/// which is what ends up in log lines.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, From, Into)]
pub struct Coins(u128);

impl Coins {
    pub const ZERO: Self = Self(0);

    pub const fn new(nano: u128) -> Self {
        Self(nano)
    }

    pub fn into_nano(self) -> u128 {
        self.0
    }
}

impl FromStr for Coins {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|_| Error::UnexpectedCoins(s.to_owned()))
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / NANO_PER_COIN;
        let frac = self.0 % NANO_PER_COIN;
        if frac == 0 {
            write!(f, "{whole}")
        } else {
            let frac = format!("{frac:09}");
            write!(f, "{whole}.{}", frac.trim_end_matches('0'))
        }
    }
}

impl fmt::Debug for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coins({})", self.0)
    }
}

struct CoinsVisitor;

impl Visitor<'_> for CoinsVisitor {
    type Value = Coins;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "decimal string for a nanoton amount")
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

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D>(deserializer: D) -> StdResult<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(CoinsVisitor)
    }
}

impl Serialize for Coins {
    fn serialize<S>(&self, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}
