use serde::{Deserialize, Serialize};
use std::fmt;

/// Workchain id of the masterchain.
pub const MASTERCHAIN: i32 = -1;

/// Workchain id of the base workchain where user accounts live.
pub const BASECHAIN: i32 = 0;

/// Prefix of the full, unsplit shard of a workchain.
pub const SHARD_FULL: u64 = 0x8000_0000_0000_0000;

/// A shard lineage: workchain plus binary shard prefix.
///
/// The prefix uses the tag bit convention. The lowest set bit terminates the
/// prefix, so `0x8000000000000000` is the whole workchain,
/// `0x4000000000000000` and `0xc000000000000000` are its two halves and so
/// on. Moving the tag bit down one position splits a shard, moving it up
/// merges two siblings.
///
/// Serialized prefixes are 16 digit hex strings under the `shard` key, the
/// form gateway apis use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardIdent {
    pub workchain: i32,
    #[serde(rename = "shard", with = "serde_shard_prefix")]
    pub prefix: u64,
}

impl ShardIdent {
    pub const fn new(workchain: i32, prefix: u64) -> Self {
        Self { workchain, prefix }
    }

    /// The whole of a workchain as a single shard.
    pub const fn full(workchain: i32) -> Self {
        Self::new(workchain, SHARD_FULL)
    }

    pub fn is_full(&self) -> bool {
        self.prefix == SHARD_FULL
    }

    pub fn is_masterchain(&self) -> bool {
        self.workchain == MASTERCHAIN
    }

    fn tag(&self) -> u64 {
        self.prefix & self.prefix.wrapping_neg()
    }

    pub fn can_split(&self) -> bool {
        self.tag() > 1
    }

    /// The two lineages this shard splits into, left then right.
    pub fn split(&self) -> Option<(ShardIdent, ShardIdent)> {
        let delta = self.tag() >> 1;
        if delta == 0 {
            return None;
        }
        Some((
            Self::new(self.workchain, self.prefix - delta),
            Self::new(self.workchain, self.prefix + delta),
        ))
    }

    /// The lineage this shard merges back into, `None` for a full shard.
    pub fn merged(&self) -> Option<ShardIdent> {
        let tag = self.tag();
        if tag == 0 || self.is_full() {
            return None;
        }
        Some(Self::new(self.workchain, (self.prefix - tag) | (tag << 1)))
    }

    pub fn is_parent_of(&self, child: &ShardIdent) -> bool {
        match child.merged() {
            Some(parent) => parent == *self,
            None => false,
        }
    }
}

impl fmt::Display for ShardIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.workchain, self.prefix)
    }
}

/// Identifier of one block: the shard lineage it extends plus its sequence
/// number in that lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    #[serde(flatten)]
    pub shard: ShardIdent,
    pub seqno: u32,
}

impl BlockId {
    pub const fn new(workchain: i32, prefix: u64, seqno: u32) -> Self {
        Self {
            shard: ShardIdent::new(workchain, prefix),
            seqno,
        }
    }

    pub fn lineage(&self) -> ShardIdent {
        self.shard
    }

    pub fn is_masterchain(&self) -> bool {
        self.shard.is_masterchain()
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.shard, self.seqno)
    }
}

mod serde_shard_prefix {
    use serde::de::Visitor;
    use std::fmt;
    use std::result::Result as StdResult;

    pub fn serialize<S>(value: &u64, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{value:016x}"))
    }

    struct PrefixVisitor;

    impl Visitor<'_> for PrefixVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            write!(formatter, "hex string for a shard prefix")
        }

        fn visit_str<E>(self, value: &str) -> StdResult<Self::Value, E>
        where
            E: serde::de::Error,
        {
            u64::from_str_radix(value, 16)
                .map_err(|_| serde::de::Error::custom(format!("invalid shard prefix: {value}")))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> StdResult<u64, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(PrefixVisitor)
    }
}
