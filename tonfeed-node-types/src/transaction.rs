use serde::{Deserialize, Serialize};
use tonfeed_format::{Address, HashBytes, Message};

/// Position of a transaction inside one shard block's transaction list,
/// usable as a paging cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionCursor {
    pub account: HashBytes,
    #[serde(with = "tonfeed_format::serde_lt")]
    pub lt: u64,
}

/// Identity triple of a transaction as it appears in a block's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortTxInfo {
    pub account: HashBytes,
    #[serde(with = "tonfeed_format::serde_lt")]
    pub lt: u64,
    pub hash: HashBytes,
}

impl ShortTxInfo {
    pub fn cursor(&self) -> TransactionCursor {
        TransactionCursor {
            account: self.account,
            lt: self.lt,
        }
    }
}

/// One page of a block's transaction list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<ShortTxInfo>,
    /// Cursor to continue from, absent on the last page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<TransactionCursor>,
}

/// A fully loaded transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub account: Address,
    #[serde(with = "tonfeed_format::serde_lt")]
    pub lt: u64,
    pub hash: HashBytes,
    /// Inbound message this transaction processed, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_msg: Option<Message>,
}
