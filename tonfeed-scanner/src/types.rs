use serde::{Deserialize, Serialize};
use tonfeed_format::{Address, Coins};
use tonfeed_node_types::BlockId;

/// Position of the last master block whose payments are fully recorded.
///
/// A restart resumes scanning at the block right after this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockCheckpoint {
    /// The committed master block.
    #[serde(flatten)]
    pub block: BlockId,
}

impl BlockCheckpoint {
    /// The master chain position right after this checkpoint.
    pub fn next_position(&self) -> BlockId {
        let mut next = self.block;
        next.seqno += 1;
        next
    }
}

impl From<BlockId> for BlockCheckpoint {
    fn from(block: BlockId) -> Self {
        Self { block }
    }
}

/// An incoming token payment with the text comment attached by the sender.
///
/// This is the unit the whole pipeline exists to produce, typically matched
/// against pending invoices by the comment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentNotification {
    /// Token amount in indivisible token units.
    pub amount: Coins,
    /// Owner wallet the tokens came from.
    pub sender: Address,
    /// Wallet that received the transfer and was notified about it.
    pub destination: Address,
    /// Text comment attached to the transfer.
    pub comment: String,
}
