use crate::boc::serde_boc;
use crate::{Address, Cell, Coins};
use serde::{Deserialize, Serialize};

/// Envelope header of a message, one variant per direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MsgInfo {
    /// Value-bearing transfer between two on-chain accounts.
    Internal(IntMsgInfo),
    /// Message injected from outside the chain, typically a signed wallet
    /// request.
    ExternalIn(ExtInMsgInfo),
    /// Event emitted by a contract for off-chain consumers.
    ExternalOut(ExtOutMsgInfo),
}

/// Header of an internal transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntMsgInfo {
    pub bounce: bool,
    pub bounced: bool,
    pub src: Address,
    pub dest: Address,
    /// Toncoins attached to the transfer. Token amounts live in the body.
    pub value: Coins,
    #[serde(with = "crate::serde_lt")]
    pub created_lt: u64,
    pub created_at: u32,
}

/// Header of an inbound external message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtInMsgInfo {
    pub dest: Address,
}

/// Header of an outbound external message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtOutMsgInfo {
    pub src: Address,
    #[serde(with = "crate::serde_lt")]
    pub created_lt: u64,
    pub created_at: u32,
}

/// A message together with its optional body cell.
///
/// The body travels as a base64 bag of cells and is decoded lazily by whoever
/// wants to look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(flatten)]
    pub info: MsgInfo,
    #[serde(default, with = "serde_boc", skip_serializing_if = "Option::is_none")]
    pub body: Option<Cell>,
}

impl Message {
    /// Header of an internal transfer, if this message is one.
    pub fn as_internal(&self) -> Option<&IntMsgInfo> {
        match &self.info {
            MsgInfo::Internal(info) => Some(info),
            _ => None,
        }
    }
}
