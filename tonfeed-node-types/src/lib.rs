//! Tonfeed network types for talking to block gateways.
//!
//! This library provides the identifiers and transaction listing types
//! exchanged with gateway servers, with the json conventions those servers
//! use: shard prefixes as 16 digit hex strings, logical times and coin
//! amounts as decimal strings.

pub mod block;
pub mod transaction;

pub use block::{BlockId, ShardIdent, BASECHAIN, MASTERCHAIN, SHARD_FULL};
pub use transaction::{ShortTxInfo, TransactionCursor, TransactionPage, TransactionRecord};
