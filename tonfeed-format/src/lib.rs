//! # Tonfeed Format
//!
//! Core data types for everything-is-a-cell chain data.
//!
//! This crate provides the small slice of the on-chain data model a payment
//! feed needs: cells, the bag of cells interchange framing, addresses, coin
//! amounts and message envelopes.
//!
//! ## Key Types
//!
//! - [`Cell`] - Tree-of-cells node, up to 1023 data bits and 4 references
//! - [`CellBuilder`] / [`CellSlice`] - Bit-level writing and reading of cells
//! - [`boc`] - Bag of cells codec used for transport
//! - [`Address`] - Standard workchain plus account id address
//! - [`Coins`] - Nanoton amount with variable-length cell encoding
//! - [`Message`] - Message envelope with an optional body cell
//!
//! ## Example
//!
//! ```
//! use tonfeed_format::{Address, CellBuilder};
//!
//! // Parse a raw form address
//! let addr: Address =
//!     "0:83dfd552e63729b472fcbcc8c45ebcc6691702558b68ec7527e1ba403a0f31a8".parse()?;
//! assert_eq!(addr.workchain, 0);
//!
//! // Build a plain text comment body
//! let mut builder = CellBuilder::new();
//! builder.store_u32(0)?;
//! builder.store_bytes(b"thanks")?;
//! let body = builder.build();
//!
//! let mut slice = body.parse();
//! assert_eq!(slice.load_u32()?, 0);
//! assert_eq!(slice.load_string_snake()?, "thanks");
//! # Ok::<(), tonfeed_format::Error>(())
//! ```

mod address;
pub mod boc;
mod builder;
mod cell;
mod coins;
mod error;
mod hash;
mod message;
pub mod serde_lt;
mod slice;

pub use address::Address;
pub use builder::CellBuilder;
pub use cell::{Cell, MAX_BIT_LEN, MAX_REF_COUNT};
pub use coins::{Coins, NANO_PER_COIN};
pub use error::{Error, Result};
pub use hash::HashBytes;
pub use message::{ExtInMsgInfo, ExtOutMsgInfo, IntMsgInfo, Message, MsgInfo};
pub use slice::CellSlice;
