use std::result::Result as StdResult;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Unexpected length. Expected {expected} got {got}.")]
    UnexpectedLength { expected: usize, got: usize },
    #[error("Failed to decode hex string:\n{0}")]
    DecodeHex(faster_hex::Error),
    #[error("Invalid hex prefix. Hex string doesn't start with \"0x\". Value was: \"{0}\"")]
    InvalidHexPrefix(String),
    #[error("Invalid address. Value was: \"{0}\"")]
    InvalidAddress(String),
    #[error("Cell data overflow. Capacity is 1023 bits, tried to store {0} more.")]
    CellDataOverflow(usize),
    #[error("Cell data underflow. Wanted {wanted} bits, {left} left.")]
    CellDataUnderflow { wanted: usize, left: usize },
    #[error("Cell reference overflow. A cell holds at most 4 references.")]
    CellRefOverflow,
    #[error("Cell reference underflow. No references left to load.")]
    CellRefUnderflow,
    #[error("Unsupported address constructor: {0:#b}")]
    UnsupportedAddress(u8),
    #[error("Anycast addresses are not supported")]
    UnsupportedAnycast,
    #[error("Coin amount does not fit into 120 bits")]
    CoinsOverflow,
    #[error("Unexpected coin amount. Value was: {0}")]
    UnexpectedCoins(String),
    #[error("String data is not byte aligned: {0} bits")]
    UnalignedString(usize),
    #[error("String continuation cell has {0} references, expected at most one")]
    StringChainBranches(usize),
    #[error("String payload is not valid utf-8")]
    InvalidUtf8(#[source] std::string::FromUtf8Error),
    #[error("Invalid bag of cells magic: {0:#010x}")]
    BocMagic(u32),
    #[error("Unexpected end of bag of cells")]
    BocUnderflow,
    #[error("Unsupported bag of cells: {0}")]
    BocUnsupported(&'static str),
    #[error("Malformed bag of cells: {0}")]
    BocMalformed(&'static str),
    #[error("Failed to decode base64 payload:\n{0}")]
    DecodeBase64(base64::DecodeError),
}

pub type Result<T> = StdResult<T, Error>;
