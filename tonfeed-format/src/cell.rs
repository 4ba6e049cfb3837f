use crate::CellSlice;
use arrayvec::ArrayVec;
use std::fmt;
use std::sync::Arc;

/// Maximum number of data bits a single cell can hold.
pub const MAX_BIT_LEN: usize = 1023;

/// Maximum number of child references a single cell can hold.
pub const MAX_REF_COUNT: usize = 4;

pub(crate) const MAX_BYTE_LEN: usize = 128;

/// An ordinary tree-of-cells node.
///
/// Everything on chain is made of these: up to [`MAX_BIT_LEN`] data bits plus
/// up to [`MAX_REF_COUNT`] references to child cells. Cells are immutable once
/// built, so children are shared through [`Arc`].
///
/// Unused low bits of the last data byte are always zero, which makes
/// derived equality structural equality.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Cell {
    pub(crate) data: ArrayVec<u8, MAX_BYTE_LEN>,
    pub(crate) bit_len: usize,
    pub(crate) refs: ArrayVec<Arc<Cell>, MAX_REF_COUNT>,
}

impl Cell {
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Data bits packed most significant first, `ceil(bit_len / 8)` bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn references(&self) -> &[Arc<Cell>] {
        &self.refs
    }

    pub fn reference(&self, index: usize) -> Option<&Arc<Cell>> {
        self.refs.get(index)
    }

    /// Starts reading the cell from the first bit and first reference.
    pub fn parse(&self) -> CellSlice<'_> {
        CellSlice::new(self)
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell(bits: {}, refs: {}, data: 0x{})",
            self.bit_len,
            self.refs.len(),
            faster_hex::hex_string(&self.data)
        )
    }
}
