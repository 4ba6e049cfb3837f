use crate::cell::{MAX_BIT_LEN, MAX_BYTE_LEN, MAX_REF_COUNT};
use crate::{Address, Cell, Coins, Error, Result};
use arrayvec::ArrayVec;
use std::sync::Arc;

/// Assembles a [`Cell`] bit by bit.
///
/// Store operations append to the data tail or the reference list and fail
/// with [`Error::CellDataOverflow`] or [`Error::CellRefOverflow`] once the
/// cell limits are hit. They return `&mut Self` so stores can be chained
/// behind `?`.
pub struct CellBuilder {
    data: [u8; MAX_BYTE_LEN],
    bit_len: usize,
    refs: ArrayVec<Arc<Cell>, MAX_REF_COUNT>,
}

impl Default for CellBuilder {
    fn default() -> Self {
        Self {
            data: [0; MAX_BYTE_LEN],
            bit_len: 0,
            refs: ArrayVec::new(),
        }
    }
}

impl CellBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    fn ensure_capacity(&self, extra: usize) -> Result<()> {
        if self.bit_len + extra > MAX_BIT_LEN {
            return Err(Error::CellDataOverflow(extra));
        }
        Ok(())
    }

    pub fn store_bit(&mut self, bit: bool) -> Result<&mut Self> {
        self.ensure_capacity(1)?;
        if bit {
            self.data[self.bit_len / 8] |= 1 << (7 - self.bit_len % 8);
        }
        self.bit_len += 1;
        Ok(self)
    }

    /// Stores the low `bits` bits of `value`, most significant first.
    ///
    /// # Panics
    ///
    /// Panics if `bits > 64`.
    pub fn store_uint(&mut self, value: u64, bits: usize) -> Result<&mut Self> {
        assert!(bits <= 64, "store_uint supports at most 64 bits");
        self.ensure_capacity(bits)?;
        for i in (0..bits).rev() {
            self.store_bit((value >> i) & 1 == 1)?;
        }
        Ok(self)
    }

    pub fn store_u32(&mut self, value: u32) -> Result<&mut Self> {
        self.store_uint(value as u64, 32)
    }

    pub fn store_u64(&mut self, value: u64) -> Result<&mut Self> {
        self.store_uint(value, 64)
    }

    pub fn store_bytes(&mut self, bytes: &[u8]) -> Result<&mut Self> {
        self.ensure_capacity(bytes.len() * 8)?;
        for byte in bytes {
            self.store_uint(*byte as u64, 8)?;
        }
        Ok(self)
    }

    /// Stores a coin amount as a 4-bit byte count plus big-endian magnitude.
    pub fn store_coins(&mut self, coins: Coins) -> Result<&mut Self> {
        let nano = coins.into_nano();
        let byte_len = (128 - nano.leading_zeros() as usize).div_ceil(8);
        if byte_len > 15 {
            return Err(Error::CoinsOverflow);
        }
        self.store_uint(byte_len as u64, 4)?;
        for i in (0..byte_len).rev() {
            self.store_uint((nano >> (i * 8)) as u64 & 0xff, 8)?;
        }
        Ok(self)
    }

    /// Stores a standard address without anycast info.
    pub fn store_address(&mut self, address: &Address) -> Result<&mut Self> {
        self.store_uint(0b100, 3)?;
        self.store_uint(address.workchain as u8 as u64, 8)?;
        self.store_bytes(address.account.as_slice())?;
        Ok(self)
    }

    pub fn store_reference(&mut self, cell: Arc<Cell>) -> Result<&mut Self> {
        self.refs.try_push(cell).map_err(|_| Error::CellRefOverflow)?;
        Ok(self)
    }

    /// Stores a string as a snake: the bytes that fit stay in this cell, the
    /// remainder continues down a chain of reference cells.
    pub fn store_string_snake(&mut self, value: &str) -> Result<&mut Self> {
        let bytes = value.as_bytes();
        let fit = ((MAX_BIT_LEN - self.bit_len) / 8).min(bytes.len());
        self.store_bytes(&bytes[..fit])?;

        let mut rest = &bytes[fit..];
        if rest.is_empty() {
            return Ok(self);
        }
        let mut chunks = Vec::new();
        while !rest.is_empty() {
            let fit = (MAX_BIT_LEN / 8).min(rest.len());
            chunks.push(&rest[..fit]);
            rest = &rest[fit..];
        }
        // the chain links forward, so it has to be built back to front
        let mut tail: Option<Arc<Cell>> = None;
        for chunk in chunks.iter().rev() {
            let mut link = CellBuilder::new();
            link.store_bytes(chunk)?;
            if let Some(next) = tail.take() {
                link.store_reference(next)?;
            }
            tail = Some(Arc::new(link.build()));
        }
        if let Some(next) = tail {
            self.store_reference(next)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Cell {
        let byte_len = self.bit_len.div_ceil(8);
        let mut data = ArrayVec::from(self.data);
        data.truncate(byte_len);
        Cell {
            data,
            bit_len: self.bit_len,
            refs: self.refs,
        }
    }
}
