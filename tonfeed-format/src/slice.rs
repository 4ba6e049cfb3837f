use crate::{Address, Cell, Coins, Error, Result};
use std::sync::Arc;

/// Read cursor over the data bits and references of a single [`Cell`].
///
/// Every load advances the cursor and is bounds checked: reading past the end
/// yields [`Error::CellDataUnderflow`] or [`Error::CellRefUnderflow`] rather
/// than panicking, so malformed on-chain payloads surface as values.
#[derive(Clone)]
pub struct CellSlice<'a> {
    cell: &'a Cell,
    bit_pos: usize,
    ref_pos: usize,
}

impl<'a> CellSlice<'a> {
    pub(crate) fn new(cell: &'a Cell) -> Self {
        Self {
            cell,
            bit_pos: 0,
            ref_pos: 0,
        }
    }

    pub fn remaining_bits(&self) -> usize {
        self.cell.bit_len() - self.bit_pos
    }

    pub fn remaining_refs(&self) -> usize {
        self.cell.references().len() - self.ref_pos
    }

    pub fn is_data_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    fn ensure_bits(&self, wanted: usize) -> Result<()> {
        let left = self.remaining_bits();
        if left < wanted {
            return Err(Error::CellDataUnderflow { wanted, left });
        }
        Ok(())
    }

    pub fn load_bit(&mut self) -> Result<bool> {
        self.ensure_bits(1)?;
        let byte = self.cell.data()[self.bit_pos / 8];
        let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
        self.bit_pos += 1;
        Ok(bit == 1)
    }

    /// Loads up to 64 bits as a big-endian unsigned integer.
    ///
    /// # Panics
    ///
    /// Panics if `bits > 64`. That is a caller bug, not a data error.
    pub fn load_uint(&mut self, bits: usize) -> Result<u64> {
        assert!(bits <= 64, "load_uint supports at most 64 bits");
        self.ensure_bits(bits)?;
        let mut value = 0u64;
        for _ in 0..bits {
            let byte = self.cell.data()[self.bit_pos / 8];
            let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
            value = (value << 1) | bit as u64;
            self.bit_pos += 1;
        }
        Ok(value)
    }

    pub fn load_u8(&mut self) -> Result<u8> {
        self.load_uint(8).map(|v| v as u8)
    }

    pub fn load_u32(&mut self) -> Result<u32> {
        self.load_uint(32).map(|v| v as u32)
    }

    pub fn load_u64(&mut self) -> Result<u64> {
        self.load_uint(64)
    }

    pub fn skip_bits(&mut self, bits: usize) -> Result<()> {
        self.ensure_bits(bits)?;
        self.bit_pos += bits;
        Ok(())
    }

    /// Fills `buf` with the next `buf.len() * 8` bits. Works at any bit
    /// offset, not only on byte boundaries.
    pub fn load_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.ensure_bits(buf.len() * 8)?;
        for byte in buf.iter_mut() {
            *byte = self.load_uint(8)? as u8;
        }
        Ok(())
    }

    pub fn load_reference(&mut self) -> Result<&'a Arc<Cell>> {
        let reference = self
            .cell
            .references()
            .get(self.ref_pos)
            .ok_or(Error::CellRefUnderflow)?;
        self.ref_pos += 1;
        Ok(reference)
    }

    /// Loads a variable-length coin amount: a 4-bit byte count followed by
    /// that many bytes of big-endian magnitude. Zero is encoded with a zero
    /// length and no magnitude bytes.
    pub fn load_coins(&mut self) -> Result<Coins> {
        let len = self.load_uint(4)? as usize;
        let mut value = 0u128;
        for _ in 0..len {
            value = (value << 8) | self.load_uint(8)? as u128;
        }
        Ok(Coins::new(value))
    }

    /// Loads a message address constructor.
    ///
    /// Returns `None` for the empty address and `Some` for a standard one.
    /// External and variable-length constructors, as well as standard
    /// addresses carrying anycast info, come back as errors since nothing
    /// downstream can represent them.
    pub fn load_address(&mut self) -> Result<Option<Address>> {
        let tag = self.load_uint(2)? as u8;
        match tag {
            0b00 => Ok(None),
            0b10 => {
                if self.load_bit()? {
                    return Err(Error::UnsupportedAnycast);
                }
                let workchain = self.load_uint(8)? as i8;
                let mut account = [0; 32];
                self.load_bytes(&mut account)?;
                Ok(Some(Address::new(workchain, account)))
            }
            _ => Err(Error::UnsupportedAddress(tag)),
        }
    }

    /// Loads the rest of this slice and the single-reference chain below it
    /// as one utf-8 string.
    ///
    /// Each link must be byte aligned and carry at most one reference; the
    /// bytes of every link are concatenated in order.
    pub fn load_string_snake(&mut self) -> Result<String> {
        let mut bytes = Vec::new();
        collect_snake(self, &mut bytes)?;
        String::from_utf8(bytes).map_err(Error::InvalidUtf8)
    }
}

fn collect_snake(slice: &mut CellSlice<'_>, out: &mut Vec<u8>) -> Result<()> {
    if slice.remaining_bits() % 8 != 0 {
        return Err(Error::UnalignedString(slice.remaining_bits()));
    }
    while slice.remaining_bits() > 0 {
        out.push(slice.load_uint(8)? as u8);
    }
    match slice.remaining_refs() {
        0 => Ok(()),
        1 => {
            let next: &Arc<Cell> = slice.load_reference()?;
            collect_snake(&mut next.parse(), out)
        }
        n => Err(Error::StringChainBranches(n)),
    }
}
