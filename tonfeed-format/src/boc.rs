//! Bag of cells codec.
//!
//! The standard interchange framing for cell trees. Decoding accepts the
//! common generic variants (optional index section, optional trailing crc32c
//! which is skipped, not verified) as long as the bag holds a single ordinary
//! root. Encoding always produces the minimal form without index or checksum.

use crate::{Cell, Error, Result};
use arrayvec::ArrayVec;
use std::collections::HashMap;
use std::result::Result as StdResult;
use std::sync::Arc;

const BOC_MAGIC: u32 = 0xb5ee_9c72;

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(Error::BocUnderflow)?;
        let slice = self.bytes.get(self.pos..end).ok_or(Error::BocUnderflow)?;
        self.pos = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn take_be(&mut self, n: usize) -> Result<u64> {
        let mut value = 0u64;
        for byte in self.take(n)? {
            value = (value << 8) | *byte as u64;
        }
        Ok(value)
    }
}

struct RawCell<'a> {
    data: &'a [u8],
    bit_len: usize,
    refs: ArrayVec<usize, 4>,
}

/// Decodes a bag of cells into its single root cell.
pub fn decode(bytes: &[u8]) -> Result<Cell> {
    let mut reader = Reader::new(bytes);

    let magic = reader.take_be(4)? as u32;
    if magic != BOC_MAGIC {
        return Err(Error::BocMagic(magic));
    }

    let flags = reader.take_u8()?;
    let has_index = flags & 0x80 != 0;
    let has_crc = flags & 0x40 != 0;
    if flags & 0x20 != 0 {
        return Err(Error::BocUnsupported("cache bits"));
    }
    if flags & 0x18 != 0 {
        return Err(Error::BocMalformed("reserved flag bits set"));
    }
    let ref_size = (flags & 0x07) as usize;
    if ref_size == 0 || ref_size > 4 {
        return Err(Error::BocMalformed("reference size out of range"));
    }

    let off_bytes = reader.take_u8()? as usize;
    if off_bytes == 0 || off_bytes > 8 {
        return Err(Error::BocMalformed("offset size out of range"));
    }

    let cell_count = reader.take_be(ref_size)? as usize;
    let root_count = reader.take_be(ref_size)? as usize;
    let absent_count = reader.take_be(ref_size)?;
    let _total_cells_size = reader.take_be(off_bytes)?;

    if root_count != 1 {
        return Err(Error::BocUnsupported("multiple roots"));
    }
    if absent_count != 0 {
        return Err(Error::BocUnsupported("absent cells"));
    }
    if cell_count == 0 {
        return Err(Error::BocMalformed("empty cell list"));
    }

    let root_index = reader.take_be(ref_size)? as usize;
    if root_index >= cell_count {
        return Err(Error::BocMalformed("root index out of range"));
    }

    if has_index {
        let index_size = cell_count
            .checked_mul(off_bytes)
            .ok_or(Error::BocMalformed("index size overflow"))?;
        reader.take(index_size)?;
    }

    let mut raw_cells = Vec::with_capacity(cell_count.min(4096));
    for i in 0..cell_count {
        let d1 = reader.take_u8()?;
        let d2 = reader.take_u8()?;
        if d1 & 0x08 != 0 {
            return Err(Error::BocUnsupported("exotic cells"));
        }
        if d1 & 0x10 != 0 {
            return Err(Error::BocUnsupported("stored hashes"));
        }
        if d1 >> 5 != 0 {
            return Err(Error::BocUnsupported("nonzero level"));
        }
        let ref_count = (d1 & 0x07) as usize;
        if ref_count > 4 {
            return Err(Error::BocMalformed("too many references"));
        }

        let byte_len = (d2 as usize + 1) >> 1;
        let data = reader.take(byte_len)?;
        let bit_len = if d2 & 1 == 1 {
            // partial last byte, terminated by a single one bit
            let last = *data.last().ok_or(Error::BocMalformed("missing completion tag"))?;
            if last == 0 {
                return Err(Error::BocMalformed("missing completion tag"));
            }
            byte_len * 8 - last.trailing_zeros() as usize - 1
        } else {
            byte_len * 8
        };

        let mut refs = ArrayVec::new();
        for _ in 0..ref_count {
            let idx = reader.take_be(ref_size)? as usize;
            if idx <= i || idx >= cell_count {
                return Err(Error::BocMalformed("reference out of order"));
            }
            refs.push(idx);
        }
        raw_cells.push(RawCell { data, bit_len, refs });
    }

    if has_crc {
        reader.take(4)?;
    }

    // references only point forward, so linking runs back to front
    let mut cells: Vec<Option<Arc<Cell>>> = vec![None; cell_count];
    for i in (0..cell_count).rev() {
        let raw = &raw_cells[i];
        let mut data: ArrayVec<u8, { crate::cell::MAX_BYTE_LEN }> = ArrayVec::new();
        data.try_extend_from_slice(raw.data)
            .map_err(|_| Error::BocMalformed("cell data too long"))?;
        if raw.bit_len % 8 != 0 {
            let keep = raw.bit_len % 8;
            if let Some(last) = data.last_mut() {
                // drop the completion tag so equality stays structural
                *last &= 0xffu8 << (8 - keep);
            }
        }
        let mut refs = ArrayVec::new();
        for &idx in &raw.refs {
            let child = cells[idx]
                .clone()
                .ok_or(Error::BocMalformed("reference out of order"))?;
            refs.push(child);
        }
        cells[i] = Some(Arc::new(Cell {
            data,
            bit_len: raw.bit_len,
            refs,
        }));
    }

    let root = cells[root_index]
        .take()
        .ok_or(Error::BocMalformed("root cell missing"))?;
    Ok(Arc::try_unwrap(root).unwrap_or_else(|arc| (*arc).clone()))
}

/// Serializes `root` and every cell below it.
///
/// Children shared through the same [`Arc`] are written once. The output
/// carries no index section and no checksum.
pub fn encode(root: &Cell) -> Vec<u8> {
    let mut seen = HashMap::new();
    let mut depths = Vec::new();
    let mut list = Vec::new();
    visit(root, 0, &mut seen, &mut depths, &mut list);

    // parents must come before children, max depth from the root gives a
    // valid order even when subtrees are shared
    let mut order: Vec<usize> = (0..list.len()).collect();
    order.sort_by_key(|&i| (depths[i], i));
    let mut index_of = vec![0usize; list.len()];
    for (pos, &i) in order.iter().enumerate() {
        index_of[i] = pos;
    }

    let ref_size = be_width(list.len() as u64);
    let mut total_size = 0u64;
    for cell in &list {
        total_size += (2 + cell.data().len() + cell.references().len() * ref_size) as u64;
    }
    let off_bytes = be_width(total_size);

    let mut out = Vec::new();
    out.extend_from_slice(&BOC_MAGIC.to_be_bytes());
    out.push(ref_size as u8);
    out.push(off_bytes as u8);
    write_be(&mut out, list.len() as u64, ref_size);
    write_be(&mut out, 1, ref_size);
    write_be(&mut out, 0, ref_size);
    write_be(&mut out, total_size, off_bytes);
    write_be(&mut out, index_of[0] as u64, ref_size);

    for &i in &order {
        let cell = list[i];
        out.push(cell.references().len() as u8);
        out.push((cell.bit_len() / 8 + cell.bit_len().div_ceil(8)) as u8);
        let byte_len = cell.data().len();
        if cell.bit_len() % 8 == 0 {
            out.extend_from_slice(cell.data());
        } else {
            out.extend_from_slice(&cell.data()[..byte_len - 1]);
            let keep = cell.bit_len() % 8;
            out.push(cell.data()[byte_len - 1] | 0x80u8 >> keep);
        }
        for child in cell.references() {
            let discovery = seen[&(child.as_ref() as *const Cell)];
            write_be(&mut out, index_of[discovery] as u64, ref_size);
        }
    }
    out
}

fn visit<'a>(
    cell: &'a Cell,
    depth: usize,
    seen: &mut HashMap<*const Cell, usize>,
    depths: &mut Vec<usize>,
    list: &mut Vec<&'a Cell>,
) {
    let key = cell as *const Cell;
    if let Some(&idx) = seen.get(&key) {
        if depth <= depths[idx] {
            return;
        }
        depths[idx] = depth;
    } else {
        seen.insert(key, list.len());
        depths.push(depth);
        list.push(cell);
    }
    for child in cell.references() {
        visit(child, depth + 1, seen, depths, list);
    }
}

fn be_width(mut value: u64) -> usize {
    let mut width = 1;
    while value > 0xff {
        value >>= 8;
        width += 1;
    }
    width
}

fn write_be(out: &mut Vec<u8>, value: u64, width: usize) {
    for i in (0..width).rev() {
        out.push((value >> (i * 8)) as u8);
    }
}

/// Decodes a base64 string carrying a bag of cells.
pub fn decode_base64(value: &str) -> Result<Cell> {
    let bytes = base64::decode(value).map_err(Error::DecodeBase64)?;
    decode(&bytes)
}

/// Encodes `root` as base64 for embedding in json payloads.
pub fn encode_base64(root: &Cell) -> String {
    base64::encode(encode(root))
}

/// Serde adapter for optional cell fields carried as base64 bags of cells.
pub mod serde_boc {
    use super::*;

    pub fn serialize<S>(cell: &Option<Cell>, serializer: S) -> StdResult<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match cell {
            Some(cell) => serializer.serialize_some(&encode_base64(cell)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> StdResult<Option<Cell>, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value: Option<String> = serde::Deserialize::deserialize(deserializer)?;
        match value {
            Some(value) => decode_base64(&value)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
