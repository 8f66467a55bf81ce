//! AKPK container index
//!
//! Layout (all integers little-endian u32):
//!
//! ```text
//! 0        "AKPK"
//! 4        header size, version (ignored)
//! 12       language map size L
//! 25 + L   bank table flag F (non-zero: 23 more bytes follow, else 3)
//! ...      stream count N
//! ...      N entries of { id, block size, length, offset, padding }
//! ```

use crate::error::{PckError, Result};

const MAGIC: &[u8; 4] = b"AKPK";
const LANGUAGE_MAP_SIZE_OFFSET: usize = 12;
const SOUND_TABLE_BASE: usize = 25;
const ENTRY_SIZE: usize = 20;

/// One stream in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PckEntry {
    pub id: u32,
    pub block_size: u32,
    pub length: u32,
    pub offset: u32,
}

impl PckEntry {
    /// Byte range of the stream inside a container of `file_len` bytes
    pub fn range(&self, file_len: usize) -> Result<std::ops::Range<usize>> {
        let start = self.offset as usize;
        let end = start.checked_add(self.length as usize).filter(|&end| end <= file_len);
        match end {
            Some(end) => Ok(start..end),
            None => Err(PckError::EntryOutOfBounds {
                id: self.id,
                offset: self.offset,
                length: self.length,
                file_len,
            }),
        }
    }
}

/// Parsed stream table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PckIndex {
    pub entries: Vec<PckEntry>,
}

impl PckIndex {
    /// Parse the index from the start of a container
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        let magic = reader.take(4)?;
        if magic != MAGIC {
            let mut found = [0u8; 4];
            found.copy_from_slice(magic);
            return Err(PckError::InvalidMagic(found));
        }

        reader.seek(LANGUAGE_MAP_SIZE_OFFSET)?;
        let language_map_size = reader.read_u32()? as usize;
        reader.seek(SOUND_TABLE_BASE + language_map_size)?;

        // Some titles carry an extra bank table before the stream table
        let flag = reader.read_u32()?;
        reader.take(if flag != 0 { 23 } else { 3 })?;

        let count = reader.read_u32()? as usize;
        reader.ensure(count.saturating_mul(ENTRY_SIZE))?;

        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let id = reader.read_u32()?;
            let block_size = reader.read_u32()?;
            let length = reader.read_u32()?;
            let offset = reader.read_u32()?;
            reader.read_u32()?;
            entries.push(PckEntry {
                id,
                block_size,
                length,
                offset,
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn ensure(&self, needed: usize) -> Result<()> {
        match self.pos.checked_add(needed) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(PckError::UnexpectedEof {
                offset: self.pos,
                needed,
            }),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(PckError::UnexpectedEof {
                offset: self.data.len(),
                needed: pos - self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}
