//! Buddy allocator container underlying a `.DS_Store` file.
//!
//! The file is a small heap of power-of-two sized blocks. A header points at
//! the allocator info block, which holds the block address table and a table
//! of contents mapping names (only `DSDB` matters) to block ids.

use std::collections::HashMap;

use super::error::FormatError;

/// Every file starts with this four byte prefix before the header proper.
const ALIGNMENT_PREFIX: [u8; 4] = [0, 0, 0, 1];

const MAGIC: [u8; 4] = *b"Bud1";

/// Prefix, magic, three offsets/sizes and 16 unused bytes.
const HEADER_LEN: usize = 36;

/// Offsets stored in the file are relative to this position.
const ORIGIN: usize = 4;

/// The block address table is stored in chunks of this many entries.
const ADDRESS_TABLE_CHUNK: usize = 256;

/// Free lists follow the table of contents, one per power of two.
const FREE_LIST_COUNT: usize = 32;

/// Low bits of a block address hold log2 of the block size.
const SIZE_SHIFT_MASK: u32 = 0x1f;

/// Bounds-checked big-endian cursor over one block.
#[derive(Debug, Clone)]
pub(crate) struct Block<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Block<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    pub(crate) fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(FormatError::ReadPastBlock {
                position: self.position,
                wanted: len,
                size: self.data.len(),
            })?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    /// Reads `units` UTF-16BE code units.
    pub(crate) fn read_utf16(&mut self, units: u32) -> Result<String, FormatError> {
        let len = usize::try_from(units)
            .ok()
            .and_then(|units| units.checked_mul(2))
            .ok_or(FormatError::ReadPastBlock {
                position: self.position,
                wanted: usize::MAX,
                size: self.data.len(),
            })?;
        let bytes = self.read_bytes(len)?;
        let code_units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&code_units).map_err(|_| FormatError::InvalidString)
    }
}

/// Parsed allocator metadata, borrowing the raw file.
#[derive(Debug)]
pub(crate) struct BuddyAllocator<'a> {
    file: &'a [u8],
    addresses: Vec<u32>,
    directory: HashMap<String, u32>,
}

impl<'a> BuddyAllocator<'a> {
    pub(crate) fn parse(file: &'a [u8]) -> Result<Self, FormatError> {
        if file.len() < HEADER_LEN {
            return Err(FormatError::TooShort { len: file.len() });
        }

        let mut header = Block::new(&file[..HEADER_LEN]);
        if header.read_array::<4>()? != ALIGNMENT_PREFIX || header.read_array::<4>()? != MAGIC {
            return Err(FormatError::BadMagic);
        }
        let root_offset = header.read_u32()?;
        let root_size = header.read_u32()?;
        let root_offset_copy = header.read_u32()?;
        if root_offset != root_offset_copy {
            return Err(FormatError::OffsetMismatch {
                first: root_offset,
                second: root_offset_copy,
            });
        }

        let mut root = block_at(file, to_usize(root_offset), to_usize(root_size))?;

        let block_count = to_usize(root.read_u32()?);
        root.read_u32()?;
        let table_len = block_count
            .div_ceil(ADDRESS_TABLE_CHUNK)
            .checked_mul(ADDRESS_TABLE_CHUNK * 4)
            .unwrap_or(usize::MAX);
        let addresses: Vec<u32> = root
            .read_bytes(table_len)?
            .chunks_exact(4)
            .take(block_count)
            .map(|word| u32::from_be_bytes([word[0], word[1], word[2], word[3]]))
            .collect();

        let mut directory = HashMap::new();
        let entry_count = root.read_u32()?;
        for _ in 0..entry_count {
            let name_len = root.read_u8()?;
            let name = root.read_bytes(usize::from(name_len))?;
            let block_id = root.read_u32()?;
            directory.insert(String::from_utf8_lossy(name).into_owned(), block_id);
        }

        for _ in 0..FREE_LIST_COUNT {
            let free_count = to_usize(root.read_u32()?);
            root.read_bytes(free_count.saturating_mul(4))?;
        }

        Ok(Self {
            file,
            addresses,
            directory,
        })
    }

    /// Looks up a named entry in the table of contents.
    pub(crate) fn lookup(&self, name: &str) -> Option<u32> {
        self.directory.get(name).copied()
    }

    /// Returns a cursor over the block with the given id.
    pub(crate) fn block(&self, id: u32) -> Result<Block<'a>, FormatError> {
        let address = *self
            .addresses
            .get(to_usize(id))
            .ok_or(FormatError::UnknownBlock(id))?;
        let offset = to_usize(address & !SIZE_SHIFT_MASK);
        let size = 1usize << (address & SIZE_SHIFT_MASK);
        block_at(self.file, offset, size)
    }
}

fn block_at(file: &[u8], offset: usize, size: usize) -> Result<Block<'_>, FormatError> {
    let out_of_file = || FormatError::BlockOutOfFile {
        offset,
        size,
        file_len: file.len(),
    };
    let start = ORIGIN.checked_add(offset).ok_or_else(out_of_file)?;
    let end = start.checked_add(size).ok_or_else(out_of_file)?;
    let data = file.get(start..end).ok_or_else(out_of_file)?;
    Ok(Block::new(data))
}

fn to_usize(value: u32) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_block_reads_big_endian() {
        let data = [0x00, 0x01, 0x02, 0x03, 0xff];
        let mut block = Block::new(&data);
        assert_eq!(block.read_u32().unwrap(), 0x0001_0203);
        assert_eq!(block.read_u8().unwrap(), 0xff);
    }

    #[test]
    fn test_block_read_past_end_fails() {
        let data = [0u8; 3];
        let mut block = Block::new(&data);
        assert_eq!(
            block.read_u32(),
            Err(FormatError::ReadPastBlock {
                position: 0,
                wanted: 4,
                size: 3
            })
        );
    }

    #[test]
    fn test_block_read_utf16() {
        let data = [0x00, b'a', 0x00, b'.', 0x00, b'b'];
        let mut block = Block::new(&data);
        assert_eq!(block.read_utf16(3).unwrap(), "a.b");
    }

    #[test]
    fn test_block_read_utf16_rejects_lone_surrogate() {
        let data = [0xd8, 0x00];
        let mut block = Block::new(&data);
        assert_eq!(block.read_utf16(1), Err(FormatError::InvalidString));
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert_eq!(
            BuddyAllocator::parse(&[0, 0, 0, 1]).unwrap_err(),
            FormatError::TooShort { len: 4 }
        );
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut data = vec![0u8; 64];
        data[3] = 1;
        data[4..8].copy_from_slice(b"Bud2");
        assert_eq!(
            BuddyAllocator::parse(&data).unwrap_err(),
            FormatError::BadMagic
        );
    }

    #[test]
    fn test_parse_rejects_offset_mismatch() {
        let mut data = vec![0u8; 64];
        data[3] = 1;
        data[4..8].copy_from_slice(b"Bud1");
        data[8..12].copy_from_slice(&32u32.to_be_bytes());
        data[16..20].copy_from_slice(&64u32.to_be_bytes());
        assert!(matches!(
            BuddyAllocator::parse(&data).unwrap_err(),
            FormatError::OffsetMismatch { .. }
        ));
    }

    #[test]
    fn test_parse_rejects_root_block_outside_file() {
        let mut data = vec![0u8; 64];
        data[3] = 1;
        data[4..8].copy_from_slice(b"Bud1");
        data[8..12].copy_from_slice(&32u32.to_be_bytes());
        data[12..16].copy_from_slice(&2048u32.to_be_bytes());
        data[16..20].copy_from_slice(&32u32.to_be_bytes());
        assert!(matches!(
            BuddyAllocator::parse(&data).unwrap_err(),
            FormatError::BlockOutOfFile { .. }
        ));
    }
}
