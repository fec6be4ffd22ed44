//! Writer for small `.DS_Store` fixtures.
//!
//! Shared by unit tests and the integration tests under `tests/`, so it only
//! depends on `std`.

#![allow(dead_code)]
#![allow(clippy::cast_possible_truncation)]

const ADDRESS_TABLE_CHUNK: usize = 256;
const FREE_LIST_COUNT: usize = 32;
const MIN_BLOCK: usize = 32;
const PAGE_SIZE: u32 = 0x1000;

#[derive(Debug, Clone)]
enum FixtureValue {
    Blob(Vec<u8>),
    Long(u32),
    Ustr(String),
    Raw { type_code: [u8; 4], bytes: Vec<u8> },
}

#[derive(Debug, Clone)]
struct FixtureRecord {
    name: String,
    code: [u8; 4],
    value: FixtureValue,
}

/// Builds `.DS_Store` bytes with the given records.
#[derive(Debug, Clone)]
pub struct DsStoreBuilder {
    records: Vec<FixtureRecord>,
    directory_name: String,
}

impl Default for DsStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DsStoreBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            directory_name: "DSDB".to_string(),
        }
    }

    /// Adds an icon location record, the most common record in real files.
    #[must_use]
    pub fn entry(mut self, name: &str) -> Self {
        self.records.push(FixtureRecord {
            name: name.to_string(),
            code: *b"Iloc",
            value: FixtureValue::Blob(vec![0, 0, 0, 64, 0, 0, 0, 32, 255, 255, 255, 255, 0, 0, 0, 0]),
        });
        self
    }

    #[must_use]
    pub fn long(mut self, name: &str, code: [u8; 4], value: u32) -> Self {
        self.records.push(FixtureRecord {
            name: name.to_string(),
            code,
            value: FixtureValue::Long(value),
        });
        self
    }

    #[must_use]
    pub fn comment(mut self, name: &str, text: &str) -> Self {
        self.records.push(FixtureRecord {
            name: name.to_string(),
            code: *b"cmmt",
            value: FixtureValue::Ustr(text.to_string()),
        });
        self
    }

    /// Adds a record whose value type the decoder does not know.
    #[must_use]
    pub fn unknown_type(mut self, name: &str) -> Self {
        self.records.push(FixtureRecord {
            name: name.to_string(),
            code: *b"Iloc",
            value: FixtureValue::Raw {
                type_code: *b"zzzz",
                bytes: vec![0; 8],
            },
        });
        self
    }

    /// Renames the table of contents entry that points at the tree.
    #[must_use]
    pub fn directory_name(mut self, name: &str) -> Self {
        self.directory_name = name.to_string();
        self
    }

    /// Single leaf node holding every record.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let leaf = leaf_node(&self.records);
        self.assemble(2, 1, vec![leaf])
    }

    /// Internal root with one separator record and two leaf children.
    ///
    /// Needs at least one record.
    #[must_use]
    pub fn build_two_level(&self) -> Vec<u8> {
        let mid = self.records.len() / 2;
        let left = leaf_node(&self.records[..mid]);
        let right = leaf_node(&self.records[mid + 1..]);
        // block ids: 2 = root, 3 = left leaf, 4 = right leaf
        let root = internal_node(&[(3, &self.records[mid])], 4);
        self.assemble(2, 2, vec![root, left, right])
    }

    /// Internal root whose only child is itself.
    ///
    /// Needs at least one record.
    #[must_use]
    pub fn build_cyclic(&self) -> Vec<u8> {
        let root = internal_node(&[(2, &self.records[0])], 3);
        let leaf = leaf_node(&[]);
        self.assemble(2, 2, vec![root, leaf])
    }

    /// Lays out blocks as: 0 = allocator info, 1 = tree superblock, 2.. = nodes.
    fn assemble(&self, root_node: u32, levels: u32, nodes: Vec<Vec<u8>>) -> Vec<u8> {
        let block_count = nodes.len() + 2;
        let padded_count = block_count.div_ceil(ADDRESS_TABLE_CHUNK) * ADDRESS_TABLE_CHUNK;
        let info_len = 8 + padded_count * 4 + 4 + 1 + self.directory_name.len() + 4 + FREE_LIST_COUNT * 4;

        let mut superblock = Vec::new();
        for word in [
            root_node,
            levels,
            self.records.len() as u32,
            nodes.len() as u32,
            PAGE_SIZE,
        ] {
            superblock.extend_from_slice(&word.to_be_bytes());
        }

        let mut contents = vec![Vec::new(), superblock];
        contents.extend(nodes);

        // offsets are relative to byte 4; the header occupies relative 0..32
        let mut cursor = 32usize;
        let mut placements = Vec::with_capacity(contents.len());
        for (id, content) in contents.iter().enumerate() {
            let len = if id == 0 { info_len } else { content.len() };
            let size = len.max(MIN_BLOCK).next_power_of_two();
            let offset = cursor.next_multiple_of(size);
            cursor = offset + size;
            placements.push((offset, size));
        }

        let mut info = Vec::with_capacity(info_len);
        info.extend_from_slice(&(block_count as u32).to_be_bytes());
        info.extend_from_slice(&0u32.to_be_bytes());
        for slot in 0..padded_count {
            let address = placements.get(slot).map_or(0, |(offset, size)| {
                *offset as u32 | size.trailing_zeros()
            });
            info.extend_from_slice(&address.to_be_bytes());
        }
        info.extend_from_slice(&1u32.to_be_bytes());
        info.push(self.directory_name.len() as u8);
        info.extend_from_slice(self.directory_name.as_bytes());
        info.extend_from_slice(&1u32.to_be_bytes());
        for _ in 0..FREE_LIST_COUNT {
            info.extend_from_slice(&0u32.to_be_bytes());
        }
        contents[0] = info;

        let mut file = vec![0u8; 4 + cursor];
        let (info_offset, info_size) = placements[0];
        file[3] = 1;
        file[4..8].copy_from_slice(b"Bud1");
        file[8..12].copy_from_slice(&(info_offset as u32).to_be_bytes());
        file[12..16].copy_from_slice(&(info_size as u32).to_be_bytes());
        file[16..20].copy_from_slice(&(info_offset as u32).to_be_bytes());

        for (content, (offset, _)) in contents.iter().zip(&placements) {
            let start = 4 + offset;
            file[start..start + content.len()].copy_from_slice(content);
        }
        file
    }
}

fn leaf_node(records: &[FixtureRecord]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&(records.len() as u32).to_be_bytes());
    for record in records {
        encode_record(&mut out, record);
    }
    out
}

fn internal_node(entries: &[(u32, &FixtureRecord)], rightmost: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&rightmost.to_be_bytes());
    out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
    for (child, record) in entries {
        out.extend_from_slice(&child.to_be_bytes());
        encode_record(&mut out, record);
    }
    out
}

fn encode_utf16(out: &mut Vec<u8>, text: &str) {
    let units: Vec<u16> = text.encode_utf16().collect();
    out.extend_from_slice(&(units.len() as u32).to_be_bytes());
    for unit in units {
        out.extend_from_slice(&unit.to_be_bytes());
    }
}

fn encode_record(out: &mut Vec<u8>, record: &FixtureRecord) {
    encode_utf16(out, &record.name);
    out.extend_from_slice(&record.code);
    match &record.value {
        FixtureValue::Blob(bytes) => {
            out.extend_from_slice(b"blob");
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        FixtureValue::Long(value) => {
            out.extend_from_slice(b"long");
            out.extend_from_slice(&value.to_be_bytes());
        }
        FixtureValue::Ustr(text) => {
            out.extend_from_slice(b"ustr");
            encode_utf16(out, text);
        }
        FixtureValue::Raw { type_code, bytes } => {
            out.extend_from_slice(type_code);
            out.extend_from_slice(bytes);
        }
    }
}
