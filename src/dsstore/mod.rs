//! `.DS_Store` decoding.
//!
//! A `.DS_Store` file is a buddy-allocator heap holding a B-tree of records
//! (the `DSDB` entry). Each record names a directory entry. The crawler only
//! needs the set of distinct names, which [`MetadataDecoder::decode`] returns;
//! [`DsStore`] keeps the full records for callers that want more.
//!
//! # Example
//!
//! ```no_run
//! use dsstore_dump::{DsStoreDecoder, MetadataDecoder};
//!
//! let bytes = std::fs::read(".DS_Store").unwrap();
//! for name in DsStoreDecoder.decode(&bytes).unwrap() {
//!     println!("{name}");
//! }
//! ```

mod buddy;
mod error;
mod record;

pub use error::FormatError;
pub use record::{Record, RecordValue};

use std::collections::{BTreeSet, HashSet};

use buddy::BuddyAllocator;
use tracing::trace;

/// Name of the metadata file probed in every directory.
pub const METADATA_FILENAME: &str = ".DS_Store";

/// Table of contents entry holding the record tree.
const TREE_DIRECTORY: &str = "DSDB";

/// Deepest B-tree accepted; real files are one or two levels deep.
const MAX_TREE_DEPTH: usize = 32;

/// Turns raw metadata bytes into the set of entry names they describe.
///
/// Implementations must be pure: the same bytes always yield the same result.
pub trait MetadataDecoder: Send + Sync {
    /// Decodes `bytes` into distinct entry names.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] if the bytes are not a well-formed metadata file.
    fn decode(&self, bytes: &[u8]) -> Result<BTreeSet<String>, FormatError>;
}

/// Default decoder for the buddy-allocator `.DS_Store` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct DsStoreDecoder;

impl MetadataDecoder for DsStoreDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<BTreeSet<String>, FormatError> {
        Ok(DsStore::parse(bytes)?.filenames())
    }
}

/// A fully decoded `.DS_Store` file.
#[derive(Debug, Clone, Default)]
pub struct DsStore {
    records: Vec<Record>,
}

impl DsStore {
    /// Parses a complete `.DS_Store` file.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError`] on a bad header, out-of-range blocks, truncated
    /// records, unknown value types, or a cyclic/too-deep record tree.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let allocator = BuddyAllocator::parse(bytes)?;
        let superblock_id = allocator
            .lookup(TREE_DIRECTORY)
            .ok_or(FormatError::MissingDirectory(TREE_DIRECTORY))?;

        let mut superblock = allocator.block(superblock_id)?;
        let root_node = superblock.read_u32()?;
        let levels = superblock.read_u32()?;
        let record_count = superblock.read_u32()?;
        trace!(root_node, levels, record_count, "read tree superblock");

        let mut records = Vec::new();
        let mut visited = HashSet::new();
        collect_records(&allocator, root_node, 0, &mut visited, &mut records)?;
        Ok(Self { records })
    }

    /// Returns every record in tree order.
    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Returns the distinct entry names, sorted.
    #[must_use]
    pub fn filenames(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.filename.clone()).collect()
    }
}

fn collect_records(
    allocator: &BuddyAllocator<'_>,
    node: u32,
    depth: usize,
    visited: &mut HashSet<u32>,
    out: &mut Vec<Record>,
) -> Result<(), FormatError> {
    if depth > MAX_TREE_DEPTH || !visited.insert(node) {
        return Err(FormatError::MalformedTree { node });
    }

    let mut block = allocator.block(node)?;
    let rightmost_child = block.read_u32()?;
    let count = block.read_u32()?;

    if rightmost_child == 0 {
        for _ in 0..count {
            out.push(Record::read(&mut block)?);
        }
    } else {
        for _ in 0..count {
            let child = block.read_u32()?;
            collect_records(allocator, child, depth + 1, visited, out)?;
            out.push(Record::read(&mut block)?);
        }
        collect_records(allocator, rightmost_child, depth + 1, visited, out)?;
    }
    Ok(())
}
