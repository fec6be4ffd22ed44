//! Error types for `.DS_Store` decoding.

use thiserror::Error;

/// The bytes are not a well-formed `.DS_Store` file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Input is shorter than the fixed header.
    #[error("file too short: {len} bytes")]
    TooShort {
        /// Actual input length.
        len: usize,
    },

    /// Header magic or alignment prefix did not match.
    #[error("bad buddy allocator header")]
    BadMagic,

    /// The two copies of the root block offset disagree.
    #[error("root block offset mismatch ({first:#x} != {second:#x})")]
    OffsetMismatch {
        /// Offset in the first header slot.
        first: u32,
        /// Offset in the second header slot.
        second: u32,
    },

    /// A block lies (partly) outside the file.
    #[error("block at {offset:#x} with size {size} exceeds file length {file_len}")]
    BlockOutOfFile {
        /// Block offset relative to the allocator origin.
        offset: usize,
        /// Block size in bytes.
        size: usize,
        /// Total input length.
        file_len: usize,
    },

    /// A read went past the end of the block it was reading.
    #[error("read of {wanted} bytes at {position} overruns block of {size} bytes")]
    ReadPastBlock {
        /// Cursor position within the block.
        position: usize,
        /// Requested length.
        wanted: usize,
        /// Block size.
        size: usize,
    },

    /// A block id is not present in the allocator's address table.
    #[error("unknown block id {0}")]
    UnknownBlock(u32),

    /// The table of contents lacks a required entry.
    #[error("missing directory entry '{0}'")]
    MissingDirectory(&'static str),

    /// A record carried a value type this decoder does not know.
    #[error("unknown record type code {code:?}")]
    UnknownType {
        /// The raw four-character code, lossily decoded.
        code: String,
    },

    /// A UTF-16 string could not be decoded.
    #[error("invalid UTF-16 string")]
    InvalidString,

    /// The B-tree references a node twice or nests deeper than allowed.
    #[error("malformed B-tree at node {node}")]
    MalformedTree {
        /// Node id at which traversal stopped.
        node: u32,
    },
}
