//! Error types for ostmix-pck

use std::path::PathBuf;
use thiserror::Error;

/// Container parsing and extraction errors
#[derive(Error, Debug)]
pub enum PckError {
    /// File does not start with `AKPK`
    #[error("Not an AKPK container (magic {0:02x?})")]
    InvalidMagic([u8; 4]),

    /// Container ends inside the header or index
    #[error("Unexpected end of data: needed {needed} byte(s) at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },

    /// Index entry points past the end of the container
    #[error("Entry {id} ({length} bytes at {offset}) exceeds container size {file_len}")]
    EntryOutOfBounds {
        id: u32,
        offset: u32,
        length: u32,
        file_len: usize,
    },

    /// External conversion tool failed
    #[error("{tool} failed on {path}: {reason}")]
    Tool {
        tool: String,
        path: PathBuf,
        reason: String,
    },

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using PckError
pub type Result<T> = std::result::Result<T, PckError>;
