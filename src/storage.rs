//! Storage abstraction for segment files.
//!
//! Segment readers and writers only see the [`Storage`] trait, so the
//! doc-values files written through the format registry can live in any
//! backend. [`memory::MemoryStorage`] is the in-process backend used by tests
//! and temporary indexes.
//!
//! # Example
//!
//! ```
//! use std::io::{Read, Write};
//!
//! use strata_formats::storage::Storage;
//! use strata_formats::storage::memory::{MemoryStorage, MemoryStorageConfig};
//!
//! # fn main() -> strata_formats::error::Result<()> {
//! let storage = MemoryStorage::new(MemoryStorageConfig::default());
//!
//! let mut output = storage.create_output("segment_0.dv")?;
//! output.write_all(b"test data")?;
//! output.close()?;
//!
//! let mut input = storage.open_input("segment_0.dv")?;
//! let mut buffer = Vec::new();
//! input.read_to_end(&mut buffer)?;
//! assert_eq!(buffer, b"test data");
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};

use crate::error::{Result, StrataError};

pub mod memory;

/// A trait for storage backends that can store and retrieve segment files.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open an existing file for reading.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create a file for writing, truncating any existing file.
    ///
    /// The contents become visible to readers once the output is closed.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files, sorted by name.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Total size of the underlying file.
    fn size(&self) -> Result<u64>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Bytes written so far.
    fn position(&self) -> Result<u64>;

    /// Publish the written bytes and close the output.
    fn close(&mut self) -> Result<()>;
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    FileNotFound(String),

    StorageClosed,

    OutputClosed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::StorageClosed => write!(f, "Storage is closed"),
            StorageError::OutputClosed(name) => write!(f, "Output is closed: {name}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for StrataError {
    fn from(err: StorageError) -> Self {
        StrataError::storage(err.to_string())
    }
}
