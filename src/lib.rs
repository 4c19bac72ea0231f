//! # Strata Formats
//!
//! The format registry of a full-text search index's storage layer.
//!
//! Every segment records, per field, the symbolic name of the format its bytes
//! were written with. This crate maps those names back to the exact
//! implementation that can decode them, years and library revisions later.
//!
//! ## Features
//!
//! - Static registration table for built-in formats (`inventory`)
//! - Host-supplied extension sources with last-source-wins override
//! - One lazily built, shared instance per registered format
//! - Built-in doc-values formats: `Plain`, `VarInt`, `Bincode`
//! - Segment doc-values files that record the format name per field

pub mod codec;
pub mod doc_values;
pub mod error;
pub mod format;
pub mod storage;

#[doc(hidden)]
pub use inventory;

pub mod prelude {
    pub use crate::codec::{DocValue, DocValuesFormat, FieldDocValues};
    pub use crate::doc_values::{DocValuesReader, DocValuesWriter};
    pub use crate::error::{Result, StrataError};
    pub use crate::format::{
        DocValuesFormatFactory, FormatCandidate, FormatFactory, FormatFactoryConfig, FormatSource,
        StaticSource,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
