//! Format registry: resolves symbolic format names persisted in segment
//! metadata to the implementation that wrote them.
//!
//! # Architecture
//!
//! - **TypeCatalog** ([`catalog`]): walks extension sources in order and keeps
//!   the candidates accepted by the capability predicate, naming each one
//!   from its type identity.
//! - **NameResolver** ([`resolver`]): name → descriptor map, last source wins.
//! - **InstanceCache** ([`cache`]): descriptor arena with one lazily built
//!   singleton per descriptor.
//! - **FormatFactory** ([`factory`]): composition root and public entry point.
//!
//! A [`FormatFactoryBuilder`] is the not-yet-scanned factory; `build()` scans
//! every source exactly once and yields a ready [`FormatFactory`] that is
//! only read from then on.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use strata_formats::codec::{DocValuesFormat, VarIntDocValuesFormat};
//! use strata_formats::format::{DocValuesFormatFactory, FormatCandidate, StaticSource};
//!
//! # fn main() -> strata_formats::error::Result<()> {
//! // A host source that maps "Plain" to another implementation.
//! let host = StaticSource::new("host").with(FormatCandidate::new(
//!     "PlainDocValuesFormat",
//!     || -> strata_formats::error::Result<Arc<dyn DocValuesFormat>> {
//!         Ok(Arc::new(VarIntDocValuesFormat))
//!     },
//! ));
//!
//! let factory = DocValuesFormatFactory::doc_values_builder()
//!     .source(Arc::new(host))
//!     .build()?;
//!
//! assert!(factory.available_names().contains("Bincode"));
//! assert_eq!(factory.resolve_by_name("Plain")?.name(), "VarInt");
//! assert!(factory.resolve_by_name("doesNotExist").is_err());
//! # Ok(())
//! # }
//! ```

pub mod builtin;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod descriptor;
pub mod factory;
pub mod resolver;

pub use builtin::{BuiltinSource, DocValuesFormatFactory, DocValuesFormatRegistration};
pub use cache::InstanceCache;
pub use catalog::{
    CandidateKind, CapabilityPredicate, FormatCandidate, FormatSource, NameDeriver, StaticSource,
    SuffixNameDeriver, TypeCatalog, concrete_only,
};
pub use config::FormatFactoryConfig;
pub use descriptor::{Constructor, DescriptorId, ImplementationDescriptor, SourceOrigin};
pub use factory::{FormatFactory, FormatFactoryBuilder};
pub use resolver::{CollisionPolicy, NameResolver};
