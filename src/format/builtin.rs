//! Static registration table for doc-values formats.
//!
//! Formats register themselves at link time with
//! [`register_doc_values_format!`](crate::register_doc_values_format); the
//! table is read once when a factory scans its default source. Plugin crates
//! that depend on this library can submit entries the same way.

use std::sync::Arc;

use crate::codec::DocValuesFormat;
use crate::error::Result;
use crate::format::catalog::{FormatCandidate, FormatSource};
use crate::format::descriptor::SourceOrigin;
use crate::format::factory::{FormatFactory, FormatFactoryBuilder};

/// One entry of the static table.
pub struct DocValuesFormatRegistration {
    /// Full path of the registered type, used to derive the format name.
    pub type_name: fn() -> &'static str,
    /// Default construction path.
    pub construct: fn() -> Arc<dyn DocValuesFormat>,
}

impl DocValuesFormatRegistration {
    pub const fn new(
        type_name: fn() -> &'static str,
        construct: fn() -> Arc<dyn DocValuesFormat>,
    ) -> Self {
        DocValuesFormatRegistration {
            type_name,
            construct,
        }
    }
}

inventory::collect!(DocValuesFormatRegistration);

/// Default construction path for formats implementing `Default`.
pub fn construct_default<F>() -> Arc<dyn DocValuesFormat>
where
    F: DocValuesFormat + Default + 'static,
{
    Arc::new(F::default())
}

/// Register a doc-values format in the static table.
///
/// ```ignore
/// #[derive(Debug, Default)]
/// pub struct Lucene45DocValuesFormat;
/// // impl DocValuesFormat for Lucene45DocValuesFormat { ... }
///
/// // Resolvable as "Lucene45":
/// strata_formats::register_doc_values_format!(Lucene45DocValuesFormat);
///
/// // With an explicit constructor `fn() -> Arc<dyn DocValuesFormat>`:
/// strata_formats::register_doc_values_format!(TunedDocValuesFormat => tuned_format);
/// ```
#[macro_export]
macro_rules! register_doc_values_format {
    ($format:ty) => {
        $crate::inventory::submit! {
            $crate::format::builtin::DocValuesFormatRegistration::new(
                ::std::any::type_name::<$format>,
                $crate::format::builtin::construct_default::<$format>,
            )
        }
    };
    ($format:ty => $construct:path) => {
        $crate::inventory::submit! {
            $crate::format::builtin::DocValuesFormatRegistration::new(
                ::std::any::type_name::<$format>,
                $construct,
            )
        }
    };
}

/// The default source: every entry of the static table.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSource;

impl FormatSource<dyn DocValuesFormat> for BuiltinSource {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Builtin
    }

    /// Link order is unspecified, so entries are listed by full type path.
    ///
    /// Types sharing a simple name in different modules derive the same
    /// format name; the one whose path sorts last wins.
    fn candidates(&self) -> Vec<FormatCandidate<dyn DocValuesFormat>> {
        let mut registrations: Vec<(&'static str, fn() -> Arc<dyn DocValuesFormat>)> =
            inventory::iter::<DocValuesFormatRegistration>
                .into_iter()
                .map(|registration| ((registration.type_name)(), registration.construct))
                .collect();
        registrations.sort_by_key(|(type_name, _)| *type_name);

        registrations
            .into_iter()
            .map(|(type_name, construct)| {
                FormatCandidate::new(type_name, move || -> Result<Arc<dyn DocValuesFormat>> {
                    Ok(construct())
                })
            })
            .collect()
    }
}

/// Factory resolving doc-values formats.
pub type DocValuesFormatFactory = FormatFactory<dyn DocValuesFormat>;

impl FormatFactory<dyn DocValuesFormat> {
    /// Builder with the static table installed as default source.
    pub fn doc_values_builder() -> FormatFactoryBuilder<dyn DocValuesFormat> {
        FormatFactoryBuilder::new().default_source(Arc::new(BuiltinSource))
    }

    /// Factory over the built-in formats only.
    pub fn with_builtins() -> Result<Self> {
        Self::doc_values_builder().build()
    }
}
