//! Candidate discovery across extension sources.
//!
//! Sources replace runtime type scanning: each one hands out the candidates it
//! was populated with (a static registration table, a host plugin list, ...).
//! [`TypeCatalog`] walks them in the caller-supplied order, keeps the
//! candidates accepted by the capability predicate, and names each one with a
//! pure function of its type identity.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::format::descriptor::{Constructor, ImplementationDescriptor, SourceOrigin};

/// Whether a candidate can be instantiated at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Concrete,
    /// A shared base or utility type that is listed but never constructed.
    Abstract,
}

/// An implementation offered by a source, before naming.
pub struct FormatCandidate<C: ?Sized> {
    type_name: String,
    kind: CandidateKind,
    constructor: Option<Constructor<C>>,
}

impl<C: ?Sized> FormatCandidate<C> {
    /// A concrete candidate identified by `type_name`.
    pub fn new<F>(type_name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Result<Arc<C>> + Send + Sync + 'static,
    {
        FormatCandidate {
            type_name: type_name.into(),
            kind: CandidateKind::Concrete,
            constructor: Some(Arc::new(constructor)),
        }
    }

    /// A concrete candidate identified by the Rust type `T`.
    pub fn of<T, F>(constructor: F) -> Self
    where
        T: ?Sized + 'static,
        F: Fn() -> Result<Arc<C>> + Send + Sync + 'static,
    {
        Self::new(std::any::type_name::<T>(), constructor)
    }

    /// A base type that the default predicate filters out.
    pub fn abstract_base(type_name: impl Into<String>) -> Self {
        FormatCandidate {
            type_name: type_name.into(),
            kind: CandidateKind::Abstract,
            constructor: None,
        }
    }

    /// A concrete candidate with no reachable construction path.
    pub fn without_constructor(type_name: impl Into<String>) -> Self {
        FormatCandidate {
            type_name: type_name.into(),
            kind: CandidateKind::Concrete,
            constructor: None,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> CandidateKind {
        self.kind
    }

    pub fn is_concrete(&self) -> bool {
        self.kind == CandidateKind::Concrete
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    pub(crate) fn into_descriptor(
        self,
        name: String,
        origin: SourceOrigin,
    ) -> ImplementationDescriptor<C> {
        ImplementationDescriptor::new(name, self.type_name, self.constructor, origin)
    }
}

impl<C: ?Sized> Clone for FormatCandidate<C> {
    fn clone(&self) -> Self {
        FormatCandidate {
            type_name: self.type_name.clone(),
            kind: self.kind,
            constructor: self.constructor.clone(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for FormatCandidate<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatCandidate")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("has_constructor", &self.has_constructor())
            .finish()
    }
}

/// An extension source: something that can list format candidates.
pub trait FormatSource<C: ?Sized>: Send + Sync {
    /// Recorded on every descriptor this source produces.
    fn origin(&self) -> SourceOrigin;

    /// Candidates in the order they should be ingested.
    fn candidates(&self) -> Vec<FormatCandidate<C>>;
}

/// A source backed by an explicit list, typically built by a host during setup.
pub struct StaticSource<C: ?Sized> {
    name: String,
    candidates: Vec<FormatCandidate<C>>,
}

impl<C: ?Sized> StaticSource<C> {
    pub fn new(name: impl Into<String>) -> Self {
        StaticSource {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    /// Append a candidate, builder style.
    pub fn with(mut self, candidate: FormatCandidate<C>) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn push(&mut self, candidate: FormatCandidate<C>) {
        self.candidates.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

impl<C: ?Sized> FormatSource<C> for StaticSource<C> {
    fn origin(&self) -> SourceOrigin {
        SourceOrigin::Source(self.name.clone())
    }

    fn candidates(&self) -> Vec<FormatCandidate<C>> {
        self.candidates.clone()
    }
}

/// Decides which candidates satisfy the format capability contract.
pub type CapabilityPredicate<C> = Arc<dyn Fn(&FormatCandidate<C>) -> bool + Send + Sync>;

/// Default predicate: every concrete candidate.
pub fn concrete_only<C: ?Sized>() -> CapabilityPredicate<C> {
    Arc::new(|candidate: &FormatCandidate<C>| candidate.is_concrete())
}

/// Maps an implementation identity to its symbolic format name.
///
/// Must be pure: the same identity always yields the same name.
pub trait NameDeriver: Send + Sync {
    fn derive(&self, type_name: &str) -> String;
}

impl<F> NameDeriver for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn derive(&self, type_name: &str) -> String {
        self(type_name)
    }
}

/// Strips the module path, generic arguments and a shared suffix:
/// `crate::codec::PlainDocValuesFormat` → `Plain`.
///
/// A type named exactly like the suffix keeps its full simple name.
#[derive(Debug, Clone)]
pub struct SuffixNameDeriver {
    suffix: String,
}

impl SuffixNameDeriver {
    pub fn new(suffix: impl Into<String>) -> Self {
        SuffixNameDeriver {
            suffix: suffix.into(),
        }
    }
}

impl NameDeriver for SuffixNameDeriver {
    fn derive(&self, type_name: &str) -> String {
        let without_generics = type_name.split('<').next().unwrap_or(type_name);
        let simple = without_generics
            .rsplit("::")
            .next()
            .unwrap_or(without_generics)
            .trim();

        match simple.strip_suffix(self.suffix.as_str()) {
            Some(stem) if !stem.is_empty() && !self.suffix.is_empty() => stem.to_string(),
            _ => simple.to_string(),
        }
    }
}

/// Enumerates and names candidates from an ordered list of sources.
pub struct TypeCatalog<C: ?Sized> {
    predicate: CapabilityPredicate<C>,
    deriver: Arc<dyn NameDeriver>,
}

impl<C: ?Sized> TypeCatalog<C> {
    pub fn new(predicate: CapabilityPredicate<C>, deriver: Arc<dyn NameDeriver>) -> Self {
        TypeCatalog { predicate, deriver }
    }

    pub fn accepts(&self, candidate: &FormatCandidate<C>) -> bool {
        (self.predicate)(candidate)
    }

    pub fn derive_name(&self, type_name: &str) -> String {
        self.deriver.derive(type_name)
    }

    /// Walk `sources` in order and return named descriptors in discovery order.
    ///
    /// Absent sources are skipped. Duplicate names are kept here; the
    /// resolver decides which one wins.
    pub fn discover(
        &self,
        sources: &[Option<Arc<dyn FormatSource<C>>>],
    ) -> Vec<ImplementationDescriptor<C>> {
        let mut discovered = Vec::new();

        for (position, source) in sources.iter().enumerate() {
            let Some(source) = source else {
                debug!(position, "skipping absent format source");
                continue;
            };

            let origin = source.origin();
            for candidate in source.candidates() {
                if !self.accepts(&candidate) {
                    debug!(
                        type_name = candidate.type_name(),
                        %origin,
                        "candidate rejected by capability predicate"
                    );
                    continue;
                }

                let name = self.derive_name(candidate.type_name());
                if name.is_empty() {
                    warn!(
                        type_name = candidate.type_name(),
                        %origin,
                        "derived an empty format name, skipping candidate"
                    );
                    continue;
                }

                discovered.push(candidate.into_descriptor(name, origin.clone()));
            }
        }

        discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &'static str) -> impl Fn() -> Result<Arc<str>> + Send + Sync + 'static {
        move || Ok(Arc::from(value))
    }

    fn catalog() -> TypeCatalog<str> {
        TypeCatalog::new(
            concrete_only(),
            Arc::new(SuffixNameDeriver::new("DocValuesFormat")),
        )
    }

    #[test]
    fn test_suffix_name_deriver() {
        let deriver = SuffixNameDeriver::new("DocValuesFormat");

        assert_eq!(deriver.derive("Lucene45DocValuesFormat"), "Lucene45");
        assert_eq!(
            deriver.derive("strata_formats::codec::plain::PlainDocValuesFormat"),
            "Plain"
        );
        assert_eq!(deriver.derive("my_plugin::Wrapped<u8>"), "Wrapped");
        assert_eq!(deriver.derive("DocValuesFormat"), "DocValuesFormat");
        assert_eq!(deriver.derive("Custom1"), "Custom1");
    }

    #[test]
    fn test_closure_name_deriver() {
        let deriver = |type_name: &str| type_name.to_lowercase();
        assert_eq!(NameDeriver::derive(&deriver, "Plain"), "plain");
    }

    #[test]
    fn test_discover_in_source_order() {
        let first: Arc<dyn FormatSource<str>> = Arc::new(
            StaticSource::new("first")
                .with(FormatCandidate::new("ADocValuesFormat", text("a")))
                .with(FormatCandidate::new("BDocValuesFormat", text("b"))),
        );
        let second: Arc<dyn FormatSource<str>> = Arc::new(
            StaticSource::new("second")
                .with(FormatCandidate::new("ADocValuesFormat", text("a2"))),
        );

        let discovered = catalog().discover(&[Some(first), None, Some(second)]);
        let names: Vec<(&str, &SourceOrigin)> = discovered
            .iter()
            .map(|d| (d.name(), d.origin()))
            .collect();

        assert_eq!(
            names,
            vec![
                ("A", &SourceOrigin::Source("first".to_string())),
                ("B", &SourceOrigin::Source("first".to_string())),
                ("A", &SourceOrigin::Source("second".to_string())),
            ]
        );
    }

    #[test]
    fn test_predicate_filters_abstract_bases() {
        let source: Arc<dyn FormatSource<str>> = Arc::new(
            StaticSource::new("mixed")
                .with(FormatCandidate::abstract_base("BaseDocValuesFormat"))
                .with(FormatCandidate::without_constructor("GhostDocValuesFormat"))
                .with(FormatCandidate::new("RealDocValuesFormat", text("real"))),
        );

        let discovered = catalog().discover(&[Some(source)]);
        let names: Vec<&str> = discovered.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["Ghost", "Real"]);
    }

    #[test]
    fn test_custom_predicate() {
        let catalog: TypeCatalog<str> = TypeCatalog::new(
            Arc::new(|c: &FormatCandidate<str>| c.has_constructor()),
            Arc::new(|type_name: &str| type_name.to_string()),
        );
        let source: Arc<dyn FormatSource<str>> = Arc::new(
            StaticSource::new("s")
                .with(FormatCandidate::without_constructor("Ghost"))
                .with(FormatCandidate::of::<u32, _>(text("u32"))),
        );

        let discovered = catalog.discover(&[Some(source)]);
        assert_eq!(discovered.len(), 1);
        assert_eq!(discovered[0].name(), "u32");
    }

    #[test]
    fn test_empty_names_are_skipped() {
        let catalog: TypeCatalog<str> =
            TypeCatalog::new(concrete_only(), Arc::new(|_: &str| String::new()));
        let source = StaticSource::new("s").with(FormatCandidate::new("X", text("x")));
        let source: Arc<dyn FormatSource<str>> = Arc::new(source);

        assert!(catalog.discover(&[Some(source)]).is_empty());
    }
}
