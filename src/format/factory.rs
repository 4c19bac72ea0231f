//! The format factory: composition root of catalog, resolver and cache.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, StrataError};
use crate::format::cache::InstanceCache;
use crate::format::catalog::{
    CapabilityPredicate, FormatCandidate, FormatSource, NameDeriver, SuffixNameDeriver,
    TypeCatalog, concrete_only,
};
use crate::format::config::FormatFactoryConfig;
use crate::format::descriptor::{
    Constructor, DescriptorId, ImplementationDescriptor, SourceOrigin,
};
use crate::format::resolver::NameResolver;

/// Collects sources and customization hooks before the one-time scan.
///
/// The default source (the library's built-in formats, when it has any) is
/// scanned first, then every host source in the order it was added, so a
/// host overrides a built-in format by registering the same name.
pub struct FormatFactoryBuilder<C: ?Sized> {
    config: FormatFactoryConfig,
    default_source: Option<Arc<dyn FormatSource<C>>>,
    sources: Vec<Option<Arc<dyn FormatSource<C>>>>,
    predicate: CapabilityPredicate<C>,
    deriver: Option<Arc<dyn NameDeriver>>,
}

impl<C: ?Sized + Send + Sync + 'static> FormatFactoryBuilder<C> {
    pub fn new() -> Self {
        FormatFactoryBuilder {
            config: FormatFactoryConfig::default(),
            default_source: None,
            sources: Vec::new(),
            predicate: concrete_only(),
            deriver: None,
        }
    }

    pub fn config(mut self, config: FormatFactoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Source scanned before all others when `include_builtins` is set.
    pub fn default_source(mut self, source: Arc<dyn FormatSource<C>>) -> Self {
        self.default_source = Some(source);
        self
    }

    /// Append an extension source.
    pub fn source(mut self, source: Arc<dyn FormatSource<C>>) -> Self {
        self.sources.push(Some(source));
        self
    }

    /// Append a source that may be absent; absent sources are skipped.
    pub fn optional_source(mut self, source: Option<Arc<dyn FormatSource<C>>>) -> Self {
        self.sources.push(source);
        self
    }

    /// Replace the capability predicate.
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&FormatCandidate<C>) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Replace the name derivation (defaults to stripping `config.name_suffix`).
    pub fn name_deriver<D: NameDeriver + 'static>(mut self, deriver: D) -> Self {
        self.deriver = Some(Arc::new(deriver));
        self
    }

    /// Scan every source once and return a ready factory.
    pub fn build(self) -> Result<FormatFactory<C>> {
        let FormatFactoryBuilder {
            config,
            default_source,
            sources,
            predicate,
            deriver,
        } = self;
        config.validate()?;

        let deriver = deriver.unwrap_or_else(|| -> Arc<dyn NameDeriver> {
            Arc::new(SuffixNameDeriver::new(config.name_suffix.clone()))
        });
        let catalog = TypeCatalog::new(predicate, deriver);

        let mut scan = Vec::with_capacity(sources.len() + 1);
        if config.include_builtins {
            scan.push(default_source);
        }
        scan.extend(sources);
        debug!(sources = scan.len(), "scanning format sources");

        let mut cache = InstanceCache::new();
        let entries: Vec<(String, DescriptorId, SourceOrigin)> = catalog
            .discover(&scan)
            .into_iter()
            .map(|descriptor| {
                let name = descriptor.name().to_string();
                let origin = descriptor.origin().clone();
                (name, cache.push(descriptor), origin)
            })
            .collect();

        let mut resolver = NameResolver::new(config.collision_policy);
        resolver.ingest(entries);

        let factory = FormatFactory {
            catalog,
            resolver,
            cache,
            config,
        };
        if factory.config.eager {
            factory.construct_all()?;
        }

        debug!(
            formats = factory.resolver.len(),
            descriptors = factory.cache.len(),
            overrides = factory.resolver.override_count(),
            "format factory ready"
        );
        Ok(factory)
    }
}

impl<C: ?Sized + Send + Sync + 'static> Default for FormatFactoryBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves persisted format names to shared format instances.
///
/// A factory is built once through [`FormatFactoryBuilder`] and then only read,
/// so it can be shared (`Arc<FormatFactory<_>>`) by every segment reader and
/// writer. Manual registration needs `&mut self` and therefore has to happen
/// before the factory is shared.
pub struct FormatFactory<C: ?Sized> {
    catalog: TypeCatalog<C>,
    resolver: NameResolver,
    cache: InstanceCache<C>,
    config: FormatFactoryConfig,
}

impl<C: ?Sized + Send + Sync + 'static> FormatFactory<C> {
    pub fn builder() -> FormatFactoryBuilder<C> {
        FormatFactoryBuilder::new()
    }

    /// Resolve a persisted format name to its singleton instance.
    pub fn resolve_by_name(&self, name: &str) -> Result<Arc<C>> {
        let id = self.resolver.resolve(name)?;
        self.cache.get_or_create(id)
    }

    /// Resolve a descriptor handle directly, skipping the name lookup.
    pub fn resolve_by_descriptor(&self, id: DescriptorId) -> Result<Arc<C>> {
        self.cache.get_or_create(id)
    }

    /// Handle of the descriptor currently registered under `name`.
    pub fn descriptor_id(&self, name: &str) -> Result<DescriptorId> {
        self.resolver.resolve(name)
    }

    pub fn descriptor(&self, id: DescriptorId) -> Option<&ImplementationDescriptor<C>> {
        self.cache.descriptor(id)
    }

    /// Every resolvable format name.
    pub fn available_names(&self) -> BTreeSet<String> {
        self.resolver.list_names()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolver.contains(name)
    }

    /// Source that provided the format currently registered under `name`.
    pub fn origin_of(&self, name: &str) -> Result<&SourceOrigin> {
        self.resolver.origin_of(name)
    }

    /// Register a candidate that no source lists, naming it like a scanned one.
    pub fn register_candidate(&mut self, candidate: FormatCandidate<C>) -> Result<DescriptorId> {
        if !self.catalog.accepts(&candidate) {
            return Err(StrataError::other(format!(
                "{} does not satisfy the format capability",
                candidate.type_name()
            )));
        }

        let name = self.catalog.derive_name(candidate.type_name());
        if name.is_empty() {
            return Err(StrataError::other(format!(
                "derived an empty format name for {}",
                candidate.type_name()
            )));
        }
        let descriptor = candidate.into_descriptor(name, SourceOrigin::Manual);
        Ok(self.insert(descriptor, None))
    }

    /// Register a runtime-built format under an explicit name.
    pub fn register_descriptor<F>(
        &mut self,
        name: impl Into<String>,
        constructor: F,
    ) -> DescriptorId
    where
        F: Fn() -> Result<Arc<C>> + Send + Sync + 'static,
    {
        let name = name.into();
        let constructor: Constructor<C> = Arc::new(constructor);
        let descriptor = ImplementationDescriptor::new(
            name.clone(),
            name,
            Some(constructor),
            SourceOrigin::Manual,
        );
        self.insert(descriptor, None)
    }

    /// Register an already constructed instance under `name`.
    pub fn register_instance(&mut self, name: impl Into<String>, instance: Arc<C>) -> DescriptorId {
        let name = name.into();
        let descriptor =
            ImplementationDescriptor::new(name.clone(), name, None, SourceOrigin::Manual);
        self.insert(descriptor, Some(instance))
    }

    fn insert(
        &mut self,
        descriptor: ImplementationDescriptor<C>,
        instance: Option<Arc<C>>,
    ) -> DescriptorId {
        let name = descriptor.name().to_string();
        let id = match instance {
            Some(instance) => self.cache.preload(descriptor, instance),
            None => self.cache.push(descriptor),
        };
        debug!(format_name = %name, descriptor = %id, "manually registered format");
        self.resolver.insert(name, id, SourceOrigin::Manual);
        id
    }

    /// Build every format that is currently reachable by name.
    pub fn construct_all(&self) -> Result<()> {
        let mut ids: Vec<DescriptorId> = self.resolver.descriptor_ids().collect();
        ids.sort();
        for id in ids {
            self.cache.get_or_create(id)?;
        }
        Ok(())
    }

    /// Whether the format registered under `name` has been built.
    pub fn is_constructed(&self, name: &str) -> bool {
        self.resolver
            .resolve(name)
            .is_ok_and(|id| self.cache.is_constructed(id))
    }

    /// Instances built so far by this factory.
    pub fn constructions(&self) -> usize {
        self.cache.constructions()
    }

    pub fn config(&self) -> &FormatFactoryConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.resolver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolver.is_empty()
    }
}

impl<C: ?Sized> fmt::Debug for FormatFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatFactory")
            .field("names", &self.resolver)
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::format::catalog::StaticSource;

    fn text(value: &'static str) -> impl Fn() -> Result<Arc<str>> + Send + Sync + 'static {
        move || Ok(Arc::from(value))
    }

    fn source(name: &str, formats: &[(&str, &'static str)]) -> Arc<dyn FormatSource<str>> {
        let mut source = StaticSource::new(name);
        for (type_name, value) in formats {
            source.push(FormatCandidate::new(*type_name, text(*value)));
        }
        Arc::new(source)
    }

    #[test]
    fn test_last_source_wins() {
        let factory = FormatFactory::<str>::builder()
            .default_source(source("builtins", &[("Lucene45DocValuesFormat", "A")]))
            .source(source(
                "host",
                &[
                    ("Lucene45DocValuesFormat", "B"),
                    ("Custom1DocValuesFormat", "C"),
                ],
            ))
            .build()
            .unwrap();

        let names: Vec<String> = factory.available_names().into_iter().collect();
        assert_eq!(names, vec!["Custom1", "Lucene45"]);
        assert_eq!(&*factory.resolve_by_name("Lucene45").unwrap(), "B");
        assert_eq!(&*factory.resolve_by_name("Custom1").unwrap(), "C");
        assert_eq!(
            factory.origin_of("Lucene45").unwrap(),
            &SourceOrigin::Source("host".to_string())
        );
    }

    #[test]
    fn test_default_source_skipped_without_builtins() {
        let config = FormatFactoryConfig {
            include_builtins: false,
            ..FormatFactoryConfig::default()
        };
        let factory = FormatFactory::<str>::builder()
            .config(config)
            .default_source(source("builtins", &[("PlainDocValuesFormat", "plain")]))
            .optional_source(None)
            .build()
            .unwrap();

        assert!(factory.is_empty());
        assert!(factory.resolve_by_name("Plain").unwrap_err().is_not_found());
    }

    #[test]
    fn test_resolve_by_descriptor_shares_instance() {
        let factory = FormatFactory::<str>::builder()
            .source(source("s", &[("XDocValuesFormat", "x")]))
            .build()
            .unwrap();

        let id = factory.descriptor_id("X").unwrap();
        assert_eq!(
            factory.descriptor(id).unwrap().type_name(),
            "XDocValuesFormat"
        );

        let by_name = factory.resolve_by_name("X").unwrap();
        let by_id = factory.resolve_by_descriptor(id).unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_id));
        assert_eq!(factory.constructions(), 1);
    }

    #[test]
    fn test_lazy_until_resolved() {
        let factory = FormatFactory::<str>::builder()
            .source(source("s", &[("XDocValuesFormat", "x")]))
            .build()
            .unwrap();

        assert!(!factory.is_constructed("X"));
        factory.resolve_by_name("X").unwrap();
        assert!(factory.is_constructed("X"));
    }

    #[test]
    fn test_eager_construction_fails_build() {
        let config = FormatFactoryConfig {
            eager: true,
            ..FormatFactoryConfig::default()
        };
        let broken: Arc<dyn FormatSource<str>> = Arc::new(
            StaticSource::new("s")
                .with(FormatCandidate::without_constructor("GhostDocValuesFormat")),
        );

        let err = FormatFactory::<str>::builder()
            .config(config)
            .source(broken)
            .build()
            .unwrap_err();
        assert!(err.is_construction());
    }

    #[test]
    fn test_eager_construction_builds_everything() {
        let config = FormatFactoryConfig {
            eager: true,
            ..FormatFactoryConfig::default()
        };
        let factory = FormatFactory::<str>::builder()
            .config(config)
            .source(source(
                "s",
                &[("ADocValuesFormat", "a"), ("BDocValuesFormat", "b")],
            ))
            .build()
            .unwrap();

        assert_eq!(factory.constructions(), 2);
        assert!(factory.is_constructed("A"));
        assert!(factory.is_constructed("B"));
    }

    #[test]
    fn test_manual_registration() {
        let mut factory = FormatFactory::<str>::builder().build().unwrap();

        let instance: Arc<str> = Arc::from("runtime");
        factory.register_instance("Generated", instance.clone());
        assert!(Arc::ptr_eq(
            &factory.resolve_by_name("Generated").unwrap(),
            &instance
        ));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        factory.register_descriptor("Lazy", move || -> Result<Arc<str>> {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::from("lazy"))
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(&*factory.resolve_by_name("Lazy").unwrap(), "lazy");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(factory.origin_of("Lazy").unwrap(), &SourceOrigin::Manual);
    }

    #[test]
    fn test_register_candidate_applies_hooks() {
        let mut factory = FormatFactory::<str>::builder().build().unwrap();

        let id = factory
            .register_candidate(FormatCandidate::new("RuntimeDocValuesFormat", text("rt")))
            .unwrap();
        assert_eq!(factory.descriptor_id("Runtime").unwrap(), id);

        let err = factory
            .register_candidate(FormatCandidate::abstract_base("BaseDocValuesFormat"))
            .unwrap_err();
        assert!(err.to_string().contains("capability"));
    }

    #[test]
    fn test_manual_registration_overrides_scanned() {
        let mut factory = FormatFactory::<str>::builder()
            .source(source("s", &[("XDocValuesFormat", "scanned")]))
            .build()
            .unwrap();
        let old = factory.descriptor_id("X").unwrap();

        factory.register_instance("X", Arc::from("manual"));
        assert_eq!(&*factory.resolve_by_name("X").unwrap(), "manual");

        // The replaced descriptor stays reachable through its handle.
        assert_eq!(&*factory.resolve_by_descriptor(old).unwrap(), "scanned");
    }

    #[test]
    fn test_custom_name_deriver() {
        let factory = FormatFactory::<str>::builder()
            .name_deriver(|type_name: &str| type_name.to_uppercase())
            .source(source("s", &[("mixed", "m")]))
            .build()
            .unwrap();

        assert!(factory.contains("MIXED"));
    }

    #[test]
    fn test_custom_predicate() {
        let factory = FormatFactory::<str>::builder()
            .predicate(|c: &FormatCandidate<str>| c.type_name().starts_with("Keep"))
            .source(source(
                "s",
                &[("KeepDocValuesFormat", "k"), ("DropDocValuesFormat", "d")],
            ))
            .build()
            .unwrap();

        let names: Vec<String> = factory.available_names().into_iter().collect();
        assert_eq!(names, vec!["Keep"]);
    }
}
