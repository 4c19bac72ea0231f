//! Descriptors: the registry's handle on one discoverable implementation.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StrataError};

/// Construction path of a format implementation.
pub type Constructor<C> = Arc<dyn Fn() -> Result<Arc<C>> + Send + Sync>;

/// Index of a descriptor in its factory's arena.
///
/// Handles are only meaningful for the factory that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(usize);

impl DescriptorId {
    pub(crate) fn new(index: usize) -> Self {
        DescriptorId(index)
    }

    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which extension source produced a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceOrigin {
    /// The library's static registration table.
    Builtin,
    /// A named extension source supplied by the host.
    Source(String),
    /// Registered by hand after the factory was built.
    Manual,
}

impl fmt::Display for SourceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceOrigin::Builtin => write!(f, "builtin"),
            SourceOrigin::Source(name) => write!(f, "source '{name}'"),
            SourceOrigin::Manual => write!(f, "manual"),
        }
    }
}

/// One discoverable format implementation.
///
/// The name is the registry key; `type_name` is the identity the name was
/// derived from.
pub struct ImplementationDescriptor<C: ?Sized> {
    name: String,
    type_name: String,
    constructor: Option<Constructor<C>>,
    origin: SourceOrigin,
}

impl<C: ?Sized> ImplementationDescriptor<C> {
    pub fn new(
        name: impl Into<String>,
        type_name: impl Into<String>,
        constructor: Option<Constructor<C>>,
        origin: SourceOrigin,
    ) -> Self {
        ImplementationDescriptor {
            name: name.into(),
            type_name: type_name.into(),
            constructor,
            origin,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn origin(&self) -> &SourceOrigin {
        &self.origin
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Run the construction path. Every failure comes back as `Construction`.
    pub fn construct(&self) -> Result<Arc<C>> {
        let constructor = self.constructor.as_ref().ok_or_else(|| {
            StrataError::construction(
                &self.name,
                format!("no default constructor is reachable for {}", self.type_name),
            )
        })?;

        constructor().map_err(|e| match e {
            StrataError::Construction { .. } => e,
            other => StrataError::construction(&self.name, other.to_string()),
        })
    }
}

impl<C: ?Sized> Clone for ImplementationDescriptor<C> {
    fn clone(&self) -> Self {
        ImplementationDescriptor {
            name: self.name.clone(),
            type_name: self.type_name.clone(),
            constructor: self.constructor.clone(),
            origin: self.origin.clone(),
        }
    }
}

impl<C: ?Sized> fmt::Debug for ImplementationDescriptor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationDescriptor")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("has_constructor", &self.has_constructor())
            .field("origin", &self.origin)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_without_constructor() {
        let descriptor: ImplementationDescriptor<str> =
            ImplementationDescriptor::new("Ghost", "GhostFormat", None, SourceOrigin::Builtin);

        let err = descriptor.construct().unwrap_err();
        assert!(err.is_construction());
        assert!(err.to_string().contains("GhostFormat"));
    }

    #[test]
    fn test_constructor_failure_is_wrapped() {
        let constructor: Constructor<str> =
            Arc::new(|| -> Result<Arc<str>> { Err(StrataError::other("boom")) });
        let descriptor = ImplementationDescriptor::new(
            "Broken",
            "BrokenFormat",
            Some(constructor),
            SourceOrigin::Source("host".to_string()),
        );

        match descriptor.construct() {
            Err(StrataError::Construction { name, reason }) => {
                assert_eq!(name, "Broken");
                assert!(reason.contains("boom"));
            }
            other => panic!("expected construction error, got {other:?}"),
        }
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(SourceOrigin::Builtin.to_string(), "builtin");
        assert_eq!(
            SourceOrigin::Source("plugins".to_string()).to_string(),
            "source 'plugins'"
        );
        assert_eq!(DescriptorId::new(3).to_string(), "#3");
    }
}
