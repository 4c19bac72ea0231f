//! Name → descriptor mapping with last-source-wins override.

use std::collections::BTreeSet;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, StrataError};
use crate::format::descriptor::{DescriptorId, SourceOrigin};

/// What to report when a later registration replaces an earlier one.
///
/// The later registration wins under every policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Informational log entry.
    #[default]
    Override,
    /// Warning log entry, for deployments that expect no overrides.
    Warn,
}

#[derive(Debug, Clone)]
struct NameEntry {
    id: DescriptorId,
    origin: SourceOrigin,
}

/// Owns the name map of one factory.
#[derive(Debug, Default)]
pub struct NameResolver {
    names: AHashMap<String, NameEntry>,
    policy: CollisionPolicy,
    overrides: usize,
}

impl NameResolver {
    pub fn new(policy: CollisionPolicy) -> Self {
        NameResolver {
            names: AHashMap::new(),
            policy,
            overrides: 0,
        }
    }

    /// Insert one mapping and return the descriptor it replaced, if any.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        id: DescriptorId,
        origin: SourceOrigin,
    ) -> Option<DescriptorId> {
        let name = name.into();
        let entry = NameEntry {
            id,
            origin: origin.clone(),
        };

        let previous = self.names.insert(name.clone(), entry)?;
        self.overrides += 1;
        match self.policy {
            CollisionPolicy::Override => info!(
                format_name = %name,
                previous = %previous.origin,
                replacement = %origin,
                "format name overridden by later source"
            ),
            CollisionPolicy::Warn => warn!(
                format_name = %name,
                previous = %previous.origin,
                replacement = %origin,
                "format name overridden by later source"
            ),
        }
        Some(previous.id)
    }

    /// Ingest mappings in order; later entries replace earlier equal names.
    pub fn ingest<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, DescriptorId, SourceOrigin)>,
    {
        for (name, id, origin) in entries {
            debug!(format_name = %name, descriptor = %id, %origin, "registering format name");
            self.insert(name, id, origin);
        }
    }

    /// Look up a name, failing with `NotFound` if nothing is registered.
    pub fn resolve(&self, name: &str) -> Result<DescriptorId> {
        self.names
            .get(name)
            .map(|entry| entry.id)
            .ok_or_else(|| StrataError::not_found(name))
    }

    /// Source that registered the winning descriptor for `name`.
    pub fn origin_of(&self, name: &str) -> Result<&SourceOrigin> {
        self.names
            .get(name)
            .map(|entry| &entry.origin)
            .ok_or_else(|| StrataError::not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Every registered name.
    pub fn list_names(&self) -> BTreeSet<String> {
        self.names.keys().cloned().collect()
    }

    /// Winning descriptor handles, in no particular order.
    pub fn descriptor_ids(&self) -> impl Iterator<Item = DescriptorId> + '_ {
        self.names.values().map(|entry| entry.id)
    }

    /// How many registrations replaced an earlier one.
    pub fn override_count(&self) -> usize {
        self.overrides
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
