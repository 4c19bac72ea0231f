//! Descriptor arena with one lazily built singleton per slot.
//!
//! Each slot owns its own `OnceCell`, so first-time construction is
//! serialized per descriptor while resolutions of other descriptors proceed
//! untouched. A failed construction leaves the cell empty; a later call
//! retries from scratch.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::error::{Result, StrataError};
use crate::format::descriptor::{DescriptorId, ImplementationDescriptor};

struct Slot<C: ?Sized> {
    descriptor: ImplementationDescriptor<C>,
    instance: OnceCell<Arc<C>>,
}

/// Arena of descriptors and their memoized instances.
pub struct InstanceCache<C: ?Sized> {
    slots: Vec<Slot<C>>,
    constructions: AtomicUsize,
}

impl<C: ?Sized + Send + Sync> InstanceCache<C> {
    pub fn new() -> Self {
        InstanceCache {
            slots: Vec::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Add a descriptor; its instance is built on first request.
    pub fn push(&mut self, descriptor: ImplementationDescriptor<C>) -> DescriptorId {
        let id = DescriptorId::new(self.slots.len());
        self.slots.push(Slot {
            descriptor,
            instance: OnceCell::new(),
        });
        id
    }

    /// Add a descriptor together with an instance built elsewhere.
    pub fn preload(
        &mut self,
        descriptor: ImplementationDescriptor<C>,
        instance: Arc<C>,
    ) -> DescriptorId {
        let id = DescriptorId::new(self.slots.len());
        self.slots.push(Slot {
            descriptor,
            instance: OnceCell::with_value(instance),
        });
        id
    }

    pub fn descriptor(&self, id: DescriptorId) -> Option<&ImplementationDescriptor<C>> {
        self.slots.get(id.index()).map(|slot| &slot.descriptor)
    }

    /// Return the instance for `id`, building it on first use.
    ///
    /// Concurrent first calls for the same descriptor block on each other and
    /// all observe the single instance that was built.
    pub fn get_or_create(&self, id: DescriptorId) -> Result<Arc<C>> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(StrataError::UnknownDescriptor(id.index()))?;

        let instance = slot.instance.get_or_try_init(|| {
            let descriptor = &slot.descriptor;
            debug!(
                format_name = descriptor.name(),
                type_name = descriptor.type_name(),
                "constructing format instance"
            );
            let instance = descriptor.construct().inspect_err(|e| {
                warn!(format_name = descriptor.name(), error = %e, "format construction failed");
            })?;
            self.constructions.fetch_add(1, Ordering::Relaxed);
            Ok::<_, StrataError>(instance)
        })?;

        Ok(Arc::clone(instance))
    }

    /// Whether the slot already holds an instance.
    pub fn is_constructed(&self, id: DescriptorId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.instance.get().is_some())
    }

    /// Instances built by this cache (preloaded ones are not counted).
    pub fn constructions(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<C: ?Sized + Send + Sync> Default for InstanceCache<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> fmt::Debug for InstanceCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceCache")
            .field("slots", &self.slots.len())
            .field("constructions", &self.constructions.load(Ordering::Relaxed))
            .finish()
    }
}
