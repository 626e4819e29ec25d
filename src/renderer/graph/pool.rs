//! Persistent Resource Pool
//!
//! Each effect instance on each view owns one `ResourcePool`. Resources are
//! keyed by name; the description is part of the identity, so a resize or
//! format change destroys the old resource and allocates a new one, whose
//! contents must be treated as undefined ([`Acquired::fresh`]).
//!
//! Pools are never shared: history and exposure textures of two views (or
//! two instances of the same effect) can't alias.

use rustc_hash::FxHashMap;

use crate::errors::Result;

use super::resource::{ResourceDesc, ResourceHandle};

/// Allocation interface of a GPU backend.
pub trait ResourceAllocator {
    /// Allocates a resource. `label` is for debugging only.
    fn create_resource(&mut self, label: &str, desc: &ResourceDesc) -> Result<ResourceHandle>;

    /// Destroys a resource. Unknown handles are ignored.
    fn destroy_resource(&mut self, handle: ResourceHandle);
}

/// Result of [`ResourcePool::acquire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acquired {
    pub handle: ResourceHandle,
    /// `true` when the resource was (re)allocated by this call, or its
    /// contents were invalidated, and holds no data from earlier frames.
    pub fresh: bool,
}

#[derive(Debug, Clone, Copy)]
struct PoolEntry {
    handle: ResourceHandle,
    desc: ResourceDesc,
    /// Contents undefined; reported as fresh on the next acquire.
    stale: bool,
}

/// Named persistent resources of one effect instance.
#[derive(Debug)]
pub struct ResourcePool {
    owner: &'static str,
    entries: FxHashMap<&'static str, PoolEntry>,
}

impl ResourcePool {
    #[must_use]
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            entries: FxHashMap::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// Returns the resource registered under `name`, allocating it when
    /// missing or when `desc` differs from the one it was created with.
    ///
    /// On allocation failure the pool no longer holds a resource for `name`.
    pub fn acquire<A: ResourceAllocator + ?Sized>(
        &mut self,
        allocator: &mut A,
        name: &'static str,
        desc: ResourceDesc,
    ) -> Result<Acquired> {
        if let Some(entry) = self.entries.get_mut(name) {
            if entry.desc == desc {
                let fresh = std::mem::take(&mut entry.stale);
                return Ok(Acquired {
                    handle: entry.handle,
                    fresh,
                });
            }
            log::debug!("{}/{name}: description changed, reallocating", self.owner);
        }

        if let Some(old) = self.entries.remove(name) {
            allocator.destroy_resource(old.handle);
        }

        let label = format!("{}/{name}", self.owner);
        let handle = allocator.create_resource(&label, &desc)?;
        self.entries.insert(
            name,
            PoolEntry {
                handle,
                desc,
                stale: false,
            },
        );

        Ok(Acquired {
            handle,
            fresh: true,
        })
    }

    /// The handle currently registered under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<ResourceHandle> {
        self.entries.get(name).map(|e| e.handle)
    }

    /// The description `name` was allocated with.
    #[must_use]
    pub fn desc(&self, name: &str) -> Option<ResourceDesc> {
        self.entries.get(name).map(|e| e.desc)
    }

    /// Marks the contents of every resource as undefined, keeping the
    /// allocations. Used when a recorded frame never reached the GPU.
    pub fn invalidate(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// Destroys every resource of the pool.
    pub fn release_all<A: ResourceAllocator + ?Sized>(&mut self, allocator: &mut A) {
        for (_, entry) in self.entries.drain() {
            allocator.destroy_resource(entry.handle);
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
