use alloc::sync::Arc;
use core::fmt;
use std::sync::{LazyLock, PoisonError, RwLock};

use mo_runtime::{Type, TypeKey};
use mo_utils::hash::NoOpHashMap;

use super::TypeDescriptor;

/// Source of [`TypeDescriptor`]s.
///
/// Implementations decide whether and how descriptors are memoized. They
/// must be safe to call from many threads at once.
pub trait DescriptorProvider: Send + Sync + fmt::Debug {
    /// Whether repeated calls for a type return the same descriptor.
    fn is_cache_enabled(&self) -> bool;

    fn describe(&self, ty: &Type) -> Arc<TypeDescriptor>;
}

/// Memoizes descriptors per [`TypeKey`] for the lifetime of the provider.
///
/// Entries are never evicted. When two threads describe the same type at
/// the same time, both build a descriptor and the first one inserted wins;
/// readers only ever see complete descriptors.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mo_reflect::{DefaultDescriptorProvider, DescriptorProvider};
/// use mo_runtime::{Type, TypeBuilder};
///
/// let ty = TypeBuilder::class("Order").property("id", Type::long()).build();
/// let provider = DefaultDescriptorProvider::new();
///
/// let a = provider.describe(&ty);
/// let b = provider.describe(&ty);
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct DefaultDescriptorProvider {
    cache_enabled: bool,
    cache: RwLock<NoOpHashMap<TypeKey, Arc<TypeDescriptor>>>,
}

impl Default for DefaultDescriptorProvider {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultDescriptorProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("DefaultDescriptorProvider")
            .field("cache_enabled", &self.cache_enabled)
            .field("len", &cache.len())
            .finish()
    }
}

static GLOBAL: LazyLock<Arc<DefaultDescriptorProvider>> =
    LazyLock::new(|| Arc::new(DefaultDescriptorProvider::new()));

impl DefaultDescriptorProvider {
    /// A provider with caching enabled.
    #[inline]
    pub const fn new() -> Self {
        Self::with_cache_enabled(true)
    }

    /// With `false`, every call builds a fresh descriptor.
    pub const fn with_cache_enabled(cache_enabled: bool) -> Self {
        Self {
            cache_enabled,
            cache: RwLock::new(NoOpHashMap::with_hasher(mo_utils::hash::NoOpHashState)),
        }
    }

    /// The process-wide provider shared by default contexts.
    pub fn global() -> Arc<Self> {
        GLOBAL.clone()
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl DescriptorProvider for DefaultDescriptorProvider {
    #[inline]
    fn is_cache_enabled(&self) -> bool {
        self.cache_enabled
    }

    fn describe(&self, ty: &Type) -> Arc<TypeDescriptor> {
        if !self.cache_enabled {
            return Arc::new(TypeDescriptor::new(ty));
        }

        let key = ty.key();
        if let Some(found) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return found.clone();
        }

        // Built outside the lock; a concurrent builder may get there first.
        let built = Arc::new(TypeDescriptor::new(ty));
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(built)
            .clone()
    }
}
