//! Uniform property access over the different shapes a value can take.
//!
//! An [`AccessWrapper`] answers property queries for one value. The
//! [`Navigator`] picks the wrapper; wrappers themselves hold no policy and
//! receive the [`MetaContext`] on every call.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use mo_runtime::{Type, Value};

use crate::{MetaContext, Navigator, PathSegment, ReflectionError};

// -----------------------------------------------------------------------------
// Modules

mod collection;
mod map;
mod null;
mod record;

// -----------------------------------------------------------------------------
// Exports

pub use collection::CollectionWrapper;
pub use map::MapWrapper;
pub use record::RecordWrapper;

pub(crate) use null::NullWrapper;

// -----------------------------------------------------------------------------
// AccessWrapper

/// Property access for one value.
///
/// Paths handed to [`get`](Self::get) and [`set`](Self::set) are already
/// parsed; the segment may carry an index and further children.
pub trait AccessWrapper: Send + Sync + fmt::Debug {
    fn get(&self, segment: &PathSegment<'_>, cx: &MetaContext) -> Result<Value, ReflectionError>;

    fn set(
        &self,
        segment: &PathSegment<'_>,
        value: Value,
        cx: &MetaContext,
    ) -> Result<(), ReflectionError>;

    /// Canonical spelling of `name`, or `None` when it does not resolve.
    fn find_property(&self, name: &str, case_insensitive: bool, cx: &MetaContext)
    -> Option<String>;

    fn getter_names(&self, cx: &MetaContext) -> Vec<Arc<str>>;

    fn setter_names(&self, cx: &MetaContext) -> Vec<Arc<str>>;

    fn getter_type(&self, name: &str, cx: &MetaContext) -> Result<Type, ReflectionError>;

    fn setter_type(&self, name: &str, cx: &MetaContext) -> Result<Type, ReflectionError>;

    fn has_getter(&self, name: &str, cx: &MetaContext) -> bool;

    fn has_setter(&self, name: &str, cx: &MetaContext) -> bool;

    /// Creates a value for the null property `segment`, stores it and
    /// returns a navigator over it.
    fn instantiate_property_value(
        &self,
        segment: &PathSegment<'_>,
        cx: &MetaContext,
    ) -> Result<Navigator, ReflectionError>;

    fn is_collection(&self) -> bool;

    fn add(&self, element: Value) -> Result<(), ReflectionError>;

    fn add_all(&self, elements: &[Value]) -> Result<(), ReflectionError>;
}

// -----------------------------------------------------------------------------
// Shared helpers

/// Type name used in diagnostics for `value`.
pub(crate) fn type_name(value: &Value) -> Arc<str> {
    match value.runtime_type() {
        Some(ty) => ty.name_arc(),
        None => Arc::from("null"),
    }
}

/// The value indexed by `segment`: the owner itself for a bare `[i]`,
/// otherwise the named property.
pub(crate) fn resolve_collection(
    wrapper: &dyn AccessWrapper,
    owner: &Value,
    segment: &PathSegment<'_>,
    cx: &MetaContext,
) -> Result<Value, ReflectionError> {
    if segment.name().is_empty() {
        Ok(owner.clone())
    } else {
        wrapper.get(&PathSegment::parse(segment.name())?, cx)
    }
}

fn position(segment: &PathSegment<'_>, index: &str, ty: &Type) -> Result<i64, ReflectionError> {
    index.trim().parse::<i64>().map_err(|_| {
        ReflectionError::invalid_path(segment.indexed_name(), "index is not an integer")
            .on_type(ty.name_arc())
    })
}

fn out_of_range(segment: &PathSegment<'_>, ty: Arc<str>, index: i64, len: usize) -> ReflectionError {
    ReflectionError::OutOfRange {
        property: String::from(segment.indexed_name()),
        ty,
        index,
        len,
    }
}

/// Reads `collection[index]`: by key for maps, by position for lists.
///
/// A null collection reads as null.
pub(crate) fn get_collection_value(
    segment: &PathSegment<'_>,
    collection: &Value,
) -> Result<Value, ReflectionError> {
    let index = segment.index().unwrap_or_default();
    match collection {
        Value::Null => Ok(Value::Null),
        Value::Map(map) => Ok(map.get(index).unwrap_or_default()),
        Value::Collection(list) if list.is_indexable() => {
            let at = position(segment, index, list.ty())?;
            usize::try_from(at)
                .ok()
                .and_then(|i| list.get(i))
                .ok_or_else(|| out_of_range(segment, list.ty().name_arc(), at, list.len()))
        }
        other => Err(ReflectionError::unsupported(
            segment.indexed_name(),
            type_name(other),
        )),
    }
}

/// Writes `collection[index]`. Lists are never grown.
pub(crate) fn set_collection_value(
    segment: &PathSegment<'_>,
    collection: &Value,
    value: Value,
) -> Result<(), ReflectionError> {
    let index = segment.index().unwrap_or_default();
    match collection {
        Value::Map(map) => {
            map.insert(index, value);
            Ok(())
        }
        Value::Collection(list) if list.is_indexable() => {
            let at = position(segment, index, list.ty())?;
            match usize::try_from(at).ok().and_then(|i| list.set(i, value)) {
                Some(_) => Ok(()),
                None => Err(out_of_range(segment, list.ty().name_arc(), at, list.len())),
            }
        }
        other => Err(ReflectionError::unsupported(
            segment.indexed_name(),
            type_name(other),
        )),
    }
}

/// Reads the rest of the path through the value of the first segment.
pub(crate) fn get_child_value(
    wrapper: &dyn AccessWrapper,
    segment: &PathSegment<'_>,
    cx: &MetaContext,
) -> Result<Value, ReflectionError> {
    let child = wrapper.get(&PathSegment::parse(segment.indexed_name())?, cx)?;
    if child.is_null() {
        return Ok(Value::Null);
    }
    Navigator::for_value(child, cx).get_value(segment.children().unwrap_or_default())
}

/// Writes the rest of the path through the value of the first segment,
/// creating that value when it is null.
pub(crate) fn set_child_value(
    wrapper: &dyn AccessWrapper,
    owner: &Value,
    segment: &PathSegment<'_>,
    value: Value,
    cx: &MetaContext,
) -> Result<(), ReflectionError> {
    let children = segment.children().unwrap_or_default();
    let child = wrapper.get(&PathSegment::parse(segment.indexed_name())?, cx)?;
    if !child.is_null() {
        return Navigator::for_value(child, cx).set_value(children, value);
    }
    if value.is_null() {
        return Ok(());
    }
    // Element types are not declared, so a null element has nothing to build.
    if segment.index().is_some() {
        return Err(ReflectionError::unsupported(
            segment.indexed_name(),
            type_name(owner),
        ));
    }
    wrapper
        .instantiate_property_value(&PathSegment::parse(segment.name())?, cx)?
        .set_value(children, value)
}

// -----------------------------------------------------------------------------
// WrapperFactory

/// Supplies custom wrappers for values the built-in ones do not fit.
pub trait WrapperFactory: Send + Sync + fmt::Debug {
    fn has_wrapper_for(&self, value: &Value) -> bool;

    fn wrapper_for(&self, value: &Value, cx: &MetaContext) -> Option<Arc<dyn AccessWrapper>>;
}

/// A custom wrapper contributed at link time.
///
/// With the `auto_register` feature, registrations submitted through
/// `inventory::submit!` anywhere in the binary are consulted by
/// [`DefaultWrapperFactory`] in unspecified order; the first match wins.
///
/// ```ignore
/// inventory::submit! {
///     WrapperRegistration::new(is_temperature, TemperatureWrapper::create)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WrapperRegistration {
    matches: fn(&Value) -> bool,
    create: fn(&Value, &MetaContext) -> Arc<dyn AccessWrapper>,
}

impl WrapperRegistration {
    pub const fn new(
        matches: fn(&Value) -> bool,
        create: fn(&Value, &MetaContext) -> Arc<dyn AccessWrapper>,
    ) -> Self {
        Self { matches, create }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(WrapperRegistration);

#[cfg(feature = "auto_register")]
fn registrations() -> impl Iterator<Item = &'static WrapperRegistration> {
    inventory::iter::<WrapperRegistration>.into_iter()
}

#[cfg(not(feature = "auto_register"))]
fn registrations() -> impl Iterator<Item = &'static WrapperRegistration> {
    core::iter::empty()
}

/// Consults the link-time [`WrapperRegistration`]s.
///
/// Without the `auto_register` feature it claims nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultWrapperFactory;

impl WrapperFactory for DefaultWrapperFactory {
    fn has_wrapper_for(&self, value: &Value) -> bool {
        registrations().any(|reg| (reg.matches)(value))
    }

    fn wrapper_for(&self, value: &Value, cx: &MetaContext) -> Option<Arc<dyn AccessWrapper>> {
        registrations()
            .find(|reg| (reg.matches)(value))
            .map(|reg| (reg.create)(value, cx))
    }
}
