use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use mo_runtime::{MapRef, Type, Value};

use super::{AccessWrapper, get_child_value, get_collection_value, resolve_collection};
use super::{set_child_value, set_collection_value};
use crate::{MetaContext, Navigator, PathSegment, ReflectionError};

/// Treats every key of a string-keyed map as a property.
///
/// Any name is writable. Types are those of the values currently stored,
/// falling back to the top type.
#[derive(Debug, Clone)]
pub struct MapWrapper {
    map: MapRef,
}

impl MapWrapper {
    #[inline]
    pub fn new(map: MapRef) -> Self {
        Self { map }
    }

    #[inline]
    pub fn map(&self) -> &MapRef {
        &self.map
    }

    fn owner(&self) -> Value {
        Value::Map(self.map.clone())
    }

    fn stored_type(&self, key: &str) -> Type {
        self.map
            .get(key)
            .and_then(|value| value.runtime_type())
            .unwrap_or_else(Type::object)
    }

    /// Navigator over the non-null value of the first segment.
    fn live_child(&self, segment: &PathSegment<'_>, cx: &MetaContext) -> Option<Navigator> {
        let indexed = PathSegment::parse(segment.indexed_name()).ok()?;
        let child = self.get(&indexed, cx).ok()?;
        (!child.is_null()).then(|| Navigator::for_value(child, cx))
    }

    fn nested_type(
        &self,
        name: &str,
        cx: &MetaContext,
        query: impl FnOnce(&Navigator, &str) -> Result<Type, ReflectionError>,
    ) -> Result<Type, ReflectionError> {
        let segment = PathSegment::parse(name)?;
        match segment.children() {
            Some(children) => match self.live_child(&segment, cx) {
                Some(child) => query(&child, children),
                None => Ok(Type::object()),
            },
            None => Ok(self.stored_type(name)),
        }
    }
}

impl AccessWrapper for MapWrapper {
    fn get(&self, segment: &PathSegment<'_>, cx: &MetaContext) -> Result<Value, ReflectionError> {
        if segment.has_next() {
            get_child_value(self, segment, cx)
        } else if segment.index().is_some() {
            let collection = resolve_collection(self, &self.owner(), segment, cx)?;
            get_collection_value(segment, &collection)
        } else {
            Ok(self.map.get(segment.name()).unwrap_or_default())
        }
    }

    fn set(
        &self,
        segment: &PathSegment<'_>,
        value: Value,
        cx: &MetaContext,
    ) -> Result<(), ReflectionError> {
        if segment.has_next() {
            set_child_value(self, &self.owner(), segment, value, cx)
        } else if segment.index().is_some() {
            let collection = resolve_collection(self, &self.owner(), segment, cx)?;
            set_collection_value(segment, &collection, value)
        } else {
            self.map.insert(segment.name(), value);
            Ok(())
        }
    }

    fn find_property(&self, name: &str, _: bool, _: &MetaContext) -> Option<String> {
        Some(String::from(name))
    }

    fn getter_names(&self, _: &MetaContext) -> Vec<Arc<str>> {
        self.map.keys().into_iter().map(Arc::from).collect()
    }

    fn setter_names(&self, cx: &MetaContext) -> Vec<Arc<str>> {
        self.getter_names(cx)
    }

    fn getter_type(&self, name: &str, cx: &MetaContext) -> Result<Type, ReflectionError> {
        self.nested_type(name, cx, |child, rest| child.getter_type(rest))
    }

    fn setter_type(&self, name: &str, cx: &MetaContext) -> Result<Type, ReflectionError> {
        self.nested_type(name, cx, |child, rest| child.setter_type(rest))
    }

    fn has_getter(&self, name: &str, cx: &MetaContext) -> bool {
        let Ok(segment) = PathSegment::parse(name) else {
            return false;
        };
        let Some(children) = segment.children() else {
            return self.map.contains_key(segment.name());
        };
        if !self.map.contains_key(segment.indexed_name()) {
            return false;
        }
        match self.live_child(&segment, cx) {
            Some(child) => child.has_getter(children),
            None => true,
        }
    }

    fn has_setter(&self, _: &str, _: &MetaContext) -> bool {
        true
    }

    fn instantiate_property_value(
        &self,
        segment: &PathSegment<'_>,
        cx: &MetaContext,
    ) -> Result<Navigator, ReflectionError> {
        let created = Value::Map(MapRef::new());
        self.set(segment, created.clone(), cx)?;
        Ok(Navigator::for_value(created, cx))
    }

    fn is_collection(&self) -> bool {
        false
    }

    fn add(&self, _: Value) -> Result<(), ReflectionError> {
        Err(ReflectionError::unsupported("add", Type::hash_map().name_arc()))
    }

    fn add_all(&self, _: &[Value]) -> Result<(), ReflectionError> {
        Err(ReflectionError::unsupported("add_all", Type::hash_map().name_arc()))
    }
}
