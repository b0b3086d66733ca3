use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use mo_runtime::{CollectionRef, Type, Value};

use super::{AccessWrapper, get_child_value, get_collection_value};
use super::{set_child_value, set_collection_value};
use crate::{MetaContext, Navigator, PathSegment, ReflectionError};

/// Positional access to a list or set.
///
/// Elements are reached with a bare index, `[i]`; collections expose no
/// named properties.
#[derive(Debug, Clone)]
pub struct CollectionWrapper {
    collection: CollectionRef,
}

impl CollectionWrapper {
    #[inline]
    pub fn new(collection: CollectionRef) -> Self {
        Self { collection }
    }

    #[inline]
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    fn owner(&self) -> Value {
        Value::Collection(self.collection.clone())
    }

    fn unsupported(&self, operation: &str) -> ReflectionError {
        ReflectionError::unsupported(operation, self.collection.ty().name_arc())
    }

    fn require_index(&self, segment: &PathSegment<'_>) -> Result<(), ReflectionError> {
        match segment.index() {
            Some(_) if segment.name().is_empty() => Ok(()),
            _ => Err(self.unsupported(segment.indexed_name())),
        }
    }
}

impl AccessWrapper for CollectionWrapper {
    fn get(&self, segment: &PathSegment<'_>, cx: &MetaContext) -> Result<Value, ReflectionError> {
        self.require_index(segment)?;
        if segment.has_next() {
            get_child_value(self, segment, cx)
        } else {
            get_collection_value(segment, &self.owner())
        }
    }

    fn set(
        &self,
        segment: &PathSegment<'_>,
        value: Value,
        cx: &MetaContext,
    ) -> Result<(), ReflectionError> {
        self.require_index(segment)?;
        if segment.has_next() {
            set_child_value(self, &self.owner(), segment, value, cx)
        } else {
            set_collection_value(segment, &self.owner(), value)
        }
    }

    fn find_property(&self, _: &str, _: bool, _: &MetaContext) -> Option<String> {
        None
    }

    fn getter_names(&self, _: &MetaContext) -> Vec<Arc<str>> {
        Vec::new()
    }

    fn setter_names(&self, _: &MetaContext) -> Vec<Arc<str>> {
        Vec::new()
    }

    fn getter_type(&self, name: &str, _: &MetaContext) -> Result<Type, ReflectionError> {
        Err(self.unsupported(name))
    }

    fn setter_type(&self, name: &str, _: &MetaContext) -> Result<Type, ReflectionError> {
        Err(self.unsupported(name))
    }

    fn has_getter(&self, _: &str, _: &MetaContext) -> bool {
        false
    }

    fn has_setter(&self, _: &str, _: &MetaContext) -> bool {
        false
    }

    fn instantiate_property_value(
        &self,
        segment: &PathSegment<'_>,
        _: &MetaContext,
    ) -> Result<Navigator, ReflectionError> {
        Err(self.unsupported(segment.indexed_name()))
    }

    fn is_collection(&self) -> bool {
        true
    }

    fn add(&self, element: Value) -> Result<(), ReflectionError> {
        self.collection.push(element);
        Ok(())
    }

    fn add_all(&self, elements: &[Value]) -> Result<(), ReflectionError> {
        for element in elements {
            self.collection.push(element.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mo_runtime::{CollectionRef, Type, TypeBuilder, Value};

    use crate::{ErrorKind, MetaContext, Navigator};

    #[test]
    fn positions_are_bounded() {
        let list = CollectionRef::list_of([Value::Int(10), Value::Int(20), Value::Int(30)]);
        let nav = Navigator::for_value(Value::from(list.clone()), &MetaContext::default());
        assert!(nav.is_collection());

        for (i, expected) in [10, 20, 30].into_iter().enumerate() {
            assert_eq!(nav.get_value(&format!("[{i}]")).unwrap(), Value::Int(expected));
        }
        let err = nav.get_value("[3]").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert!(err.to_string().contains("length 3"), "{err}");

        nav.set_value("[1]", Value::Int(21)).unwrap();
        assert_eq!(list.get(1), Some(Value::Int(21)));
        assert_eq!(nav.set_value("[3]", Value::Int(0)).unwrap_err().kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn named_access_is_unsupported() {
        let nav = Navigator::for_value(Value::from(CollectionRef::new_list()), &MetaContext::default());
        assert_eq!(nav.get_value("size").unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(nav.set_value("size", Value::Int(1)).unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(nav.getter_type("size").unwrap_err().kind(), ErrorKind::Unsupported);
        assert!(!nav.has_getter("size"));
        assert!(!nav.has_setter("size"));
        assert_eq!(nav.find_property("size", true), None);
        assert!(nav.getter_names().is_empty());
    }

    #[test]
    fn growth() {
        let list = CollectionRef::new_list();
        let nav = Navigator::for_value(Value::from(list.clone()), &MetaContext::default());
        nav.add(Value::from("a")).unwrap();
        nav.add_all([Value::from("b"), Value::from("c")]).unwrap();
        assert_eq!(list.to_vec(), [Value::from("a"), Value::from("b"), Value::from("c")]);

        let set = CollectionRef::new_tree_set();
        let nav = Navigator::for_value(Value::from(set.clone()), &MetaContext::default());
        nav.add_all([Value::Int(3), Value::Int(1), Value::Int(3)]).unwrap();
        assert_eq!(set.to_vec(), [Value::Int(1), Value::Int(3)]);
        assert_eq!(nav.get_value("[0]").unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn element_properties() {
        let item = TypeBuilder::class("Item").property("sku", Type::string()).build();
        let first = item.declared_constructor(&[]).unwrap().new_instance(&[], false).unwrap();
        let list = CollectionRef::list_of([first, Value::Null]);
        let nav = Navigator::for_value(Value::from(list), &MetaContext::default());

        nav.set_value("[0].sku", Value::from("A-1")).unwrap();
        assert_eq!(nav.get_value("[0].sku").unwrap(), Value::from("A-1"));
        assert_eq!(nav.get_value("[1].sku").unwrap(), Value::Null);
        assert_eq!(nav.set_value("[1].sku", Value::from("B")).unwrap_err().kind(), ErrorKind::Unsupported);
    }
}
