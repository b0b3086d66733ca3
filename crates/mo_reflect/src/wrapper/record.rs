use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use mo_runtime::{Object, Type, Value};

use super::{AccessWrapper, get_child_value, get_collection_value, resolve_collection};
use super::{set_child_value, set_collection_value};
use crate::{MetaContext, Navigator, PathSegment, ReflectionError, TypeDescriptor};

/// Accesses an object through the descriptor of its runtime type.
///
/// Properties are read and written with the accessors the descriptor
/// resolved. Values that are not objects (scalars, unclaimed opaque values)
/// are described too, but any invocation on them is unsupported.
#[derive(Debug, Clone)]
pub struct RecordWrapper {
    value: Value,
    descriptor: Arc<TypeDescriptor>,
}

impl RecordWrapper {
    pub fn new(value: Value, cx: &MetaContext) -> Self {
        let ty = value.runtime_type().unwrap_or_else(Type::object);
        let descriptor = cx.descriptors().describe(&ty);
        Self { value, descriptor }
    }

    #[inline]
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    fn type_name(&self) -> Arc<str> {
        self.descriptor.ty().name_arc()
    }

    fn target(&self, operation: &str) -> Result<&Object, ReflectionError> {
        self.value
            .as_object()
            .ok_or_else(|| ReflectionError::unsupported(operation, self.type_name()))
    }

    fn get_property(&self, name: &str) -> Result<Value, ReflectionError> {
        let accessor = self.descriptor.get_accessor(name)?;
        accessor.invoke(self.target(name)?, &[])
    }

    fn set_property(&self, name: &str, value: Value) -> Result<(), ReflectionError> {
        let accessor = self.descriptor.set_accessor(name)?;
        accessor.invoke(self.target(name)?, &[value]).map(drop)
    }

    /// The live value of the first segment of a dotted `name`, when it is
    /// not null. Resolution failures count as absent.
    fn live_child(&self, segment: &PathSegment<'_>, cx: &MetaContext) -> Option<Navigator> {
        let indexed = PathSegment::parse(segment.indexed_name()).ok()?;
        let child = self.get(&indexed, cx).ok()?;
        (!child.is_null()).then(|| Navigator::for_value(child, cx))
    }
}

impl AccessWrapper for RecordWrapper {
    fn get(&self, segment: &PathSegment<'_>, cx: &MetaContext) -> Result<Value, ReflectionError> {
        if segment.has_next() {
            get_child_value(self, segment, cx)
        } else if segment.index().is_some() {
            let collection = resolve_collection(self, &self.value, segment, cx)?;
            get_collection_value(segment, &collection)
        } else {
            self.get_property(segment.name())
        }
    }

    fn set(
        &self,
        segment: &PathSegment<'_>,
        value: Value,
        cx: &MetaContext,
    ) -> Result<(), ReflectionError> {
        if segment.has_next() {
            set_child_value(self, &self.value, segment, value, cx)
        } else if segment.index().is_some() {
            let collection = resolve_collection(self, &self.value, segment, cx)?;
            set_collection_value(segment, &collection, value)
        } else {
            self.set_property(segment.name(), value)
        }
    }

    fn find_property(&self, name: &str, case_insensitive: bool, cx: &MetaContext) -> Option<String> {
        self.descriptor
            .find_property_path(name, case_insensitive, cx.descriptors())
    }

    fn getter_names(&self, _: &MetaContext) -> Vec<Arc<str>> {
        self.descriptor.readable_property_names().to_vec()
    }

    fn setter_names(&self, _: &MetaContext) -> Vec<Arc<str>> {
        self.descriptor.writable_property_names().to_vec()
    }

    fn getter_type(&self, name: &str, cx: &MetaContext) -> Result<Type, ReflectionError> {
        let segment = PathSegment::parse(name)?;
        match (segment.children(), self.live_child(&segment, cx)) {
            (Some(children), Some(child)) => child.getter_type(children),
            _ => self.descriptor.getter_type_path(name, cx.descriptors()),
        }
    }

    fn setter_type(&self, name: &str, cx: &MetaContext) -> Result<Type, ReflectionError> {
        let segment = PathSegment::parse(name)?;
        match (segment.children(), self.live_child(&segment, cx)) {
            (Some(children), Some(child)) => child.setter_type(children),
            _ => self.descriptor.setter_type_path(name, cx.descriptors()),
        }
    }

    fn has_getter(&self, name: &str, cx: &MetaContext) -> bool {
        let Ok(segment) = PathSegment::parse(name) else {
            return false;
        };
        let Some(children) = segment.children() else {
            return self.descriptor.has_getter_path(name, cx.descriptors());
        };
        if !self.descriptor.has_getter_path(segment.indexed_name(), cx.descriptors()) {
            return false;
        }
        match self.live_child(&segment, cx) {
            Some(child) => child.has_getter(children),
            None => self.descriptor.has_getter_path(name, cx.descriptors()),
        }
    }

    fn has_setter(&self, name: &str, cx: &MetaContext) -> bool {
        let Ok(segment) = PathSegment::parse(name) else {
            return false;
        };
        let Some(children) = segment.children() else {
            return self.descriptor.has_setter_path(name, cx.descriptors());
        };
        if !self.descriptor.has_setter_path(segment.indexed_name(), cx.descriptors()) {
            return false;
        }
        match self.live_child(&segment, cx) {
            Some(child) => child.has_setter(children),
            None => self.descriptor.has_setter_path(name, cx.descriptors()),
        }
    }

    fn instantiate_property_value(
        &self,
        segment: &PathSegment<'_>,
        cx: &MetaContext,
    ) -> Result<Navigator, ReflectionError> {
        let ty = self.descriptor.setter_type(segment.name())?;
        let created = cx.object_factory().create(&ty)?;
        log::trace!(
            "instantiated `{ty}` for null property `{}` of `{}`",
            segment.name(),
            self.type_name()
        );
        self.set(segment, created.clone(), cx)?;
        Ok(Navigator::for_value(created, cx))
    }

    fn is_collection(&self) -> bool {
        false
    }

    fn add(&self, _: Value) -> Result<(), ReflectionError> {
        Err(ReflectionError::unsupported("add", self.type_name()))
    }

    fn add_all(&self, _: &[Value]) -> Result<(), ReflectionError> {
        Err(ReflectionError::unsupported("add_all", self.type_name()))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use mo_runtime::{CollectionRef, MapRef, MethodSpec, Type, TypeBuilder, Value};

    use crate::{ErrorKind, MetaContext, Navigator};

    fn instance(ty: &Type) -> Value {
        ty.declared_constructor(&[])
            .unwrap()
            .new_instance(&[], false)
            .unwrap()
    }

    fn fixture() -> Type {
        let gadget = TypeBuilder::class("Gadget")
            .property("label", Type::string())
            .property("weight", Type::int())
            .build();
        let drawer = TypeBuilder::class("Drawer")
            .property("gadget", gadget)
            .property("items", Type::list())
            .property("tags", Type::map())
            .build();
        TypeBuilder::class("Desk")
            .property("drawer", drawer)
            .property("name", Type::string())
            .property("legs", Type::int())
            .build()
    }

    #[test]
    fn round_trip() {
        let desk = fixture();
        let nav = Navigator::for_value(instance(&desk), &MetaContext::default());

        nav.set_value("name", Value::from("oak")).unwrap();
        assert_eq!(nav.get_value("name").unwrap(), Value::from("oak"));
        nav.set_value("legs", Value::Int(4)).unwrap();
        assert_eq!(nav.get_value("legs").unwrap(), Value::Int(4));

        let err = nav.set_value("legs", Value::from("four")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invocation);
        assert_eq!(nav.get_value("color").unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn nested_set_instantiates_intermediates() {
        let desk = fixture();
        let nav = Navigator::for_value(instance(&desk), &MetaContext::default());

        assert_eq!(nav.get_value("drawer.gadget.label").unwrap(), Value::Null);
        nav.set_value("drawer.gadget.weight", Value::Int(5)).unwrap();
        assert_eq!(nav.get_value("drawer.gadget.weight").unwrap(), Value::Int(5));
        assert_eq!(nav.navigate_to("drawer").unwrap().value().runtime_type().unwrap().name(), "Drawer");
    }

    #[test]
    fn null_write_through_null_intermediate_is_noop() {
        let desk = fixture();
        let nav = Navigator::for_value(instance(&desk), &MetaContext::default());
        nav.set_value("drawer.gadget.label", Value::Null).unwrap();
        assert_eq!(nav.get_value("drawer").unwrap(), Value::Null);
    }

    #[test]
    fn indexed_properties() {
        let desk = fixture();
        let nav = Navigator::for_value(instance(&desk), &MetaContext::default());

        nav.set_value("drawer.items", Value::from(CollectionRef::list_of([Value::Int(1), Value::Int(2)])))
            .unwrap();
        assert_eq!(nav.get_value("drawer.items[1]").unwrap(), Value::Int(2));
        nav.set_value("drawer.items[0]", Value::Int(9)).unwrap();
        assert_eq!(nav.get_value("drawer.items[0]").unwrap(), Value::Int(9));
        assert_eq!(nav.get_value("drawer.items[2]").unwrap_err().kind(), ErrorKind::OutOfRange);

        nav.set_value("drawer.tags", Value::from(MapRef::new())).unwrap();
        nav.set_value("drawer.tags[color]", Value::from("red")).unwrap();
        assert_eq!(nav.get_value("drawer.tags[color]").unwrap(), Value::from("red"));
    }

    #[test]
    fn nested_queries_use_live_values_then_declared_types() {
        let desk = fixture();
        let nav = Navigator::for_value(instance(&desk), &MetaContext::default());

        assert!(nav.has_getter("drawer.gadget.label"));
        assert!(nav.has_setter("drawer.gadget.label"));
        assert!(!nav.has_getter("drawer.gadget.color"));
        assert_eq!(nav.getter_type("drawer.gadget.weight").unwrap(), Type::int());
        assert_eq!(nav.setter_type("drawer.items").unwrap(), Type::list());

        nav.set_value("drawer.items", Value::from(CollectionRef::new_list())).unwrap();
        assert_eq!(nav.getter_type("drawer.items").unwrap(), Type::list());
        assert_eq!(nav.getter_type("drawer.items[0]").unwrap(), Type::object());
    }

    #[test]
    fn names_and_find_property() {
        let desk = fixture();
        let nav = Navigator::for_value(instance(&desk), &MetaContext::default());

        let getter_names = nav.getter_names();
        let names: Vec<&str> = getter_names.iter().map(|n| &**n).collect();
        assert_eq!(names, ["drawer", "name", "legs"]);
        assert_eq!(nav.find_property("DRAWER.gadget.LABEL", true).as_deref(), Some("drawer.gadget.label"));
        assert_eq!(nav.find_property("DRAWER", false), None);
    }

    #[test]
    fn ambiguous_property_fails_on_use() {
        let ty = TypeBuilder::class("Clash")
            .method(MethodSpec::new("getFlag").returns(Type::string()))
            .method(MethodSpec::new("isFlag").returns(Type::boolean()))
            .build();
        let nav = Navigator::for_value(instance(&ty), &MetaContext::default());
        assert!(nav.has_getter("flag"));
        assert_eq!(nav.get_value("flag").unwrap_err().kind(), ErrorKind::Ambiguous);
    }

    #[test]
    fn scalars_have_no_properties() {
        let nav = Navigator::for_value(Value::Int(3), &MetaContext::default());
        assert!(nav.getter_names().is_empty());
        assert_eq!(nav.get_value("x").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(nav.add(Value::Int(1)).unwrap_err().kind(), ErrorKind::Unsupported);
    }
}
