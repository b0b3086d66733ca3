use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use mo_runtime::{Type, Value};

use crate::wrapper::{AccessWrapper, CollectionWrapper, MapWrapper, NullWrapper, RecordWrapper};
use crate::wrapper::{DefaultWrapperFactory, WrapperFactory, type_name};
use crate::{DefaultDescriptorProvider, DefaultObjectFactory, DescriptorProvider};
use crate::{ObjectFactory, PathSegment, ReflectionError};

// -----------------------------------------------------------------------------
// MetaContext

/// The policies a [`Navigator`] and everything it creates share.
///
/// Cloning is cheap; every field is reference counted.
#[derive(Clone)]
pub struct MetaContext {
    object_factory: Arc<dyn ObjectFactory>,
    wrapper_factory: Arc<dyn WrapperFactory>,
    descriptors: Arc<dyn DescriptorProvider>,
}

impl Default for MetaContext {
    /// Default factories and the process-wide descriptor cache.
    fn default() -> Self {
        Self {
            object_factory: Arc::new(DefaultObjectFactory),
            wrapper_factory: Arc::new(DefaultWrapperFactory),
            descriptors: DefaultDescriptorProvider::global(),
        }
    }
}

impl fmt::Debug for MetaContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetaContext")
            .field("object_factory", &self.object_factory)
            .field("wrapper_factory", &self.wrapper_factory)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}

impl MetaContext {
    pub fn new(
        object_factory: Arc<dyn ObjectFactory>,
        wrapper_factory: Arc<dyn WrapperFactory>,
        descriptors: Arc<dyn DescriptorProvider>,
    ) -> Self {
        Self {
            object_factory,
            wrapper_factory,
            descriptors,
        }
    }

    pub fn with_object_factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.object_factory = factory;
        self
    }

    pub fn with_wrapper_factory(mut self, factory: Arc<dyn WrapperFactory>) -> Self {
        self.wrapper_factory = factory;
        self
    }

    pub fn with_descriptors(mut self, descriptors: Arc<dyn DescriptorProvider>) -> Self {
        self.descriptors = descriptors;
        self
    }

    #[inline]
    pub fn object_factory(&self) -> &dyn ObjectFactory {
        &*self.object_factory
    }

    #[inline]
    pub fn wrapper_factory(&self) -> &dyn WrapperFactory {
        &*self.wrapper_factory
    }

    #[inline]
    pub fn descriptors(&self) -> &dyn DescriptorProvider {
        &*self.descriptors
    }
}

// -----------------------------------------------------------------------------
// Wrapped

/// An [`AccessWrapper`] carried inside a [`Value`].
///
/// A navigator over such a value uses the wrapper as is.
#[derive(Debug, Clone)]
pub struct Wrapped(pub Arc<dyn AccessWrapper>);

impl Wrapped {
    #[inline]
    pub fn into_value(self) -> Value {
        Value::opaque(self)
    }
}

// -----------------------------------------------------------------------------
// Navigator

/// Uniform property access over one runtime value.
///
/// The wrapper is chosen once, when the navigator is created:
///
/// 1. a [`Wrapped`] value supplies its own wrapper;
/// 2. otherwise the context's [`WrapperFactory`] may claim the value;
/// 3. maps use [`MapWrapper`], collections [`CollectionWrapper`];
/// 4. anything else is described by its type with [`RecordWrapper`].
///
/// A navigator over [`Value::Null`] is the null sentinel: reads yield null,
/// name queries report nothing, and type queries and writes fail with
/// `NotFound`.
///
/// Navigators are cheap. Nested navigators are created on demand and never
/// cached, so they always see the current state of the graph.
///
/// # Examples
///
/// ```
/// use mo_reflect::{MetaContext, Navigator};
/// use mo_runtime::{Type, TypeBuilder, Value};
///
/// let address = TypeBuilder::class("Address").property("city", Type::string()).build();
/// let person = TypeBuilder::class("Person").property("address", address).build();
/// let obj = person.declared_constructor(&[]).unwrap().new_instance(&[], false).unwrap();
///
/// let nav = Navigator::for_value(obj, &MetaContext::default());
/// nav.set_value("address.city", Value::from("Lyon")).unwrap();
/// assert_eq!(nav.get_value("address.city").unwrap(), Value::from("Lyon"));
/// ```
#[derive(Clone)]
pub struct Navigator {
    value: Value,
    wrapper: Arc<dyn AccessWrapper>,
    cx: MetaContext,
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("value", &self.value)
            .field("wrapper", &self.wrapper)
            .finish_non_exhaustive()
    }
}

impl Navigator {
    /// Binds a navigator to `value`.
    pub fn for_value(value: Value, cx: &MetaContext) -> Self {
        let wrapper = Self::select_wrapper(&value, cx);
        Self {
            value,
            wrapper,
            cx: cx.clone(),
        }
    }

    fn select_wrapper(value: &Value, cx: &MetaContext) -> Arc<dyn AccessWrapper> {
        if value.is_null() {
            return NullWrapper::shared();
        }
        if let Some(Wrapped(wrapper)) = value.downcast_opaque::<Wrapped>() {
            return wrapper.clone();
        }
        if cx.wrapper_factory().has_wrapper_for(value)
            && let Some(wrapper) = cx.wrapper_factory().wrapper_for(value, cx)
        {
            return wrapper;
        }
        match value {
            Value::Map(map) => Arc::new(MapWrapper::new(map.clone())),
            Value::Collection(collection) => Arc::new(CollectionWrapper::new(collection.clone())),
            _ => Arc::new(RecordWrapper::new(value.clone(), cx)),
        }
    }

    /// The value this navigator is bound to.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[inline]
    pub fn wrapper(&self) -> &Arc<dyn AccessWrapper> {
        &self.wrapper
    }

    #[inline]
    pub fn context(&self) -> &MetaContext {
        &self.cx
    }

    /// Whether this is the null sentinel.
    #[inline]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    pub fn find_property(&self, name: &str, case_insensitive: bool) -> Option<String> {
        self.wrapper.find_property(name, case_insensitive, &self.cx)
    }

    pub fn getter_names(&self) -> Vec<Arc<str>> {
        self.wrapper.getter_names(&self.cx)
    }

    pub fn setter_names(&self) -> Vec<Arc<str>> {
        self.wrapper.setter_names(&self.cx)
    }

    pub fn getter_type(&self, name: &str) -> Result<Type, ReflectionError> {
        self.wrapper.getter_type(name, &self.cx)
    }

    pub fn setter_type(&self, name: &str) -> Result<Type, ReflectionError> {
        self.wrapper.setter_type(name, &self.cx)
    }

    pub fn has_getter(&self, name: &str) -> bool {
        self.wrapper.has_getter(name, &self.cx)
    }

    pub fn has_setter(&self, name: &str) -> bool {
        self.wrapper.has_setter(name, &self.cx)
    }

    /// Reads the value at `path`.
    pub fn get_value(&self, path: &str) -> Result<Value, ReflectionError> {
        PathSegment::parse(path)
            .and_then(|segment| self.wrapper.get(&segment, &self.cx))
            .map_err(|e| e.on_type(type_name(&self.value)))
    }

    /// Writes the value at `path`, creating missing intermediate objects.
    pub fn set_value(&self, path: &str, value: Value) -> Result<(), ReflectionError> {
        PathSegment::parse(path)
            .and_then(|segment| self.wrapper.set(&segment, value, &self.cx))
            .map_err(|e| e.on_type(type_name(&self.value)))
    }

    /// A fresh navigator over the current value of `name`.
    pub fn navigate_to(&self, name: &str) -> Result<Navigator, ReflectionError> {
        let value = self.get_value(name)?;
        Ok(Self::for_value(value, &self.cx))
    }

    #[inline]
    pub fn is_collection(&self) -> bool {
        self.wrapper.is_collection()
    }

    pub fn add(&self, element: Value) -> Result<(), ReflectionError> {
        self.wrapper.add(element)
    }

    pub fn add_all(&self, elements: impl IntoIterator<Item = Value>) -> Result<(), ReflectionError> {
        let elements: Vec<Value> = elements.into_iter().collect();
        self.wrapper.add_all(&elements)
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use mo_runtime::{CollectionRef, MapRef, MethodSpec, Type, TypeBuilder, Value};

    use super::{MetaContext, Navigator};
    use crate::{DefaultDescriptorProvider, DefaultObjectFactory, ErrorKind, ObjectFactory};
    use crate::{MapWrapper, ReflectionError, Wrapped};

    fn instance(ty: &Type) -> Value {
        ty.declared_constructor(&[])
            .unwrap()
            .new_instance(&[], false)
            .unwrap()
    }

    fn account() -> Type {
        let owner = TypeBuilder::class("Owner")
            .property("name", Type::string())
            .property("score", Type::int())
            .build();
        TypeBuilder::class("Account")
            .property("owner", owner)
            .property("balance", Type::double())
            .property("active", Type::boolean())
            .property("history", Type::list())
            .build()
    }

    #[test]
    fn written_values_read_back() {
        let nav = Navigator::for_value(instance(&account()), &MetaContext::default());
        let cases = [
            ("balance", Value::Double(12.5)),
            ("active", Value::Bool(true)),
            ("owner.name", Value::from("kim")),
            ("owner.score", Value::Int(3)),
        ];
        for (path, value) in cases {
            nav.set_value(path, value.clone()).unwrap();
            assert_eq!(nav.get_value(path).unwrap(), value, "{path}");
        }
        assert!(nav.has_getter("active"));
        assert_eq!(nav.getter_type("active").unwrap(), Type::boolean());
    }

    #[test]
    fn navigate_to_sees_live_state() {
        let nav = Navigator::for_value(instance(&account()), &MetaContext::default());
        assert!(nav.navigate_to("owner").unwrap().is_null());

        nav.set_value("owner.name", Value::from("lee")).unwrap();
        let owner = nav.navigate_to("owner").unwrap();
        assert!(!owner.is_null());
        owner.set_value("name", Value::from("park")).unwrap();
        assert_eq!(nav.get_value("owner.name").unwrap(), Value::from("park"));
    }

    #[test]
    fn collection_bounds_through_properties() {
        let nav = Navigator::for_value(instance(&account()), &MetaContext::default());
        let history = CollectionRef::list_of([Value::Int(1), Value::Int(2), Value::Int(3)]);
        nav.set_value("history", Value::from(history.clone())).unwrap();

        for i in 0..history.len() {
            assert!(nav.get_value(&format!("history[{i}]")).is_ok());
        }
        let err = nav.get_value(&format!("history[{}]", history.len())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let list = Navigator::for_value(Value::from(history), &MetaContext::default());
        assert_eq!(list.get_value("[3]").unwrap_err().kind(), ErrorKind::OutOfRange);
        assert_eq!(list.get_value("[2]").unwrap(), Value::Int(3));
    }

    #[test]
    fn ambiguity_is_not_absence() {
        let ty = TypeBuilder::class("Odd")
            .method(MethodSpec::new("setCode").param(Type::int()))
            .method(MethodSpec::new("setCode").param(Type::string()))
            .build();
        let nav = Navigator::for_value(instance(&ty), &MetaContext::default());

        assert!(nav.has_setter("code"));
        let err = nav.set_value("code", Value::Int(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Ambiguous);
        assert!(matches!(err, ReflectionError::Ambiguous { ref property, .. } if &**property == "code"));
        assert_eq!(nav.set_value("nothing", Value::Int(1)).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn case_insensitive_lookup() {
        let nav = Navigator::for_value(instance(&account()), &MetaContext::default());
        assert_eq!(nav.find_property("BALANCE", true).as_deref(), Some("balance"));
        assert_eq!(nav.find_property("Owner.NAME", true).as_deref(), Some("owner.name"));
        assert_eq!(nav.find_property("BALANCE", false), None);
        assert_eq!(nav.find_property("nope", true), None);
    }

    #[test]
    fn invalid_paths_are_rejected() {
        let nav = Navigator::for_value(instance(&account()), &MetaContext::default());
        for path in ["history[0", "history]", "history[0]x", "history[[0]]"] {
            let err = nav.get_value(path).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidPath, "{path}");
            assert!(err.to_string().contains("on `Account`"), "{err}");
        }
        let err = nav.set_value("owner]", Value::Null).unwrap_err();
        assert!(matches!(err, ReflectionError::InvalidPath { ty: Some(ref ty), .. } if &**ty == "Account"));
    }

    #[test]
    fn maps_nested_in_objects() {
        let holder = TypeBuilder::class("Holder").property("attrs", Type::map()).build();
        let nav = Navigator::for_value(instance(&holder), &MetaContext::default());

        nav.set_value("attrs.color", Value::from("blue")).unwrap();
        assert_eq!(nav.get_value("attrs.color").unwrap(), Value::from("blue"));
        assert_eq!(nav.get_value("attrs[color]").unwrap(), Value::from("blue"));
        assert!(nav.value().as_object().unwrap().field_value("attrs").unwrap().as_map().is_some());
    }

    #[derive(Debug, Default)]
    struct CountingFactory(AtomicUsize);

    impl ObjectFactory for CountingFactory {
        fn create_with(
            &self,
            ty: &Type,
            arg_types: &[Type],
            args: &[Value],
        ) -> Result<Value, ReflectionError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            DefaultObjectFactory.create_with(ty, arg_types, args)
        }

        fn is_collection(&self, ty: &Type) -> bool {
            DefaultObjectFactory.is_collection(ty)
        }
    }

    #[test]
    fn context_policies_are_shared_by_nested_navigators() {
        let factory = Arc::new(CountingFactory::default());
        let cx = MetaContext::default()
            .with_object_factory(factory.clone())
            .with_descriptors(Arc::new(DefaultDescriptorProvider::new()));

        let shelf = TypeBuilder::class("Shelf").property("label", Type::string()).build();
        let room = TypeBuilder::class("Room").property("shelf", shelf).build();
        let house = TypeBuilder::class("House").property("room", room).build();

        let nav = Navigator::for_value(instance(&house), &cx);
        nav.set_value("room.shelf.label", Value::from("top")).unwrap();
        assert_eq!(factory.0.load(Ordering::Relaxed), 2);

        nav.set_value("room.shelf.label", Value::from("bottom")).unwrap();
        assert_eq!(factory.0.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn wrapped_takes_precedence() {
        let map = MapRef::new();
        map.insert("k", Value::Int(1));
        let value = Wrapped(Arc::new(MapWrapper::new(map))).into_value();

        let nav = Navigator::for_value(value, &MetaContext::default());
        assert_eq!(nav.get_value("k").unwrap(), Value::Int(1));
        assert!(!nav.is_collection());
    }
}
