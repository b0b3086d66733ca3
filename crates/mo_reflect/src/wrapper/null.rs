use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::LazyLock;

use mo_runtime::{Type, Value};

use super::AccessWrapper;
use crate::{Access, MetaContext, Navigator, PathSegment, ReflectionError};

/// Wrapper of the null sentinel navigator.
///
/// Reads yield null and every query reports an absent property.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NullWrapper;

static SHARED: LazyLock<Arc<NullWrapper>> = LazyLock::new(|| Arc::new(NullWrapper));

impl NullWrapper {
    pub(crate) fn shared() -> Arc<dyn AccessWrapper> {
        SHARED.clone()
    }

    fn absent(access: Access, name: &str) -> ReflectionError {
        ReflectionError::not_found(access, name, Arc::from("null"))
    }
}

impl AccessWrapper for NullWrapper {
    fn get(&self, _: &PathSegment<'_>, _: &MetaContext) -> Result<Value, ReflectionError> {
        Ok(Value::Null)
    }

    fn set(
        &self,
        segment: &PathSegment<'_>,
        _: Value,
        _: &MetaContext,
    ) -> Result<(), ReflectionError> {
        Err(Self::absent(Access::Setter, segment.indexed_name()))
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
        Err(Self::absent(Access::Getter, name))
    }

    fn setter_type(&self, name: &str, _: &MetaContext) -> Result<Type, ReflectionError> {
        Err(Self::absent(Access::Setter, name))
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
        Err(Self::absent(Access::Setter, segment.name()))
    }

    fn is_collection(&self) -> bool {
        false
    }

    fn add(&self, _: Value) -> Result<(), ReflectionError> {
        Err(ReflectionError::unsupported("add", Arc::from("null")))
    }

    fn add_all(&self, _: &[Value]) -> Result<(), ReflectionError> {
        Err(ReflectionError::unsupported("add_all", Arc::from("null")))
    }
}

#[cfg(test)]
mod tests {
    use mo_runtime::Value;

    use crate::{ErrorKind, MetaContext, Navigator};

    #[test]
    fn sentinel_reports_absence() {
        let nav = Navigator::for_value(Value::Null, &MetaContext::default());
        assert!(nav.is_null());
        assert_eq!(nav.get_value("a.b[3]").unwrap(), Value::Null);
        assert!(nav.getter_names().is_empty());
        assert!(nav.setter_names().is_empty());
        assert!(!nav.has_getter("a"));
        assert!(!nav.has_setter("a"));
        assert_eq!(nav.find_property("a", true), None);
        assert!(!nav.is_collection());

        assert_eq!(nav.getter_type("a").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(nav.setter_type("a").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(nav.set_value("a", Value::Int(1)).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(nav.add(Value::Int(1)).unwrap_err().kind(), ErrorKind::Unsupported);
    }

    #[test]
    fn sentinel_is_shared() {
        let cx = MetaContext::default();
        let a = Navigator::for_value(Value::Null, &cx);
        let b = Navigator::for_value(Value::Null, &cx);
        assert!(alloc::sync::Arc::ptr_eq(a.wrapper(), b.wrapper()));
    }
}
