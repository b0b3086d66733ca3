use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use mo_runtime::{Container, Type, TypeKind, Value};

use crate::ReflectionError;
use crate::accessor::retry_forced;

/// Creates instances of runtime types.
pub trait ObjectFactory: Send + Sync + fmt::Debug {
    /// Creates an instance with the zero-argument constructor.
    fn create(&self, ty: &Type) -> Result<Value, ReflectionError> {
        self.create_with(ty, &[], &[])
    }

    /// Creates an instance with the constructor taking `arg_types`.
    fn create_with(
        &self,
        ty: &Type,
        arg_types: &[Type],
        args: &[Value],
    ) -> Result<Value, ReflectionError>;

    /// Whether instances of `ty` are collections.
    fn is_collection(&self, ty: &Type) -> bool;
}

/// Instantiates types through their declared constructors.
///
/// Abstract container types are replaced by a default implementation:
///
/// | requested                          | created     |
/// |------------------------------------|-------------|
/// | `List`, `Collection`, `Iterable`   | `ArrayList` |
/// | `Map`                              | `HashMap`   |
/// | `SortedSet`                        | `TreeSet`   |
/// | `Set`                              | `HashSet`   |
///
/// # Examples
///
/// ```
/// use mo_reflect::{DefaultObjectFactory, ObjectFactory};
/// use mo_runtime::Type;
///
/// let list = DefaultObjectFactory.create(&Type::list()).unwrap();
/// assert_eq!(list.runtime_type(), Some(Type::array_list()));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultObjectFactory;

impl DefaultObjectFactory {
    /// The concrete type created when `ty` is requested.
    pub fn resolve_interface(ty: &Type) -> Type {
        match ty.kind() {
            TypeKind::Container(Container::List | Container::Collection | Container::Iterable) => {
                Type::array_list()
            }
            TypeKind::Container(Container::Map) => Type::hash_map(),
            TypeKind::Container(Container::SortedSet) => Type::tree_set(),
            TypeKind::Container(Container::Set) => Type::hash_set(),
            _ => ty.clone(),
        }
    }
}

fn render<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

impl ObjectFactory for DefaultObjectFactory {
    fn create_with(
        &self,
        ty: &Type,
        arg_types: &[Type],
        args: &[Value],
    ) -> Result<Value, ReflectionError> {
        let target = Self::resolve_interface(ty);
        let created = target
            .declared_constructor(arg_types)
            .and_then(|ctor| retry_forced(|force| ctor.new_instance(args, force)));

        created.map_err(|source| {
            log::debug!("failed to instantiate `{target}`: {source}");
            ReflectionError::Instantiation {
                ty: target.name_arc(),
                arg_types: render(arg_types),
                arg_values: render(args),
                source,
            }
        })
    }

    fn is_collection(&self, ty: &Type) -> bool {
        Type::collection().is_assignable_from(ty)
    }
}

#[cfg(test)]
mod tests {
    use mo_runtime::access::with_member_access_control;
    use mo_runtime::{MemberFlags, Type, TypeBuilder, Value};

    use super::{DefaultObjectFactory, ObjectFactory};
    use crate::ErrorKind;

    #[test]
    fn substitutes_abstract_containers() {
        let f = DefaultObjectFactory;
        let cases = [
            (Type::iterable(), Type::array_list()),
            (Type::collection(), Type::array_list()),
            (Type::list(), Type::array_list()),
            (Type::set(), Type::hash_set()),
            (Type::sorted_set(), Type::tree_set()),
            (Type::map(), Type::hash_map()),
        ];
        for (requested, created) in cases {
            assert_eq!(f.create(&requested).unwrap().runtime_type(), Some(created));
        }
    }

    #[test]
    fn constructor_with_arguments() {
        let ty = TypeBuilder::class("Money")
            .field("cents", Type::long())
            .constructor_with(&[Type::long()], MemberFlags::PUBLIC, |this, args| {
                this.set_field_value("cents", args[0].clone());
                Ok(())
            })
            .build();
        let value = DefaultObjectFactory
            .create_with(&ty, &[Type::long()], &[Value::Long(250)])
            .unwrap();
        assert_eq!(value.as_object().unwrap().field_value("cents"), Some(Value::Long(250)));
    }

    #[test]
    fn failures_are_instantiation_errors() {
        let f = DefaultObjectFactory;
        let abstract_ty = TypeBuilder::abstract_class("Shape").build();
        assert_eq!(f.create(&abstract_ty).unwrap_err().kind(), ErrorKind::Instantiation);

        let ty = TypeBuilder::class("Point").build();
        let err = f.create_with(&ty, &[Type::int()], &[Value::Int(1)]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Instantiation);
        assert!(err.to_string().contains("(int) and values (1)"), "{err}");

        assert_eq!(f.create(&Type::int()).unwrap_err().kind(), ErrorKind::Instantiation);
    }

    #[test]
    fn private_constructor_needs_privilege() {
        let ty = TypeBuilder::class("Singleton").constructor(MemberFlags::PRIVATE).build();
        assert!(with_member_access_control(true, || DefaultObjectFactory.create(&ty)).is_ok());

        let err = with_member_access_control(false, || DefaultObjectFactory.create(&ty)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Instantiation);
    }

    #[test]
    fn collection_check() {
        let f = DefaultObjectFactory;
        assert!(f.is_collection(&Type::tree_set()));
        assert!(f.is_collection(&Type::list()));
        assert!(!f.is_collection(&Type::hash_map()));
        assert!(!f.is_collection(&Type::iterable()));
    }
}
