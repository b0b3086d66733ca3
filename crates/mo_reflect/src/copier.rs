use mo_runtime::{Object, Type};

use crate::accessor::retry_forced;

/// Copies every field declared by `ty` and its superclasses from `source`
/// to `destination`.
///
/// Fields are read and written directly, not through accessors. Private
/// and final fields are forced when the process allows it. A field that
/// cannot be copied is skipped and the copy carries on.
///
/// # Examples
///
/// ```
/// use mo_reflect::copy_properties;
/// use mo_runtime::{Type, TypeBuilder, Value};
///
/// let ty = TypeBuilder::class("Point")
///     .field("x", Type::int())
///     .field("y", Type::int())
///     .build();
/// let new = |ty: &Type| ty.declared_constructor(&[]).unwrap().new_instance(&[], false).unwrap();
/// let (a, b) = (new(&ty), new(&ty));
/// let (a, b) = (a.as_object().unwrap(), b.as_object().unwrap());
///
/// a.set_field_value("x", Value::Int(3));
/// copy_properties(&ty, a, b);
/// assert_eq!(b.field_value("x"), Some(Value::Int(3)));
/// ```
pub fn copy_properties(ty: &Type, source: &Object, destination: &Object) {
    for current in ty.ancestors().take_while(|t| !t.is_top()) {
        for field in current.declared_fields() {
            let copied = retry_forced(|force| field.get(source, force)).and_then(|value| {
                retry_forced(|force| field.set(destination, value.clone(), force))
            });
            if let Err(err) = copied {
                log::trace!(
                    "skipped field `{}` of `{current}` while copying: {err}",
                    field.name()
                );
            }
        }
    }
}
