use alloc::sync::Arc;
use core::fmt;

use mo_runtime::access::can_control_member_accessible;
use mo_runtime::{Field, InvokeError, Method, Object, Value};

use crate::ReflectionError;

/// Runs `op` without forcing visibility and, if it was refused for access
/// reasons, once more with forcing when the process allows it.
///
/// When forcing is not allowed the original refusal is returned.
pub(crate) fn retry_forced<T>(
    mut op: impl FnMut(bool) -> Result<T, InvokeError>,
) -> Result<T, InvokeError> {
    match op(false) {
        Err(err) if err.is_illegal_access() => {
            if can_control_member_accessible() {
                op(true)
            } else {
                Err(err)
            }
        }
        other => other,
    }
}

/// A resolved way to read or write one property.
///
/// Accessors are chosen once, when a type is described. A property whose
/// candidates conflict gets an [`Accessor::Ambiguous`] which fails every
/// time it is invoked.
#[derive(Clone)]
pub enum Accessor {
    /// A getter (no arguments) or a setter (one argument).
    Method(Method),
    GetField(Field),
    SetField(Field),
    Ambiguous {
        property: Arc<str>,
        ty: Arc<str>,
        message: Arc<str>,
    },
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(m) => f.debug_tuple("Method").field(m).finish(),
            Self::GetField(field) => f.debug_tuple("GetField").field(field).finish(),
            Self::SetField(field) => f.debug_tuple("SetField").field(field).finish(),
            Self::Ambiguous { property, .. } => {
                f.debug_struct("Ambiguous").field("property", property).finish_non_exhaustive()
            }
        }
    }
}

impl Accessor {
    #[inline]
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }

    /// Name of the underlying member, or of the property when ambiguous.
    pub fn member_name(&self) -> &str {
        match self {
            Self::Method(m) => m.name(),
            Self::GetField(field) | Self::SetField(field) => field.name(),
            Self::Ambiguous { property, .. } => property,
        }
    }

    /// Invokes the accessor on `target`.
    ///
    /// Getters take no arguments and return the value; setters take the new
    /// value and return [`Value::Null`].
    pub fn invoke(&self, target: &Object, args: &[Value]) -> Result<Value, ReflectionError> {
        let result = match self {
            Self::Method(m) => retry_forced(|force| m.invoke(target, args, force)),
            Self::GetField(field) => retry_forced(|force| field.get(target, force)),
            Self::SetField(field) => {
                let value = args.first().cloned().unwrap_or_default();
                retry_forced(|force| field.set(target, value.clone(), force).map(|()| Value::Null))
            }
            Self::Ambiguous {
                property,
                ty,
                message,
            } => {
                return Err(ReflectionError::Ambiguous {
                    property: property.clone(),
                    ty: ty.clone(),
                    message: message.clone(),
                });
            }
        };
        result.map_err(|err| {
            ReflectionError::invocation(self.member_name(), target.ty().name_arc(), err)
        })
    }
}

#[cfg(test)]
mod tests {
    use mo_runtime::access::with_member_access_control;
    use mo_runtime::{MemberFlags, MethodSpec, Type, TypeBuilder, Value};

    use super::Accessor;
    use crate::ErrorKind;

    fn secret() -> (Type, mo_runtime::Object) {
        let ty = TypeBuilder::class("Vault")
            .field("code", Type::int())
            .method(
                MethodSpec::new("getCode")
                    .returns(Type::int())
                    .flags(MemberFlags::PRIVATE)
                    .body(|this, _| Ok(this.field_value("code").unwrap_or_default())),
            )
            .build();
        let obj = mo_runtime::Object::allocate(&ty);
        obj.set_field_value("code", Value::Int(7));
        (ty, obj)
    }

    #[test]
    fn private_members_are_forced_when_allowed() {
        let (ty, obj) = secret();
        let getter = Accessor::Method(ty.declared_methods()[0].clone());
        let field = Accessor::SetField(ty.declared_fields()[0].clone());

        with_member_access_control(true, || {
            assert_eq!(getter.invoke(&obj, &[]).unwrap(), Value::Int(7));
            field.invoke(&obj, &[Value::Int(9)]).unwrap();
            assert_eq!(getter.invoke(&obj, &[]).unwrap(), Value::Int(9));
        });
    }

    #[test]
    fn refusal_propagates_without_privilege() {
        let (ty, obj) = secret();
        let getter = Accessor::Method(ty.declared_methods()[0].clone());

        let err = with_member_access_control(false, || getter.invoke(&obj, &[])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invocation);
    }

    #[test]
    fn body_failure_is_unwrapped() {
        let ty = TypeBuilder::class("Faulty")
            .method(
                MethodSpec::new("getValue")
                    .returns(Type::int())
                    .body(|_, _| Err("disk on fire".into())),
            )
            .build();
        let obj = mo_runtime::Object::allocate(&ty);
        let err = Accessor::Method(ty.declared_methods()[0].clone())
            .invoke(&obj, &[])
            .unwrap_err();
        assert!(err.to_string().ends_with("disk on fire"), "{err}");
    }

    #[test]
    fn ambiguous_always_fails() {
        let (_, obj) = secret();
        let acc = Accessor::Ambiguous {
            property: "code".into(),
            ty: "Vault".into(),
            message: "conflict".into(),
        };
        assert_eq!(acc.invoke(&obj, &[]).unwrap_err().kind(), ErrorKind::Ambiguous);
    }
}
