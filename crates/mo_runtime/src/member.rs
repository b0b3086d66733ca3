use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use std::sync::{PoisonError, RwLock};

use crate::ty::join_names;
use crate::{BoxError, CollectionRef, Container, InvokeError, MapRef};
use crate::{MemberFlags, Object, Type, TypeKind, Value};

/// Body of a method: receives the receiver and the arguments.
pub type MethodBody = Arc<dyn Fn(&Object, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// Body of a constructor, run on a freshly allocated instance.
pub type ConstructorBody = Arc<dyn Fn(&Object, &[Value]) -> Result<(), BoxError> + Send + Sync>;

const CONSTRUCTOR_NAME: &str = "<init>";

fn check_args(
    owner: &Type,
    member: &str,
    params: &[Type],
    args: &[Value],
) -> Result<(), InvokeError> {
    let illegal = |reason: String| InvokeError::IllegalArgument {
        owner: owner.name_arc(),
        member: Arc::from(member),
        reason,
    };

    if params.len() != args.len() {
        return Err(illegal(format!(
            "expected {} argument(s), got {}",
            params.len(),
            args.len()
        )));
    }
    for (param, arg) in params.iter().zip(args) {
        if !param.accepts(arg) {
            return Err(illegal(format!("`{arg}` is not a `{param}`")));
        }
    }
    Ok(())
}

fn check_receiver(owner: &Type, member: &str, target: &Object) -> Result<(), InvokeError> {
    let actual = target.ty();
    if owner.is_assignable_from(&actual) {
        Ok(())
    } else {
        Err(InvokeError::IllegalArgument {
            owner: owner.name_arc(),
            member: Arc::from(member),
            reason: format!("receiver of type `{actual}` is not a `{owner}`"),
        })
    }
}

// -----------------------------------------------------------------------------
// Method

struct MethodInner {
    name: Arc<str>,
    params: Vec<Type>,
    ret: Option<Type>,
    flags: MemberFlags,
    declaring: Type,
    body: Option<MethodBody>,
}

/// A declared method.
#[derive(Clone)]
pub struct Method(Arc<MethodInner>);

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Method({}.{})", self.0.declaring, self.signature())
    }
}

impl Method {
    pub(crate) fn new(
        name: &str,
        params: Vec<Type>,
        ret: Option<Type>,
        flags: MemberFlags,
        declaring: Type,
        body: Option<MethodBody>,
    ) -> Self {
        Self(Arc::new(MethodInner {
            name: Arc::from(name),
            params,
            ret,
            flags,
            declaring,
            body,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn param_types(&self) -> &[Type] {
        &self.0.params
    }

    /// `None` for a method that returns nothing.
    #[inline]
    pub fn return_type(&self) -> Option<&Type> {
        self.0.ret.as_ref()
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.0.flags
    }

    #[inline]
    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring
    }

    #[inline]
    pub(crate) fn has_body(&self) -> bool {
        self.0.body.is_some()
    }

    /// Bridge and synthetic methods are generated forwards, not real members.
    #[inline]
    pub fn is_bridge(&self) -> bool {
        self.0
            .flags
            .intersects(MemberFlags::BRIDGE.union(MemberFlags::SYNTHETIC))
    }

    /// `return#name:param,param`, unique per overridable member.
    ///
    /// # Examples
    ///
    /// ```
    /// use mo_runtime::{MethodSpec, Type, TypeBuilder};
    ///
    /// let ty = TypeBuilder::class("Account")
    ///     .method(MethodSpec::new("setId").param(Type::long()))
    ///     .build();
    /// assert_eq!(ty.declared_methods()[0].signature(), "void#setId:long");
    /// ```
    pub fn signature(&self) -> String {
        let ret = self.0.ret.as_ref().map_or("void", Type::name);
        let mut out = format!("{ret}#{}", self.0.name);
        if !self.0.params.is_empty() {
            out.push(':');
            out.push_str(&join_names(&self.0.params));
        }
        out
    }

    /// Invokes the method on `target`.
    ///
    /// Private methods fail with [`InvokeError::IllegalAccess`] unless
    /// `force` is set. Overridable methods dispatch on the runtime type of
    /// `target`.
    pub fn invoke(&self, target: &Object, args: &[Value], force: bool) -> Result<Value, InvokeError> {
        let inner = &self.0;
        if inner.flags.is_private() && !force {
            return Err(InvokeError::IllegalAccess {
                owner: inner.declaring.name_arc(),
                member: inner.name.clone(),
            });
        }
        check_args(&inner.declaring, &inner.name, &inner.params, args)?;

        let dispatched = if inner.flags.contains(MemberFlags::STATIC) {
            inner.body.clone()
        } else {
            check_receiver(&inner.declaring, &inner.name, target)?;
            if inner.flags.is_private() {
                inner.body.clone()
            } else {
                target
                    .ty()
                    .find_override(&inner.name, &inner.params)
                    .and_then(|m| m.0.body.clone())
                    .or_else(|| inner.body.clone())
            }
        };

        let body = dispatched.ok_or_else(|| InvokeError::Abstract {
            owner: inner.declaring.name_arc(),
            member: inner.name.clone(),
        })?;
        body(target, args).map_err(InvokeError::target)
    }
}

// -----------------------------------------------------------------------------
// Field

pub(crate) enum Storage {
    Instance(usize),
    Static(Arc<RwLock<Vec<Value>>>, usize),
}

struct FieldInner {
    name: Arc<str>,
    ty: Type,
    flags: MemberFlags,
    declaring: Type,
    storage: Storage,
}

/// A declared data member.
#[derive(Clone)]
pub struct Field(Arc<FieldInner>);

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({}.{}: {})", self.0.declaring, self.0.name, self.0.ty)
    }
}

impl Field {
    pub(crate) fn new(
        name: &str,
        ty: Type,
        flags: MemberFlags,
        declaring: Type,
        storage: Storage,
    ) -> Self {
        Self(Arc::new(FieldInner {
            name: Arc::from(name),
            ty,
            flags,
            declaring,
            storage,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[inline]
    pub fn field_type(&self) -> &Type {
        &self.0.ty
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.0.flags
    }

    #[inline]
    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring
    }

    /// Reads the field, skipping access checks.
    pub(crate) fn load(&self, target: &Object) -> Value {
        match &self.0.storage {
            Storage::Instance(slot) => target.read_slot(*slot),
            Storage::Static(slots, index) => slots
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(*index)
                .cloned()
                .unwrap_or_default(),
        }
    }

    /// Writes the field, skipping access checks.
    pub(crate) fn store(&self, target: &Object, value: Value) {
        match &self.0.storage {
            Storage::Instance(slot) => target.write_slot(*slot, value),
            Storage::Static(slots, index) => {
                if let Some(entry) = slots
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_mut(*index)
                {
                    *entry = value;
                }
            }
        }
    }

    fn illegal_access(&self) -> InvokeError {
        InvokeError::IllegalAccess {
            owner: self.0.declaring.name_arc(),
            member: self.0.name.clone(),
        }
    }

    fn check_target(&self, target: &Object) -> Result<(), InvokeError> {
        match self.0.storage {
            Storage::Instance(_) => check_receiver(&self.0.declaring, &self.0.name, target),
            Storage::Static(..) => Ok(()),
        }
    }

    /// Reads the field of `target`; static fields ignore the target.
    pub fn get(&self, target: &Object, force: bool) -> Result<Value, InvokeError> {
        if self.0.flags.is_private() && !force {
            return Err(self.illegal_access());
        }
        self.check_target(target)?;
        Ok(self.load(target))
    }

    /// Assigns the field of `target`.
    ///
    /// Constants and record components are never assignable. Other final
    /// fields, like private ones, need `force`.
    pub fn set(&self, target: &Object, value: Value, force: bool) -> Result<(), InvokeError> {
        let flags = self.0.flags;
        if flags.is_constant() || self.0.declaring.is_record() {
            return Err(InvokeError::Immutable {
                owner: self.0.declaring.name_arc(),
                member: self.0.name.clone(),
            });
        }
        if (flags.is_private() || flags.contains(MemberFlags::FINAL)) && !force {
            return Err(self.illegal_access());
        }
        self.check_target(target)?;
        check_args(
            &self.0.declaring,
            &self.0.name,
            core::slice::from_ref(&self.0.ty),
            core::slice::from_ref(&value),
        )?;
        self.store(target, value);
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Constructor

struct ConstructorInner {
    params: Vec<Type>,
    flags: MemberFlags,
    declaring: Type,
    body: Option<ConstructorBody>,
}

/// A declared constructor.
#[derive(Clone)]
pub struct Constructor(Arc<ConstructorInner>);

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({}({}))", self.0.declaring, join_names(&self.0.params))
    }
}

impl Constructor {
    pub(crate) fn new(
        params: Vec<Type>,
        flags: MemberFlags,
        declaring: Type,
        body: Option<ConstructorBody>,
    ) -> Self {
        Self(Arc::new(ConstructorInner {
            params,
            flags,
            declaring,
            body,
        }))
    }

    /// The public zero-argument constructor of a type that declares none.
    pub(crate) fn implicit(declaring: &Type) -> Self {
        Self::new(Vec::new(), MemberFlags::PUBLIC, declaring.clone(), None)
    }

    #[inline]
    pub fn param_types(&self) -> &[Type] {
        &self.0.params
    }

    #[inline]
    pub fn flags(&self) -> MemberFlags {
        self.0.flags
    }

    #[inline]
    pub fn declaring_type(&self) -> &Type {
        &self.0.declaring
    }

    /// Creates a new instance of the declaring type.
    pub fn new_instance(&self, args: &[Value], force: bool) -> Result<Value, InvokeError> {
        let inner = &self.0;
        let ty = &inner.declaring;
        if inner.flags.is_private() && !force {
            return Err(InvokeError::IllegalAccess {
                owner: ty.name_arc(),
                member: Arc::from(CONSTRUCTOR_NAME),
            });
        }
        check_args(ty, CONSTRUCTOR_NAME, &inner.params, args)?;

        let not_instantiable = || InvokeError::Abstract {
            owner: ty.name_arc(),
            member: Arc::from(CONSTRUCTOR_NAME),
        };
        if ty.is_abstract() {
            return Err(not_instantiable());
        }

        match ty.kind() {
            TypeKind::Container(Container::HashMap) => Ok(Value::Map(MapRef::new())),
            TypeKind::Container(_) => Ok(Value::Collection(CollectionRef::with_type(ty.clone()))),
            TypeKind::Scalar(_) | TypeKind::Interface => Err(not_instantiable()),
            TypeKind::Top | TypeKind::Class | TypeKind::Record => {
                let obj = Object::allocate(ty);
                if let Some(body) = &inner.body {
                    body(&obj, args).map_err(InvokeError::target)?;
                }
                Ok(Value::Object(obj))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{InvokeError, MemberFlags, MethodSpec, Type, TypeBuilder, Value};

    fn instance(ty: &Type) -> crate::Object {
        let value = ty.declared_constructor(&[]).unwrap().new_instance(&[], true).unwrap();
        value.as_object().unwrap().clone()
    }

    #[test]
    fn private_method_needs_force() {
        let ty = TypeBuilder::class("Secret")
            .method(
                MethodSpec::new("reveal")
                    .returns(Type::int())
                    .flags(MemberFlags::PRIVATE)
                    .body(|_, _| Ok(Value::Int(42))),
            )
            .build();
        let obj = instance(&ty);
        let reveal = &ty.declared_methods()[0];

        assert!(reveal.invoke(&obj, &[], false).unwrap_err().is_illegal_access());
        assert_eq!(reveal.invoke(&obj, &[], true).unwrap(), Value::Int(42));
    }

    #[test]
    fn dispatches_on_runtime_type() {
        let shape = TypeBuilder::abstract_class("Shape")
            .method(MethodSpec::new("area").returns(Type::double()))
            .build();
        let square = TypeBuilder::class("Square")
            .extends(&shape)
            .method(
                MethodSpec::new("area")
                    .returns(Type::double())
                    .body(|_, _| Ok(Value::Double(4.0))),
            )
            .build();

        let area = &shape.declared_methods()[0];
        assert_eq!(area.invoke(&instance(&square), &[], false).unwrap(), Value::Double(4.0));

        let bare = crate::Object::allocate(&shape);
        assert!(matches!(
            area.invoke(&bare, &[], false),
            Err(InvokeError::Abstract { .. })
        ));
    }

    #[test]
    fn argument_and_receiver_checks() {
        let ty = TypeBuilder::class("Counter").property("count", Type::int()).build();
        let other = TypeBuilder::class("Other").build();
        let set = &ty.declared_methods()[1];

        let err = set.invoke(&instance(&ty), &[Value::from("x")], false).unwrap_err();
        assert!(matches!(err, InvokeError::IllegalArgument { .. }));
        let err = set.invoke(&instance(&other), &[Value::Int(1)], false).unwrap_err();
        assert!(matches!(err, InvokeError::IllegalArgument { .. }));
    }

    #[test]
    fn failing_body_is_target() {
        let ty = TypeBuilder::class("Broken")
            .method(MethodSpec::new("boom").body(|_, _| Err("boom".into())))
            .build();
        let err = ty.declared_methods()[0].invoke(&instance(&ty), &[], false).unwrap_err();
        assert!(matches!(err, InvokeError::Target(ref e) if e.to_string() == "boom"));
    }

    #[test]
    fn field_modifiers() {
        let ty = TypeBuilder::class("Config")
            .field("hidden", Type::int())
            .field_with("LIMIT", Type::int(), MemberFlags::PUBLIC | MemberFlags::STATIC | MemberFlags::FINAL)
            .field_with("shared", Type::string(), MemberFlags::PUBLIC | MemberFlags::STATIC)
            .build();
        let a = instance(&ty);
        let b = instance(&ty);
        let [hidden, limit, shared] = ty.declared_fields() else {
            panic!("expected three fields");
        };

        assert!(hidden.set(&a, Value::Int(1), false).unwrap_err().is_illegal_access());
        hidden.set(&a, Value::Int(1), true).unwrap();
        assert_eq!(hidden.get(&a, true).unwrap(), Value::Int(1));

        assert!(matches!(
            limit.set(&a, Value::Int(1), true),
            Err(InvokeError::Immutable { .. })
        ));

        shared.set(&a, Value::from("s"), false).unwrap();
        assert_eq!(shared.get(&b, false).unwrap(), Value::from("s"));
    }
}
