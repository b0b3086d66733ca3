use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{PoisonError, RwLock};

use crate::member::Storage;
use crate::ty::TypeDef;
use crate::{BoxError, Constructor, ConstructorBody, Field, MemberFlags, Method, MethodBody};
use crate::{Object, Type, TypeKind, Value};

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// -----------------------------------------------------------------------------
// MethodSpec

/// Declaration of a method, consumed by [`TypeBuilder::method`].
///
/// Methods are public and have no return type unless configured otherwise.
/// A method without a body is abstract.
pub struct MethodSpec {
    name: String,
    params: Vec<Type>,
    ret: Option<Type>,
    flags: MemberFlags,
    body: Option<MethodBody>,
}

impl MethodSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            params: Vec::new(),
            ret: None,
            flags: MemberFlags::PUBLIC,
            body: None,
        }
    }

    /// Appends a parameter.
    pub fn param(mut self, ty: Type) -> Self {
        self.params.push(ty);
        self
    }

    pub fn returns(mut self, ty: Type) -> Self {
        self.ret = Some(ty);
        self
    }

    /// Replaces the modifiers.
    pub fn flags(mut self, flags: MemberFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn body(
        mut self,
        body: impl Fn(&Object, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(Arc::new(body));
        self
    }
}

// -----------------------------------------------------------------------------
// TypeBuilder

struct FieldSpec {
    name: String,
    ty: Type,
    flags: MemberFlags,
}

struct ConstructorSpec {
    params: Vec<Type>,
    flags: MemberFlags,
    body: Option<ConstructorBody>,
}

/// Declares and defines a user type.
///
/// The type handle exists as soon as the builder does, see
/// [`handle`](Self::handle), so members may mention their own type.
///
/// # Examples
///
/// ```
/// use mo_runtime::{Type, TypeBuilder};
///
/// let node = TypeBuilder::class("Node");
/// let this = node.handle();
/// let node = node.property("next", this).property("label", Type::string()).build();
///
/// let names: Vec<_> = node.declared_methods().iter().map(|m| m.name()).collect();
/// assert_eq!(names, ["getNext", "setNext", "getLabel", "setLabel"]);
/// ```
pub struct TypeBuilder {
    ty: Type,
    flags: MemberFlags,
    superclass: Option<Type>,
    interfaces: Vec<Type>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    constructors: Vec<ConstructorSpec>,
    components: Vec<Type>,
}

impl TypeBuilder {
    fn new(name: &str, kind: TypeKind, flags: MemberFlags) -> Self {
        Self {
            ty: Type::declare(name, kind),
            flags,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(name, TypeKind::Class, MemberFlags::PUBLIC)
    }

    pub fn abstract_class(name: &str) -> Self {
        Self::new(name, TypeKind::Class, MemberFlags::PUBLIC | MemberFlags::ABSTRACT)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(name, TypeKind::Interface, MemberFlags::PUBLIC | MemberFlags::ABSTRACT)
    }

    /// A record: its state is the list of [`component`](Self::component)s,
    /// set once by the canonical constructor.
    pub fn record(name: &str) -> Self {
        Self::new(name, TypeKind::Record, MemberFlags::PUBLIC | MemberFlags::FINAL)
    }

    /// The type being built. It has no members until [`build`](Self::build).
    #[inline]
    pub fn handle(&self) -> Type {
        self.ty.clone()
    }

    pub fn extends(mut self, superclass: &Type) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    pub fn implements(mut self, interface: &Type) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Declares a private instance field.
    pub fn field(self, name: &str, ty: Type) -> Self {
        self.field_with(name, ty, MemberFlags::PRIVATE)
    }

    pub fn field_with(mut self, name: &str, ty: Type, flags: MemberFlags) -> Self {
        self.fields.push(FieldSpec {
            name: String::from(name),
            ty,
            flags,
        });
        self
    }

    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    /// Declares a public getter reading the field `name`.
    ///
    /// Boolean getters use the `is` prefix.
    pub fn getter(self, name: &str, ty: Type) -> Self {
        let prefix = if ty == Type::boolean() { "is" } else { "get" };
        let field = String::from(name);
        let spec = MethodSpec::new(&(String::from(prefix) + &capitalize(name)))
            .returns(ty)
            .body(move |this, _| Ok(this.field_value(&field).unwrap_or_default()));
        self.method(spec)
    }

    /// Declares a public setter writing the field `name`.
    pub fn setter(self, name: &str, ty: Type) -> Self {
        let field = String::from(name);
        let spec = MethodSpec::new(&(String::from("set") + &capitalize(name)))
            .param(ty)
            .body(move |this, args| {
                this.set_field_value(&field, args.first().cloned().unwrap_or_default());
                Ok(Value::Null)
            });
        self.method(spec)
    }

    /// A private field with a public getter and setter.
    pub fn property(self, name: &str, ty: Type) -> Self {
        self.field(name, ty.clone())
            .getter(name, ty.clone())
            .setter(name, ty)
    }

    /// A record component: a private final field and an accessor method
    /// named after it.
    pub fn component(mut self, name: &str, ty: Type) -> Self {
        self.components.push(ty.clone());
        let field = String::from(name);
        let accessor = MethodSpec::new(name)
            .returns(ty.clone())
            .body(move |this, _| Ok(this.field_value(&field).unwrap_or_default()));
        self.field_with(name, ty, MemberFlags::PRIVATE | MemberFlags::FINAL)
            .method(accessor)
    }

    /// Declares a zero-argument constructor with the given modifiers.
    pub fn constructor(mut self, flags: MemberFlags) -> Self {
        self.constructors.push(ConstructorSpec {
            params: Vec::new(),
            flags,
            body: None,
        });
        self
    }

    pub fn constructor_with(
        mut self,
        params: &[Type],
        flags: MemberFlags,
        body: impl Fn(&Object, &[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.constructors.push(ConstructorSpec {
            params: params.to_vec(),
            flags,
            body: Some(Arc::new(body)),
        });
        self
    }

    /// Defines the type and returns its handle.
    pub fn build(self) -> Type {
        let ty = self.ty;
        let base = self.superclass.as_ref().map_or(0, Type::instance_slots);

        let statics = Arc::new(RwLock::new(Vec::new()));
        let mut instance_slots = base;
        let mut fields = Vec::with_capacity(self.fields.len());
        for spec in self.fields {
            let storage = if spec.flags.contains(MemberFlags::STATIC) {
                let mut values = statics.write().unwrap_or_else(PoisonError::into_inner);
                values.push(spec.ty.default_value());
                Storage::Static(statics.clone(), values.len() - 1)
            } else {
                instance_slots += 1;
                Storage::Instance(instance_slots - 1)
            };
            fields.push(Field::new(&spec.name, spec.ty, spec.flags, ty.clone(), storage));
        }

        let methods = self
            .methods
            .into_iter()
            .map(|spec| {
                Method::new(&spec.name, spec.params, spec.ret, spec.flags, ty.clone(), spec.body)
            })
            .collect();

        let mut constructors: Vec<Constructor> = self
            .constructors
            .into_iter()
            .map(|spec| Constructor::new(spec.params, spec.flags, ty.clone(), spec.body))
            .collect();
        match ty.kind() {
            TypeKind::Record => {
                let slots: Vec<usize> = (base..instance_slots).collect();
                let body: ConstructorBody = Arc::new(move |this, args| {
                    for (slot, arg) in slots.iter().zip(args) {
                        this.write_slot(*slot, arg.clone());
                    }
                    Ok(())
                });
                constructors.push(Constructor::new(
                    self.components,
                    MemberFlags::PUBLIC,
                    ty.clone(),
                    Some(body),
                ));
            }
            TypeKind::Class if constructors.is_empty() => {
                constructors.push(Constructor::implicit(&ty));
            }
            _ => {}
        }

        ty.define(TypeDef {
            flags: self.flags,
            superclass: self.superclass,
            interfaces: self.interfaces,
            methods,
            fields,
            constructors,
            instance_slots,
        });
        ty
    }
}
