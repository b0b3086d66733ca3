use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::{LazyLock, OnceLock};

use crate::{Constructor, Field, InvokeError, MemberFlags, Method, Value};

// -----------------------------------------------------------------------------
// TypeKey

/// Process-unique identity of a [`Type`].
///
/// Hashing a key writes a single `u64`, so maps keyed by it can skip
/// rehashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeKey(u64);

impl TypeKey {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw key.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

// -----------------------------------------------------------------------------
// TypeKind

/// Built-in value-like types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Boolean,
    Int,
    Long,
    Double,
    String,
}

/// Built-in container types, both the abstract shapes and their default
/// implementations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Iterable,
    Collection,
    List,
    Set,
    SortedSet,
    Map,
    ArrayList,
    HashSet,
    TreeSet,
    HashMap,
}

impl Container {
    /// Abstract shapes cannot be instantiated directly.
    #[inline]
    pub const fn is_abstract(self) -> bool {
        matches!(
            self,
            Self::Iterable | Self::Collection | Self::List | Self::Set | Self::SortedSet | Self::Map
        )
    }
}

/// The broad category of a [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// The universal type every value is assignable to.
    Top,
    Scalar(Scalar),
    Container(Container),
    Class,
    Interface,
    /// Fixed-shape immutable class whose state is a list of components.
    Record,
}

// -----------------------------------------------------------------------------
// Type

pub(crate) struct TypeDef {
    pub flags: MemberFlags,
    pub superclass: Option<Type>,
    pub interfaces: Vec<Type>,
    pub methods: Vec<Method>,
    pub fields: Vec<Field>,
    pub constructors: Vec<Constructor>,
    pub instance_slots: usize,
}

struct TypeInner {
    key: TypeKey,
    name: Arc<str>,
    kind: TypeKind,
    def: OnceLock<TypeDef>,
}

/// A handle to a runtime type.
///
/// Handles are cheap to clone and compare by identity. A type is declared
/// first and defined once (see [`TypeBuilder`](crate::TypeBuilder)), which
/// lets members refer to the type that declares them. Until it is defined a
/// type has no supertypes and no members.
#[derive(Clone)]
pub struct Type(Arc<TypeInner>);

impl PartialEq for Type {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.key == other.0.key
    }
}

impl Eq for Type {}

impl Hash for Type {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.key.hash(state);
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self.0.name)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

impl Type {
    pub(crate) fn declare(name: &str, kind: TypeKind) -> Self {
        Self(Arc::new(TypeInner {
            key: TypeKey::next(),
            name: Arc::from(name),
            kind,
            def: OnceLock::new(),
        }))
    }

    pub(crate) fn define(&self, def: TypeDef) {
        if self.0.def.set(def).is_err() {
            log::warn!("type `{}` was defined twice, keeping the first definition", self);
        }
    }

    #[inline]
    fn def(&self) -> Option<&TypeDef> {
        self.0.def.get()
    }

    #[inline]
    pub fn key(&self) -> TypeKey {
        self.0.key
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Shared copy of the name, for error values.
    #[inline]
    pub fn name_arc(&self) -> Arc<str> {
        self.0.name.clone()
    }

    #[inline]
    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    pub fn flags(&self) -> MemberFlags {
        self.def().map_or(MemberFlags::PUBLIC, |def| def.flags)
    }

    pub fn is_interface(&self) -> bool {
        match self.kind() {
            TypeKind::Interface => true,
            TypeKind::Container(c) => c.is_abstract(),
            _ => false,
        }
    }

    /// Interfaces, abstract classes and abstract containers.
    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.flags().contains(MemberFlags::ABSTRACT)
    }

    #[inline]
    pub fn is_record(&self) -> bool {
        self.kind() == TypeKind::Record
    }

    #[inline]
    pub fn is_top(&self) -> bool {
        self.kind() == TypeKind::Top
    }

    pub fn as_scalar(&self) -> Option<Scalar> {
        match self.kind() {
            TypeKind::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn superclass(&self) -> Option<&Type> {
        self.def().and_then(|def| def.superclass.as_ref())
    }

    pub fn interfaces(&self) -> &[Type] {
        match self.def() {
            Some(def) => &def.interfaces,
            None => &[],
        }
    }

    /// Methods declared on this type only, in declaration order.
    pub fn declared_methods(&self) -> &[Method] {
        match self.def() {
            Some(def) => &def.methods,
            None => &[],
        }
    }

    /// Fields declared on this type only, in declaration order.
    pub fn declared_fields(&self) -> &[Field] {
        match self.def() {
            Some(def) => &def.fields,
            None => &[],
        }
    }

    pub fn declared_constructors(&self) -> &[Constructor] {
        match self.def() {
            Some(def) => &def.constructors,
            None => &[],
        }
    }

    /// Finds the declared constructor whose parameter types equal `params`.
    pub fn declared_constructor(&self, params: &[Type]) -> Result<Constructor, InvokeError> {
        self.declared_constructors()
            .iter()
            .find(|ctor| ctor.param_types() == params)
            .cloned()
            .ok_or_else(|| InvokeError::NoSuchConstructor {
                owner: self.name_arc(),
                params: join_names(params),
            })
    }

    /// This type followed by its superclass chain.
    pub fn ancestors(&self) -> impl Iterator<Item = Type> + use<> {
        core::iter::successors(Some(self.clone()), |ty| ty.superclass().cloned())
    }

    /// Methods of an interface including those inherited from its
    /// super-interfaces. Duplicates are not removed.
    pub fn interface_methods(&self) -> Vec<Method> {
        let mut out = Vec::new();
        self.collect_interface_methods(&mut out);
        out
    }

    fn collect_interface_methods(&self, out: &mut Vec<Method>) {
        out.extend(
            self.declared_methods()
                .iter()
                .filter(|m| !m.flags().is_private())
                .cloned(),
        );
        for parent in self.interfaces() {
            parent.collect_interface_methods(out);
        }
    }

    /// Whether a value of type `other` can be used where `self` is expected.
    ///
    /// # Examples
    ///
    /// ```
    /// use mo_runtime::Type;
    ///
    /// assert!(Type::collection().is_assignable_from(&Type::array_list()));
    /// assert!(Type::object().is_assignable_from(&Type::int()));
    /// assert!(!Type::array_list().is_assignable_from(&Type::list()));
    /// ```
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match self.kind() {
            TypeKind::Top => true,
            TypeKind::Scalar(_) => false,
            _ => other.has_supertype(self),
        }
    }

    fn has_supertype(&self, target: &Type) -> bool {
        self.superclass()
            .into_iter()
            .chain(self.interfaces())
            .any(|sup| sup == target || sup.has_supertype(target))
    }

    /// Number of instance slots, inherited ones included.
    pub fn instance_slots(&self) -> usize {
        self.def().map_or(0, |def| def.instance_slots)
    }

    /// Initial slot values for a fresh instance, root class first.
    pub(crate) fn slot_defaults(&self) -> Vec<Value> {
        let mut chain: Vec<Type> = self.ancestors().collect();
        chain.reverse();
        chain
            .iter()
            .flat_map(|ty| ty.declared_fields().iter())
            .filter(|field| !field.flags().contains(MemberFlags::STATIC))
            .map(|field| field.field_type().default_value())
            .collect()
    }

    /// Most-derived non-static method with a body matching `name(params)`.
    pub(crate) fn find_override(&self, name: &str, params: &[Type]) -> Option<Method> {
        self.ancestors().find_map(|ty| {
            ty.declared_methods()
                .iter()
                .find(|m| {
                    m.has_body()
                        && !m.flags().contains(MemberFlags::STATIC)
                        && m.name() == name
                        && m.param_types() == params
                })
                .cloned()
        })
    }

    /// Most-derived field named `name`.
    pub(crate) fn find_field(&self, name: &str) -> Option<Field> {
        self.ancestors().find_map(|ty| {
            ty.declared_fields()
                .iter()
                .find(|field| field.name() == name)
                .cloned()
        })
    }

    /// The value a slot of this type holds before anything is assigned.
    pub fn default_value(&self) -> Value {
        match self.as_scalar() {
            Some(Scalar::Boolean) => Value::Bool(false),
            Some(Scalar::Int) => Value::Int(0),
            Some(Scalar::Long) => Value::Long(0),
            Some(Scalar::Double) => Value::Double(0.0),
            Some(Scalar::String) | None => Value::Null,
        }
    }

    /// Whether `value` may be stored in a slot of this type.
    ///
    /// Integral values widen to `long` and `double`; `null` is accepted by
    /// every non-numeric type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self.as_scalar(), value) {
            (Some(Scalar::String) | None, Value::Null) => true,
            (Some(_), Value::Null) => false,
            (Some(Scalar::Long), Value::Int(_)) => true,
            (Some(Scalar::Double), Value::Int(_) | Value::Long(_)) => true,
            _ => value
                .runtime_type()
                .is_some_and(|actual| self.is_assignable_from(&actual)),
        }
    }
}

pub(crate) fn join_names(types: &[Type]) -> String {
    let mut out = String::new();
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(ty.name());
    }
    out
}

// -----------------------------------------------------------------------------
// Built-in types

struct Builtins {
    object: Type,
    boolean: Type,
    int: Type,
    long: Type,
    double: Type,
    string: Type,
    iterable: Type,
    collection: Type,
    list: Type,
    set: Type,
    sorted_set: Type,
    map: Type,
    array_list: Type,
    hash_set: Type,
    tree_set: Type,
    hash_map: Type,
}

static BUILTINS: LazyLock<Builtins> = LazyLock::new(Builtins::new);

impl Builtins {
    fn new() -> Self {
        fn define(name: &str, kind: TypeKind, interfaces: &[&Type]) -> Type {
            let ty = Type::declare(name, kind);
            let instantiable = match kind {
                TypeKind::Top => true,
                TypeKind::Container(c) => !c.is_abstract(),
                _ => false,
            };
            let constructors = if instantiable {
                alloc::vec![Constructor::implicit(&ty)]
            } else {
                Vec::new()
            };
            ty.define(TypeDef {
                flags: MemberFlags::PUBLIC,
                superclass: None,
                interfaces: interfaces.iter().map(|&t| t.clone()).collect(),
                methods: Vec::new(),
                fields: Vec::new(),
                constructors,
                instance_slots: 0,
            });
            ty
        }

        use Container as C;
        use TypeKind::{Container as K, Scalar as S};

        let iterable = define("Iterable", K(C::Iterable), &[]);
        let collection = define("Collection", K(C::Collection), &[&iterable]);
        let list = define("List", K(C::List), &[&collection]);
        let set = define("Set", K(C::Set), &[&collection]);
        let sorted_set = define("SortedSet", K(C::SortedSet), &[&set]);
        let map = define("Map", K(C::Map), &[]);

        Self {
            object: define("Object", TypeKind::Top, &[]),
            boolean: define("boolean", S(Scalar::Boolean), &[]),
            int: define("int", S(Scalar::Int), &[]),
            long: define("long", S(Scalar::Long), &[]),
            double: define("double", S(Scalar::Double), &[]),
            string: define("String", S(Scalar::String), &[]),
            array_list: define("ArrayList", K(C::ArrayList), &[&list]),
            hash_set: define("HashSet", K(C::HashSet), &[&set]),
            tree_set: define("TreeSet", K(C::TreeSet), &[&sorted_set]),
            hash_map: define("HashMap", K(C::HashMap), &[&map]),
            iterable,
            collection,
            list,
            set,
            sorted_set,
            map,
        }
    }
}

macro_rules! builtin_getters {
    ($($(#[$attr:meta])* $name:ident),* $(,)?) => {
        impl Type {
            $(
                $(#[$attr])*
                #[inline]
                pub fn $name() -> Type {
                    BUILTINS.$name.clone()
                }
            )*
        }
    };
}

builtin_getters! {
    /// The universal top type.
    object,
    boolean,
    int,
    long,
    double,
    string,
    iterable,
    collection,
    list,
    set,
    sorted_set,
    map,
    /// Default implementation of `list`, `collection` and `iterable`.
    array_list,
    hash_set,
    /// Keeps elements ordered.
    tree_set,
    hash_map,
}

#[cfg(test)]
mod tests {
    use crate::{Type, TypeBuilder, Value};

    #[test]
    fn builtin_hierarchy() {
        assert!(Type::iterable().is_assignable_from(&Type::tree_set()));
        assert!(Type::set().is_assignable_from(&Type::tree_set()));
        assert!(!Type::sorted_set().is_assignable_from(&Type::hash_set()));
        assert!(Type::map().is_assignable_from(&Type::hash_map()));
        assert!(!Type::collection().is_assignable_from(&Type::hash_map()));
        assert!(!Type::int().is_assignable_from(&Type::long()));
        assert_eq!(Type::list(), Type::list());
    }

    #[test]
    fn class_hierarchy() {
        let named = TypeBuilder::interface("Named").build();
        let base = TypeBuilder::class("Base").implements(&named).build();
        let derived = TypeBuilder::class("Derived").extends(&base).build();

        assert!(named.is_assignable_from(&derived));
        assert!(base.is_assignable_from(&derived));
        assert!(!derived.is_assignable_from(&base));
        assert_eq!(derived.ancestors().count(), 2);
    }

    #[test]
    fn accepts_widens_integers() {
        assert!(Type::long().accepts(&Value::Int(3)));
        assert!(Type::double().accepts(&Value::Long(3)));
        assert!(!Type::int().accepts(&Value::Long(3)));
        assert!(!Type::int().accepts(&Value::Null));
        assert!(Type::string().accepts(&Value::Null));
        assert!(Type::object().accepts(&Value::from("x")));
    }
}
