use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::cmp::Ordering;
use core::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{Container, Type, TypeKind};

#[inline]
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed value.
///
/// Scalars are stored inline. [`Object`], [`CollectionRef`] and [`MapRef`]
/// are shared handles: cloning a `Value` clones the handle, and mutation
/// through one clone is visible through all others.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    Str(Arc<str>),
    Object(Object),
    Collection(CollectionRef),
    Map(MapRef),
    /// A foreign value the runtime knows nothing about.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    #[inline]
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    #[inline]
    pub fn downcast_opaque<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(any) => any.downcast_ref(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[inline]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    pub fn as_collection(&self) -> Option<&CollectionRef> {
        match self {
            Self::Collection(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The dynamic type of the value; `None` for null.
    ///
    /// Opaque values report the top type.
    pub fn runtime_type(&self) -> Option<Type> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => Type::boolean(),
            Self::Int(_) => Type::int(),
            Self::Long(_) => Type::long(),
            Self::Double(_) => Type::double(),
            Self::Str(_) => Type::string(),
            Self::Object(obj) => obj.ty().clone(),
            Self::Collection(c) => c.ty().clone(),
            Self::Map(_) => Type::hash_map(),
            Self::Opaque(_) => Type::object(),
        })
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Long(_) | Self::Double(_) => 2,
            Self::Str(_) => 3,
            _ => 4,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(f64::from(v)),
            Self::Long(v) => Some(v as f64),
            Self::Double(v) => Some(v),
            _ => None,
        }
    }

    /// Identity of a handle without touching its contents.
    fn handle_key(&self) -> (&str, usize) {
        match self {
            Self::Object(obj) => (obj.ty().name(), Arc::as_ptr(&obj.0).addr()),
            Self::Collection(c) => (c.ty().name(), Arc::as_ptr(&c.0).addr()),
            Self::Map(m) => ("HashMap", Arc::as_ptr(&m.0).addr()),
            Self::Opaque(any) => ("", Arc::as_ptr(any).addr()),
            _ => ("", 0),
        }
    }

    /// Total order used by sorted collections.
    ///
    /// Null sorts first, then booleans, numbers, strings, and finally handles
    /// ordered by type name and then by address. Handle order is stable for
    /// the life of the handles but not across runs. No lock is taken, so a
    /// sorted set may hold itself.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Long(a), Self::Long(b)) => a.cmp(b),
            (Self::Str(a), Self::Str(b)) => a.cmp(b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a.total_cmp(&b),
                _ => self
                    .rank()
                    .cmp(&other.rank())
                    .then_with(|| self.handle_key().cmp(&other.handle_key())),
            },
        }
    }
}

impl PartialEq for Value {
    /// Scalars compare by value, handles by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Long(a), Self::Long(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Collection(a), Self::Collection(b)) => a.ptr_eq(b),
            (Self::Map(a), Self::Map(b)) => a.ptr_eq(b),
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    /// Containers render shallowly so cyclic graphs stay printable.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
            Self::Object(obj) => write!(f, "{}@{:p}", obj.ty(), Arc::as_ptr(&obj.0)),
            Self::Collection(c) => write!(f, "{}[len={}]", c.ty(), c.len()),
            Self::Map(m) => write!(f, "HashMap[len={}]", m.len()),
            Self::Opaque(_) => f.write_str("<opaque>"),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(v) => write!(f, "Str({v:?})"),
            other => write!(f, "{other}"),
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Long,
    f64 => Double,
    &str => Str,
    String => Str,
    Arc<str> => Str,
    Object => Object,
    CollectionRef => Collection,
    MapRef => Map,
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

// -----------------------------------------------------------------------------
// Object

struct ObjectInner {
    ty: Type,
    slots: RwLock<Vec<Value>>,
}

/// Shared handle to an instance of a class or record.
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}@{:p})", self.0.ty, Arc::as_ptr(&self.0))
    }
}

impl Object {
    /// Allocates an instance with every slot at its default value.
    ///
    /// No constructor runs.
    pub fn allocate(ty: &Type) -> Self {
        Self(Arc::new(ObjectInner {
            ty: ty.clone(),
            slots: RwLock::new(ty.slot_defaults()),
        }))
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.0.ty
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn read_slot(&self, slot: usize) -> Value {
        read(&self.0.slots).get(slot).cloned().unwrap_or_default()
    }

    pub(crate) fn write_slot(&self, slot: usize, value: Value) {
        if let Some(entry) = write(&self.0.slots).get_mut(slot) {
            *entry = value;
        }
    }

    /// Reads the most-derived field named `name`, ignoring visibility.
    ///
    /// Meant for member bodies and tests; property access goes through
    /// `mo_reflect`.
    pub fn field_value(&self, name: &str) -> Option<Value> {
        self.0.ty.find_field(name).map(|field| field.load(self))
    }

    /// Writes the most-derived field named `name`, ignoring visibility and
    /// finality. Returns `false` when there is no such field.
    pub fn set_field_value(&self, name: &str, value: Value) -> bool {
        match self.0.ty.find_field(name) {
            Some(field) => {
                field.store(self, value);
                true
            }
            None => false,
        }
    }
}

// -----------------------------------------------------------------------------
// CollectionRef

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Discipline {
    Sequence,
    Unique,
    Sorted,
}

struct CollectionInner {
    ty: Type,
    discipline: Discipline,
    items: RwLock<Vec<Value>>,
}

/// Shared handle to an ordered collection.
///
/// The element discipline follows the collection type: sets reject
/// duplicates, sorted sets keep their elements ordered by
/// [`Value::compare`].
#[derive(Clone)]
pub struct CollectionRef(Arc<CollectionInner>);

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(read(&self.0.items).iter()).finish()
    }
}

impl CollectionRef {
    pub(crate) fn with_type(ty: Type) -> Self {
        let discipline = match ty.kind() {
            TypeKind::Container(Container::Set | Container::HashSet) => Discipline::Unique,
            TypeKind::Container(Container::SortedSet | Container::TreeSet) => Discipline::Sorted,
            _ => Discipline::Sequence,
        };
        Self(Arc::new(CollectionInner {
            ty,
            discipline,
            items: RwLock::new(Vec::new()),
        }))
    }

    #[inline]
    pub fn new_list() -> Self {
        Self::with_type(Type::array_list())
    }

    /// A list holding `items` in order.
    pub fn list_of(items: impl IntoIterator<Item = Value>) -> Self {
        let list = Self::new_list();
        write(&list.0.items).extend(items);
        list
    }

    #[inline]
    pub fn new_hash_set() -> Self {
        Self::with_type(Type::hash_set())
    }

    #[inline]
    pub fn new_tree_set() -> Self {
        Self::with_type(Type::tree_set())
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.0.ty
    }

    /// Whether elements can be replaced by position.
    #[inline]
    pub fn is_indexable(&self) -> bool {
        self.0.discipline == Discipline::Sequence
    }

    #[inline]
    pub fn len(&self) -> usize {
        read(&self.0.items).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.0.items).get(index).cloned()
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// Returns `None` when `index` is out of bounds.
    pub fn set(&self, index: usize, value: Value) -> Option<Value> {
        let mut items = write(&self.0.items);
        let slot = items.get_mut(index)?;
        Some(core::mem::replace(slot, value))
    }

    /// Adds `value`, returning `false` if a set already contained it.
    pub fn push(&self, value: Value) -> bool {
        let mut items = write(&self.0.items);
        match self.0.discipline {
            Discipline::Sequence => {
                items.push(value);
                true
            }
            Discipline::Unique => {
                if items.contains(&value) {
                    return false;
                }
                items.push(value);
                true
            }
            Discipline::Sorted => match items.binary_search_by(|probe| probe.compare(&value)) {
                Ok(_) => false,
                Err(pos) => {
                    items.insert(pos, value);
                    true
                }
            },
        }
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        read(&self.0.items).clone()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// -----------------------------------------------------------------------------
// MapRef

/// Shared handle to a string-keyed map.
#[derive(Clone, Default)]
pub struct MapRef(Arc<RwLock<BTreeMap<String, Value>>>);

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(read(&self.0).iter()).finish()
    }
}

impl MapRef {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        read(&self.0).get(key).cloned()
    }

    /// Inserts `value`, returning the previous value for `key`.
    pub fn insert(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        write(&self.0).insert(key.into(), value)
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        write(&self.0).remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        read(&self.0).contains_key(key)
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        read(&self.0).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        read(&self.0).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use core::cmp::Ordering;

    use super::{CollectionRef, MapRef, Value};
    use crate::Type;

    #[test]
    fn handles_compare_by_identity() {
        let a = MapRef::new();
        let b = MapRef::new();
        assert_eq!(Value::Map(a.clone()), Value::Map(a.clone()));
        assert_ne!(Value::Map(a), Value::Map(b));
        assert_eq!(Value::from("x"), Value::from(String::from("x")));
    }

    #[test]
    fn set_disciplines() {
        let set = CollectionRef::new_hash_set();
        assert!(set.push(Value::Int(1)));
        assert!(!set.push(Value::Int(1)));
        assert_eq!(set.len(), 1);

        let sorted = CollectionRef::new_tree_set();
        for v in [3, 1, 2, 1] {
            sorted.push(Value::Int(v));
        }
        assert_eq!(sorted.to_vec(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert_eq!(sorted.ty(), &Type::tree_set());
    }

    #[test]
    fn sorted_set_may_hold_itself() {
        let set = CollectionRef::new_tree_set();
        assert!(set.push(Value::Collection(set.clone())));

        let worker = {
            let set = set.clone();
            std::thread::spawn(move || set.push(Value::Collection(CollectionRef::new_tree_set())))
        };
        assert!(worker.join().unwrap());
        assert_eq!(set.len(), 2);
        assert!(!set.push(Value::Collection(set.clone())));
    }

    #[test]
    fn handles_order_by_type_then_address() {
        let a = MapRef::new();
        let b = MapRef::new();
        let (a, b) = (Value::Map(a), Value::Map(b));
        assert_eq!(a.compare(&a.clone()), Ordering::Equal);
        assert_eq!(a.compare(&b), b.compare(&a).reverse());
        assert_ne!(a.compare(&b), Ordering::Equal);

        let list = Value::Collection(CollectionRef::new_list());
        assert_eq!(list.compare(&a), Ordering::Less);
        assert_eq!(Value::from("z").compare(&list), Ordering::Less);
    }

    #[test]
    fn list_set_in_bounds_only() {
        let list = CollectionRef::list_of([Value::Int(1)]);
        assert_eq!(list.set(0, Value::Int(5)), Some(Value::Int(1)));
        assert_eq!(list.set(3, Value::Int(5)), None);
        assert_eq!(list.get(0), Some(Value::Int(5)));
    }

    #[test]
    fn runtime_types() {
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(Value::Long(1).runtime_type(), Some(Type::long()));
        assert_eq!(Value::Map(MapRef::new()).runtime_type(), Some(Type::hash_map()));
        assert_eq!(Value::opaque(3_u8).runtime_type(), Some(Type::object()));
        assert_eq!(Value::opaque(3_u8).downcast_opaque::<u8>(), Some(&3));
    }
}
