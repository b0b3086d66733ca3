use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use mo_runtime::{Constructor, Method, Type};
use mo_utils::hash::{HashMap, HashSet};

use super::namer;
use crate::{Access, Accessor, ReflectionError};

// -----------------------------------------------------------------------------
// Scaffolding

/// Candidate methods grouped by property name, in discovery order.
#[derive(Default)]
struct Conflicts {
    index: HashMap<String, usize>,
    groups: Vec<(String, Vec<Method>)>,
}

impl Conflicts {
    fn push(&mut self, property: String, method: Method) {
        if !namer::is_valid_property_name(&property) {
            return;
        }
        match self.index.get(&property) {
            Some(&at) => self.groups[at].1.push(method),
            None => {
                self.index.insert(property.clone(), self.groups.len());
                self.groups.push((property, vec![method]));
            }
        }
    }
}

/// Every method visible on `ty`: its own and its superclasses', each class
/// followed by the methods of the interfaces it implements.
///
/// The first method seen for a signature masks later ones, so overrides
/// hide what they override. Bridge and synthetic methods are skipped.
fn class_methods(ty: &Type) -> Vec<Method> {
    let mut seen = HashSet::default();
    let mut out = Vec::new();
    let mut add = |methods: &[Method]| {
        for m in methods {
            if !m.is_bridge() && seen.insert(m.signature()) {
                out.push(m.clone());
            }
        }
    };

    for class in ty.ancestors().take_while(|t| !t.is_top()) {
        add(class.declared_methods());
        for interface in class.interfaces() {
            add(&interface.interface_methods());
        }
    }
    out
}

// -----------------------------------------------------------------------------
// TypeDescriptor

#[derive(Debug, Clone)]
struct Property {
    accessor: Accessor,
    ty: Type,
}

/// The resolved properties of one type.
///
/// Built once per type by [`TypeDescriptor::new`] and immutable afterwards.
/// Readable and writable names are kept in the order they were resolved:
/// accessor methods first, then fields from the most-derived class up.
///
/// # Examples
///
/// ```
/// use mo_reflect::TypeDescriptor;
/// use mo_runtime::{Type, TypeBuilder};
///
/// let ty = TypeBuilder::class("User")
///     .property("name", Type::string())
///     .field("age", Type::int())
///     .build();
/// let desc = TypeDescriptor::new(&ty);
///
/// let names: Vec<&str> = desc.readable_property_names().iter().map(|n| &**n).collect();
/// assert_eq!(names, ["name", "age"]);
/// assert_eq!(desc.getter_type("age").unwrap(), Type::int());
/// assert_eq!(desc.find_property_name("NAME"), Some("name"));
/// ```
#[derive(Debug)]
pub struct TypeDescriptor {
    ty: Type,
    readable: Vec<Arc<str>>,
    writable: Vec<Arc<str>>,
    getters: HashMap<Arc<str>, Property>,
    setters: HashMap<Arc<str>, Property>,
    default_constructor: Option<Constructor>,
    case_insensitive: HashMap<String, Arc<str>>,
}

impl TypeDescriptor {
    /// Resolves every property of `ty`.
    pub fn new(ty: &Type) -> Self {
        let mut this = Self {
            ty: ty.clone(),
            readable: Vec::new(),
            writable: Vec::new(),
            getters: HashMap::default(),
            setters: HashMap::default(),
            default_constructor: ty
                .declared_constructors()
                .iter()
                .find(|c| c.param_types().is_empty())
                .cloned(),
            case_insensitive: HashMap::default(),
        };

        let methods = class_methods(ty);
        if ty.is_record() {
            this.add_record_getters(&methods);
        } else {
            this.add_getters(&methods);
            this.add_setters(&methods);
            this.add_fields();
        }

        for name in this.readable.iter().chain(&this.writable) {
            this.case_insensitive.insert(name.to_uppercase(), name.clone());
        }

        log::debug!(
            "described `{}`: {} readable, {} writable properties",
            ty,
            this.readable.len(),
            this.writable.len()
        );
        this
    }

    fn put_getter(&mut self, name: &str, accessor: Accessor, ty: Type) {
        let property = Property { accessor, ty };
        if let Some(slot) = self.getters.get_mut(name) {
            *slot = property;
        } else {
            let name: Arc<str> = Arc::from(name);
            self.readable.push(name.clone());
            self.getters.insert(name, property);
        }
    }

    fn put_setter(&mut self, name: &str, accessor: Accessor, ty: Type) {
        let property = Property { accessor, ty };
        if let Some(slot) = self.setters.get_mut(name) {
            *slot = property;
        } else {
            let name: Arc<str> = Arc::from(name);
            self.writable.push(name.clone());
            self.setters.insert(name, property);
        }
    }

    fn add_record_getters(&mut self, methods: &[Method]) {
        for m in methods {
            if m.param_types().is_empty()
                && let Some(ret) = m.return_type()
            {
                self.put_getter(m.name(), Accessor::Method(m.clone()), ret.clone());
            }
        }
    }

    fn add_getters(&mut self, methods: &[Method]) {
        let mut conflicts = Conflicts::default();
        for m in methods {
            if m.param_types().is_empty()
                && m.return_type().is_some()
                && namer::is_getter(m.name())
                && let Some(property) = namer::method_to_property(m.name())
            {
                conflicts.push(property, m.clone());
            }
        }

        for (property, candidates) in conflicts.groups {
            self.resolve_getter(&property, candidates);
        }
    }

    fn resolve_getter(&mut self, property: &str, candidates: Vec<Method>) {
        let mut candidates = candidates.into_iter();
        let Some(mut winner) = candidates.next() else {
            return;
        };
        let mut ambiguous = false;

        for candidate in candidates {
            let (Some(winner_ty), Some(candidate_ty)) = (winner.return_type(), candidate.return_type())
            else {
                continue;
            };
            if candidate_ty == winner_ty {
                if *candidate_ty != Type::boolean() {
                    ambiguous = true;
                    break;
                }
                if candidate.name().starts_with("is") {
                    winner = candidate;
                }
            } else if candidate_ty.is_assignable_from(winner_ty) {
                // The current winner is already more specific.
            } else if winner_ty.is_assignable_from(candidate_ty) {
                winner = candidate;
            } else {
                ambiguous = true;
                break;
            }
        }

        let Some(ty) = winner.return_type().cloned() else {
            return;
        };
        let accessor = if ambiguous {
            let owner = winner.declaring_type().name_arc();
            let message = format!(
                "Illegal overloaded getter method with ambiguous type for property '{property}' \
                 in class '{owner}'. This breaks the JavaBeans specification and can cause \
                 unpredictable results."
            );
            log::debug!("{message}");
            Accessor::Ambiguous {
                property: Arc::from(property),
                ty: owner,
                message: Arc::from(message),
            }
        } else {
            Accessor::Method(winner)
        };
        self.put_getter(property, accessor, ty);
    }

    fn add_setters(&mut self, methods: &[Method]) {
        let mut conflicts = Conflicts::default();
        for m in methods {
            if m.param_types().len() == 1
                && namer::is_setter(m.name())
                && let Some(property) = namer::method_to_property(m.name())
            {
                conflicts.push(property, m.clone());
            }
        }

        for (property, setters) in conflicts.groups {
            self.resolve_setter(&property, setters);
        }
    }

    fn resolve_setter(&mut self, property: &str, setters: Vec<Method>) {
        let (getter_ty, getter_ambiguous) = match self.getters.get(property) {
            Some(p) => (Some(p.ty.clone()), p.accessor.is_ambiguous()),
            None => (None, false),
        };

        let mut setter_ambiguous = false;
        let mut matched: Option<Method> = None;
        for setter in setters {
            if !getter_ambiguous && getter_ty.as_ref() == setter.param_types().first() {
                matched = Some(setter);
                break;
            }
            if !setter_ambiguous {
                matched = self.pick_better_setter(matched, setter, property);
                setter_ambiguous = matched.is_none();
            }
        }

        if let Some(setter) = matched {
            let ty = setter.param_types()[0].clone();
            self.put_setter(property, Accessor::Method(setter), ty);
        }
    }

    /// The setter with the more specific parameter type, or `None` after
    /// recording an ambiguous accessor when the types are unrelated.
    fn pick_better_setter(
        &mut self,
        current: Option<Method>,
        candidate: Method,
        property: &str,
    ) -> Option<Method> {
        let Some(current) = current else {
            return Some(candidate);
        };
        let current_ty = current.param_types()[0].clone();
        let candidate_ty = &candidate.param_types()[0];
        if current_ty.is_assignable_from(candidate_ty) {
            return Some(candidate);
        }
        if candidate_ty.is_assignable_from(&current_ty) {
            return Some(current);
        }

        let owner = candidate.declaring_type().name_arc();
        let message = format!(
            "Ambiguous setters defined for property '{property}' in class '{owner}' with types \
             '{current_ty}' and '{candidate_ty}'."
        );
        log::debug!("{message}");
        let accessor = Accessor::Ambiguous {
            property: Arc::from(property),
            ty: owner,
            message: Arc::from(message),
        };
        self.put_setter(property, accessor, current_ty);
        None
    }

    fn add_fields(&mut self) {
        let chain: Vec<Type> = self.ty.ancestors().collect();
        for class in chain {
            for field in class.declared_fields() {
                if !namer::is_valid_property_name(field.name()) {
                    continue;
                }
                let ty = field.field_type();
                if !self.setters.contains_key(field.name()) && !field.flags().is_constant() {
                    self.put_setter(field.name(), Accessor::SetField(field.clone()), ty.clone());
                }
                if !self.getters.contains_key(field.name()) {
                    self.put_getter(field.name(), Accessor::GetField(field.clone()), ty.clone());
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    fn missing(&self, access: Access, property: &str) -> ReflectionError {
        ReflectionError::not_found(access, property, self.ty.name_arc())
    }

    pub fn has_default_constructor(&self) -> bool {
        self.default_constructor.is_some()
    }

    pub fn default_constructor(&self) -> Result<&Constructor, ReflectionError> {
        self.default_constructor
            .as_ref()
            .ok_or_else(|| self.missing(Access::DefaultConstructor, "<init>"))
    }

    pub fn readable_property_names(&self) -> &[Arc<str>] {
        &self.readable
    }

    pub fn writable_property_names(&self) -> &[Arc<str>] {
        &self.writable
    }

    #[inline]
    pub fn has_getter(&self, property: &str) -> bool {
        self.getters.contains_key(property)
    }

    #[inline]
    pub fn has_setter(&self, property: &str) -> bool {
        self.setters.contains_key(property)
    }

    pub fn get_accessor(&self, property: &str) -> Result<&Accessor, ReflectionError> {
        self.getters
            .get(property)
            .map(|p| &p.accessor)
            .ok_or_else(|| self.missing(Access::Getter, property))
    }

    pub fn set_accessor(&self, property: &str) -> Result<&Accessor, ReflectionError> {
        self.setters
            .get(property)
            .map(|p| &p.accessor)
            .ok_or_else(|| self.missing(Access::Setter, property))
    }

    pub fn getter_type(&self, property: &str) -> Result<Type, ReflectionError> {
        self.getters
            .get(property)
            .map(|p| p.ty.clone())
            .ok_or_else(|| self.missing(Access::Getter, property))
    }

    pub fn setter_type(&self, property: &str) -> Result<Type, ReflectionError> {
        self.setters
            .get(property)
            .map(|p| p.ty.clone())
            .ok_or_else(|| self.missing(Access::Setter, property))
    }

    /// Canonical spelling of a readable or writable property, ignoring case.
    pub fn find_property_name(&self, name: &str) -> Option<&str> {
        self.case_insensitive
            .get(&name.to_uppercase())
            .map(|canonical| &**canonical)
    }
}
