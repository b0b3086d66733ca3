//! A small dynamic object model.
//!
//! Rust has no runtime class system, so this crate provides one: named
//! [`Type`]s with a superclass, implemented interfaces and declared
//! [`Method`]s, [`Field`]s and [`Constructor`]s, and shared [`Value`]s that
//! are instances of those types.
//!
//! It is deliberately "raw": members are enumerated as declared, invoking a
//! private member needs an explicit `force`, and nothing here knows about
//! properties. Property resolution lives in `mo_reflect`.
//!
//! # Example
//!
//! ```
//! use mo_runtime::{Type, TypeBuilder, Value};
//!
//! let user = TypeBuilder::class("User")
//!     .property("name", Type::string())
//!     .build();
//!
//! let obj = user.declared_constructor(&[]).unwrap().new_instance(&[], false).unwrap();
//! let obj = obj.as_object().unwrap();
//! obj.set_field_value("name", Value::from("ada"));
//! assert_eq!(obj.field_value("name"), Some(Value::from("ada")));
//! ```

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod error;
mod flags;
mod member;
mod ty;
mod value;

pub mod access;

// -----------------------------------------------------------------------------
// Exports

pub use builder::{MethodSpec, TypeBuilder};
pub use error::{BoxError, InvokeError};
pub use flags::MemberFlags;
pub use member::{Constructor, ConstructorBody, Field, Method, MethodBody};
pub use ty::{Container, Scalar, Type, TypeKey, TypeKind};
pub use value::{CollectionRef, MapRef, Object, Value};
