//! Property introspection over [`mo_runtime`] values.
//!
//! Given a value and a dotted path such as `orders[0].customer.name`, this
//! crate reads or writes the property the path names, whatever the shape of
//! the values along the way: objects are accessed through their getters,
//! setters and fields, maps through their keys, lists by position.
//!
//! The pieces, bottom up:
//!
//! - [`PathSegment`] parses paths lazily, one segment at a time.
//! - [`TypeDescriptor`] resolves which accessor reads and writes each
//!   property of a type. Descriptors are memoized by a [`DescriptorProvider`].
//! - [`AccessWrapper`] implementations give uniform access to one value:
//!   [`RecordWrapper`], [`MapWrapper`], [`CollectionWrapper`].
//! - [`Navigator`] binds a value to its wrapper and walks paths, creating
//!   missing intermediate objects with an [`ObjectFactory`] on writes.
//! - [`copy_properties`] copies fields between two instances.
//!
//! # Example
//!
//! ```
//! use mo_reflect::{ErrorKind, MetaContext, Navigator};
//! use mo_runtime::{CollectionRef, Type, TypeBuilder, Value};
//!
//! let line = TypeBuilder::class("Line").property("sku", Type::string()).build();
//! let order = TypeBuilder::class("Order")
//!     .property("lines", Type::list())
//!     .property("total", Type::double())
//!     .build();
//!
//! let new = |ty: &Type| ty.declared_constructor(&[]).unwrap().new_instance(&[], false).unwrap();
//! let nav = Navigator::for_value(new(&order), &MetaContext::default());
//!
//! nav.set_value("lines", CollectionRef::list_of([new(&line)]).into()).unwrap();
//! nav.set_value("lines[0].sku", Value::from("X-1")).unwrap();
//! assert_eq!(nav.get_value("lines[0].sku").unwrap(), Value::from("X-1"));
//! assert_eq!(nav.get_value("lines[1]").unwrap_err().kind(), ErrorKind::OutOfRange);
//! assert_eq!(nav.find_property("TOTAL", true).as_deref(), Some("total"));
//! ```

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod accessor;
mod copier;
mod error;
mod factory;
mod navigator;
mod path;
mod wrapper;

pub mod reflector;

// -----------------------------------------------------------------------------
// Exports

pub use accessor::Accessor;
pub use copier::copy_properties;
pub use error::{Access, ErrorKind, ReflectionError};
pub use factory::{DefaultObjectFactory, ObjectFactory};
pub use navigator::{MetaContext, Navigator, Wrapped};
pub use path::{PathSegment, Segments};
pub use reflector::{DefaultDescriptorProvider, DescriptorProvider, TypeDescriptor};
pub use wrapper::{AccessWrapper, CollectionWrapper, MapWrapper, RecordWrapper};
pub use wrapper::{DefaultWrapperFactory, WrapperFactory, WrapperRegistration};

#[cfg(feature = "auto_register")]
#[doc(hidden)]
pub use inventory;
