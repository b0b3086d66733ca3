//! Per-type property resolution.
//!
//! - [`TypeDescriptor`]: readable and writable properties of one type, with
//!   their accessors and declared types.
//! - [`DescriptorProvider`]: where descriptors come from; the default
//!   implementation memoizes them per type.
//! - [`namer`]: accessor naming rules.
//!
//! Dotted-path queries on a descriptor (`has_getter_path` and friends)
//! resolve nested properties through declared getter types.

// -----------------------------------------------------------------------------
// Modules

mod class_path;
mod descriptor;
mod provider;

pub mod namer;

// -----------------------------------------------------------------------------
// Exports

pub use descriptor::TypeDescriptor;
pub use provider::{DefaultDescriptorProvider, DescriptorProvider};
