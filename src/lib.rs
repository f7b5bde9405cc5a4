#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Runtime reflection for Rust values.
//!
//! ## Overview
//!
//! This crate lets a program describe its own types, functions and members
//! once, and then inspect and invoke them at runtime by name, without the
//! caller knowing the static types involved. It is meant for scripting
//! bridges, debuggers, editors and serializers that have to work on values
//! whose types are only known as data.
//!
//! Everything reachable through reflection is registered on a
//! [`RegistryBuilder`], which turns ordinary closures and methods into
//! type-erased bindings. The resulting [`Registry`] is immutable and answers
//! lookups and invocations:
//!
//! ```
//! use dynreflect::Registry;
//!
//! fn scale(factor: f64, values: &mut Vec<f64>) -> usize {
//!     values.iter_mut().for_each(|value| *value *= factor);
//!     values.len()
//! }
//!
//! let registry = Registry::builder()
//!     .with_primitives()
//!     .register_type_named::<Vec<f64>>("Vec<f64>")
//!     .function("scale", scale)
//!     .build();
//!
//! let mut args = [registry.wrap(2.0f64), registry.wrap(vec![1.0f64, 1.5])];
//! let scaled = registry.call_function("scale", &mut args).unwrap();
//!
//! assert_eq!(scaled.downcast_ref::<usize>(), Some(&2));
//! assert_eq!(args[1].downcast_ref::<Vec<f64>>(), Some(&vec![2.0, 3.0]));
//! ```
//!
//! ## Core Concepts
//!
//! - A [`Value`] owns one object of any `Clone + 'static` type. Small objects
//!   are stored inline, larger ones on the heap. [`AnyRef`] and [`AnyMut`]
//!   are the borrowed counterparts.
//! - A [`Variable`] is a [`Value`] tagged with its registered [`TypeIndex`]
//!   and the [`Registry`] it belongs to. All registry operations take and
//!   return variables.
//! - Descriptors (see [`descriptors`]) record the names, parameter types and
//!   bindings of everything registered.
//! - Parameters keep their Rust qualifier: `T`, `&T`, `&mut T`, `Option<&T>`
//!   and `Option<&mut T>` (see [`param`]). Arguments bound to mutable
//!   references are updated in place in the caller's variables.
//!
//! ## Validation
//!
//! Checked operations validate the argument count and then every argument
//! type before anything is invoked, and fail with a [`ReflectError`] wrapped
//! in a [`rootcause::Report`]. Unchecked variants skip validation and are
//! `unsafe`.
//!
//! ## Feature Flags
//!
//! - `std`: uses the standard library's `OnceLock` for the lazily built name
//!   index, and enables `std` support in the dependencies. Without it the
//!   name index is guarded by `spin`.

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// Must come first so the macros are visible to the other modules
#[macro_use]
mod macros;

pub mod bindings;
pub mod descriptors;
mod error;
pub mod handlers;
pub mod param;
pub mod prelude;
mod reference;
pub mod registry;
mod value;
mod variable;

pub use self::{
    descriptors::TypeIndex,
    error::ReflectError,
    reference::{AnyMut, AnyRef},
    registry::{ArgList, Lookup, Registry, RegistryBuilder, RegistryOptions, RegistryTables},
    value::{INLINE_CAPACITY, Value, fits_inline},
    variable::Variable,
};

/// The result of every checked reflection operation.
pub type Result<T, E = ReflectError> = core::result::Result<T, rootcause::Report<E>>;
