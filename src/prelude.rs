//! Commonly used items for convenient importing.
//!
//! # Usage
//!
//! ```rust
//! use dynreflect::prelude::*;
//!
//! fn shout(text: &String) -> String {
//!     text.to_uppercase()
//! }
//!
//! let registry = Registry::builder()
//!     .with_primitives()
//!     .function("shout", shout)
//!     .build();
//!
//! let mut args = [registry.wrap(String::from("hi"))];
//! let loud: Variable<'_> = registry.call_function("shout", &mut args).unwrap();
//! assert_eq!(loud.to_string(), "HI");
//! ```
//!
//! # What's Included
//!
//! - **[`Registry`]**, **[`RegistryBuilder`]** and **[`RegistryOptions`]**:
//!   building and querying registries
//! - **[`Variable`]** and **[`Value`]**: the handles every operation works on
//! - **[`ReflectError`]**: what checked operations fail with
//! - **[`IntoFunction`]** and **[`IntoMethod`]**: the binding generators, for
//!   generic code that forwards callables to a builder
//! - **[`value_param!`]**: by-value parameter support for your own types

pub use crate::{
    ReflectError, Registry, RegistryBuilder, RegistryOptions, Value, Variable,
    bindings::{IntoFunction, IntoMethod},
    value_param,
};
