#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`dynreflect`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased value storage and the unsafe
//! operations that power the [`dynreflect`] runtime reflection library. Every
//! argument and every result that crosses a reflected call travels through the
//! types defined here.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`dynreflect`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`value`]**: Owned, type-erased value storage
//!   - [`RawValue`]: Empty, void, inline (small-buffer) or boxed payload
//!   - [`ValueVtable`]: Function pointers for type-erased clone and drop
//!   - [`InlineBuffer`]: The fixed-capacity inline storage
//!
//! - **[`reference`]**: Non-owning, type-erased pointers to existing values
//!   - [`RawValueRef`]: Shared reference, freely copyable
//!   - [`RawValueMut`]: Exclusive reference with reborrowing
//!
//! # Safety Strategy
//!
//! The concrete type of a stored value is forgotten at the erasure site. Only a
//! `&'static` [`ValueVtable`] instantiated for that exact type travels with the
//! payload, so every clone, drop and downcast is dispatched through functions
//! that were monomorphized for the real type.
//!
//! This crate maintains safety through:
//!
//! - **Module-based encapsulation**: The storage enum and the vtable fields are
//!   module-private, so the pairing between payload and vtable can only be
//!   established by the typed constructors
//! - **Checked by default**: Safe accessors compare [`TypeId`]s before
//!   reinterpreting a payload; the unchecked accessors are `unsafe` and
//!   debug-assert the same comparison
//! - **Standard ownership for the heap case**: Oversized payloads live in a
//!   `Box<dyn Any>`, so their deallocation is ordinary `Box` drop glue
//!
//! [`dynreflect`]: https://docs.rs/dynreflect/latest/dynreflect/
//! [`ValueVtable`]: value::vtable::ValueVtable
//! [`InlineBuffer`]: value::inline::InlineBuffer
//! [`TypeId`]: core::any::TypeId

extern crate alloc;

mod reference;
mod util;
mod value;

pub use reference::{RawValueMut, RawValueRef};
pub use value::{INLINE_CAPACITY, RawValue, fits_inline};
