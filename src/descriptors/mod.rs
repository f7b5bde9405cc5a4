//! Plain-data records describing registered entities.
//!
//! A registry is a set of tables, one per category of descriptor. Entries
//! refer to each other by [`TypeIndex`], an index into the type table.
//! Descriptors are produced by [`RegistryBuilder`](crate::RegistryBuilder)
//! and can be regrouped freely as [`RegistryTables`](crate::RegistryTables)
//! before being handed to [`Registry::from_tables`](crate::Registry::from_tables),
//! which checks every cross-reference.

mod callables;
mod conversions;
mod members;
mod types;

pub use self::{
    callables::{
        ConstructorDescriptor, ConstructorKind, FunctionDescriptor, MethodDescriptor,
        ParamDescriptor,
    },
    conversions::{ConversionDescriptor, SerializerDescriptor},
    members::FieldDescriptor,
    types::TypeDescriptor,
};

/// Identifies a type within one registry's type table.
///
/// Index `0` is always the void type `()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeIndex(usize);

impl TypeIndex {
    /// The void type, reported for handles without a value.
    pub const VOID: Self = Self(0);

    /// Creates an index from its position in the type table.
    #[inline]
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position in the type table.
    #[inline]
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns `true` for [`TypeIndex::VOID`].
    #[inline]
    #[must_use]
    pub const fn is_void(self) -> bool {
        self.0 == 0
    }
}

impl core::fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
