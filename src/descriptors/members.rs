//! Member variable descriptors.

use core::any::TypeId;

use super::TypeIndex;
use crate::bindings::{Binding, FieldGetter, FieldSetter};

/// A registered member variable.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    /// The member's name.
    pub(crate) name: &'static str,
    /// The owning type entry.
    pub(crate) owner: TypeIndex,
    /// [`TypeId`] of the owning type.
    pub(crate) owner_type_id: TypeId,
    /// The member's type entry.
    pub(crate) value_type: TypeIndex,
    /// [`TypeId`] of the member's type.
    pub(crate) value_type_id: TypeId,
    /// Reads the member.
    pub(crate) getter: Binding<dyn FieldGetter>,
    /// Overwrites the member.
    pub(crate) setter: Binding<dyn FieldSetter>,
}

impl FieldDescriptor {
    /// The member's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The owning type entry.
    #[inline]
    #[must_use]
    pub fn owner(&self) -> TypeIndex {
        self.owner
    }

    /// The member's type entry.
    #[inline]
    #[must_use]
    pub fn value_type(&self) -> TypeIndex {
        self.value_type
    }

    /// The erased read access.
    #[inline]
    #[must_use]
    pub fn getter(&self) -> &Binding<dyn FieldGetter> {
        &self.getter
    }

    /// The erased write access.
    #[inline]
    #[must_use]
    pub fn setter(&self) -> &Binding<dyn FieldSetter> {
        &self.setter
    }
}
