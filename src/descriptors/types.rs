use alloc::borrow::Cow;
use core::any::TypeId;

use super::TypeIndex;
use crate::param::{Qualifier, TypeInfo};

/// Describes one registered type, possibly in a qualified form.
///
/// Qualified forms such as `&T` or `Option<&mut T>` get their own entry the
/// first time they appear in a signature. They share the [`TypeId`] of `T`
/// and point at its entry through [`base`](Self::base).
///
/// Two descriptors are equal when their names are equal.
#[derive(Clone, Debug)]
pub struct TypeDescriptor {
    /// Display name.
    pub(crate) name: Cow<'static, str>,
    /// Size of the unqualified type in bytes.
    pub(crate) size: usize,
    /// Alignment of the unqualified type in bytes.
    pub(crate) align: usize,
    /// [`TypeId`] of the unqualified type.
    pub(crate) type_id: TypeId,
    /// How this entry qualifies its base.
    pub(crate) qualifier: Qualifier,
    /// The entry of the unqualified type; itself for unqualified entries.
    pub(crate) base: TypeIndex,
}

impl TypeDescriptor {
    /// Describes the unqualified type `info` at position `index`.
    pub(crate) fn unqualified(
        info: TypeInfo,
        name: Cow<'static, str>,
        index: TypeIndex,
    ) -> Self {
        Self {
            name,
            size: info.size(),
            align: info.align(),
            type_id: info.type_id(),
            qualifier: Qualifier::Value,
            base: index,
        }
    }

    /// Describes a qualified form of `base`, which lives at `base_index`.
    pub(crate) fn qualified(base: &Self, base_index: TypeIndex, qualifier: Qualifier) -> Self {
        Self {
            name: Cow::Owned(qualifier.decorate(&base.name).into_owned()),
            size: base.size,
            align: base.align,
            type_id: base.type_id,
            qualifier,
            base: base_index,
        }
    }

    /// The display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the unqualified type in bytes.
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Alignment of the unqualified type in bytes.
    #[inline]
    #[must_use]
    pub fn align(&self) -> usize {
        self.align
    }

    /// [`TypeId`] of the unqualified type.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// How this entry qualifies its base.
    #[inline]
    #[must_use]
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// The entry of the unqualified type.
    #[inline]
    #[must_use]
    pub fn base(&self) -> TypeIndex {
        self.base
    }

    /// Returns `true` if this entry is a qualified form of another.
    #[inline]
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        self.qualifier != Qualifier::Value
    }

    /// Returns `true` if values of this type can be inspected as `T`.
    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeDescriptor {}
