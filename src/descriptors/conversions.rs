//! Descriptors for conversions between registered types and for named text
//! serializers.

use core::any::TypeId;

use super::TypeIndex;
use crate::bindings::{Binding, ConversionBinding, SerializerBinding};

/// A registered conversion from one type to another.
#[derive(Clone, Debug)]
pub struct ConversionDescriptor {
    /// The source type entry.
    pub(crate) from: TypeIndex,
    /// [`TypeId`] of the source type.
    pub(crate) from_type_id: TypeId,
    /// The target type entry.
    pub(crate) to: TypeIndex,
    /// [`TypeId`] of the target type.
    pub(crate) to_type_id: TypeId,
    /// The erased conversion.
    pub(crate) binding: Binding<dyn ConversionBinding>,
}

impl ConversionDescriptor {
    /// The source type entry.
    #[inline]
    #[must_use]
    pub fn source(&self) -> TypeIndex {
        self.from
    }

    /// The target type entry.
    #[inline]
    #[must_use]
    pub fn target(&self) -> TypeIndex {
        self.to
    }

    /// The erased conversion.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &Binding<dyn ConversionBinding> {
        &self.binding
    }
}

/// A named string serializer for one type.
#[derive(Clone, Debug)]
pub struct SerializerDescriptor {
    /// The serialized type entry.
    pub(crate) type_index: TypeIndex,
    /// [`TypeId`] of the serialized type.
    pub(crate) type_id: TypeId,
    /// The serializer's name, e.g. `"default"`.
    pub(crate) name: &'static str,
    /// The erased handler.
    pub(crate) binding: Binding<dyn SerializerBinding>,
}

impl SerializerDescriptor {
    /// The serialized type entry.
    #[inline]
    #[must_use]
    pub fn type_index(&self) -> TypeIndex {
        self.type_index
    }

    /// The serializer's name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The erased handler.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &Binding<dyn SerializerBinding> {
        &self.binding
    }
}
