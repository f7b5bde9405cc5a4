//! Name index used by [`Lookup::Indexed`](crate::Lookup::Indexed).

use alloc::{boxed::Box, vec::Vec};

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;

use crate::descriptors::{FieldDescriptor, FunctionDescriptor, MethodDescriptor, TypeDescriptor, TypeIndex};

type NameMap<K, V> = HashMap<K, V, FxBuildHasher>;

/// Name lookup tables, built on first use by an indexed registry.
///
/// Every list keeps registration order, so indexed lookups return exactly
/// what a linear scan would.
#[derive(Debug, Default)]
pub(crate) struct NameIndex {
    /// Type name to the first type registered under it.
    pub(crate) types: NameMap<Box<str>, TypeIndex>,
    /// Function name to the positions of its overloads.
    pub(crate) functions: NameMap<&'static str, Vec<usize>>,
    /// Method name to the positions of methods with that name, any owner.
    pub(crate) methods: NameMap<&'static str, Vec<usize>>,
    /// Field name to the positions of fields with that name, any owner.
    pub(crate) fields: NameMap<&'static str, Vec<usize>>,
}

impl NameIndex {
    pub(crate) fn build(
        types: &[TypeDescriptor],
        functions: &[FunctionDescriptor],
        methods: &[MethodDescriptor],
        fields: &[FieldDescriptor],
    ) -> Self {
        let mut index = Self::default();
        for (position, ty) in types.iter().enumerate() {
            index
                .types
                .entry(Box::from(ty.name()))
                .or_insert(TypeIndex::new(position));
        }
        for (position, function) in functions.iter().enumerate() {
            index
                .functions
                .entry(function.name())
                .or_default()
                .push(position);
        }
        for (position, method) in methods.iter().enumerate() {
            index.methods.entry(method.name()).or_default().push(position);
        }
        for (position, field) in fields.iter().enumerate() {
            index.fields.entry(field.name()).or_default().push(position);
        }
        index
    }
}
