//! Descriptors for things that can be called: free functions, member
//! functions and constructors.
//!
//! Each descriptor pairs the erased binding with the parameter list and
//! return type recorded at registration, which is what validation checks
//! arguments against.

use alloc::boxed::Box;
use core::any::TypeId;

use super::TypeIndex;
use crate::{
    bindings::{Binding, FunctionBinding, MethodBinding},
    param::Qualifier,
};

/// One declared parameter of a callable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParamDescriptor {
    /// The parameter's type entry, including its qualifier.
    pub(crate) type_index: TypeIndex,
    /// The qualifier, repeated from the type entry.
    pub(crate) qualifier: Qualifier,
    /// [`TypeId`] of the unqualified parameter type, as seen by the binding.
    pub(crate) type_id: TypeId,
}

impl ParamDescriptor {
    /// The parameter's type entry, including its qualifier.
    #[inline]
    #[must_use]
    pub fn type_index(&self) -> TypeIndex {
        self.type_index
    }

    /// How the argument is handed to the callable.
    #[inline]
    #[must_use]
    pub fn qualifier(&self) -> Qualifier {
        self.qualifier
    }

    /// [`TypeId`] of the unqualified parameter type.
    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

/// A registered free function.
#[derive(Clone, Debug)]
pub struct FunctionDescriptor {
    /// The registered name. Overloads share a name.
    pub(crate) name: &'static str,
    /// The return type entry; [`TypeIndex::VOID`] for unit.
    pub(crate) return_type: TypeIndex,
    /// [`TypeId`] of the return type.
    pub(crate) return_type_id: TypeId,
    /// Declared parameters.
    pub(crate) params: Box<[ParamDescriptor]>,
    /// The erased entry point.
    pub(crate) binding: Binding<dyn FunctionBinding>,
}

impl FunctionDescriptor {
    /// The registered name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The return type entry.
    #[inline]
    #[must_use]
    pub fn return_type(&self) -> TypeIndex {
        self.return_type
    }

    /// Declared parameters in order.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Number of declared parameters.
    #[inline]
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The erased entry point.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &Binding<dyn FunctionBinding> {
        &self.binding
    }
}

/// A registered member function.
#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    /// The registered name. Overloads share a name.
    pub(crate) name: &'static str,
    /// The owning type entry.
    pub(crate) owner: TypeIndex,
    /// [`TypeId`] of the owning type.
    pub(crate) owner_type_id: TypeId,
    /// Whether the method takes `&self`.
    pub(crate) is_const: bool,
    /// The return type entry; [`TypeIndex::VOID`] for unit.
    pub(crate) return_type: TypeIndex,
    /// [`TypeId`] of the return type.
    pub(crate) return_type_id: TypeId,
    /// Declared parameters after the receiver.
    pub(crate) params: Box<[ParamDescriptor]>,
    /// The erased entry point.
    pub(crate) binding: Binding<dyn MethodBinding>,
}

impl MethodDescriptor {
    /// The registered name.
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

    /// Whether the method takes `&self`.
    #[inline]
    #[must_use]
    pub fn is_const(&self) -> bool {
        self.is_const
    }

    /// The return type entry.
    #[inline]
    #[must_use]
    pub fn return_type(&self) -> TypeIndex {
        self.return_type
    }

    /// Declared parameters after the receiver.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Number of declared parameters after the receiver.
    #[inline]
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The erased entry point.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &Binding<dyn MethodBinding> {
        &self.binding
    }
}

/// How a constructor builds its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstructorKind {
    /// Calls a registered function returning the type.
    Function,
    /// Calls [`Default::default`].
    Default,
}

/// A registered constructor.
#[derive(Clone, Debug)]
pub struct ConstructorDescriptor {
    /// The constructed type entry.
    pub(crate) type_index: TypeIndex,
    /// [`TypeId`] of the constructed type.
    pub(crate) type_id: TypeId,
    /// How the value is built.
    pub(crate) kind: ConstructorKind,
    /// Declared parameters.
    pub(crate) params: Box<[ParamDescriptor]>,
    /// The erased entry point.
    pub(crate) binding: Binding<dyn FunctionBinding>,
}

impl ConstructorDescriptor {
    /// The constructed type entry.
    #[inline]
    #[must_use]
    pub fn type_index(&self) -> TypeIndex {
        self.type_index
    }

    /// How the value is built.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ConstructorKind {
        self.kind
    }

    /// Declared parameters in order.
    #[inline]
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Number of declared parameters.
    #[inline]
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// The erased entry point.
    #[inline]
    #[must_use]
    pub fn binding(&self) -> &Binding<dyn FunctionBinding> {
        &self.binding
    }
}
