//! The reflection registry.
//!
//! A [`Registry`] owns one table per category of descriptor (types,
//! constructors, conversions, free functions, member functions, member
//! variables and serializers) and answers two kinds of questions:
//!
//! - **Lookups**: find a descriptor by index or by name.
//! - **Invocations**: check a list of [`Variable`] arguments against a
//!   descriptor and, only if every check passes, call its binding.
//!
//! A registry never changes after it is built. It is `Send + Sync`, so one
//! instance can be shared by reference across threads, while the
//! [`Variable`]s created from it stay on the thread that holds them.
//!
//! # Building a Registry
//!
//! ```
//! use dynreflect::Registry;
//!
//! #[derive(Clone, Debug, Default, PartialEq)]
//! struct Point {
//!     x: f64,
//!     y: f64,
//! }
//!
//! impl Point {
//!     fn length(&self) -> f64 {
//!         (self.x * self.x + self.y * self.y).sqrt()
//!     }
//! }
//!
//! let registry = Registry::builder()
//!     .with_primitives()
//!     .register_type_named::<Point>("Point")
//!     .default_constructor::<Point>()
//!     .field("x", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
//!     .field("y", |p: &Point| &p.y, |p: &mut Point| &mut p.y)
//!     .method("length", Point::length)
//!     .build();
//!
//! let point_type = registry.find_type("Point").unwrap();
//! let constructor = registry.constructors_of(point_type).next().unwrap();
//! let mut point = registry.construct(constructor, &mut []).unwrap();
//!
//! point.set_member_variable("x", &registry.wrap(3.0f64)).unwrap();
//! point.set_member_variable("y", &registry.wrap(4.0f64)).unwrap();
//! let length = point.call_member_function("length", &mut []).unwrap();
//! assert_eq!(length.downcast_ref::<f64>(), Some(&5.0));
//! ```
//!
//! # Validation
//!
//! Every checked call validates first and invokes second:
//!
//! 1. The argument count must equal the declared parameter count.
//! 2. Position by position, each argument must carry the declared
//!    (unqualified) type. Empty arguments are accepted only by optional
//!    parameters. The first mismatch is reported.
//!
//! The `*_with_conversion` variants replace step 2's failure with a lookup in
//! the conversion table. The `*_unchecked` variants skip validation and are
//! `unsafe`.

mod builder;
mod index_cell;
mod invoke;
mod names;

use alloc::{borrow::Cow, boxed::Box, format, vec::Vec};
use core::any::TypeId;

use hashbrown::HashMap;
use rustc_hash::FxBuildHasher;
use tracing::debug;

pub use self::{
    builder::{Lookup, RegistryBuilder, RegistryOptions},
    invoke::ArgList,
};
use self::{index_cell::IndexCell, names::NameIndex};
use crate::{
    ReflectError, Result,
    descriptors::{
        ConstructorDescriptor, ConversionDescriptor, FieldDescriptor, FunctionDescriptor,
        MethodDescriptor, ParamDescriptor, SerializerDescriptor, TypeDescriptor, TypeIndex,
    },
    macros::fail,
    param::Qualifier,
    value::Value,
    variable::Variable,
};

/// The descriptor tables a [`Registry`] is made of.
///
/// Obtained from [`RegistryBuilder::into_tables`]. Tables from one builder
/// may be filtered or reordered before being passed to
/// [`Registry::from_tables`], as long as every index still resolves to a
/// type of the right shape.
#[derive(Clone, Debug, Default)]
pub struct RegistryTables {
    /// Registered types. The first entry must be the void type.
    pub types: Vec<TypeDescriptor>,
    /// Registered constructors.
    pub constructors: Vec<ConstructorDescriptor>,
    /// Registered conversions.
    pub conversions: Vec<ConversionDescriptor>,
    /// Registered free functions.
    pub functions: Vec<FunctionDescriptor>,
    /// Registered member functions.
    pub methods: Vec<MethodDescriptor>,
    /// Registered member variables.
    pub fields: Vec<FieldDescriptor>,
    /// Registered serializers.
    pub serializers: Vec<SerializerDescriptor>,
}

/// An immutable set of reflected types and the entities bound to them.
///
/// See the [module documentation](self) for an overview.
pub struct Registry {
    /// Registered types; index 0 is void.
    types: Box<[TypeDescriptor]>,
    /// Registered constructors.
    constructors: Box<[ConstructorDescriptor]>,
    /// Registered conversions.
    conversions: Box<[ConversionDescriptor]>,
    /// Registered free functions.
    functions: Box<[FunctionDescriptor]>,
    /// Registered member functions.
    methods: Box<[MethodDescriptor]>,
    /// Registered member variables.
    fields: Box<[FieldDescriptor]>,
    /// Registered serializers.
    serializers: Box<[SerializerDescriptor]>,
    /// Unqualified type entries by [`TypeId`].
    by_type_id: HashMap<TypeId, TypeIndex, FxBuildHasher>,
    /// Lookup behavior.
    options: RegistryOptions,
    /// Name index, built on first use when `options.lookup` is indexed.
    names: IndexCell<NameIndex>,
}

impl Registry {
    /// Starts building a registry.
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Creates a registry from tables, checking every cross-reference.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::InvalidTable`] if the void type is missing, an
    /// index is out of range, an index points at a type other than the one
    /// its binding was created for, or a type is registered twice.
    pub fn from_tables(tables: RegistryTables, options: RegistryOptions) -> Result<Self> {
        validate(&tables)?;
        Ok(Self::assemble(tables, options))
    }

    /// Creates a registry from tables that are consistent by construction.
    pub(crate) fn assemble(tables: RegistryTables, options: RegistryOptions) -> Self {
        let mut by_type_id: HashMap<TypeId, TypeIndex, FxBuildHasher> = HashMap::default();
        for (position, ty) in tables.types.iter().enumerate() {
            if !ty.is_qualified() {
                by_type_id
                    .entry(ty.type_id())
                    .or_insert(TypeIndex::new(position));
            }
        }

        debug!(
            types = tables.types.len(),
            constructors = tables.constructors.len(),
            conversions = tables.conversions.len(),
            functions = tables.functions.len(),
            methods = tables.methods.len(),
            fields = tables.fields.len(),
            serializers = tables.serializers.len(),
            "registry built"
        );

        Self {
            types: tables.types.into_boxed_slice(),
            constructors: tables.constructors.into_boxed_slice(),
            conversions: tables.conversions.into_boxed_slice(),
            functions: tables.functions.into_boxed_slice(),
            methods: tables.methods.into_boxed_slice(),
            fields: tables.fields.into_boxed_slice(),
            serializers: tables.serializers.into_boxed_slice(),
            by_type_id,
            options,
            names: IndexCell::new(),
        }
    }

    /// The options this registry was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// All registered types, void first.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// All registered constructors.
    #[inline]
    #[must_use]
    pub fn constructors(&self) -> &[ConstructorDescriptor] {
        &self.constructors
    }

    /// All registered conversions.
    #[inline]
    #[must_use]
    pub fn conversions(&self) -> &[ConversionDescriptor] {
        &self.conversions
    }

    /// All registered free functions.
    #[inline]
    #[must_use]
    pub fn functions(&self) -> &[FunctionDescriptor] {
        &self.functions
    }

    /// All registered member functions.
    #[inline]
    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }

    /// All registered member variables.
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// All registered serializers.
    #[inline]
    #[must_use]
    pub fn serializers(&self) -> &[SerializerDescriptor] {
        &self.serializers
    }

    /// Looks up a type by index.
    #[inline]
    #[must_use]
    pub fn type_descriptor(&self, index: TypeIndex) -> Option<&TypeDescriptor> {
        self.types.get(index.get())
    }

    /// Resolves a possibly qualified type to its unqualified entry.
    #[inline]
    #[must_use]
    pub fn base_type(&self, index: TypeIndex) -> Option<TypeIndex> {
        self.type_descriptor(index).map(TypeDescriptor::base)
    }

    /// Returns the unqualified entry of the Rust type `T`.
    #[inline]
    #[must_use]
    pub fn type_index_of<T: 'static>(&self) -> Option<TypeIndex> {
        self.type_index_of_id(TypeId::of::<T>())
    }

    /// Returns the unqualified entry of the Rust type with the given id.
    #[inline]
    #[must_use]
    pub fn type_index_of_id(&self, type_id: TypeId) -> Option<TypeIndex> {
        self.by_type_id.get(&type_id).copied()
    }

    /// Finds the first type registered under `name`.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<TypeIndex> {
        match self.name_index() {
            Some(index) => index.types.get(name).copied(),
            None => self
                .types
                .iter()
                .position(|ty| ty.name() == name)
                .map(TypeIndex::new),
        }
    }

    /// Returns the display name of a type, or its index if it is unknown.
    #[must_use]
    pub(crate) fn name_of(&self, index: TypeIndex) -> Cow<'static, str> {
        match self.type_descriptor(index) {
            Some(ty) => ty.name.clone(),
            None => Cow::Owned(format!("{index}")),
        }
    }

    /// Iterates over every overload of the function `name`.
    pub fn functions_named<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = &'a FunctionDescriptor> {
        let positions = self
            .name_index()
            .map(|index| positions(&index.functions, name));
        matching(&self.functions, positions, move |function| {
            function.name == name
        })
    }

    /// Finds the first function registered under `name`.
    #[must_use]
    pub fn find_function(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions_named(name).next()
    }

    /// Iterates over the member functions of `owner`.
    pub fn methods_of(&self, owner: TypeIndex) -> impl Iterator<Item = &MethodDescriptor> + '_ {
        let owner = self.base_type(owner);
        self.methods
            .iter()
            .filter(move |method| Some(method.owner) == owner)
    }

    /// Iterates over every overload of the member function `name` of `owner`.
    pub fn methods_named<'a>(
        &'a self,
        owner: TypeIndex,
        name: &str,
    ) -> impl Iterator<Item = &'a MethodDescriptor> {
        let owner = self.base_type(owner);
        let positions = self
            .name_index()
            .map(|index| positions(&index.methods, name));
        matching(&self.methods, positions, move |method| {
            Some(method.owner) == owner && method.name == name
        })
    }

    /// Finds the first member function `name` of `owner`.
    #[must_use]
    pub fn find_method(&self, owner: TypeIndex, name: &str) -> Option<&MethodDescriptor> {
        self.methods_named(owner, name).next()
    }

    /// Iterates over the member variables of `owner`.
    pub fn fields_of(&self, owner: TypeIndex) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        let owner = self.base_type(owner);
        self.fields
            .iter()
            .filter(move |field| Some(field.owner) == owner)
    }

    /// Finds the member variable `name` of `owner`.
    #[must_use]
    pub fn find_field(&self, owner: TypeIndex, name: &str) -> Option<&FieldDescriptor> {
        let owner = self.base_type(owner);
        let positions = self.name_index().map(|index| positions(&index.fields, name));
        matching(&self.fields, positions, move |field| {
            Some(field.owner) == owner && field.name == name
        })
        .next()
    }

    /// Iterates over the constructors of `ty`.
    pub fn constructors_of(
        &self,
        ty: TypeIndex,
    ) -> impl Iterator<Item = &ConstructorDescriptor> + '_ {
        let ty = self.base_type(ty);
        self.constructors
            .iter()
            .filter(move |constructor| Some(constructor.type_index) == ty)
    }

    /// Iterates over the conversions whose source is `from`.
    pub fn conversions_from(
        &self,
        from: TypeIndex,
    ) -> impl Iterator<Item = &ConversionDescriptor> + '_ {
        let from = self.base_type(from);
        self.conversions
            .iter()
            .filter(move |conversion| Some(conversion.from) == from)
    }

    /// Finds the conversion from `from` to `to`.
    #[must_use]
    pub fn find_conversion(&self, from: TypeIndex, to: TypeIndex) -> Option<&ConversionDescriptor> {
        let to = self.base_type(to)?;
        self.conversions_from(from)
            .find(|conversion| conversion.to == to)
    }

    /// Iterates over the serializers of `ty`.
    pub fn serializers_of(
        &self,
        ty: TypeIndex,
    ) -> impl Iterator<Item = &SerializerDescriptor> + '_ {
        let ty = self.base_type(ty);
        self.serializers
            .iter()
            .filter(move |serializer| Some(serializer.type_index) == ty)
    }

    /// Finds the serializer `name` of `ty`.
    #[must_use]
    pub fn find_serializer(&self, ty: TypeIndex, name: &str) -> Option<&SerializerDescriptor> {
        self.serializers_of(ty)
            .find(|serializer| serializer.name == name)
    }

    /// Wraps `value` in a handle attached to this registry.
    ///
    /// The handle's type is looked up from the value's Rust type. Values of
    /// unregistered types are tagged [`TypeIndex::VOID`] and rejected by
    /// every checked operation; use [`Registry::variable`] to catch that
    /// early.
    #[must_use]
    pub fn wrap<T: Clone + 'static>(&self, value: T) -> Variable<'_> {
        self.adopt(Value::new(value))
    }

    /// Wraps `value` in a handle, requiring its type to be registered.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::UnregisteredType`] if `T` is unknown.
    pub fn variable<T: Clone + 'static>(&self, value: T) -> Result<Variable<'_>> {
        let Some(index) = self.type_index_of::<T>() else {
            fail!(ReflectError::UnregisteredType {
                type_name: core::any::type_name::<T>(),
            });
        };
        Ok(Variable::attached(Value::new(value), index, self))
    }

    /// Wraps an erased value, deriving its type from the payload.
    #[must_use]
    pub fn adopt(&self, value: Value) -> Variable<'_> {
        let index = value
            .type_id()
            .and_then(|type_id| self.type_index_of_id(type_id))
            .unwrap_or(TypeIndex::VOID);
        Variable::attached(value, index, self)
    }

    /// The type of a handle; void if it holds no value.
    #[must_use]
    pub fn object_type(&self, variable: &Variable<'_>) -> TypeIndex {
        if variable.has_value() {
            variable.type_index()
        } else {
            TypeIndex::VOID
        }
    }

    /// The type name of a handle; the void type's name if it holds no value.
    #[must_use]
    pub fn type_name(&self, variable: &Variable<'_>) -> &str {
        self.type_descriptor(self.object_type(variable))
            .or_else(|| self.types.first())
            .map_or("void", TypeDescriptor::name)
    }

    /// Returns the name index if this registry uses one, building it first.
    fn name_index(&self) -> Option<&NameIndex> {
        match self.options.lookup {
            Lookup::Linear => None,
            Lookup::Indexed => Some(self.names.get_or_init(|| {
                let index = NameIndex::build(&self.types, &self.functions, &self.methods, &self.fields);
                debug!(
                    types = index.types.len(),
                    functions = index.functions.len(),
                    methods = index.methods.len(),
                    fields = index.fields.len(),
                    "name index built"
                );
                index
            })),
        }
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.types.len())
            .field("constructors", &self.constructors.len())
            .field("conversions", &self.conversions.len())
            .field("functions", &self.functions.len())
            .field("methods", &self.methods.len())
            .field("fields", &self.fields.len())
            .field("serializers", &self.serializers.len())
            .field("options", &self.options)
            .field("name_index_built", &self.names.get().is_some())
            .finish()
    }
}

/// Returns the positions listed under `name`, or none.
fn positions<'a>(map: &'a HashMap<&'static str, Vec<usize>, FxBuildHasher>, name: &str) -> &'a [usize] {
    map.get(name).map_or(&[][..], Vec::as_slice)
}

/// Iterates over the items satisfying `predicate`, in table order.
///
/// With `positions`, only those entries are visited; without, the whole
/// table is scanned.
fn matching<'a, T>(
    items: &'a [T],
    positions: Option<&'a [usize]>,
    predicate: impl Fn(&T) -> bool,
) -> impl Iterator<Item = &'a T> {
    let scanned = if positions.is_some() { 0 } else { items.len() };
    positions
        .unwrap_or_default()
        .iter()
        .filter_map(|&position| items.get(position))
        .chain(items.iter().take(scanned))
        .filter(move |item| predicate(item))
}

/// Names the descriptor being validated in error messages.
#[derive(Clone, Copy)]
struct Entity<'a> {
    /// What kind of descriptor it is.
    kind: &'static str,
    /// Its name, if it has one.
    name: Option<&'a str>,
}

impl core::fmt::Display for Entity<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.name {
            Some(name) => write!(f, "{} `{name}`", self.kind),
            None => f.write_str(self.kind),
        }
    }
}

/// Checks that `index` names a type entry with the given identity.
fn check_entry(
    types: &[TypeDescriptor],
    index: TypeIndex,
    type_id: TypeId,
    qualifier: Qualifier,
    entity: Entity<'_>,
) -> Result<()> {
    let Some(ty) = types.get(index.get()) else {
        fail!(ReflectError::InvalidTable {
            reason: format!("{entity} refers to type {index}, which does not exist"),
        });
    };
    if ty.type_id != type_id || ty.qualifier != qualifier {
        fail!(ReflectError::InvalidTable {
            reason: format!(
                "{entity} refers to type {index} (`{}`), which has the wrong shape",
                ty.name
            ),
        });
    }
    Ok(())
}

/// Checks every cross-reference in `tables`.
fn validate(tables: &RegistryTables) -> Result<()> {
    let types = tables.types.as_slice();
    match types.first() {
        Some(void) if void.type_id == TypeId::of::<()>() && !void.is_qualified() => {}
        _ => fail!(ReflectError::InvalidTable {
            reason: "the type table must start with the void type".into(),
        }),
    }

    let mut seen: HashMap<TypeId, TypeIndex, FxBuildHasher> = HashMap::default();
    for (position, ty) in types.iter().enumerate() {
        let index = TypeIndex::new(position);
        if ty.is_qualified() {
            let entity = Entity {
                kind: "type",
                name: Some(ty.name()),
            };
            check_entry(types, ty.base, ty.type_id, Qualifier::Value, entity)?;
        } else {
            if ty.base != index {
                fail!(ReflectError::InvalidTable {
                    reason: format!(
                        "unqualified type `{}` has a base other than itself",
                        ty.name
                    ),
                });
            }
            if let Some(previous) = seen.insert(ty.type_id, index) {
                fail!(ReflectError::InvalidTable {
                    reason: format!(
                        "type `{}` is registered at both {previous} and {index}",
                        ty.name
                    ),
                });
            }
        }
    }

    let check_params = |params: &[ParamDescriptor], entity: Entity<'_>| -> Result<()> {
        for param in params {
            check_entry(types, param.type_index, param.type_id, param.qualifier, entity)?;
        }
        Ok(())
    };

    for function in &tables.functions {
        let entity = Entity {
            kind: "function",
            name: Some(function.name),
        };
        check_entry(
            types,
            function.return_type,
            function.return_type_id,
            Qualifier::Value,
            entity,
        )?;
        check_params(&function.params, entity)?;
    }
    for method in &tables.methods {
        let entity = Entity {
            kind: "method",
            name: Some(method.name),
        };
        check_entry(types, method.owner, method.owner_type_id, Qualifier::Value, entity)?;
        check_entry(
            types,
            method.return_type,
            method.return_type_id,
            Qualifier::Value,
            entity,
        )?;
        check_params(&method.params, entity)?;
    }
    for constructor in &tables.constructors {
        let entity = Entity {
            kind: "constructor",
            name: None,
        };
        check_entry(
            types,
            constructor.type_index,
            constructor.type_id,
            Qualifier::Value,
            entity,
        )?;
        check_params(&constructor.params, entity)?;
    }
    for field in &tables.fields {
        let entity = Entity {
            kind: "field",
            name: Some(field.name),
        };
        check_entry(types, field.owner, field.owner_type_id, Qualifier::Value, entity)?;
        check_entry(
            types,
            field.value_type,
            field.value_type_id,
            Qualifier::Value,
            entity,
        )?;
    }
    for conversion in &tables.conversions {
        let entity = Entity {
            kind: "conversion",
            name: None,
        };
        check_entry(
            types,
            conversion.from,
            conversion.from_type_id,
            Qualifier::Value,
            entity,
        )?;
        check_entry(
            types,
            conversion.to,
            conversion.to_type_id,
            Qualifier::Value,
            entity,
        )?;
    }
    for serializer in &tables.serializers {
        let entity = Entity {
            kind: "serializer",
            name: Some(serializer.name),
        };
        check_entry(
            types,
            serializer.type_index,
            serializer.type_id,
            Qualifier::Value,
            entity,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Registry: Send, Sync);

    #[test]
    fn test_matching_linear_and_indexed_agree() {
        let items = [1, 2, 3, 2];
        let linear: Vec<_> = matching(&items, None, |item| *item == 2).collect();
        let indexed: Vec<_> = matching(&items, Some(&[1, 3]), |item| *item == 2).collect();
        assert_eq!(linear, [&2, &2]);
        assert_eq!(linear, indexed);
    }

    #[test]
    fn test_empty_tables_are_rejected() {
        let error = Registry::from_tables(RegistryTables::default(), RegistryOptions::default())
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            ReflectError::InvalidTable { .. }
        ));
    }
}
