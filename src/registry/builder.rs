//! Incremental construction of a [`Registry`](super::Registry).
//!
//! The builder assigns type indices in registration order. Index 0 is always
//! the void type, and qualified forms (`&T`, `&mut T`, `Option<&T>`,
//! `Option<&mut T>`) get their own entries on first use, pointing back to
//! their unqualified base.

use alloc::{borrow::Cow, boxed::Box, string::String};
use core::any::TypeId;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::{Registry, RegistryTables};
use crate::{
    bindings::{
        IntoFunction, IntoMethod, conversion_binding, field_bindings, serializer_binding,
    },
    descriptors::{
        ConstructorDescriptor, ConstructorKind, ConversionDescriptor, FieldDescriptor,
        FunctionDescriptor, MethodDescriptor, ParamDescriptor, SerializerDescriptor,
        TypeDescriptor, TypeIndex,
    },
    handlers::{SerializeHandler, Text},
    param::{ParamInfo, Qualifier, TypeInfo},
};

/// How a [`Registry`] answers lookups by name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Lookup {
    /// Scan the descriptor tables in registration order.
    #[default]
    Linear,
    /// Build a hash index on first use. Results are the same as for
    /// [`Lookup::Linear`].
    Indexed,
}

/// Settings for a [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryOptions {
    /// How lookups by name are answered.
    pub lookup: Lookup,
    /// The serializer name used by [`RegistryBuilder::default_serializer`]
    /// and by the [`Display`](core::fmt::Display) implementation of
    /// [`Variable`](crate::Variable).
    pub default_serializer: &'static str,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            lookup: Lookup::Linear,
            default_serializer: "default",
        }
    }
}

/// Collects descriptors and produces a [`Registry`].
///
/// Types that appear in a registered signature are registered
/// automatically, under their Rust name; qualified parameter types such as
/// `&T` get an entry of their own pointing back at `T`. Use
/// [`register_type_named`](Self::register_type_named) to pick a friendlier
/// name.
///
/// # Examples
///
/// ```
/// use dynreflect::{Registry, RegistryOptions, Lookup};
///
/// fn greet(name: &String) -> String {
///     format!("hello, {name}")
/// }
///
/// let registry = Registry::builder()
///     .options(RegistryOptions {
///         lookup: Lookup::Indexed,
///         ..RegistryOptions::default()
///     })
///     .with_primitives()
///     .function("greet", greet)
///     .build();
///
/// let greet = registry.find_function("greet").unwrap();
/// let param = registry.type_descriptor(greet.params()[0].type_index()).unwrap();
/// assert_eq!(param.name(), "&String");
/// ```
#[derive(Debug)]
pub struct RegistryBuilder {
    /// Registered types by identity and qualifier, in registration order.
    types: IndexMap<(TypeId, Qualifier), TypeDescriptor, FxBuildHasher>,
    /// Every other table.
    tables: RegistryTables,
    /// Settings passed on to the registry.
    options: RegistryOptions,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// Creates a builder that knows only the void type.
    #[must_use]
    pub fn new() -> Self {
        let mut types = IndexMap::default();
        types.insert(
            (TypeId::of::<()>(), Qualifier::Value),
            TypeDescriptor::unqualified(TypeInfo::of::<()>(), Cow::Borrowed("void"), TypeIndex::VOID),
        );
        Self {
            types,
            tables: RegistryTables::default(),
            options: RegistryOptions::default(),
        }
    }

    /// Replaces the registry settings.
    ///
    /// Set these before [`with_primitives`](Self::with_primitives) or
    /// [`default_serializer`](Self::default_serializer), which read the
    /// default serializer name.
    #[must_use]
    pub fn options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers the primitive types and `String`, each with a
    /// [`Text`] serializer under the default serializer name.
    #[must_use]
    pub fn with_primitives(self) -> Self {
        self.primitive::<bool>("bool")
            .primitive::<char>("char")
            .primitive::<i8>("i8")
            .primitive::<i16>("i16")
            .primitive::<i32>("i32")
            .primitive::<i64>("i64")
            .primitive::<i128>("i128")
            .primitive::<isize>("isize")
            .primitive::<u8>("u8")
            .primitive::<u16>("u16")
            .primitive::<u32>("u32")
            .primitive::<u64>("u64")
            .primitive::<u128>("u128")
            .primitive::<usize>("usize")
            .primitive::<f32>("f32")
            .primitive::<f64>("f64")
            .primitive::<String>("String")
    }

    /// Registers one primitive type with its default serializer.
    fn primitive<T>(self, name: &'static str) -> Self
    where
        T: Clone + core::fmt::Display + core::str::FromStr + 'static,
        T::Err: core::fmt::Display,
    {
        self.register_type_named::<T>(name)
            .default_serializer::<T, Text>()
    }

    /// Registers `T` under its Rust name.
    #[must_use]
    pub fn register_type<T: 'static>(mut self) -> Self {
        self.ensure_type(TypeInfo::of::<T>());
        self
    }

    /// Registers `T` under `name`, renaming it if it is already known.
    #[must_use]
    pub fn register_type_named<T: 'static>(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        let index = self.ensure_type(TypeInfo::of::<T>());
        let name = name.into();
        for ty in self.types.values_mut() {
            if ty.base == index {
                ty.name = match ty.qualifier {
                    Qualifier::Value => name.clone(),
                    qualifier => Cow::Owned(qualifier.decorate(&name).into_owned()),
                };
            }
        }
        self
    }

    /// Registers a free function under `name`.
    ///
    /// Several functions may share a name; calls by name pick the first one
    /// whose parameter types match the arguments exactly.
    #[must_use]
    pub fn function<M, F: IntoFunction<M>>(mut self, name: &'static str, function: F) -> Self {
        let (binding, signature) = function.into_function();
        let params = self.params(signature.params());
        let return_type = self.ensure_type(signature.returns());
        self.tables.functions.push(FunctionDescriptor {
            name,
            return_type,
            return_type_id: signature.returns().type_id(),
            params,
            binding,
        });
        self
    }

    /// Registers a member function under `name`.
    ///
    /// The owner is the type behind the first parameter, which must be `&T`
    /// or `&mut T`.
    #[must_use]
    pub fn method<M, F: IntoMethod<M>>(mut self, name: &'static str, method: F) -> Self {
        let (binding, signature) = method.into_method();
        let owner = self.ensure_type(signature.owner());
        let params = self.params(signature.params());
        let return_type = self.ensure_type(signature.returns());
        self.tables.methods.push(MethodDescriptor {
            name,
            owner,
            owner_type_id: signature.owner().type_id(),
            is_const: signature.is_const(),
            return_type,
            return_type_id: signature.returns().type_id(),
            params,
            binding,
        });
        self
    }

    /// Registers the member variable `name` of `T` through a pair of
    /// projections.
    #[must_use]
    pub fn field<T, V>(
        mut self,
        name: &'static str,
        get: impl Fn(&T) -> &V + Send + Sync + 'static,
        set: impl Fn(&mut T) -> &mut V + Send + Sync + 'static,
    ) -> Self
    where
        T: 'static,
        V: Clone + 'static,
    {
        let owner = self.ensure_type(TypeInfo::of::<T>());
        let value_type = self.ensure_type(TypeInfo::of::<V>());
        let (getter, setter) = field_bindings(get, set);
        self.tables.fields.push(FieldDescriptor {
            name,
            owner,
            owner_type_id: TypeId::of::<T>(),
            value_type,
            value_type_id: TypeId::of::<V>(),
            getter,
            setter,
        });
        self
    }

    /// Registers a function returning a new value as a constructor of the
    /// returned type.
    #[must_use]
    pub fn constructor<M, F: IntoFunction<M>>(mut self, constructor: F) -> Self {
        let (binding, signature) = constructor.into_function();
        let params = self.params(signature.params());
        let type_index = self.ensure_type(signature.returns());
        self.tables.constructors.push(ConstructorDescriptor {
            type_index,
            type_id: signature.returns().type_id(),
            kind: ConstructorKind::Function,
            params,
            binding,
        });
        self
    }

    /// Registers [`Default::default`] as the zero-argument constructor of
    /// `T`.
    #[must_use]
    pub fn default_constructor<T: Clone + Default + 'static>(mut self) -> Self {
        let (binding, _) = IntoFunction::<fn() -> T>::into_function(T::default);
        let type_index = self.ensure_type(TypeInfo::of::<T>());
        self.tables.constructors.push(ConstructorDescriptor {
            type_index,
            type_id: TypeId::of::<T>(),
            kind: ConstructorKind::Default,
            params: Box::default(),
            binding,
        });
        self
    }

    /// Registers the [`From`] conversion from `A` to `B`.
    #[must_use]
    pub fn conversion<A, B>(self) -> Self
    where
        A: Clone + 'static,
        B: From<A> + Clone + 'static,
    {
        self.conversion_with(|source: &A| B::from(source.clone()))
    }

    /// Registers a conversion from `A` to `B`.
    #[must_use]
    pub fn conversion_with<A, B>(mut self, convert: impl Fn(&A) -> B + Send + Sync + 'static) -> Self
    where
        A: 'static,
        B: Clone + 'static,
    {
        let from = self.ensure_type(TypeInfo::of::<A>());
        let to = self.ensure_type(TypeInfo::of::<B>());
        self.tables.conversions.push(ConversionDescriptor {
            from,
            from_type_id: TypeId::of::<A>(),
            to,
            to_type_id: TypeId::of::<B>(),
            binding: conversion_binding(convert),
        });
        self
    }

    /// Registers the handler `H` as the serializer `name` of `T`.
    #[must_use]
    pub fn serializer<T, H>(mut self, name: &'static str) -> Self
    where
        T: Clone + 'static,
        H: SerializeHandler<T>,
    {
        let type_index = self.ensure_type(TypeInfo::of::<T>());
        self.tables.serializers.push(SerializerDescriptor {
            type_index,
            type_id: TypeId::of::<T>(),
            name,
            binding: serializer_binding::<T, H>(),
        });
        self
    }

    /// Registers the handler `H` as the default serializer of `T`.
    #[must_use]
    pub fn default_serializer<T, H>(self) -> Self
    where
        T: Clone + 'static,
        H: SerializeHandler<T>,
    {
        let name = self.options.default_serializer;
        self.serializer::<T, H>(name)
    }

    /// Returns the collected tables without building a registry.
    #[must_use]
    pub fn into_tables(self) -> RegistryTables {
        let mut tables = self.tables;
        tables.types = self.types.into_values().collect();
        tables
    }

    /// Builds the registry.
    #[must_use]
    pub fn build(self) -> Registry {
        let options = self.options;
        Registry::assemble(self.into_tables(), options)
    }

    /// Returns the unqualified entry of a type, registering it if needed.
    fn ensure_type(&mut self, info: TypeInfo) -> TypeIndex {
        let key = (info.type_id(), Qualifier::Value);
        if let Some(index) = self.types.get_index_of(&key) {
            return TypeIndex::new(index);
        }
        let index = TypeIndex::new(self.types.len());
        self.types.insert(
            key,
            TypeDescriptor::unqualified(info, Cow::Borrowed(info.name()), index),
        );
        index
    }

    /// Returns the entry of a parameter type, registering it if needed.
    fn ensure_param(&mut self, info: ParamInfo) -> ParamDescriptor {
        let base = self.ensure_type(info.base);
        let type_index = match info.qualifier {
            Qualifier::Value => base,
            qualifier => {
                let key = (info.base.type_id(), qualifier);
                match self.types.get_index_of(&key) {
                    Some(index) => TypeIndex::new(index),
                    None => {
                        let descriptor =
                            TypeDescriptor::qualified(&self.types[base.get()], base, qualifier);
                        let (index, _) = self.types.insert_full(key, descriptor);
                        TypeIndex::new(index)
                    }
                }
            }
        };
        ParamDescriptor {
            type_index,
            qualifier: info.qualifier,
            type_id: info.base.type_id(),
        }
    }

    /// Registers the types of a parameter list.
    fn params(&mut self, params: &[ParamInfo]) -> Box<[ParamDescriptor]> {
        params.iter().map(|info| self.ensure_param(*info)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_comes_first() {
        let tables = RegistryBuilder::new().into_tables();
        assert_eq!(tables.types.len(), 1);
        assert_eq!(tables.types[0].name(), "void");
        assert!(tables.types[0].is::<()>());
    }

    #[test]
    fn test_qualified_types_share_a_base() {
        let tables = RegistryBuilder::new()
            .register_type_named::<u8>("byte")
            .function("read", |_: &u8, _: Option<&mut u8>| {})
            .into_tables();
        let names: alloc::vec::Vec<&str> = tables.types.iter().map(TypeDescriptor::name).collect();
        assert_eq!(names, ["void", "byte", "&byte", "Option<&mut byte>"]);
        assert!(tables.types.iter().skip(1).all(|ty| ty.base() == TypeIndex::new(1)));
        assert_eq!(tables.functions[0].return_type(), TypeIndex::VOID);
    }

    #[test]
    fn test_rename_updates_qualified_forms() {
        let tables = RegistryBuilder::new()
            .function("peek", |value: &i16| *value)
            .register_type_named::<i16>("short")
            .into_tables();
        let names: alloc::vec::Vec<&str> = tables.types.iter().map(TypeDescriptor::name).collect();
        assert_eq!(names, ["void", "short", "&short"]);
    }

    #[test]
    fn test_primitives_have_default_serializers() {
        let tables = RegistryBuilder::new().with_primitives().into_tables();
        assert_eq!(tables.serializers.len(), 17);
        assert!(tables.serializers.iter().all(|s| s.name() == "default"));
    }
}
