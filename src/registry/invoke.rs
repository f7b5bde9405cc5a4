//! Checked and unchecked dispatch through a [`Registry`].
//!
//! Every checked operation validates before it touches any argument: the
//! argument count first, then each argument in order, reporting the first
//! mismatch. Only then are the argument values lent to the binding. They are
//! moved back into the caller's handles when the binding returns or unwinds,
//! so out-parameters observe the binding's writes and a failed validation
//! leaves every handle as it was.
//!
//! Results are attached to the registry and tagged with the descriptor's
//! return type.

use alloc::{borrow::Cow, format, string::String, vec, vec::Vec};
use core::any::TypeId;

use rootcause::Report;
use tracing::trace;

use super::Registry;
use crate::{
    ReflectError, Result,
    descriptors::{
        ConstructorDescriptor, ConversionDescriptor, FieldDescriptor, FunctionDescriptor,
        MethodDescriptor, ParamDescriptor, TypeIndex,
    },
    macros::fail,
    param::TypeInfo,
    value::Value,
    variable::Variable,
};

/// A statically typed argument list for [`Registry::call_typed`].
///
/// Implemented for tuples of up to eight `Clone + 'static` values.
pub trait ArgList {
    /// The types of the elements, in order.
    fn type_infos() -> Vec<TypeInfo>;

    /// Erases the elements, in order.
    fn into_values(self) -> Vec<Value>;
}

macro_rules! impl_arg_list {
    ($($ty:ident $value:ident),*) => {
        impl<$($ty: Clone + 'static,)*> ArgList for ($($ty,)*) {
            fn type_infos() -> Vec<TypeInfo> {
                vec![$(TypeInfo::of::<$ty>()),*]
            }

            fn into_values(self) -> Vec<Value> {
                let ($($value,)*) = self;
                vec![$(Value::new($value)),*]
            }
        }
    };
}

impl_arg_list!();
impl_arg_list!(A0 a0);
impl_arg_list!(A0 a0, A1 a1);
impl_arg_list!(A0 a0, A1 a1, A2 a2);
impl_arg_list!(A0 a0, A1 a1, A2 a2, A3 a3);
impl_arg_list!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4);
impl_arg_list!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
impl_arg_list!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);
impl_arg_list!(A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6, A7 a7);

/// Wraps a validation failure into a report naming the entity involved.
fn reject(error: ReflectError, kind: &str, name: &str) -> Report<ReflectError> {
    Report::new(error).attach(format!("while invoking {kind} `{name}`"))
}

/// Argument values on loan to a bound entity.
///
/// Dropping it moves every lent value back into its argument, so arguments
/// are restored even when the entity panics.
struct Loan<'a, 'r> {
    args: &'a mut [Variable<'r>],
    values: Vec<Value>,
    lent: Vec<bool>,
}

impl Drop for Loan<'_, '_> {
    fn drop(&mut self) {
        let values = core::mem::take(&mut self.values);
        for ((arg, value), &lent) in self.args.iter_mut().zip(values).zip(&self.lent) {
            if lent {
                arg.value = value;
            }
        }
    }
}

/// Lends the arguments' values to `invoke` and hands them back afterwards.
///
/// Positions with a replacement value use it instead of the argument's own
/// value; replacements are dropped after the call.
fn lend_values<R>(
    args: &mut [Variable<'_>],
    replacements: impl IntoIterator<Item = Option<Value>>,
    invoke: impl FnOnce(&mut [Value]) -> R,
) -> R {
    let mut lent = Vec::with_capacity(args.len());
    let mut values = Vec::with_capacity(args.len());
    for (arg, replacement) in args.iter_mut().zip(replacements) {
        lent.push(replacement.is_none());
        values.push(replacement.unwrap_or_else(|| arg.value.take()));
    }
    let mut loan = Loan { args, values, lent };
    invoke(loan.values.as_mut_slice())
}

impl Registry {
    /// Describes the type of a handle for error messages.
    fn describe(&self, variable: &Variable<'_>) -> Cow<'static, str> {
        let Some(type_id) = variable.value.type_id() else {
            return Cow::Borrowed("void");
        };
        match self.type_descriptor(variable.type_index) {
            Some(ty) if ty.type_id == type_id => ty.name.clone(),
            _ => Cow::Borrowed(variable.value.type_name().unwrap_or("<unknown>")),
        }
    }

    /// Returns whether `variable` holds a value of the unqualified type
    /// `expected`.
    fn holds(&self, variable: &Variable<'_>, expected: TypeIndex, type_id: TypeId) -> bool {
        variable.value.type_id() == Some(type_id)
            && Some(variable.type_index) == self.base_type(expected)
    }

    /// Checks one argument against one parameter.
    fn check_arg(
        &self,
        position: usize,
        param: &ParamDescriptor,
        arg: &Variable<'_>,
    ) -> core::result::Result<(), ReflectError> {
        let accepted = if arg.value.has_value() {
            self.holds(arg, param.type_index, param.type_id)
        } else {
            param.qualifier.is_optional()
        };
        if accepted {
            Ok(())
        } else {
            Err(ReflectError::ArgumentType {
                position,
                expected: self.name_of(param.type_index),
                found: self.describe(arg),
            })
        }
    }

    /// Checks an argument list: count first, then each position in order.
    fn check_args(
        &self,
        params: &[ParamDescriptor],
        args: &[Variable<'_>],
    ) -> core::result::Result<(), ReflectError> {
        if params.len() != args.len() {
            return Err(ReflectError::ArgumentCount {
                expected: params.len(),
                found: args.len(),
            });
        }
        params
            .iter()
            .zip(args)
            .enumerate()
            .try_for_each(|(position, (param, arg))| self.check_arg(position, param, arg))
    }

    /// Checks an argument list, converting mismatched arguments where a
    /// conversion is registered.
    ///
    /// Returns one entry per argument: the converted value, or `None` if the
    /// argument is used as is.
    fn convert_args(
        &self,
        params: &[ParamDescriptor],
        args: &[Variable<'_>],
    ) -> core::result::Result<Vec<Option<Value>>, ReflectError> {
        if params.len() != args.len() {
            return Err(ReflectError::ArgumentCount {
                expected: params.len(),
                found: args.len(),
            });
        }

        let mut converted = Vec::with_capacity(args.len());
        for (position, (param, arg)) in params.iter().zip(args).enumerate() {
            if self.check_arg(position, param, arg).is_ok() {
                converted.push(None);
                continue;
            }
            let target = self.base_type(param.type_index).unwrap_or(param.type_index);
            let conversion = self.find_conversion(arg.type_index, target).filter(|conversion| {
                Some(conversion.from_type_id) == arg.value.type_id()
                    && conversion.to_type_id == param.type_id
            });
            let Some(conversion) = conversion else {
                return Err(ReflectError::ConversionNotFound {
                    position,
                    from: self.describe(arg),
                    to: self.name_of(target),
                });
            };
            trace!(position, from = %self.describe(arg), to = %self.name_of(target), "converting argument");
            // SAFETY:
            // 1. The argument holds the conversion's source type, as just
            //    checked through its type id.
            converted.push(Some(unsafe { conversion.binding.convert(&arg.value) }));
        }
        Ok(converted)
    }

    /// Checks that `object` holds a value of the unqualified type `owner`.
    fn check_object(
        &self,
        owner: TypeIndex,
        owner_type_id: TypeId,
        object: &Variable<'_>,
    ) -> core::result::Result<(), ReflectError> {
        if !object.value.has_value() {
            return Err(ReflectError::EmptyHandle);
        }
        if self.holds(object, owner, owner_type_id) {
            Ok(())
        } else {
            Err(ReflectError::TypeMismatch {
                expected: self.name_of(owner),
                found: self.describe(object),
            })
        }
    }

    /// Constructs a value with `constructor`.
    ///
    /// # Errors
    ///
    /// Fails without constructing anything if the argument count or any
    /// argument type does not match the constructor's parameters.
    pub fn construct(
        &self,
        constructor: &ConstructorDescriptor,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'_>> {
        self.check_args(&constructor.params, args)
            .map_err(|error| reject(error, "constructor of", &self.name_of(constructor.type_index)))?;
        // SAFETY:
        // 1. The arguments were checked against the constructor's parameters.
        Ok(unsafe { self.construct_unchecked(constructor, args) })
    }

    /// Constructs a value with a constructor that takes no arguments.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::ArgumentCount`] if the constructor declares
    /// parameters.
    pub fn construct_default(&self, constructor: &ConstructorDescriptor) -> Result<Variable<'_>> {
        self.construct(constructor, &mut [])
    }

    /// Constructs a value of `ty` with the first constructor whose
    /// parameters match `args` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::NotFound`] if `ty` has no constructors, or the
    /// validation error of its first constructor if none matches.
    pub fn create(&self, ty: TypeIndex, args: &mut [Variable<'_>]) -> Result<Variable<'_>> {
        let mut first_error = None;
        for constructor in self.constructors_of(ty) {
            match self.check_args(&constructor.params, args) {
                // SAFETY:
                // 1. The arguments were checked against the constructor's
                //    parameters.
                Ok(()) => return Ok(unsafe { self.construct_unchecked(constructor, args) }),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        let name = self.name_of(ty);
        match first_error {
            Some(error) => Err(reject(error, "constructor of", &name)),
            None => fail!(ReflectError::NotFound {
                kind: "constructor",
                name: name.into_owned(),
            }),
        }
    }

    /// Constructs a value without validating the arguments.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `args` has one element per constructor parameter, and each holds a
    ///    value of that parameter's unqualified type (or nothing, if the
    ///    parameter is optional).
    pub unsafe fn construct_unchecked(
        &self,
        constructor: &ConstructorDescriptor,
        args: &mut [Variable<'_>],
    ) -> Variable<'_> {
        trace!(ty = %constructor.type_index, args = args.len(), "constructing");
        let value = lend_values(args, core::iter::repeat_with(|| None), |values| {
            // SAFETY:
            // 1. Guaranteed by the caller
            unsafe { constructor.binding.invoke(values) }
        });
        Variable::attached(value, constructor.type_index, self)
    }

    /// Calls a free function.
    ///
    /// Arguments bound to `&mut T` or `Option<&mut T>` parameters are
    /// updated in place.
    ///
    /// # Errors
    ///
    /// Fails without calling anything if the argument count or any argument
    /// type does not match the function's parameters.
    pub fn call(
        &self,
        function: &FunctionDescriptor,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'_>> {
        self.check_args(&function.params, args)
            .map_err(|error| reject(error, "function", function.name))?;
        // SAFETY:
        // 1. The arguments were checked against the function's parameters.
        Ok(unsafe { self.call_unchecked(function, args) })
    }

    /// Calls a free function with a statically typed argument list.
    ///
    /// The element types are compared with the declared parameters before
    /// anything is erased. Since the arguments are passed by value,
    /// reference parameters see temporaries.
    ///
    /// # Errors
    ///
    /// Fails without calling anything if the argument count or any argument
    /// type does not match the function's parameters.
    pub fn call_typed<A: ArgList>(
        &self,
        function: &FunctionDescriptor,
        args: A,
    ) -> Result<Variable<'_>> {
        let types = A::type_infos();
        if types.len() != function.params.len() {
            fail!(
                ReflectError::ArgumentCount {
                    expected: function.params.len(),
                    found: types.len(),
                },
                format!("while invoking function `{}`", function.name)
            );
        }
        for (position, (param, ty)) in function.params.iter().zip(&types).enumerate() {
            if ty.type_id() != param.type_id {
                fail!(
                    ReflectError::ArgumentType {
                        position,
                        expected: self.name_of(param.type_index),
                        found: Cow::Borrowed(ty.name()),
                    },
                    format!("while invoking function `{}`", function.name)
                );
            }
        }
        let mut args: Vec<Variable<'_>> = args
            .into_values()
            .into_iter()
            .map(|value| self.adopt(value))
            .collect();
        self.call(function, &mut args)
    }

    /// Calls a free function, converting arguments whose type does not match
    /// but for which a conversion to the parameter type is registered.
    ///
    /// Converted arguments are passed as temporaries, so in-place updates to
    /// them are not written back.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::ArgumentCount`] on a count mismatch and
    /// [`ReflectError::ConversionNotFound`] for the first argument that
    /// neither matches nor converts. Nothing is called in either case.
    pub fn call_with_conversion(
        &self,
        function: &FunctionDescriptor,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'_>> {
        let converted = self
            .convert_args(&function.params, args)
            .map_err(|error| reject(error, "function", function.name))?;
        trace!(function = function.name, args = args.len(), "calling function");
        let value = lend_values(args, converted, |values| {
            // SAFETY:
            // 1. Every value either passed the argument check or was produced
            //    by a conversion to the parameter's type.
            unsafe { function.binding.invoke(values) }
        });
        Ok(Variable::attached(value, function.return_type, self))
    }

    /// Calls a free function without validating the arguments.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `args` has one element per function parameter, and each holds a
    ///    value of that parameter's unqualified type (or nothing, if the
    ///    parameter is optional).
    pub unsafe fn call_unchecked(
        &self,
        function: &FunctionDescriptor,
        args: &mut [Variable<'_>],
    ) -> Variable<'_> {
        trace!(function = function.name, args = args.len(), "calling function");
        let value = lend_values(args, core::iter::repeat_with(|| None), |values| {
            // SAFETY:
            // 1. Guaranteed by the caller
            unsafe { function.binding.invoke(values) }
        });
        Variable::attached(value, function.return_type, self)
    }

    /// Calls the first overload of the function `name` whose parameters match
    /// `args` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::NotFound`] if no function has that name, or
    /// the validation error of the first overload if none matches.
    pub fn call_function(&self, name: &str, args: &mut [Variable<'_>]) -> Result<Variable<'_>> {
        let mut first_error = None;
        for function in self.functions_named(name) {
            match self.check_args(&function.params, args) {
                // SAFETY:
                // 1. The arguments were checked against the function's
                //    parameters.
                Ok(()) => return Ok(unsafe { self.call_unchecked(function, args) }),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(reject(error, "function", name)),
            None => fail!(ReflectError::NotFound {
                kind: "function",
                name: name.into(),
            }),
        }
    }

    /// Calls a member function on `object`, which is updated in place.
    ///
    /// # Errors
    ///
    /// Fails without calling anything if `object` is empty or of another
    /// type, or if the arguments do not match the method's parameters.
    pub fn call_method(
        &self,
        method: &MethodDescriptor,
        object: &mut Variable<'_>,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'_>> {
        self.check_object(method.owner, method.owner_type_id, object)
            .and_then(|()| self.check_args(&method.params, args))
            .map_err(|error| reject(error, "method", method.name))?;
        // SAFETY:
        // 1. The object and the arguments were checked against the method.
        Ok(unsafe { self.call_method_unchecked(method, object, args) })
    }

    /// Calls a member function, converting mismatched arguments where a
    /// conversion is registered.
    ///
    /// The object itself is never converted.
    ///
    /// # Errors
    ///
    /// As [`call_method`](Self::call_method), with
    /// [`ReflectError::ConversionNotFound`] for arguments that neither match
    /// nor convert.
    pub fn call_method_with_conversion(
        &self,
        method: &MethodDescriptor,
        object: &mut Variable<'_>,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'_>> {
        let converted = self
            .check_object(method.owner, method.owner_type_id, object)
            .and_then(|()| self.convert_args(&method.params, args))
            .map_err(|error| reject(error, "method", method.name))?;
        trace!(method = method.name, args = args.len(), "calling method");
        let value = lend_values(args, converted, |values| {
            // SAFETY:
            // 1. The object was checked against the owner.
            // 2. The count was checked.
            // 3. Every value either passed the argument check or was produced
            //    by a conversion to the parameter's type.
            unsafe { method.binding.invoke(&mut object.value, values) }
        });
        Ok(Variable::attached(value, method.return_type, self))
    }

    /// Calls a member function without validating anything.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `object` holds a value of the method's owning type.
    /// 2. `args` has one element per method parameter, and each holds a
    ///    value of that parameter's unqualified type (or nothing, if the
    ///    parameter is optional).
    pub unsafe fn call_method_unchecked(
        &self,
        method: &MethodDescriptor,
        object: &mut Variable<'_>,
        args: &mut [Variable<'_>],
    ) -> Variable<'_> {
        trace!(method = method.name, args = args.len(), "calling method");
        let value = lend_values(args, core::iter::repeat_with(|| None), |values| {
            // SAFETY:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            // 3. Guaranteed by the caller
            unsafe { method.binding.invoke(&mut object.value, values) }
        });
        Variable::attached(value, method.return_type, self)
    }

    /// Calls the first overload of the member function `name` of `object`'s
    /// type whose parameters match `args` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::EmptyHandle`] if `object` is empty,
    /// [`ReflectError::NotFound`] if its type has no such method, or the
    /// validation error of the first overload if none matches.
    pub fn call_method_by_name(
        &self,
        object: &mut Variable<'_>,
        name: &str,
        args: &mut [Variable<'_>],
    ) -> Result<Variable<'_>> {
        if !object.value.has_value() {
            fail!(ReflectError::EmptyHandle, format!("while invoking method `{name}`"));
        }
        let mut first_error = None;
        for method in self.methods_named(object.type_index, name) {
            match self
                .check_object(method.owner, method.owner_type_id, object)
                .and_then(|()| self.check_args(&method.params, args))
            {
                // SAFETY:
                // 1. The object and the arguments were checked against the
                //    method.
                Ok(()) => return Ok(unsafe { self.call_method_unchecked(method, object, args) }),
                Err(error) => {
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(reject(error, "method", name)),
            None => fail!(ReflectError::NotFound {
                kind: "method",
                name: format!("{}::{name}", self.name_of(object.type_index)),
            }),
        }
    }

    /// Reads a member variable of `object`.
    ///
    /// # Errors
    ///
    /// Fails if `object` is empty or not of the field's owning type.
    pub fn get_field(&self, field: &FieldDescriptor, object: &Variable<'_>) -> Result<Variable<'_>> {
        self.check_object(field.owner, field.owner_type_id, object)
            .map_err(|error| reject(error, "field", field.name))?;
        trace!(field = field.name, "reading field");
        // SAFETY:
        // 1. The object was checked against the owner.
        let value = unsafe { field.getter.get(&object.value) };
        Ok(Variable::attached(value, field.value_type, self))
    }

    /// Overwrites a member variable of `object` with a copy of `value`.
    ///
    /// # Errors
    ///
    /// Fails without writing if `object` is empty or not of the owning type,
    /// or if `value` is not of the field's type.
    pub fn set_field(
        &self,
        field: &FieldDescriptor,
        object: &mut Variable<'_>,
        value: &Variable<'_>,
    ) -> Result<()> {
        self.check_object(field.owner, field.owner_type_id, object)
            .and_then(|()| {
                if self.holds(value, field.value_type, field.value_type_id) {
                    Ok(())
                } else {
                    Err(ReflectError::TypeMismatch {
                        expected: self.name_of(field.value_type),
                        found: self.describe(value),
                    })
                }
            })
            .map_err(|error| reject(error, "field", field.name))?;
        trace!(field = field.name, "writing field");
        // SAFETY:
        // 1. The object was checked against the owner.
        // 2. The value was checked against the field type.
        unsafe { field.setter.set(&mut object.value, &value.value) };
        Ok(())
    }

    /// Applies a conversion to `value`.
    ///
    /// # Errors
    ///
    /// Fails if `value` is empty or not of the conversion's source type.
    pub fn convert(
        &self,
        conversion: &ConversionDescriptor,
        value: &Variable<'_>,
    ) -> Result<Variable<'_>> {
        self.check_object(conversion.from, conversion.from_type_id, value)
            .map_err(|error| reject(error, "conversion to", &self.name_of(conversion.to)))?;
        trace!(from = %conversion.from, to = %conversion.to, "converting");
        // SAFETY:
        // 1. The value was checked against the source type.
        let converted = unsafe { conversion.binding.convert(&value.value) };
        Ok(Variable::attached(converted, conversion.to, self))
    }

    /// Converts `value` to the type `target`.
    ///
    /// A value that already has that type is copied.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::EmptyHandle`] for an empty value and
    /// [`ReflectError::ConversionNotFound`] if no conversion is registered.
    pub fn convert_to(&self, value: &Variable<'_>, target: TypeIndex) -> Result<Variable<'_>> {
        if !value.value.has_value() {
            fail!(ReflectError::EmptyHandle);
        }
        let target = self.base_type(target).unwrap_or(target);
        if value.type_index == target && self.type_descriptor(target).is_some() {
            return Ok(Variable::attached(value.value.clone(), target, self));
        }
        match self.find_conversion(value.type_index, target) {
            Some(conversion) => self.convert(conversion, value),
            None => fail!(ReflectError::ConversionNotFound {
                position: 0,
                from: self.describe(value),
                to: self.name_of(target),
            }),
        }
    }

    /// Renders `value` with its serializer `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::EmptyHandle`] for an empty value and
    /// [`ReflectError::NotFound`] if its type has no such serializer.
    pub fn serialize(&self, value: &Variable<'_>, name: &str) -> Result<String> {
        if !value.value.has_value() {
            fail!(ReflectError::EmptyHandle, format!("while invoking serializer `{name}`"));
        }
        let serializer = self
            .find_serializer(value.type_index, name)
            .filter(|serializer| value.value.type_id() == Some(serializer.type_id));
        let Some(serializer) = serializer else {
            fail!(ReflectError::NotFound {
                kind: "serializer",
                name: format!("{}::{name}", self.describe(value)),
            });
        };
        // SAFETY:
        // 1. The value has the serializer's type, as just checked.
        Ok(unsafe { serializer.binding.serialize(&value.value) })
    }

    /// Parses `text` into a value of `ty` with its serializer `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ReflectError::NotFound`] if `ty` has no such serializer and
    /// [`ReflectError::Deserialize`] if the text is rejected.
    pub fn deserialize(&self, ty: TypeIndex, name: &str, text: &str) -> Result<Variable<'_>> {
        let Some(serializer) = self.find_serializer(ty, name) else {
            fail!(ReflectError::NotFound {
                kind: "serializer",
                name: format!("{}::{name}", self.name_of(ty)),
            });
        };
        match serializer.binding.deserialize(text) {
            Ok(value) => Ok(Variable::attached(value, serializer.type_index, self)),
            Err(reason) => fail!(ReflectError::Deserialize {
                type_name: self.name_of(serializer.type_index),
                text: text.into(),
                reason,
            }),
        }
    }
}
