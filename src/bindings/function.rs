//! Bindings for free functions and constructors.

use alloc::vec;
use core::marker::PhantomData;

use triomphe::Arc;
use unsize::CoerceUnsize;

use super::{Binding, FunctionBinding, Signature};
use crate::{
    param::{Param, ParamItem, TypeInfo},
    value::Value,
};

/// Converts a closure or function item into an erased [`FunctionBinding`].
///
/// Implemented for everything that is `Fn(P0, .., Pn) -> R` for up to eight
/// parameters, where every `Pi` implements [`Param`] and `R` is
/// `Clone + 'static`. The `Marker` parameter only disambiguates the arities
/// and is inferred.
///
/// Reference parameters must be written with elided lifetimes
/// (`|x: &i32| ..`), so the closure accepts a borrow of any lifetime.
pub trait IntoFunction<Marker>: Sized + Send + Sync + 'static {
    /// Erases `self`, returning the binding and its static signature.
    fn into_function(self) -> (Binding<dyn FunctionBinding>, Signature);
}

/// A callable together with the signature it was registered under.
struct FunctionImpl<F, Marker> {
    /// The wrapped callable.
    func: F,
    /// The `fn(P0, .., Pn) -> R` marker.
    _marker: PhantomData<fn() -> Marker>,
}

macro_rules! impl_into_function {
    ($($param:ident $arg:ident),*) => {
        impl<F, R, $($param,)*> IntoFunction<fn($($param,)*) -> R> for F
        where
            F: Fn($($param),*) -> R
                + Fn($(ParamItem<'_, $param>),*) -> R
                + Send
                + Sync
                + 'static,
            R: Clone + 'static,
            $($param: Param + 'static,)*
        {
            fn into_function(self) -> (Binding<dyn FunctionBinding>, Signature) {
                let signature = Signature::new(vec![$($param::info()),*], TypeInfo::of::<R>());
                let binding: Arc<FunctionImpl<F, fn($($param,)*) -> R>> = Arc::new(FunctionImpl {
                    func: self,
                    _marker: PhantomData,
                });
                let binding = binding.unsize(unsize::Coercion!(to dyn FunctionBinding));
                (Binding::from_arc(binding), signature)
            }
        }

        impl<F, R, $($param,)*> FunctionBinding for FunctionImpl<F, fn($($param,)*) -> R>
        where
            F: Fn($($param),*) -> R
                + Fn($(ParamItem<'_, $param>),*) -> R
                + Send
                + Sync
                + 'static,
            R: Clone + 'static,
            $($param: Param + 'static,)*
        {
            unsafe fn invoke(&self, args: &mut [Value]) -> Value {
                // Naming the callable through a generic function lets rustc
                // pick the higher-ranked `Fn` bound.
                #[allow(clippy::too_many_arguments)]
                fn call_inner<R, $($param,)*>(func: impl Fn($($param),*) -> R, $($arg: $param,)*) -> R {
                    func($($arg),*)
                }

                let [$($arg,)*] = args else {
                    return Value::empty();
                };
                $(
                    // SAFETY:
                    // 1. The caller guarantees that every slot holds its
                    //    parameter's base type (or nothing, if optional).
                    let $arg = unsafe { <$param as Param>::unpack($arg) };
                )*
                Value::from_return(call_inner(&self.func, $($arg,)*))
            }
        }
    };
}

impl_into_function!();
impl_into_function!(P0 a0);
impl_into_function!(P0 a0, P1 a1);
impl_into_function!(P0 a0, P1 a1, P2 a2);
impl_into_function!(P0 a0, P1 a1, P2 a2, P3 a3);
impl_into_function!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4);
impl_into_function!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4, P5 a5);
impl_into_function!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4, P5 a5, P6 a6);
impl_into_function!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4, P5 a5, P6 a6, P7 a7);

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;
    use crate::param::Qualifier;

    fn erase<M>(f: impl IntoFunction<M>) -> (Binding<dyn FunctionBinding>, Signature) {
        f.into_function()
    }

    #[test]
    fn test_void_return() {
        let (binding, signature) = erase(|| {});
        assert!(signature.returns().is_unit());
        // SAFETY: No parameters, no arguments.
        let result = unsafe { binding.invoke(&mut []) };
        assert!(result.is_void());
    }

    #[test]
    fn test_value_and_reference_params() {
        let (binding, signature) = erase(|name: &String, times: usize| name.repeat(times));
        assert_eq!(signature.params().len(), 2);
        assert_eq!(signature.params()[0].qualifier, Qualifier::Ref);
        assert_eq!(signature.params()[1].qualifier, Qualifier::Value);

        let mut args = [Value::new(String::from("ab")), Value::new(3usize)];
        // SAFETY: The arguments match the signature.
        let result = unsafe { binding.invoke(&mut args) };
        assert_eq!(result.downcast_ref::<String>().unwrap(), "ababab");
    }

    #[test]
    fn test_out_params() {
        let (binding, _) = erase(|out: &mut i32, maybe: Option<&mut i32>| {
            *out = 1;
            if let Some(maybe) = maybe {
                *maybe = 2;
            }
        });

        let mut args = [Value::new(0i32), Value::new(0i32)];
        // SAFETY: The arguments match the signature.
        unsafe { binding.invoke(&mut args) };
        assert_eq!(args[0].get::<i32>(), Some(1));
        assert_eq!(args[1].get::<i32>(), Some(2));

        let mut args = [Value::new(0i32), Value::empty()];
        // SAFETY: The second parameter is optional, so an empty slot is fine.
        unsafe { binding.invoke(&mut args) };
        assert_eq!(args[0].get::<i32>(), Some(1));
    }

    #[test]
    fn test_function_items() {
        fn double(x: i64) -> i64 {
            x * 2
        }
        let (binding, signature) = erase(double);
        assert_eq!(signature.returns(), TypeInfo::of::<i64>());
        // SAFETY: The argument matches the signature.
        let result = unsafe { binding.invoke(&mut [Value::new(21i64)]) };
        assert_eq!(result.get::<i64>(), Some(42));
    }

    #[test]
    fn test_identity() {
        let (a, _) = erase(|| 1u8);
        let (b, _) = erase(|| 1u8);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }
}
