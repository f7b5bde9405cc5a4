//! Bindings for member functions.

use alloc::vec;
use core::marker::PhantomData;

use triomphe::Arc;
use unsize::CoerceUnsize;

use super::{Binding, MethodBinding, MethodSignature, Signature};
use crate::{
    param::{Param, ParamItem, Receiver, ReceiverItem, TypeInfo},
    value::Value,
};

/// Converts a method (or a closure taking the object first) into an erased
/// [`MethodBinding`].
///
/// Implemented for everything that is `Fn(Rc, P0, .., Pn) -> R` for up to
/// eight parameters after the receiver, where `Rc` is `&T` or `&mut T`.
/// Method paths such as `Point::length` work directly.
pub trait IntoMethod<Marker>: Sized + Send + Sync + 'static {
    /// Erases `self`, returning the binding and its static signature.
    fn into_method(self) -> (Binding<dyn MethodBinding>, MethodSignature);
}

/// A method together with the signature it was registered under.
struct MethodImpl<F, Marker> {
    /// The wrapped method.
    func: F,
    /// The `fn(Rc, P0, .., Pn) -> R` marker.
    _marker: PhantomData<fn() -> Marker>,
}

macro_rules! impl_into_method {
    ($($param:ident $arg:ident),*) => {
        impl<F, R, Rc, $($param,)*> IntoMethod<fn(Rc, $($param,)*) -> R> for F
        where
            F: Fn(Rc, $($param),*) -> R
                + Fn(ReceiverItem<'_, Rc>, $(ParamItem<'_, $param>),*) -> R
                + Send
                + Sync
                + 'static,
            R: Clone + 'static,
            Rc: Receiver + 'static,
            $($param: Param + 'static,)*
        {
            fn into_method(self) -> (Binding<dyn MethodBinding>, MethodSignature) {
                let signature = MethodSignature::new(
                    TypeInfo::of::<Rc::Owner>(),
                    Rc::IS_CONST,
                    Signature::new(vec![$($param::info()),*], TypeInfo::of::<R>()),
                );
                let binding: Arc<MethodImpl<F, fn(Rc, $($param,)*) -> R>> = Arc::new(MethodImpl {
                    func: self,
                    _marker: PhantomData,
                });
                let binding = binding.unsize(unsize::Coercion!(to dyn MethodBinding));
                (Binding::from_arc(binding), signature)
            }
        }

        impl<F, R, Rc, $($param,)*> MethodBinding for MethodImpl<F, fn(Rc, $($param,)*) -> R>
        where
            F: Fn(Rc, $($param),*) -> R
                + Fn(ReceiverItem<'_, Rc>, $(ParamItem<'_, $param>),*) -> R
                + Send
                + Sync
                + 'static,
            R: Clone + 'static,
            Rc: Receiver + 'static,
            $($param: Param + 'static,)*
        {
            unsafe fn invoke(&self, object: &mut Value, args: &mut [Value]) -> Value {
                // Naming the callable through a generic function lets rustc
                // pick the higher-ranked `Fn` bound.
                #[allow(clippy::too_many_arguments)]
                fn call_inner<R, Rc, $($param,)*>(
                    func: impl Fn(Rc, $($param),*) -> R,
                    receiver: Rc,
                    $($arg: $param,)*
                ) -> R {
                    func(receiver, $($arg),*)
                }

                let [$($arg,)*] = args else {
                    return Value::empty();
                };
                // SAFETY:
                // 1. The caller guarantees that `object` holds the owning type.
                let receiver = unsafe { <Rc as Receiver>::unpack(object) };
                $(
                    // SAFETY:
                    // 1. The caller guarantees that every slot holds its
                    //    parameter's base type (or nothing, if optional).
                    let $arg = unsafe { <$param as Param>::unpack($arg) };
                )*
                Value::from_return(call_inner(&self.func, receiver, $($arg,)*))
            }
        }
    };
}

impl_into_method!();
impl_into_method!(P0 a0);
impl_into_method!(P0 a0, P1 a1);
impl_into_method!(P0 a0, P1 a1, P2 a2);
impl_into_method!(P0 a0, P1 a1, P2 a2, P3 a3);
impl_into_method!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4);
impl_into_method!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4, P5 a5);
impl_into_method!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4, P5 a5, P6 a6);
impl_into_method!(P0 a0, P1 a1, P2 a2, P3 a3, P4 a4, P5 a5, P6 a6, P7 a7);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Counter {
        count: u32,
    }

    impl Counter {
        fn get(&self) -> u32 {
            self.count
        }

        fn add(&mut self, amount: u32) {
            self.count += amount;
        }
    }

    fn erase<M>(f: impl IntoMethod<M>) -> (Binding<dyn MethodBinding>, MethodSignature) {
        f.into_method()
    }

    #[test]
    fn test_const_method() {
        let (binding, signature) = erase(Counter::get);
        assert!(signature.is_const());
        assert_eq!(signature.owner(), TypeInfo::of::<Counter>());
        assert!(signature.params().is_empty());

        let mut object = Value::new(Counter { count: 3 });
        // SAFETY: The object is a `Counter` and there are no parameters.
        let result = unsafe { binding.invoke(&mut object, &mut []) };
        assert_eq!(result.get::<u32>(), Some(3));
    }

    #[test]
    fn test_mutating_method_writes_in_place() {
        let (binding, signature) = erase(Counter::add);
        assert!(!signature.is_const());
        assert!(signature.returns().is_unit());

        let mut object = Value::new(Counter { count: 1 });
        // SAFETY: The object is a `Counter` and the argument is a `u32`.
        let result = unsafe { binding.invoke(&mut object, &mut [Value::new(4u32)]) };
        assert!(result.is_void());
        assert_eq!(object.get::<Counter>(), Some(Counter { count: 5 }));
    }
}
