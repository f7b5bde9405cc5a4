//! Bindings for conversions between registered types.

use core::marker::PhantomData;

use triomphe::Arc;
use unsize::CoerceUnsize;

use super::{Binding, ConversionBinding};
use crate::value::Value;

/// A conversion function from `A` to `B`.
struct ConversionImpl<A, B, F> {
    /// The wrapped conversion.
    func: F,
    /// The source and target types.
    _marker: PhantomData<fn(A) -> B>,
}

impl<A, B, F> ConversionBinding for ConversionImpl<A, B, F>
where
    A: 'static,
    B: Clone + 'static,
    F: Fn(&A) -> B + Send + Sync + 'static,
{
    unsafe fn convert(&self, source: &Value) -> Value {
        // SAFETY:
        // 1. The caller guarantees that `source` holds an `A`.
        let source = unsafe { source.downcast_ref_unchecked::<A>() };
        Value::new((self.func)(source))
    }
}

/// Erases a conversion function from `A` to `B`.
pub fn conversion_binding<A, B, F>(func: F) -> Binding<dyn ConversionBinding>
where
    A: 'static,
    B: Clone + 'static,
    F: Fn(&A) -> B + Send + Sync + 'static,
{
    let binding: Arc<ConversionImpl<A, B, F>> = Arc::new(ConversionImpl {
        func,
        _marker: PhantomData,
    });
    Binding::from_arc(binding.unsize(unsize::Coercion!(to dyn ConversionBinding)))
}
