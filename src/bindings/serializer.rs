//! Bindings for string serializers.

use alloc::string::String;
use core::marker::PhantomData;

use triomphe::Arc;
use unsize::CoerceUnsize;

use super::{Binding, SerializerBinding};
use crate::{handlers::SerializeHandler, value::Value};

/// A serialization handler applied to `T`.
struct SerializerImpl<T, H> {
    /// The type and the handler.
    _marker: PhantomData<fn() -> (T, H)>,
}

impl<T, H> SerializerBinding for SerializerImpl<T, H>
where
    T: Clone + 'static,
    H: SerializeHandler<T>,
{
    unsafe fn serialize(&self, value: &Value) -> String {
        // SAFETY:
        // 1. The caller guarantees that `value` holds a `T`.
        let value = unsafe { value.downcast_ref_unchecked::<T>() };
        H::serialize(value)
    }

    fn deserialize(&self, text: &str) -> Result<Value, String> {
        H::deserialize(text).map(Value::new)
    }
}

/// Erases the handler `H` for the type `T`.
#[must_use]
pub fn serializer_binding<T, H>() -> Binding<dyn SerializerBinding>
where
    T: Clone + 'static,
    H: SerializeHandler<T>,
{
    let binding: Arc<SerializerImpl<T, H>> = Arc::new(SerializerImpl {
        _marker: PhantomData,
    });
    Binding::from_arc(binding.unsize(unsize::Coercion!(to dyn SerializerBinding)))
}
