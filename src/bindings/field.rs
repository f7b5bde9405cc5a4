//! Bindings for member variables.

use core::marker::PhantomData;

use triomphe::Arc;
use unsize::CoerceUnsize;

use super::{Binding, FieldGetter, FieldSetter};
use crate::value::Value;

/// Accessors for one member `V` of an owner `T`.
struct FieldImpl<T, V, G, S> {
    /// Projects a shared owner onto the member.
    get: G,
    /// Projects an exclusive owner onto the member.
    set: S,
    /// The owner and member types.
    _marker: PhantomData<fn() -> (T, V)>,
}

impl<T, V, G, S> FieldGetter for FieldImpl<T, V, G, S>
where
    T: 'static,
    V: Clone + 'static,
    G: Fn(&T) -> &V + Send + Sync + 'static,
    S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    unsafe fn get(&self, object: &Value) -> Value {
        // SAFETY:
        // 1. The caller guarantees that `object` holds a `T`.
        let object = unsafe { object.downcast_ref_unchecked::<T>() };
        Value::new((self.get)(object).clone())
    }
}

impl<T, V, G, S> FieldSetter for FieldImpl<T, V, G, S>
where
    T: 'static,
    V: Clone + 'static,
    G: Fn(&T) -> &V + Send + Sync + 'static,
    S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    unsafe fn set(&self, object: &mut Value, value: &Value) {
        // SAFETY:
        // 1. The caller guarantees that `value` holds a `V`.
        let value = unsafe { value.downcast_ref_unchecked::<V>() }.clone();
        // SAFETY:
        // 1. The caller guarantees that `object` holds a `T`.
        let object = unsafe { object.downcast_mut_unchecked::<T>() };
        *(self.set)(object) = value;
    }
}

/// Erases a pair of member projections into a getter and a setter.
///
/// Both bindings share one allocation.
pub fn field_bindings<T, V, G, S>(
    get: G,
    set: S,
) -> (Binding<dyn FieldGetter>, Binding<dyn FieldSetter>)
where
    T: 'static,
    V: Clone + 'static,
    G: Fn(&T) -> &V + Send + Sync + 'static,
    S: Fn(&mut T) -> &mut V + Send + Sync + 'static,
{
    let field: Arc<FieldImpl<T, V, G, S>> = Arc::new(FieldImpl {
        get,
        set,
        _marker: PhantomData,
    });
    let getter = Arc::clone(&field).unsize(unsize::Coercion!(to dyn FieldGetter));
    let setter = field.unsize(unsize::Coercion!(to dyn FieldSetter));
    (Binding::from_arc(getter), Binding::from_arc(setter))
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[derive(Clone)]
    struct Person {
        name: String,
    }

    #[test]
    fn test_get_then_set() {
        let (getter, setter) =
            field_bindings(|p: &Person| &p.name, |p: &mut Person| &mut p.name);

        let mut object = Value::new(Person {
            name: String::from("Ada"),
        });
        // SAFETY: The object is a `Person`.
        let name = unsafe { getter.get(&object) };
        assert_eq!(name.downcast_ref::<String>().unwrap(), "Ada");

        // SAFETY: The object is a `Person` and the value is a `String`.
        unsafe { setter.set(&mut object, &Value::new(String::from("Grace"))) };
        assert_eq!(
            object.downcast_ref::<Person>().unwrap().name,
            String::from("Grace")
        );
    }
}
