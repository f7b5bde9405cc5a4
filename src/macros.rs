/// Implements [`Param`](crate::param::Param) for types passed by value.
///
/// Bound functions may take any `Clone + 'static` type by value, but the
/// trait has to be implemented for it first. The argument is cloned out of
/// its slot, so the caller's handle keeps its value.
///
/// The primitive types, `String` and `Vec<T>` are already covered.
///
/// # Examples
///
/// ```
/// use dynreflect::{Registry, value_param};
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Celsius(f64);
///
/// value_param!(Celsius);
///
/// let registry = Registry::builder()
///     .with_primitives()
///     .register_type::<Celsius>()
///     .function("fahrenheit", |c: Celsius| c.0 * 1.8 + 32.0)
///     .build();
///
/// let fahrenheit = registry.find_function("fahrenheit").unwrap();
/// let result = registry
///     .call(fahrenheit, &mut [registry.wrap(Celsius(100.0))])
///     .unwrap();
/// assert_eq!(result.downcast_ref::<f64>(), Some(&212.0));
/// ```
#[macro_export]
macro_rules! value_param {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::param::Param for $ty {
                type Base = $ty;
                type Item<'a> = $ty;
                const QUALIFIER: $crate::param::Qualifier = $crate::param::Qualifier::Value;

                #[inline]
                unsafe fn unpack<'a>(slot: &'a mut $crate::Value) -> $ty {
                    // SAFETY:
                    // 1. Guaranteed by the caller
                    ::core::clone::Clone::clone(unsafe { slot.downcast_ref_unchecked::<$ty>() })
                }
            }
        )*
    };
}

/// Returns early with a [`ReflectError`](crate::ReflectError) report.
///
/// Extra arguments are added to the report as attachments.
macro_rules! fail {
    ($error:expr $(, $attachment:expr)* $(,)?) => {
        return ::core::result::Result::Err(
            ::rootcause::Report::new($error)$(.attach($attachment))*
        )
    };
}

pub(crate) use fail;
