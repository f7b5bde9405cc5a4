//! Handlers that turn values into text and back.
//!
//! A handler is a type implementing [`SerializeHandler<T>`] for one or more
//! value types `T`. Registering it through
//! [`RegistryBuilder::serializer`](crate::RegistryBuilder::serializer) under a
//! name produces a serializer descriptor; a type may carry several
//! serializers with different names. The one named `"default"` (configurable
//! through [`RegistryOptions`](crate::RegistryOptions)) is what
//! [`Variable`](crate::Variable) uses for [`Display`](core::fmt::Display).
//!
//! # Built-in Handlers
//!
//! ## [`Text`]
//!
//! For types implementing both [`Display`](core::fmt::Display) and
//! [`FromStr`]. Leading whitespace is ignored, except for [`String`] and
//! [`char`], which are taken verbatim.
//!
//! Integers and floats read the longest leading numeric prefix in base 10 and
//! ignore whatever follows it, so `"42abc"` reads as `42` and `"7.5"` as the
//! integer `7`. Parsing fails only when there is no prefix or when the prefix
//! does not fit the type. Every other type must consume its whole (trimmed)
//! input.
//!
//! ## [`Hex`]
//!
//! For unsigned integers. Writes `0x`-prefixed lowercase hexadecimal and
//! reads it back with or without the prefix.
//!
//! # Examples
//!
//! ```
//! use dynreflect::handlers::{Hex, SerializeHandler, Text};
//!
//! assert_eq!(<Text as SerializeHandler<i32>>::serialize(&-12), "-12");
//! assert_eq!(<Text as SerializeHandler<i32>>::deserialize(" 42 "), Ok(42));
//! assert_eq!(<Text as SerializeHandler<i32>>::deserialize("42abc"), Ok(42));
//! assert_eq!(<Text as SerializeHandler<f64>>::deserialize("3.25kg"), Ok(3.25));
//! assert!(<Text as SerializeHandler<i32>>::deserialize("abc").is_err());
//!
//! assert_eq!(<Hex as SerializeHandler<u16>>::serialize(&255), "0xff");
//! assert_eq!(<Hex as SerializeHandler<u16>>::deserialize("FF"), Ok(255));
//! ```

use alloc::{
    format,
    string::{String, ToString},
};
use core::{any::TypeId, str::FromStr};

/// Converts values of type `T` to and from text.
///
/// Handlers are never instantiated; they only select the functions below.
pub trait SerializeHandler<T>: 'static {
    /// Renders `value` as text.
    fn serialize(value: &T) -> String;

    /// Parses `text`.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when `text` is malformed.
    fn deserialize(text: &str) -> Result<T, String>;
}

/// Handler for types implementing [`Display`](core::fmt::Display) and
/// [`FromStr`].
#[derive(Copy, Clone, Debug)]
pub struct Text;

impl<T> SerializeHandler<T> for Text
where
    T: core::fmt::Display + FromStr + 'static,
    T::Err: core::fmt::Display,
{
    fn serialize(value: &T) -> String {
        value.to_string()
    }

    fn deserialize(text: &str) -> Result<T, String> {
        let id = TypeId::of::<T>();
        let input = if id == TypeId::of::<String>() || id == TypeId::of::<char>() {
            text
        } else if is_integer(id) {
            numeric_prefix(text.trim_start(), false)
        } else if is_float(id) {
            numeric_prefix(text.trim_start(), true)
        } else {
            text.trim()
        };
        input.parse::<T>().map_err(|error| error.to_string())
    }
}

fn is_integer(id: TypeId) -> bool {
    [
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
    ]
    .contains(&id)
}

fn is_float(id: TypeId) -> bool {
    id == TypeId::of::<f32>() || id == TypeId::of::<f64>()
}

/// Returns the longest prefix of `text` that reads as a base-10 number.
///
/// The prefix is an optional sign followed by digits. With `float`, it may
/// also carry a fractional part, an exponent, or be one of `inf`, `infinity`
/// and `nan` in any case. The result is empty when `text` starts with none of
/// these, which the number parser then rejects.
fn numeric_prefix(text: &str, float: bool) -> &str {
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .position(|byte| !byte.is_ascii_digit())
            .map_or(bytes.len(), |offset| start + offset)
    };

    let sign = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    if float {
        let rest = &text[sign..];
        for word in ["infinity", "inf", "nan"] {
            if rest.get(..word.len()).is_some_and(|head| head.eq_ignore_ascii_case(word)) {
                return &text[..sign + word.len()];
            }
        }
    }

    let mut end = digits_from(sign);
    let mut has_digits = end > sign;
    if float {
        if bytes.get(end) == Some(&b'.') {
            let fraction_end = digits_from(end + 1);
            if has_digits || fraction_end > end + 1 {
                has_digits = true;
                end = fraction_end;
            }
        }
        if has_digits && matches!(bytes.get(end), Some(b'e' | b'E')) {
            let exponent_sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
            let exponent_start = end + 1 + exponent_sign;
            let exponent_end = digits_from(exponent_start);
            if exponent_end > exponent_start {
                end = exponent_end;
            }
        }
    }

    if has_digits { &text[..end] } else { "" }
}

/// Handler for unsigned integers in hexadecimal.
#[derive(Copy, Clone, Debug)]
pub struct Hex;

macro_rules! impl_hex {
    ($($ty:ty),*) => {
        $(
            impl SerializeHandler<$ty> for Hex {
                fn serialize(value: &$ty) -> String {
                    format!("{value:#x}")
                }

                fn deserialize(text: &str) -> Result<$ty, String> {
                    let text = text.trim();
                    let digits = text
                        .strip_prefix("0x")
                        .or_else(|| text.strip_prefix("0X"))
                        .unwrap_or(text);
                    <$ty>::from_str_radix(digits, 16).map_err(|error| error.to_string())
                }
            }
        )*
    };
}

impl_hex!(u8, u16, u32, u64, u128, usize);
