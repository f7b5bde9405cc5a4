//! The error type returned by every checked registry operation.
//!
//! Checked operations return [`Result<T>`](crate::Result), which wraps a
//! [`ReflectError`] in a [`rootcause::Report`]. The context of the report is
//! always the [`ReflectError`] itself, so callers can match on the failure
//! kind through [`Report::current_context`](rootcause::Report::current_context):
//!
//! ```
//! use dynreflect::{ReflectError, Registry};
//!
//! let registry = Registry::builder()
//!     .with_primitives()
//!     .function("add", |a: i32, b: i32| a + b)
//!     .build();
//!
//! let add = registry.find_function("add").unwrap();
//! let error = registry.call(add, &mut [registry.wrap(1i32)]).unwrap_err();
//! assert!(matches!(
//!     error.current_context(),
//!     ReflectError::ArgumentCount { expected: 2, found: 1 }
//! ));
//! ```

use alloc::{borrow::Cow, string::String};

use crate::descriptors::TypeIndex;

/// Describes why a reflected operation was rejected.
///
/// Validation always happens before anything is invoked: when one of these is
/// returned, no binding has run and no argument has been touched.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum ReflectError {
    /// The number of supplied arguments differs from the declared parameter
    /// count.
    #[error("expected {expected} argument(s), found {found}")]
    ArgumentCount {
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        found: usize,
    },

    /// An argument does not match its declared parameter type.
    #[error("argument {position} has type `{found}`, expected `{expected}`")]
    ArgumentType {
        /// Zero-based position of the first offending argument.
        position: usize,
        /// Name of the declared parameter type.
        expected: Cow<'static, str>,
        /// Name of the supplied argument type.
        found: Cow<'static, str>,
    },

    /// An argument has the wrong type and no conversion to the declared type
    /// is registered.
    #[error("argument {position}: no conversion from `{from}` to `{to}` is registered")]
    ConversionNotFound {
        /// Zero-based position of the first offending argument.
        position: usize,
        /// Name of the supplied argument type.
        from: Cow<'static, str>,
        /// Name of the declared parameter type.
        to: Cow<'static, str>,
    },

    /// No descriptor of the given kind has the given name.
    #[error("no {kind} named `{name}` is registered")]
    NotFound {
        /// What was looked up, e.g. `"function"` or `"member variable"`.
        kind: &'static str,
        /// The requested name.
        name: String,
    },

    /// The concrete Rust type of a value was never registered.
    #[error("type `{type_name}` is not registered")]
    UnregisteredType {
        /// Name of the unregistered type.
        type_name: &'static str,
    },

    /// A type index does not refer to a registered type.
    #[error("type index {index} is out of range")]
    InvalidTypeIndex {
        /// The offending index.
        index: TypeIndex,
    },

    /// The operation needed a value but the handle had none.
    #[error("the handle holds no value")]
    EmptyHandle,

    /// The operation needed a registry but the handle is not attached to one.
    #[error("the handle is not attached to a registry")]
    Detached,

    /// A value does not have the type the operation was declared for.
    #[error("value has type `{found}`, expected `{expected}`")]
    TypeMismatch {
        /// Name of the expected type.
        expected: Cow<'static, str>,
        /// Name of the supplied type.
        found: Cow<'static, str>,
    },

    /// A serializer rejected its input text.
    #[error("cannot deserialize `{type_name}` from {text:?}: {reason}")]
    Deserialize {
        /// Name of the target type.
        type_name: Cow<'static, str>,
        /// The rejected text.
        text: String,
        /// The serializer's explanation.
        reason: String,
    },

    /// A set of tables refers to types or bindings inconsistently.
    #[error("invalid registry table: {reason}")]
    InvalidTable {
        /// What is inconsistent.
        reason: String,
    },
}

impl ReflectError {
    /// Returns whether this error rejects an argument by its type.
    ///
    /// Both [`ArgumentType`](Self::ArgumentType) and
    /// [`ConversionNotFound`](Self::ConversionNotFound) count, since a
    /// missing conversion is a type mismatch that could not be repaired.
    #[must_use]
    pub fn is_argument_type_error(&self) -> bool {
        matches!(
            self,
            Self::ArgumentType { .. } | Self::ConversionNotFound { .. }
        )
    }

    /// Returns the position of the offending argument, if this error is
    /// about a single argument.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::ArgumentType { position, .. } | Self::ConversionNotFound { position, .. } => {
                Some(*position)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_messages() {
        let error = ReflectError::ArgumentCount {
            expected: 2,
            found: 3,
        };
        assert_eq!(error.to_string(), "expected 2 argument(s), found 3");

        let error = ReflectError::ConversionNotFound {
            position: 1,
            from: Cow::Borrowed("bool"),
            to: Cow::Borrowed("alloc::string::String"),
        };
        assert_eq!(
            error.to_string(),
            "argument 1: no conversion from `bool` to `alloc::string::String` is registered"
        );
    }

    #[test]
    fn test_classification() {
        let type_error = ReflectError::ArgumentType {
            position: 0,
            expected: Cow::Borrowed("i32"),
            found: Cow::Borrowed("f64"),
        };
        assert!(type_error.is_argument_type_error());
        assert_eq!(type_error.position(), Some(0));

        let count_error = ReflectError::ArgumentCount {
            expected: 0,
            found: 1,
        };
        assert!(!count_error.is_argument_type_error());
        assert_eq!(count_error.position(), None);
    }
}
