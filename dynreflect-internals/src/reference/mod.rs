//! Module containing the non-owning, type-erased references

mod raw;

pub use self::raw::{RawValueMut, RawValueRef};
