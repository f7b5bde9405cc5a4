//! Module containing the owned, type-erased value container

pub(crate) mod inline;
mod raw;
pub(crate) mod vtable;

pub use self::{
    inline::{INLINE_CAPACITY, fits_inline},
    raw::RawValue,
};
