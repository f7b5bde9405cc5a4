//! A once-initialized cell that works with and without `std`.

#[cfg(feature = "std")]
type Inner<T> = std::sync::OnceLock<T>;

#[cfg(not(feature = "std"))]
type Inner<T> = spin::Once<T>;

/// A value computed on first use and shared afterwards.
#[repr(transparent)]
pub(crate) struct IndexCell<T>(Inner<T>);

impl<T> IndexCell<T> {
    #[must_use]
    pub(crate) const fn new() -> Self {
        Self(Inner::new())
    }

    #[inline]
    pub(crate) fn get_or_init(&self, init: impl FnOnce() -> T) -> &T {
        #[cfg(feature = "std")]
        let value = self.0.get_or_init(init);

        #[cfg(not(feature = "std"))]
        let value = self.0.call_once(init);

        value
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&T> {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initializes_once() {
        let cell = IndexCell::new();
        assert!(cell.get().is_none());
        assert_eq!(*cell.get_or_init(|| 1u32), 1);
        assert_eq!(*cell.get_or_init(|| 2u32), 1);
        assert_eq!(cell.get(), Some(&1));
    }
}
