//! Internal utility types.

/// Marker type used when type-erasing values.
///
/// This zero-sized type serves as a placeholder in pointer types when the
/// actual concrete type has been erased. For example, `NonNull<Erased>`
/// points at a payload whose concrete type is only known to the vtable that
/// travels with it.
///
/// Using a distinct marker type (rather than `()`) makes the intent clearer
/// in type signatures and error messages.
pub(crate) struct Erased;
