//! Internal utility types.

/// Marker type standing in for a type-erased occupant or payload.
///
/// This zero-sized type serves as a placeholder behind raw pointers when the
/// actual concrete type has been erased. For example, `NonNull<Erased>`
/// represents the address of a value whose concrete type is unknown at the
/// current scope.
///
/// Using a distinct marker type (rather than `()` or `u8`) makes the intent
/// clearer in signatures and error messages. Caller-declared operation slots
/// name this type in their erased signatures, which is why it is public.
#[derive(Clone, Copy)]
pub struct Erased;
