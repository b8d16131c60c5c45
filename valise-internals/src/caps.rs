//! Contracts for declaring capability sets.
//!
//! A *capability set* is the list of operation kinds a concrete type must
//! support in order to be storable in a slot. The built-in operation kinds
//! (destroy, relocate, take, project) are not part of any set; every
//! operation table carries them unconditionally. A set only declares the
//! caller-visible operations, as a plain struct of erased function pointers.
//!
//! Two traits split the contract:
//!
//! - [`Capabilities`] declares *what* the operations are, via the
//!   [`Slots`](Capabilities::Slots) associated type.
//! - [`Supports<T>`] is the capability predicate: `C: Supports<T>` holds
//!   exactly when every operation in `C` is realizable for `T`, and its
//!   [`SLOTS`](Supports::SLOTS) constant binds each operation to `T`.
//!
//! Making the binding an associated *constant* (rather than a method) is what
//! allows operation tables to be assembled in `const` context and promoted to
//! shared `&'static` instances.
//!
//! The unit type `()` is the empty capability set, and tuples of sets up to
//! arity four compose into larger sets, so callers can mix independent sets
//! without writing new glue.

/// A set of caller-declared operation kinds.
///
/// Implementors are typically unit structs acting as a name for the set; the
/// actual content lives in the [`Slots`](Capabilities::Slots) type, which
/// holds one erased function pointer per declared operation kind.
///
/// Every slot function must follow the uniform address-in/result-out shape
/// `unsafe fn(NonNull<Erased>, args...) -> R`, where the first argument is
/// the address of the live payload. Slots never receive the address of the
/// heap spill shim; the slot machinery resolves the payload address before
/// dispatching.
pub trait Capabilities: 'static {
    /// Table of erased function pointers, one per declared operation kind,
    /// bound to some concrete payload type by [`Supports::SLOTS`].
    type Slots: 'static;
}

/// Capability predicate: every operation kind in `Self` is realizable for
/// `T`.
///
/// A bound `C: Supports<T>` is the compile-time qualification test for
/// storing a `T` in a slot over the set `C`. A type that fails the predicate
/// is rejected at the call site that would construct a slot from it; there is
/// no runtime counterpart to this error.
///
/// Set authors implement this once per set, generically over all qualifying
/// types:
///
/// ```
/// use core::ptr::NonNull;
///
/// use valise_internals::{Capabilities, Erased, Supports};
///
/// struct Describe;
///
/// struct DescribeSlots {
///     describe: unsafe fn(NonNull<Erased>) -> &'static str,
/// }
///
/// impl Capabilities for Describe {
///     type Slots = DescribeSlots;
/// }
///
/// impl<T: 'static> Supports<T> for Describe {
///     const SLOTS: DescribeSlots = DescribeSlots {
///         describe: describe_erased::<T>,
///     };
/// }
///
/// /// # Safety
/// ///
/// /// `payload` must point to a live `T`.
/// unsafe fn describe_erased<T: 'static>(payload: NonNull<Erased>) -> &'static str {
///     let _ = payload;
///     core::any::type_name::<T>()
/// }
/// ```
pub trait Supports<T: 'static>: Capabilities {
    /// The declared operations of this set, each bound to `T`.
    const SLOTS: Self::Slots;
}

impl Capabilities for () {
    type Slots = ();
}

impl<T: 'static> Supports<T> for () {
    const SLOTS: () = ();
}

impl<A: Capabilities> Capabilities for (A,) {
    type Slots = (A::Slots,);
}

impl<T: 'static, A: Supports<T>> Supports<T> for (A,) {
    const SLOTS: (A::Slots,) = (A::SLOTS,);
}

impl<A: Capabilities, B: Capabilities> Capabilities for (A, B) {
    type Slots = (A::Slots, B::Slots);
}

impl<T: 'static, A: Supports<T>, B: Supports<T>> Supports<T> for (A, B) {
    const SLOTS: (A::Slots, B::Slots) = (A::SLOTS, B::SLOTS);
}

impl<A: Capabilities, B: Capabilities, C: Capabilities> Capabilities for (A, B, C) {
    type Slots = (A::Slots, B::Slots, C::Slots);
}

impl<T: 'static, A: Supports<T>, B: Supports<T>, C: Supports<T>> Supports<T> for (A, B, C) {
    const SLOTS: (A::Slots, B::Slots, C::Slots) = (A::SLOTS, B::SLOTS, C::SLOTS);
}

impl<A: Capabilities, B: Capabilities, C: Capabilities, D: Capabilities> Capabilities
    for (A, B, C, D)
{
    type Slots = (A::Slots, B::Slots, C::Slots, D::Slots);
}

impl<T: 'static, A: Supports<T>, B: Supports<T>, C: Supports<T>, D: Supports<T>> Supports<T>
    for (A, B, C, D)
{
    const SLOTS: (A::Slots, B::Slots, C::Slots, D::Slots) = (A::SLOTS, B::SLOTS, C::SLOTS, D::SLOTS);
}
