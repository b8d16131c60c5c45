//! Capability sets: the operations callable on a stored value after its
//! type is erased.
//!
//! A capability set is declared once and named as the first type parameter
//! of [`Valise`]. The [`Capabilities`] trait declares *what* the operations
//! are — a plain struct of erased function pointers, one per operation — and
//! [`Supports<T>`](Supports) is the compile-time predicate binding those
//! operations to each qualifying type. Storing a value only requires the
//! `C: Supports<T>` bound to hold; a type missing an operation is rejected
//! at the construction call site.
//!
//! The unit type `()` is the empty set, and tuples up to arity four compose
//! sets: `(Fmt, MySet)` declares the union of both.
//!
//! # Writing a set
//!
//! A set author supplies three things: the set marker, the slots struct, and
//! a blanket [`Supports`] impl over all qualifying types. Safe wrappers over
//! [`Valise::slots`] and [`Valise::payload_ptr`] complete the surface; the
//! [`Fmt`] set in this module is the worked example, down to its
//! payload-forwarding [`Display`](core::fmt::Display) impl.

use core::{fmt, ptr::NonNull};

pub use valise_internals::{Capabilities, Supports};
use valise_internals::{Erased, SpillAlloc};

use crate::Valise;

/// Capability set exposing the stored value's [`Display`](fmt::Display) and
/// [`Debug`](fmt::Debug).
///
/// Any type implementing both qualifies. A `Valise<Fmt, _, _>` forwards its
/// own `Display` to the stored value, and [`Valise::debug_payload`] adapts
/// the stored value's `Debug`:
///
/// ```
/// use valise::{Valise, caps::Fmt};
///
/// let v: Valise<Fmt> = Valise::new(0.5_f64);
/// assert_eq!(v.to_string(), "0.5");
/// assert_eq!(format!("{:?}", v.debug_payload()), "0.5");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct Fmt;

/// Operation slots for [`Fmt`], bound to one concrete payload type.
#[derive(Clone, Copy)]
pub struct FmtSlots {
    /// Formats the payload with its [`fmt::Display`] impl.
    display: unsafe fn(NonNull<Erased>, &mut fmt::Formatter<'_>) -> fmt::Result,
    /// Formats the payload with its [`fmt::Debug`] impl.
    debug: unsafe fn(NonNull<Erased>, &mut fmt::Formatter<'_>) -> fmt::Result,
}

impl FmtSlots {
    /// Formats the payload at `payload` with the `Display` impl these slots
    /// were bound to.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `payload` is the projected payload address of a live value of the
    ///    exact type these slots were bound to, valid for reads for the
    ///    duration of the call.
    pub unsafe fn display(
        &self,
        payload: NonNull<Erased>,
        formatter: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        // SAFETY: `self.display` points to `display_erased::<T>` for the
        // bound payload type; its requirement is guaranteed by the caller.
        unsafe { (self.display)(payload, formatter) }
    }

    /// Formats the payload at `payload` with the `Debug` impl these slots
    /// were bound to.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `payload` is the projected payload address of a live value of the
    ///    exact type these slots were bound to, valid for reads for the
    ///    duration of the call.
    pub unsafe fn debug(
        &self,
        payload: NonNull<Erased>,
        formatter: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        // SAFETY: `self.debug` points to `debug_erased::<T>` for the bound
        // payload type; its requirement is guaranteed by the caller.
        unsafe { (self.debug)(payload, formatter) }
    }
}

impl Capabilities for Fmt {
    type Slots = FmtSlots;
}

impl<T: fmt::Display + fmt::Debug + 'static> Supports<T> for Fmt {
    const SLOTS: FmtSlots = FmtSlots {
        display: display_erased::<T>,
        debug: debug_erased::<T>,
    };
}

/// Formats the erased payload with `T`'s [`fmt::Display`] impl.
///
/// # Safety
///
/// `payload` must point to a live `T` valid for reads.
unsafe fn display_erased<T: fmt::Display>(
    payload: NonNull<Erased>,
    formatter: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    // SAFETY: guaranteed by the caller.
    let value = unsafe { payload.cast::<T>().as_ref() };
    fmt::Display::fmt(value, formatter)
}

/// Formats the erased payload with `T`'s [`fmt::Debug`] impl.
///
/// # Safety
///
/// `payload` must point to a live `T` valid for reads.
unsafe fn debug_erased<T: fmt::Debug>(
    payload: NonNull<Erased>,
    formatter: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    // SAFETY: guaranteed by the caller.
    let value = unsafe { payload.cast::<T>().as_ref() };
    fmt::Debug::fmt(value, formatter)
}

impl<S, A: SpillAlloc> fmt::Display for Valise<Fmt, S, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: the slots and the payload address come from the same
        // container, so the bound type matches the live payload.
        unsafe { self.slots().display(self.payload_ptr(), formatter) }
    }
}

impl<S, A: SpillAlloc> Valise<Fmt, S, A> {
    /// Adapts the stored value's [`fmt::Debug`] impl.
    ///
    /// The container's own [`Debug`](fmt::Debug) impl prints storage
    /// metadata for any capability set; this adapter reaches the payload
    /// itself.
    pub fn debug_payload(&self) -> impl fmt::Debug + '_ {
        PayloadDebug(self)
    }
}

/// Adapter forwarding `Debug` to the payload of a [`Fmt`] container.
struct PayloadDebug<'a, S, A: SpillAlloc>(&'a Valise<Fmt, S, A>);

impl<S, A: SpillAlloc> fmt::Debug for PayloadDebug<'_, S, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        // SAFETY: the slots and the payload address come from the same
        // container, so the bound type matches the live payload.
        unsafe { self.0.slots().debug(self.0.payload_ptr(), formatter) }
    }
}
