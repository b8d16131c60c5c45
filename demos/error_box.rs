//! A fixed-size error carrier built on a custom capability set.
//!
//! This example demonstrates the capability-set extension seam end to end:
//! 1. Declaring an operation set (`Code`) and its erased slots
//! 2. Qualifying every type that implements a trait, via `Supports`
//! 3. Wrapping the raw slots in a safe extension trait
//! 4. Combining the custom set with the built-in `Fmt` set in a tuple

use core::ptr::NonNull;

use thiserror::Error;
use valise::{Erased, caps::Fmt, prelude::*};

/// The domain trait our stored errors must satisfy.
trait AppError: 'static {
    /// Stable numeric code for error recovery and logging.
    fn code(&self) -> u32;
}

/// Capability set exposing [`AppError::code`] on the erased value.
struct Code;

/// Operation slots for [`Code`], bound to one concrete error type.
struct CodeSlots {
    code: unsafe fn(NonNull<Erased>) -> u32,
}

impl Capabilities for Code {
    type Slots = CodeSlots;
}

impl<T: AppError> Supports<T> for Code {
    const SLOTS: CodeSlots = CodeSlots {
        code: code_erased::<T>,
    };
}

/// # Safety
///
/// `payload` must point to a live `T` valid for reads.
unsafe fn code_erased<T: AppError>(payload: NonNull<Erased>) -> u32 {
    // SAFETY: guaranteed by the caller.
    let error = unsafe { payload.cast::<T>().as_ref() };
    error.code()
}

/// The carrier: `Fmt` for rendering plus `Code` for recovery decisions.
type ErrorBox = Valise<(Fmt, Code), S4>;

/// Safe wrappers over the slots of an [`ErrorBox`].
trait ErrorBoxExt {
    /// The stored error's numeric code.
    fn code(&self) -> u32;
}

impl ErrorBoxExt for ErrorBox {
    fn code(&self) -> u32 {
        let (_, code_slots) = self.slots();
        // SAFETY: the slots and the payload address come from the same
        // container, so the bound type matches the live payload.
        unsafe { (code_slots.code)(self.payload_ptr()) }
    }
}

/// Forwards `Display` to the stored error through the `Fmt` half of the
/// tuple set.
struct Rendered<'a>(&'a ErrorBox);

impl core::fmt::Display for Rendered<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (fmt_slots, _) = self.0.slots();
        // SAFETY: the slots and the payload address come from the same
        // container, so the bound type matches the live payload.
        unsafe { fmt_slots.display(self.0.payload_ptr(), f) }
    }
}

// Two unrelated error types, derived the usual way.

#[derive(Debug, Error)]
#[error("configuration key `{key}` is missing")]
struct MissingKey {
    key: &'static str,
}

impl AppError for MissingKey {
    fn code(&self) -> u32 {
        404
    }
}

#[derive(Debug, Error)]
#[error("datastore rejected batch of {} rows: {reason}", .row_ids.len())]
struct BatchRejected {
    reason: String,
    /// Row identifiers of the rejected batch; bulky enough to spill.
    row_ids: [u64; 32],
}

impl AppError for BatchRejected {
    fn code(&self) -> u32 {
        503
    }
}

fn configure() -> Result<(), ErrorBox> {
    Err(Valise::new(MissingKey { key: "listen_addr" }))
}

fn ingest() -> Result<(), ErrorBox> {
    Err(Valise::new(BatchRejected {
        reason: String::from("replica lag"),
        row_ids: [0; 32],
    }))
}

fn main() {
    println!("=== Fixed-size error carrier ===\n");

    for result in [configure(), ingest()] {
        let Err(error) = result else { continue };

        println!(
            "code {:>3} (inline: {:5}): {}",
            error.code(),
            error.is_inline(),
            Rendered(&error)
        );
    }
}
