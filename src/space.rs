//! Space markers fixing a container's inline capacity.
//!
//! A space is any sized type; its size and alignment become the capacity and
//! alignment of the container's inline region, padded up to at least those
//! of a pointer so the heap-spill shim always fits. The aliases here cover
//! the common word counts:
//!
//! ```
//! use valise::{Valise, space::S8};
//!
//! // Eight machine words inline: a `String` (three words) stays inline.
//! let v: Valise<(), S8> = Valise::new(String::from("inline"));
//! assert!(v.is_inline());
//! ```
//!
//! For exotic layouts, use your own marker — for example
//! `#[repr(align(32))] struct Simd([u8; 32]);` gives a 32-byte region at
//! 32-byte alignment. The marker is never instantiated; only its layout is
//! used.

/// One machine word of inline space.
pub type S1 = [usize; 1];

/// Two machine words of inline space.
pub type S2 = [usize; 2];

/// Four machine words of inline space — the default.
pub type S4 = [usize; 4];

/// Eight machine words of inline space.
pub type S8 = [usize; 8];

/// Sixteen machine words of inline space.
pub type S16 = [usize; 16];

/// Thirty-two machine words of inline space.
pub type S32 = [usize; 32];

/// Sixty-four machine words of inline space.
pub type S64 = [usize; 64];
