//! Type-erased slot storage.
//!
//! A slot is the pairing of one per-type operation table with one
//! fixed-capacity storage region. The submodules each encapsulate one safety
//! boundary:
//!
//! - [`region`]: the raw storage bytes and the inline-fit predicate
//! - [`vtable`]: the per-type operation table and its erased dispatch
//!   functions
//! - [`spill`]: the pointer-sized shim owning a heap-allocated payload
//! - [`raw`]: the slot itself, pairing table and region and dispatching
//!   through them
//!
//! Only [`RawSlot`] is exported; everything else is an implementation detail
//! whose invariants are documented and enforced module-locally.

mod raw;
mod region;
mod spill;
mod vtable;

pub use raw::RawSlot;
