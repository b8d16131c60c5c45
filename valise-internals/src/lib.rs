#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`valise`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased storage machinery that
//! powers the [`valise`] container library: a fixed-size slot that holds a
//! value of any qualifying type, keeping small values inline and
//! transparently spilling large ones to a single heap block.
//!
//! **This crate is an implementation detail.** No semantic versioning
//! guarantees are provided. Users should depend on the [`valise`] crate, not
//! this one.
//!
//! # Architecture
//!
//! - **[`slot`]** (exporting [`RawSlot`]): the erased storage
//!   - `Region`: the embedded byte buffer, padded to hold at least a pointer
//!   - `SlotVtable`: per-type operation table built in `const` context
//!   - `Spill`: pointer-sized shim owning a heap block for oversized values
//!   - [`RawSlot`]: the (table, region) pair with compile-time storage
//!     dispatch
//!
//! - **[`caps`]**: the capability contracts
//!   - [`Capabilities`]: declares a set of caller-visible operation kinds
//!   - [`Supports`]: the compile-time predicate qualifying a type for a set
//!
//! - **[`allocator`]**: the spill-allocation contract
//!   - [`SpillAlloc`]: fallible allocate/deallocate for one block
//!   - [`Global`]: the default-constructible fallback
//!
//! # Safety Strategy
//!
//! Erasing a payload type while keeping raw access to its bytes requires the
//! operation table to always match the value actually present in storage.
//! This crate maintains that through:
//!
//! - **Module-based encapsulation**: safety-critical fields are
//!   module-private, making invariants locally verifiable within a single
//!   file
//! - **`const`-built tables**: one shared `&'static` table per
//!   instantiation, assembled next to the placement write it describes,
//!   never mutated afterwards
//! - **Documented contracts**: every unsafe function specifies exactly when
//!   it can be called, and every unsafe block discharges the obligations of
//!   the one operation it performs
//!
//! [`valise`]: https://docs.rs/valise/latest/valise/

extern crate alloc;

pub mod allocator;
pub mod caps;
mod slot;
mod util;

pub use allocator::{AllocError, Global, SpillAlloc};
pub use caps::{Capabilities, Supports};
pub use slot::RawSlot;
pub use util::Erased;
