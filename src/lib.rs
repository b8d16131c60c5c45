#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! A fixed-size, move-only container for values of erased type.
//!
//! ## Overview
//!
//! This crate provides [`Valise`]: a handle of fixed size that can hold a
//! value of any type satisfying a declared capability set, without the
//! caller naming that type. Small values live directly inside the handle;
//! values that exceed the handle's inline space are transparently moved to a
//! single heap block. In both cases the value travels with the handle,
//! is destroyed with the handle, and is reachable through the same uniform
//! surface.
//!
//! Use it where you would reach for `Box<dyn Trait>` but want to skip the
//! allocation for small values, keep by-value downcasting, or dispatch on
//! operations that do not fit a single object-safe trait.
//!
//! ## Quick Example
//!
//! ```
//! use valise::{Valise, caps::Fmt};
//!
//! // Unrelated types behind the same handle type.
//! let small: Valise<Fmt> = Valise::new(1234_u32);
//! let text: Valise<Fmt> = Valise::new(String::from("any Display value"));
//! assert_eq!(small.to_string(), "1234");
//! assert_eq!(text.to_string(), "any Display value");
//!
//! // Oversized values spill to a single heap block, transparently.
//! let wide: Valise<()> = Valise::new([0_u8; 256]);
//! assert!(!wide.is_inline());
//! assert_eq!(wide.downcast_ref::<[u8; 256]>(), Some(&[0; 256]));
//! ```
//!
//! ## Core Concepts
//!
//! Three type parameters describe everything a [`Valise`] does:
//!
//! - The **capability set** (`C`) declares which operations remain callable
//!   after the value's type is erased. Sets are ordinary types implementing
//!   [`Capabilities`]; the [`Supports<T>`](Supports) bound is the
//!   compile-time test that a value qualifies. The built-in [`caps::Fmt`]
//!   forwards `Display`/`Debug`; `()` declares nothing; tuples compose sets.
//! - The **space** (`S`) fixes the inline capacity. Every space is padded up
//!   to pointer size and alignment, which is what makes the heap fallback
//!   universal: a value that does not fit is boxed behind a pointer-sized
//!   shim that always fits.
//! - The **allocator** (`A`) supplies the heap block when a value spills.
//!   Construction is the only point that can allocate — and the only point
//!   that can fail, via the `try_` constructors.
//!
//! Every storage decision happens at compile time, per concrete type: a
//! value that fits never allocates, a value that spills costs exactly one
//! allocation up front and keeps a stable heap address for its lifetime,
//! including across [`transfer`](Valise::transfer) to a differently-sized
//! handle.
//!
//! The handle is move-only and single-threaded: no `Clone`, no internal
//! synchronization, `!Send`/`!Sync`.
//!
//! For implementation details, see the [`valise-internals`] crate.
//!
//! [`valise-internals`]: valise_internals

extern crate alloc;

mod handle;

pub mod caps;
pub mod prelude;
pub mod space;

pub use handle::Valise;
pub use valise_internals::{AllocError, Capabilities, Erased, Global, SpillAlloc, Supports};
