//! Commonly used items for convenient importing.
//!
//! The prelude re-exports the types and traits needed in most code that
//! stores or retrieves values: the [`Valise`] container itself, the
//! capability contracts, the space aliases, and the allocator contract.
//!
//! # Usage
//!
//! ```rust
//! use valise::prelude::*;
//!
//! let v: Valise<caps::Fmt, S2> = Valise::new(12_u16);
//! assert_eq!(v.to_string(), "12");
//! ```
//!
//! Capability-set *authors* additionally need [`Erased`](crate::Erased) for
//! their slot signatures; import it directly from the crate root.

pub use crate::{
    AllocError, Global, SpillAlloc, Valise,
    caps::{self, Capabilities, Supports},
    space::{S1, S2, S4, S8, S16, S32, S64},
};
