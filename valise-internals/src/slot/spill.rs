//! The heap spill shim stored in place of an oversized payload.
//!
//! This module encapsulates the `block` field of [`Spill`], ensuring it is
//! only visible within this module. This visibility restriction guarantees
//! the safety invariant: **the pointer always comes from an allocation of
//! [`Block<T, A>`] made by the allocator stored inside that block** (or is
//! the well-aligned dangling pointer used for zero-sized blocks).
//!
//! # Ownership protocol
//!
//! A [`Spill`] deliberately has no `Drop` implementation: it is an occupant
//! of a slot region, and the slot's vtable decides when to call
//! [`Spill::release`] (destroy) or [`Spill::take`] (move the payload out).
//! Each consumes the shim by value, so the block is released exactly once.

use core::{alloc::Layout, ptr::NonNull};

use crate::{
    allocator::{AllocError, SpillAlloc},
    util::Erased,
};

/// The heap block behind a spilled payload.
///
/// The allocator that produced the block travels inside it, so releasing the
/// block needs no state beyond the shim pointer. The allocator is read back
/// out of the block immediately before the block is deallocated.
struct Block<T, A> {
    /// The allocator this block was obtained from.
    alloc: A,
    /// The spilled payload.
    value: T,
}

/// Pointer-sized shim owning one heap-allocated payload.
///
/// Stored in a slot region in place of a payload that exceeds the region's
/// capacity or alignment. Relocating the shim moves only the pointer; the
/// payload never moves once spilled.
pub(crate) struct Spill<T: 'static, A: SpillAlloc> {
    /// Pointer to the heap block.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. If `Block<T, A>` has a non-zero size, the pointer was returned by
    ///    `alloc.allocate(Layout::new::<Block<T, A>>())` where `alloc` is the
    ///    allocator now stored in the block; otherwise it is the aligned
    ///    dangling pointer.
    /// 2. The block is initialized for the shim's entire lifetime, until
    ///    [`Spill::release`] or [`Spill::take`] consumes it.
    block: NonNull<Block<T, A>>,
}

impl<T: 'static, A: SpillAlloc> Spill<T, A> {
    /// Layout of the heap block.
    pub(crate) const BLOCK_LAYOUT: Layout = Layout::new::<Block<T, A>>();

    /// Allocates a block through `alloc` and moves `value` and `alloc` into
    /// it.
    ///
    /// On allocation failure nothing is left allocated and both `value` and
    /// `alloc` are dropped before the error is returned.
    pub(crate) fn new(value: T, alloc: A) -> Result<Self, AllocError> {
        let block = if Self::BLOCK_LAYOUT.size() == 0 {
            // A zero-sized block (zero-sized payload that spilled on
            // alignment, with a zero-sized allocator) needs an address, not
            // memory.
            NonNull::<Block<T, A>>::dangling()
        } else {
            alloc.allocate(Self::BLOCK_LAYOUT)?.cast::<Block<T, A>>()
        };
        // SAFETY: `block` is valid for writes of one `Block<T, A>`: either a
        // fresh allocation of exactly that layout, or a well-aligned dangling
        // pointer for a zero-sized block.
        unsafe { block.write(Block { alloc, value }) };
        Ok(Self { block })
    }

    /// Address of the payload inside the block.
    pub(crate) fn payload_ptr(&self) -> NonNull<Erased> {
        let block = self.block.as_ptr();
        // SAFETY: the block pointer is valid per the type invariant; taking a
        // raw reference to a field creates no intermediate reference.
        let value: *mut T = unsafe { &raw mut (*block).value };
        // SAFETY: a field projection of a non-null pointer is non-null.
        unsafe { NonNull::new_unchecked(value) }.cast::<Erased>()
    }

    /// Drops the payload and returns the block to its allocator.
    pub(crate) fn release(self) {
        let block = self.block.as_ptr();
        // SAFETY: the block pointer is valid per the type invariant; taking
        // raw references to its fields creates no intermediate reference.
        let alloc_ptr: *const A = unsafe { &raw const (*block).alloc };
        // SAFETY: same justification as above.
        let value_ptr: *mut T = unsafe { &raw mut (*block).value };
        // SAFETY: the allocator is initialized; it is moved out here and its
        // field is dead from here on.
        let alloc = unsafe { alloc_ptr.read() };
        // SAFETY: the payload is initialized and is dropped exactly once,
        // here, because `release` consumes the shim.
        unsafe { core::ptr::drop_in_place(value_ptr) };
        if Self::BLOCK_LAYOUT.size() != 0 {
            // SAFETY: the block came from `alloc.allocate` with this exact
            // layout and is not touched again.
            unsafe { alloc.deallocate(self.block.cast::<u8>(), Self::BLOCK_LAYOUT) };
        }
    }

    /// Moves the payload out and returns the block to its allocator without
    /// dropping the payload.
    pub(crate) fn take(self) -> T {
        let block = self.block.as_ptr();
        // SAFETY: the block pointer is valid per the type invariant; taking
        // raw references to its fields creates no intermediate reference.
        let alloc_ptr: *const A = unsafe { &raw const (*block).alloc };
        // SAFETY: same justification as above.
        let value_ptr: *const T = unsafe { &raw const (*block).value };
        // SAFETY: the allocator is initialized; it is moved out here and its
        // field is dead from here on.
        let alloc = unsafe { alloc_ptr.read() };
        // SAFETY: the payload is initialized; reading it transfers ownership
        // to the caller and its field is dead from here on.
        let value = unsafe { value_ptr.read() };
        if Self::BLOCK_LAYOUT.size() != 0 {
            // SAFETY: the block came from `alloc.allocate` with this exact
            // layout and is not touched again.
            unsafe { alloc.deallocate(self.block.cast::<u8>(), Self::BLOCK_LAYOUT) };
        }
        value
    }
}
