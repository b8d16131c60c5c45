//! The per-type operation table driving all slot dispatch.
//!
//! This module contains the [`SlotVtable`], which enables destroying,
//! relocating, and operating on a slot's occupant after its concrete type has
//! been erased. The vtable stores function pointers that dispatch to the
//! correct typed implementations, plus the caller-declared operation slots.
//!
//! This module encapsulates the fields of [`SlotVtable`] so they cannot be
//! accessed directly. This visibility restriction guarantees the safety
//! invariant: **a vtable's function pointers always match the payload type
//! (and, for spilled payloads, the allocator type) it was built for**.
//!
//! # Safety Invariant
//!
//! The invariant holds because vtables are only created as `&'static`
//! references via [`SlotVtable::inline_of`] and [`SlotVtable::spilled_of`],
//! which pair every entry with the same concrete types at compile time. A
//! table is built in `const` context and promoted, so tables for the same
//! instantiation are one shared static instance, never rebuilt and never
//! mutated.

use core::{alloc::Layout, any::TypeId, ptr::NonNull};

use crate::{
    allocator::SpillAlloc,
    caps::{Capabilities, Supports},
    slot::spill::Spill,
    util::Erased,
};

/// Operation table for one concrete payload type.
///
/// Two forms exist per payload type `T`: the *inline* form, whose occupant is
/// `T` itself, and the *spilled* form, whose occupant is a [`Spill<T, A>`]
/// shim. Both describe the payload as `T`; the only observable difference is
/// [`is_inline`](SlotVtable::is_inline) and the occupant layout.
///
/// # Safety
///
/// The following safety invariants are guaranteed to be upheld as long as
/// this struct exists:
///
/// * `destroy`, `relocate`, `take`, and `project` all point to the functions
///   defined at the bottom of this module.
/// * Every entry is instantiated with the same payload type `T` (and, for
///   the spilled form, allocator type `A`) that was used to create the
///   table, and `slots` is `<C as Supports<T>>::SLOTS`.
pub(crate) struct SlotVtable<C: Capabilities> {
    /// Gets the [`TypeId`] of the payload type (never the spill shim).
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the payload type.
    type_name: fn() -> &'static str,
    /// Layout of the occupant as stored in the region: the payload itself
    /// for the inline form, the shim for the spilled form.
    occupant_layout: Layout,
    /// Whether the payload is stored directly in the region.
    inline: bool,
    /// Drops the occupant at the given region address; for the spilled form
    /// this also returns the heap block to its allocator.
    destroy: unsafe fn(NonNull<Erased>),
    /// Moves the occupant from the source region address to the destination
    /// region address, leaving the source logically vacant.
    relocate: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Moves the payload (not the occupant) out of the region to the given
    /// destination, releasing any spill storage without dropping the payload.
    take: unsafe fn(NonNull<Erased>, NonNull<Erased>),
    /// Resolves the payload address from the region address.
    project: unsafe fn(NonNull<Erased>) -> NonNull<Erased>,
    /// Caller-declared operations, bound to the payload type.
    slots: C::Slots,
}

impl<C: Capabilities> SlotVtable<C> {
    /// Creates the table for a payload of type `T` stored directly in the
    /// region.
    pub(crate) const fn inline_of<T: 'static>() -> &'static Self
    where
        C: Supports<T>,
    {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                occupant_layout: Layout::new::<T>(),
                inline: true,
                destroy: destroy_inline::<T>,
                relocate: relocate_occupant::<T>,
                take: take_inline::<T>,
                project: project_inline,
                slots: <C as Supports<T>>::SLOTS,
            }
        }
    }

    /// Creates the table for a payload of type `T` spilled to the heap
    /// through an allocator of type `A`.
    pub(crate) const fn spilled_of<T: 'static, A: SpillAlloc>() -> &'static Self
    where
        C: Supports<T>,
    {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                occupant_layout: Layout::new::<Spill<T, A>>(),
                inline: false,
                destroy: destroy_spilled::<T, A>,
                relocate: relocate_occupant::<Spill<T, A>>,
                take: take_spilled::<T, A>,
                project: project_spilled::<T, A>,
                slots: <C as Supports<T>>::SLOTS,
            }
        }
    }

    /// Gets the [`TypeId`] of the payload type this table was built for.
    #[inline]
    pub(crate) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the payload type this table was
    /// built for.
    #[inline]
    pub(crate) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Layout of the occupant as stored in the region.
    #[inline]
    pub(crate) fn occupant_layout(&self) -> Layout {
        self.occupant_layout
    }

    /// Whether the payload is stored directly in the region.
    #[inline]
    pub(crate) fn is_inline(&self) -> bool {
        self.inline
    }

    /// The caller-declared operation slots, bound to the payload type.
    #[inline]
    pub(crate) fn slots(&self) -> &C::Slots {
        &self.slots
    }

    /// Drops the occupant at `region`; for the spilled form this also
    /// returns the heap block to its allocator.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This table is the one the occupant at `region` was constructed
    ///    with.
    /// 2. The occupant is live and is never accessed or destroyed again.
    #[inline]
    pub(crate) unsafe fn destroy(&self, region: NonNull<Erased>) {
        // SAFETY: `self.destroy` points to `destroy_inline::<T>` or
        // `destroy_spilled::<T, A>` for the occupant's actual types. Their
        // requirements are guaranteed by the caller.
        unsafe { (self.destroy)(region) };
    }

    /// Moves the occupant from `src` to `dst`, leaving `src` logically
    /// vacant.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This table is the one the occupant at `src` was constructed with.
    /// 2. `dst` is valid for writes of the occupant's layout and holds no
    ///    live occupant.
    /// 3. After the call, `src` is treated as vacant: its occupant is
    ///    neither accessed nor destroyed.
    #[inline]
    pub(crate) unsafe fn relocate(&self, dst: NonNull<Erased>, src: NonNull<Erased>) {
        // SAFETY: `self.relocate` points to `relocate_occupant` for the
        // occupant's actual type. Its requirements are guaranteed by the
        // caller.
        unsafe { (self.relocate)(dst, src) };
    }

    /// Moves the payload out of `region` to `dst` and releases any spill
    /// storage without dropping the payload.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This table is the one the occupant at `region` was constructed
    ///    with.
    /// 2. `dst` is valid for writes of one payload value.
    /// 3. After the call, `region` is treated as vacant: its occupant is
    ///    neither accessed nor destroyed.
    #[inline]
    pub(crate) unsafe fn take(&self, region: NonNull<Erased>, dst: NonNull<Erased>) {
        // SAFETY: `self.take` points to `take_inline::<T>` or
        // `take_spilled::<T, A>` for the occupant's actual types. Their
        // requirements are guaranteed by the caller.
        unsafe { (self.take)(region, dst) };
    }

    /// Resolves the payload address from the region address.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. This table is the one the occupant at `region` was constructed
    ///    with, and the occupant is live.
    #[inline]
    pub(crate) unsafe fn project(&self, region: NonNull<Erased>) -> NonNull<Erased> {
        // SAFETY: `self.project` points to `project_inline` or
        // `project_spilled::<T, A>` for the occupant's actual types. Their
        // requirements are guaranteed by the caller.
        unsafe { (self.project)(region) }
    }
}

/// Drops the inline payload at `region`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `region` holds a live `T`, which is never accessed or destroyed again.
unsafe fn destroy_inline<T>(region: NonNull<Erased>) {
    // SAFETY: `region` holds a live `T` (guaranteed by the caller), dropped
    // exactly once, here.
    unsafe { region.cast::<T>().drop_in_place() };
}

/// Releases the spill shim at `region`: drops the heap payload and returns
/// the block to its allocator.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `region` holds a live `Spill<T, A>`, which is never accessed or
///    destroyed again.
unsafe fn destroy_spilled<T: 'static, A: SpillAlloc>(region: NonNull<Erased>) {
    // SAFETY: `region` holds a live shim (guaranteed by the caller); reading
    // it transfers ownership to `release`.
    let shim = unsafe { region.cast::<Spill<T, A>>().read() };
    shim.release();
}

/// Moves the occupant `O` from `src` to `dst` by a typed read and write.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `src` holds a live `O`, treated as vacant after the call.
/// 2. `dst` is valid for writes of one `O` and holds no live occupant.
unsafe fn relocate_occupant<O>(dst: NonNull<Erased>, src: NonNull<Erased>) {
    // SAFETY: `src` holds a live `O` (guaranteed by the caller); the read
    // transfers ownership to `value`.
    let value = unsafe { src.cast::<O>().read() };
    // SAFETY: `dst` accepts one `O` (guaranteed by the caller).
    unsafe { dst.cast::<O>().write(value) };
}

/// Moves the inline payload from `region` to `dst`.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `region` holds a live `T`, treated as vacant after the call.
/// 2. `dst` is valid for writes of one `T`.
unsafe fn take_inline<T>(region: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY: `region` holds a live `T` (guaranteed by the caller); the read
    // transfers ownership to `value`.
    let value = unsafe { region.cast::<T>().read() };
    // SAFETY: `dst` accepts one `T` (guaranteed by the caller).
    unsafe { dst.cast::<T>().write(value) };
}

/// Moves the spilled payload from the shim at `region` to `dst`, returning
/// the heap block to its allocator without dropping the payload.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `region` holds a live `Spill<T, A>`, treated as vacant after the call.
/// 2. `dst` is valid for writes of one `T`.
unsafe fn take_spilled<T: 'static, A: SpillAlloc>(region: NonNull<Erased>, dst: NonNull<Erased>) {
    // SAFETY: `region` holds a live shim (guaranteed by the caller); reading
    // it transfers ownership to `take`.
    let shim = unsafe { region.cast::<Spill<T, A>>().read() };
    let value = shim.take();
    // SAFETY: `dst` accepts one `T` (guaranteed by the caller).
    unsafe { dst.cast::<T>().write(value) };
}

/// Resolves the payload address for an inline occupant: the region address
/// itself.
///
/// # Safety
///
/// Trivially safe; the signature is unsafe only to match the table entry.
unsafe fn project_inline(region: NonNull<Erased>) -> NonNull<Erased> {
    region
}

/// Resolves the payload address for a spilled occupant: one pointer chase
/// through the shim.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. `region` holds a live `Spill<T, A>`.
unsafe fn project_spilled<T: 'static, A: SpillAlloc>(region: NonNull<Erased>) -> NonNull<Erased> {
    // SAFETY: `region` holds a live shim (guaranteed by the caller).
    let shim = unsafe { region.cast::<Spill<T, A>>().as_ref() };
    shim.payload_ptr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocator::Global;

    #[test]
    fn test_vtable_instances_are_shared_per_type() {
        let vtable1 = SlotVtable::<()>::inline_of::<i32>();
        let vtable2 = SlotVtable::<()>::inline_of::<i32>();

        // Both should be the exact same static instance
        assert!(core::ptr::eq(vtable1, vtable2));
    }

    #[test]
    fn test_vtable_instances_differ_per_type_and_form() {
        let int = SlotVtable::<()>::inline_of::<i32>();
        let long = SlotVtable::<()>::inline_of::<i64>();
        let spilled = SlotVtable::<()>::spilled_of::<i32, Global>();

        assert!(!core::ptr::eq(int, long));
        assert!(!core::ptr::eq(int, spilled));
    }

    #[test]
    fn test_spilled_form_describes_the_payload_not_the_shim() {
        let vtable = SlotVtable::<()>::spilled_of::<[u64; 32], Global>();

        assert_eq!(vtable.type_id(), TypeId::of::<[u64; 32]>());
        assert!(vtable.type_name().contains("u64"));
        assert!(!vtable.is_inline());
        assert_eq!(
            vtable.occupant_layout(),
            Layout::new::<Spill<[u64; 32], Global>>()
        );
    }

    #[test]
    fn test_inline_form_layout() {
        let vtable = SlotVtable::<()>::inline_of::<(u8, u32)>();

        assert!(vtable.is_inline());
        assert_eq!(vtable.occupant_layout(), Layout::new::<(u8, u32)>());
        assert_eq!(vtable.type_id(), TypeId::of::<(u8, u32)>());
    }
}
