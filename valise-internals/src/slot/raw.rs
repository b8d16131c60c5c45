//! The type-erased slot: one operation table paired with one storage region.
//!
//! This module encapsulates the fields of [`RawSlot`], ensuring they are only
//! visible within this module. This visibility restriction guarantees the
//! safety invariant: **the vtable always matches the live occupant of the
//! region**. The pair is only ever set by [`RawSlot::new`], which obtains the
//! table and writes the occupant in the same expression, and no API can
//! change one without the other.
//!
//! # Construction dispatch
//!
//! [`RawSlot::new`] decides the storage strategy from the payload's size and
//! alignment against the region's, inside an inline-`const` block, so the
//! decision is fixed at monomorphization time:
//!
//! - payloads that fit are written directly into the region;
//! - payloads that do not fit are moved into an allocator-obtained heap
//!   block, and the pointer-sized [`Spill`] shim is written into the region
//!   instead.
//!
//! A payload that does not satisfy the capability predicate fails the
//! `C: Supports<T>` bound and is rejected at compile time.

use core::{
    any::TypeId,
    mem::{ManuallyDrop, MaybeUninit},
    ptr::NonNull,
};

use crate::{
    allocator::{AllocError, SpillAlloc},
    caps::{Capabilities, Supports},
    slot::{region::Region, spill::Spill, vtable::SlotVtable},
    util::Erased,
};

/// A slot holding exactly one live value of erased type.
///
/// The slot owns its value: dropping the slot destroys the value (and
/// releases its heap block, if it spilled). There is no vacant state
/// observable from outside; every safe method may assume a live occupant.
///
/// Slots are move-only. A native move of the slot carries the region bytes
/// with it, which is sound for every storable type; the vtable's relocate
/// entry exists for moves *between regions of different spaces*, exposed as
/// [`RawSlot::relocate_into`].
pub struct RawSlot<C: Capabilities, S> {
    /// Operation table for the occupant.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The table was created by [`SlotVtable::inline_of`] or
    ///    [`SlotVtable::spilled_of`] for the exact occupant type written into
    ///    `region`.
    /// 2. The occupant is live until the slot is dropped or consumed by
    ///    [`RawSlot::take`] or [`RawSlot::relocate_into`].
    vtable: &'static SlotVtable<C>,
    /// Storage holding the occupant.
    region: Region<S>,
}

impl<C: Capabilities, S> RawSlot<C, S> {
    /// Capacity of the inline region in bytes.
    pub const INLINE_CAPACITY: usize = Region::<S>::CAPACITY;

    /// Alignment of the inline region in bytes.
    pub const INLINE_ALIGNMENT: usize = Region::<S>::ALIGNMENT;

    /// Creates a slot holding `value`.
    ///
    /// The storage strategy is chosen at compile time from the payload's
    /// layout; `alloc` is consulted only when the payload spills. On
    /// allocation failure no slot is produced and nothing is left allocated.
    pub fn new<T, A>(value: T, alloc: A) -> Result<Self, AllocError>
    where
        T: 'static,
        C: Supports<T>,
        A: SpillAlloc,
    {
        let fits_inline = const { Region::<S>::fits::<T>() };
        if fits_inline {
            let mut region = Region::vacant();
            // SAFETY: the const branch established that `T` fits, and a
            // freshly created region has no occupant.
            unsafe { region.emplace(value) };
            Ok(Self {
                vtable: SlotVtable::inline_of::<T>(),
                region,
            })
        } else {
            let shim = Spill::<T, A>::new(value, alloc)?;
            let mut region = Region::vacant();
            // SAFETY: the shim is pointer-sized and every region's capacity
            // and alignment are padded up to a pointer's; the region is
            // fresh.
            unsafe { region.emplace(shim) };
            Ok(Self {
                vtable: SlotVtable::spilled_of::<T, A>(),
                region,
            })
        }
    }

    /// Returns the [`TypeId`] of the payload.
    #[inline]
    pub fn payload_type_id(&self) -> TypeId {
        self.vtable.type_id()
    }

    /// Returns the [`core::any::type_name`] of the payload.
    #[inline]
    pub fn payload_type_name(&self) -> &'static str {
        self.vtable.type_name()
    }

    /// Whether the payload is stored directly in the region rather than
    /// behind a heap block.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.vtable.is_inline()
    }

    /// Whether the payload is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.payload_type_id() == TypeId::of::<T>()
    }

    /// The caller-declared operation slots, bound to the payload type.
    ///
    /// Pair the returned slots only with addresses obtained from the same
    /// slot ([`payload_ptr`](RawSlot::payload_ptr) or
    /// [`payload_ptr_mut`](RawSlot::payload_ptr_mut)); the slot functions'
    /// safety contracts assume the payload type they were bound to.
    #[inline]
    pub fn slots(&self) -> &'static C::Slots {
        self.vtable.slots()
    }

    /// Address of the live payload, resolved through the heap block for
    /// spilled payloads.
    ///
    /// The returned pointer is valid for reads for as long as the slot is
    /// neither moved, mutated, nor destroyed. Do not write through it; use
    /// [`payload_ptr_mut`](RawSlot::payload_ptr_mut) for mutation.
    #[inline]
    pub fn payload_ptr(&self) -> NonNull<Erased> {
        // SAFETY: the vtable matches the live occupant per the type
        // invariant.
        unsafe { self.vtable.project(self.region.base()) }
    }

    /// Address of the live payload, for mutation.
    ///
    /// The returned pointer is valid for reads and writes for as long as the
    /// slot is neither moved nor destroyed, and no other pointer into the
    /// payload is used concurrently.
    #[inline]
    pub fn payload_ptr_mut(&mut self) -> NonNull<Erased> {
        // SAFETY: the vtable matches the live occupant per the type
        // invariant.
        unsafe { self.vtable.project(self.region.base_mut()) }
    }

    /// Returns a reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if !self.is::<T>() {
            return None;
        }
        // SAFETY: the payload type was just checked, and the projected
        // address stays valid while `self` is borrowed.
        Some(unsafe { self.payload_ptr().cast::<T>().as_ref() })
    }

    /// Returns a mutable reference to the payload if it is a `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if !self.is::<T>() {
            return None;
        }
        // SAFETY: the payload type was just checked, and the projected
        // address stays exclusively borrowed while `self` is.
        Some(unsafe { self.payload_ptr_mut().cast::<T>().as_mut() })
    }

    /// Moves the payload out if it is a `T`, releasing any spill storage.
    ///
    /// On a type mismatch the slot is returned unchanged.
    pub fn take<T: 'static>(self) -> Result<T, Self> {
        if !self.is::<T>() {
            return Err(self);
        }
        let mut payload = MaybeUninit::<T>::uninit();
        let this = ManuallyDrop::new(self);
        // SAFETY: the vtable matches the live occupant, the destination
        // accepts one `T` (type checked above), and the vacated region is
        // never touched again: `ManuallyDrop` suppresses the destructor.
        unsafe {
            this.vtable
                .take(this.region.base(), NonNull::from(&mut payload).cast::<Erased>());
        }
        // SAFETY: `take` moved the payload into `payload`.
        Ok(unsafe { payload.assume_init() })
    }

    /// Moves the occupant into a region of a different space.
    ///
    /// Spilled payloads always move (the shim is pointer-sized), keeping
    /// their heap block untouched. Inline payloads move only if they fit the
    /// destination region; otherwise the slot is returned unchanged, since a
    /// spill cannot be arranged for an already-erased payload.
    pub fn relocate_into<S2>(self) -> Result<RawSlot<C, S2>, Self> {
        let layout = self.vtable.occupant_layout();
        if layout.size() > Region::<S2>::CAPACITY || layout.align() > Region::<S2>::ALIGNMENT {
            return Err(self);
        }
        let this = ManuallyDrop::new(self);
        let mut region = Region::<S2>::vacant();
        // SAFETY: the vtable matches the live occupant, the destination
        // region fits the occupant's layout (checked above) and is fresh,
        // and the vacated source is never touched again: `ManuallyDrop`
        // suppresses the destructor.
        unsafe {
            this.vtable.relocate(region.base_mut(), this.region.base());
        }
        Ok(RawSlot {
            vtable: this.vtable,
            region,
        })
    }
}

impl<C: Capabilities, S> Drop for RawSlot<C, S> {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: the vtable matches the live occupant per the type
        // invariant, and the occupant is destroyed exactly once, here.
        unsafe { self.vtable.destroy(self.region.base_mut()) };
    }
}

impl<C: Capabilities, S> core::fmt::Debug for RawSlot<C, S> {
    fn fmt(&self, formatter: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        formatter
            .debug_struct("RawSlot")
            .field("payload", &self.payload_type_name())
            .field("inline", &self.is_inline())
            .finish_non_exhaustive()
    }
}
