//! The fixed-capacity storage region embedded in every slot.
//!
//! This module encapsulates the bytes of [`Region`]. Since nothing outside
//! this module can touch the union fields directly, the occupant can only be
//! placed by [`Region::emplace`], which together with the vtable pairing in
//! `raw.rs` guarantees the safety invariant: **the occupant a region holds is
//! always the one its slot's vtable was built for**.
//!
//! # Layout
//!
//! The region is a union of the space marker `S` and a raw pointer, which
//! pads both capacity and alignment up to a pointer's. The heap spill shim is
//! a single pointer, so it fits every region regardless of how small `S` is.

use core::{
    mem::{ManuallyDrop, MaybeUninit},
    ptr::NonNull,
};

use crate::util::Erased;

/// Fixed-capacity, suitably aligned storage for one live occupant.
///
/// A region starts vacant and is given its single occupant by
/// [`emplace`](Region::emplace). The region itself never tracks whether an
/// occupant is present; the owning slot does, through its vtable.
pub(crate) union Region<S> {
    /// Inline space, sized and aligned by the space marker `S`.
    ///
    /// Never read as an `S`; the field exists only for its layout.
    inline: ManuallyDrop<MaybeUninit<S>>,
    /// Pads capacity and alignment up to a raw pointer's, so the spill shim
    /// always fits.
    ///
    /// Never read as a pointer; the field exists only for its layout.
    spill: MaybeUninit<*mut ()>,
}

impl<S> Region<S> {
    /// Capacity of the region in bytes.
    pub(crate) const CAPACITY: usize = size_of::<Self>();

    /// Alignment of the region in bytes.
    pub(crate) const ALIGNMENT: usize = align_of::<Self>();

    /// Whether a value of type `T` can be constructed directly in the region.
    pub(crate) const fn fits<T>() -> bool {
        size_of::<T>() <= Self::CAPACITY && align_of::<T>() <= Self::ALIGNMENT
    }

    /// Creates a region with no occupant.
    pub(crate) const fn vacant() -> Self {
        Self {
            spill: MaybeUninit::uninit(),
        }
    }

    /// Writes `value` into the region, making it the occupant.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. `T` fits the region ([`Region::fits`]).
    /// 2. The region has no live occupant.
    pub(crate) unsafe fn emplace<T>(&mut self, value: T) {
        debug_assert!(Self::fits::<T>());
        let base: *mut ManuallyDrop<MaybeUninit<S>> = &raw mut self.inline;
        // SAFETY: the region owns at least `size_of::<T>()` bytes at
        // `align_of::<T>()` alignment (guaranteed by the caller via `fits`),
        // and no occupant is overwritten (guaranteed by the caller).
        unsafe { base.cast::<T>().write(value) };
    }

    /// Address of the region, where the occupant lives.
    pub(crate) fn base(&self) -> NonNull<Erased> {
        NonNull::from(self).cast::<Erased>()
    }

    /// Address of the region, for operations that mutate or consume the
    /// occupant.
    pub(crate) fn base_mut(&mut self) -> NonNull<Erased> {
        NonNull::from(self).cast::<Erased>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_and_alignment_are_padded_to_a_pointer() {
        assert_eq!(Region::<[u8; 1]>::CAPACITY, size_of::<*mut ()>());
        assert_eq!(Region::<[u8; 1]>::ALIGNMENT, align_of::<*mut ()>());
        assert_eq!(Region::<[usize; 4]>::CAPACITY, 4 * size_of::<usize>());
    }

    #[test]
    fn test_space_alignment_is_respected() {
        #[repr(align(32))]
        struct WideSpace {
            _bytes: [u8; 32],
        }

        assert_eq!(Region::<WideSpace>::CAPACITY, 32);
        assert_eq!(Region::<WideSpace>::ALIGNMENT, 32);
    }

    #[test]
    fn test_fit_boundaries() {
        type R = Region<[usize; 4]>;

        assert!(R::fits::<[u8; 4 * size_of::<usize>()]>());
        assert!(!R::fits::<[u8; 4 * size_of::<usize>() + 1]>());

        #[repr(align(64))]
        struct OverAligned {
            _byte: u8,
        }

        assert!(size_of::<OverAligned>() <= R::CAPACITY);
        assert!(!R::fits::<OverAligned>());
    }

    #[test]
    fn test_emplace_then_read_back() {
        let mut region = Region::<[usize; 2]>::vacant();
        // SAFETY: `(u32, u32)` fits a two-word region and the region is
        // vacant.
        unsafe { region.emplace((7_u32, 9_u32)) };
        // SAFETY: reading back the occupant written above.
        let value = unsafe { region.base().cast::<(u32, u32)>().read() };
        assert_eq!(value, (7, 9));
    }
}
