//! The public container type.

use core::{alloc::Layout, any::TypeId, fmt, marker::PhantomData, ptr::NonNull};

use alloc::alloc::handle_alloc_error;
use valise_internals::{AllocError, Capabilities, Erased, Global, RawSlot, SpillAlloc, Supports};

use crate::space::S4;

/// A fixed-size, move-only container for one value of erased type.
///
/// A `Valise` holds any value whose type satisfies the capability set `C`,
/// without naming that type in its own signature. Values that fit the inline
/// space `S` are stored directly in the container; larger (or more strictly
/// aligned) values are transparently moved to a single heap block obtained
/// from a [`SpillAlloc`]. Either way the container itself stays the same
/// size: one table reference plus the inline region.
///
/// # Type Parameters
///
/// - **Capabilities (`C`)**: the set of operations callable on the stored
///   value after its type is erased. `()` declares none; see
///   [`caps`](crate::caps) for built-in sets and for how to declare your own.
/// - **Space (`S`)**: a marker type whose size and alignment fix the inline
///   capacity (defaults to [`S4`], four machine words). Any sized type works;
///   the [`space`](crate::space) module provides conventional aliases.
/// - **Allocator (`A`)**: the default-constructible allocator used by the
///   value constructors when a value spills (defaults to [`Global`]). The
///   `*_in` constructors accept any allocator per call.
///
/// # Storage strategy
///
/// The inline-versus-spill decision is made per concrete type at compile
/// time. Exactly one of the following holds for every value a `Valise` ever
/// holds:
///
/// - it fits `S` (padded to at least pointer size and alignment) and lives
///   inline — constructing it never allocates; or
/// - it spills, costing exactly one allocation at construction and exactly
///   one deallocation at destruction, with the heap address stable for the
///   value's whole lifetime.
///
/// Dropping the container runs the stored value's destructor. As everywhere
/// in Rust, destructors are assumed not to panic; a panicking destructor
/// aborts or leaks depending on context, and is not a handled case.
///
/// # Examples
///
/// ```
/// use valise::{Valise, space::S2};
///
/// let small: Valise<(), S2> = Valise::new(7_u32);
/// assert!(small.is_inline());
///
/// let big: Valise<(), S2> = Valise::new([0_u8; 64]);
/// assert!(!big.is_inline());
/// assert_eq!(big.downcast_ref::<[u8; 64]>(), Some(&[0; 64]));
/// ```
///
/// A type that does not satisfy the capability set is rejected at compile
/// time:
///
/// ```compile_fail
/// use valise::{Valise, caps::Fmt};
///
/// struct Opaque;
///
/// // `Opaque` implements neither `Display` nor `Debug`.
/// let v: Valise<Fmt> = Valise::new(Opaque);
/// ```
pub struct Valise<C: Capabilities, S = S4, A: SpillAlloc = Global> {
    /// The (operation table, storage region) pair.
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long
    /// as this struct exists:
    ///
    /// 1. The slot holds exactly one live value, constructed through one of
    ///    the `Valise` constructors.
    /// 2. Nothing outside this module can separate the slot from the
    ///    container, so the slot's own vtable/occupant pairing is preserved.
    raw: RawSlot<C, S>,
    /// Selects the allocator the value constructors fall back to on spill.
    _alloc: PhantomData<A>,
}

impl<C: Capabilities, S, A: SpillAlloc + Default> Valise<C, S, A> {
    /// Stores `value`, spilling through a default-constructed `A` if it does
    /// not fit inline.
    ///
    /// On allocation failure this diverges via
    /// [`handle_alloc_error`], like [`Box`](alloc::boxed::Box); use
    /// [`try_new`](Valise::try_new) to handle failure instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use valise::Valise;
    ///
    /// let v: Valise<()> = Valise::new(String::from("compact"));
    /// assert!(v.is::<String>());
    /// ```
    pub fn new<T>(value: T) -> Self
    where
        T: 'static,
        C: Supports<T>,
    {
        match Self::try_new(value) {
            Ok(container) => container,
            Err(AllocError) => handle_alloc_error(Layout::new::<T>()),
        }
    }

    /// Stores `value`, reporting spill-allocation failure instead of
    /// aborting.
    ///
    /// Inline-stored values cannot fail; for them this always returns `Ok`.
    pub fn try_new<T>(value: T) -> Result<Self, AllocError>
    where
        T: 'static,
        C: Supports<T>,
    {
        Self::try_new_in(value, A::default())
    }
}

impl<C: Capabilities, S, A: SpillAlloc> Valise<C, S, A> {
    /// Stores `value`, spilling through `alloc` if it does not fit inline.
    ///
    /// The allocator moves into the heap block it provides, so the container
    /// needs no allocator state of its own afterwards; `alloc` may be of any
    /// [`SpillAlloc`] type, independent of `A`.
    ///
    /// On allocation failure this diverges via [`handle_alloc_error`]; use
    /// [`try_new_in`](Valise::try_new_in) to handle failure instead.
    pub fn new_in<T, A2>(value: T, alloc: A2) -> Self
    where
        T: 'static,
        C: Supports<T>,
        A2: SpillAlloc,
    {
        match Self::try_new_in(value, alloc) {
            Ok(container) => container,
            Err(AllocError) => handle_alloc_error(Layout::new::<T>()),
        }
    }

    /// Stores `value` with an explicit spill allocator, reporting allocation
    /// failure instead of aborting.
    ///
    /// On failure no container is produced, nothing stays allocated, and
    /// `value` is dropped.
    pub fn try_new_in<T, A2>(value: T, alloc: A2) -> Result<Self, AllocError>
    where
        T: 'static,
        C: Supports<T>,
        A2: SpillAlloc,
    {
        Ok(Self {
            raw: RawSlot::new(value, alloc)?,
            _alloc: PhantomData,
        })
    }

    /// Whether the stored value is a `T`.
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.raw.is::<T>()
    }

    /// The [`TypeId`] of the stored value.
    #[inline]
    pub fn payload_type_id(&self) -> TypeId {
        self.raw.payload_type_id()
    }

    /// The [`core::any::type_name`] of the stored value.
    ///
    /// Intended for diagnostics only; the name is not unique or stable.
    #[inline]
    pub fn payload_type_name(&self) -> &'static str {
        self.raw.payload_type_name()
    }

    /// Whether the stored value lives in the inline space rather than behind
    /// a heap block.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.raw.is_inline()
    }

    /// Returns a reference to the stored value if it is a `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use valise::Valise;
    ///
    /// let v: Valise<()> = Valise::new(31_u8);
    /// assert_eq!(v.downcast_ref::<u8>(), Some(&31));
    /// assert_eq!(v.downcast_ref::<u16>(), None);
    /// ```
    #[inline]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.raw.downcast_ref::<T>()
    }

    /// Returns a mutable reference to the stored value if it is a `T`.
    #[inline]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.raw.downcast_mut::<T>()
    }

    /// Moves the stored value out if it is a `T`, releasing any heap block
    /// it occupied.
    ///
    /// On a type mismatch the container is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use valise::Valise;
    ///
    /// let v: Valise<()> = Valise::new(String::from("out again"));
    /// let s: String = v.downcast().unwrap();
    /// assert_eq!(s, "out again");
    /// ```
    pub fn downcast<T: 'static>(self) -> Result<T, Self> {
        let Self { raw, _alloc } = self;
        raw.take::<T>().map_err(|raw| Self {
            raw,
            _alloc: PhantomData,
        })
    }

    /// Moves the stored value into a container with a different inline
    /// space, without touching the heap.
    ///
    /// Spilled values always transfer: only their pointer-sized shim moves,
    /// and the heap block (and thus the value's address) is untouched. An
    /// inline value transfers only if it fits `S2`; otherwise the original
    /// container is returned unchanged, since a spill cannot be arranged for
    /// a value whose type has already been erased.
    ///
    /// # Examples
    ///
    /// ```
    /// use valise::{Valise, space::{S1, S8}};
    ///
    /// let v: Valise<(), S1> = Valise::new(5_u8);
    /// let v: Valise<(), S8> = v.transfer().unwrap();
    /// assert_eq!(v.downcast_ref::<u8>(), Some(&5));
    ///
    /// // Four words do not fit a one-word space.
    /// let v: Valise<(), S8> = Valise::new([1_usize; 4]);
    /// assert!(v.transfer::<S1>().is_err());
    /// ```
    pub fn transfer<S2>(self) -> Result<Valise<C, S2, A>, Self> {
        let Self { raw, _alloc } = self;
        match raw.relocate_into::<S2>() {
            Ok(raw) => Ok(Valise {
                raw,
                _alloc: PhantomData,
            }),
            Err(raw) => Err(Self {
                raw,
                _alloc: PhantomData,
            }),
        }
    }

    /// The declared operation slots, bound to the stored value's type.
    ///
    /// Pair these only with an address obtained from the *same* container
    /// via [`payload_ptr`](Valise::payload_ptr) or
    /// [`payload_ptr_mut`](Valise::payload_ptr_mut); each slot function's
    /// safety contract assumes the payload type it was bound to. This is the
    /// extension seam capability-set authors build safe wrappers on — see
    /// [`caps`](crate::caps) for a worked example.
    #[inline]
    pub fn slots(&self) -> &'static C::Slots {
        self.raw.slots()
    }

    /// Address of the stored value, resolved through the heap block for
    /// spilled values.
    ///
    /// Valid for reads while the container is neither moved, mutated, nor
    /// dropped. Do not write through it; use
    /// [`payload_ptr_mut`](Valise::payload_ptr_mut) for mutation.
    #[inline]
    pub fn payload_ptr(&self) -> NonNull<Erased> {
        self.raw.payload_ptr()
    }

    /// Address of the stored value, for mutating operations.
    ///
    /// Valid for reads and writes while the container is neither moved nor
    /// dropped, provided no other pointer into the value is used
    /// concurrently.
    #[inline]
    pub fn payload_ptr_mut(&mut self) -> NonNull<Erased> {
        self.raw.payload_ptr_mut()
    }
}

impl<C: Capabilities, S, A: SpillAlloc> fmt::Debug for Valise<C, S, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Valise")
            .field("payload", &self.payload_type_name())
            .field("inline", &self.is_inline())
            .finish_non_exhaustive()
    }
}
