//! Integration tests for the valise-internals crate.
//!
//! These exercise the raw slot across both storage strategies: allocation
//! accounting for the inline and spill paths, boundary layouts, exactly-once
//! destruction, payload identity across moves and relocations, allocation
//! failure injection, and round-tripping a caller-declared capability set.

use std::{
    alloc::Layout,
    ptr::NonNull,
    sync::atomic::{AtomicUsize, Ordering},
};

use valise_internals::{AllocError, Capabilities, Erased, Global, RawSlot, SpillAlloc, Supports};

type TwoWords = [usize; 2];
type FourWords = [usize; 4];

/// Allocation counters shared between a test and its allocator.
struct Counters {
    allocated: AtomicUsize,
    released: AtomicUsize,
}

impl Counters {
    const fn new() -> Self {
        Self {
            allocated: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    fn allocated(&self) -> usize {
        self.allocated.load(Ordering::Relaxed)
    }

    fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }
}

/// Forwards to [`Global`] while counting every block handed out and back.
#[derive(Clone, Copy)]
struct CountingAlloc(&'static Counters);

// SAFETY: forwards to `Global`, which upholds the contract; counting has no
// effect on the blocks themselves.
unsafe impl SpillAlloc for CountingAlloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let block = Global.allocate(layout)?;
        self.0.allocated.fetch_add(1, Ordering::Relaxed);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.0.released.fetch_add(1, Ordering::Relaxed);
        // SAFETY: `allocate` forwards to `Global`, so the caller's guarantees
        // carry over unchanged.
        unsafe { Global.deallocate(ptr, layout) };
    }
}

/// Refuses every allocation.
#[derive(Clone, Copy)]
struct FailingAlloc;

// SAFETY: never hands out a block at all.
unsafe impl SpillAlloc for FailingAlloc {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<u8>, AllocError> {
        Err(AllocError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {
        unreachable!("nothing was ever allocated");
    }
}

/// Payload that bumps a counter when dropped.
struct DropTally {
    drops: &'static AtomicUsize,
}

impl Drop for DropTally {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }
}

/// Oversized payload that bumps a counter when dropped.
struct BigDropTally {
    drops: &'static AtomicUsize,
    _payload: [u8; 128],
}

impl BigDropTally {
    fn new(drops: &'static AtomicUsize) -> Self {
        Self {
            drops,
            _payload: [0; 128],
        }
    }
}

impl Drop for BigDropTally {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }
}

// A caller-declared capability set with a read operation and a mutating
// operation, the way a user of the crate would write one.

trait Describe: 'static {
    fn describe(&self) -> String;
    fn bump(&mut self);
}

struct DescribeCaps;

struct DescribeSlots {
    describe: unsafe fn(NonNull<Erased>) -> String,
    bump: unsafe fn(NonNull<Erased>),
}

impl Capabilities for DescribeCaps {
    type Slots = DescribeSlots;
}

impl<T: Describe> Supports<T> for DescribeCaps {
    const SLOTS: DescribeSlots = DescribeSlots {
        describe: describe_erased::<T>,
        bump: bump_erased::<T>,
    };
}

/// # Safety
///
/// `payload` must point to a live `T` valid for reads.
unsafe fn describe_erased<T: Describe>(payload: NonNull<Erased>) -> String {
    // SAFETY: guaranteed by the caller.
    let value = unsafe { payload.cast::<T>().as_ref() };
    value.describe()
}

/// # Safety
///
/// `payload` must point to a live `T` valid for reads and writes, with no
/// other reference into it alive.
unsafe fn bump_erased<T: Describe>(payload: NonNull<Erased>) {
    // SAFETY: guaranteed by the caller.
    let value = unsafe { payload.cast::<T>().as_mut() };
    value.bump();
}

#[derive(Debug, PartialEq)]
struct Gauge(u32);

impl Describe for Gauge {
    fn describe(&self) -> String {
        format!("gauge at {}", self.0)
    }

    fn bump(&mut self) {
        self.0 += 1;
    }
}

#[derive(Debug, PartialEq)]
struct WideGauge {
    level: u32,
    _samples: [u64; 32],
}

impl WideGauge {
    fn new(level: u32) -> Self {
        Self {
            level,
            _samples: [0; 32],
        }
    }
}

impl Describe for WideGauge {
    fn describe(&self) -> String {
        format!("wide gauge at {}", self.level)
    }

    fn bump(&mut self) {
        self.level += 1;
    }
}

#[test]
fn test_inline_construction_never_allocates() {
    static COUNTERS: Counters = Counters::new();

    let slot = RawSlot::<(), FourWords>::new(123_u64, CountingAlloc(&COUNTERS)).unwrap();
    assert!(slot.is_inline());
    drop(slot);

    assert_eq!(COUNTERS.allocated(), 0);
    assert_eq!(COUNTERS.released(), 0);
}

#[test]
fn test_spill_allocates_and_releases_exactly_once() {
    static COUNTERS: Counters = Counters::new();

    let slot = RawSlot::<(), FourWords>::new([5_u64; 32], CountingAlloc(&COUNTERS)).unwrap();
    assert!(!slot.is_inline());
    assert_eq!(COUNTERS.allocated(), 1);
    assert_eq!(COUNTERS.released(), 0);

    drop(slot);
    assert_eq!(COUNTERS.allocated(), 1);
    assert_eq!(COUNTERS.released(), 1);
}

#[test]
fn test_size_boundary_is_exact() {
    static COUNTERS: Counters = Counters::new();
    const CAPACITY: usize = RawSlot::<(), FourWords>::INLINE_CAPACITY;

    let exact = RawSlot::<(), FourWords>::new([0_u8; CAPACITY], CountingAlloc(&COUNTERS)).unwrap();
    assert!(exact.is_inline());
    assert_eq!(COUNTERS.allocated(), 0);

    let over =
        RawSlot::<(), FourWords>::new([0_u8; CAPACITY + 1], CountingAlloc(&COUNTERS)).unwrap();
    assert!(!over.is_inline());
    assert_eq!(COUNTERS.allocated(), 1);
}

#[test]
fn test_alignment_boundary_is_exact() {
    static COUNTERS: Counters = Counters::new();

    #[repr(align(8))]
    struct AtLimit([u8; 8]);

    #[repr(align(16))]
    struct PastLimit([u8; 8]);

    assert_eq!(RawSlot::<(), TwoWords>::INLINE_ALIGNMENT, 8);

    let at = RawSlot::<(), TwoWords>::new(AtLimit([1; 8]), CountingAlloc(&COUNTERS)).unwrap();
    assert!(at.is_inline());
    assert_eq!(COUNTERS.allocated(), 0);

    let past = RawSlot::<(), TwoWords>::new(PastLimit([1; 8]), CountingAlloc(&COUNTERS)).unwrap();
    assert!(!past.is_inline());
    assert_eq!(COUNTERS.allocated(), 1);
    assert_eq!(past.payload_ptr().as_ptr().addr() % 16, 0);
}

#[test]
fn test_inline_payload_dropped_exactly_once() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    let slot = RawSlot::<(), TwoWords>::new(DropTally { drops: &DROPS }, Global).unwrap();
    assert!(slot.is_inline());
    assert_eq!(DROPS.load(Ordering::Relaxed), 0);
    drop(slot);
    assert_eq!(DROPS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_spilled_payload_dropped_exactly_once() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);
    static COUNTERS: Counters = Counters::new();

    let slot = RawSlot::<(), TwoWords>::new(
        BigDropTally::new(&DROPS),
        CountingAlloc(&COUNTERS),
    )
    .unwrap();
    assert!(!slot.is_inline());
    drop(slot);

    assert_eq!(DROPS.load(Ordering::Relaxed), 1);
    assert_eq!(COUNTERS.released(), 1);
}

#[test]
fn test_native_moves_preserve_the_payload() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    fn pass_through<T>(value: T) -> T {
        value
    }

    let slot = RawSlot::<(), TwoWords>::new(DropTally { drops: &DROPS }, Global).unwrap();
    let slot = pass_through(slot);
    let boxed = vec![slot];
    drop(boxed);

    assert_eq!(DROPS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_native_moves_preserve_spilled_identity() {
    let slot = RawSlot::<(), TwoWords>::new([9_u64; 16], Global).unwrap();
    let before = slot.payload_ptr();

    let slot = vec![slot].pop().unwrap();
    assert_eq!(slot.payload_ptr(), before);
    assert_eq!(slot.downcast_ref::<[u64; 16]>(), Some(&[9; 16]));
}

#[test]
fn test_relocation_between_spaces_never_allocates() {
    static COUNTERS: Counters = Counters::new();

    let slot = RawSlot::<(), TwoWords>::new([4_u64; 32], CountingAlloc(&COUNTERS)).unwrap();
    assert_eq!(COUNTERS.allocated(), 1);
    let before = slot.payload_ptr();

    let slot: RawSlot<(), FourWords> = slot.relocate_into().unwrap();
    assert_eq!(COUNTERS.allocated(), 1);
    assert_eq!(slot.payload_ptr(), before);

    drop(slot);
    assert_eq!(COUNTERS.released(), 1);
}

#[test]
fn test_relocated_source_needs_no_cleanup() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    let slot = RawSlot::<(), TwoWords>::new(DropTally { drops: &DROPS }, Global).unwrap();
    let slot: RawSlot<(), FourWords> = slot.relocate_into().unwrap();

    // Only the relocated slot owns the payload now; dropping it is the one
    // and only destruction.
    assert_eq!(DROPS.load(Ordering::Relaxed), 0);
    drop(slot);
    assert_eq!(DROPS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_take_releases_the_block_without_dropping_the_payload() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);
    static COUNTERS: Counters = Counters::new();

    let slot = RawSlot::<(), TwoWords>::new(
        BigDropTally::new(&DROPS),
        CountingAlloc(&COUNTERS),
    )
    .unwrap();
    let payload: BigDropTally = slot.take().unwrap();

    assert_eq!(COUNTERS.released(), 1);
    assert_eq!(DROPS.load(Ordering::Relaxed), 0);
    drop(payload);
    assert_eq!(DROPS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_allocation_failure_produces_no_slot_and_no_leak() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    let result = RawSlot::<(), TwoWords>::new(BigDropTally::new(&DROPS), FailingAlloc);
    assert_eq!(result.err(), Some(AllocError));

    // The value handed to the failed constructor is dropped exactly once.
    assert_eq!(DROPS.load(Ordering::Relaxed), 1);
}

#[test]
fn test_allocation_failure_is_irrelevant_for_inline_payloads() {
    let slot = RawSlot::<(), TwoWords>::new(77_u32, FailingAlloc).unwrap();
    assert_eq!(slot.downcast_ref::<u32>(), Some(&77));
}

#[test]
fn test_declared_operations_round_trip_inline() {
    let mut slot = RawSlot::<DescribeCaps, TwoWords>::new(Gauge(3), Global).unwrap();
    assert!(slot.is_inline());

    // SAFETY: slots and payload address come from the same slot.
    let described = unsafe { (slot.slots().describe)(slot.payload_ptr()) };
    assert_eq!(described, Gauge(3).describe());

    // SAFETY: slots and payload address come from the same slot, and the
    // mutable projection guarantees exclusive access.
    unsafe { (slot.slots().bump)(slot.payload_ptr_mut()) };
    assert_eq!(slot.downcast_ref::<Gauge>(), Some(&Gauge(4)));
}

#[test]
fn test_declared_operations_round_trip_spilled() {
    let mut slot = RawSlot::<DescribeCaps, TwoWords>::new(WideGauge::new(10), Global).unwrap();
    assert!(!slot.is_inline());

    // SAFETY: slots and payload address come from the same slot.
    let described = unsafe { (slot.slots().describe)(slot.payload_ptr()) };
    assert_eq!(described, "wide gauge at 10");

    // SAFETY: slots and payload address come from the same slot, and the
    // mutable projection guarantees exclusive access.
    unsafe { (slot.slots().bump)(slot.payload_ptr_mut()) };

    // SAFETY: slots and payload address come from the same slot.
    let described = unsafe { (slot.slots().describe)(slot.payload_ptr()) };
    assert_eq!(described, "wide gauge at 11");
}

#[test]
fn test_slots_are_shared_per_payload_type() {
    let a = RawSlot::<DescribeCaps, TwoWords>::new(Gauge(1), Global).unwrap();
    let b = RawSlot::<DescribeCaps, TwoWords>::new(Gauge(2), Global).unwrap();
    let wide = RawSlot::<DescribeCaps, TwoWords>::new(WideGauge::new(1), Global).unwrap();

    assert!(std::ptr::eq(a.slots(), b.slots()));
    assert!(!std::ptr::eq(a.slots(), wide.slots()));
}

#[test]
fn test_payload_metadata() {
    let slot = RawSlot::<(), TwoWords>::new(1_u8, Global).unwrap();

    assert!(slot.is::<u8>());
    assert!(!slot.is::<i8>());
    assert_eq!(slot.payload_type_id(), std::any::TypeId::of::<u8>());
    assert_eq!(slot.payload_type_name(), "u8");
    assert_eq!(format!("{slot:?}"), "RawSlot { payload: \"u8\", inline: true, .. }");
}

#[test]
fn test_spilled_metadata_names_the_payload_not_the_shim() {
    let slot = RawSlot::<(), TwoWords>::new(WideGauge::new(1), Global).unwrap();

    assert!(slot.is::<WideGauge>());
    assert!(slot.payload_type_name().contains("WideGauge"));
    assert!(!slot.is_inline());
}
