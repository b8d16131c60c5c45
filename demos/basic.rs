//! Basic introduction to storing values in a `Valise`.
//!
//! This example demonstrates the fundamental concepts:
//! 1. Storing values of unrelated types behind one handle type
//! 2. Inline storage for small values, transparent heap spill for large ones
//! 3. Inspecting and downcasting the stored value
//! 4. Moving a value into a handle with a different inline capacity

use valise::prelude::*;

/// A deliberately large value: one kilobyte of samples.
#[derive(Debug, PartialEq)]
struct SampleBlock {
    samples: [u64; 128],
}

fn main() {
    println!("=== Storing mixed values ===\n");

    // Any type qualifies for the empty capability set `()`. Four words of
    // inline space is the default.
    let values: Vec<Valise<()>> = vec![
        Valise::new(42_u32),
        Valise::new(String::from("a string is three words")),
        Valise::new(SampleBlock { samples: [7; 128] }),
    ];

    for value in &values {
        println!(
            "{:<60} inline: {}",
            value.payload_type_name(),
            value.is_inline()
        );
    }

    // Example 1: checked downcasting
    println!("\nExample 1: downcast_ref");
    let number = &values[0];
    assert_eq!(number.downcast_ref::<u32>(), Some(&42));
    assert_eq!(number.downcast_ref::<i32>(), None);
    println!("values[0] holds a u32: {:?}", number.downcast_ref::<u32>());

    // Example 2: the spilled value kept its identity on the heap
    println!("\nExample 2: spilled values have a stable address");
    let block = &values[2];
    assert!(!block.is_inline());
    let address = block.payload_ptr();
    println!("SampleBlock lives at {address:p}");

    // Example 3: moving the value back out by value
    println!("\nExample 3: downcast by value");
    let mut values = values;
    let text: Valise<()> = values.remove(1);
    let text: String = text.downcast().expect("we stored a String");
    println!("recovered: {text:?}");

    // Example 4: transferring between inline capacities never reallocates
    println!("\nExample 4: transfer to a smaller handle");
    let block: Valise<()> = values.pop().expect("the block is still there");
    let before = block.payload_ptr();
    // The spilled block travels as a single pointer, so it fits any space.
    let block: Valise<(), S1> = block.transfer().expect("a spilled value always fits");
    assert_eq!(block.payload_ptr(), before);
    println!(
        "still at {:p} after moving into a one-word handle",
        block.payload_ptr()
    );
}
