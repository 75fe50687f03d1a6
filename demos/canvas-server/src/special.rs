//! The static special-boxes table.
//!
//! A small random subset of boxes carries a category code (0–3) that
//! the frontend uses for rendering hints. The table is generated once
//! at startup and served unmodified for the life of the process — it
//! is not part of the shared state and never changes a box's value.

use std::collections::HashMap;

use rand::Rng;

/// How many special boxes to draw.
pub const SPECIAL_COUNT: usize = 2000;

/// Highest category code (inclusive).
const CATEGORY_MAX: u8 = 3;

/// Offsets are drawn from the first million boxes.
const OFFSET_RANGE: u32 = 1_000_000;

/// Generates the offset → category table.
///
/// Duplicate offsets collapse, so the table may come out slightly
/// smaller than `count`.
pub fn generate_table(count: usize) -> HashMap<u32, u8> {
    let mut rng = rand::rng();
    let mut table = HashMap::with_capacity(count);
    for _ in 0..count {
        table.insert(
            rng.random_range(0..OFFSET_RANGE),
            rng.random_range(0..=CATEGORY_MAX),
        );
    }
    table
}
