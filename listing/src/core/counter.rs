//! Counter arithmetic for guest, room and bathroom counts.

/// Smallest value a counter can hold.
pub const MIN_COUNT: u64 = 1;

pub fn increment(value: u64) -> u64 {
    value.saturating_add(1)
}

/// Decrement by one; a counter already at [`MIN_COUNT`] stays there.
pub fn decrement(value: u64) -> u64 {
    if value <= MIN_COUNT {
        return MIN_COUNT;
    }
    value - 1
}
