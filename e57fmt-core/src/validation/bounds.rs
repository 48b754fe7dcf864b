//! Range and bounds validation
//!
//! Pure checks with overflow protection, no I/O.

use crate::ErrorCode;

/// Validate a `[start, start + count)` transfer against a payload length
///
/// Fails with [`ErrorCode::BadApiArgument`] if the range runs past the end
/// of the payload or its end does not fit in 64 bits.
pub const fn validate_transfer_range(start: u64, count: u64, length: u64) -> Result<(), ErrorCode> {
    match start.checked_add(count) {
        Some(end) if end <= length => Ok(()),
        _ => Err(ErrorCode::BadApiArgument),
    }
}

/// Validate a child index against the number of children
///
/// `allow_append` admits `index == count`, the slot right after the last
/// child.
pub const fn validate_child_index(index: u64, count: u64, allow_append: bool) -> Result<(), ErrorCode> {
    if index < count || (allow_append && index == count) {
        Ok(())
    } else {
        Err(ErrorCode::ChildIndexOutOfBounds)
    }
}

/// Check `minimum <= value <= maximum`
///
/// Written as a negated comparison pair so NaN inputs behave the same as
/// the reference library (they pass).
pub fn within_bounds<T: PartialOrd>(value: T, minimum: T, maximum: T) -> bool {
    !(value < minimum || maximum < value)
}
