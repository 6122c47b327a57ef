//! Serial numbers for correlating events and requests on the wire.
//!
//! Serials are handed out by the frontend context and travel with
//! enter/leave pairs, key events and configure events. The underlying
//! counter wraps, so comparisons are made on allocation age rather than on
//! the raw value.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// A wire serial.
///
/// Ordering is wrap-aware: two serials compare by which one was allocated
/// more recently, as long as they are less than half the counter range
/// apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Serial(u32);

impl Serial {
    /// Wraps a raw serial received from the wire.
    pub const fn new(raw: u32) -> Self {
        Serial(raw)
    }

    /// The raw value carried on the wire.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl From<Serial> for u32 {
    fn from(serial: Serial) -> u32 {
        serial.0
    }
}

impl fmt::Display for Serial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialOrd for Serial {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        // The wrapped difference read as a signed number says which serial
        // is older: a positive delta means `other` was allocated after
        // `self`, even when the counter wrapped in between.
        let delta = other.0.wrapping_sub(self.0) as i32;
        Some(0.cmp(&delta))
    }
}

/// The allocator behind [`Serial`].
///
/// One instance lives in the frontend context and is shared by everything
/// that emits serial-carrying events. Zero is never handed out, so a zero
/// serial read off the wire always means "no serial".
#[derive(Debug)]
pub struct SerialCounter {
    next: AtomicU32,
}

impl SerialCounter {
    /// Creates a counter whose first serial is 1.
    pub fn new() -> Self {
        SerialCounter {
            next: AtomicU32::new(1),
        }
    }

    /// Hands out the next serial, skipping zero at the wrap.
    pub fn next_serial(&self) -> Serial {
        loop {
            let value = self.next.fetch_add(1, Ordering::Relaxed);
            if value != 0 {
                return Serial(value);
            }
        }
    }
}

impl Default for SerialCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_allocation_order() {
        let counter = SerialCounter::new();
        let serials: Vec<Serial> = (0..4).map(|_| counter.next_serial()).collect();
        assert!(serials.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn counter_skips_zero_at_the_wrap() {
        let counter = SerialCounter {
            next: AtomicU32::new(u32::MAX),
        };
        let before = counter.next_serial();
        let after = counter.next_serial();
        assert_eq!(before.raw(), u32::MAX);
        assert_eq!(after.raw(), 1);
        assert!(before < after);
    }

    #[test]
    fn nearby_serials_compare_by_age_across_the_wrap() {
        assert!(Serial::new(u32::MAX - 1) < Serial::new(3));
        assert!(Serial::new(3) > Serial::new(u32::MAX - 1));
        assert_eq!(Serial::new(7), Serial::new(7));
    }
}
