//! Small shared utilities: identifiers, geometry and serials.

pub mod geometry;
pub mod ids;
pub mod serial;

pub use geometry::{Area, Position, Size};
pub use ids::{RegionId, SurfaceId};
pub use serial::{Serial, SerialCounter};

/// Returns the current monotonic time in milliseconds, truncated to the
/// 32 bits the wire protocol carries.
pub fn monotonic_ms() -> u32 {
    let mut tp = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // Cannot fail for CLOCK_MONOTONIC with a valid pointer.
    unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut tp) };
    (tp.tv_sec as u64)
        .wrapping_mul(1000)
        .wrapping_add(tp.tv_nsec as u64 / 1_000_000) as u32
}
