//! Time source for the vibration detector.
//!
//! The driver never reads a clock itself. Time-dependent logic takes a
//! [`Clock`] from the caller, which keeps it usable on any executor or
//! timer peripheral and lets tests drive time by hand.
//!
//! ```
//! use lis3dh::clock::Clock;
//!
//! struct Ticks(u64);
//!
//! impl Clock for Ticks {
//!   fn now_ms(&self) -> u64 {
//!     self.0
//!   }
//! }
//! ```

/// Monotonic millisecond time source.
///
/// Values must never decrease. The epoch is arbitrary.
pub trait Clock {
  fn now_ms(&self) -> u64;
}

impl<C: Clock + ?Sized> Clock for &C {
  fn now_ms(&self) -> u64 {
    (**self).now_ms()
  }
}
