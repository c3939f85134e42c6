//! Exponentially weighted event-rate meter.
//!
//! [`RateMeter`] answers "how many events per minute, lately?" in O(1)
//! memory. Marks accumulate in a counter; every 5 s tick the counter is
//! folded into an exponentially weighted moving average whose time constant
//! is the meter window (one, five or fifteen minutes). Ticks are applied
//! lazily when the meter is touched, so nothing has to run in the
//! background and the result does not depend on how often it is read.
//!
//! ```
//! use lis3dh::meter::{MeterWindow, RateMeter};
//!
//! let mut meter = RateMeter::new(MeterWindow::OneMinute);
//! for s in 0..120u64 {
//!   meter.mark(s * 1_000);
//! }
//! let per_minute = meter.rate(120_000);
//! assert!((per_minute - 60.0).abs() < 1.0);
//! ```

use micromath::F32Ext;

/// Decay tick, in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 5_000;

const TICK_SECONDS: f32 = (TICK_INTERVAL_MS / 1_000) as f32;

// exp() of anything below this is flushed to zero.
const MIN_EXPONENT: f32 = -80.0;

// Rates below this (events/s) read as zero.
const RATE_FLOOR: f32 = 1.0e-9;

/// Averaging window of a [`RateMeter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeterWindow {
  #[default]
  OneMinute,
  FiveMinutes,
  FifteenMinutes,
}

impl MeterWindow {
  pub fn minutes(self) -> f32 {
    match self {
      MeterWindow::OneMinute => 1.,
      MeterWindow::FiveMinutes => 5.,
      MeterWindow::FifteenMinutes => 15.,
    }
  }
}

/// Exponentially weighted moving rate of discrete marks.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RateMeter {
  window: MeterWindow,
  /// ln(1 - alpha) = -tick / window
  log_keep: f32,
  alpha: f32,
  uncounted: u32,
  /// Events per second.
  rate: f32,
  initialized: bool,
  last_tick_ms: Option<u64>,
}

impl RateMeter {
  pub fn new(window: MeterWindow) -> Self {
    let log_keep = -TICK_SECONDS / (window.minutes() * 60.);
    Self {
      window,
      log_keep,
      alpha: 1. - F32Ext::exp(log_keep),
      uncounted: 0,
      rate: 0.,
      initialized: false,
      last_tick_ms: None,
    }
  }

  pub fn window(&self) -> MeterWindow {
    self.window
  }

  /// Record one event at `now_ms`.
  pub fn mark(&mut self, now_ms: u64) {
    self.tick_if_necessary(now_ms);
    self.uncounted = self.uncounted.saturating_add(1);
  }

  /// Current rate in events per minute, decayed up to `now_ms`.
  pub fn rate(&mut self, now_ms: u64) -> f32 {
    self.tick_if_necessary(now_ms);
    self.rate * 60.
  }

  /// Drop all history; the next mark starts a fresh meter.
  pub fn reset(&mut self) {
    *self = Self::new(self.window);
  }

  fn tick_if_necessary(&mut self, now_ms: u64) {
    let Some(last) = self.last_tick_ms else {
      self.last_tick_ms = Some(now_ms);
      return;
    };
    let ticks = now_ms.saturating_sub(last) / TICK_INTERVAL_MS;
    if ticks == 0 {
      return;
    }
    self.last_tick_ms = Some(last + ticks * TICK_INTERVAL_MS);

    // The first elapsed tick carries everything marked since the last one.
    let instant = self.uncounted as f32 / TICK_SECONDS;
    self.uncounted = 0;
    if self.initialized {
      self.rate += self.alpha * (instant - self.rate);
    } else {
      self.rate = instant;
      self.initialized = true;
    }

    // Every further tick saw no events and only decays.
    let idle = ticks - 1;
    if idle > 0 {
      let exponent = self.log_keep * idle as f32;
      self.rate = if exponent < MIN_EXPONENT { 0. } else { self.rate * F32Ext::exp(exponent) };
    }
    if self.rate < RATE_FLOOR {
      self.rate = 0.;
    }
  }
}

impl Default for RateMeter {
  fn default() -> Self {
    Self::new(MeterWindow::default())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn untouched_meter_reads_zero() {
    let mut m = RateMeter::default();
    assert_eq!(m.rate(0), 0.);
    assert_eq!(m.rate(3_600_000), 0.);
  }

  #[test]
  fn marks_are_counted_at_the_next_tick() {
    let mut m = RateMeter::default();
    for _ in 0..10 {
      m.mark(0);
    }
    assert_eq!(m.rate(4_999), 0.);
    // 10 events in a 5 s tick = 2/s = 120/min
    assert!((m.rate(5_000) - 120.).abs() < 1e-3);
  }

  #[test]
  fn burst_then_idle_decays_to_zero() {
    let mut m = RateMeter::default();
    for _ in 0..50 {
      m.mark(1_000);
    }
    let early = m.rate(10_000);
    assert!(early > 0.);
    let later = m.rate(70_000);
    assert!(later < early);
    assert_eq!(m.rate(3_600_000), 0.);
  }

  #[test]
  fn decay_does_not_depend_on_read_cadence() {
    let mut a = RateMeter::default();
    let mut b = RateMeter::default();
    for m in [&mut a, &mut b] {
      for s in 0..30u64 {
        m.mark(s * 1_000);
      }
    }
    for t in (30_000..=90_000).step_by(1_000) {
      a.rate(t);
    }
    let ra = a.rate(90_000);
    let rb = b.rate(90_000);
    assert!((ra - rb).abs() < 0.05 * ra.max(1.), "{ra} vs {rb}");
  }

  #[test]
  fn constant_interval_converges_to_its_rate() {
    let mut m = RateMeter::new(MeterWindow::OneMinute);
    // one mark every 2 s => 30/min
    for i in 0..600u64 {
      m.mark(i * 2_000);
    }
    let r = m.rate(1_200_000);
    assert!((r - 30.).abs() < 1.5, "{r}");
  }

  #[test]
  fn longer_windows_respond_slower() {
    let mut fast = RateMeter::new(MeterWindow::OneMinute);
    let mut slow = RateMeter::new(MeterWindow::FifteenMinutes);
    for m in [&mut fast, &mut slow] {
      m.mark(0);
      m.rate(5_000);
      for s in 5..65u64 {
        m.mark(s * 1_000);
      }
    }
    assert!(fast.rate(65_000) > slow.rate(65_000));
  }

  #[test]
  fn reset_restarts_from_zero() {
    let mut m = RateMeter::default();
    for s in 0..20u64 {
      m.mark(s * 1_000);
    }
    assert!(m.rate(20_000) > 0.);
    m.reset();
    assert_eq!(m.rate(25_000), 0.);
    assert_eq!(m.window(), MeterWindow::OneMinute);
  }
}
