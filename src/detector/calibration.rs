//! Rest-state calibration and per-axis sensitivity.
//!
//! The baseline is the mean of `|reading|` per axis while the device sits
//! still, and a sample is compared against it as `|reading - baseline|`.
//! Sensitivities are the baseline scaled by `1 + auto_sensitivity`, except on
//! the gravity-aligned axis (baseline closest to 1 g): there only the
//! fractional part is scaled and 1 g is added back, so the gravity offset
//! does not inflate the threshold.

use embedded_hal_async::{delay::DelayNs, i2c::*};
use micromath::{vector::Vector3d, F32Ext};

use crate::{Axis, Error, Lis3dh};

impl<I, D, W, E> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Average `iterations` absolute readings per axis, `interval_ms` apart.
  ///
  /// Blocks for about `iterations × interval_ms`.
  pub async fn sample_baseline(&mut self, iterations: u16, interval_ms: u32) -> Result<Vector3d<f32>, Error<E>> {
    if iterations == 0 {
      return Err(Error::InvalidArgument);
    }
    let mut sum = Vector3d { x: 0f32, y: 0f32, z: 0f32 };
    for _ in 0..iterations {
      let v = self.read_all().await?;
      sum.x += F32Ext::abs(v.x);
      sum.y += F32Ext::abs(v.y);
      sum.z += F32Ext::abs(v.z);
      self.delay.delay_ms(interval_ms).await;
    }
    let n = iterations as f32;
    Ok(Vector3d { x: sum.x / n, y: sum.y / n, z: sum.z / n })
  }
}

/// Auto-calibration parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AutoCalibration {
  /// Samples per axis. Default = 50.
  pub iterations: u16,
  /// Time between samples. Default = 200 ms.
  pub interval_ms: u32,
  /// Relative headroom above the baseline. Default = 0.5.
  pub auto_sensitivity: f32,
}

impl Default for AutoCalibration {
  fn default() -> Self {
    Self { iterations: 50, interval_ms: 200, auto_sensitivity: 0.5 }
  }
}

/// Baseline and per-axis thresholds used to classify samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
  pub baseline: Vector3d<f32>,
  pub sensitivity: Vector3d<f32>,
}

impl Calibration {
  /// No baseline: a sample is active when `|reading|` exceeds `sensitivity`.
  pub fn uncalibrated(sensitivity: Vector3d<f32>) -> Self {
    Self { baseline: Vector3d { x: 0., y: 0., z: 0. }, sensitivity }
  }

  /// Derive sensitivities from a measured baseline.
  pub fn from_baseline(baseline: Vector3d<f32>, auto_sensitivity: f32) -> Self {
    let gravity = gravity_axis(&baseline);
    let scale = 1. + auto_sensitivity;
    let derive = |axis: Axis| {
      let b = component(&baseline, axis);
      if axis == gravity {
        F32Ext::fract(b) * scale + 1.
      } else {
        b * scale
      }
    };
    Self { baseline, sensitivity: Vector3d { x: derive(Axis::X), y: derive(Axis::Y), z: derive(Axis::Z) } }
  }

  /// Axis whose baseline is closest to 1 g.
  pub fn gravity_axis(&self) -> Axis {
    gravity_axis(&self.baseline)
  }

  /// `|reading - baseline|` per axis.
  pub fn deviation(&self, reading: &Vector3d<f32>) -> Vector3d<f32> {
    let dev = |axis: Axis| F32Ext::abs(component(reading, axis) - component(&self.baseline, axis));
    Vector3d { x: dev(Axis::X), y: dev(Axis::Y), z: dev(Axis::Z) }
  }

  /// True when any axis deviates by more than its sensitivity.
  pub fn exceeds(&self, reading: &Vector3d<f32>) -> bool {
    let dev = self.deviation(reading);
    Axis::ALL.iter().any(|a| component(&dev, *a) > component(&self.sensitivity, *a))
  }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Calibration {
  fn format(&self, f: defmt::Formatter) {
    let (b, s) = (&self.baseline, &self.sensitivity);
    defmt::write!(
      f,
      "Calibration {{ baseline: ({}, {}, {}), sensitivity: ({}, {}, {}) }}",
      b.x,
      b.y,
      b.z,
      s.x,
      s.y,
      s.z
    )
  }
}

pub(crate) fn component(v: &Vector3d<f32>, axis: Axis) -> f32 {
  match axis {
    Axis::X => v.x,
    Axis::Y => v.y,
    Axis::Z => v.z,
  }
}

fn gravity_axis(baseline: &Vector3d<f32>) -> Axis {
  let off = |axis: Axis| F32Ext::abs(component(baseline, axis) - 1.);
  let mut best = Axis::X;
  for axis in [Axis::Y, Axis::Z] {
    if off(axis) < off(best) {
      best = axis;
    }
  }
  best
}

#[cfg(test)]
mod tests {
  use embassy_futures::block_on;

  use super::*;
  use crate::testing::{new_driver, FakeBus, ManualClock};
  use crate::{clock::Clock, Axis};

  fn v(x: f32, y: f32, z: f32) -> Vector3d<f32> {
    Vector3d { x, y, z }
  }

  #[test]
  fn baseline_of_gravity_on_z() {
    let bus = FakeBus::new();
    bus.set_raw(Axis::X, 0);
    bus.set_raw(Axis::Y, 0);
    bus.set_raw(Axis::Z, 16400);
    let clock = ManualClock::new();
    let mut dev = new_driver(bus, clock.delay());

    let baseline = block_on(dev.sample_baseline(50, 200)).unwrap();
    assert!(baseline.x.abs() < 1e-6);
    assert!(baseline.y.abs() < 1e-6);
    assert!((baseline.z - 1.0).abs() < 0.01);
    // 50 samples, 200 ms apart
    assert_eq!(clock.now_ms(), 10_000);

    let cal = Calibration::from_baseline(baseline, 0.5);
    assert_eq!(cal.gravity_axis(), Axis::Z);
    assert!(cal.sensitivity.z > 1.0);
    assert!(cal.sensitivity.x < 1e-6);
  }

  #[test]
  fn baseline_uses_absolute_values() {
    let bus = FakeBus::new();
    bus.set_raw(Axis::Y, -8190);
    let clock = ManualClock::new();
    let mut dev = new_driver(bus, clock.delay());

    let baseline = block_on(dev.sample_baseline(4, 10)).unwrap();
    assert!((baseline.y - 0.5).abs() < 1e-6);
  }

  #[test]
  fn zero_iterations_is_rejected() {
    let clock = ManualClock::new();
    let mut dev = new_driver(FakeBus::new(), clock.delay());
    assert_eq!(block_on(dev.sample_baseline(0, 200)), Err(Error::InvalidArgument));
  }

  #[test]
  fn gravity_axis_keeps_only_the_fraction_scaled() {
    let cal = Calibration::from_baseline(v(0.02, 0.98, 0.04), 1.0);
    assert_eq!(cal.gravity_axis(), Axis::Y);
    assert!((cal.sensitivity.x - 0.04).abs() < 1e-5);
    assert!((cal.sensitivity.y - (0.98 * 2. + 1.)).abs() < 1e-4);
    assert!((cal.sensitivity.z - 0.08).abs() < 1e-5);

    let cal = Calibration::from_baseline(v(1.05, 0.0, 0.1), 0.5);
    assert_eq!(cal.gravity_axis(), Axis::X);
    assert!((cal.sensitivity.x - (0.05 * 1.5 + 1.)).abs() < 1e-4);
  }

  #[test]
  fn exceeds_on_any_axis() {
    let cal = Calibration { baseline: v(0., 0., 1.), sensitivity: v(0.1, 0.1, 0.1) };
    assert!(!cal.exceeds(&v(0., 0., 1.)));
    assert!(!cal.exceeds(&v(0.05, -0.05, 1.05)));
    assert!(cal.exceeds(&v(0.2, 0., 1.)));
    assert!(cal.exceeds(&v(0., 0., 1.3)));
    assert!(cal.exceeds(&v(0., 0., 0.85)));
  }

  #[test]
  fn swing_across_zero_is_measured_from_the_baseline() {
    let cal = Calibration { baseline: v(0.05, 0., 1.), sensitivity: v(0.1, 0.1, 0.1) };
    let dev = cal.deviation(&v(-0.1, 0., 1.));
    assert!((dev.x - 0.15).abs() < 1e-6);
    assert!(cal.exceeds(&v(-0.1, 0., 1.)));
    // same magnitude on the baseline side stays quiet
    assert!(!cal.exceeds(&v(0.1, 0., 1.)));
  }

  #[test]
  fn uncalibrated_compares_magnitudes() {
    let cal = Calibration::uncalibrated(v(1., 0.1, 0.1));
    assert!(!cal.exceeds(&v(-0.9, 0.05, 0.)));
    assert!(cal.exceeds(&v(0., -0.2, 0.)));
  }
}
