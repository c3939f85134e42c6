//! Vibration detection on top of the LIS3DH driver.
//!
//! [`VibrationDetector`] polls X/Y/Z at a fixed period, compares each sample
//! against a [`Calibration`], and turns the stream into two notifications:
//!
//! - **immediate**: the debounced "vibrating" state changed
//!   ([`VibrationHandler::on_immediate`]).
//! - **threshold**: vibration has been sustained, judged by one
//!   [`ThresholdPolicy`] ([`VibrationHandler::on_threshold`]).
//!
//! Every active sample is also marked on a [`RateMeter`], so
//! [`VibrationDetector::read`] reports the recent events-per-minute rate
//! regardless of the policy.
//!
//! The detector owns the driver. Calibration and polling therefore can never
//! touch the bus at the same time, and no locking is involved.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I, D, C>(accel: lis3dh::Lis3dh<I, D>, clock: C, stop: &core::sync::atomic::AtomicBool) -> Result<(), lis3dh::Error<I::Error>>
//! # where I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs, C: lis3dh::clock::Clock {
//! use lis3dh::detector::{AutoCalibration, DetectorConfig, ThresholdSignal, VibrationDetector, VibrationHandler};
//!
//! struct Alerts;
//!
//! impl VibrationHandler for Alerts {
//!   fn on_immediate(&mut self, active: bool) {}
//!   fn on_threshold(&mut self, signal: ThresholdSignal) {}
//! }
//!
//! let config = DetectorConfig { auto_calibrate: Some(AutoCalibration::default()), ..Default::default() };
//! let mut detector = VibrationDetector::new(accel, clock, Alerts, config);
//! detector.init().await?;
//! detector.run(stop).await?;
//! # Ok(())
//! # }
//! ```

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal_async::{delay::DelayNs, i2c::*};
use micromath::vector::Vector3d;

use crate::{
  clock::Clock,
  meter::{MeterWindow, RateMeter},
  Error, Lis3dh,
};

mod calibration;
mod debounce;

pub use calibration::*;
pub use debounce::*;

/// Receives detector notifications.
///
/// Called from the polling task between two samples; implementations should
/// return quickly or hand the work off.
pub trait VibrationHandler {
  /// The debounced vibrating state changed to `active`.
  fn on_immediate(&mut self, active: bool);
  /// Vibration has been sustained according to the configured policy.
  fn on_threshold(&mut self, signal: ThresholdSignal);
}

impl VibrationHandler for () {
  fn on_immediate(&mut self, _active: bool) {}
  fn on_threshold(&mut self, _signal: ThresholdSignal) {}
}

impl<H: VibrationHandler + ?Sized> VibrationHandler for &mut H {
  fn on_immediate(&mut self, active: bool) {
    (**self).on_immediate(active)
  }

  fn on_threshold(&mut self, signal: ThresholdSignal) {
    (**self).on_threshold(signal)
  }
}

/// Payload of a threshold notification.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThresholdSignal {
  /// Vibrating without interruption for `held_ms`.
  Duration { held_ms: u64 },
  /// Meter rate rose above the configured limit.
  Rate { per_minute: f32 },
}

/// How "sustained vibration" is decided. The two are never combined.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThresholdPolicy {
  /// Alert once per episode after vibrating for at least `threshold_ms`.
  Duration { threshold_ms: u64 },
  /// Alert when the meter rate exceeds `per_minute`; re-armed once the rate
  /// is back at or below it.
  Rate { per_minute: f32 },
}

impl Default for ThresholdPolicy {
  fn default() -> Self {
    ThresholdPolicy::Duration { threshold_ms: 10_000 }
  }
}

/// Detector configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
  /// Poll period. Default = 1000 ms.
  pub period_ms: u32,
  /// Per-axis thresholds used when no auto-calibration runs.
  /// Default = (1.0, 0.1, 0.1) g.
  pub sensitivity: Vector3d<f32>,
  /// Calibrate against the rest state in [`VibrationDetector::init`].
  pub auto_calibrate: Option<AutoCalibration>,
  pub policy: ThresholdPolicy,
  pub meter_window: MeterWindow,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      period_ms: 1_000,
      sensitivity: Vector3d { x: 1., y: 0.1, z: 0.1 },
      auto_calibrate: None,
      policy: ThresholdPolicy::default(),
      meter_window: MeterWindow::OneMinute,
    }
  }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DetectorConfig {
  fn format(&self, f: defmt::Formatter) {
    let s = &self.sensitivity;
    defmt::write!(
      f,
      "DetectorConfig {{ period_ms: {=u32}, sensitivity: ({}, {}, {}), auto_calibrate: {}, policy: {}, meter_window: {} }}",
      self.period_ms,
      s.x,
      s.y,
      s.z,
      self.auto_calibrate,
      self.policy,
      self.meter_window
    )
  }
}

/// Polled vibration detector.
///
/// # Type Parameters
///
/// - `I`, `D`, `W`: as for [`Lis3dh`]; the delay also paces polling
/// - `C`: time source ([`Clock`])
/// - `H`: notification sink ([`VibrationHandler`])
pub struct VibrationDetector<I, D: DelayNs, C, H, W = ()> {
  sensor: Lis3dh<I, D, W>,
  clock: C,
  handler: H,
  config: DetectorConfig,
  calibration: Calibration,
  meter: RateMeter,
  debounce: Debounce,
  rate_alert: bool,
}

impl<I, D, W, E, C, H> VibrationDetector<I, D, C, H, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  C: Clock,
  H: VibrationHandler,
{
  /// Wrap an initialized driver. No I/O happens until [`Self::init`] or
  /// [`Self::poll`].
  pub fn new(sensor: Lis3dh<I, D, W>, clock: C, handler: H, config: DetectorConfig) -> Self {
    Self {
      sensor,
      clock,
      handler,
      calibration: Calibration::uncalibrated(config.sensitivity),
      meter: RateMeter::new(config.meter_window),
      debounce: Debounce::new(),
      rate_alert: false,
      config,
    }
  }

  /// Run auto-calibration if the configuration asks for it.
  ///
  /// Without auto-calibration the configured sensitivity is used against a
  /// zero baseline.
  pub async fn init(&mut self) -> Result<(), Error<E>> {
    if let Some(auto) = self.config.auto_calibrate {
      self.calibrate(auto).await?;
    }
    Ok(())
  }

  /// Re-measure the baseline (configured or default parameters) and derive
  /// new sensitivities. Rate and debounce state are left alone.
  pub async fn recalibrate(&mut self) -> Result<Calibration, Error<E>> {
    let auto = self.config.auto_calibrate.unwrap_or_default();
    self.calibrate(auto).await
  }

  async fn calibrate(&mut self, auto: AutoCalibration) -> Result<Calibration, Error<E>> {
    let baseline = self.sensor.sample_baseline(auto.iterations, auto.interval_ms).await?;
    self.calibration = Calibration::from_baseline(baseline, auto.auto_sensitivity);
    #[cfg(feature = "defmt")]
    defmt::debug!("Calibrated: {}", self.calibration);
    Ok(self.calibration)
  }

  /// Take and classify one sample, firing callbacks as needed.
  ///
  /// Returns whether the sample was active. A bus failure is returned as
  /// [`Error::SensorRead`] and leaves all detector state untouched.
  pub async fn poll(&mut self) -> Result<bool, Error<E>> {
    let reading = self.sensor.read_all().await.map_err(|e| match e {
      Error::I2c(e) => Error::SensorRead(e),
      other => other,
    })?;
    let now = self.clock.now_ms();
    let active = self.calibration.exceeds(&reading);

    if active {
      self.meter.mark(now);
    }

    if let Some(state) = self.debounce.update(active, now) {
      #[cfg(feature = "defmt")]
      defmt::debug!("Vibrating: {}", state);
      self.handler.on_immediate(state);
    }

    match self.config.policy {
      ThresholdPolicy::Duration { threshold_ms } => {
        if let Some(held_ms) = self.debounce.check_steady(threshold_ms, now) {
          #[cfg(feature = "defmt")]
          defmt::info!("Steady vibration for {=u64} ms", held_ms);
          self.handler.on_threshold(ThresholdSignal::Duration { held_ms });
        }
      }
      ThresholdPolicy::Rate { per_minute } => {
        let rate = self.meter.rate(now);
        if rate <= per_minute {
          self.rate_alert = false;
        } else if !self.rate_alert {
          self.rate_alert = true;
          #[cfg(feature = "defmt")]
          defmt::info!("Vibration rate {} per minute", rate);
          self.handler.on_threshold(ThresholdSignal::Rate { per_minute: rate });
        }
      }
    }

    Ok(active)
  }

  /// Poll every `period_ms` until `stop` is set.
  ///
  /// `stop` is checked before each sample; a sample in progress is always
  /// completed. The first error ends the loop and is returned, the caller
  /// decides whether to restart.
  pub async fn run(&mut self, stop: &AtomicBool) -> Result<(), Error<E>> {
    loop {
      if stop.load(Ordering::Acquire) {
        return Ok(());
      }
      self.poll().await?;
      self.sensor.delay.delay_ms(self.config.period_ms).await;
    }
  }

  /// Current events-per-minute rate, without waiting for a callback.
  pub fn read(&mut self) -> f32 {
    self.meter.rate(self.clock.now_ms())
  }

  /// Clear rate and debounce state. Calibration is kept.
  pub fn reset(&mut self) {
    self.meter.reset();
    self.debounce.reset();
    self.rate_alert = false;
  }

  pub fn is_vibrating(&self) -> bool {
    self.debounce.is_active()
  }

  pub fn calibration(&self) -> Calibration {
    self.calibration
  }

  /// Replace the calibration, e.g. with one persisted from an earlier run.
  pub fn set_calibration(&mut self, calibration: Calibration) {
    self.calibration = calibration;
  }

  pub fn config(&self) -> &DetectorConfig {
    &self.config
  }

  pub fn handler(&self) -> &H {
    &self.handler
  }

  pub fn handler_mut(&mut self) -> &mut H {
    &mut self.handler
  }

  /// Stop detecting and hand back the driver.
  pub fn release(self) -> Lis3dh<I, D, W> {
    self.sensor
  }
}
