//! Single and double click detection.
//!
//! The click engine compares the high-passed signal against `CLICK_THS` and
//! latches the result in `CLICK_SRC`. The latch is released by reading
//! `INT1_SRC`, so [`Lis3dh::read_click_source`] reads the source first and
//! only then clears; swapping the two loses the event.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs>(mut accel: lis3dh::Lis3dh<I, D>) -> Result<(), lis3dh::Error<I::Error>> {
//! use lis3dh::click::{ClickConfig, ClickMode};
//!
//! accel.configure_click(ClickConfig { mode: ClickMode::Double, ..Default::default() }).await?;
//!
//! let src = accel.read_click_source().await?;
//! if src.double {
//!   // ...
//! }
//! # Ok(())
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};

use super::{defs::*, Error, Lis3dh};

impl<I, D, W, E> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Program click detection and route it to INT1.
  ///
  /// `ClickMode::None` clears `CTRL_REG3.I1_CLICK` and zeroes `CLICK_CFG`,
  /// which disables every per-axis click enable. Any other mode sets
  /// `I1_CLICK`, latches INT1 (`CTRL_REG5.LIR_INT1`), enables single or
  /// double click on all three axes and writes the four threshold/timing
  /// registers.
  ///
  /// `threshold` and `time_limit` are 7-bit fields; larger values fail with
  /// [`Error::InvalidArgument`] before anything is written.
  pub async fn configure_click(&mut self, cfg: ClickConfig) -> Result<(), Error<E>> {
    if cfg.mode == ClickMode::None {
      self.modify_bit(Reg::Ctrl3, CTRL3_I1_CLICK_BIT, false).await?;
      return self.write(Reg::ClickCfg, ClickAxes::none()).await;
    }
    if cfg.threshold > CLICK_7BIT_MAX || cfg.time_limit > CLICK_7BIT_MAX {
      return Err(Error::InvalidArgument);
    }

    self.modify_bit(Reg::Ctrl3, CTRL3_I1_CLICK_BIT, true).await?;
    self.modify_bit(Reg::Ctrl5, CTRL5_LIR_INT1_BIT, true).await?;
    self.write(Reg::ClickCfg, ClickAxes::all(cfg.mode)).await?;

    self.write_u8(Reg::ClickThs, cfg.threshold).await?;
    self.write_u8(Reg::TimeLimit, cfg.time_limit).await?;
    self.write_u8(Reg::TimeLatency, cfg.time_latency).await?;
    self.write_u8(Reg::TimeWindow, cfg.time_window).await
  }

  /// Shorthand for `configure_click` with [`ClickMode::None`].
  pub async fn disable_click(&mut self) -> Result<(), Error<E>> {
    self.configure_click(ClickConfig { mode: ClickMode::None, ..Default::default() }).await
  }

  /// Read back the click configuration.
  pub async fn get_click_config(&mut self) -> Result<ClickConfig, Error<E>> {
    let axes: ClickAxes = self.read(Reg::ClickCfg).await?;
    Ok(ClickConfig {
      mode: axes.mode(),
      threshold: self.read_u8(Reg::ClickThs).await? & CLICK_7BIT_MAX,
      time_limit: self.read_u8(Reg::TimeLimit).await? & CLICK_7BIT_MAX,
      time_latency: self.read_u8(Reg::TimeLatency).await?,
      time_window: self.read_u8(Reg::TimeWindow).await?,
    })
  }

  /// Read the latched `CLICK_SRC`, then clear the latch by reading `INT1_SRC`.
  pub async fn read_click_source(&mut self) -> Result<ClickSource, Error<E>> {
    let src: ClickSource = self.read(Reg::ClickSrc).await?;
    let _ = self.read_u8(Reg::Int1Src).await?;
    Ok(src)
  }
}

/// Which kind of click is detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClickMode {
  None = 0x00,
  Single = 0x01,
  Double = 0x02,
}

impl From<ClickMode> for u8 {
  fn from(value: ClickMode) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for ClickMode {
  type Error = ();

  fn try_from(v: u8) -> Result<Self, Self::Error> {
    match v {
      0x00 => Ok(ClickMode::None),
      0x01 => Ok(ClickMode::Single),
      0x02 => Ok(ClickMode::Double),
      _ => Err(()),
    }
  }
}

/// Click detector configuration (raw register values).
///
/// - threshold: `CLICK_THS`, 7 bits. LSB depends on range: 16 mg at ±2 g,
///   32 mg at ±4 g, 62 mg at ±8 g, 186 mg at ±16 g. Default = 80.
/// - time_limit: `TIME_LIMIT`, 7 bits, maximum time the signal may stay
///   above threshold for it to count as a click. Default = 10.
/// - time_latency: `TIME_LATENCY`, dead time after the first click before
///   the second may start. Default = 20.
/// - time_window: `TIME_WINDOW`, window in which the second click of a double
///   click must start. Default = 100.
///
/// All timings count in 1/ODR.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClickConfig {
  pub mode: ClickMode,
  pub threshold: u8,
  pub time_limit: u8,
  pub time_latency: u8,
  pub time_window: u8,
}

impl Default for ClickConfig {
  fn default() -> Self {
    Self { mode: ClickMode::Single, threshold: 80, time_limit: 10, time_latency: 20, time_window: 100 }
  }
}

/// `CLICK_SRC` (latched click source).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct ClickSource {
  pub x: bool,
  pub y: bool,
  pub z: bool,
  /// Click sign: `true` for negative.
  pub negative: bool,
  pub single: bool,
  pub double: bool,
  /// One or more click interrupts have been generated.
  pub active: bool,
}

/// `CLICK_CFG` per-axis enables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
struct ClickAxes {
  pub x_single: bool,
  pub x_double: bool,
  pub y_single: bool,
  pub y_double: bool,
  pub z_single: bool,
  pub z_double: bool,
}

impl ClickAxes {
  const fn none() -> Self {
    Self { x_single: false, x_double: false, y_single: false, y_double: false, z_single: false, z_double: false }
  }

  const fn all(mode: ClickMode) -> Self {
    let single = matches!(mode, ClickMode::Single);
    let double = matches!(mode, ClickMode::Double);
    Self { x_single: single, x_double: double, y_single: single, y_double: double, z_single: single, z_double: double }
  }

  fn mode(&self) -> ClickMode {
    if self.x_double || self.y_double || self.z_double {
      ClickMode::Double
    } else if self.x_single || self.y_single || self.z_single {
      ClickMode::Single
    } else {
      ClickMode::None
    }
  }
}
