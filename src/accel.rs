//! Accelerometer configuration and data reading.
//!
//! Range, output data rate, resolution and block data update live in
//! `CTRL_REG1` and `CTRL_REG4`. Every setter here is a read-modify-write of
//! exactly the field it owns, so self-test, endianness and SPI-mode bits set
//! elsewhere survive.
//!
//! # Examples
//!
//! ```no_run
//! # async fn example<I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs>(mut accel: lis3dh::Lis3dh<I, D>) -> Result<(), lis3dh::Error<I::Error>> {
//! use lis3dh::accel::{DeviceConfig, Range};
//! use lis3dh::DataRate;
//!
//! // Apply a full configuration
//! accel.configure(DeviceConfig { data_rate: DataRate::Hz100, range: Range::G8, ..Default::default() }).await?;
//!
//! // Read acceleration in g
//! let v = accel.read_all().await?;
//! # Ok(())
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};
use micromath::vector::Vector3d;

use super::{defs::*, rw::set_bit, Axis, DataRate, Error, Lis3dh};

impl<I, D, W, E> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Set the full-scale range (`CTRL_REG4.FS`, bits 5..4).
  pub async fn set_range(&mut self, range: Range) -> Result<(), Error<E>> {
    self.modify(Reg::Ctrl4, CTRL4_FS_MASK, u8::from(range) << CTRL4_FS_SHIFT).await
  }

  /// Set the range from a raw 2-bit code; anything above 3 fails without I/O.
  pub async fn set_range_code(&mut self, code: u8) -> Result<(), Error<E>> {
    let range = Range::try_from(code).map_err(|_| Error::InvalidArgument)?;
    self.set_range(range).await
  }

  pub async fn get_range(&mut self) -> Result<Range, Error<E>> {
    let val = self.read_u8(Reg::Ctrl4).await?;
    Ok(Range::from_field(val))
  }

  /// Set the output data rate (`CTRL_REG1.ODR`, bits 7..4).
  pub async fn set_data_rate(&mut self, rate: DataRate) -> Result<(), Error<E>> {
    self.modify(Reg::Ctrl1, CTRL1_ODR_MASK, u8::from(rate) << CTRL1_ODR_SHIFT).await
  }

  /// Set the data rate from a raw 4-bit code; undefined codes fail without I/O.
  pub async fn set_data_rate_code(&mut self, code: u8) -> Result<(), Error<E>> {
    let rate = DataRate::try_from(code).map_err(|_| Error::InvalidArgument)?;
    self.set_data_rate(rate).await
  }

  /// Read back the output data rate. Codes 10..15 are undefined and fail with
  /// [`Error::Data`].
  pub async fn get_data_rate(&mut self) -> Result<DataRate, Error<E>> {
    let val = self.read_u8(Reg::Ctrl1).await?;
    DataRate::try_from((val & CTRL1_ODR_MASK) >> CTRL1_ODR_SHIFT).map_err(|_| Error::Data)
  }

  /// Enable or disable one axis (`CTRL_REG1`, bits 0..2).
  pub async fn set_axis_status(&mut self, axis: Axis, enabled: bool) -> Result<(), Error<E>> {
    self.modify_bit(Reg::Ctrl1, axis.enable_bit(), enabled).await
  }

  pub async fn get_axis_status(&mut self, axis: Axis) -> Result<bool, Error<E>> {
    let val = self.read_u8(Reg::Ctrl1).await?;
    Ok(val & (1 << axis.enable_bit()) != 0)
  }

  /// Low-power mode (`CTRL_REG1.LPen`). 8-bit output, required for the
  /// 1.6 kHz and 5.376 kHz rates.
  pub async fn set_low_power(&mut self, enabled: bool) -> Result<(), Error<E>> {
    self.modify_bit(Reg::Ctrl1, CTRL1_LPEN_BIT, enabled).await
  }

  /// High-resolution (12-bit) output (`CTRL_REG4.HR`).
  pub async fn set_high_resolution(&mut self, enabled: bool) -> Result<(), Error<E>> {
    self.modify_bit(Reg::Ctrl4, CTRL4_HR_BIT, enabled).await
  }

  /// Block data update (`CTRL_REG4.BDU`): output registers are not refreshed
  /// until both the low and the high byte have been read.
  pub async fn set_block_data_update(&mut self, enabled: bool) -> Result<(), Error<E>> {
    self.modify_bit(Reg::Ctrl4, CTRL4_BDU_BIT, enabled).await
  }

  /// Apply a complete configuration: axes, data rate, power mode, resolution,
  /// block data update and range, each as a read-modify-write.
  pub async fn configure(&mut self, cfg: DeviceConfig) -> Result<(), Error<E>> {
    self.modify(Reg::Ctrl1, EnabledAxes::ALL.to_bits(), cfg.axes.to_bits()).await?;
    self.set_data_rate(cfg.data_rate).await?;
    self.set_low_power(cfg.low_power).await?;
    self.set_high_resolution(cfg.high_resolution).await?;
    self.set_block_data_update(cfg.block_data_update).await?;
    self.set_range(cfg.range).await
  }

  /// Read the configuration currently held by the device.
  pub async fn get_config(&mut self) -> Result<DeviceConfig, Error<E>> {
    let ctrl1 = self.read_u8(Reg::Ctrl1).await?;
    let ctrl4 = self.read_u8(Reg::Ctrl4).await?;
    Ok(DeviceConfig {
      range: Range::from_field(ctrl4),
      data_rate: DataRate::try_from((ctrl1 & CTRL1_ODR_MASK) >> CTRL1_ODR_SHIFT).map_err(|_| Error::Data)?,
      low_power: ctrl1 & (1 << CTRL1_LPEN_BIT) != 0,
      high_resolution: ctrl4 & (1 << CTRL4_HR_BIT) != 0,
      block_data_update: ctrl4 & (1 << CTRL4_BDU_BIT) != 0,
      axes: EnabledAxes::from_bits(ctrl1),
    })
  }

  /// Read the raw 16-bit output of one axis.
  ///
  /// The low byte is read first, then the high byte; with block data update
  /// on this pairs both halves of the same sample.
  pub async fn read_raw_axis(&mut self, axis: Axis) -> Result<i16, Error<E>> {
    let low = self.read_u8(axis.out_low()).await?;
    let high = self.read_u8(axis.out_high()).await?;
    Ok(decode_raw(low, high))
  }

  /// Read one axis in g, scaled by the range configured right now.
  pub async fn read_axis(&mut self, axis: Axis) -> Result<f32, Error<E>> {
    let raw = self.read_raw_axis(axis).await?;
    let range = self.get_range().await?;
    Ok(range.scale(raw))
  }

  pub async fn read_x(&mut self) -> Result<f32, Error<E>> {
    self.read_axis(Axis::X).await
  }

  pub async fn read_y(&mut self) -> Result<f32, Error<E>> {
    self.read_axis(Axis::Y).await
  }

  pub async fn read_z(&mut self) -> Result<f32, Error<E>> {
    self.read_axis(Axis::Z).await
  }

  /// Read X, Y and Z in g.
  pub async fn read_all(&mut self) -> Result<Vector3d<f32>, Error<E>> {
    Ok(Vector3d { x: self.read_x().await?, y: self.read_y().await?, z: self.read_z().await? })
  }
}

/// Combine the output byte pair into a two's-complement sample.
#[inline]
pub const fn decode_raw(low: u8, high: u8) -> i16 {
  let value = low as u16 | (high as u16) << 8;
  if value & 0x8000 != 0 {
    (value as i32 - 0x1_0000) as i16
  } else {
    value as i16
  }
}

/// Split a sample into its `(low, high)` output bytes.
#[inline]
pub const fn encode_raw(value: i16) -> (u8, u8) {
  let v = value as u16;
  ((v & 0xFF) as u8, (v >> 8) as u8)
}

/// Accelerometer measurement range.
///
/// Wider ranges measure stronger accelerations at lower resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Range {
  /// ±2g range
  G2 = 0b00,
  /// ±4g range
  G4 = 0b01,
  /// ±8g range
  G8 = 0b10,
  /// ±16g range
  G16 = 0b11,
}

impl Range {
  /// Raw counts per g in this range.
  pub fn divisor(self) -> f32 {
    match self {
      Range::G2 => 16380.,
      Range::G4 => 8190.,
      Range::G8 => 4096.,
      Range::G16 => 1365.33,
    }
  }

  /// Convert a raw sample to g.
  pub fn scale(self, raw: i16) -> f32 {
    raw as f32 / self.divisor()
  }

  /// Decode the FS field out of a full `CTRL_REG4` value.
  pub(crate) fn from_field(ctrl4: u8) -> Self {
    match (ctrl4 & CTRL4_FS_MASK) >> CTRL4_FS_SHIFT {
      0b00 => Range::G2,
      0b01 => Range::G4,
      0b10 => Range::G8,
      _ => Range::G16,
    }
  }
}

impl From<Range> for u8 {
  fn from(value: Range) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for Range {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0b00 => Ok(Range::G2),
      0b01 => Ok(Range::G4),
      0b10 => Ok(Range::G8),
      0b11 => Ok(Range::G16),
      _ => Err(()),
    }
  }
}

/// Per-axis enable flags (`CTRL_REG1`, bits 0..2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EnabledAxes {
  pub x: bool,
  pub y: bool,
  pub z: bool,
}

impl EnabledAxes {
  pub const ALL: EnabledAxes = EnabledAxes { x: true, y: true, z: true };

  pub fn get(&self, axis: Axis) -> bool {
    match axis {
      Axis::X => self.x,
      Axis::Y => self.y,
      Axis::Z => self.z,
    }
  }

  pub(crate) fn from_bits(ctrl1: u8) -> Self {
    EnabledAxes {
      x: ctrl1 & (1 << Axis::X.enable_bit()) != 0,
      y: ctrl1 & (1 << Axis::Y.enable_bit()) != 0,
      z: ctrl1 & (1 << Axis::Z.enable_bit()) != 0,
    }
  }

  pub(crate) fn to_bits(self) -> u8 {
    Axis::ALL.iter().fold(0, |acc, a| set_bit(acc, a.enable_bit(), self.get(*a)))
  }
}

impl Default for EnabledAxes {
  fn default() -> Self {
    EnabledAxes::ALL
  }
}

/// Device measurement configuration.
///
/// The default is what [`Lis3dh::initialize`] applies: all axes, 400 Hz,
/// high resolution, block data update and ±2 g.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceConfig {
  pub range: Range,
  pub data_rate: DataRate,
  /// 8-bit low-power output; mutually exclusive with `high_resolution`.
  pub low_power: bool,
  pub high_resolution: bool,
  pub block_data_update: bool,
  pub axes: EnabledAxes,
}

impl Default for DeviceConfig {
  fn default() -> Self {
    DeviceConfig {
      range: Range::G2,
      data_rate: DataRate::Hz400,
      low_power: false,
      high_resolution: true,
      block_data_update: true,
      axes: EnabledAxes::ALL,
    }
  }
}
