#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]
//!
//! ## Design Principles
//!
//! - **Register-exact**: every control write is a read-modify-write of the
//!   field it owns, so bits the driver does not model are preserved
//! - **Async-first**: Built on `embedded-hal-async` I2C, delay and pin traits
//! - **Live scaling**: scaled reads query the configured range on every call
//! - **Testable detection**: the vibration detector takes its clock and
//!   sleep from the caller, so it runs without hardware or real time
//!
//! ## Module Organization
//!
//! - [`accel`]: Range, data rate, resolution and axis readings
//! - [`click`]: Single/double click detection
//! - [`meter`]: Exponentially decaying event-rate meter
//! - [`detector`]: Vibration detection on top of the driver
//! - [`clock`]: Time source abstraction
//!
//! ## Basic Usage
//!
//! ```no_run
//! # async fn example<I: embedded_hal_async::i2c::I2c, D: embedded_hal_async::delay::DelayNs>(i2c: I, delay: D) -> Result<(), lis3dh::Error<I::Error>> {
//! use lis3dh::{accel::Range, Lis3dh};
//!
//! let mut accel: Lis3dh<_, _> = Lis3dh::new(i2c, delay);
//!
//! // Verify the chip and apply the default configuration
//! accel.initialize().await?;
//!
//! accel.set_range(Range::G4).await?;
//! let z = accel.read_z().await?;
//! # Ok(())
//! # }
//! ```

use embedded_hal_async::{delay::DelayNs, i2c::*};

pub mod accel;
pub mod click;
pub mod clock;
mod defs;
pub mod detector;
#[cfg(feature = "events")]
mod events;
pub mod meter;
pub(crate) mod rw;
#[cfg(test)]
mod testing;
mod types;

use defs::*;
#[cfg(feature = "events")]
pub use events::*;
pub use rw::set_bit;
pub use types::*;

/// Number of registers returned by [`Lis3dh::dump_registers`].
pub const REGISTER_COUNT: usize = (DUMP_LAST - DUMP_FIRST) as usize + 1;

/// Driver error type.
///
/// This error type wraps the underlying I2C error and adds LIS3DH-specific
/// error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
  /// I2C communication error
  I2c(E),
  /// `WHO_AM_I` mismatch (expected 0x33); carries the byte that was read
  InvalidDeviceId(u8),
  /// Out-of-range code, axis or register value; nothing was written
  InvalidArgument,
  /// I2C error while the vibration detector was polling
  SensorRead(E),
  /// Register payload did not decode, or the interrupt line failed
  Data,
}

/// LIS3DH device driver instance.
///
/// Owns the I2C bus and delay provider. Nothing read from the device is
/// cached: every getter goes to the registers.
///
/// # Type Parameters
///
/// - `I`: I2C implementation (must implement `embedded_hal_async::i2c::I2c`)
/// - `D`: Delay provider (must implement `embedded_hal_async::delay::DelayNs`)
/// - `W`: INT1 pin implementation (only used with `events` feature)
pub struct Lis3dh<I, D: DelayNs, W = ()> {
  i2c: I,
  pub(crate) delay: D,
  address: Address,
  #[cfg(feature = "events")]
  dequeue: heapless::Deque<Event, 16>,
  #[cfg(feature = "events")]
  int_pin: W,
  #[cfg(not(feature = "events"))]
  _wait: core::marker::PhantomData<W>,
}

// Constructor(s)
#[cfg(feature = "events")]
impl<I, D, W> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress>,
  D: DelayNs,
  W: embedded_hal_async::digital::Wait,
{
  /// Create a new driver instance with click-interrupt event support.
  ///
  /// # Arguments
  ///
  /// - `i2c`: I2C bus implementation
  /// - `delay`: Delay provider for timing operations
  /// - `int_pin`: Pin wired to INT1 (requires `events` feature)
  pub fn new(i2c: I, delay: D, int_pin: W) -> Self {
    Self { i2c, delay, address: Address::default(), dequeue: heapless::Deque::new(), int_pin }
  }
}

#[cfg(not(feature = "events"))]
impl<I, D, W> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress>,
  D: DelayNs,
{
  /// Create a new driver instance at the default address (0x18).
  ///
  /// # Arguments
  ///
  /// - `i2c`: I2C bus implementation
  /// - `delay`: Delay provider for timing operations
  pub fn new(i2c: I, delay: D) -> Self {
    Self { i2c, delay, address: Address::default(), _wait: core::marker::PhantomData }
  }
}

// Common functionality (independent of `events`)
impl<I, D, W, E> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  /// Use a different 7-bit device address.
  pub fn with_address(mut self, address: Address) -> Self {
    self.address = address;
    self
  }

  pub fn address(&self) -> Address {
    self.address
  }

  /// Consume the driver and hand back the bus and delay.
  pub fn release(self) -> (I, D) {
    (self.i2c, self.delay)
  }

  /// Read the `WHO_AM_I` register (should be `0x33` for LIS3DH).
  pub async fn get_id(&mut self) -> Result<u8, Error<E>> {
    self.read_u8(Reg::WhoAmI).await
  }

  /// Verify the device and apply the default configuration.
  ///
  /// Sequence:
  /// - Check `WHO_AM_I`; a mismatch fails with [`Error::InvalidDeviceId`]
  ///   before anything is written.
  /// - Enable X, Y and Z.
  /// - 400 Hz output data rate.
  /// - High resolution and block data update on.
  /// - ±2 g range.
  ///
  /// A bus failure at any step is returned as [`Error::I2c`] and the device
  /// must be treated as unconfigured: none of the defaults above can be
  /// relied on until `initialize` succeeds.
  pub async fn initialize(&mut self) -> Result<(), Error<E>> {
    let id = self.get_id().await?;
    if id != LIS3DH_DEVICE_ID {
      #[cfg(feature = "defmt")]
      defmt::warn!("Device ID incorrect - expected {=u8:#x}, got {=u8:#x}", LIS3DH_DEVICE_ID, id);
      return Err(Error::InvalidDeviceId(id));
    }
    #[cfg(feature = "defmt")]
    defmt::debug!("Connected to LIS3DH at address {=u8:#x}", self.address.0);

    self.configure(accel::DeviceConfig::default()).await?;
    self.delay.delay_ms(BOOT_DELAY_MS).await;
    Ok(())
  }

  /// Read every register in `0x00..=0x3D`, index = address.
  ///
  /// Diagnostic only. Reading `INT1_SRC` as part of the dump clears a latched
  /// INT1 interrupt.
  pub async fn dump_registers(&mut self) -> Result<[u8; REGISTER_COUNT], Error<E>> {
    let mut out = [0u8; REGISTER_COUNT];
    for (i, slot) in out.iter_mut().enumerate() {
      let addr = DUMP_FIRST + i as u8;
      *slot = self.read_addr(addr).await?;
      #[cfg(feature = "defmt")]
      defmt::info!("{=u8:X}: {=u8:#b}", addr, *slot);
    }
    Ok(out)
  }

  /// Read `STATUS_REG` (data-available and overrun flags).
  pub async fn get_status(&mut self) -> Result<Status, Error<E>> {
    self.read(Reg::Status).await
  }

  /// Wait until a new X/Y/Z sample set is available.
  ///
  /// Gives up with [`Error::Data`] after 20 retries 2 ms apart.
  pub async fn wait_data_ready(&mut self) -> Result<(), Error<E>> {
    let mut retries = 0;
    while !self.get_status().await?.xyz_available {
      if retries >= DATA_READY_RETRIES {
        return Err(Error::Data);
      }
      self.delay.delay_ms(2).await;
      retries += 1;
    }

    Ok(())
  }

  /// Read `INT1_SRC`. Reading clears a latched INT1 interrupt.
  pub async fn read_int1_source(&mut self) -> Result<Int1Source, Error<E>> {
    self.read(Reg::Int1Src).await
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Status {
  pub x_available: bool,
  pub y_available: bool,
  pub z_available: bool,
  pub xyz_available: bool,
  pub x_overrun: bool,
  pub y_overrun: bool,
  pub z_overrun: bool,
  pub xyz_overrun: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[packbits::pack(bytes = 1)]
pub struct Int1Source {
  pub x_low: bool,
  pub x_high: bool,
  pub y_low: bool,
  pub y_high: bool,
  pub z_low: bool,
  pub z_high: bool,
  /// One or more interrupts have been generated.
  pub active: bool,
}
