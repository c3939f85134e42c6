use embedded_hal_async::{delay::DelayNs, i2c::*};

use crate::{defs::Reg, Error, Lis3dh};

/// Return `value` with bit `bit` forced to `on`.
///
/// The target bit is cleared first and then set conditionally, so the result
/// only depends on the inputs. `bit` is taken modulo 8.
#[inline]
pub const fn set_bit(value: u8, bit: u8, on: bool) -> u8 {
  let mask = 1u8 << (bit & 0x07);
  let cleared = value & !mask;
  if on {
    cleared | mask
  } else {
    cleared
  }
}

impl<I, D, W, E> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
{
  pub(crate) async fn read<const N: usize, T: TryFrom<[u8; N]>>(&mut self, reg: Reg) -> Result<T, Error<E>> {
    let mut b = [0u8; N];
    for (i, slot) in b.iter_mut().enumerate() {
      *slot = self.read_addr(u8::from(reg) + i as u8).await?;
    }
    TryFrom::try_from(b).map_err(|_| Error::Data)
  }

  pub(crate) async fn read_u8(&mut self, reg: Reg) -> Result<u8, Error<E>> {
    self.read_addr(reg.into()).await
  }

  /// Single-register read at a raw address.
  pub(crate) async fn read_addr(&mut self, addr: u8) -> Result<u8, Error<E>> {
    let mut b = [0u8; 1];
    self.i2c.write_read(self.address.into(), &[addr], &mut b).await.map_err(Error::I2c)?;
    Ok(b[0])
  }

  pub(crate) async fn write<const N: usize, T: TryInto<[u8; N]>>(&mut self, reg: Reg, v: T) -> Result<(), Error<E>> {
    let b = v.try_into().map_err(|_| Error::Data)?;
    for (i, value) in b.iter().enumerate() {
      self.write_addr(u8::from(reg) + i as u8, *value).await?;
    }
    Ok(())
  }

  pub(crate) async fn write_u8(&mut self, reg: Reg, value: u8) -> Result<(), Error<E>> {
    self.write_addr(reg.into(), value).await
  }

  async fn write_addr(&mut self, addr: u8, value: u8) -> Result<(), Error<E>> {
    #[cfg(feature = "defmt")]
    defmt::debug!("WRT {=u8:#b} to register {=u8:#x}", value, addr);
    self.i2c.write(self.address.into(), &[addr, value]).await.map_err(Error::I2c)
  }

  /// Read-modify-write: only the bits selected by `mask` are replaced by `bits`.
  pub(crate) async fn modify(&mut self, reg: Reg, mask: u8, bits: u8) -> Result<(), Error<E>> {
    let current = self.read_u8(reg).await?;
    self.write_u8(reg, (current & !mask) | (bits & mask)).await
  }

  /// Read-modify-write of a single bit.
  pub(crate) async fn modify_bit(&mut self, reg: Reg, bit: u8, on: bool) -> Result<(), Error<E>> {
    let current = self.read_u8(reg).await?;
    self.write_u8(reg, set_bit(current, bit, on)).await
  }
}
