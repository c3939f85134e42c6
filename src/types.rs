/// 7-bit I2C address of the device.
///
/// The SA0 pad selects between the two addresses: low gives `0x18`,
/// high gives `0x19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(pub u8);

impl Address {
  /// SA0 low (breakout boards usually pull it down).
  pub const PRIMARY: Address = Address(0x18);
  /// SA0 high.
  pub const SECONDARY: Address = Address(0x19);
}

impl Default for Address {
  fn default() -> Self {
    Address::PRIMARY
  }
}

impl From<Address> for u8 {
  fn from(addr: Address) -> Self {
    addr.0
  }
}

impl From<u8> for Address {
  fn from(addr: u8) -> Self {
    Self(addr)
  }
}

/// Accelerometer axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
  X = 0x00,
  Y = 0x01,
  Z = 0x02,
}

impl Axis {
  pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

  /// Bit of the axis enable flag in `CTRL_REG1`.
  pub(crate) fn enable_bit(self) -> u8 {
    self as u8
  }

  /// Low byte of the axis output; the high byte follows at the next address.
  pub(crate) fn out_low(self) -> crate::defs::Reg {
    use crate::defs::Reg;
    match self {
      Axis::X => Reg::OutXL,
      Axis::Y => Reg::OutYL,
      Axis::Z => Reg::OutZL,
    }
  }

  pub(crate) fn out_high(self) -> crate::defs::Reg {
    use crate::defs::Reg;
    match self {
      Axis::X => Reg::OutXH,
      Axis::Y => Reg::OutYH,
      Axis::Z => Reg::OutZH,
    }
  }
}

impl From<Axis> for u8 {
  fn from(value: Axis) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for Axis {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x00 => Ok(Axis::X),
      0x01 => Ok(Axis::Y),
      0x02 => Ok(Axis::Z),
      _ => Err(()),
    }
  }
}

/// Output data rates (`CTRL_REG1.ODR`, bits 7..4).
///
/// The two top codes only reach their nominal rate with low-power mode
/// enabled (see [`crate::Lis3dh::set_low_power`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataRate {
  PowerDown = 0x0,
  Hz1 = 0x1,
  Hz10 = 0x2,
  Hz25 = 0x3,
  Hz50 = 0x4,
  Hz100 = 0x5,
  Hz200 = 0x6,
  Hz400 = 0x7,
  /// 1.6 kHz, low-power mode only.
  LowPower1k6 = 0x8,
  /// 1.344 kHz in normal mode, 5.376 kHz in low-power mode.
  Hz1k344LowPower5k376 = 0x9,
}

impl From<DataRate> for u8 {
  fn from(value: DataRate) -> Self {
    value as u8
  }
}

impl TryFrom<u8> for DataRate {
  type Error = ();

  fn try_from(value: u8) -> Result<Self, Self::Error> {
    match value {
      0x0 => Ok(DataRate::PowerDown),
      0x1 => Ok(DataRate::Hz1),
      0x2 => Ok(DataRate::Hz10),
      0x3 => Ok(DataRate::Hz25),
      0x4 => Ok(DataRate::Hz50),
      0x5 => Ok(DataRate::Hz100),
      0x6 => Ok(DataRate::Hz200),
      0x7 => Ok(DataRate::Hz400),
      0x8 => Ok(DataRate::LowPower1k6),
      0x9 => Ok(DataRate::Hz1k344LowPower5k376),
      _ => Err(()),
    }
  }
}
