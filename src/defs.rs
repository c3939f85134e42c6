#![allow(dead_code)]

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reg {
  StatusAux = 0x07,
  OutAdc1L = 0x08,
  OutAdc1H = 0x09,
  OutAdc2L = 0x0A,
  OutAdc2H = 0x0B,
  OutAdc3L = 0x0C,
  OutAdc3H = 0x0D,
  IntCounter = 0x0E,
  WhoAmI = 0x0F,
  TempCfg = 0x1F,
  Ctrl1 = 0x20,
  Ctrl2 = 0x21,
  Ctrl3 = 0x22,
  Ctrl4 = 0x23,
  Ctrl5 = 0x24,
  Ctrl6 = 0x25,
  Reference = 0x26,
  Status = 0x27,
  OutXL = 0x28,
  OutXH = 0x29,
  OutYL = 0x2A,
  OutYH = 0x2B,
  OutZL = 0x2C,
  OutZH = 0x2D,
  FifoCtrl = 0x2E,
  FifoSrc = 0x2F,
  Int1Cfg = 0x30,
  Int1Src = 0x31,
  Int1Ths = 0x32,
  Int1Duration = 0x33,
  ClickCfg = 0x38,
  ClickSrc = 0x39,
  ClickThs = 0x3A,
  TimeLimit = 0x3B,
  TimeLatency = 0x3C,
  TimeWindow = 0x3D,
}

impl From<Reg> for u8 {
  #[inline]
  fn from(r: Reg) -> Self {
    r as u8
  }
}

// Constants used across the crate
pub(crate) const LIS3DH_DEVICE_ID: u8 = 0x33;
pub(crate) const BOOT_DELAY_MS: u32 = 5; // turn-on time per datasheet
pub(crate) const DATA_READY_RETRIES: u8 = 20;

// CTRL_REG1
pub(crate) const CTRL1_LPEN_BIT: u8 = 3;
pub(crate) const CTRL1_ODR_SHIFT: u8 = 4;
pub(crate) const CTRL1_ODR_MASK: u8 = 0b1111_0000;

// CTRL_REG3
pub(crate) const CTRL3_I1_CLICK_BIT: u8 = 7;

// CTRL_REG4
pub(crate) const CTRL4_HR_BIT: u8 = 3;
pub(crate) const CTRL4_FS_SHIFT: u8 = 4;
pub(crate) const CTRL4_FS_MASK: u8 = 0b0011_0000;
pub(crate) const CTRL4_BDU_BIT: u8 = 7;

// CTRL_REG5
pub(crate) const CTRL5_LIR_INT1_BIT: u8 = 3;

// CLICK_THS / TIME_LIMIT carry 7 significant bits
pub(crate) const CLICK_7BIT_MAX: u8 = 0x7F;

/// First and last register address covered by [`crate::Lis3dh::dump_registers`].
pub(crate) const DUMP_FIRST: u8 = 0x00;
pub(crate) const DUMP_LAST: u8 = 0x3D;
