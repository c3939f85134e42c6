//! Test doubles: register-file bus, manual clock and delays.

use std::{cell::RefCell, rc::Rc, vec::Vec};

use embedded_hal_async::{
  delay::DelayNs,
  i2c::{ErrorKind, ErrorType, I2c, Operation, SevenBitAddress},
};

use crate::{clock::Clock, Axis};

struct BusState {
  regs: [u8; 0x40],
  pointer: u8,
  transactions: usize,
  fail_at: Option<usize>,
  reads: Vec<u8>,
}

/// In-memory LIS3DH register file behind the async I2C trait.
///
/// Clones share state, so a test can keep a handle after moving the bus
/// into the driver. Reading `INT1_SRC` clears the INT1 and click latches.
#[derive(Clone)]
pub(crate) struct FakeBus {
  state: Rc<RefCell<BusState>>,
}

impl FakeBus {
  pub(crate) fn new() -> Self {
    let mut regs = [0u8; 0x40];
    regs[0x0F] = 0x33;
    let state = BusState { regs, pointer: 0, transactions: 0, fail_at: None, reads: Vec::new() };
    Self { state: Rc::new(RefCell::new(state)) }
  }

  pub(crate) fn reg(&self, addr: u8) -> u8 {
    self.state.borrow().regs[addr as usize]
  }

  pub(crate) fn set_reg(&self, addr: u8, value: u8) {
    self.state.borrow_mut().regs[addr as usize] = value;
  }

  pub(crate) fn set_raw(&self, axis: Axis, raw: i16) {
    let [low, high] = raw.to_le_bytes();
    let base = 0x28 + 2 * axis as u8;
    self.set_reg(base, low);
    self.set_reg(base + 1, high);
  }

  /// Store a reading in g, encoded for the ±2 g range.
  pub(crate) fn set_g(&self, x: f32, y: f32, z: f32) {
    for (axis, g) in [(Axis::X, x), (Axis::Y, y), (Axis::Z, z)] {
      self.set_raw(axis, (g * 16380.0) as i16);
    }
  }

  /// Every transaction after the next `n` fails.
  pub(crate) fn fail_after(&self, n: usize) {
    let mut st = self.state.borrow_mut();
    st.fail_at = Some(st.transactions + n);
  }

  pub(crate) fn heal(&self) {
    self.state.borrow_mut().fail_at = None;
  }

  pub(crate) fn transactions(&self) -> usize {
    self.state.borrow().transactions
  }

  /// Addresses read so far, in order.
  pub(crate) fn reads(&self) -> Vec<u8> {
    self.state.borrow().reads.clone()
  }
}

impl ErrorType for FakeBus {
  type Error = ErrorKind;
}

impl I2c<SevenBitAddress> for FakeBus {
  async fn transaction(&mut self, _address: u8, operations: &mut [Operation<'_>]) -> Result<(), Self::Error> {
    let mut st = self.state.borrow_mut();
    if st.fail_at.is_some_and(|n| st.transactions >= n) {
      return Err(ErrorKind::Other);
    }
    st.transactions += 1;

    for op in operations.iter_mut() {
      match op {
        Operation::Write(bytes) => {
          let Some((first, rest)) = bytes.split_first() else { continue };
          st.pointer = *first;
          for b in rest {
            let p = st.pointer as usize;
            st.regs[p] = *b;
            st.pointer += 1;
          }
        }
        Operation::Read(buf) => {
          for slot in buf.iter_mut() {
            let p = st.pointer;
            *slot = st.regs[p as usize];
            st.reads.push(p);
            if p == 0x31 {
              st.regs[0x31] = 0;
              st.regs[0x39] = 0;
            }
            st.pointer += 1;
          }
        }
      }
    }
    Ok(())
  }
}

/// Delay that returns immediately.
pub(crate) struct NoDelay;

impl DelayNs for NoDelay {
  async fn delay_ns(&mut self, _ns: u32) {}
}

/// Hand-driven clock; clones share the same time.
#[derive(Clone, Default)]
pub(crate) struct ManualClock {
  now_ns: Rc<RefCell<u64>>,
}

impl ManualClock {
  pub(crate) fn new() -> Self {
    Self::default()
  }

  pub(crate) fn advance_ms(&self, ms: u64) {
    *self.now_ns.borrow_mut() += ms * 1_000_000;
  }

  pub(crate) fn set_ms(&self, ms: u64) {
    *self.now_ns.borrow_mut() = ms * 1_000_000;
  }

  /// A delay that moves this clock forward instead of sleeping.
  pub(crate) fn delay(&self) -> ClockDelay {
    ClockDelay { clock: self.clone() }
  }
}

impl Clock for ManualClock {
  fn now_ms(&self) -> u64 {
    *self.now_ns.borrow() / 1_000_000
  }
}

pub(crate) struct ClockDelay {
  clock: ManualClock,
}

impl DelayNs for ClockDelay {
  async fn delay_ns(&mut self, ns: u32) {
    *self.clock.now_ns.borrow_mut() += ns as u64;
  }

  async fn delay_us(&mut self, us: u32) {
    *self.clock.now_ns.borrow_mut() += us as u64 * 1_000;
  }

  async fn delay_ms(&mut self, ms: u32) {
    self.clock.advance_ms(ms as u64);
  }
}

/// INT1 line for tests.
pub(crate) type PinMock = embedded_hal_mock::eh1::digital::Mock;

/// Build a driver the same way with or without the `events` feature.
#[cfg(not(feature = "events"))]
pub(crate) fn new_driver<I: I2c<SevenBitAddress>, D: DelayNs>(i2c: I, delay: D) -> crate::Lis3dh<I, D, PinMock> {
  crate::Lis3dh::new(i2c, delay)
}

/// Build a driver the same way with or without the `events` feature. The
/// INT1 mock expects no activity.
#[cfg(feature = "events")]
pub(crate) fn new_driver<I: I2c<SevenBitAddress>, D: DelayNs>(i2c: I, delay: D) -> crate::Lis3dh<I, D, PinMock> {
  let pin = PinMock::new(&[]);
  pin.clone().done();
  new_driver_with_pin(i2c, delay, pin)
}

#[cfg(feature = "events")]
pub(crate) fn new_driver_with_pin<I: I2c<SevenBitAddress>, D: DelayNs>(
  i2c: I,
  delay: D,
  pin: PinMock,
) -> crate::Lis3dh<I, D, PinMock> {
  crate::Lis3dh::new(i2c, delay, pin)
}
