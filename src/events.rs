use embedded_hal_async::{delay::DelayNs, digital, i2c::*};

use super::{click::ClickSource, Error, Lis3dh};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
  SingleClick(ClickSource),
  DoubleClick(ClickSource),
}

impl<I, D, W, E> Lis3dh<I, D, W>
where
  I: I2c<SevenBitAddress, Error = E>,
  D: DelayNs,
  W: digital::Wait,
{
  /// Wait for the next click event on INT1.
  ///
  /// Requires click detection to be configured (see
  /// [`Lis3dh::configure_click`]). Each rising edge is answered with a
  /// click-source read, which also clears the INT1 latch.
  pub async fn wait_event(&mut self) -> Result<Event, Error<E>> {
    loop {
      if let Some(evt) = self.dequeue.pop_front() {
        return Ok(evt);
      }

      self.int_pin.wait_for_rising_edge().await.map_err(|_| Error::Data)?;
      self.push_click_events().await?;
    }
  }

  /// Read and decode the click source and append events to the queue.
  async fn push_click_events(&mut self) -> Result<(), Error<E>> {
    let src = self.read_click_source().await?;
    if src.single {
      self.push_event(Event::SingleClick(src));
    }
    if src.double {
      self.push_event(Event::DoubleClick(src));
    }
    Ok(())
  }

  #[inline]
  fn push_event(&mut self, e: Event) {
    if self.dequeue.is_full() {
      let _ = self.dequeue.pop_front();
    }
    let _ = self.dequeue.push_back(e);
  }
}

#[cfg(test)]
mod tests {
  use embassy_futures::block_on;
  use embedded_hal_mock::eh1::digital::{Edge, Transaction as PinTrans};

  use super::*;
  use crate::testing::{new_driver_with_pin, FakeBus, NoDelay, PinMock};

  #[test]
  fn edge_yields_decoded_click() {
    let bus = FakeBus::new();
    bus.set_reg(0x39, 0b0101_0010);
    let mut pin = PinMock::new(&[PinTrans::wait_for_edge(Edge::Rising)]);
    let mut dev = new_driver_with_pin(bus.clone(), NoDelay, pin.clone());

    let evt = block_on(dev.wait_event()).unwrap();
    match evt {
      Event::SingleClick(src) => assert!(src.y),
      other => panic!("unexpected {other:?}"),
    }
    assert_eq!(bus.reads(), vec![0x39, 0x31]);
    pin.done();
  }

  #[test]
  fn both_bits_queue_two_events() {
    let bus = FakeBus::new();
    bus.set_reg(0x39, 0b0111_0001);
    // one edge serves both events
    let mut pin = PinMock::new(&[PinTrans::wait_for_edge(Edge::Rising)]);
    let mut dev = new_driver_with_pin(bus, NoDelay, pin.clone());

    assert!(matches!(block_on(dev.wait_event()), Ok(Event::SingleClick(_))));
    assert!(matches!(block_on(dev.wait_event()), Ok(Event::DoubleClick(_))));
    pin.done();
  }
}
