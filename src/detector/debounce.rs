//! Debounce and notify bookkeeping shared by polled inputs.

/// Two-state debouncer with a one-shot "held long enough" latch.
///
/// `update` reports transitions only. `check_steady` fires at most once per
/// active episode, after the state has been held for the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debounce {
  active: bool,
  since_ms: Option<u64>,
  steady_sent: bool,
}

impl Debounce {
  pub const fn new() -> Self {
    Self { active: false, since_ms: None, steady_sent: false }
  }

  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Timestamp of the last transition, if any.
  pub fn last_transition_ms(&self) -> Option<u64> {
    self.since_ms
  }

  /// Feed one sample. Returns the new state on a transition.
  pub fn update(&mut self, active: bool, now_ms: u64) -> Option<bool> {
    if active == self.active {
      return None;
    }
    self.active = active;
    self.since_ms = Some(now_ms);
    self.steady_sent = false;
    Some(active)
  }

  /// Returns the held time once the active state has lasted `threshold_ms`.
  pub fn check_steady(&mut self, threshold_ms: u64, now_ms: u64) -> Option<u64> {
    if !self.active || self.steady_sent {
      return None;
    }
    let held = now_ms.saturating_sub(self.since_ms?);
    if held < threshold_ms {
      return None;
    }
    self.steady_sent = true;
    Some(held)
  }

  pub fn reset(&mut self) {
    *self = Self::new();
  }
}
