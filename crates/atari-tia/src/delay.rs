//! Single-slot delayed events.
//!
//! Many TIA register writes take effect a fixed number of colour clocks
//! after the write. Each such register owns one pre-allocated event slot;
//! the slot is scheduled by the write and resolved during the per-clock
//! tick. At most one event can be pending per slot — scheduling over an
//! unresolved event is a programming bug in the emulator, not something a
//! ROM can cause, so it panics.

/// A delayed event carrying a payload of type `T`.
#[derive(Debug, Clone)]
pub struct Event<T> {
    label: &'static str,
    remaining: u8,
    payload: Option<T>,
}

impl<T> Event<T> {
    #[must_use]
    pub const fn new(label: &'static str) -> Self {
        Self {
            label,
            remaining: 0,
            payload: None,
        }
    }

    /// Schedule the event to fire after `delay` ticks. The event fires on
    /// the tick that follows the delay, so a delay of 0 fires on the next
    /// call to `tick()`.
    ///
    /// # Panics
    ///
    /// Panics if the previous event in this slot has not resolved yet.
    pub fn schedule(&mut self, delay: u8, payload: T) {
        assert!(
            self.payload.is_none(),
            "scheduling {} before previous event resolved",
            self.label
        );
        self.remaining = delay + 1;
        self.payload = Some(payload);
    }

    /// True while an event is pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining > 0
    }

    /// Number of ticks until the pending event fires (0 when idle).
    #[must_use]
    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    /// Advance the slot one tick. Returns the payload on the tick the event
    /// fires, `None` otherwise.
    pub fn tick(&mut self) -> Option<T> {
        match self.remaining {
            0 => None,
            1 => {
                self.remaining = 0;
                self.payload.take()
            }
            _ => {
                self.remaining -= 1;
                None
            }
        }
    }

    /// Drop any pending event.
    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.payload = None;
    }
}
