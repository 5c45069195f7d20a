//! State shared by the five movable video elements.
//!
//! Each element owns a quarter-rate phase clock and a position polycounter.
//! The counter wraps every 40 counts (160 colour clocks); the wrap, or a
//! trigger-list match derived from NUSIZ, starts the element's graphics
//! scan. HMOVE delivers extra "stuffed" clocks by comparing the element's
//! 4-bit HM register against the TIA's ripple counter.

use crate::delay::Event;
use crate::phaseclock::PhaseClock;
use crate::polycounter::{Polycounter, RESET_SPRITE};

/// Position counter, phase clock and horizontal-motion state for one
/// movable element.
#[derive(Debug, Clone)]
pub(crate) struct SpriteCore {
    pclk: PhaseClock,
    position: Polycounter,

    /// Visible pixel at which the last position reset landed. Kept for the
    /// deferred draw-start rule and adjusted by RSYNC.
    pub(crate) reset_pixel: u8,

    /// Pending RESxx strobe.
    pub(crate) future_reset: Event<()>,

    /// HM register: high nibble of the last HMxx write.
    pub(crate) hm: u8,
}

impl SpriteCore {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            pclk: PhaseClock::new(),
            position: Polycounter::new(RESET_SPRITE),
            reset_pixel: 0,
            future_reset: Event::new(label),
            hm: 0,
        }
    }

    /// One motion clock. Returns true when the position counter fires a
    /// start-drawing trigger: the natural wrap or a NUSIZ trigger-list
    /// match.
    pub(crate) fn tick_position(&mut self, trigger_list: &[u8]) -> bool {
        self.pclk.tick();
        if !self.pclk.phi2() {
            return false;
        }
        if self.position.tick() {
            return true;
        }
        trigger_list.contains(&self.position.count())
    }

    /// Resolve a position reset at the given visible pixel.
    pub(crate) fn reset_position(&mut self, pixel: u8) {
        self.position.reset();
        self.pclk.reset();
        self.reset_pixel = pixel;
    }

    /// Copy position from another element (missile-to-player lock release).
    pub(crate) fn copy_position(&mut self, other: &SpriteCore) {
        self.pclk = other.pclk;
        self.position = other.position;
        self.reset_pixel = other.reset_pixel;
    }

    /// Does this element receive a stuffed clock at this ripple-counter
    /// value? The counter runs 15 down to 0; the element is clocked while
    /// the count has not yet passed its HM value. The nibble XOR folds the
    /// signed -8..+7 register range onto the 0..15 counter range.
    pub(crate) fn wants_stuff(&self, hmove_ct: u8) -> bool {
        hmove_ct != 0xFF && u16::from(hmove_ct) + u16::from(self.hm ^ 0x08) >= 16
    }

    /// Adjust pixel bookkeeping after an RSYNC-induced scanline restart.
    pub(crate) fn rsync_adjust(&mut self, adj: u8) {
        self.reset_pixel = (self.reset_pixel.wrapping_add(adj)) % 160;
    }
}

/// Trigger list for the NUSIZ copy modes: the position-counter counts (in
/// addition to the wrap at 0) that start a new copy of the sprite. One
/// count is four colour clocks, so close/medium/wide spacing is 16/32/64
/// pixels.
pub(crate) fn trigger_list(nusiz_mode: u8) -> &'static [u8] {
    match nusiz_mode & 0x07 {
        0x01 => &[4],
        0x02 => &[8],
        0x03 => &[4, 8],
        0x04 => &[16],
        0x06 => &[8, 16],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_triggers_once_per_160_clocks() {
        let mut core = SpriteCore::new("test");
        let mut triggers = 0;
        for _ in 0..320 {
            if core.tick_position(&[]) {
                triggers += 1;
            }
        }
        assert_eq!(triggers, 2);
    }

    #[test]
    fn trigger_list_two_copies_close() {
        let mut core = SpriteCore::new("test");
        core.reset_position(0);
        let mut triggers = Vec::new();
        for clock in 1..=160 {
            if core.tick_position(trigger_list(0x01)) {
                triggers.push(clock);
            }
        }
        // one copy from the trigger list (count 4), one from the wrap
        assert_eq!(triggers.len(), 2);
    }

    #[test]
    fn hmove_stuff_counts() {
        let stuffed = |hm: u8| -> u8 {
            let core = SpriteCore {
                hm,
                ..SpriteCore::new("test")
            };
            (0..=15u8)
                .rev()
                .filter(|&ct| core.wants_stuff(ct))
                .count() as u8
        };
        assert_eq!(stuffed(0x0), 8); // no movement: balances HBLANK stretch
        assert_eq!(stuffed(0x7), 15); // +7: furthest left
        assert_eq!(stuffed(0x8), 0); // -8: furthest right
    }

    #[test]
    fn no_stuff_when_counter_inactive() {
        let core = SpriteCore::new("test");
        assert!(!core.wants_stuff(0xFF));
    }
}
