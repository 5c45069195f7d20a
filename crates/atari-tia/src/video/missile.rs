//! Missile sprites.
//!
//! A missile is a single enable bit scanned out over 1, 2, 4 or 8 colour
//! clocks (NUSIZ bits 4-5). It shares the player's copy trigger list and
//! colour. RESMP locks the missile to its player: while locked the missile
//! is hidden and tracks the player's position; releasing the lock copies
//! the player's position counter so the missile reappears at the player's
//! centre.

use super::sprite::{trigger_list, SpriteCore};

#[derive(Debug, Clone)]
pub struct Missile {
    pub(crate) core: SpriteCore,

    pub(crate) enabled: bool,
    /// Width in colour clocks: 1, 2, 4 or 8.
    pub(crate) width: u8,
    /// NUSIZ bits 0-2, shared with the player's copy modes.
    pub(crate) copies: u8,
    /// RESMP lock.
    pub(crate) reset_to_player: bool,

    scan_count: u8,
    scan_active: bool,
    defer_draw: bool,
}

impl Missile {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            core: SpriteCore::new(label),
            enabled: false,
            width: 1,
            copies: 0,
            reset_to_player: false,
            scan_count: 0,
            scan_active: false,
            defer_draw: false,
        }
    }

    pub(crate) fn tick_motion(&mut self) {
        if self.core.tick_position(trigger_list(self.copies)) {
            if self.core.future_reset.is_active() {
                self.defer_draw = true;
            } else {
                self.start_drawing();
            }
        } else if self.scan_active && !self.defer_draw {
            self.scan_count += 1;
            if self.scan_count > 8 {
                self.scan_active = false;
            }
        }
    }

    pub(crate) fn tick_events(&mut self, pixel: u8) {
        if self.core.future_reset.tick().is_some() {
            self.core.reset_position(pixel);
            if self.defer_draw {
                self.start_drawing();
                self.defer_draw = false;
            }
        }
    }

    fn start_drawing(&mut self) {
        self.scan_active = true;
        self.scan_count = 0;
    }

    pub(crate) fn pixel(&self) -> bool {
        self.enabled
            && !self.reset_to_player
            && self.scan_active
            && self.scan_count >= 1
            && self.scan_count <= self.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawn_count(missile: &mut Missile, clocks: u32) -> usize {
        let mut count = 0;
        for _ in 0..clocks {
            missile.tick_motion();
            if missile.pixel() {
                count += 1;
            }
        }
        count
    }

    #[test]
    fn width_controls_pixels_per_copy() {
        for (width, expected) in [(1u8, 1usize), (2, 2), (4, 4), (8, 8)] {
            let mut missile = Missile::new("missile 0");
            missile.enabled = true;
            missile.width = width;
            assert_eq!(drawn_count(&mut missile, 170), expected);
        }
    }

    #[test]
    fn disabled_missile_never_draws() {
        let mut missile = Missile::new("missile 0");
        missile.width = 8;
        assert_eq!(drawn_count(&mut missile, 400), 0);
    }

    #[test]
    fn resmp_hides_missile() {
        let mut missile = Missile::new("missile 0");
        missile.enabled = true;
        missile.width = 4;
        missile.reset_to_player = true;
        assert_eq!(drawn_count(&mut missile, 400), 0);
    }
}
