//! Player sprites.
//!
//! Players scan an 8-bit graphics register out one bit per colour clock,
//! starting when their position counter triggers. NUSIZ can stretch the
//! scan to double or quadruple width (by filtering the scan clock) or
//! repeat it up to three times per line (via the trigger list). Each player
//! has two graphics registers: the one written by GRPn and a vertical-delay
//! latch that is refreshed from the *other* player's register whenever the
//! other GRPn is written.

use crate::delay::Event;

use super::sprite::{trigger_list, SpriteCore};

#[derive(Debug, Clone)]
pub struct Player {
    pub(crate) core: SpriteCore,

    pub(crate) color: u8,
    /// NUSIZ bits 0-2: copy count / stretch mode.
    pub(crate) size: u8,
    pub(crate) reflected: bool,
    pub(crate) vertical_delay: bool,

    /// Graphics register as written by GRPn.
    pub(crate) gfx_a: u8,
    /// Vertical-delay latch, refreshed by writes to the other player's GRPn.
    pub(crate) gfx_b: u8,

    pub(crate) future_gfx: Event<u8>,
    pub(crate) future_vdel: Event<bool>,

    /// Graphics scan: 0 means "about to clock out the first bit". The first
    /// scan clock after a start is swallowed, so bits appear from count 1.
    scan_count: u8,
    scan_active: bool,
    /// Divides the scan clock for double/quad width.
    scan_filter: u8,
    /// Start-of-drawing held back because a position reset is in flight.
    defer_draw: bool,
}

impl Player {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            core: SpriteCore::new(label),
            color: 0,
            size: 0,
            reflected: false,
            vertical_delay: false,
            gfx_a: 0,
            gfx_b: 0,
            future_gfx: Event::new("player gfx"),
            future_vdel: Event::new("player vdel"),
            scan_count: 0,
            scan_active: false,
            scan_filter: 0,
            defer_draw: false,
        }
    }

    /// One motion clock (normal or stuffed).
    pub(crate) fn tick_motion(&mut self) {
        if self.core.tick_position(trigger_list(self.size)) {
            // a reset strobe that has not resolved yet wins over the
            // natural trigger; drawing starts when the reset fires
            if self.core.future_reset.is_active() {
                self.defer_draw = true;
            } else {
                self.start_drawing();
            }

            match self.size {
                0x05 => self.scan_filter = 1,
                0x07 => self.scan_filter = 3,
                _ => {}
            }
        } else {
            match self.size {
                0x05 => {
                    if self.scan_filter % 2 == 0 {
                        self.tick_scan();
                    }
                }
                0x07 => {
                    if self.scan_filter % 4 == 0 {
                        self.tick_scan();
                    }
                }
                _ => self.tick_scan(),
            }

            if !self.defer_draw {
                self.scan_filter = self.scan_filter.wrapping_add(1);
            }
        }
    }

    /// Resolve pending delayed events for this player. The cross-latch on
    /// GRPn writes is handled by the video unit, which owns both players.
    pub(crate) fn tick_events(&mut self, pixel: u8) {
        if self.core.future_reset.tick().is_some() {
            self.core.reset_position(pixel);
            if self.defer_draw {
                self.start_drawing();
                self.defer_draw = false;
            }
        }
        if let Some(v) = self.future_vdel.tick() {
            self.vertical_delay = v;
        }
    }

    fn start_drawing(&mut self) {
        self.scan_active = true;
        self.scan_count = 0;
    }

    fn tick_scan(&mut self) {
        if self.scan_active && !self.defer_draw {
            self.scan_count += 1;
            if self.scan_count > 8 {
                self.scan_active = false;
            }
        }
    }

    /// Pixel output. Returns `(drawing, colour)` — the colour is returned
    /// even when not drawing because score mode borrows it for the
    /// playfield.
    pub(crate) fn pixel(&self) -> (bool, u8) {
        let mut gfx = if self.vertical_delay {
            self.gfx_b
        } else {
            self.gfx_a
        };
        if self.reflected {
            gfx = gfx.reverse_bits();
        }

        // the first scan clock is swallowed: bits appear at counts 1-8
        if self.scan_active && self.scan_count > 0 {
            let bit = gfx >> (8 - self.scan_count) & 0x01;
            if bit == 0x01 {
                return (true, self.color);
            }
        }

        (false, self.color)
    }
}
