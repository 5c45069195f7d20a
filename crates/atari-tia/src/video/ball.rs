//! The ball.
//!
//! The ball is a single enable bit, 1-8 colour clocks wide (CTRLPF bits
//! 4-5), drawn in the playfield colour. Unlike the players and missiles it
//! starts drawing the moment its position reset resolves, which is why
//! RESBL repositions it visibly mid-line. The enable bit has a
//! vertical-delay latch refreshed by writes to GRP1.

use crate::delay::Event;

use super::sprite::SpriteCore;

#[derive(Debug, Clone)]
pub struct Ball {
    pub(crate) core: SpriteCore,

    /// ENABL as written.
    pub(crate) enabled_a: bool,
    /// Vertical-delay latch, refreshed by writes to GRP1.
    pub(crate) enabled_b: bool,
    pub(crate) vertical_delay: bool,
    /// Width in colour clocks: 1, 2, 4 or 8 (CTRLPF bits 4-5).
    pub(crate) width: u8,

    pub(crate) future_vdel: Event<bool>,

    scan_count: u8,
    scan_active: bool,
}

impl Ball {
    pub(crate) fn new(label: &'static str) -> Self {
        Self {
            core: SpriteCore::new(label),
            enabled_a: false,
            enabled_b: false,
            vertical_delay: false,
            width: 1,
            future_vdel: Event::new("ball vdel"),
            scan_count: 0,
            scan_active: false,
        }
    }

    pub(crate) fn tick_motion(&mut self) {
        if self.core.tick_position(&[]) {
            self.start_drawing();
        } else if self.scan_active {
            self.scan_count += 1;
            if self.scan_count > 8 {
                self.scan_active = false;
            }
        }
    }

    pub(crate) fn tick_events(&mut self, pixel: u8) {
        if self.core.future_reset.tick().is_some() {
            self.core.reset_position(pixel);
            // the ball draws from the reset point immediately
            self.start_drawing();
        }
        if let Some(v) = self.future_vdel.tick() {
            self.vertical_delay = v;
        }
    }

    fn start_drawing(&mut self) {
        self.scan_active = true;
        self.scan_count = 0;
    }

    fn enabled(&self) -> bool {
        if self.vertical_delay {
            self.enabled_b
        } else {
            self.enabled_a
        }
    }

    pub(crate) fn pixel(&self) -> bool {
        self.enabled() && self.scan_active && self.scan_count >= 1 && self.scan_count <= self.width
    }
}
