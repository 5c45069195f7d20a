//! The TIA's video elements: two players, two missiles, the ball, the
//! playfield and the collision latches.
//!
//! The unit is driven by the TIA core once per colour clock. Motion clocks
//! reach the sprites in two ways: the normal clock, gated by HBLANK, and
//! the stuffed clock delivered while an HMOVE is in flight. Pixel
//! resolution applies the hardware priority rules and feeds the collision
//! latches.

mod ball;
mod collisions;
mod missile;
mod player;
mod playfield;
mod sprite;

pub use collisions::reg as collision_reg;

pub(crate) use ball::Ball;
pub(crate) use collisions::Collisions;
pub(crate) use missile::Missile;
pub(crate) use player::Player;
pub(crate) use playfield::Playfield;

/// The five sprites, the playfield and the collision latches.
#[derive(Debug, Clone)]
pub struct Video {
    pub(crate) player0: Player,
    pub(crate) player1: Player,
    pub(crate) missile0: Missile,
    pub(crate) missile1: Missile,
    pub(crate) ball: Ball,
    pub(crate) playfield: Playfield,
    pub(crate) collisions: Collisions,

    pub(crate) colupf: u8,
    pub(crate) colubk: u8,
}

impl Video {
    pub(crate) fn new() -> Self {
        Self {
            player0: Player::new("player 0"),
            player1: Player::new("player 1"),
            missile0: Missile::new("missile 0"),
            missile1: Missile::new("missile 1"),
            ball: Ball::new("ball"),
            playfield: Playfield::new(),
            collisions: Collisions::new(),
            colupf: 0,
            colubk: 0,
        }
    }

    /// Advance the video elements one colour clock.
    ///
    /// `visible` is the ungated motion clock (HBLANK off); `is_hmove` is
    /// true on the quarter-clock that carries stuffed ticks; `hmove_ct` is
    /// the ripple counter (0xFF when inactive); `pixel` is the current
    /// visible pixel, used to resolve position resets.
    pub(crate) fn tick(&mut self, visible: bool, is_hmove: bool, hmove_ct: u8, pixel: u8) {
        // resolve delayed events first: GRPn cross-latching needs both
        // players, so the gfx slots are handled here
        if let Some(v) = self.player0.future_gfx.tick() {
            self.player1.gfx_b = self.player1.gfx_a;
            self.player0.gfx_a = v;
        }
        if let Some(v) = self.player1.future_gfx.tick() {
            self.player0.gfx_b = self.player0.gfx_a;
            self.ball.enabled_b = self.ball.enabled_a;
            self.player1.gfx_a = v;
        }

        self.player0.tick_events(pixel);
        self.player1.tick_events(pixel);
        self.missile0.tick_events(pixel);
        self.missile1.tick_events(pixel);
        self.ball.tick_events(pixel);

        // stuffed clocks
        if is_hmove && hmove_ct != 0xFF {
            if self.player0.core.wants_stuff(hmove_ct) {
                self.player0.tick_motion();
            }
            if self.player1.core.wants_stuff(hmove_ct) {
                self.player1.tick_motion();
            }
            if self.missile0.core.wants_stuff(hmove_ct) {
                self.missile0.tick_motion();
            }
            if self.missile1.core.wants_stuff(hmove_ct) {
                self.missile1.tick_motion();
            }
            if self.ball.core.wants_stuff(hmove_ct) {
                self.ball.tick_motion();
            }
        }

        // normal motion clock
        if visible {
            self.player0.tick_motion();
            self.player1.tick_motion();
            self.missile0.tick_motion();
            self.missile1.tick_motion();
            self.ball.tick_motion();

            // a missile locked to its player tracks the player's position
            if self.missile0.reset_to_player {
                self.missile0.core.copy_position(&self.player0.core);
            }
            if self.missile1.reset_to_player {
                self.missile1.core.copy_position(&self.player1.core);
            }
        }
    }

    /// Resolve the colour under visible pixel `x` and latch collisions.
    pub(crate) fn pixel(&mut self, x: u8) -> u8 {
        let (p0, colup0) = self.player0.pixel();
        let (p1, colup1) = self.player1.pixel();
        let m0 = self.missile0.pixel();
        let m1 = self.missile1.pixel();
        let bl = self.ball.pixel();
        let pf = self.playfield.bit_at(x);

        self.collisions.update(p0, p1, m0, m1, bl, pf);

        let pf_color = if self.playfield.score_mode {
            if x < 80 {
                colup0
            } else {
                colup1
            }
        } else {
            self.colupf
        };

        if self.playfield.priority {
            if pf {
                return pf_color;
            }
            if bl {
                return self.colupf;
            }
            if p0 || m0 {
                return colup0;
            }
            if p1 || m1 {
                return colup1;
            }
        } else {
            if p0 || m0 {
                return colup0;
            }
            if p1 || m1 {
                return colup1;
            }
            if pf {
                return pf_color;
            }
            if bl {
                return self.colupf;
            }
        }

        self.colubk
    }

    /// Adjust sprite pixel bookkeeping after an RSYNC-induced scanline
    /// restart so positions stay coherent.
    pub(crate) fn rsync(&mut self, adj: u8) {
        self.player0.core.rsync_adjust(adj);
        self.player1.core.rsync_adjust(adj);
        self.missile0.core.rsync_adjust(adj);
        self.missile1.core.rsync_adjust(adj);
        self.ball.core.rsync_adjust(adj);
    }

    pub(crate) fn set_colup0(&mut self, value: u8) {
        self.player0.color = value;
    }

    pub(crate) fn set_colup1(&mut self, value: u8) {
        self.player1.color = value;
    }

    pub(crate) fn set_colupf(&mut self, value: u8) {
        self.colupf = value;
    }

    pub(crate) fn set_nusiz0(&mut self, value: u8) {
        self.player0.size = value & 0x07;
        self.missile0.copies = value & 0x07;
        self.missile0.width = 1 << ((value >> 4) & 0x03);
    }

    pub(crate) fn set_nusiz1(&mut self, value: u8) {
        self.player1.size = value & 0x07;
        self.missile1.copies = value & 0x07;
        self.missile1.width = 1 << ((value >> 4) & 0x03);
    }

    pub(crate) fn set_ctrlpf(&mut self, value: u8) {
        self.playfield.set_ctrlpf(value);
        self.ball.width = 1 << ((value >> 4) & 0x03);
    }

    pub(crate) fn set_resmp0(&mut self, value: u8) {
        let locked = value & 0x02 != 0;
        if self.missile0.reset_to_player && !locked {
            self.missile0.core.copy_position(&self.player0.core);
        }
        self.missile0.reset_to_player = locked;
    }

    pub(crate) fn set_resmp1(&mut self, value: u8) {
        let locked = value & 0x02 != 0;
        if self.missile1.reset_to_player && !locked {
            self.missile1.core.copy_position(&self.player1.core);
        }
        self.missile1.reset_to_player = locked;
    }

    pub(crate) fn set_colubk(&mut self, value: u8) {
        self.colubk = value;
    }

    pub(crate) fn set_pf0(&mut self, value: u8) {
        self.playfield.set_pf0(value);
    }

    pub(crate) fn set_pf1(&mut self, value: u8) {
        self.playfield.set_pf1(value);
    }

    pub(crate) fn set_pf2(&mut self, value: u8) {
        self.playfield.set_pf2(value);
    }

    pub(crate) fn set_refp0(&mut self, value: u8) {
        self.player0.reflected = value & 0x08 != 0;
    }

    pub(crate) fn set_refp1(&mut self, value: u8) {
        self.player1.reflected = value & 0x08 != 0;
    }

    pub(crate) fn set_enam0(&mut self, value: u8) {
        self.missile0.enabled = value & 0x02 != 0;
    }

    pub(crate) fn set_enam1(&mut self, value: u8) {
        self.missile1.enabled = value & 0x02 != 0;
    }

    pub(crate) fn set_enabl(&mut self, value: u8) {
        self.ball.enabled_a = value & 0x02 != 0;
    }

    pub(crate) fn set_hmp0(&mut self, value: u8) {
        self.player0.core.hm = value >> 4;
    }

    pub(crate) fn set_hmp1(&mut self, value: u8) {
        self.player1.core.hm = value >> 4;
    }

    pub(crate) fn set_hmm0(&mut self, value: u8) {
        self.missile0.core.hm = value >> 4;
    }

    pub(crate) fn set_hmm1(&mut self, value: u8) {
        self.missile1.core.hm = value >> 4;
    }

    pub(crate) fn set_hmbl(&mut self, value: u8) {
        self.ball.core.hm = value >> 4;
    }

    /// HMCLR: zero all five HM registers.
    pub(crate) fn clear_hmove(&mut self) {
        self.player0.core.hm = 0;
        self.player1.core.hm = 0;
        self.missile0.core.hm = 0;
        self.missile1.core.hm = 0;
        self.ball.core.hm = 0;
    }

    pub(crate) fn schedule_reset_p0(&mut self, delay: u8) {
        self.player0.core.future_reset.cancel();
        self.player0.core.future_reset.schedule(delay, ());
    }

    pub(crate) fn schedule_reset_p1(&mut self, delay: u8) {
        self.player1.core.future_reset.cancel();
        self.player1.core.future_reset.schedule(delay, ());
    }

    pub(crate) fn schedule_reset_m0(&mut self, delay: u8) {
        self.missile0.core.future_reset.cancel();
        self.missile0.core.future_reset.schedule(delay, ());
    }

    pub(crate) fn schedule_reset_m1(&mut self, delay: u8) {
        self.missile1.core.future_reset.cancel();
        self.missile1.core.future_reset.schedule(delay, ());
    }

    pub(crate) fn schedule_reset_bl(&mut self, delay: u8) {
        self.ball.core.future_reset.cancel();
        self.ball.core.future_reset.schedule(delay, ());
    }

    pub(crate) fn schedule_grp0(&mut self, value: u8) {
        self.player0.future_gfx.cancel();
        self.player0.future_gfx.schedule(1, value);
    }

    pub(crate) fn schedule_grp1(&mut self, value: u8) {
        self.player1.future_gfx.cancel();
        self.player1.future_gfx.schedule(1, value);
    }

    pub(crate) fn schedule_vdelp0(&mut self, value: u8) {
        self.player0.future_vdel.cancel();
        self.player0.future_vdel.schedule(1, value & 0x01 != 0);
    }

    pub(crate) fn schedule_vdelp1(&mut self, value: u8) {
        self.player1.future_vdel.cancel();
        self.player1.future_vdel.schedule(1, value & 0x01 != 0);
    }

    pub(crate) fn schedule_vdelbl(&mut self, value: u8) {
        self.ball.future_vdel.cancel();
        self.ball.future_vdel.schedule(1, value & 0x01 != 0);
    }

    pub(crate) fn clear_collisions(&mut self) {
        self.collisions.clear();
    }

    pub(crate) fn collisions_read(&self, reg: u16) -> u8 {
        self.collisions.read(reg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_line(video: &mut Video) -> Vec<u8> {
        let mut out = Vec::new();
        for x in 0..160u8 {
            video.tick(true, false, 0xFF, x);
            out.push(video.pixel(x));
        }
        out
    }

    #[test]
    fn background_when_nothing_draws() {
        let mut video = Video::new();
        video.colubk = 0x42;
        assert!(run_line(&mut video).iter().all(|&c| c == 0x42));
    }

    #[test]
    fn playfield_over_background() {
        let mut video = Video::new();
        video.colubk = 0x02;
        video.set_colupf(0x44);
        video.playfield.set_pf0(0xF0);
        let line = run_line(&mut video);
        assert_eq!(line[0], 0x44);
        assert_eq!(line[20], 0x02);
    }

    #[test]
    fn score_mode_splits_playfield_colour() {
        let mut video = Video::new();
        video.set_colup0(0x16);
        video.set_colup1(0x28);
        video.set_colupf(0x44);
        video.set_ctrlpf(0x02); // score mode
        video.playfield.set_pf0(0xF0);
        let line = run_line(&mut video);
        assert_eq!(line[0], 0x16);
        assert_eq!(line[80], 0x28);
    }

    #[test]
    fn overlapping_players_latch_collision() {
        let mut video = Video::new();
        video.player0.gfx_a = 0xFF;
        video.player1.gfx_a = 0xFF;
        // both players at the same position from power-on: they trigger and
        // draw together
        for x in 0..=159u8 {
            video.tick(true, false, 0xFF, x);
            video.pixel(x);
        }
        for _ in 0..160 {
            video.tick(true, false, 0xFF, 0);
            video.pixel(0);
        }
        assert_eq!(video.collisions.read(collision_reg::CXPPMM) & 0x80, 0x80);
    }

    #[test]
    fn player_priority_over_playfield() {
        let mut video = Video::new();
        video.set_colup0(0x16);
        video.set_colupf(0x44);
        video.playfield.set_pf0(0xF0);
        video.player0.gfx_a = 0xFF;
        // run until the player draws within the first playfield band
        let mut saw_player_colour = false;
        for _ in 0..2 {
            for x in 0..160u8 {
                video.tick(true, false, 0xFF, x);
                if x < 16 && video.pixel(x) == 0x16 {
                    saw_player_colour = true;
                }
            }
        }
        assert!(saw_player_colour);
    }
}
