//! The television.
//!
//! The TIA emits one [`Signal`] per colour clock; the television assembles
//! them into scanlines and frames. It owns an ARGB framebuffer sized for
//! the full specification, keeps a dynamic visible window through the
//! simple resizer, and hashes every completed frame for reproducibility
//! checks and playback verification.
//!
//! Horizontal position counts colour clocks from the start of the
//! scanline; the leading edge of HSYNC re-synchronises it, so RSYNC-
//! shortened lines cannot accumulate drift. A frame begins when VSYNC is
//! released.

use atari_tia::{Signal, CLOCKS_PER_SCANLINE};
use log::warn;
use sha1::{Digest, Sha1};

use crate::palette;

/// Colour clock at which HSYNC rises within a scanline.
const HSYNC_RISE: u32 = 16;
/// First visible colour clock of a scanline.
const FIRST_VISIBLE_CLOCK: u32 = 68;
/// Visible pixels per scanline.
pub const WIDTH: u32 = 160;

/// Frames ignored by the resizer while the ROM settles.
const LEADING_FRAMES: u64 = 5;

/// Television signal timing specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Specification {
    pub id: &'static str,
    pub scanlines_total: u32,
    pub scanlines_vsync: u32,
    pub scanlines_vblank: u32,
    pub scanlines_visible: u32,
    pub scanlines_overscan: u32,
    pub frames_per_second: u32,
    /// 128 colours indexed by the TIA's 7-bit colour value.
    pub palette: &'static [u32; 128],
}

/// NTSC: 262 scanlines at a nominal 60 Hz.
pub const NTSC: Specification = Specification {
    id: "NTSC",
    scanlines_total: 262,
    scanlines_vsync: 3,
    scanlines_vblank: 37,
    scanlines_visible: 192,
    scanlines_overscan: 30,
    frames_per_second: 60,
    palette: &palette::NTSC,
};

/// PAL: 312 scanlines at 50 Hz.
pub const PAL: Specification = Specification {
    id: "PAL",
    scanlines_total: 312,
    scanlines_vsync: 3,
    scanlines_vblank: 45,
    scanlines_visible: 228,
    scanlines_overscan: 36,
    frames_per_second: 50,
    palette: &palette::PAL,
};

impl Specification {
    /// Look a specification up by its transcript identifier.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "NTSC" => Some(NTSC),
            "PAL" => Some(PAL),
            _ => None,
        }
    }
}

/// Scanline/frame assembly and the framebuffer.
#[derive(Debug, Clone)]
pub struct Television {
    spec: Specification,

    /// Colour clock within the current scanline.
    horiz: u32,
    scanline: u32,
    frame_count: u64,

    prev_hsync: bool,
    prev_vsync: bool,
    /// A VSYNC sequence was seen this frame; frames without one are not
    /// counted as synced.
    vsynced: bool,

    /// ARGB32, `WIDTH` x `scanlines_total`.
    framebuffer: Vec<u32>,

    /// Dynamic visible window.
    top: u32,
    bottom: u32,
    /// Resizer candidate for the next commit.
    pending_bottom: u32,

    /// Signal ran past the specification this frame (warned once).
    out_of_spec: bool,

    frame_complete: bool,
    last_frame_hash: String,
}

impl Television {
    #[must_use]
    pub fn new(spec: Specification) -> Self {
        let bottom = spec.scanlines_vsync + spec.scanlines_vblank + spec.scanlines_visible;
        Self {
            spec,
            horiz: 0,
            scanline: 0,
            frame_count: 0,
            prev_hsync: false,
            prev_vsync: false,
            vsynced: false,
            framebuffer: vec![0xFF00_0000; (WIDTH * spec.scanlines_total) as usize],
            top: spec.scanlines_vsync + spec.scanlines_vblank,
            bottom,
            pending_bottom: bottom,
            out_of_spec: false,
            frame_complete: false,
            last_frame_hash: String::new(),
        }
    }

    #[must_use]
    pub fn spec(&self) -> &Specification {
        &self.spec
    }

    #[must_use]
    pub fn scanline(&self) -> u32 {
        self.scanline
    }

    #[must_use]
    pub fn horiz(&self) -> u32 {
        self.horiz
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Visible window after resizing.
    #[must_use]
    pub fn visible_window(&self) -> (u32, u32) {
        (self.top, self.bottom)
    }

    #[must_use]
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// SHA-1 of the most recently completed frame.
    #[must_use]
    pub fn frame_hash(&self) -> &str {
        &self.last_frame_hash
    }

    /// True once per completed frame; clears on read.
    pub fn take_frame_complete(&mut self) -> bool {
        let complete = self.frame_complete;
        self.frame_complete = false;
        complete
    }

    /// Consume one colour clock of signal.
    pub fn signal(&mut self, sig: Signal) {
        // HSYNC's leading edge pins the horizontal count
        if sig.hsync && !self.prev_hsync {
            self.horiz = HSYNC_RISE;
        } else {
            self.horiz += 1;
            if self.horiz >= CLOCKS_PER_SCANLINE {
                self.horiz = 0;
                self.new_scanline(sig.vblank);
            }
        }
        self.prev_hsync = sig.hsync;

        if sig.vsync && !self.prev_vsync {
            self.vsynced = true;
        }
        if !sig.vsync && self.prev_vsync {
            self.new_frame();
        }
        self.prev_vsync = sig.vsync;

        if let Some(color) = sig.pixel {
            let x = self.horiz.saturating_sub(FIRST_VISIBLE_CLOCK);
            if x < WIDTH && self.scanline < self.spec.scanlines_total {
                let index = usize::from(color >> 1) & 0x7F;
                self.framebuffer[(self.scanline * WIDTH + x) as usize] =
                    self.spec.palette[index];
            }
        }
    }

    fn new_scanline(&mut self, vblank: bool) {
        self.scanline += 1;

        if self.scanline >= self.spec.scanlines_total && !self.out_of_spec {
            self.out_of_spec = true;
            warn!(
                "television: more than {} scanlines in one frame ({})",
                self.spec.scanlines_total, self.spec.id
            );
        }

        // the simple resizer: a visible scanline below the current bottom
        // proposes a taller frame
        if !vblank && self.scanline > self.pending_bottom && self.scanline < self.spec.scanlines_total
        {
            self.pending_bottom = self.scanline;
        }
    }

    fn new_frame(&mut self) {
        let mut hasher = Sha1::new();
        for pixel in &self.framebuffer {
            hasher.update(pixel.to_be_bytes());
        }
        self.last_frame_hash = hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect();

        if self.vsynced {
            self.frame_count += 1;
        }
        self.vsynced = false;

        // commit a pending resize, suppressed while the ROM is settling
        if self.frame_count > LEADING_FRAMES && self.pending_bottom != self.bottom {
            let diff = self.pending_bottom - self.bottom;
            self.top = self.top.saturating_sub(diff);
            self.bottom = self.pending_bottom;
        }
        self.pending_bottom = self.bottom;

        self.scanline = 0;
        self.out_of_spec = false;
        self.frame_complete = true;
    }

    /// Signal exceeded the specification this frame.
    #[must_use]
    pub fn is_out_of_spec(&self) -> bool {
        self.out_of_spec
    }
}
