//! The console: CPU plus bus, and the step API hosts drive.
//!
//! The orchestrator owns no state of its own beyond its components. One
//! call to [`Vcs::step_instruction`] executes one CPU instruction; the
//! per-cycle callback clocks the RIOT, the cartridge and three TIA colour
//! clocks after every bus cycle, and any WSYNC-stalled cycles are run off
//! before the call returns so the next instruction starts with the RDY
//! line high.

use std::sync::atomic::{AtomicBool, Ordering};

use atari_tia::Tia;
use emu_core::{Bus, Observable, Tickable, Value};
use mos_6507::{InstructionResult, Mos6507};
use mos_riot::Riot;

use crate::audio::{audio_ring, AudioConsumer, DEFAULT_CAPACITY};
use crate::bus::VcsBus;
use crate::cartridge::{Cartridge, CartridgeError, Loader};
use crate::television::{Specification, Television};

/// Why a run stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    /// The cooperative cancel flag was raised.
    Cancelled,
    /// A JAM opcode wedged the CPU.
    CpuJammed,
}

/// One completed step.
#[derive(Debug, Clone, Copy)]
pub struct StepResult {
    /// CPU cycles consumed, including WSYNC-stalled cycles.
    pub cycles: u32,
    pub instruction: InstructionResult,
    /// The television saw more scanlines than the specification allows.
    pub out_of_spec: bool,
}

/// Deep copy of the whole aggregate: mapper bank state and cartridge RAM,
/// RIOT RAM and timer, TIA registers and pending events, CPU registers,
/// and the television's frame assembly state.
pub struct Snapshot {
    cpu: Mos6507,
    riot: Riot,
    tia: Tia,
    cart: Cartridge,
    tv: Television,
}

/// The Atari 2600.
pub struct Vcs {
    pub cpu: Mos6507,
    pub bus: VcsBus,

    /// Faults raised mid-step surface at the next instruction boundary.
    pending_error: Option<CartridgeError>,

    /// Consumer half of the audio ring until the host claims it.
    audio_consumer: Option<AudioConsumer>,

    /// Seed counter for randomised resets.
    reset_count: u64,
}

impl Vcs {
    #[must_use]
    pub fn new(spec: Specification) -> Self {
        let (producer, consumer) = audio_ring(DEFAULT_CAPACITY);
        let mut bus = VcsBus::new(Television::new(spec));
        bus.set_audio(producer);

        Self {
            cpu: Mos6507::new(),
            bus,
            pending_error: None,
            audio_consumer: Some(consumer),
            reset_count: 0,
        }
    }

    /// Claim the audio consumer; hand it to the host audio thread.
    pub fn take_audio_consumer(&mut self) -> Option<AudioConsumer> {
        self.audio_consumer.take()
    }

    /// Attach a cartridge and reset the console.
    pub fn attach_cartridge(&mut self, loader: &Loader) -> Result<(), CartridgeError> {
        self.bus.cart = Cartridge::attach(loader)?;
        self.reset(true, false);
        Ok(())
    }

    /// Remove the cartridge.
    pub fn eject(&mut self) {
        self.bus.cart = Cartridge::ejected();
    }

    /// Console reset. A hard reset clears RIOT RAM; `randomize` scrambles
    /// the CPU registers the way a real console powers up.
    pub fn reset(&mut self, hard: bool, randomize: bool) {
        self.reset_count += 1;
        self.bus.cart.mapper().initialise();
        self.bus.riot.reset(hard);
        self.bus.tia.reset();
        self.cpu.reset(&mut self.bus);
        if randomize {
            self.cpu.randomize_registers(self.reset_count);
        }
        self.pending_error = None;
    }

    /// Queue an input event for a hand-controller port (0 or 1). The queue
    /// drains at the next step boundary.
    pub fn queue_event(&mut self, port: usize, event: crate::input::Event) {
        self.bus.controllers[port % 2].queue_event(event);
    }

    /// Queue a console panel event.
    pub fn queue_panel_event(&mut self, event: crate::input::Event) {
        self.bus.panel.queue_event(event);
    }

    /// Execute one CPU instruction and everything it drags along.
    pub fn step_instruction(&mut self) -> Result<StepResult, CartridgeError> {
        if let Some(err) = self.pending_error.take() {
            return Err(err);
        }

        self.drain_input_queues();

        let instruction = self
            .cpu
            .execute_instruction(&mut self.bus, VcsBus::clock_chips);
        let mut cycles = instruction.cycles;

        // WSYNC holds RDY low; burn cycles until the TIA releases it so
        // the next instruction starts clean
        while !self.bus.rdy() {
            self.bus.tick();
            cycles += 1;
        }

        Ok(StepResult {
            cycles,
            instruction,
            out_of_spec: self.bus.tv.is_out_of_spec(),
        })
    }

    /// Run until cancelled or halted. The cancel flag is consulted between
    /// instructions only.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<HaltReason, CartridgeError> {
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Ok(HaltReason::Cancelled);
            }
            self.step_instruction()?;
            if self.cpu.is_stopped() {
                return Ok(HaltReason::CpuJammed);
            }
        }
    }

    /// Run whole instructions until the television completes a frame.
    pub fn run_frame(&mut self) -> Result<(), CartridgeError> {
        loop {
            self.step_instruction()?;
            if self.bus.tv.take_frame_complete() {
                return Ok(());
            }
            if self.cpu.is_stopped() {
                return Ok(());
            }
        }
    }

    /// Park an error for the next step boundary. The per-cycle path is
    /// infallible; anything that goes wrong mid-step lands here.
    pub fn defer_error(&mut self, error: CartridgeError) {
        if self.pending_error.is_none() {
            self.pending_error = Some(error);
        }
    }

    /// Patch a byte of the cartridge image.
    pub fn patch(&mut self, offset: usize, data: u8) -> Result<(), CartridgeError> {
        self.bus.cart.mapper().patch(offset, data)
    }

    /// Capture the whole machine.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            cpu: self.cpu.clone(),
            riot: self.bus.riot.clone(),
            tia: self.bus.tia.clone(),
            cart: self.bus.cart.snapshot(),
            tv: self.bus.tv.clone(),
        }
    }

    /// Restore a previously captured machine.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.cpu = snapshot.cpu.clone();
        self.bus.riot = snapshot.riot.clone();
        self.bus.tia = snapshot.tia.clone();
        self.bus.cart = snapshot.cart.snapshot();
        self.bus.tv = snapshot.tv.clone();
    }

    fn drain_input_queues(&mut self) {
        for port in 0..2 {
            while let Some(event) = self.bus.controllers[port].pop_event() {
                let VcsBus {
                    controllers,
                    riot,
                    tia,
                    ..
                } = &mut self.bus;
                if let Err(err) = controllers[port].handle(event, riot, tia) {
                    log::warn!("input event dropped: {err}");
                }
            }
        }
        while let Some(event) = self.bus.panel.pop_event() {
            if let Err(err) = self.bus.panel.handle(event, &mut self.bus.riot) {
                log::warn!("panel event dropped: {err}");
            }
        }
    }
}

impl Observable for Vcs {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            return self.cpu.query(rest);
        }
        if let Some(rest) = path.strip_prefix("tia.") {
            return match rest {
                "hsync" => Some(u16::from(self.bus.tia.hsync_count()).into()),
                "video_cycles" => Some(u64::from(self.bus.tia.video_cycles()).into()),
                "hblank" => Some(self.bus.tia.hblank().into()),
                "hmove_latch" => Some(self.bus.tia.hmove_latch().into()),
                _ => None,
            };
        }
        if let Some(rest) = path.strip_prefix("riot.") {
            return match rest {
                "intim" => Some(self.bus.riot.peek(mos_riot::reg::INTIM).into()),
                "swcha" => Some(self.bus.riot.peek(mos_riot::reg::SWCHA).into()),
                "swchb" => Some(self.bus.riot.peek(mos_riot::reg::SWCHB).into()),
                _ => None,
            };
        }
        if let Some(rest) = path.strip_prefix("tv.") {
            return match rest {
                "scanline" => Some(u64::from(self.bus.tv.scanline()).into()),
                "frame" => Some(self.bus.tv.frame_count().into()),
                _ => None,
            };
        }
        if let Some(rest) = path.strip_prefix("memory.") {
            let addr = if let Some(hex) = rest.strip_prefix("0x") {
                u16::from_str_radix(hex, 16).ok()
            } else {
                rest.parse().ok()
            };
            return addr.map(|a| Value::U8(self.bus.peek(a)));
        }
        match path {
            "cartridge.id" => Some(self.bus.cart.id().into()),
            "cartridge.hash" => Some(self.bus.cart.hash().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<register or flag>",
            "tia.hsync",
            "tia.video_cycles",
            "tia.hblank",
            "tia.hmove_latch",
            "riot.intim",
            "riot.swcha",
            "riot.swchb",
            "tv.scanline",
            "tv.frame",
            "memory.<address>",
            "cartridge.id",
            "cartridge.hash",
        ]
    }
}
