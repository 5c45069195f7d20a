//! Atari 2600 (VCS) machine emulation.
//!
//! Ties the chips together: the 6507, the TIA and the RIOT advance in
//! lockstep under a single master colour clock — three TIA clocks and one
//! RIOT tick per CPU cycle — with the cartridge mapper snooping every bus
//! access. There is no framebuffer in the machine itself; the TIA's
//! per-clock signal stream is assembled into frames by the television.
//!
//! Hosts drive the console through [`Vcs`]: attach a cartridge, queue
//! input events, and call [`Vcs::step_instruction`] or [`Vcs::run`].
//! Everything observable is reachable between steps, either directly or
//! through the `Observable` query interface.

pub mod audio;
pub mod cartridge;
pub mod input;
pub mod memorymap;
pub mod palette;
pub mod playback;
pub mod television;

mod bus;
mod vcs;

pub use bus::VcsBus;
pub use vcs::{HaltReason, Snapshot, StepResult, Vcs};
