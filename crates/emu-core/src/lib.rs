//! Core traits and types for cycle-accurate emulation of the VCS.
//!
//! Everything advances in lockstep with the TIA colour clock. The CPU runs at
//! one third of that rate and performs exactly one bus access per cycle; the
//! bus reports not just the data but where in the sparse VCS address map the
//! access actually landed.

mod bus;
mod observable;
mod tickable;

pub use bus::{Area, Bus, ReadResult};
pub use observable::{Observable, Value};
pub use tickable::Tickable;
