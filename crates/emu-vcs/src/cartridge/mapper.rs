//! The cartridge mapper interface.
//!
//! A mapper owns the ROM image and whatever banking state, RAM and
//! registers its board carries. The bus offers it every access to the
//! cartridge window plus, through `listen`, every write anywhere on the
//! bus — some boards (Tigervision, the Activision FE scheme) switch banks
//! by snooping addresses that are not their own.

use std::fmt;

/// Where a cartridge address currently points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankDetails {
    /// Bank number within the mapper's own numbering.
    pub number: usize,
    /// True when the address resolves to cartridge RAM.
    pub is_ram: bool,
    /// Segment of the address window, for segmented mappers.
    pub segment: usize,
}

impl BankDetails {
    #[must_use]
    pub const fn rom(number: usize) -> Self {
        Self {
            number,
            is_ram: false,
            segment: 0,
        }
    }
}

impl fmt::Display for BankDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ram {
            write!(f, "RAM bank {} (segment {})", self.number, self.segment)
        } else {
            write!(f, "bank {} (segment {})", self.number, self.segment)
        }
    }
}

/// Errors raised by the cartridge layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartridgeError {
    /// No mapper accepts an image of this many bytes.
    UnrecognisedSize(usize),
    /// The image does not match the mapper's expected length.
    WrongDataLength {
        id: &'static str,
        expected: usize,
        got: usize,
    },
    /// A patch offset fell outside the ROM image.
    PatchOutOfBounds { offset: usize, len: usize },
    /// The mapping hint names no known mapper.
    UnknownMapping(String),
}

impl fmt::Display for CartridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CartridgeError::UnrecognisedSize(size) => {
                write!(f, "unrecognised cartridge size ({size} bytes)")
            }
            CartridgeError::WrongDataLength { id, expected, got } => {
                write!(
                    f,
                    "{id}: wrong number of bytes in the cartridge data (expected {expected}, got {got})"
                )
            }
            CartridgeError::PatchOutOfBounds { offset, len } => {
                write!(f, "patch offset {offset} outside cartridge data ({len} bytes)")
            }
            CartridgeError::UnknownMapping(hint) => {
                write!(f, "unknown cartridge mapping ({hint})")
            }
        }
    }
}

impl std::error::Error for CartridgeError {}

/// Cartridge banking logic.
///
/// `addr` arguments are 12-bit offsets into the cartridge window except for
/// `listen`, which receives the unmasked bus address.
pub trait Mapper {
    /// Short identifier for the banking scheme ("F8", "E0", "AR", ...).
    fn id(&self) -> &'static str;

    /// Read from the cartridge window. A passive read is a bus snoop with
    /// no side effects; an active read may switch banks through hotspots.
    fn read(&mut self, addr: u16, passive: bool) -> u8;

    /// Write to the cartridge window. `poke` bypasses the board logic and
    /// pokes the underlying memory (debugger use).
    fn write(&mut self, addr: u16, data: u8, passive: bool, poke: bool);

    /// Observe a bus access outside the cartridge window.
    fn listen(&mut self, _addr: u16, _data: u8) {}

    /// Called once per CPU cycle for boards with internal clocks.
    fn step(&mut self) {}

    /// Report which bank currently services `addr`.
    fn get_bank(&self, addr: u16) -> BankDetails;

    fn num_banks(&self) -> usize;

    /// Return the board to its power-on banking state. ROM and RAM
    /// contents are not touched.
    fn initialise(&mut self);

    /// Patch a byte of the ROM image at a flat file offset.
    fn patch(&mut self, offset: usize, data: u8) -> Result<(), CartridgeError>;

    /// Deep copy for snapshots (trait objects cannot derive `Clone`).
    fn snapshot(&self) -> Box<dyn Mapper>;
}

/// The empty cartridge slot.
#[derive(Debug, Clone)]
pub struct Ejected;

impl Mapper for Ejected {
    fn id(&self) -> &'static str {
        "-"
    }

    fn read(&mut self, _addr: u16, _passive: bool) -> u8 {
        0
    }

    fn write(&mut self, _addr: u16, _data: u8, _passive: bool, _poke: bool) {}

    fn get_bank(&self, _addr: u16) -> BankDetails {
        BankDetails::rom(0)
    }

    fn num_banks(&self) -> usize {
        0
    }

    fn initialise(&mut self) {}

    fn patch(&mut self, offset: usize, _data: u8) -> Result<(), CartridgeError> {
        Err(CartridgeError::PatchOutOfBounds { offset, len: 0 })
    }

    fn snapshot(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}
