//! The Activision FE scheme (Decathlon, Robot Tank).
//!
//! No hotspots: the board watches the bus for accesses to 0x01FE — the top
//! of the stack during a JSR or RTS — and uses bit 5 of the value
//! transferred on the following cycle (the high byte of the target
//! address) to choose between the two 4K banks. Code at $Fxxx runs from
//! bank 0, code at $Dxxx from bank 1.

use super::mapper::{BankDetails, CartridgeError, Mapper};

#[derive(Debug, Clone)]
pub struct Fe {
    banks: [Vec<u8>; 2],
    bank: usize,
    /// The previous bus access touched 0x01FE.
    triggered: bool,
}

const BANK_SIZE: usize = 4096;

impl Fe {
    pub fn new(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() != BANK_SIZE * 2 {
            return Err(CartridgeError::WrongDataLength {
                id: "FE",
                expected: BANK_SIZE * 2,
                got: data.len(),
            });
        }
        Ok(Self {
            banks: [data[..BANK_SIZE].to_vec(), data[BANK_SIZE..].to_vec()],
            bank: 0,
            triggered: false,
        })
    }
}

impl Mapper for Fe {
    fn id(&self) -> &'static str {
        "FE"
    }

    fn read(&mut self, addr: u16, _passive: bool) -> u8 {
        self.banks[self.bank][usize::from(addr & 0x0FFF)]
    }

    fn write(&mut self, addr: u16, data: u8, _passive: bool, poke: bool) {
        if poke {
            self.banks[self.bank][usize::from(addr & 0x0FFF)] = data;
        }
    }

    fn listen(&mut self, addr: u16, data: u8) {
        if self.triggered {
            // bit 5 of the address high byte: $Fxxx -> bank 0, $Dxxx -> bank 1
            self.bank = usize::from(data & 0x20 == 0);
            self.triggered = false;
        }
        if addr & 0x1FFF == 0x01FE {
            self.triggered = true;
        }
    }

    fn get_bank(&self, _addr: u16) -> BankDetails {
        BankDetails::rom(self.bank)
    }

    fn num_banks(&self) -> usize {
        2
    }

    fn initialise(&mut self) {
        self.bank = 0;
        self.triggered = false;
    }

    fn patch(&mut self, offset: usize, data: u8) -> Result<(), CartridgeError> {
        if offset >= BANK_SIZE * 2 {
            return Err(CartridgeError::PatchOutOfBounds {
                offset,
                len: BANK_SIZE * 2,
            });
        }
        self.banks[offset / BANK_SIZE][offset % BANK_SIZE] = data;
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}
