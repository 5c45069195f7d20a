//! Harmony / DPC+ format.
//!
//! DPC+ images bundle an ARM driver, six 4K banks of 6507 code, 4K of
//! display data and 1K of frequency data. Only the banking side is
//! emulated here — hotspots 0xFF6-0xFFB, starting in the last bank — so
//! that DPC+ images attach, run their 6507 code and report their banks;
//! the ARM coprocessor and its fetcher emulation are not implemented.

use log::warn;

use super::mapper::{BankDetails, CartridgeError, Mapper};

const DRIVER_SIZE: usize = 3072;
const BANK_SIZE: usize = 4096;
const NUM_BANKS: usize = 6;

#[derive(Debug, Clone)]
pub struct DpcPlus {
    data: Vec<u8>,
    bank: usize,
}

impl DpcPlus {
    pub fn new(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < DRIVER_SIZE + BANK_SIZE * NUM_BANKS {
            return Err(CartridgeError::WrongDataLength {
                id: "DPC+",
                expected: DRIVER_SIZE + BANK_SIZE * NUM_BANKS,
                got: data.len(),
            });
        }
        warn!("DPC+ cartridge attached: banking only, coprocessor not emulated");
        let mut cart = Self {
            data: data.to_vec(),
            bank: 0,
        };
        cart.initialise();
        Ok(cart)
    }

    fn hotspot(&mut self, addr: u16, passive: bool) -> bool {
        if (0x0FF6..=0x0FFB).contains(&addr) {
            if !passive {
                self.bank = usize::from(addr - 0x0FF6);
            }
            return true;
        }
        false
    }

    fn bank_offset(&self) -> usize {
        DRIVER_SIZE + self.bank * BANK_SIZE
    }
}

impl Mapper for DpcPlus {
    fn id(&self) -> &'static str {
        "DPC+"
    }

    fn read(&mut self, addr: u16, passive: bool) -> u8 {
        let addr = addr & 0x0FFF;
        self.hotspot(addr, passive);
        self.data[self.bank_offset() + usize::from(addr)]
    }

    fn write(&mut self, addr: u16, data: u8, passive: bool, poke: bool) {
        let addr = addr & 0x0FFF;
        if self.hotspot(addr, passive) {
            return;
        }
        if poke {
            let offset = self.bank_offset() + usize::from(addr);
            self.data[offset] = data;
        }
    }

    fn get_bank(&self, _addr: u16) -> BankDetails {
        BankDetails::rom(self.bank)
    }

    fn num_banks(&self) -> usize {
        NUM_BANKS
    }

    fn initialise(&mut self) {
        self.bank = NUM_BANKS - 1;
    }

    fn patch(&mut self, offset: usize, data: u8) -> Result<(), CartridgeError> {
        if offset >= self.data.len() {
            return Err(CartridgeError::PatchOutOfBounds {
                offset,
                len: self.data.len(),
            });
        }
        self.data[offset] = data;
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> Vec<u8> {
        let mut data = vec![0u8; DRIVER_SIZE];
        for b in 0..NUM_BANKS {
            data.extend(std::iter::repeat(b as u8).take(BANK_SIZE));
        }
        data
    }

    #[test]
    fn starts_in_last_bank() {
        let mut cart = DpcPlus::new(&image()).unwrap();
        assert_eq!(cart.read(0x0000, false), 5);
    }

    #[test]
    fn hotspots_select_banks() {
        let mut cart = DpcPlus::new(&image()).unwrap();
        cart.read(0x0FF6, false);
        assert_eq!(cart.get_bank(0).number, 0);
        cart.read(0x0FFB, false);
        assert_eq!(cart.get_bank(0).number, 5);
    }
}
