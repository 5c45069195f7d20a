//! Parker Brothers E0 (Montezuma's Revenge, Lord of the Rings).
//!
//! The 4K window is split into four 1K segments. Hotspots 0xFE0-0xFF7
//! assign any of the eight 1K banks to the first three segments (eight
//! hotspots per segment); the last segment is hard-wired to the last bank
//! so the cartridge always starts in the same place.

use super::mapper::{BankDetails, CartridgeError, Mapper};

#[derive(Debug, Clone)]
pub struct ParkerBros {
    banks: Vec<Vec<u8>>,
    segment: [usize; 4],
}

const BANK_SIZE: usize = 1024;
const NUM_BANKS: usize = 8;

impl ParkerBros {
    pub fn new(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() != BANK_SIZE * NUM_BANKS {
            return Err(CartridgeError::WrongDataLength {
                id: "E0",
                expected: BANK_SIZE * NUM_BANKS,
                got: data.len(),
            });
        }
        let mut cart = Self {
            banks: data.chunks(BANK_SIZE).map(<[u8]>::to_vec).collect(),
            segment: [0; 4],
        };
        cart.initialise();
        Ok(cart)
    }

    fn hotspot(&mut self, addr: u16, passive: bool) -> bool {
        if (0x0FE0..=0x0FF7).contains(&addr) {
            if !passive {
                let slot = usize::from(addr - 0x0FE0);
                self.segment[slot / 8] = slot % 8;
            }
            return true;
        }
        false
    }

    fn segment_of(addr: u16) -> usize {
        usize::from(addr >> 10) & 0x03
    }
}

impl Mapper for ParkerBros {
    fn id(&self) -> &'static str {
        "E0"
    }

    fn read(&mut self, addr: u16, passive: bool) -> u8 {
        let addr = addr & 0x0FFF;
        if self.hotspot(addr, passive) {
            return 0;
        }
        let bank = self.segment[Self::segment_of(addr)];
        self.banks[bank][usize::from(addr) & 0x03FF]
    }

    fn write(&mut self, addr: u16, data: u8, passive: bool, poke: bool) {
        let addr = addr & 0x0FFF;
        if self.hotspot(addr, passive) {
            return;
        }
        if poke {
            let bank = self.segment[Self::segment_of(addr)];
            self.banks[bank][usize::from(addr) & 0x03FF] = data;
        }
    }

    fn get_bank(&self, addr: u16) -> BankDetails {
        let segment = Self::segment_of(addr & 0x0FFF);
        BankDetails {
            number: self.segment[segment],
            is_ram: false,
            segment,
        }
    }

    fn num_banks(&self) -> usize {
        NUM_BANKS
    }

    fn initialise(&mut self) {
        self.segment = [
            NUM_BANKS - 4,
            NUM_BANKS - 3,
            NUM_BANKS - 2,
            NUM_BANKS - 1,
        ];
    }

    fn patch(&mut self, offset: usize, data: u8) -> Result<(), CartridgeError> {
        if offset >= BANK_SIZE * NUM_BANKS {
            return Err(CartridgeError::PatchOutOfBounds {
                offset,
                len: BANK_SIZE * NUM_BANKS,
            });
        }
        self.banks[offset / BANK_SIZE][offset % BANK_SIZE] = data;
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}
