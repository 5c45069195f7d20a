//! Tigervision 3F (Miner 2049er) and the 3E extension with RAM.
//!
//! The board snoops the bus: a write to TIA mirror 0x3F selects which 2K
//! bank appears in the lower half of the window; the upper half is fixed
//! to the last bank. The 3E extension adds banked RAM — a write to 0x3E
//! switches a 1K RAM bank into the lower half instead (read port below,
//! write port above), and the next write to 0x3F returns to ROM.

use super::mapper::{BankDetails, CartridgeError, Mapper};

#[derive(Debug, Clone)]
pub struct Tigervision {
    id: &'static str,
    banks: Vec<Vec<u8>>,
    bank: usize,
    /// 3E only: RAM bank switched into the lower window.
    ram_bank: Option<usize>,
    ram: Vec<[u8; 1024]>,
}

const BANK_SIZE: usize = 2048;
/// 3E boards carry up to 32K of RAM.
const NUM_RAM_BANKS: usize = 32;

impl Tigervision {
    pub fn new_3f(data: &[u8]) -> Result<Self, CartridgeError> {
        Self::build("3F", data, 0)
    }

    pub fn new_3e(data: &[u8]) -> Result<Self, CartridgeError> {
        Self::build("3E", data, NUM_RAM_BANKS)
    }

    fn build(id: &'static str, data: &[u8], ram_banks: usize) -> Result<Self, CartridgeError> {
        if data.is_empty() || data.len() % BANK_SIZE != 0 {
            return Err(CartridgeError::WrongDataLength {
                id,
                expected: BANK_SIZE,
                got: data.len(),
            });
        }
        let mut cart = Self {
            id,
            banks: data.chunks(BANK_SIZE).map(<[u8]>::to_vec).collect(),
            bank: 0,
            ram_bank: None,
            ram: vec![[0; 1024]; ram_banks],
        };
        cart.initialise();
        Ok(cart)
    }
}

impl Mapper for Tigervision {
    fn id(&self) -> &'static str {
        self.id
    }

    fn read(&mut self, addr: u16, _passive: bool) -> u8 {
        let addr = addr & 0x0FFF;
        if addr >= 0x0800 {
            return self.banks[self.banks.len() - 1][usize::from(addr) - 0x0800];
        }
        match self.ram_bank {
            Some(ram) if addr < 0x0400 => self.ram[ram][usize::from(addr)],
            Some(_) => 0, // RAM write port
            None => self.banks[self.bank][usize::from(addr)],
        }
    }

    fn write(&mut self, addr: u16, data: u8, _passive: bool, poke: bool) {
        let addr = addr & 0x0FFF;
        if let Some(ram) = self.ram_bank {
            if (0x0400..0x0800).contains(&addr) {
                self.ram[ram][usize::from(addr) - 0x0400] = data;
                return;
            }
        }
        if poke {
            if addr >= 0x0800 {
                let last = self.banks.len() - 1;
                self.banks[last][usize::from(addr) - 0x0800] = data;
            } else if self.ram_bank.is_none() {
                self.banks[self.bank][usize::from(addr)] = data;
            }
        }
    }

    fn listen(&mut self, addr: u16, data: u8) {
        // writes only reach listen(); the board watches the TIA mirror
        match addr & 0x1FFF {
            0x003F => {
                self.bank = usize::from(data) % self.banks.len();
                self.ram_bank = None;
            }
            0x003E if !self.ram.is_empty() => {
                self.ram_bank = Some(usize::from(data) % self.ram.len());
            }
            _ => {}
        }
    }

    fn get_bank(&self, addr: u16) -> BankDetails {
        let addr = addr & 0x0FFF;
        if addr >= 0x0800 {
            return BankDetails {
                number: self.banks.len() - 1,
                is_ram: false,
                segment: 1,
            };
        }
        match self.ram_bank {
            Some(ram) => BankDetails {
                number: ram,
                is_ram: true,
                segment: 0,
            },
            None => BankDetails {
                number: self.bank,
                is_ram: false,
                segment: 0,
            },
        }
    }

    fn num_banks(&self) -> usize {
        self.banks.len()
    }

    fn initialise(&mut self) {
        self.bank = 0;
        self.ram_bank = None;
    }

    fn patch(&mut self, offset: usize, data: u8) -> Result<(), CartridgeError> {
        if offset >= BANK_SIZE * self.banks.len() {
            return Err(CartridgeError::PatchOutOfBounds {
                offset,
                len: BANK_SIZE * self.banks.len(),
            });
        }
        self.banks[offset / BANK_SIZE][offset % BANK_SIZE] = data;
        Ok(())
    }

    fn snapshot(&self) -> Box<dyn Mapper> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(banks: usize) -> Vec<u8> {
        let mut data = Vec::new();
        for b in 0..banks {
            data.extend(std::iter::repeat(b as u8).take(2048));
        }
        data
    }

    #[test]
    fn write_to_3f_selects_lower_bank() {
        let mut cart = Tigervision::new_3f(&image(4)).unwrap();
        assert_eq!(cart.read(0x0000, false), 0);
        cart.listen(0x003F, 2);
        assert_eq!(cart.read(0x0000, false), 2);
        // the upper half stays on the last bank
        assert_eq!(cart.read(0x0800, false), 3);
    }

    #[test]
    fn bank_select_wraps_modulo() {
        let mut cart = Tigervision::new_3f(&image(4)).unwrap();
        cart.listen(0x003F, 6);
        assert_eq!(cart.read(0x0000, false), 2);
    }

    #[test]
    fn listen_ignores_other_addresses() {
        let mut cart = Tigervision::new_3f(&image(4)).unwrap();
        cart.listen(0x0080, 2);
        assert_eq!(cart.read(0x0000, false), 0);
    }

    #[test]
    fn e3_ram_banking() {
        let mut cart = Tigervision::new_3e(&image(4)).unwrap();
        cart.listen(0x003E, 1);
        assert!(cart.get_bank(0x0000).is_ram);
        cart.write(0x0410, 0x77, false, false);
        assert_eq!(cart.read(0x0010, false), 0x77);
        // a 3F write puts ROM back
        cart.listen(0x003F, 0);
        assert!(!cart.get_bank(0x0000).is_ram);
        assert_eq!(cart.read(0x0000, false), 0);
    }
}
