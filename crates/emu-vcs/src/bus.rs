//! The VCS bus: address routing and the chip clocking chain.
//!
//! Implements `emu_core::Bus` for the console. Every CPU access is decoded
//! through the sparse VCS map and also offered to the cartridge's `listen`
//! hook — bus-snooping boards switch banks on accesses that are not
//! addressed to them.
//!
//! `clock_chips` advances the rest of the machine for one CPU cycle in the
//! fixed order the hardware imposes: RIOT, then the cartridge's own clock,
//! then three TIA colour clocks, each one feeding the television, the
//! audio ring and the paddle capacitors.

use atari_tia::Tia;
use emu_core::{Area, Bus, ReadResult, Tickable};
use mos_riot::Riot;

use crate::audio::AudioProducer;
use crate::cartridge::Cartridge;
use crate::input::{HandController, Panel};
use crate::memorymap::map_address;
use crate::television::Television;

pub struct VcsBus {
    pub riot: Riot,
    pub tia: Tia,
    pub cart: Cartridge,
    pub tv: Television,
    pub controllers: [HandController; 2],
    pub panel: Panel,
    audio: Option<AudioProducer>,

    /// Total colour clocks since power-on.
    color_clocks: u64,
}

impl VcsBus {
    #[must_use]
    pub fn new(tv: Television) -> Self {
        Self {
            riot: Riot::new(),
            tia: Tia::new(),
            cart: Cartridge::ejected(),
            tv,
            controllers: [HandController::new(0), HandController::new(1)],
            panel: Panel::new(),
            audio: None,
            color_clocks: 0,
        }
    }

    /// Wire an audio producer in; samples flow as the TIA mixes them.
    pub fn set_audio(&mut self, producer: AudioProducer) {
        self.audio = Some(producer);
    }

    #[must_use]
    pub fn color_clocks(&self) -> u64 {
        self.color_clocks
    }

    /// Read without side effects, for observation between steps.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        let (area, mapped) = map_address(address, true);
        match area {
            Area::Tia => self.tia.read(mapped),
            Area::Ram => self.riot.read_ram(mapped),
            Area::Riot => self.riot.peek(mapped),
            Area::Cartridge => 0,
        }
    }

    /// Advance the machine by one CPU cycle: RIOT, cartridge, then three
    /// TIA colour clocks.
    pub fn clock_chips(&mut self) {
        self.riot.tick();
        self.cart.mapper().step();

        for _ in 0..3 {
            let sig = self.tia.tick();
            self.color_clocks += 1;

            if let Some(bits) = self.tia.take_vblank_input() {
                for controller in &mut self.controllers {
                    controller.vblank_bits(bits.ground_paddles, bits.latch_fire, &mut self.tia);
                }
            }

            for controller in &mut self.controllers {
                controller.recharge(&mut self.tia);
            }

            self.tv.signal(sig);

            if let Some(sample) = sig.audio {
                if let Some(audio) = &mut self.audio {
                    audio.push(sample);
                }
            }
        }

        // keypad column lines settle once per CPU cycle
        let Self {
            controllers,
            riot,
            tia,
            ..
        } = self;
        for controller in controllers.iter() {
            controller.scan_keypad(riot, tia);
        }
    }
}

/// One tick of the chip set is one CPU cycle's worth of machine time.
impl Tickable for VcsBus {
    fn tick(&mut self) {
        self.clock_chips();
    }
}

impl Bus for VcsBus {
    fn read(&mut self, address: u16) -> ReadResult {
        let (area, mapped) = map_address(address, true);
        let data = match area {
            Area::Tia => self.tia.read(mapped),
            Area::Ram => self.riot.read_ram(mapped),
            Area::Riot => self.riot.read(mapped),
            Area::Cartridge => self.cart.mapper().read(mapped, false),
        };

        // every bus cycle is visible to the cartridge
        self.cart.mapper().listen(address & 0x1FFF, data);

        ReadResult::new(data, mapped, area)
    }

    fn write(&mut self, address: u16, value: u8) {
        let (area, mapped) = map_address(address, false);
        match area {
            Area::Tia => self.tia.queue_write(mapped, value),
            Area::Ram => self.riot.write_ram(mapped, value),
            Area::Riot => self.riot.write(mapped, value),
            Area::Cartridge => self.cart.mapper().write(mapped, value, false, false),
        }

        self.cart.mapper().listen(address & 0x1FFF, value);
    }

    fn rdy(&self) -> bool {
        self.tia.rdy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Loader;
    use crate::television::{Television, NTSC};

    fn bus_with_rom(data: Vec<u8>) -> VcsBus {
        let mut bus = VcsBus::new(Television::new(NTSC));
        let loader = Loader::new("test.bin", "", data);
        bus.cart = Cartridge::attach(&loader).unwrap();
        bus
    }

    #[test]
    fn ram_reads_report_area_and_mirror() {
        let mut bus = VcsBus::new(Television::new(NTSC));
        bus.write(0x0080, 0x42);
        let result = bus.read(0x0180);
        assert_eq!(result.data, 0x42);
        assert_eq!(result.area, Area::Ram);
        assert_eq!(result.mapped, 0x00);
    }

    #[test]
    fn cartridge_reads_through_13_bit_window() {
        let mut rom = vec![0xEA; 4096];
        rom[0xFFC] = 0x00;
        rom[0xFFD] = 0xF0;
        let mut bus = bus_with_rom(rom);
        assert_eq!(bus.read(0xFFFC).data, 0x00);
        assert_eq!(bus.read(0xFFFD).data, 0xF0);
        assert_eq!(bus.read(0x1FFC).data, 0x00);
    }

    #[test]
    fn tigervision_snoops_tia_writes() {
        let mut rom = Vec::new();
        for b in 0..4u8 {
            rom.extend(std::iter::repeat(b).take(2048));
        }
        let mut bus = VcsBus::new(Television::new(NTSC));
        bus.cart = Cartridge::attach(&Loader::new("t.3f", "", rom)).unwrap();
        assert_eq!(bus.cart.id(), "3F");
        assert_eq!(bus.read(0x1000).data, 0);
        // a write to TIA mirror 0x3F switches the low bank
        bus.write(0x003F, 0x02);
        assert_eq!(bus.read(0x1000).data, 2);
    }

    #[test]
    fn three_tia_clocks_per_cpu_cycle() {
        let mut bus = VcsBus::new(Television::new(NTSC));
        let before = bus.color_clocks();
        bus.clock_chips();
        assert_eq!(bus.color_clocks() - before, 3);
    }
}
