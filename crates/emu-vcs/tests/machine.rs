//! Whole-machine tests: a cartridge, the real bus, all three chips.

use emu_core::Observable;

use emu_vcs::cartridge::Loader;
use emu_vcs::input::{Direction, Event};
use emu_vcs::television::NTSC;
use emu_vcs::Vcs;

/// Build a 4K ROM from code placed at 0xF000, with the reset vector
/// pointing at it.
fn rom_with(code: &[u8]) -> Vec<u8> {
    let mut rom = vec![0xEA; 4096]; // NOP filler
    rom[..code.len()].copy_from_slice(code);
    rom[0xFFC] = 0x00;
    rom[0xFFD] = 0xF0;
    rom
}

fn vcs_with(code: &[u8]) -> Vcs {
    let mut vcs = Vcs::new(NTSC);
    let loader = Loader::new("test.bin", "", rom_with(code));
    vcs.attach_cartridge(&loader).unwrap();
    vcs
}

#[test]
fn reset_vector_loads_pc() {
    let vcs = vcs_with(&[]);
    assert_eq!(vcs.cpu.regs.pc, 0xF000);
}

#[test]
fn three_colour_clocks_per_cpu_cycle() {
    let mut vcs = vcs_with(&[0xEA, 0xEA]); // NOP; NOP
    let before = vcs.bus.color_clocks();
    let step = vcs.step_instruction().unwrap();
    assert_eq!(step.cycles, 2);
    assert_eq!(vcs.bus.color_clocks() - before, 6);
}

#[test]
fn ram_survives_through_the_bus() {
    // LDA #$42; STA $80; LDA $80
    let mut vcs = vcs_with(&[0xA9, 0x42, 0x85, 0x80, 0xA5, 0x80]);
    for _ in 0..3 {
        vcs.step_instruction().unwrap();
    }
    assert_eq!(vcs.cpu.regs.a, 0x42);
    assert_eq!(vcs.query("memory.0x0080"), Some(0x42u8.into()));
}

#[test]
fn wsync_aligns_to_scanline_start() {
    // STA WSYNC; NOP, repeated: after each WSYNC step the machine must
    // sit within the first CPU cycle of a fresh scanline, wherever the
    // write landed in the previous line
    let mut vcs = vcs_with(&[0x85, 0x02, 0xEA, 0x4C, 0x00, 0xF0]); // STA WSYNC; NOP; JMP $F000
    for _ in 0..40 {
        let step = vcs.step_instruction().unwrap();
        if step.instruction.opcode == 0x85 {
            assert!(
                vcs.bus.tia.video_cycles() < 3,
                "WSYNC left the machine at colour clock {}",
                vcs.bus.tia.video_cycles()
            );
        }
    }
}

#[test]
fn wsync_step_reports_the_stalled_cycles() {
    let mut vcs = vcs_with(&[0x85, 0x02, 0xEA]);
    let step = vcs.step_instruction().unwrap();
    // a full scanline is 76 CPU cycles; STA zp itself is 3
    assert!(step.cycles > 3);
    assert!(step.cycles <= 79);
}

#[test]
fn timer_boundary_values() {
    // LDA #$0A; STA TIM1T ($0294); the timer then counts one per cycle
    let mut vcs = vcs_with(&[0xA9, 0x0A, 0x8D, 0x94, 0x02, 0xEA]);
    vcs.step_instruction().unwrap();
    let store = vcs.step_instruction().unwrap();
    assert_eq!(store.instruction.opcode, 0x8D);
    // the store's final cycle wrote the timer; INTIM counts down from 10
    let intim = vcs.bus.riot.peek(mos_riot::reg::INTIM);
    assert!(intim <= 10);
    // run 10 CPU cycles' worth and look for the underflow flip
    for _ in 0..8 {
        vcs.step_instruction().unwrap();
    }
    assert!(vcs.bus.riot.timer_expired() || vcs.bus.riot.peek(mos_riot::reg::INTIM) < 10);
}

#[test]
fn parker_bros_bank_switch_by_read() {
    // build an E0 image: a Parker Bros fingerprint plus bank markers
    let mut rom = vec![0xEA; 8192];
    rom[0x0200..0x0203].copy_from_slice(&[0x8D, 0xE0, 0x1F]);
    for bank in 0..8 {
        rom[bank * 1024] = 0xB0 + bank as u8;
    }
    // reset vector lives in the fixed last segment (bank 7, offset 0x3FC)
    rom[7 * 1024 + 0x3FC] = 0x00;
    rom[7 * 1024 + 0x3FD] = 0xF0;

    let mut vcs = Vcs::new(NTSC);
    vcs.attach_cartridge(&Loader::new("e0.bin", "", rom)).unwrap();
    assert_eq!(vcs.bus.cart.id(), "E0");

    // reading 0x1FE4 assigns bank 4 to segment 0
    use emu_core::Bus;
    vcs.bus.read(0x1FE4);
    assert_eq!(vcs.bus.read(0x1000).data, 0xB4);
    let details = vcs.bus.cart.mapper_ref().get_bank(0x0000);
    assert_eq!(details.number, 4);
    assert_eq!(details.segment, 0);
}

#[test]
fn tigervision_fingerprint_end_to_end() {
    // an 8K image with five STA $3F sequences attaches as 3F without a hint
    let mut rom = vec![0xEA; 8192];
    for i in 0..5 {
        rom[0x40 + i * 2] = 0x85;
        rom[0x41 + i * 2] = 0x3F;
    }
    let mut vcs = Vcs::new(NTSC);
    vcs.attach_cartridge(&Loader::new("game.bin", "", rom)).unwrap();
    assert_eq!(vcs.bus.cart.id(), "3F");
}

#[test]
fn collision_set_then_cleared_by_cxclr() {
    // both players power on at the same position; give them both graphics
    // and let a few scanlines run, then CXCLR
    let code = [
        0xA9, 0xFF, // LDA #$FF
        0x85, 0x1B, // STA GRP0
        0x85, 0x1C, // STA GRP1
        0x4C, 0x06, 0xF0, // JMP self
    ];
    let mut vcs = vcs_with(&code);
    for _ in 0..400 {
        vcs.step_instruction().unwrap();
    }
    use emu_core::Bus;
    assert_eq!(vcs.bus.read(0x0007).data & 0x80, 0x80); // CXPPMM

    // stop the players drawing, then CXCLR: the latches must all clear
    // and stay clear. the TIA consumes one queued write per step, so
    // space the writes out
    vcs.bus.write(0x001B, 0x00);
    vcs.step_instruction().unwrap();
    vcs.bus.write(0x001C, 0x00);
    vcs.step_instruction().unwrap();
    vcs.bus.write(0x002C, 0x00);
    vcs.step_instruction().unwrap();
    vcs.step_instruction().unwrap();
    assert_eq!(vcs.bus.read(0x0007).data & 0xC0, 0x00);
}

#[test]
fn snapshot_restore_then_step_matches() {
    let mut vcs = vcs_with(&[0xA9, 0x01, 0x69, 0x01, 0x4C, 0x02, 0xF0]); // LDA #1; ADC #1; JMP loop
    for _ in 0..100 {
        vcs.step_instruction().unwrap();
    }

    let snapshot = vcs.snapshot();

    // advance the live machine N instructions and record state
    for _ in 0..500 {
        vcs.step_instruction().unwrap();
    }
    let a_after = vcs.cpu.regs.a;
    let pc_after = vcs.cpu.regs.pc;
    let clocks_tia = vcs.bus.tia.video_cycles();

    // restore and step the same N again
    vcs.restore(&snapshot);
    for _ in 0..500 {
        vcs.step_instruction().unwrap();
    }
    assert_eq!(vcs.cpu.regs.a, a_after);
    assert_eq!(vcs.cpu.regs.pc, pc_after);
    assert_eq!(vcs.bus.tia.video_cycles(), clocks_tia);
}

#[test]
fn frames_are_reproducible() {
    // a frame loop: VSYNC on for 3 lines, then blank lines
    let code = [
        0xA9, 0x02, // LDA #2
        0x85, 0x00, // STA VSYNC
        0x85, 0x02, // STA WSYNC
        0x85, 0x02, // STA WSYNC
        0x85, 0x02, // STA WSYNC
        0xA9, 0x00, // LDA #0
        0x85, 0x00, // STA VSYNC
        0xA2, 0x00, // LDX #0
        0x85, 0x02, // STA WSYNC (loop)
        0xE8, // INX
        0xD0, 0xFB, // BNE loop
        0x4C, 0x00, 0xF0, // JMP top
    ];

    let run = || {
        let mut vcs = vcs_with(&code);
        for _ in 0..10 {
            vcs.run_frame().unwrap();
        }
        vcs.bus.tv.frame_hash().to_string()
    };

    let first = run();
    let second = run();
    assert_eq!(first, second);
    assert_eq!(first.len(), 40);
}

#[test]
fn joystick_event_reaches_swcha() {
    let mut vcs = vcs_with(&[0xEA, 0x4C, 0x00, 0xF0]);
    vcs.queue_event(
        0,
        Event::Joystick {
            direction: Direction::Left,
            pressed: true,
        },
    );
    vcs.step_instruction().unwrap();
    assert_eq!(vcs.bus.riot.peek(mos_riot::reg::SWCHA), 0xBF);
}

#[test]
fn panel_event_reaches_swchb() {
    let mut vcs = vcs_with(&[0xEA, 0x4C, 0x00, 0xF0]);
    vcs.queue_panel_event(Event::PanelSelect { pressed: true });
    vcs.step_instruction().unwrap();
    assert_eq!(vcs.bus.riot.peek(mos_riot::reg::SWCHB) & 0x02, 0x00);
}

#[test]
fn paddle_charges_during_emulation() {
    let mut vcs = vcs_with(&[0xEA, 0x4C, 0x00, 0xF0]);
    vcs.queue_event(0, Event::PaddleSet { position: 0.5 });
    // 20 instructions x >=3 CPU cycles x 3 colour clocks each is plenty
    // for the capacitor to start charging
    for _ in 0..20 {
        vcs.step_instruction().unwrap();
    }
    assert!(vcs.bus.controllers[0].paddle_charge() > 0);
    assert!(vcs.bus.tia.input(0) > 0);
}

#[test]
fn cpu_jam_halts_the_run() {
    let mut vcs = vcs_with(&[0x02]); // JAM
    let cancel = std::sync::atomic::AtomicBool::new(false);
    let halt = vcs.run(&cancel).unwrap();
    assert_eq!(halt, emu_vcs::HaltReason::CpuJammed);
}

#[test]
fn cancel_flag_stops_the_run() {
    let mut vcs = vcs_with(&[0x4C, 0x00, 0xF0]); // JMP self
    let cancel = std::sync::atomic::AtomicBool::new(true);
    let halt = vcs.run(&cancel).unwrap();
    assert_eq!(halt, emu_vcs::HaltReason::Cancelled);
}

#[test]
fn observable_queries() {
    let vcs = vcs_with(&[]);
    assert_eq!(vcs.query("cpu.pc"), Some(0xF000u16.into()));
    assert_eq!(vcs.query("cartridge.id"), Some("4K".into()));
    assert!(vcs.query("tia.hsync").is_some());
    assert!(vcs.query("nonsense").is_none());
}

#[test]
fn patch_reaches_the_rom() {
    let mut vcs = vcs_with(&[]);
    vcs.patch(0x123, 0xAB).unwrap();
    use emu_core::Bus;
    assert_eq!(vcs.bus.read(0x1123).data, 0xAB);
    assert!(vcs.patch(0x5000, 0).is_err());
}
