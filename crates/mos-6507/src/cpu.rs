//! 6507 CPU implementation.
//!
//! Cycle-accurate: each internal cycle performs exactly one bus access.
//! Instructions are broken into their component cycles, so the machine can
//! be clocked after every bus state — including between the read and the
//! dummy write of a read-modify-write instruction, which the TIA observes.
//!
//! The 6507 is a 6502 in a small package: no IRQ or NMI pins (BRK still
//! works), thirteen address lines, and the RDY pin wired to the TIA's
//! WSYNC latch. RDY is sampled from the bus before an opcode fetch; while
//! it is low the CPU performs no work.

use emu_core::{Bus, Observable, Value};

use crate::flags::{C, D, I, N, V, Z};
use crate::{Registers, Status};

/// Internal execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// About to fetch an opcode.
    FetchOpcode,
    /// Executing instruction cycles.
    Execute,
    /// A JAM opcode halted the CPU.
    Stopped,
}

/// Result of one completed instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionResult {
    /// Address the opcode was fetched from.
    pub address: u16,
    pub opcode: u8,
    /// Cycles consumed, including any RDY-stalled cycles.
    pub cycles: u32,
    pub page_crossed: bool,
    pub branch_taken: bool,
}

/// The MOS 6507.
#[derive(Debug, Clone)]
pub struct Mos6507 {
    pub regs: Registers,

    state: State,
    opcode: u8,
    /// Cycle within the current instruction (0 = opcode fetch).
    pub(crate) cycle: u8,
    /// Effective-address scratch register.
    pub(crate) addr: u16,
    /// Data scratch register.
    pub(crate) data: u8,
    /// Zero-page pointer scratch register.
    pub(crate) pointer: u8,

    pub(crate) page_crossed: bool,
    pub(crate) branch_taken: bool,

    total_cycles: u64,
}

impl Default for Mos6507 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mos6507 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            state: State::FetchOpcode,
            opcode: 0,
            cycle: 0,
            addr: 0,
            data: 0,
            pointer: 0,
            page_crossed: false,
            branch_taken: false,
            total_cycles: 0,
        }
    }

    /// Reset: clear registers and load PC from the vector at $FFFC.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.state = State::FetchOpcode;
        self.cycle = 0;
        let lo = bus.read(0xFFFC).data;
        let hi = bus.read(0xFFFD).data;
        self.regs.pc = u16::from(lo) | u16::from(hi) << 8;
    }

    /// Scramble A, X, Y, S and the flags from a seed. Used for the
    /// randomised power-on option; PC is untouched.
    pub fn randomize_registers(&mut self, seed: u64) {
        let mut s = seed | 1;
        let mut next = || {
            // xorshift64
            s ^= s << 13;
            s ^= s >> 7;
            s ^= s << 17;
            (s >> 32) as u8
        };
        self.regs.a = next();
        self.regs.x = next();
        self.regs.y = next();
        self.regs.s = next();
        self.regs.p = Status::from_byte(next() | I);
    }

    /// True when the CPU sits at an instruction boundary.
    #[must_use]
    pub fn at_boundary(&self) -> bool {
        self.state == State::FetchOpcode
    }

    /// True after a JAM opcode.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == State::Stopped
    }

    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Execute one complete instruction, invoking `on_cycle` after every
    /// bus cycle. RDY-stalled cycles keep invoking the callback, so the
    /// rest of the machine ticks on while the CPU waits.
    pub fn execute_instruction<B: Bus>(
        &mut self,
        bus: &mut B,
        mut on_cycle: impl FnMut(&mut B),
    ) -> InstructionResult {
        let mut cycles: u32 = 0;
        let mut fetched = false;
        let mut address = self.regs.pc;
        self.page_crossed = false;
        self.branch_taken = false;

        loop {
            let at_fetch = self.state == State::FetchOpcode;
            if at_fetch {
                address = self.regs.pc;
            }
            let worked = self.tick(bus);
            on_cycle(bus);
            cycles += 1;

            if at_fetch && worked {
                fetched = true;
            }
            if self.state == State::Stopped {
                break;
            }
            if fetched && self.state == State::FetchOpcode {
                break;
            }
        }

        InstructionResult {
            address,
            opcode: self.opcode,
            cycles,
            page_crossed: self.page_crossed,
            branch_taken: self.branch_taken,
        }
    }

    /// Advance one CPU cycle. Returns false when the cycle was an RDY
    /// stall (no work performed).
    pub fn tick<B: Bus>(&mut self, bus: &mut B) -> bool {
        self.total_cycles += 1;

        match self.state {
            State::FetchOpcode => {
                // RDY is sampled before the fetch; writes in progress are
                // never stalled (the 6502 only honours RDY on reads)
                if !bus.rdy() {
                    return false;
                }
                self.opcode = bus.read(self.regs.pc).data;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 1;
                self.state = State::Execute;
                true
            }
            State::Execute => {
                self.execute_cycle(bus);
                true
            }
            State::Stopped => {
                let _ = bus.read(self.regs.pc);
                true
            }
        }
    }

    pub(crate) fn finish(&mut self) {
        self.state = State::FetchOpcode;
        self.cycle = 0;
    }

    #[allow(clippy::too_many_lines)]
    fn execute_cycle<B: Bus>(&mut self, bus: &mut B) {
        match self.opcode {
            0x00 => self.op_brk(bus),
            0x01 => self.addr_izx(bus, Self::do_ora),
            0x03 => self.addr_izx_rmw(bus, Self::do_slo),
            0x05 => self.addr_zp(bus, Self::do_ora),
            0x06 => self.addr_zp_rmw(bus, Self::do_asl),
            0x07 => self.addr_zp_rmw(bus, Self::do_slo),
            0x08 => self.op_php(bus),
            0x09 => self.addr_imm(bus, Self::do_ora),
            0x0A => self.op_implied(bus, |cpu| cpu.regs.a = cpu.do_asl(cpu.regs.a)),
            0x0B | 0x2B => self.addr_imm(bus, Self::do_anc),
            0x0D => self.addr_abs(bus, Self::do_ora),
            0x0E => self.addr_abs_rmw(bus, Self::do_asl),
            0x0F => self.addr_abs_rmw(bus, Self::do_slo),

            0x10 => self.op_branch(bus, !self.regs.p.is_set(N)),
            0x11 => self.addr_izy(bus, Self::do_ora),
            0x13 => self.addr_izy_rmw(bus, Self::do_slo),
            0x15 => self.addr_zpx(bus, Self::do_ora),
            0x16 => self.addr_zpx_rmw(bus, Self::do_asl),
            0x17 => self.addr_zpx_rmw(bus, Self::do_slo),
            0x18 => self.op_flag(bus, C, false),
            0x19 => self.addr_aby(bus, Self::do_ora),
            0x1B => self.addr_aby_rmw(bus, Self::do_slo),
            0x1D => self.addr_abx(bus, Self::do_ora),
            0x1E => self.addr_abx_rmw(bus, Self::do_asl),
            0x1F => self.addr_abx_rmw(bus, Self::do_slo),

            0x20 => self.op_jsr(bus),
            0x21 => self.addr_izx(bus, Self::do_and),
            0x23 => self.addr_izx_rmw(bus, Self::do_rla),
            0x24 => self.addr_zp(bus, Self::do_bit),
            0x25 => self.addr_zp(bus, Self::do_and),
            0x26 => self.addr_zp_rmw(bus, Self::do_rol),
            0x27 => self.addr_zp_rmw(bus, Self::do_rla),
            0x28 => self.op_plp(bus),
            0x29 => self.addr_imm(bus, Self::do_and),
            0x2A => self.op_implied(bus, |cpu| cpu.regs.a = cpu.do_rol(cpu.regs.a)),
            0x2C => self.addr_abs(bus, Self::do_bit),
            0x2D => self.addr_abs(bus, Self::do_and),
            0x2E => self.addr_abs_rmw(bus, Self::do_rol),
            0x2F => self.addr_abs_rmw(bus, Self::do_rla),

            0x30 => self.op_branch(bus, self.regs.p.is_set(N)),
            0x31 => self.addr_izy(bus, Self::do_and),
            0x33 => self.addr_izy_rmw(bus, Self::do_rla),
            0x35 => self.addr_zpx(bus, Self::do_and),
            0x36 => self.addr_zpx_rmw(bus, Self::do_rol),
            0x37 => self.addr_zpx_rmw(bus, Self::do_rla),
            0x38 => self.op_flag(bus, C, true),
            0x39 => self.addr_aby(bus, Self::do_and),
            0x3B => self.addr_aby_rmw(bus, Self::do_rla),
            0x3D => self.addr_abx(bus, Self::do_and),
            0x3E => self.addr_abx_rmw(bus, Self::do_rol),
            0x3F => self.addr_abx_rmw(bus, Self::do_rla),

            0x40 => self.op_rti(bus),
            0x41 => self.addr_izx(bus, Self::do_eor),
            0x43 => self.addr_izx_rmw(bus, Self::do_sre),
            0x45 => self.addr_zp(bus, Self::do_eor),
            0x46 => self.addr_zp_rmw(bus, Self::do_lsr),
            0x47 => self.addr_zp_rmw(bus, Self::do_sre),
            0x48 => self.op_pha(bus),
            0x49 => self.addr_imm(bus, Self::do_eor),
            0x4A => self.op_implied(bus, |cpu| cpu.regs.a = cpu.do_lsr(cpu.regs.a)),
            0x4B => self.addr_imm(bus, Self::do_alr),
            0x4C => self.op_jmp_abs(bus),
            0x4D => self.addr_abs(bus, Self::do_eor),
            0x4E => self.addr_abs_rmw(bus, Self::do_lsr),
            0x4F => self.addr_abs_rmw(bus, Self::do_sre),

            0x50 => self.op_branch(bus, !self.regs.p.is_set(V)),
            0x51 => self.addr_izy(bus, Self::do_eor),
            0x53 => self.addr_izy_rmw(bus, Self::do_sre),
            0x55 => self.addr_zpx(bus, Self::do_eor),
            0x56 => self.addr_zpx_rmw(bus, Self::do_lsr),
            0x57 => self.addr_zpx_rmw(bus, Self::do_sre),
            0x58 => self.op_flag(bus, I, false),
            0x59 => self.addr_aby(bus, Self::do_eor),
            0x5B => self.addr_aby_rmw(bus, Self::do_sre),
            0x5D => self.addr_abx(bus, Self::do_eor),
            0x5E => self.addr_abx_rmw(bus, Self::do_lsr),
            0x5F => self.addr_abx_rmw(bus, Self::do_sre),

            0x60 => self.op_rts(bus),
            0x61 => self.addr_izx(bus, Self::do_adc),
            0x63 => self.addr_izx_rmw(bus, Self::do_rra),
            0x65 => self.addr_zp(bus, Self::do_adc),
            0x66 => self.addr_zp_rmw(bus, Self::do_ror),
            0x67 => self.addr_zp_rmw(bus, Self::do_rra),
            0x68 => self.op_pla(bus),
            0x69 => self.addr_imm(bus, Self::do_adc),
            0x6A => self.op_implied(bus, |cpu| cpu.regs.a = cpu.do_ror(cpu.regs.a)),
            0x6B => self.addr_imm(bus, Self::do_arr),
            0x6C => self.op_jmp_ind(bus),
            0x6D => self.addr_abs(bus, Self::do_adc),
            0x6E => self.addr_abs_rmw(bus, Self::do_ror),
            0x6F => self.addr_abs_rmw(bus, Self::do_rra),

            0x70 => self.op_branch(bus, self.regs.p.is_set(V)),
            0x71 => self.addr_izy(bus, Self::do_adc),
            0x73 => self.addr_izy_rmw(bus, Self::do_rra),
            0x75 => self.addr_zpx(bus, Self::do_adc),
            0x76 => self.addr_zpx_rmw(bus, Self::do_ror),
            0x77 => self.addr_zpx_rmw(bus, Self::do_rra),
            0x78 => self.op_flag(bus, I, true),
            0x79 => self.addr_aby(bus, Self::do_adc),
            0x7B => self.addr_aby_rmw(bus, Self::do_rra),
            0x7D => self.addr_abx(bus, Self::do_adc),
            0x7E => self.addr_abx_rmw(bus, Self::do_ror),
            0x7F => self.addr_abx_rmw(bus, Self::do_rra),

            0x81 => self.addr_izx_w(bus, |cpu| cpu.regs.a),
            0x83 => self.addr_izx_w(bus, |cpu| cpu.regs.a & cpu.regs.x),
            0x84 => self.addr_zp_w(bus, |cpu| cpu.regs.y),
            0x85 => self.addr_zp_w(bus, |cpu| cpu.regs.a),
            0x86 => self.addr_zp_w(bus, |cpu| cpu.regs.x),
            0x87 => self.addr_zp_w(bus, |cpu| cpu.regs.a & cpu.regs.x),
            0x88 => self.op_implied(bus, |cpu| {
                cpu.regs.y = cpu.regs.y.wrapping_sub(1);
                cpu.regs.p.update_nz(cpu.regs.y);
            }),
            0x8A => self.op_implied(bus, |cpu| {
                cpu.regs.a = cpu.regs.x;
                cpu.regs.p.update_nz(cpu.regs.a);
            }),
            0x8C => self.addr_abs_w(bus, |cpu| cpu.regs.y),
            0x8D => self.addr_abs_w(bus, |cpu| cpu.regs.a),
            0x8E => self.addr_abs_w(bus, |cpu| cpu.regs.x),
            0x8F => self.addr_abs_w(bus, |cpu| cpu.regs.a & cpu.regs.x),

            0x90 => self.op_branch(bus, !self.regs.p.is_set(C)),
            0x91 => self.addr_izy_w(bus, |cpu| cpu.regs.a),
            0x94 => self.addr_zpx_w(bus, |cpu| cpu.regs.y),
            0x95 => self.addr_zpx_w(bus, |cpu| cpu.regs.a),
            0x96 => self.addr_zpy_w(bus, |cpu| cpu.regs.x),
            0x97 => self.addr_zpy_w(bus, |cpu| cpu.regs.a & cpu.regs.x),
            0x98 => self.op_implied(bus, |cpu| {
                cpu.regs.a = cpu.regs.y;
                cpu.regs.p.update_nz(cpu.regs.a);
            }),
            0x99 => self.addr_aby_w(bus, |cpu| cpu.regs.a),
            0x9A => self.op_implied(bus, |cpu| cpu.regs.s = cpu.regs.x),
            0x9D => self.addr_abx_w(bus, |cpu| cpu.regs.a),

            0xA0 => self.addr_imm(bus, Self::do_ldy),
            0xA1 => self.addr_izx(bus, Self::do_lda),
            0xA2 => self.addr_imm(bus, Self::do_ldx),
            0xA3 => self.addr_izx(bus, Self::do_lax),
            0xA4 => self.addr_zp(bus, Self::do_ldy),
            0xA5 => self.addr_zp(bus, Self::do_lda),
            0xA6 => self.addr_zp(bus, Self::do_ldx),
            0xA7 => self.addr_zp(bus, Self::do_lax),
            0xA8 => self.op_implied(bus, |cpu| {
                cpu.regs.y = cpu.regs.a;
                cpu.regs.p.update_nz(cpu.regs.y);
            }),
            0xA9 => self.addr_imm(bus, Self::do_lda),
            0xAA => self.op_implied(bus, |cpu| {
                cpu.regs.x = cpu.regs.a;
                cpu.regs.p.update_nz(cpu.regs.x);
            }),
            0xAB => self.addr_imm(bus, Self::do_lax),
            0xAC => self.addr_abs(bus, Self::do_ldy),
            0xAD => self.addr_abs(bus, Self::do_lda),
            0xAE => self.addr_abs(bus, Self::do_ldx),
            0xAF => self.addr_abs(bus, Self::do_lax),

            0xB0 => self.op_branch(bus, self.regs.p.is_set(C)),
            0xB1 => self.addr_izy(bus, Self::do_lda),
            0xB3 => self.addr_izy(bus, Self::do_lax),
            0xB4 => self.addr_zpx(bus, Self::do_ldy),
            0xB5 => self.addr_zpx(bus, Self::do_lda),
            0xB6 => self.addr_zpy(bus, Self::do_ldx),
            0xB7 => self.addr_zpy(bus, Self::do_lax),
            0xB8 => self.op_flag(bus, V, false),
            0xB9 => self.addr_aby(bus, Self::do_lda),
            0xBA => self.op_implied(bus, |cpu| {
                cpu.regs.x = cpu.regs.s;
                cpu.regs.p.update_nz(cpu.regs.x);
            }),
            0xBC => self.addr_abx(bus, Self::do_ldy),
            0xBD => self.addr_abx(bus, Self::do_lda),
            0xBE => self.addr_aby(bus, Self::do_ldx),
            0xBF => self.addr_aby(bus, Self::do_lax),

            0xC0 => self.addr_imm(bus, Self::do_cpy),
            0xC1 => self.addr_izx(bus, Self::do_cmp),
            0xC3 => self.addr_izx_rmw(bus, Self::do_dcp),
            0xC4 => self.addr_zp(bus, Self::do_cpy),
            0xC5 => self.addr_zp(bus, Self::do_cmp),
            0xC6 => self.addr_zp_rmw(bus, Self::do_dec),
            0xC7 => self.addr_zp_rmw(bus, Self::do_dcp),
            0xC8 => self.op_implied(bus, |cpu| {
                cpu.regs.y = cpu.regs.y.wrapping_add(1);
                cpu.regs.p.update_nz(cpu.regs.y);
            }),
            0xC9 => self.addr_imm(bus, Self::do_cmp),
            0xCA => self.op_implied(bus, |cpu| {
                cpu.regs.x = cpu.regs.x.wrapping_sub(1);
                cpu.regs.p.update_nz(cpu.regs.x);
            }),
            0xCB => self.addr_imm(bus, Self::do_sbx),
            0xCC => self.addr_abs(bus, Self::do_cpy),
            0xCD => self.addr_abs(bus, Self::do_cmp),
            0xCE => self.addr_abs_rmw(bus, Self::do_dec),
            0xCF => self.addr_abs_rmw(bus, Self::do_dcp),

            0xD0 => self.op_branch(bus, !self.regs.p.is_set(Z)),
            0xD1 => self.addr_izy(bus, Self::do_cmp),
            0xD3 => self.addr_izy_rmw(bus, Self::do_dcp),
            0xD5 => self.addr_zpx(bus, Self::do_cmp),
            0xD6 => self.addr_zpx_rmw(bus, Self::do_dec),
            0xD7 => self.addr_zpx_rmw(bus, Self::do_dcp),
            0xD8 => self.op_flag(bus, D, false),
            0xD9 => self.addr_aby(bus, Self::do_cmp),
            0xDB => self.addr_aby_rmw(bus, Self::do_dcp),
            0xDD => self.addr_abx(bus, Self::do_cmp),
            0xDE => self.addr_abx_rmw(bus, Self::do_dec),
            0xDF => self.addr_abx_rmw(bus, Self::do_dcp),

            0xE0 => self.addr_imm(bus, Self::do_cpx),
            0xE1 => self.addr_izx(bus, Self::do_sbc),
            0xE3 => self.addr_izx_rmw(bus, Self::do_isc),
            0xE4 => self.addr_zp(bus, Self::do_cpx),
            0xE5 => self.addr_zp(bus, Self::do_sbc),
            0xE6 => self.addr_zp_rmw(bus, Self::do_inc),
            0xE7 => self.addr_zp_rmw(bus, Self::do_isc),
            0xE8 => self.op_implied(bus, |cpu| {
                cpu.regs.x = cpu.regs.x.wrapping_add(1);
                cpu.regs.p.update_nz(cpu.regs.x);
            }),
            0xE9 | 0xEB => self.addr_imm(bus, Self::do_sbc),
            0xEC => self.addr_abs(bus, Self::do_cpx),
            0xED => self.addr_abs(bus, Self::do_sbc),
            0xEE => self.addr_abs_rmw(bus, Self::do_inc),
            0xEF => self.addr_abs_rmw(bus, Self::do_isc),

            0xF0 => self.op_branch(bus, self.regs.p.is_set(Z)),
            0xF1 => self.addr_izy(bus, Self::do_sbc),
            0xF3 => self.addr_izy_rmw(bus, Self::do_isc),
            0xF5 => self.addr_zpx(bus, Self::do_sbc),
            0xF6 => self.addr_zpx_rmw(bus, Self::do_inc),
            0xF7 => self.addr_zpx_rmw(bus, Self::do_isc),
            0xF8 => self.op_flag(bus, D, true),
            0xF9 => self.addr_aby(bus, Self::do_sbc),
            0xFB => self.addr_aby_rmw(bus, Self::do_isc),
            0xFD => self.addr_abx(bus, Self::do_sbc),
            0xFE => self.addr_abx_rmw(bus, Self::do_inc),
            0xFF => self.addr_abx_rmw(bus, Self::do_isc),

            // single-byte NOPs (documented EA plus the illegal variants)
            0xEA | 0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => self.op_implied(bus, |_| {}),

            // multi-byte NOPs; the operand reads happen with their usual
            // timing and side effects
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 | 0x8B => self.addr_imm(bus, Self::do_nop_read),
            0x04 | 0x44 | 0x64 => self.addr_zp(bus, Self::do_nop_read),
            0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => self.addr_zpx(bus, Self::do_nop_read),
            0x0C => self.addr_abs(bus, Self::do_nop_read),
            0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => self.addr_abx(bus, Self::do_nop_read),

            // unstable high-address stores, modelled as reads so memory is
            // never corrupted by behaviour no two chips agree on
            0x9B | 0x9E | 0x9F | 0xBB => self.addr_aby(bus, Self::do_nop_read),
            0x9C => self.addr_abx(bus, Self::do_nop_read),
            0x93 => self.addr_izy(bus, Self::do_nop_read),

            // JAM: the CPU is wedged until reset
            0x02 | 0x12 | 0x22 | 0x32 | 0x42 | 0x52 | 0x62 | 0x72 | 0x92 | 0xB2 | 0xD2
            | 0xF2 => self.op_jam(bus),
        }
    }

    // ------------------------------------------------------------------
    // control-flow and single-cycle operations
    // ------------------------------------------------------------------

    fn op_implied<B: Bus>(&mut self, bus: &mut B, op: fn(&mut Self)) {
        // one dummy read of the next opcode byte
        let _ = bus.read(self.regs.pc);
        op(self);
        self.finish();
    }

    fn op_flag<B: Bus>(&mut self, bus: &mut B, flag: u8, set: bool) {
        let _ = bus.read(self.regs.pc);
        self.regs.p.set_if(flag, set);
        self.finish();
    }

    fn op_jam<B: Bus>(&mut self, bus: &mut B) {
        let _ = bus.read(self.regs.pc);
        self.state = State::Stopped;
    }

    fn op_branch<B: Bus>(&mut self, bus: &mut B, condition: bool) {
        match self.cycle {
            1 => {
                self.data = bus.read(self.regs.pc).data;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                if condition {
                    self.branch_taken = true;
                    self.cycle = 2;
                } else {
                    self.finish();
                }
            }
            2 => {
                // dummy fetch of the following opcode
                let _ = bus.read(self.regs.pc);
                let target = self.regs.pc.wrapping_add(i16::from(self.data as i8) as u16);
                if target & 0xFF00 == self.regs.pc & 0xFF00 {
                    self.regs.pc = target;
                    self.finish();
                } else {
                    self.page_crossed = true;
                    // PCL is updated first; PCH is fixed on the next cycle
                    self.addr = target;
                    self.regs.pc = self.regs.pc & 0xFF00 | target & 0x00FF;
                    self.cycle = 3;
                }
            }
            _ => {
                let _ = bus.read(self.regs.pc);
                self.regs.pc = self.addr;
                self.finish();
            }
        }
    }

    fn op_jsr<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.addr = u16::from(bus.read(self.regs.pc).data);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                let _ = bus.read(self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => {
                let push = self.regs.push();
                bus.write(push, (self.regs.pc >> 8) as u8);
                self.cycle = 4;
            }
            4 => {
                let push = self.regs.push();
                bus.write(push, (self.regs.pc & 0xFF) as u8);
                self.cycle = 5;
            }
            _ => {
                self.addr |= u16::from(bus.read(self.regs.pc).data) << 8;
                self.regs.pc = self.addr;
                self.finish();
            }
        }
    }

    fn op_rts<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                let _ = bus.read(self.regs.pc);
                self.cycle = 2;
            }
            2 => {
                let _ = bus.read(self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => {
                let pop = self.regs.pop();
                self.addr = u16::from(bus.read(pop).data);
                self.cycle = 4;
            }
            4 => {
                let pop = self.regs.pop();
                self.addr |= u16::from(bus.read(pop).data) << 8;
                self.regs.pc = self.addr;
                self.cycle = 5;
            }
            _ => {
                let _ = bus.read(self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.finish();
            }
        }
    }

    fn op_rti<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                let _ = bus.read(self.regs.pc);
                self.cycle = 2;
            }
            2 => {
                let _ = bus.read(self.regs.stack_addr());
                self.cycle = 3;
            }
            3 => {
                let pop = self.regs.pop();
                self.regs.p = Status::from_byte(bus.read(pop).data);
                self.cycle = 4;
            }
            4 => {
                let pop = self.regs.pop();
                self.addr = u16::from(bus.read(pop).data);
                self.cycle = 5;
            }
            _ => {
                let pop = self.regs.pop();
                self.addr |= u16::from(bus.read(pop).data) << 8;
                self.regs.pc = self.addr;
                self.finish();
            }
        }
    }

    /// BRK. The 6507 has no interrupt pins but the software interrupt is
    /// fully functional and uses the vector at $FFFE.
    fn op_brk<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                // padding byte
                let _ = bus.read(self.regs.pc);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                let push = self.regs.push();
                bus.write(push, (self.regs.pc >> 8) as u8);
                self.cycle = 3;
            }
            3 => {
                let push = self.regs.push();
                bus.write(push, (self.regs.pc & 0xFF) as u8);
                self.cycle = 4;
            }
            4 => {
                let push = self.regs.push();
                bus.write(push, self.regs.p.to_byte_brk());
                self.regs.p.set(I);
                self.cycle = 5;
            }
            5 => {
                self.addr = u16::from(bus.read(0xFFFE).data);
                self.cycle = 6;
            }
            _ => {
                self.addr |= u16::from(bus.read(0xFFFF).data) << 8;
                self.regs.pc = self.addr;
                self.finish();
            }
        }
    }

    fn op_jmp_abs<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.addr = u16::from(bus.read(self.regs.pc).data);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            _ => {
                self.addr |= u16::from(bus.read(self.regs.pc).data) << 8;
                self.regs.pc = self.addr;
                self.finish();
            }
        }
    }

    fn op_jmp_ind<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                self.addr = u16::from(bus.read(self.regs.pc).data);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 2;
            }
            2 => {
                self.addr |= u16::from(bus.read(self.regs.pc).data) << 8;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                self.cycle = 3;
            }
            3 => {
                self.data = bus.read(self.addr).data;
                self.cycle = 4;
            }
            _ => {
                // the pointer high byte never crosses a page (6502 bug)
                let hi_addr = self.addr & 0xFF00 | u16::from((self.addr as u8).wrapping_add(1));
                self.regs.pc = u16::from(bus.read(hi_addr).data) << 8 | u16::from(self.data);
                self.finish();
            }
        }
    }

    fn op_pha<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                let _ = bus.read(self.regs.pc);
                self.cycle = 2;
            }
            _ => {
                let push = self.regs.push();
                bus.write(push, self.regs.a);
                self.finish();
            }
        }
    }

    fn op_php<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                let _ = bus.read(self.regs.pc);
                self.cycle = 2;
            }
            _ => {
                let push = self.regs.push();
                bus.write(push, self.regs.p.to_byte_brk());
                self.finish();
            }
        }
    }

    fn op_pla<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                let _ = bus.read(self.regs.pc);
                self.cycle = 2;
            }
            2 => {
                let _ = bus.read(self.regs.stack_addr());
                self.cycle = 3;
            }
            _ => {
                let pop = self.regs.pop();
                self.regs.a = bus.read(pop).data;
                self.regs.p.update_nz(self.regs.a);
                self.finish();
            }
        }
    }

    fn op_plp<B: Bus>(&mut self, bus: &mut B) {
        match self.cycle {
            1 => {
                let _ = bus.read(self.regs.pc);
                self.cycle = 2;
            }
            2 => {
                let _ = bus.read(self.regs.stack_addr());
                self.cycle = 3;
            }
            _ => {
                let pop = self.regs.pop();
                self.regs.p = Status::from_byte(bus.read(pop).data);
                self.finish();
            }
        }
    }
}

impl Observable for Mos6507 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" => Some(self.regs.s.into()),
            "pc" => Some(self.regs.pc.into()),
            "p" => Some(self.regs.p.to_byte().into()),
            "flags.n" => Some(self.regs.p.is_set(N).into()),
            "flags.v" => Some(self.regs.p.is_set(V).into()),
            "flags.d" => Some(self.regs.p.is_set(D).into()),
            "flags.i" => Some(self.regs.p.is_set(I).into()),
            "flags.z" => Some(self.regs.p.is_set(Z).into()),
            "flags.c" => Some(self.regs.p.is_set(C).into()),
            "total_cycles" => Some(self.total_cycles.into()),
            "stopped" => Some(self.is_stopped().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "a",
            "x",
            "y",
            "s",
            "pc",
            "p",
            "flags.n",
            "flags.v",
            "flags.d",
            "flags.i",
            "flags.z",
            "flags.c",
            "total_cycles",
            "stopped",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::{Area, ReadResult};

    /// Flat 64K test memory recording every bus access.
    struct TestBus {
        ram: Vec<u8>,
        rdy: bool,
        accesses: Vec<(u16, bool, u8)>,
    }

    impl TestBus {
        fn new() -> Self {
            Self {
                ram: vec![0; 0x10000],
                rdy: true,
                accesses: Vec::new(),
            }
        }

        fn load(&mut self, addr: u16, bytes: &[u8]) {
            let addr = addr as usize;
            self.ram[addr..addr + bytes.len()].copy_from_slice(bytes);
        }
    }

    impl Bus for TestBus {
        fn read(&mut self, address: u16) -> ReadResult {
            let data = self.ram[address as usize];
            self.accesses.push((address, false, data));
            ReadResult::new(data, address, Area::Cartridge)
        }

        fn write(&mut self, address: u16, value: u8) {
            self.accesses.push((address, true, value));
            self.ram[address as usize] = value;
        }

        fn rdy(&self) -> bool {
            self.rdy
        }
    }

    fn run_one(bus: &mut TestBus, at: u16, bytes: &[u8]) -> (Mos6507, InstructionResult) {
        bus.load(at, bytes);
        let mut cpu = Mos6507::new();
        cpu.regs.pc = at;
        let result = cpu.execute_instruction(bus, |_| {});
        (cpu, result)
    }

    #[test]
    fn lda_immediate() {
        let mut bus = TestBus::new();
        let (cpu, result) = run_one(&mut bus, 0xF000, &[0xA9, 0x42]);
        assert_eq!(cpu.regs.a, 0x42);
        assert_eq!(result.cycles, 2);
        assert!(!cpu.regs.p.is_set(Z));
        assert!(!cpu.regs.p.is_set(N));
    }

    #[test]
    fn lda_sets_zero_and_negative() {
        let mut bus = TestBus::new();
        let (cpu, _) = run_one(&mut bus, 0xF000, &[0xA9, 0x00]);
        assert!(cpu.regs.p.is_set(Z));

        let mut bus = TestBus::new();
        let (cpu, _) = run_one(&mut bus, 0xF000, &[0xA9, 0x80]);
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn sta_zero_page() {
        let mut bus = TestBus::new();
        bus.load(0xF000, &[0xA9, 0x55, 0x85, 0x10]);
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        cpu.execute_instruction(&mut bus, |_| {});
        let result = cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(result.cycles, 3);
        assert_eq!(bus.ram[0x10], 0x55);
    }

    #[test]
    fn absolute_x_page_cross_costs_a_cycle() {
        let mut bus = TestBus::new();
        bus.ram[0xF130] = 0x99;
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        cpu.regs.x = 0x40;
        bus.load(0xF000, &[0xBD, 0xF0, 0xF0]); // LDA $F0F0,X
        let result = cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(cpu.regs.a, 0x99);
        assert_eq!(result.cycles, 5);
        assert!(result.page_crossed);
    }

    #[test]
    fn absolute_x_no_cross_is_four_cycles() {
        let mut bus = TestBus::new();
        bus.ram[0xF0F2] = 0x77;
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        cpu.regs.x = 0x02;
        bus.load(0xF000, &[0xBD, 0xF0, 0xF0]);
        let result = cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(cpu.regs.a, 0x77);
        assert_eq!(result.cycles, 4);
        assert!(!result.page_crossed);
    }

    #[test]
    fn branch_timing() {
        // BNE with Z clear (power-on flags): taken, same page
        let mut bus = TestBus::new();
        let (_, result) = run_one(&mut bus, 0xF000, &[0xD0, 0x10, 0xEA]);
        assert!(result.branch_taken);
        assert_eq!(result.cycles, 3);

        // BEQ with Z clear: not taken
        let mut bus = TestBus::new();
        let (_, result) = run_one(&mut bus, 0xF000, &[0xF0, 0x10]);
        assert!(!result.branch_taken);
        assert_eq!(result.cycles, 2);
    }

    #[test]
    fn branch_page_cross_costs_two() {
        let mut bus = TestBus::new();
        // BNE +0x70 from 0xF0F0: target 0xF162, crosses page
        let (cpu, result) = run_one(&mut bus, 0xF0F0, &[0xD0, 0x70]);
        assert!(result.branch_taken);
        assert!(result.page_crossed);
        assert_eq!(result.cycles, 4);
        assert_eq!(cpu.regs.pc, 0xF162);
    }

    #[test]
    fn rmw_performs_dummy_write() {
        let mut bus = TestBus::new();
        bus.ram[0x0010] = 0x41;
        let (_, result) = run_one(&mut bus, 0xF000, &[0xE6, 0x10]); // INC $10
        assert_eq!(result.cycles, 5);
        assert_eq!(bus.ram[0x0010], 0x42);
        // the unmodified value is written back before the result
        let writes: Vec<_> = bus
            .accesses
            .iter()
            .filter(|(_, w, _)| *w)
            .collect();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].2, 0x41);
        assert_eq!(writes[1].2, 0x42);
    }

    #[test]
    fn jsr_rts_round_trip() {
        let mut bus = TestBus::new();
        bus.load(0xF000, &[0x20, 0x20, 0xF1]); // JSR $F120
        bus.load(0xF120, &[0x60]); // RTS
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        let result = cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(result.cycles, 6);
        assert_eq!(cpu.regs.pc, 0xF120);
        let result = cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(result.cycles, 6);
        assert_eq!(cpu.regs.pc, 0xF003);
    }

    #[test]
    fn jmp_indirect_page_wrap_bug() {
        let mut bus = TestBus::new();
        bus.ram[0x02FF] = 0x34;
        bus.ram[0x0200] = 0x12; // high byte read from $0200, not $0300
        bus.ram[0x0300] = 0x56;
        let (cpu, result) = run_one(&mut bus, 0xF000, &[0x6C, 0xFF, 0x02]);
        assert_eq!(result.cycles, 5);
        assert_eq!(cpu.regs.pc, 0x1234);
    }

    #[test]
    fn adc_binary_overflow() {
        let mut bus = TestBus::new();
        bus.load(0xF000, &[0xA9, 0x50, 0x69, 0x50]); // LDA #$50; ADC #$50
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        cpu.execute_instruction(&mut bus, |_| {});
        cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(cpu.regs.a, 0xA0);
        assert!(cpu.regs.p.is_set(V));
        assert!(cpu.regs.p.is_set(N));
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn adc_decimal_mode() {
        let mut bus = TestBus::new();
        // SED; LDA #$19; ADC #$01 -> $20 in BCD
        bus.load(0xF000, &[0xF8, 0xA9, 0x19, 0x69, 0x01]);
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        for _ in 0..3 {
            cpu.execute_instruction(&mut bus, |_| {});
        }
        assert_eq!(cpu.regs.a, 0x20);
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn sbc_decimal_mode() {
        let mut bus = TestBus::new();
        // SED; SEC; LDA #$20; SBC #$01 -> $19 in BCD
        bus.load(0xF000, &[0xF8, 0x38, 0xA9, 0x20, 0xE9, 0x01]);
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        for _ in 0..4 {
            cpu.execute_instruction(&mut bus, |_| {});
        }
        assert_eq!(cpu.regs.a, 0x19);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn lax_loads_both_registers() {
        let mut bus = TestBus::new();
        bus.ram[0x0010] = 0x5A;
        let (cpu, _) = run_one(&mut bus, 0xF000, &[0xA7, 0x10]); // LAX $10
        assert_eq!(cpu.regs.a, 0x5A);
        assert_eq!(cpu.regs.x, 0x5A);
    }

    #[test]
    fn dcp_decrements_and_compares() {
        let mut bus = TestBus::new();
        bus.ram[0x0010] = 0x11;
        bus.load(0xF000, &[0xA9, 0x10, 0xC7, 0x10]); // LDA #$10; DCP $10
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        cpu.execute_instruction(&mut bus, |_| {});
        cpu.execute_instruction(&mut bus, |_| {});
        assert_eq!(bus.ram[0x0010], 0x10);
        assert!(cpu.regs.p.is_set(Z)); // A == memory after decrement
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn jam_stops_the_cpu() {
        let mut bus = TestBus::new();
        let (cpu, _) = run_one(&mut bus, 0xF000, &[0x02]);
        assert!(cpu.is_stopped());
    }

    #[test]
    fn reset_loads_vector() {
        let mut bus = TestBus::new();
        bus.ram[0xFFFC] = 0x00;
        bus.ram[0xFFFD] = 0xF0;
        let mut cpu = Mos6507::new();
        cpu.regs.a = 0xAA;
        cpu.reset(&mut bus);
        assert_eq!(cpu.regs.pc, 0xF000);
        assert_eq!(cpu.regs.a, 0);
    }

    #[test]
    fn rdy_low_stalls_fetch() {
        let mut bus = TestBus::new();
        bus.load(0xF000, &[0xA9, 0x42]);
        bus.rdy = false;
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        let mut stalls = 0;
        let result = cpu.execute_instruction(&mut bus, |b| {
            stalls += 1;
            if stalls == 10 {
                b.rdy = true;
            }
        });
        // ten stalled cycles, then the two-cycle LDA
        assert_eq!(result.cycles, 12);
        assert_eq!(cpu.regs.a, 0x42);
    }

    #[test]
    fn callback_sees_every_cycle() {
        let mut bus = TestBus::new();
        bus.load(0xF000, &[0xAD, 0x34, 0x12]); // LDA $1234
        let mut cpu = Mos6507::new();
        cpu.regs.pc = 0xF000;
        let mut ticks = 0;
        let result = cpu.execute_instruction(&mut bus, |_| ticks += 1);
        assert_eq!(ticks, result.cycles);
        assert_eq!(ticks, 4);
    }

    #[test]
    fn randomized_registers_are_deterministic() {
        let mut a = Mos6507::new();
        let mut b = Mos6507::new();
        a.randomize_registers(1234);
        b.randomize_registers(1234);
        assert_eq!(a.regs, b.regs);
    }
}
