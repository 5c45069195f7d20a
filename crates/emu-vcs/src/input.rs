//! Hand controllers and the console panel.
//!
//! Input reaches the emulated hardware through the chip registers: joystick
//! directions land in SWCHA, fire buttons and paddle charge in the TIA's
//! INPTx ports, panel switches in SWCHB. Events are strongly typed and
//! queued per port; the orchestrator drains the queues between
//! instructions.
//!
//! Each port tracks which device kind was exercised most recently and only
//! runs that device's physics — a paddle capacitor must not charge under a
//! joystick game, or its stray INPT values would confuse ROMs that probe
//! the ports.

use std::collections::VecDeque;
use std::fmt;

use atari_tia::Tia;
use mos_riot::Riot;

/// Joystick direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// An input event for a hand-controller port or the console panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Joystick { direction: Direction, pressed: bool },
    Fire { pressed: bool },
    /// Paddle position, 0.0 (full left) to 1.0 (full right).
    PaddleSet { position: f32 },
    PaddleFire { pressed: bool },
    KeypadDown { key: char },
    KeypadUp,
    PanelReset { pressed: bool },
    PanelSelect { pressed: bool },
    /// True for colour, false for black and white.
    PanelColor { color: bool },
    PanelDifficulty { right_player: bool, advanced: bool },
}

/// Input-layer errors: the emulation state is untouched when one is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Keypads only carry 0-9, '*' and '#'.
    InvalidKey(char),
    /// A panel event was sent to a hand-controller port.
    NotAPortEvent,
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::InvalidKey(key) => write!(f, "invalid keypad key ({key:?})"),
            InputError::NotAPortEvent => write!(f, "panel event sent to a controller port"),
        }
    }
}

impl std::error::Error for InputError {}

/// Which device a port serviced most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerKind {
    #[default]
    Joystick,
    Paddle,
    Keypad,
}

/// The rate at which the paddle capacitor charges: per colour clock, the
/// accumulator gains this much, and each time it reaches the paddle's
/// resistance the charge steps by one.
const PADDLE_SENSITIVITY: f32 = 0.01;

/// Per-port register wiring. The two ports share SWCHA, so each writes its
/// own nibble and preserves the other's.
#[derive(Debug, Clone, Copy)]
struct PortWiring {
    /// SWCHA bits to preserve when writing the joystick axis.
    axis_preserve: u8,
    /// Shift the axis nibble down for port 1.
    axis_shift: bool,
    /// INPT index of the fire button.
    fire_port: usize,
    /// INPT index of the paddle capacitor.
    paddle_port: usize,
    /// SWCHA bit of the paddle fire button (preserve mask).
    paddle_fire_preserve: u8,
    /// SWCHA row-select bits for the keypad.
    keypad_rows_shift: bool,
    /// INPT indices of the keypad columns.
    keypad_cols: [usize; 3],
}

const PORT_0: PortWiring = PortWiring {
    axis_preserve: 0x0F,
    axis_shift: false,
    fire_port: 4,
    paddle_port: 0,
    paddle_fire_preserve: 0x7F,
    keypad_rows_shift: false,
    keypad_cols: [0, 1, 4],
};

const PORT_1: PortWiring = PortWiring {
    axis_preserve: 0xF0,
    axis_shift: true,
    fire_port: 5,
    paddle_port: 1,
    paddle_fire_preserve: 0xBF,
    keypad_rows_shift: true,
    keypad_cols: [2, 3, 5],
};

/// One hand-controller port.
#[derive(Debug, Clone)]
pub struct HandController {
    wiring: PortWiring,
    which: ControllerKind,

    /// Joystick direction bits, active low, in the high nibble.
    axis: u8,
    /// Physical fire button state, tracked independently of the latch.
    fire: bool,
    /// VBLANK bit 6: fire buttons latch low.
    latched: bool,

    paddle_resistance: f32,
    paddle_charge: u8,
    paddle_ticks: f32,
    /// VBLANK bit 7: capacitor grounded.
    paddle_grounded: bool,

    key: Option<char>,

    /// Events queued by the host, drained at step boundaries.
    queue: EventQueue,
}

impl HandController {
    #[must_use]
    pub fn new(port: usize) -> Self {
        Self {
            wiring: if port == 0 { PORT_0 } else { PORT_1 },
            which: ControllerKind::Joystick,
            axis: 0xF0,
            fire: false,
            latched: false,
            paddle_resistance: 1.0,
            paddle_charge: 0,
            paddle_ticks: 0.0,
            paddle_grounded: false,
            key: None,
            queue: EventQueue::new(),
        }
    }

    /// Queue an event for the next step boundary.
    pub fn queue_event(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Take the next queued event.
    pub fn pop_event(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    #[must_use]
    pub fn kind(&self) -> ControllerKind {
        self.which
    }

    #[must_use]
    pub fn paddle_charge(&self) -> u8 {
        self.paddle_charge
    }

    /// Apply one event to the hardware registers.
    pub fn handle(
        &mut self,
        event: Event,
        riot: &mut Riot,
        tia: &mut Tia,
    ) -> Result<(), InputError> {
        match event {
            Event::Joystick { direction, pressed } => {
                self.which = ControllerKind::Joystick;
                let bit = match direction {
                    Direction::Up => 0x10,
                    Direction::Down => 0x20,
                    Direction::Left => 0x40,
                    Direction::Right => 0x80,
                };
                if pressed {
                    self.axis &= !bit;
                } else {
                    self.axis |= bit;
                }
                self.write_axis(riot);
            }

            Event::Fire { pressed } => {
                self.which = ControllerKind::Joystick;
                // remember the physical state: needed when the latch clears
                self.fire = pressed;
                if pressed {
                    tia.set_input(self.wiring.fire_port, 0x00);
                } else if !self.latched {
                    tia.set_input(self.wiring.fire_port, 0x80);
                }
            }

            Event::PaddleSet { position } => {
                self.which = ControllerKind::Paddle;
                self.paddle_resistance = 1.0 - position;
            }

            Event::PaddleFire { pressed } => {
                self.which = ControllerKind::Paddle;
                let value = if pressed { 0x00 } else { 0xFF };
                riot.set_port_a(value, self.wiring.paddle_fire_preserve);
            }

            Event::KeypadDown { key } => {
                if !matches!(key, '0'..='9' | '*' | '#') {
                    return Err(InputError::InvalidKey(key));
                }
                self.which = ControllerKind::Keypad;
                self.key = Some(key);
            }

            Event::KeypadUp => {
                self.which = ControllerKind::Keypad;
                self.key = None;
            }

            Event::PanelReset { .. }
            | Event::PanelSelect { .. }
            | Event::PanelColor { .. }
            | Event::PanelDifficulty { .. } => return Err(InputError::NotAPortEvent),
        }
        Ok(())
    }

    fn write_axis(&self, riot: &mut Riot) {
        let value = if self.wiring.axis_shift {
            self.axis >> 4
        } else {
            self.axis
        };
        riot.set_port_a(value, self.wiring.axis_preserve);
    }

    /// VBLANK input-control bits changed.
    pub fn vblank_bits(&mut self, ground_paddles: bool, latch_fire: bool, tia: &mut Tia) {
        if ground_paddles && self.which == ControllerKind::Paddle {
            self.paddle_charge = 0;
            self.paddle_ticks = 0.0;
            tia.set_input(self.wiring.paddle_port, 0);
        }
        self.paddle_grounded = ground_paddles;

        let was_latched = self.latched;
        self.latched = latch_fire;
        // releasing the latch lets an unpressed button read high again
        if was_latched && !latch_fire && !self.fire {
            tia.set_input(self.wiring.fire_port, 0x80);
        }
    }

    /// Per-colour-clock physics: the paddle capacitor charges through the
    /// player's potentiometer until it reads as logic one.
    pub fn recharge(&mut self, tia: &mut Tia) {
        if self.which != ControllerKind::Paddle || self.paddle_grounded {
            return;
        }
        if self.paddle_charge < 255 {
            self.paddle_ticks += PADDLE_SENSITIVITY;
            if self.paddle_ticks >= self.paddle_resistance {
                self.paddle_ticks = 0.0;
                self.paddle_charge += 1;
                tia.set_input(self.wiring.paddle_port, self.paddle_charge);
            }
        }
    }

    /// Resolve the keypad matrix against the row lines the ROM drives
    /// through SWCHA. Called once per CPU cycle.
    pub fn scan_keypad(&self, riot: &Riot, tia: &mut Tia) {
        if self.which != ControllerKind::Keypad {
            return;
        }

        let rows = if self.wiring.keypad_rows_shift {
            riot.port_a_driven() & 0x0F
        } else {
            riot.port_a_driven() >> 4
        };

        let pressed = self.key.and_then(key_position);

        for (col, &port) in self.wiring.keypad_cols.iter().enumerate() {
            let low = match pressed {
                // the column reads low when the key's row line is driven low
                Some((row, key_col)) if key_col == col && rows & (1 << row) == 0 => true,
                _ => false,
            };
            tia.set_input(port, if low { 0x00 } else { 0x80 });
        }
    }
}

/// Keypad matrix position of a key: (row, column).
fn key_position(key: char) -> Option<(usize, usize)> {
    let index = match key {
        '1' => 0,
        '2' => 1,
        '3' => 2,
        '4' => 3,
        '5' => 4,
        '6' => 5,
        '7' => 6,
        '8' => 7,
        '9' => 8,
        '*' => 9,
        '0' => 10,
        '#' => 11,
        _ => return None,
    };
    Some((index / 3, index % 3))
}

/// The console panel: reset, select, colour and difficulty switches on
/// SWCHB.
#[derive(Debug, Clone)]
pub struct Panel {
    reset: bool,
    select: bool,
    color: bool,
    left_difficulty: bool,
    right_difficulty: bool,

    queue: EventQueue,
}

impl Panel {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reset: false,
            select: false,
            color: true,
            left_difficulty: false,
            right_difficulty: false,
            queue: EventQueue::new(),
        }
    }

    /// Queue an event for the next step boundary.
    pub fn queue_event(&mut self, event: Event) {
        self.queue.push(event);
    }

    /// Take the next queued event.
    pub fn pop_event(&mut self) -> Option<Event> {
        self.queue.pop()
    }

    /// Apply a panel event. Non-panel events are rejected.
    pub fn handle(&mut self, event: Event, riot: &mut Riot) -> Result<(), InputError> {
        match event {
            Event::PanelReset { pressed } => self.reset = pressed,
            Event::PanelSelect { pressed } => self.select = pressed,
            Event::PanelColor { color } => self.color = color,
            Event::PanelDifficulty {
                right_player,
                advanced,
            } => {
                if right_player {
                    self.right_difficulty = advanced;
                } else {
                    self.left_difficulty = advanced;
                }
            }
            _ => return Err(InputError::NotAPortEvent),
        }
        self.write(riot);
        Ok(())
    }

    fn write(&self, riot: &mut Riot) {
        let mut value = 0u8;
        // reset and select are active low
        if !self.reset {
            value |= 0x01;
        }
        if !self.select {
            value |= 0x02;
        }
        if self.color {
            value |= 0x08;
        }
        if self.left_difficulty {
            value |= 0x40;
        }
        if self.right_difficulty {
            value |= 0x80;
        }
        riot.set_port_b(value, 0x00);
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-port event queue, drained at orchestrator step boundaries.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig() -> (HandController, Riot, Tia) {
        (HandController::new(0), Riot::new(), Tia::new())
    }

    #[test]
    fn joystick_direction_drives_swcha_high_nibble() {
        let (mut hc, mut riot, mut tia) = rig();
        hc.handle(
            Event::Joystick {
                direction: Direction::Left,
                pressed: true,
            },
            &mut riot,
            &mut tia,
        )
        .unwrap();
        assert_eq!(riot.read(mos_riot::reg::SWCHA), 0xBF);
        hc.handle(
            Event::Joystick {
                direction: Direction::Left,
                pressed: false,
            },
            &mut riot,
            &mut tia,
        )
        .unwrap();
        assert_eq!(riot.read(mos_riot::reg::SWCHA), 0xFF);
    }

    #[test]
    fn port_1_uses_low_nibble() {
        let mut hc = HandController::new(1);
        let mut riot = Riot::new();
        let mut tia = Tia::new();
        hc.handle(
            Event::Joystick {
                direction: Direction::Up,
                pressed: true,
            },
            &mut riot,
            &mut tia,
        )
        .unwrap();
        assert_eq!(riot.read(mos_riot::reg::SWCHA), 0xFE);
    }

    #[test]
    fn fire_button_latches() {
        let (mut hc, mut riot, mut tia) = rig();
        hc.vblank_bits(false, true, &mut tia);
        hc.handle(Event::Fire { pressed: true }, &mut riot, &mut tia)
            .unwrap();
        assert_eq!(tia.input(4), 0x00);
        // released while latched: stays low
        hc.handle(Event::Fire { pressed: false }, &mut riot, &mut tia)
            .unwrap();
        assert_eq!(tia.input(4), 0x00);
        // unlatching with the button up restores the line
        hc.vblank_bits(false, false, &mut tia);
        assert_eq!(tia.input(4), 0x80);
    }

    #[test]
    fn paddle_charges_at_the_predicted_clock() {
        let (mut hc, mut riot, mut tia) = rig();
        hc.handle(Event::PaddleSet { position: 0.5 }, &mut riot, &mut tia)
            .unwrap();
        // resistance 0.5, sensitivity 0.01: single-precision rounding puts
        // the accumulator over the threshold on the 51st tick
        for _ in 0..50 {
            hc.recharge(&mut tia);
        }
        assert_eq!(hc.paddle_charge(), 0);
        hc.recharge(&mut tia);
        assert_eq!(hc.paddle_charge(), 1);
        assert_eq!(tia.input(0), 1);
    }

    #[test]
    fn paddle_does_not_charge_in_joystick_mode() {
        let (mut hc, _riot, mut tia) = rig();
        for _ in 0..1000 {
            hc.recharge(&mut tia);
        }
        assert_eq!(hc.paddle_charge(), 0);
    }

    #[test]
    fn vblank_grounds_paddle() {
        let (mut hc, mut riot, mut tia) = rig();
        hc.handle(Event::PaddleSet { position: 0.0 }, &mut riot, &mut tia)
            .unwrap();
        for _ in 0..500 {
            hc.recharge(&mut tia);
        }
        assert!(hc.paddle_charge() > 0);
        hc.vblank_bits(true, false, &mut tia);
        assert_eq!(hc.paddle_charge(), 0);
        // grounded: no recharge
        for _ in 0..500 {
            hc.recharge(&mut tia);
        }
        assert_eq!(hc.paddle_charge(), 0);
    }

    #[test]
    fn keypad_rejects_unknown_keys() {
        let (mut hc, mut riot, mut tia) = rig();
        let err = hc.handle(Event::KeypadDown { key: 'q' }, &mut riot, &mut tia);
        assert_eq!(err, Err(InputError::InvalidKey('q')));
        // the failed event must not flip the controller kind
        assert_eq!(hc.kind(), ControllerKind::Joystick);
    }

    #[test]
    fn keypad_matrix_resolution() {
        let (mut hc, mut riot, mut tia) = rig();
        hc.handle(Event::KeypadDown { key: '5' }, &mut riot, &mut tia)
            .unwrap();
        // '5' is row 1, column 1. drive row 1 low through SWCHA bit 5
        riot.write(mos_riot::reg::SWACNT, 0xF0);
        riot.write(mos_riot::reg::SWCHA, !0x20);
        hc.scan_keypad(&riot, &mut tia);
        assert_eq!(tia.input(1), 0x00); // column 1 = INPT1
        assert_eq!(tia.input(0), 0x80);
        assert_eq!(tia.input(4), 0x80);
        // row not driven: nothing reads low
        riot.write(mos_riot::reg::SWCHA, 0xFF);
        hc.scan_keypad(&riot, &mut tia);
        assert_eq!(tia.input(1), 0x80);
    }

    #[test]
    fn panel_switches() {
        let mut panel = Panel::new();
        let mut riot = Riot::new();
        panel.write(&mut riot);
        assert_eq!(riot.read(mos_riot::reg::SWCHB), 0x0B);
        panel
            .handle(Event::PanelReset { pressed: true }, &mut riot)
            .unwrap();
        assert_eq!(riot.read(mos_riot::reg::SWCHB) & 0x01, 0x00);
        panel
            .handle(Event::PanelReset { pressed: false }, &mut riot)
            .unwrap();
        panel
            .handle(
                Event::PanelDifficulty {
                    right_player: false,
                    advanced: true,
                },
                &mut riot,
            )
            .unwrap();
        assert_eq!(riot.read(mos_riot::reg::SWCHB) & 0x41, 0x41);
    }
}
