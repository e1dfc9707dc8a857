//! The machine itself: memory, registers, timers, keypad and the
//! fetch-decode-execute cycle.
//!
//! [`Machine`] runs nothing on its own. The host calls [`Machine::step`]
//! as often as it wants instructions executed and [`Machine::tick_timers`]
//! at its frame rate, and pushes key changes in via [`Machine::set_key`].
//! That keeps the core free of clocks and threads and makes every test
//! deterministic.

use rand::{rngs::StdRng, Rng, SeedableRng};
use static_assertions::const_assert;
use thiserror::Error;
use tracing::{debug, instrument, trace};

use crate::{
    font,
    instruction::{DecodeError, Instruction},
    nibbles::Nibble,
    screen::Screen,
};

mod call_stack;
mod key;
mod register;

pub use call_stack::{CallStack, CallStackFullError};
pub use key::{Key, KeyState};
pub use register::Register;

/// Error loading a program into machine memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(
        "program of {program_len} bytes does not fit in the {available} \
         bytes of memory after the entry offset"
    )]
    ProgramTooLarge {
        program_len: usize,
        available: usize,
    },
}

/// Error terminating a [`Machine::step`].
///
/// Every variant names the address of the instruction that failed. The
/// failed instruction has applied none of its effects; only the program
/// counter has moved past it, as it does for every fetched word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    /// A subroutine call would nest deeper than [`CallStack::DEPTH`].
    #[error("call at {program_counter:#05X} exceeds the maximum call depth")]
    StackOverflow { program_counter: u16 },
    /// A return executed with no call to return from.
    #[error("return at {program_counter:#05X} with an empty call stack")]
    StackUnderflow { program_counter: u16 },
    /// The fetched word is not a recognized instruction.
    #[error("at {program_counter:#05X}: {source}")]
    Decode {
        program_counter: u16,
        source: DecodeError,
    },
}

/// What a successful [`Machine::step`] did to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The instruction ran without drawing.
    Continue,
    /// The instruction was a draw. Hosts that only repaint on change
    /// should present the screen now.
    Redraw,
}

/// Keypress-wait handshake state.
///
/// The wait instruction arms the machine for the register it targets and
/// re-executes until [`Machine::set_key`] reports a fresh press, which is
/// captured exactly once. Keys already held when the wait arms do not
/// count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyWait {
    Idle,
    Armed { target: Register },
    Captured,
}

/// A CHIP-8 machine.
///
/// Construction installs the built-in hex glyphs; [`Machine::load`] then
/// copies a program to the entry offset and the machine is ready to step.
#[derive(Debug, Clone)]
pub struct Machine {
    memory: [u8; Self::MEMORY_LEN],
    registers: [u8; Register::COUNT],
    index_register: u16,
    program_counter: u16,
    call_stack: CallStack,
    delay_timer: u8,
    sound_timer: u8,
    screen: Screen,
    key_states: [KeyState; Key::COUNT],
    key_wait: KeyWait,
    rng: StdRng,
}

impl Machine {
    /// Total bytes of machine memory.
    pub const MEMORY_LEN: usize = 4096;
    /// Offset at which programs are loaded and execution starts.
    pub const PROGRAM_START: u16 = 0x200;

    /// Mask applied to every address before memory is touched.
    const ADDRESS_MASK: u16 = Self::MEMORY_LEN as u16 - 1;
    /// Width of one instruction word in bytes.
    const INSTRUCTION_LEN: u16 = 2;

    /// A machine seeded from the operating system, for normal use.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// A machine whose random-number instruction produces a reproducible
    /// sequence.
    pub fn with_rng_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut machine = Self {
            memory: [0; Self::MEMORY_LEN],
            registers: [0; Register::COUNT],
            index_register: 0,
            program_counter: Self::PROGRAM_START,
            call_stack: CallStack::new(),
            delay_timer: 0,
            sound_timer: 0,
            screen: Screen::default(),
            key_states: [KeyState::NotPressed; Key::COUNT],
            key_wait: KeyWait::Idle,
            rng,
        };
        machine.install_glyphs();
        machine
    }

    fn install_glyphs(&mut self) {
        let start = font::GLYPHS_START as usize;
        self.memory[start..start + font::GLYPHS.len()].copy_from_slice(&font::GLYPHS);
    }

    /// Copy `program` into memory starting at [`Machine::PROGRAM_START`].
    ///
    /// Memory outside the copied range is left as is.
    #[instrument(skip_all, fields(program_len = program.len()))]
    pub fn load(&mut self, program: &[u8]) -> Result<(), LoadError> {
        let start = Self::PROGRAM_START as usize;
        let available = Self::MEMORY_LEN - start;

        if program.len() > available {
            return Err(LoadError::ProgramTooLarge {
                program_len: program.len(),
                available,
            });
        }

        self.memory[start..start + program.len()].copy_from_slice(program);
        debug!("program loaded");
        Ok(())
    }

    /// Return the machine to its power-on state without touching loaded
    /// program bytes.
    ///
    /// Registers, index, call stack, timers, display, keypad and the
    /// keypress-wait handshake are cleared, the program counter goes back
    /// to the entry offset and the glyphs are re-installed in case the
    /// program overwrote them. The same program can then run again.
    pub fn reset(&mut self) {
        self.registers = [0; Register::COUNT];
        self.index_register = 0;
        self.program_counter = Self::PROGRAM_START;
        self.call_stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.screen.clear();
        self.key_states = [KeyState::NotPressed; Key::COUNT];
        self.key_wait = KeyWait::Idle;
        self.install_glyphs();
        debug!("machine reset");
    }

    /// Read-only view of the display buffer.
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    /// Current sound timer value. The host plays its tone while this is
    /// nonzero.
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    /// The state most recently reported for `key` via
    /// [`Machine::set_key`].
    pub fn key_state(&self, key: Key) -> KeyState {
        self.key_states[key as usize]
    }

    /// Record the host-reported state of `key`.
    ///
    /// A press of a key that was not already down completes a pending
    /// keypress wait: the key value is written to the armed register and
    /// the waiting instruction resumes the program on its next execution.
    /// Repeated press reports for a held key complete nothing.
    pub fn set_key(&mut self, key: Key, state: KeyState) {
        let was_pressed = self.key_states[key as usize] == KeyState::Pressed;
        self.key_states[key as usize] = state;

        if state == KeyState::Pressed && !was_pressed {
            if let KeyWait::Armed { target } = self.key_wait {
                self.set_register(target, key as u8);
                self.key_wait = KeyWait::Captured;
                trace!(?key, ?target, "keypress captured");
            }
        }
    }

    /// Move both timers one tick toward zero.
    ///
    /// The host calls this at its frame rate, nominally 60 Hz,
    /// independently of how many instructions it runs per frame.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Run one fetch-decode-execute cycle.
    pub fn step(&mut self) -> Result<StepOutcome, StepError> {
        let instruction_addr = self.program_counter;
        let word = self.fetch();
        let instruction =
            Instruction::try_from(word.to_be_bytes()).map_err(|source| StepError::Decode {
                program_counter: instruction_addr,
                source,
            })?;

        trace!(pc = instruction_addr, ?instruction, "executing");
        self.execute(instruction, instruction_addr)
    }

    /// Read the word at the program counter and advance it past the word.
    /// Jump-class instructions overwrite the advanced value when they
    /// execute.
    fn fetch(&mut self) -> u16 {
        let hi = self.read_byte(self.program_counter);
        let lo = self.read_byte(self.program_counter.wrapping_add(1));

        self.program_counter =
            self.program_counter.wrapping_add(Self::INSTRUCTION_LEN) & Self::ADDRESS_MASK;

        u16::from_be_bytes([hi, lo])
    }

    /// The byte at `address`, which wraps modulo [`Machine::MEMORY_LEN`].
    fn read_byte(&self, address: u16) -> u8 {
        self.memory[(address & Self::ADDRESS_MASK) as usize]
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        self.memory[(address & Self::ADDRESS_MASK) as usize] = value;
    }

    fn register(&self, register: Register) -> u8 {
        self.registers[register as usize]
    }

    fn set_register(&mut self, register: Register, value: u8) {
        self.registers[register as usize] = value;
    }

    /// Advance past the instruction the program counter points at, for
    /// the skip instructions.
    fn skip_next_instruction(&mut self) {
        self.program_counter =
            self.program_counter.wrapping_add(Self::INSTRUCTION_LEN) & Self::ADDRESS_MASK;
    }

    fn execute(
        &mut self,
        instruction: Instruction,
        instruction_addr: u16,
    ) -> Result<StepOutcome, StepError> {
        use Instruction::*;

        match instruction {
            ClearDisplay => self.screen.clear(),
            Return => {
                self.program_counter =
                    self.call_stack
                        .pop()
                        .ok_or(StepError::StackUnderflow {
                            program_counter: instruction_addr,
                        })?;
            }
            Jump { address } => self.program_counter = address.into_u16(),
            CallSubroutine { address } => {
                self.call_stack
                    .push(self.program_counter)
                    .map_err(|_| StepError::StackOverflow {
                        program_counter: instruction_addr,
                    })?;
                self.program_counter = address.into_u16();
            }
            SkipIfEqualsValue { register, value } => {
                if self.register(register) == value {
                    self.skip_next_instruction();
                }
            }
            SkipIfNotEqualsValue { register, value } => {
                if self.register(register) != value {
                    self.skip_next_instruction();
                }
            }
            SkipIfEqualsRegister { register, other } => {
                if self.register(register) == self.register(other) {
                    self.skip_next_instruction();
                }
            }
            SetValue { register, value } => self.set_register(register, value),
            AddValue { register, value } => {
                self.set_register(register, self.register(register).wrapping_add(value));
            }
            Copy { target, source } => self.set_register(target, self.register(source)),
            Or { target, source } => {
                self.set_register(target, self.register(target) | self.register(source));
            }
            And { target, source } => {
                self.set_register(target, self.register(target) & self.register(source));
            }
            Xor { target, source } => {
                self.set_register(target, self.register(target) ^ self.register(source));
            }
            Add { target, source } => {
                let (result, carry) = self
                    .register(target)
                    .overflowing_add(self.register(source));
                // The flag write comes second: when VF is the target, the
                // flag survives, not the sum.
                self.set_register(target, result);
                self.set_register(Register::VF, carry as u8);
            }
            Sub { target, source } => {
                let (result, borrow) = self
                    .register(target)
                    .overflowing_sub(self.register(source));
                self.set_register(target, result);
                self.set_register(Register::VF, !borrow as u8);
            }
            ShiftRight { target, source } => {
                let source_value = self.register(source);
                self.set_register(target, source_value >> 1);
                self.set_register(Register::VF, source_value & 0x01);
            }
            SubReversed { target, source } => {
                let (result, borrow) = self
                    .register(source)
                    .overflowing_sub(self.register(target));
                self.set_register(target, result);
                self.set_register(Register::VF, !borrow as u8);
            }
            ShiftLeft { target, source } => {
                let source_value = self.register(source);
                self.set_register(target, source_value << 1);
                // The flag keeps the masked bit itself, 0x00 or 0x80,
                // not a normalized 0 or 1.
                self.set_register(Register::VF, source_value & 0x80);
            }
            SkipIfNotEqualsRegister { register, other } => {
                if self.register(register) != self.register(other) {
                    self.skip_next_instruction();
                }
            }
            SetIndex { address } => self.index_register = address.into_u16(),
            JumpWithOffset { address } => {
                self.program_counter = address
                    .into_u16()
                    .wrapping_add(u16::from(self.register(Register::V0)))
                    & Self::ADDRESS_MASK;
            }
            Random { register, mask } => {
                let byte: u8 = self.rng.gen();
                self.set_register(register, byte & mask);
            }
            Draw {
                x_register,
                y_register,
                height,
            } => {
                let mut rows = [0; 15];
                let rows = &mut rows[..height.into_usize()];
                for (offset, row) in rows.iter_mut().enumerate() {
                    *row = self.read_byte(self.index_register.wrapping_add(offset as u16));
                }

                let x = self.register(x_register);
                let y = self.register(y_register);
                let collision = self.screen.draw_sprite(x, y, rows);
                self.set_register(Register::VF, collision as u8);

                // Every draw reports Redraw, even a zero-height one.
                return Ok(StepOutcome::Redraw);
            }
            SkipIfKeyPressed { register } => {
                let key = Key::from(Nibble::low(self.register(register)));
                if self.key_state(key) == KeyState::Pressed {
                    self.skip_next_instruction();
                }
            }
            SkipIfKeyNotPressed { register } => {
                let key = Key::from(Nibble::low(self.register(register)));
                if self.key_state(key) == KeyState::NotPressed {
                    self.skip_next_instruction();
                }
            }
            ReadDelayTimer { register } => self.set_register(register, self.delay_timer),
            WaitForKey { register } => self.wait_for_key(register, instruction_addr),
            SetDelayTimer { register } => self.delay_timer = self.register(register),
            SetSoundTimer { register } => self.sound_timer = self.register(register),
            AddToIndex { register } => {
                let (result, overflow) = self
                    .index_register
                    .overflowing_add(u16::from(self.register(register)));
                self.index_register = result;
                // VF is only written on overflow and untouched otherwise.
                if overflow {
                    self.set_register(Register::VF, 1);
                }
            }
            SetIndexToGlyph { register } => {
                self.index_register = font::glyph_addr(self.register(register));
            }
            StoreBcd { register } => {
                let digits = decimal_digits(self.register(register));
                for (offset, digit) in digits.into_iter().enumerate() {
                    self.write_byte(self.index_register.wrapping_add(offset as u16), digit);
                }
            }
            StoreRegisters { last } => {
                for offset in 0..=last as u16 {
                    self.write_byte(
                        self.index_register.wrapping_add(offset),
                        self.registers[offset as usize],
                    );
                }
                self.index_register = self.index_register.wrapping_add(last as u16 + 1);
            }
            LoadRegisters { last } => {
                for offset in 0..=last as u16 {
                    self.registers[offset as usize] =
                        self.read_byte(self.index_register.wrapping_add(offset));
                }
                self.index_register = self.index_register.wrapping_add(last as u16 + 1);
            }
        }

        Ok(StepOutcome::Continue)
    }

    /// One execution of the keypress-wait instruction.
    ///
    /// Until a press is captured the program counter is rewound onto the
    /// instruction itself, so the host sees the machine spinning on the
    /// wait. [`Machine::set_key`] does the capturing; the execution after
    /// it acknowledges and moves on.
    fn wait_for_key(&mut self, target: Register, instruction_addr: u16) {
        match self.key_wait {
            KeyWait::Idle => {
                self.key_wait = KeyWait::Armed { target };
                self.program_counter = instruction_addr;
                trace!(?target, "waiting for a keypress");
            }
            KeyWait::Armed { .. } => self.program_counter = instruction_addr,
            KeyWait::Captured => self.key_wait = KeyWait::Idle,
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// Decimal digits of `value`: hundreds, tens, units.
const fn decimal_digits(value: u8) -> [u8; 3] {
    [value / 100, value / 10 % 10, value % 10]
}

const_assert!(Machine::MEMORY_LEN.is_power_of_two());
// The glyph region must sit below the program entry offset.
const_assert!(font::GLYPHS_START as usize + font::GLYPHS.len() <= Machine::PROGRAM_START as usize);
