// CHIP-8 interpreter
//
// Useful links:
// * [Guide to making a CHIP-8 emulator](https://tobiasvl.github.io/blog/write-a-chip-8-emulator/)
// * [Building a CHIP-8 Emulator](https://austinmorlan.com/posts/chip8_emulator/)
//

use std::{
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, info, trace, warn};
use rand::{rngs::StdRng, RngCore, SeedableRng};

use crate::{control::Control, display::Display, error::Chip8Error, timer::Timer};

pub const MEMORY_SIZE: usize = 0x1000;
pub const PROGRAM_START: u16 = 0x200;
pub const FONT_BASE: u16 = 0x050;
const FONT_GLYPH_SIZE: u16 = 5;
const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(1);

pub static DEFAULT_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Chip8Mode {
    /// VY is copied into VX before 8XY6/8XYE shift
    COSMAC_VIP,
    /// 8XY6/8XYE shift VX in place and ignore VY
    #[default]
    CHIP_48,
}

#[derive(Clone, Copy, Debug, Default)]
struct Chip8Flags {
    /// Bitwise shift (8XY6 and 8XYE) quirk: if true VY is copied into VX before shifting (COSMAC VIP)
    quirk_shift: bool,
}

#[derive(Debug)]
pub struct Chip8Builder {
    /// ROM
    rom: Option<Vec<u8>>,
    /// Font sprite
    font: Option<Vec<u8>>,
    /// PRNG Seed
    rng_seed: Option<u64>,
    /// Pause between steps in `run`
    step_delay: Duration,
    /// Flags
    flags: Chip8Flags,
}

/// The execution engine: machine state plus the display and control it drives.
pub struct Chip8<D: Display, C: Control> {
    /// General purpose registers, VF doubles as the flag register
    regs: [u8; 16],
    /// Index register
    index: u16,
    /// Program counter
    pc: u16,
    /// Call stack, unbounded
    stack: Vec<u16>,
    /// Delay Timer
    delay_timer: Timer,
    /// Sound Timer
    sound_timer: Timer,
    /// Memory
    memory: Vec<u8>,
    display: D,
    control: C,
    step_delay: Duration,
    /// Flags
    flags: Chip8Flags,
    /// PRNG Generator
    rng: StdRng,
}

impl Chip8Builder {
    pub fn new() -> Chip8Builder {
        Chip8Builder {
            rom: None,
            font: None,
            rng_seed: None,
            step_delay: DEFAULT_STEP_DELAY,
            flags: Chip8Flags::default(),
        }
    }

    pub fn with_rom(mut self, rom: Vec<u8>) -> Self {
        self.rom = Some(rom);
        self
    }

    pub fn with_font(mut self, font: Vec<u8>) -> Self {
        self.font = Some(font);
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_mode(mut self, mode: Chip8Mode) -> Self {
        self.flags.quirk_shift = mode == Chip8Mode::COSMAC_VIP;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    pub fn build<D: Display, C: Control>(
        &self,
        display: D,
        control: C,
    ) -> Result<Chip8<D, C>, Chip8Error> {
        // Create memory
        let mut memory = vec![0u8; MEMORY_SIZE];

        // Copy font to memory
        let font = match &self.font {
            Some(font) => &font[..],
            None => &DEFAULT_FONT[..],
        };
        if font.len() != DEFAULT_FONT.len() {
            return Err(Chip8Error::InvalidFont { len: font.len() });
        }
        let font_base = FONT_BASE as usize;
        memory[font_base..font_base + font.len()].copy_from_slice(font);

        // Pseudo random number generator
        let rng = match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let now = Instant::now();
        let mut chip = Chip8 {
            regs: [0u8; 16],
            index: 0,
            pc: PROGRAM_START,
            stack: Vec::new(),
            delay_timer: Timer::new(now),
            sound_timer: Timer::new(now),
            memory,
            display,
            control,
            step_delay: self.step_delay,
            flags: self.flags,
            rng,
        };

        if let Some(rom) = &self.rom {
            chip.load(rom);
        }

        Ok(chip)
    }
}

impl Default for Chip8Builder {
    fn default() -> Self {
        Chip8Builder::new()
    }
}

impl<D: Display, C: Control> Chip8<D, C> {
    /// Copy a program verbatim into memory at 0x200.
    ///
    /// Bytes that would land past the end of memory are dropped.
    pub fn load(&mut self, program: &[u8]) {
        let start = PROGRAM_START as usize;
        let room = MEMORY_SIZE - start;
        if program.len() > room {
            warn!(
                "Program is {} bytes, only the first {} fit in memory",
                program.len(),
                room
            );
        }

        self.memory[start..]
            .iter_mut()
            .zip(program)
            .for_each(|(mem, &byte)| *mem = byte);

        debug!("Loaded {} bytes at 0x{:03x}", program.len().min(room), start);
    }

    /// Step until the control reports closed.
    ///
    /// Fatal errors stop the loop and are handed back to the caller.
    pub fn run(&mut self) -> Result<(), Chip8Error> {
        info!("Starting execution at 0x{:04x}", self.pc);

        while !self.control.is_closed() {
            self.step()?;
            self.update_timers();

            if !self.step_delay.is_zero() {
                thread::sleep(self.step_delay);
            }
        }

        info!("Control closed, stopped at 0x{:04x}", self.pc);
        Ok(())
    }

    /// Fetch, decode and execute exactly one instruction.
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        // Instruction
        let addr = self.pc;
        let inst = self.read_u16_be(addr)?;
        self.pc += 2;

        // Instruction split into nibbles (4 bits) 1-4
        let n1 = (0xf0 & inst[0]) >> 4;
        let n2 = 0x0f & inst[0];
        let n3 = (0xf0 & inst[1]) >> 4;
        let n4 = 0x0f & inst[1];

        let x = n2 as usize;
        let y = n3 as usize;
        let nn = inst[1];
        let nnn = u16::from_be_bytes([n2, inst[1]]);

        macro_rules! op {
            ($($arg:tt)+) => {
                trace!("0x{:04x}: {:02x}{:02x} {}", addr, inst[0], inst[1], format_args!($($arg)+))
            };
        }

        match (n1, n2, n3, n4) {
            // 00E0: Clear screen
            (0x0, 0x0, 0xE, 0x0) => {
                op!("CLS");
                self.display.clear();
            }
            // 00EE: Return subroutine from stack
            (0x0, 0x0, 0xE, 0xE) => {
                op!("RET");
                self.pc = self
                    .stack
                    .pop()
                    .ok_or(Chip8Error::StackUnderflow { pc: addr })?;
            }
            // 1NNN: Jump to memory location NNN
            (0x1, _, _, _) => {
                op!("JMP 0x{:03x}", nnn);
                self.pc = nnn;
            }
            // 2NNN: Call subroutine at memory location NNN
            (0x2, _, _, _) => {
                op!("CALL 0x{:03x}", nnn);
                self.stack.push(self.pc);
                self.pc = nnn;
            }
            // 3XNN: Skip next instruction if VX == NN
            (0x3, _, _, _) => {
                op!("SKIP V{:x}=={:02x}", x, nn);
                self.skip_if(self.regs[x] == nn);
            }
            // 4XNN: Skip next instruction if VX != NN
            (0x4, _, _, _) => {
                op!("SKIP V{:x}!={:02x}", x, nn);
                self.skip_if(self.regs[x] != nn);
            }
            // 5XY0: Skip next instruction if VX == VY
            (0x5, _, _, 0x0) => {
                op!("SKIP V{:x}==V{:x}", x, y);
                self.skip_if(self.regs[x] == self.regs[y]);
            }
            // 6XNN: Set register VX to the value NN.
            (0x6, _, _, _) => {
                op!("SET V{:x} {:02x}", x, nn);
                self.regs[x] = nn;
            }
            // 7XNN: Add the value NN to VX, no carry
            (0x7, _, _, _) => {
                op!("ADD V{:x} {:02x}", x, nn);
                self.regs[x] = self.regs[x].wrapping_add(nn);
            }
            // 8XY0: Set register VX to the value of VY.
            (0x8, _, _, 0x0) => {
                op!("SET V{:x} V{:x}", x, y);
                self.regs[x] = self.regs[y];
            }
            // 8XY1: Binary OR register VX and register VY and store result in VX
            (0x8, _, _, 0x1) => {
                op!("OR V{:x} V{:x}", x, y);
                self.regs[x] |= self.regs[y];
            }
            // 8XY2: Binary AND register VX and register VY and store result in VX
            (0x8, _, _, 0x2) => {
                op!("AND V{:x} V{:x}", x, y);
                self.regs[x] &= self.regs[y];
            }
            // 8XY3: Binary XOR register VX and register VY and store result in VX
            (0x8, _, _, 0x3) => {
                op!("XOR V{:x} V{:x}", x, y);
                self.regs[x] ^= self.regs[y];
            }
            // 8XY4: Add register VX and register VY and store result in VX, VF is carry
            (0x8, _, _, 0x4) => {
                op!("ADD V{:x} V{:x}", x, y);
                let (sum, carry) = self.regs[x].overflowing_add(self.regs[y]);
                self.regs[0xF] = carry as u8;
                self.regs[x] = sum;
            }
            // 8XY5: Subtract, sets VX to the result of VX - VY, VF is "no borrow"
            (0x8, _, _, 0x5) => {
                op!("SUB V{:x} V{:x}", x, y);
                let (vx, vy) = (self.regs[x], self.regs[y]);
                self.regs[0xF] = (vx > vy) as u8;
                self.regs[x] = vx.wrapping_sub(vy);
            }
            // 8XY6: Shift VX to the right by 1 bit, optionaly copy VY to VX before shifting
            (0x8, _, _, 0x6) => {
                op!("SHR V{:x} V{:x}", x, y);
                let value = if self.flags.quirk_shift { self.regs[y] } else { self.regs[x] };
                self.regs[0xF] = value & 0x01;
                self.regs[x] = value >> 1;
            }
            // 8XY7: Subtract, sets VX to the result of VY - VX
            (0x8, _, _, 0x7) => {
                op!("SUBN V{:x} V{:x}", x, y);
                let (vx, vy) = (self.regs[x], self.regs[y]);
                self.regs[0xF] = (vy > vx) as u8;
                self.regs[x] = vy.wrapping_sub(vx);
            }
            // 8XYE: Shift VX to the left by 1 bit, optionaly copy VY to VX before shifting
            (0x8, _, _, 0xE) => {
                op!("SHL V{:x} V{:x}", x, y);
                let value = if self.flags.quirk_shift { self.regs[y] } else { self.regs[x] };
                self.regs[0xF] = (value & 0x80) >> 7;
                self.regs[x] = value << 1;
            }
            // 9XY0: Skip next instruction if VX != VY
            (0x9, _, _, 0x0) => {
                op!("SKIP V{:x}!=V{:x}", x, y);
                self.skip_if(self.regs[x] != self.regs[y]);
            }
            // ANNN: Set index register I to the value NNN
            (0xA, _, _, _) => {
                op!("SET I 0x{:03x}", nnn);
                self.index = nnn;
            }
            // CXNN: Random - generates a random number and AND it with the value NN, and puts the result in VX
            (0xC, _, _, _) => {
                op!("RNG V{:x} 0x{:02x}", x, nn);
                let n = self.rng.next_u32() as u8;
                self.regs[x] = n & nn;
            }
            // DXYN: Display - draw an N pixels tall sprite from the memory location that the I index register
            // is holding to the screen, at the horizontal X coordinate in VX and the Y coordinate in VY
            (0xD, _, _, _) => {
                op!("DRW V{:x} V{:x} {:x}", x, y, n4);
                let start = (self.index as usize).min(MEMORY_SIZE);
                let end = (start + n4 as usize).min(MEMORY_SIZE);
                let collision = self
                    .display
                    .draw(self.regs[x], self.regs[y], &self.memory[start..end]);
                self.regs[0xF] = collision as u8;
                self.display.show();
            }
            // EX9E: Skip next instruction if key VX is pressed
            (0xE, _, 0x9, 0xE) => {
                op!("SKP V{:x}", x);
                let key = self.regs[x] & 0x0F;
                let pressed = self.control.is_pressed(key);
                self.skip_if(pressed);
            }
            // EXA1: Skip next instruction if key VX is not pressed
            (0xE, _, 0xA, 0x1) => {
                op!("SKNP V{:x}", x);
                let key = self.regs[x] & 0x0F;
                let pressed = self.control.is_pressed(key);
                self.skip_if(!pressed);
            }
            // FX07: Read delay timer into VX
            (0xF, _, 0x0, 0x7) => {
                op!("GET V{:x} DT", x);
                self.update_timers();
                self.regs[x] = self.delay_timer.value();
            }
            // FX15: Set delay timer to VX
            (0xF, _, 0x1, 0x5) => {
                op!("SET DT V{:x}", x);
                self.delay_timer.set(self.regs[x], Instant::now());
            }
            // FX18: Set sound timer to VX
            (0xF, _, 0x1, 0x8) => {
                op!("SET ST V{:x}", x);
                self.sound_timer.set(self.regs[x], Instant::now());
            }
            // FX1E: Add VX to index register, no clamp to 12 bits
            (0xF, _, 0x1, 0xE) => {
                op!("ADD I V{:x}", x);
                self.index = self.index.wrapping_add(self.regs[x] as u16);
            }
            // FX29: Point index register at font glyph for VX
            (0xF, _, 0x2, 0x9) => {
                op!("FONT V{:x}", x);
                self.index = FONT_BASE + self.regs[x] as u16 * FONT_GLYPH_SIZE;
            }
            // FX33: Binary-coded decimal of VX into I, I+1, I+2
            (0xF, _, 0x3, 0x3) => {
                op!("BCD V{:x}", x);
                let base = self.index as usize;
                if base + 2 < MEMORY_SIZE {
                    let value = self.regs[x];
                    self.memory[base] = value / 100;
                    self.memory[base + 1] = (value / 10) % 10;
                    self.memory[base + 2] = value % 10;
                } else {
                    error!(
                        "BCD at 0x{:04x} skipped: index 0x{:04x} out of range",
                        addr, self.index
                    );
                }
            }
            // FX55: Store - Store of each register from V0-VX at memory addresses starting at I until I + X
            (0xF, _, 0x5, 0x5) => {
                op!("STORE V{:x}", x);
                let base = self.checked_range(x, addr)?;
                self.memory[base..=base + x].copy_from_slice(&self.regs[..=x]);
            }
            // FX65: Load - Load of each register from V0-VX from memory addresses starting at I until I + X
            (0xF, _, 0x6, 0x5) => {
                op!("LOAD V{:x}", x);
                let base = self.checked_range(x, addr)?;
                self.regs[..=x].copy_from_slice(&self.memory[base..=base + x]);
            }
            _ => {
                return Err(Chip8Error::UnknownOpcode {
                    nibbles: (n1, n2, n3, n4),
                    pc: addr,
                })
            }
        }

        Ok(())
    }

    /// Bring both timers up to date with the wall clock.
    pub fn update_timers(&mut self) {
        let now = Instant::now();
        self.delay_timer.refresh(now);

        let was_sounding = self.sound_timer.is_active();
        self.sound_timer.refresh(now);
        if was_sounding && !self.sound_timer.is_active() {
            debug!("Sound timer expired");
        }
    }

    pub fn sound_active(&self) -> bool {
        self.sound_timer.is_active()
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer.value()
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.value()
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.regs
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    pub fn control_mut(&mut self) -> &mut C {
        &mut self.control
    }

    fn skip_if(&mut self, cond: bool) {
        if cond {
            self.pc += 2;
        }
    }

    // Start of I..=I+x, if all of it lies inside memory
    fn checked_range(&self, x: usize, pc: u16) -> Result<usize, Chip8Error> {
        let base = self.index as usize;
        if base + x < MEMORY_SIZE {
            Ok(base)
        } else {
            Err(Chip8Error::MemoryOutOfBounds {
                address: base + x,
                pc,
            })
        }
    }

    fn read_u16_be(&self, addr: u16) -> Result<[u8; 2], Chip8Error> {
        let start = addr as usize;
        let bytes = self
            .memory
            .get(start..start + 2)
            .ok_or(Chip8Error::MemoryOutOfBounds {
                address: start + 1,
                pc: addr,
            })?;
        Ok([bytes[0], bytes[1]])
    }
}
