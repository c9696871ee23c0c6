use thiserror::Error;

/// Errors surfaced by the engine to its driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Chip8Error {
    /// Instruction word not covered by the opcode table
    #[error("unknown opcode with nibbles {nibbles:x?} at 0x{pc:04x}")]
    UnknownOpcode { nibbles: (u8, u8, u8, u8), pc: u16 },

    /// `00EE` executed with an empty call stack
    #[error("return with empty call stack at 0x{pc:04x}")]
    StackUnderflow { pc: u16 },

    /// Fetch, store or load past the end of memory
    #[error("memory access out of bounds at 0x{address:04x} (instruction at 0x{pc:04x})")]
    MemoryOutOfBounds { address: usize, pc: u16 },

    #[error("font sprite must be 80 bytes, got {len}")]
    InvalidFont { len: usize },
}
