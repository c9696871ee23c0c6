mod chip8;
mod control;
mod display;
mod error;
mod timer;

pub use chip8::{
    Chip8, Chip8Builder, Chip8Mode, DEFAULT_FONT, FONT_BASE, MEMORY_SIZE, PROGRAM_START,
};
pub use control::Control;
pub use display::{Display, Framebuffer, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use error::Chip8Error;
pub use timer::{Timer, TIMER_HZ};
