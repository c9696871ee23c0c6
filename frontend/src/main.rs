mod color;
mod terminal;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{ensure, Context};
use chip8_vm_core::{Chip8Builder, Chip8Mode, MEMORY_SIZE, PROGRAM_START};
use clap::{Parser, ValueEnum};
use log::info;

use crate::color::{Chip8Color, DEFAULT_BACKGROUND_COLOR, DEFAULT_FOREGROUND_COLOR};
use crate::terminal::{TerminalControl, TerminalDisplay};

const MAX_ROM_SIZE: usize = MEMORY_SIZE - PROGRAM_START as usize;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Copy VY into VX before shifting (COSMAC VIP)
    CosmacVip,
    /// Shift VX in place
    Chip48,
}

impl From<Mode> for Chip8Mode {
    fn from(mode: Mode) -> Chip8Mode {
        match mode {
            Mode::CosmacVip => Chip8Mode::COSMAC_VIP,
            Mode::Chip48 => Chip8Mode::CHIP_48,
        }
    }
}

/// CHIP-8 Emulator rendering to the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Filepath to Chip-8 ROM file that will be executed
    #[clap(index = 1)]
    rom: PathBuf,

    /// Filepath to font file (80 bytes)
    #[clap(long)]
    font: Option<PathBuf>,

    /// Background Color as HEX 0xAABBFF [default: 0x000000]
    #[clap(long)]
    background: Option<Chip8Color>,

    /// Foreground Color as HEX 0xAABBFF [default: 0xFFFFFF]
    #[clap(long)]
    foreground: Option<Chip8Color>,

    /// Shift instruction behaviour
    #[clap(long, value_enum, default_value_t = Mode::Chip48)]
    mode: Mode,

    /// Pause between instructions in microseconds
    #[clap(long, default_value_t = 1000)]
    step_delay: u64,

    /// Stop after this many instructions
    #[clap(long)]
    max_steps: Option<u64>,

    /// PRNG seed
    #[clap(long)]
    seed: Option<u64>,

    /// Print debug information
    #[clap(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug { "trace" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter)).init();

    let rom_data = std::fs::read(&args.rom)
        .with_context(|| format!("Failed to read ROM file {}", args.rom.display()))?;
    ensure!(
        rom_data.len() <= MAX_ROM_SIZE,
        "ROM is {} bytes, at most {} fit in memory",
        rom_data.len(),
        MAX_ROM_SIZE
    );

    let mut builder = Chip8Builder::new()
        .with_rom(rom_data)
        .with_mode(args.mode.into())
        .with_step_delay(Duration::from_micros(args.step_delay));

    if let Some(font) = &args.font {
        let font_data = std::fs::read(font)
            .with_context(|| format!("Failed to read font file {}", font.display()))?;
        builder = builder.with_font(font_data);
    }

    if let Some(seed) = args.seed {
        builder = builder.with_rng_seed(seed);
    }

    let mut display = TerminalDisplay::new(io::stdout());
    if args.foreground.is_some() || args.background.is_some() {
        display = display.with_palette(
            args.foreground.unwrap_or(DEFAULT_FOREGROUND_COLOR),
            args.background.unwrap_or(DEFAULT_BACKGROUND_COLOR),
        );
    }

    let mut chip = builder.build(display, TerminalControl::new(args.max_steps))?;

    chip.run()
        .with_context(|| format!("Emulation of {} aborted", args.rom.display()))?;

    info!(
        "Finished after {} steps at 0x{:04x}",
        chip.control().steps(),
        chip.pc()
    );
    Ok(())
}
