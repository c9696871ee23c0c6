use std::time::Duration;

use chip8_vm_core::{Chip8, Chip8Builder, Chip8Error, Control, Framebuffer, DEFAULT_FONT};

/// Control that closes after a fixed number of loop checks
struct StepBudget {
    remaining: usize,
}

impl Control for StepBudget {
    fn is_closed(&mut self) -> bool {
        if self.remaining == 0 {
            return true;
        }
        self.remaining -= 1;
        false
    }

    fn is_pressed(&mut self, _key: u8) -> bool {
        false
    }
}

fn boot(rom: &[u8], steps: usize) -> Chip8<Framebuffer, StepBudget> {
    let _ = env_logger::builder().is_test(true).try_init();

    Chip8Builder::new()
        .with_rom(rom.to_vec())
        .with_rng_seed(7)
        .with_step_delay(Duration::ZERO)
        .build(Framebuffer::new(), StepBudget { remaining: steps })
        .unwrap()
}

fn assert_glyph(fb: &Framebuffer, digit: usize, ox: usize, oy: usize) {
    let glyph = &DEFAULT_FONT[digit * 5..digit * 5 + 5];
    // Glyphs only use the high nibble
    for (row, bits) in glyph.iter().enumerate() {
        for column in 0..4 {
            let expected = bits & (0x80 >> column) != 0;
            assert_eq!(
                fb.pixel(ox + column, oy + row),
                expected,
                "digit {} pixel ({}, {})",
                digit,
                column,
                row
            );
        }
    }
}

#[test]
fn closed_control_runs_nothing() {
    let mut chip = boot(&[0xFF, 0xFF], 0);

    chip.run().unwrap();

    assert_eq!(chip.pc(), 0x200);
}

#[test]
fn prints_decimal_number() {
    #[rustfmt::skip]
    let rom = [
        0x6A, 0x89, // VA = 137
        0xA3, 0x00, // I = 0x300
        0xFA, 0x33, // BCD VA
        0xF2, 0x65, // LOAD V0..=V2
        0x63, 0x00, // V3 = 0
        0x64, 0x00, // V4 = 0
        0xF0, 0x29, // FONT V0
        0xD3, 0x45, // DRW V3 V4 5
        0x73, 0x05, // V3 += 5
        0xF1, 0x29, // FONT V1
        0xD3, 0x45, // DRW V3 V4 5
        0x73, 0x05, // V3 += 5
        0xF2, 0x29, // FONT V2
        0xD3, 0x45, // DRW V3 V4 5
        0x12, 0x1C, // JMP 0x21C
    ];
    let mut chip = boot(&rom, 40);

    chip.run().unwrap();

    assert_eq!(chip.pc(), 0x21C);
    assert_eq!(&chip.memory()[0x300..0x303], &[1, 3, 7]);
    assert_eq!(&chip.registers()[..5], &[1, 3, 7, 10, 0]);
    assert_eq!(chip.registers()[0xF], 0);
    assert_glyph(chip.display(), 1, 0, 0);
    assert_glyph(chip.display(), 3, 5, 0);
    assert_glyph(chip.display(), 7, 10, 0);
}

#[test]
fn counts_through_subroutine() {
    #[rustfmt::skip]
    let rom = [
        0x60, 0x00, // V0 = 0
        0x22, 0x0A, // CALL 0x20A
        0x30, 0x05, // SKIP V0 == 5
        0x12, 0x02, // JMP 0x202
        0x12, 0x08, // JMP 0x208
        0x70, 0x01, // V0 += 1
        0x00, 0xEE, // RET
    ];
    let mut chip = boot(&rom, 100);

    chip.run().unwrap();

    assert_eq!(chip.registers()[0x0], 5);
    assert_eq!(chip.pc(), 0x208);
    assert!(chip.stack().is_empty());
}

#[test]
fn fatal_error_stops_run() {
    let mut chip = boot(&[0x60, 0x01, 0xFF, 0xFF], 10);

    let result = chip.run();

    assert_eq!(
        result,
        Err(Chip8Error::UnknownOpcode {
            nibbles: (0xF, 0xF, 0xF, 0xF),
            pc: 0x202
        })
    );
    assert_eq!(chip.registers()[0x0], 1);
}

#[test]
fn stray_return_underflows() {
    let mut chip = boot(&[0x00, 0xEE], 10);

    assert_eq!(chip.run(), Err(Chip8Error::StackUnderflow { pc: 0x200 }));
}
