use std::io::Write;

use chip8_vm_core::{Control, Display, Framebuffer};
use log::warn;

use crate::color::Chip8Color;

const PIXEL_ON: char = '█';
const PIXEL_OFF: char = '░';
const RESET: &str = "\x1b[0m";

/// Renders the framebuffer as text, one line per row, every time it is shown.
pub struct TerminalDisplay<W: Write> {
    frame: Framebuffer,
    palette: Option<(Chip8Color, Chip8Color)>,
    out: W,
}

impl<W: Write> TerminalDisplay<W> {
    pub fn new(out: W) -> TerminalDisplay<W> {
        TerminalDisplay {
            frame: Framebuffer::new(),
            palette: None,
            out,
        }
    }

    /// Color lit pixels with `foreground` and unlit ones with `background`
    pub fn with_palette(mut self, foreground: Chip8Color, background: Chip8Color) -> Self {
        self.palette = Some((foreground, background));
        self
    }

    pub fn render(&self) -> String {
        let mut text = String::new();
        for row in self.frame.rows() {
            text.push('\n');
            for &pixel in row {
                if let Some((fg, bg)) = &self.palette {
                    let color = if pixel { fg } else { bg };
                    text.push_str(&color.ansi_fg());
                }
                text.push(if pixel { PIXEL_ON } else { PIXEL_OFF });
            }
            if self.palette.is_some() {
                text.push_str(RESET);
            }
        }
        text
    }
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn clear(&mut self) {
        self.frame.clear();
    }

    fn draw(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        self.frame.draw(x, y, rows)
    }

    fn show(&mut self) {
        let text = self.render();
        if let Err(err) = writeln!(self.out, "{}", text).and_then(|_| self.out.flush()) {
            warn!("Failed to write frame: {}", err);
        }
    }
}

/// A terminal has no keypad. Closes once the optional step budget runs out.
#[derive(Debug)]
pub struct TerminalControl {
    max_steps: Option<u64>,
    steps: u64,
}

impl TerminalControl {
    pub fn new(max_steps: Option<u64>) -> TerminalControl {
        TerminalControl {
            max_steps,
            steps: 0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Control for TerminalControl {
    fn is_closed(&mut self) -> bool {
        if let Some(max) = self.max_steps {
            if self.steps >= max {
                return true;
            }
        }
        self.steps += 1;
        false
    }

    fn is_pressed(&mut self, _key: u8) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_writes_frame() {
        let mut display = TerminalDisplay::new(Vec::new());
        display.draw(0, 0, &[0xC0]);

        display.show();

        let text = String::from_utf8(display.out.clone()).unwrap();
        let lines: Vec<&str> = text.lines().skip(1).collect();
        assert_eq!(lines.len(), 32);
        assert!(lines[0].starts_with("██░"));
        assert_eq!(lines[0].chars().count(), 64);
        assert!(lines[1].chars().all(|c| c == PIXEL_OFF));
    }

    #[test]
    fn test_render_with_palette() {
        let fg = Chip8Color::new(255, 0, 0);
        let bg = Chip8Color::new(0, 0, 255);
        let mut display = TerminalDisplay::new(Vec::new()).with_palette(fg, bg);
        display.draw(0, 0, &[0x80]);

        let text = display.render();

        let first = text.lines().nth(1).unwrap();
        assert!(first.starts_with(&format!("{}█{}░", fg.ansi_fg(), bg.ansi_fg())));
        assert!(first.ends_with(RESET));
    }

    #[test]
    fn test_clear() {
        let mut display = TerminalDisplay::new(Vec::new());
        assert!(!display.draw(3, 3, &[0xFF]));
        assert!(display.draw(3, 3, &[0x01]));

        display.clear();

        assert!(display.frame.is_blank());
    }

    #[test]
    fn test_control_budget() {
        let mut control = TerminalControl::new(Some(3));

        let open = (0..5).filter(|_| !control.is_closed()).count();

        assert_eq!(open, 3);
        assert_eq!(control.steps(), 3);
        assert!(!control.is_pressed(0x5));
    }

    #[test]
    fn test_control_unbounded() {
        let mut control = TerminalControl::new(None);

        assert!((0..1000).all(|_| !control.is_closed()));
    }
}
