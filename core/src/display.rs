pub const SCREEN_WIDTH: usize = 64;
pub const SCREEN_HEIGHT: usize = 32;

/// Rendering capability consumed by the engine.
///
/// The engine never owns a concrete renderer, only something that can
/// clear, XOR-draw sprites and present the result.
pub trait Display {
    /// Turn every pixel off
    fn clear(&mut self);

    /// XOR `rows` (8 pixels per byte, MSB leftmost) onto the screen with the
    /// top-left corner at (`x`, `y`). Returns true if any pixel was turned off.
    fn draw(&mut self, x: u8, y: u8, rows: &[u8]) -> bool;

    /// Present the current frame. Batching and timing are up to the renderer.
    fn show(&mut self);
}

/// In-memory 64x32 monochrome screen, stored row-major.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Framebuffer {
    pixels: Vec<bool>,
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            pixels: vec![false; SCREEN_WIDTH * SCREEN_HEIGHT],
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < SCREEN_WIDTH && y < SCREEN_HEIGHT && self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.pixels.chunks(SCREEN_WIDTH)
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| !p)
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Framebuffer::new()
    }
}

impl Display for Framebuffer {
    fn clear(&mut self) {
        self.pixels.iter_mut().for_each(|p| *p = false);
    }

    fn draw(&mut self, x: u8, y: u8, rows: &[u8]) -> bool {
        // Origin wraps, the sprite itself is clipped at the edges
        let ox = x as usize % SCREEN_WIDTH;
        let oy = y as usize % SCREEN_HEIGHT;
        let mut collision = false;

        for (row, data) in rows.iter().enumerate() {
            let y = oy + row;
            if y >= SCREEN_HEIGHT {
                break;
            }

            for column in 0..8 {
                let x = ox + column;
                if x >= SCREEN_WIDTH {
                    break;
                }

                let mask = 0x80 >> column;
                if data & mask == 0 {
                    continue;
                }

                let pixel = &mut self.pixels[y * SCREEN_WIDTH + x];
                if *pixel {
                    collision = true;
                }
                *pixel = !*pixel;
            }
        }

        collision
    }

    fn show(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(fb: &Framebuffer) -> Vec<(usize, usize)> {
        (0..SCREEN_HEIGHT)
            .flat_map(|y| (0..SCREEN_WIDTH).map(move |x| (x, y)))
            .filter(|&(x, y)| fb.pixel(x, y))
            .collect()
    }

    #[test]
    fn test_draw_sets_pixels_msb_first() {
        let mut fb = Framebuffer::new();

        let collision = fb.draw(2, 3, &[0b1000_0001, 0b0100_0000]);

        assert!(!collision);
        assert_eq!(lit(&fb), vec![(2, 3), (9, 3), (3, 4)]);
    }

    #[test]
    fn test_draw_twice_restores_screen() {
        let mut fb = Framebuffer::new();
        fb.draw(0, 0, &[0xFF]);
        let before = fb.clone();

        assert!(!fb.draw(10, 5, &[0xF0, 0x90, 0xF0]));
        assert_ne!(fb, before);
        assert!(fb.draw(10, 5, &[0xF0, 0x90, 0xF0]));
        assert_eq!(fb, before);
    }

    #[test]
    fn test_draw_zero_bits_never_change_pixels() {
        let mut fb = Framebuffer::new();
        fb.draw(0, 0, &[0xFF]);

        assert!(!fb.draw(0, 0, &[0x00]));
        assert_eq!(lit(&fb).len(), 8);
    }

    #[test]
    fn test_draw_wraps_origin() {
        let mut fb = Framebuffer::new();

        fb.draw(64 + 4, 32 + 1, &[0x80]);

        assert_eq!(lit(&fb), vec![(4, 1)]);
    }

    #[test]
    fn test_draw_clips_right_edge() {
        let mut fb = Framebuffer::new();

        fb.draw(60, 0, &[0xFF]);

        assert_eq!(lit(&fb), vec![(60, 0), (61, 0), (62, 0), (63, 0)]);
    }

    #[test]
    fn test_draw_clips_bottom_edge() {
        let mut fb = Framebuffer::new();

        fb.draw(0, 30, &[0x80, 0x80, 0x80, 0x80]);

        assert_eq!(lit(&fb), vec![(0, 30), (0, 31)]);
    }

    #[test]
    fn test_clear() {
        let mut fb = Framebuffer::new();
        fb.draw(0, 0, &[0xFF; 15]);
        assert!(!fb.is_blank());

        fb.clear();
        fb.show();

        assert!(fb.is_blank());
    }

    #[test]
    fn test_rows() {
        let mut fb = Framebuffer::new();
        fb.draw(63, 31, &[0x80]);

        let rows: Vec<&[bool]> = fb.rows().collect();
        assert_eq!(rows.len(), SCREEN_HEIGHT);
        assert!(rows[31][63]);
        assert_eq!(fb.pixels().iter().filter(|&&p| p).count(), 1);
    }
}
