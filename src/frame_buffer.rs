use log::warn;

use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use crate::memory::MemoryImage;

/// Pixel grid indexed as [y][x]
pub type Pixels = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// # Frame buffer
/// The Chip-8 display is composed of 64x32 black/white pixels, stored as booleans.
///
/// Sprites are XORed onto the grid. In overlapping mode coordinates wrap around
/// the edges (negative ones included); otherwise pixels landing off screen are
/// dropped and a warning is logged the first time it happens.
#[derive(Clone)]
pub struct FrameBuffer {
    pixels: Pixels,
    overlapping_mode: bool,
    clip_warned: bool,
}

impl FrameBuffer {
    pub const WIDTH: usize = DISPLAY_WIDTH;
    pub const HEIGHT: usize = DISPLAY_HEIGHT;

    pub fn new(overlapping_mode: bool) -> Self {
        FrameBuffer {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            overlapping_mode,
            clip_warned: false,
        }
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    pub fn rows(&self) -> &Pixels {
        &self.pixels
    }

    /// Reads a pixel; coordinates wrap around the screen
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH]
    }

    /// Packs the 8 pixels starting at (x, y) into a byte, leftmost pixel as the MSB
    pub fn get_byte(&self, x: usize, y: usize) -> u8 {
        (0..8).fold(0, |byte, bit| {
            (byte << 1) | u8::from(self.get_pixel(x + bit, y))
        })
    }

    /// Overwrites a pixel without XOR
    pub fn set_pixel(&mut self, x: i32, y: i32, value: bool) {
        if let Some((x, y)) = self.locate(x, y) {
            self.pixels[y][x] = value;
        }
    }

    /// draw_sprite(x, y, address, n)
    /// XORs the `n` byte sprite at `address` onto the screen with its top left corner at (x, y).
    /// Returns true if any pixel was switched from on to off.
    pub fn draw_sprite(
        &mut self,
        memory: &MemoryImage,
        x: i32,
        y: i32,
        address: u16,
        n: u8,
    ) -> bool {
        let mut collision = false;
        for row in 0..n {
            let sprite_byte = memory.get(address.wrapping_add(u16::from(row)));
            for bit in 0..8 {
                if sprite_byte & (0x80 >> bit) == 0 {
                    continue;
                }
                collision |= self.flip(x + bit, y + i32::from(row));
            }
        }
        collision
    }

    /// XORs a single on-bit onto the grid, returning whether it erased a pixel
    fn flip(&mut self, x: i32, y: i32) -> bool {
        match self.locate(x, y) {
            Some((x, y)) => {
                let was_on = self.pixels[y][x];
                self.pixels[y][x] = !was_on;
                was_on
            }
            None => false,
        }
    }

    /// Maps raw coordinates onto the grid according to the addressing mode
    fn locate(&mut self, x: i32, y: i32) -> Option<(usize, usize)> {
        if self.overlapping_mode {
            return Some((
                x.rem_euclid(DISPLAY_WIDTH as i32) as usize,
                y.rem_euclid(DISPLAY_HEIGHT as i32) as usize,
            ));
        }
        if (0..DISPLAY_WIDTH as i32).contains(&x) && (0..DISPLAY_HEIGHT as i32).contains(&y) {
            Some((x as usize, y as usize))
        } else {
            if !self.clip_warned {
                warn!(
                    "pixel ({}, {}) is off screen and overlapping mode is off; clipping",
                    x, y
                );
                self.clip_warned = true;
            }
            None
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(address: u16, sprite: &[u8]) -> MemoryImage {
        let mut memory = MemoryImage::new();
        for (offset, byte) in sprite.iter().enumerate() {
            memory.set(address + offset as u16, *byte);
        }
        memory
    }

    #[test]
    fn test_starts_blank() {
        let fb = FrameBuffer::new(true);
        assert!(fb.rows().iter().flatten().all(|p| !p));
    }

    #[test]
    fn test_draw_glyph() {
        let memory = MemoryImage::new();
        let mut fb = FrameBuffer::new(true);
        assert!(!fb.draw_sprite(&memory, 0, 0, 0x0, 5));
        assert_eq!(fb.get_byte(0, 0), 0xF0);
        assert_eq!(fb.get_byte(0, 1), 0x90);
        assert_eq!(fb.get_byte(0, 4), 0xF0);
        assert!(fb.get_pixel(0, 0));
        assert!(!fb.get_pixel(4, 0));
    }

    #[test]
    fn test_draw_collision_xors() {
        let sprite = [0x88, 0xD8, 0xD8, 0xD8, 0x88];
        let memory = memory_with(0x300, &sprite);
        let mut fb = FrameBuffer::new(true);
        fb.draw_sprite(&memory, 10, 7, 0x0, 5);
        assert!(fb.draw_sprite(&memory, 10, 7, 0x300, 5));
        let glyph = [0xF0, 0x90, 0x90, 0x90, 0xF0];
        for row in 0..5 {
            assert_eq!(fb.get_byte(10, 7 + row), glyph[row] ^ sprite[row]);
        }
    }

    #[test]
    fn test_draw_twice_erases() {
        let memory = MemoryImage::new();
        let mut fb = FrameBuffer::new(true);
        fb.draw_sprite(&memory, 3, 3, 0x0, 5);
        assert!(fb.draw_sprite(&memory, 3, 3, 0x0, 5));
        assert!(fb.rows().iter().flatten().all(|p| !p));
    }

    #[test]
    fn test_disjoint_sprites_dont_collide() {
        let memory = MemoryImage::new();
        let mut fb = FrameBuffer::new(true);
        fb.draw_sprite(&memory, 0, 0, 0x0, 5);
        assert!(!fb.draw_sprite(&memory, 8, 0, 0x0, 5));
    }

    #[test]
    fn test_overlapping_wraps() {
        let memory = memory_with(0x300, &[0xFF, 0xFF]);
        let mut fb = FrameBuffer::new(true);
        fb.draw_sprite(&memory, 60, 31, 0x300, 2);
        assert!(fb.get_pixel(63, 31));
        assert!(fb.get_pixel(0, 31));
        assert!(fb.get_pixel(3, 0));
        assert!(!fb.get_pixel(4, 0));
    }

    #[test]
    fn test_overlapping_wraps_negative() {
        let mut fb = FrameBuffer::new(true);
        fb.set_pixel(-1, -1, true);
        assert!(fb.get_pixel(63, 31));
    }

    #[test]
    fn test_clipped_drops_off_screen_pixels() {
        let memory = memory_with(0x300, &[0xFF, 0xFF]);
        let mut fb = FrameBuffer::new(false);
        fb.draw_sprite(&memory, 60, 31, 0x300, 2);
        assert!(fb.get_pixel(60, 31));
        assert!(fb.get_pixel(63, 31));
        assert!(!fb.get_pixel(0, 31));
        assert!(!fb.get_pixel(0, 0));
        assert!(fb.clip_warned);
        assert_eq!(fb.rows().iter().flatten().filter(|p| **p).count(), 4);
    }

    #[test]
    fn test_clipped_negative_is_dropped() {
        let mut fb = FrameBuffer::new(false);
        fb.set_pixel(-1, 0, true);
        assert!(fb.rows().iter().flatten().all(|p| !p));
    }

    #[test]
    fn test_set_pixel_overwrites() {
        let mut fb = FrameBuffer::new(true);
        fb.set_pixel(5, 5, true);
        fb.set_pixel(5, 5, true);
        assert!(fb.get_pixel(5, 5));
        fb.set_pixel(5, 5, false);
        assert!(!fb.get_pixel(5, 5));
    }

    #[test]
    fn test_get_byte_wraps() {
        let mut fb = FrameBuffer::new(true);
        fb.set_pixel(63, 0, true);
        fb.set_pixel(0, 0, true);
        assert_eq!(fb.get_byte(63, 0), 0b1100_0000);
        assert_eq!(fb.get_byte(63, 32), 0b1100_0000);
    }

    #[test]
    fn test_clear() {
        let memory = MemoryImage::new();
        let mut fb = FrameBuffer::new(true);
        fb.draw_sprite(&memory, 0, 0, 0x0, 5);
        fb.clear();
        assert!(fb.rows().iter().flatten().all(|p| !p));
    }
}
