/// Width of the display in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// Height of the display in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Bytes of addressable memory
pub const MEMORY_SIZE: usize = 4096;

/// Highest valid memory address
pub const MAX_ADDRESS: u16 = 0xFFF;

/// Where ROMs are loaded into memory and where the pc starts
pub const PROGRAM_START: u16 = 0x200;

/// Largest ROM that fits between `PROGRAM_START` and `MAX_ADDRESS`
pub const MAX_ROM_SIZE: usize = (MAX_ADDRESS - PROGRAM_START) as usize;

/// Return addresses the call stack can hold
pub const STACK_DEPTH: usize = 16;

/// Bytes per glyph in the sprite sheet
pub const GLYPH_SIZE: u16 = 5;

/// Default instruction ticks per second
pub const DEFAULT_CPU_FREQUENCY_HZ: u32 = 500;

/// Timer (and render) ticks per second
pub const TIMER_FREQUENCY_HZ: u32 = 60;

/// # Sprite sheet
/// Glyphs for the hex digits 0..F, 5 bytes each, stored from address 0x000.
///
/// Each byte is a row of 8 pixels (only the high nibble is used), e.g. "0":
/// ```text
/// 0xF0  XXXX
/// 0x90  X  X
/// 0x90  X  X
/// 0x90  X  X
/// 0xF0  XXXX
/// ```
#[rustfmt::skip]
pub const SPRITE_SHEET: [u8; 80] = [
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
