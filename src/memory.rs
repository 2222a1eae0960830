use std::io::Read;

use log::warn;

use crate::constants::{
    GLYPH_SIZE, MAX_ADDRESS, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET, STACK_DEPTH,
};
use crate::error::{Result, VmError};

/// Stack pointer value of an empty call stack
pub const EMPTY_STACK: i8 = -1;

/// # Memory
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the sprite sheet for the hex digits
///     - 0x200.. is where ROMs are loaded
/// - a 16 slot call stack kept apart from addressable memory
///     - indexed by the stack pointer, which is -1 while the stack is empty
///
/// The plain accessors never fail: out of range reads give 0 and out of range
/// writes are dropped, both with a warning. The `try_` variants report the
/// same conditions as errors instead.
#[derive(Clone)]
pub struct MemoryImage {
    bytes: [u8; MEMORY_SIZE],
    stack: [u16; STACK_DEPTH],
}

impl MemoryImage {
    pub fn new() -> Self {
        let mut bytes = [0; MEMORY_SIZE];
        bytes[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);
        MemoryImage {
            bytes,
            stack: [0; STACK_DEPTH],
        }
    }

    /// Address of the glyph for hex `digit`; only the low nibble is used
    pub fn glyph_address(digit: u8) -> u16 {
        u16::from(digit & 0xF) * GLYPH_SIZE
    }

    pub fn get(&self, address: u16) -> u8 {
        self.try_get(address).unwrap_or_else(|e| {
            warn!("{}; reading 0", e);
            0
        })
    }

    pub fn set(&mut self, address: u16, value: u8) {
        if let Err(e) = self.try_set(address, value) {
            warn!("{}; write of {:#04X} dropped", e, value);
        }
    }

    pub fn try_get(&self, address: u16) -> Result<u8> {
        check_address(address)?;
        Ok(self.bytes[address as usize])
    }

    pub fn try_set(&mut self, address: u16, value: u8) -> Result<()> {
        check_address(address)?;
        self.bytes[address as usize] = value;
        Ok(())
    }

    /// Read-only view of `len` bytes from `address`, cut short at the end of memory
    pub fn slice(&self, address: u16, len: usize) -> &[u8] {
        let start = (address as usize).min(MEMORY_SIZE);
        let end = start.saturating_add(len).min(MEMORY_SIZE);
        &self.bytes[start..end]
    }

    /// Pushes a return address
    /// - increments `sp` and then writes to that slot
    /// - a full stack is left untouched and reported as `StackOverflow`
    pub fn push_stack(&mut self, sp: &mut i8, address: u16) -> Result<()> {
        let slot = sp.wrapping_add(1);
        if slot < 0 || slot as usize >= STACK_DEPTH {
            return Err(VmError::StackOverflow { address });
        }
        self.stack[slot as usize] = address;
        *sp = slot;
        Ok(())
    }

    /// Pops a return address
    /// - reads the slot at `sp` and then decrements it
    /// - an empty stack is left untouched and reported as `StackUnderflow`
    pub fn pop_stack(&mut self, sp: &mut i8) -> Result<u16> {
        if *sp < 0 || *sp as usize >= STACK_DEPTH {
            return Err(VmError::StackUnderflow);
        }
        let address = self.stack[*sp as usize];
        *sp -= 1;
        Ok(address)
    }

    /// Copies a ROM into memory at `PROGRAM_START`.
    /// Returns the number of bytes loaded; an oversized ROM installs nothing.
    pub fn load_program(&mut self, rom: &[u8]) -> Result<usize> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(VmError::RomTooLarge {
                size: rom.len(),
                max: MAX_ROM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.bytes[start..start + rom.len()].copy_from_slice(rom);
        Ok(rom.len())
    }

    /// Load a rom from a reader
    ///
    /// # Arguments
    /// * `reader` a source that contains a ROM, e.g. an open file
    pub fn load_program_from(&mut self, reader: &mut dyn Read) -> Result<usize> {
        let mut rom = Vec::new();
        reader.read_to_end(&mut rom)?;
        self.load_program(&rom)
    }
}

impl Default for MemoryImage {
    fn default() -> Self {
        Self::new()
    }
}

fn check_address(address: u16) -> Result<()> {
    if address > MAX_ADDRESS {
        Err(VmError::AddressOutOfRange { address })
    } else {
        Ok(())
    }
}
