use crate::constants::PROGRAM_START;
use crate::memory::EMPTY_STACK;

/// # Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is overwritten as the carry, borrow, shift and collision flag
/// - (i) a 16-bit memory address register; only the low 12 bits address memory
///
/// Counter
/// - (pc) a 16-bit program counter, starting at 0x200
///
/// Pointer
/// - (sp) the stack pointer, -1 while the call stack is empty
///
/// Timers
/// - 2 8-bit timers (delay & sound), only ever counted down by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: i8,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

impl Registers {
    pub fn new() -> Self {
        Registers {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: EMPTY_STACK,
            delay_timer: 0,
            sound_timer: 0,
        }
    }

    /// Counts both timers down by one, stopping at 0
    pub fn decrement_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
