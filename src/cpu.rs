use std::io::Read;

use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::error::{Result, VmError};
use crate::frame_buffer::FrameBuffer;
use crate::instruction::{disassemble, from_op};
use crate::keypad::KeyInput;
use crate::memory::MemoryImage;
use crate::opcode;
use crate::registers::Registers;

/// # Chip-8 CPU
/// The fetch-decode-execute engine.
///
/// Owns:
///  - `memory` the address space, sprite sheet and call stack
///  - `registers` V0..VF, I, the timers, pc and sp
///  - `frame_buffer` the 64x32 display contents
///  - `awaiting_key` the register waiting on Fx0A, if any
///
/// Supplies interfaces for:
/// - loading roms
/// - stepping a single instruction
/// - inspecting its state for rendering and debugging
pub struct Cpu {
    pub(crate) memory: MemoryImage,
    pub(crate) registers: Registers,
    pub(crate) frame_buffer: FrameBuffer,
    pub(crate) config: Config,
    pub(crate) rng: StdRng,
    pub(crate) awaiting_key: Option<usize>,
    current_opcode: u16,
}

impl Cpu {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// A cpu whose random numbers are reproducible
    pub fn with_seed(config: Config, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: Config, rng: StdRng) -> Self {
        Cpu {
            memory: MemoryImage::new(),
            registers: Registers::new(),
            frame_buffer: FrameBuffer::new(config.overlapping_mode),
            config,
            rng,
            awaiting_key: None,
            current_opcode: 0,
        }
    }

    /// Load a rom at 0x200, returning its size
    pub fn load_program(&mut self, rom: &[u8]) -> Result<usize> {
        self.memory.load_program(rom)
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_program_from(&mut self, reader: &mut dyn Read) -> Result<usize> {
        self.memory.load_program_from(reader)
    }

    /// Advances the CPU by a single instruction
    /// - while awaiting a keypress, polls for one instead of fetching
    /// - otherwise fetches the opcode at pc, moves pc past it and executes it
    pub fn step(&mut self, keys: &mut dyn KeyInput) -> Result<()> {
        if let Some(register) = self.awaiting_key {
            if let Some(key) = keys.poll_press() {
                debug!("key {:X} pressed, stored in V{:X}", key, register);
                self.registers.v[register] = key;
                self.awaiting_key = None;
            }
            return Ok(());
        }

        let pc = self.registers.pc;
        let op = self.fetch()?;
        self.current_opcode = op;
        self.registers.pc = pc.wrapping_add(0x2);

        match from_op(&op) {
            Some(operation) => {
                trace!(
                    "{:03X} {:04X} {:<14} v{:02X?} i{:04X} sp{}",
                    pc,
                    op,
                    disassemble(op),
                    self.registers.v,
                    self.registers.i,
                    self.registers.sp
                );
                operation(&op, self, &*keys)?;
            }
            None => debug!("{:03X} unknown opcode {:04X}, skipping", pc, op),
        }

        if let Some(register) = self.awaiting_key {
            debug!("waiting for a key press for V{:X}", register);
            // only a press made after the wait began may satisfy it
            while keys.poll_press().is_some() {}
        }
        Ok(())
    }

    /// Gets the opcode currently pointed at by the pc.
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Result<u16> {
        let pc = self.registers.pc;
        Ok(opcode::from_bytes(
            self.read(pc)?,
            self.read(pc.wrapping_add(1))?,
        ))
    }

    /// Reads memory under the configured bounds policy
    pub(crate) fn read(&self, address: u16) -> Result<u8> {
        if self.config.strict {
            self.memory.try_get(address)
        } else {
            Ok(self.memory.get(address))
        }
    }

    /// Writes memory under the configured bounds policy
    pub(crate) fn write(&mut self, address: u16, value: u8) -> Result<()> {
        if self.config.strict {
            self.memory.try_set(address, value)
        } else {
            self.memory.set(address, value);
            Ok(())
        }
    }

    /// Pushes a return address; outside strict mode a full stack drops it
    pub(crate) fn push(&mut self, address: u16) -> Result<()> {
        match self.memory.push_stack(&mut self.registers.sp, address) {
            Err(e @ VmError::StackOverflow { .. }) if !self.config.strict => {
                warn!("{}; continuing without it", e);
                Ok(())
            }
            other => other,
        }
    }

    /// Pops a return address; outside strict mode an empty stack yields None
    pub(crate) fn pop(&mut self) -> Result<Option<u16>> {
        match self.memory.pop_stack(&mut self.registers.sp) {
            Ok(address) => Ok(Some(address)),
            Err(e) if !self.config.strict => {
                warn!("{}; ignoring return", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    pub fn memory(&self) -> &MemoryImage {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut MemoryImage {
        &mut self.memory
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The register waiting on a key press, if execution is suspended
    pub fn awaiting_key(&self) -> Option<usize> {
        self.awaiting_key
    }

    /// The last opcode fetched
    pub fn current_opcode(&self) -> u16 {
        self.current_opcode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypad::Keypad;

    fn cpu_with(rom: &[u8]) -> Cpu {
        let mut cpu = Cpu::with_seed(Config::default(), 8);
        cpu.load_program(rom).unwrap();
        cpu
    }

    #[test]
    fn test_cpu_gets_op() {
        let cpu = cpu_with(&[0xAA, 0xBB]);
        assert_eq!(cpu.fetch().unwrap(), 0xAABB);
    }

    #[test]
    fn test_step_advances_pc() {
        let mut cpu = cpu_with(&[0x60, 0x42]);
        cpu.step(&mut Keypad::new()).unwrap();
        assert_eq!(cpu.registers.pc, 0x202);
        assert_eq!(cpu.registers.v[0x0], 0x42);
        assert_eq!(cpu.current_opcode(), 0x6042);
    }

    #[test]
    fn test_cls_program() {
        let mut cpu = cpu_with(&[0x00, 0xE0]);
        cpu.frame_buffer.set_pixel(3, 4, true);
        cpu.step(&mut Keypad::new()).unwrap();
        assert!(cpu.frame_buffer().rows().iter().flatten().all(|p| !p));
        assert_eq!(cpu.registers.pc, 0x202);
    }

    #[test]
    fn test_jump_program() {
        let mut cpu = cpu_with(&[0x13, 0x00]);
        cpu.step(&mut Keypad::new()).unwrap();
        assert_eq!(cpu.registers.pc, 0x300);
    }

    #[test]
    fn test_unknown_opcode_is_skipped() {
        let mut cpu = cpu_with(&[0x5A, 0xB1, 0xFF, 0xFF]);
        let before = *cpu.registers();
        cpu.step(&mut Keypad::new()).unwrap();
        cpu.step(&mut Keypad::new()).unwrap();
        assert_eq!(cpu.registers.pc, 0x204);
        assert_eq!(cpu.registers.v, before.v);
    }

    #[test]
    fn test_call_and_return() {
        // 0x200 CALL 0x206; 0x202 LD V1, 0x11; 0x206 LD V2, 0x22; 0x208 RET
        let mut cpu = cpu_with(&[0x22, 0x06, 0x61, 0x11, 0x00, 0x00, 0x62, 0x22, 0x00, 0xEE]);
        let mut keys = Keypad::new();
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.registers.pc, 0x206);
        assert_eq!(cpu.registers.sp, 0);
        cpu.step(&mut keys).unwrap();
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.registers.pc, 0x202);
        assert_eq!(cpu.registers.sp, -1);
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.registers.v[0x1], 0x11);
        assert_eq!(cpu.registers.v[0x2], 0x22);
    }

    #[test]
    fn test_doesnt_cycle_while_register_needs_key() {
        let mut cpu = cpu_with(&[0xF3, 0x0A, 0x60, 0x01]);
        let mut keys = Keypad::new();
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.awaiting_key(), Some(0x3));
        for _ in 0..3 {
            cpu.step(&mut keys).unwrap();
        }
        assert_eq!(cpu.registers.pc, 0x202);
        assert_eq!(cpu.registers.v[0x0], 0x0);
    }

    #[test]
    fn test_captures_key_presses() {
        let mut cpu = cpu_with(&[0xF3, 0x0A, 0x60, 0x01]);
        let mut keys = Keypad::new();
        cpu.step(&mut keys).unwrap();
        keys.press(0xE);
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.awaiting_key(), None);
        assert_eq!(cpu.registers.v[0x3], 0xE);
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.registers.v[0x0], 0x1);
    }

    #[test]
    fn test_stale_press_doesnt_satisfy_wait() {
        let mut cpu = cpu_with(&[0xF3, 0x0A]);
        let mut keys = Keypad::new();
        keys.press(0x7);
        cpu.step(&mut keys).unwrap();
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.awaiting_key(), Some(0x3));
        keys.release(0x7);
        keys.press(0x7);
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.awaiting_key(), None);
        assert_eq!(cpu.registers.v[0x3], 0x7);
    }

    #[test]
    fn test_presses_without_key_wait_stay_bounded() {
        let mut cpu = cpu_with(&[0x12, 0x00]);
        let mut keys = Keypad::new();
        for _ in 0..10_000 {
            keys.press(0x4);
            cpu.step(&mut keys).unwrap();
            keys.release(0x4);
        }
        let mut pending = 0;
        while keys.poll_press().is_some() {
            pending += 1;
        }
        assert!(pending <= crate::keypad::MAX_PENDING_PRESSES);
    }

    #[test]
    fn test_permissive_return_on_empty_stack() {
        let mut cpu = cpu_with(&[0x00, 0xEE]);
        cpu.step(&mut Keypad::new()).unwrap();
        assert_eq!(cpu.registers.pc, 0x202);
        assert_eq!(cpu.registers.sp, -1);
    }

    #[test]
    fn test_strict_return_on_empty_stack() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let mut cpu = Cpu::with_seed(config, 0);
        cpu.load_program(&[0x00, 0xEE]).unwrap();
        assert!(matches!(
            cpu.step(&mut Keypad::new()),
            Err(VmError::StackUnderflow)
        ));
    }

    #[test]
    fn test_permissive_stack_overflow_still_jumps() {
        // CALL 0x200 forever
        let mut cpu = cpu_with(&[0x22, 0x00]);
        let mut keys = Keypad::new();
        for _ in 0..20 {
            cpu.step(&mut keys).unwrap();
        }
        assert_eq!(cpu.registers.sp, 15);
        assert_eq!(cpu.registers.pc, 0x200);
    }

    #[test]
    fn test_strict_stack_overflow() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let mut cpu = Cpu::with_seed(config, 0);
        cpu.load_program(&[0x22, 0x00]).unwrap();
        let mut keys = Keypad::new();
        for _ in 0..16 {
            cpu.step(&mut keys).unwrap();
        }
        assert!(matches!(
            cpu.step(&mut keys),
            Err(VmError::StackOverflow { address: 0x202 })
        ));
    }

    #[test]
    fn test_strict_out_of_range_store() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let mut cpu = Cpu::with_seed(config, 0);
        // LD I, 0xFFE; LD [I], V3
        cpu.load_program(&[0xAF, 0xFE, 0xF3, 0x55]).unwrap();
        let mut keys = Keypad::new();
        cpu.step(&mut keys).unwrap();
        assert!(matches!(
            cpu.step(&mut keys),
            Err(VmError::AddressOutOfRange { address: 0x1000 })
        ));
    }

    #[test]
    fn test_permissive_out_of_range_store() {
        // LD I, 0xFFE; LD [I], V3
        let mut cpu = cpu_with(&[0xAF, 0xFE, 0xF3, 0x55]);
        let mut keys = Keypad::new();
        cpu.step(&mut keys).unwrap();
        cpu.step(&mut keys).unwrap();
        assert_eq!(cpu.registers.i, 0x1002);
        assert_eq!(cpu.registers.pc, 0x204);
    }

    #[test]
    fn test_pc_out_of_range() {
        let config = Config {
            strict: true,
            ..Config::default()
        };
        let mut cpu = Cpu::with_seed(config, 0);
        cpu.registers.pc = 0xFFF;
        assert!(matches!(
            cpu.step(&mut Keypad::new()),
            Err(VmError::AddressOutOfRange { address: 0x1000 })
        ));
    }
}
