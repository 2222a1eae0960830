pub use config::Config;
pub use cpu::Cpu;
pub use error::{Result, VmError};
pub use frame_buffer::FrameBuffer;
pub use instruction::{disassemble, disassemble_program};
pub use keypad::{KeyInput, Keypad};
pub use memory::MemoryImage;
pub use registers::Registers;
pub use scheduler::{Clock, Headless, Peripherals, Scheduler, SystemClock, VirtualClock};

mod config;
pub mod constants;
mod cpu;
mod error;
mod frame_buffer;
mod instruction;
mod keypad;
mod memory;
mod opcode;
mod operations;
mod registers;
mod scheduler;
