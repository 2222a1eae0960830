use std::io;

use thiserror::Error;

/// Errors raised by the virtual machine.
///
/// Outside of strict mode the bounds variants are only logged; see
/// [`Config::strict`](crate::Config::strict).
#[derive(Debug, Error)]
pub enum VmError {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("memory access out of range at address {address:#06X}")]
    AddressOutOfRange { address: u16 },

    #[error("stack overflow: no slot left to push return address {address:#06X}")]
    StackOverflow { address: u16 },

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("cpu frequency must be greater than 0 Hz")]
    InvalidFrequency,

    #[error("failed to read ROM: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VmError>;
