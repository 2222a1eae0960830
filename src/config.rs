use crate::constants::DEFAULT_CPU_FREQUENCY_HZ;
use crate::error::{Result, VmError};

/// # Config
/// Behaviour that historical CHIP-8 interpreters disagree on.
///
/// - `load_store_quirk` when set, Fx55/Fx65 leave I untouched; otherwise I ends at I + x + 1
/// - `shift_quirk` when set, 8xy6/8xyE shift Vx in place; otherwise Vy is shifted into Vx
/// - `overlapping_mode` when set, sprites wrap around the screen edges; otherwise they clip
/// - `strict` when set, out of range memory and stack accesses halt with an error
///   instead of being logged and ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub cpu_frequency_hz: u32,
    pub load_store_quirk: bool,
    pub shift_quirk: bool,
    pub overlapping_mode: bool,
    pub strict: bool,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.cpu_frequency_hz == 0 {
            return Err(VmError::InvalidFrequency);
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cpu_frequency_hz: DEFAULT_CPU_FREQUENCY_HZ,
            load_store_quirk: false,
            shift_quirk: true,
            overlapping_mode: true,
            strict: false,
        }
    }
}
