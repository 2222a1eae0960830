use std::collections::VecDeque;

use log::warn;

/// Number of keys on the hex keypad
pub const KEY_COUNT: usize = 16;

/// Most press transitions kept while nobody polls; older ones are dropped
pub const MAX_PENDING_PRESSES: usize = KEY_COUNT;

/// # KeyInput
/// What the CPU needs to know about the 16 key hex keypad.
///
/// How physical input maps onto the key codes 0x0..=0xF is left to the host.
pub trait KeyInput {
    /// Whether the key `code` is currently held down
    fn is_pressed(&self, code: u8) -> bool;

    /// The next key that went from released to pressed since the last poll, if any.
    /// Never blocks.
    fn poll_press(&mut self) -> Option<u8>;
}

/// # Keypad
/// Tracks the pressed status of each key along with the presses not yet polled.
/// At most `MAX_PENDING_PRESSES` presses are kept; the oldest go first.
///
/// Hosts feed it with `press` and `release` as input events arrive.
#[derive(Debug, Default, Clone)]
pub struct Keypad {
    pressed: [bool; KEY_COUNT],
    presses: VecDeque<u8>,
}

impl Keypad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `code` the key that was pressed, 0x0..=0xF
    pub fn press(&mut self, code: u8) {
        let Some(key) = self.key_mut(code) else {
            return;
        };
        if !*key {
            *key = true;
            if self.presses.len() == MAX_PENDING_PRESSES {
                self.presses.pop_front();
            }
            self.presses.push_back(code);
        }
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `code` the key that was released, 0x0..=0xF
    pub fn release(&mut self, code: u8) {
        if let Some(key) = self.key_mut(code) {
            *key = false;
        }
    }

    fn key_mut(&mut self, code: u8) -> Option<&mut bool> {
        let key = self.pressed.get_mut(code as usize);
        if key.is_none() {
            warn!("ignoring unknown key code {:#04X}", code);
        }
        key
    }
}

impl KeyInput for Keypad {
    fn is_pressed(&self, code: u8) -> bool {
        self.pressed.get(code as usize).copied().unwrap_or(false)
    }

    fn poll_press(&mut self) -> Option<u8> {
        self.presses.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_and_release() {
        let mut keypad = Keypad::new();
        keypad.press(0xA);
        assert!(keypad.is_pressed(0xA));
        assert!(!keypad.is_pressed(0xB));
        keypad.release(0xA);
        assert!(!keypad.is_pressed(0xA));
    }

    #[test]
    fn test_polls_transitions_in_order() {
        let mut keypad = Keypad::new();
        keypad.press(0x3);
        keypad.press(0x1);
        assert_eq!(keypad.poll_press(), Some(0x3));
        assert_eq!(keypad.poll_press(), Some(0x1));
        assert_eq!(keypad.poll_press(), None);
    }

    #[test]
    fn test_held_key_is_one_transition() {
        let mut keypad = Keypad::new();
        keypad.press(0x5);
        keypad.press(0x5);
        assert_eq!(keypad.poll_press(), Some(0x5));
        assert_eq!(keypad.poll_press(), None);
        keypad.release(0x5);
        keypad.press(0x5);
        assert_eq!(keypad.poll_press(), Some(0x5));
    }

    #[test]
    fn test_unpolled_presses_are_bounded() {
        let mut keypad = Keypad::new();
        for n in 0..100_000u32 {
            let code = (n % 16) as u8;
            keypad.press(code);
            keypad.release(code);
        }
        let mut pending = Vec::new();
        while let Some(code) = keypad.poll_press() {
            pending.push(code);
        }
        assert_eq!(pending.len(), MAX_PENDING_PRESSES);
        // the newest presses survive: 100_000 - 16 = 99_984, a multiple of 16
        assert_eq!(pending, (0..16).collect::<Vec<u8>>());
    }

    #[test]
    fn test_ignores_unknown_codes() {
        let mut keypad = Keypad::new();
        keypad.press(0x10);
        assert!(!keypad.is_pressed(0x10));
        assert_eq!(keypad.poll_press(), None);
    }
}
