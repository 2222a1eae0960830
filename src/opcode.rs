/// # Opcodes
///
/// Chip-8 opcodes are 16 bits, fetched as two bytes with the first byte high.
/// The operation is selected by:
/// - `(n, _, _, _)` the family; applies to all opcodes
/// - `(_, _, _, n)` the operation within families 0x5, 0x8 and 0x9
/// - `(_, _, n, n)` the operation within families 0x0, 0xE and 0xF
///
/// The remaining nibbles carry operands:
/// - `(_, n, n, n)` a 12-bit address
/// - `(_, _, n, n)` an immediate byte
/// - `(_, n, _, _)` the register Vx, or the last register of the range V0..=Vx
/// - `(_, _, n, _)` the register Vy
/// - `(_, _, _, n)` a sprite height
pub trait Opcode {
    /// The Opcode's component nibbles.
    fn nibbles(&self) -> (u8, u8, u8, u8);

    /// The Opcode's most significant nibble.
    /// `[f___]`
    fn family(&self) -> u8;

    /// The Opcode's second nibble as a register index.
    /// `[_x__]`
    fn x(&self) -> usize;

    /// The Opcode's third nibble as a register index.
    /// `[__y_]`
    fn y(&self) -> usize;

    /// The Opcode's fourth nibble.
    /// `[___n]`
    fn n(&self) -> u8;

    /// The Opcode's least significant byte.
    /// `[__kk]`
    fn kk(&self) -> u8;

    /// The Opcode without its most significant nibble.
    /// `[_nnn]`
    fn nnn(&self) -> u16;
}

impl Opcode for u16 {
    fn nibbles(&self) -> (u8, u8, u8, u8) {
        (self.family(), self.x() as u8, self.y() as u8, self.n())
    }

    fn family(&self) -> u8 {
        ((self & 0xF000) >> 12) as u8
    }

    fn x(&self) -> usize {
        ((self & 0x0F00) >> 8) as usize
    }

    fn y(&self) -> usize {
        ((self & 0x00F0) >> 4) as usize
    }

    fn n(&self) -> u8 {
        (self & 0x000F) as u8
    }

    fn kk(&self) -> u8 {
        (self & 0x00FF) as u8
    }

    fn nnn(&self) -> u16 {
        self & 0x0FFF
    }
}

/// Joins two bytes fetched from memory into an opcode
pub fn from_bytes(high: u8, low: u8) -> u16 {
    u16::from(high) << 8 | u16::from(low)
}

#[cfg(test)]
mod test_opcode {
    use super::*;

    #[test]
    fn test_nibbles() {
        let op: u16 = 0xABCD;
        assert_eq!(op.nibbles(), (0xA, 0xB, 0xC, 0xD));
    }

    #[test]
    fn test_family() {
        let op: u16 = 0xABCD;
        assert_eq!(op.family(), 0xA);
    }

    #[test]
    fn test_x() {
        let op: u16 = 0xABCD;
        assert_eq!(op.x(), 0xB);
    }

    #[test]
    fn test_y() {
        let op: u16 = 0xABCD;
        assert_eq!(op.y(), 0xC);
    }

    #[test]
    fn test_n() {
        let op: u16 = 0xABCD;
        assert_eq!(op.n(), 0xD);
    }

    #[test]
    fn test_kk() {
        let op: u16 = 0xABCD;
        assert_eq!(op.kk(), 0xCD);
    }

    #[test]
    fn test_nnn() {
        let op: u16 = 0xABCD;
        assert_eq!(op.nnn(), 0x0BCD);
    }

    #[test]
    fn test_from_bytes() {
        assert_eq!(from_bytes(0x00, 0xE0), 0x00E0);
        assert_eq!(from_bytes(0xD1, 0x25), 0xD125);
    }
}
