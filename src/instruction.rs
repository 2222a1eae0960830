use crate::cpu::Cpu;
use crate::error::Result;
use crate::keypad::KeyInput;
use crate::opcode::Opcode;
use crate::operations::*;

/// An executable operation; pc has already been moved past the opcode
pub type Operation = fn(op: &dyn Opcode, cpu: &mut Cpu, keys: &dyn KeyInput) -> Result<()>;

/// Selects the correct Operation for a given Opcode
/// Returns None for words that aren't Chip-8 instructions
pub fn from_op(op: &dyn Opcode) -> Option<Operation> {
    let operation: Operation = match op.nibbles() {
        (0x0, 0x0, 0xE, 0x0) => clr,
        (0x0, 0x0, 0xE, 0xE) => rts,
        (0x0, ..) => sys,
        (0x1, ..) => jump,
        (0x2, ..) => call,
        (0x3, ..) => ske,
        (0x4, ..) => skne,
        (0x5, .., 0x0) => skre,
        (0x6, ..) => load,
        (0x7, ..) => add,
        (0x8, .., 0x0) => mv,
        (0x8, .., 0x1) => or,
        (0x8, .., 0x2) => and,
        (0x8, .., 0x3) => xor,
        (0x8, .., 0x4) => addr,
        (0x8, .., 0x5) => sub,
        (0x8, .., 0x6) => shr,
        (0x8, .., 0x7) => subn,
        (0x8, .., 0xE) => shl,
        (0x9, .., 0x0) => skrne,
        (0xA, ..) => loadi,
        (0xB, ..) => jumpi,
        (0xC, ..) => rand,
        (0xD, ..) => draw,
        (0xE, .., 0x9, 0xE) => skpr,
        (0xE, .., 0xA, 0x1) => skup,
        (0xF, .., 0x0, 0x7) => moved,
        (0xF, .., 0x0, 0xA) => keyd,
        (0xF, .., 0x1, 0x5) => loads,
        (0xF, .., 0x1, 0x8) => ld,
        (0xF, .., 0x1, 0xE) => addi,
        (0xF, .., 0x2, 0x9) => ldspr,
        (0xF, .., 0x3, 0x3) => bcd,
        (0xF, .., 0x5, 0x5) => stor,
        (0xF, .., 0x6, 0x5) => read,
        _ => return None,
    };
    Some(operation)
}

/// Renders an opcode in the conventional assembly syntax, e.g. `DRW V1, V2, 5`
pub fn disassemble(op: u16) -> String {
    let (x, y, n, kk, nnn) = (op.x(), op.y(), op.n(), op.kk(), op.nnn());
    match op.nibbles() {
        (0x0, 0x0, 0xE, 0x0) => "CLS".to_string(),
        (0x0, 0x0, 0xE, 0xE) => "RET".to_string(),
        (0x0, ..) => format!("SYS {:03X}", nnn),
        (0x1, ..) => format!("JP {:03X}", nnn),
        (0x2, ..) => format!("CALL {:03X}", nnn),
        (0x3, ..) => format!("SE V{:X}, {:02X}", x, kk),
        (0x4, ..) => format!("SNE V{:X}, {:02X}", x, kk),
        (0x5, .., 0x0) => format!("SE V{:X}, V{:X}", x, y),
        (0x6, ..) => format!("LD V{:X}, {:02X}", x, kk),
        (0x7, ..) => format!("ADD V{:X}, {:02X}", x, kk),
        (0x8, .., 0x0) => format!("LD V{:X}, V{:X}", x, y),
        (0x8, .., 0x1) => format!("OR V{:X}, V{:X}", x, y),
        (0x8, .., 0x2) => format!("AND V{:X}, V{:X}", x, y),
        (0x8, .., 0x3) => format!("XOR V{:X}, V{:X}", x, y),
        (0x8, .., 0x4) => format!("ADD V{:X}, V{:X}", x, y),
        (0x8, .., 0x5) => format!("SUB V{:X}, V{:X}", x, y),
        (0x8, .., 0x6) => format!("SHR V{:X}, V{:X}", x, y),
        (0x8, .., 0x7) => format!("SUBN V{:X}, V{:X}", x, y),
        (0x8, .., 0xE) => format!("SHL V{:X}, V{:X}", x, y),
        (0x9, .., 0x0) => format!("SNE V{:X}, V{:X}", x, y),
        (0xA, ..) => format!("LD I, {:03X}", nnn),
        (0xB, ..) => format!("JP V0, {:03X}", nnn),
        (0xC, ..) => format!("RND V{:X}, {:02X}", x, kk),
        (0xD, ..) => format!("DRW V{:X}, V{:X}, {}", x, y, n),
        (0xE, .., 0x9, 0xE) => format!("SKP V{:X}", x),
        (0xE, .., 0xA, 0x1) => format!("SKNP V{:X}", x),
        (0xF, .., 0x0, 0x7) => format!("LD V{:X}, DT", x),
        (0xF, .., 0x0, 0xA) => format!("LD V{:X}, K", x),
        (0xF, .., 0x1, 0x5) => format!("LD DT, V{:X}", x),
        (0xF, .., 0x1, 0x8) => format!("LD ST, V{:X}", x),
        (0xF, .., 0x1, 0xE) => format!("ADD I, V{:X}", x),
        (0xF, .., 0x2, 0x9) => format!("LD F, V{:X}", x),
        (0xF, .., 0x3, 0x3) => format!("LD B, V{:X}", x),
        (0xF, .., 0x5, 0x5) => format!("LD [I], V{:X}", x),
        (0xF, .., 0x6, 0x5) => format!("LD V{:X}, [I]", x),
        _ => format!("DW {:04X}", op),
    }
}

/// Lists every word of a loaded program as `ADDR HI LO MNEMONIC`.
/// Data embedded in the ROM (sprites) is listed as if it were code.
pub fn disassemble_program(program: &[u8], start: u16) -> Vec<String> {
    program
        .chunks(2)
        .enumerate()
        .map(|(word, bytes)| {
            let address = start.wrapping_add(2 * word as u16);
            match *bytes {
                [high, low] => format!(
                    "{:03X} {:02X} {:02X} {}",
                    address,
                    high,
                    low,
                    disassemble(crate::opcode::from_bytes(high, low))
                ),
                _ => format!("{:03X} {:02X}", address, bytes[0]),
            }
        })
        .collect()
}
