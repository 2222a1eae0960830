use rand::Rng;

use crate::cpu::Cpu;
use crate::error::Result;
use crate::keypad::KeyInput;
use crate::memory::MemoryImage;
use crate::opcode::Opcode;

/// Skips the next instruction; pc has already moved past the current one
fn skip_if(cpu: &mut Cpu, condition: bool) {
    if condition {
        cpu.registers.pc = cpu.registers.pc.wrapping_add(0x2);
    }
}

/// 0nnn; machine code routines don't exist here
pub fn sys(_op: &dyn Opcode, _cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    Ok(())
}

/// clear
pub fn clr(_op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.frame_buffer.clear();
    Ok(())
}

/// PC = STACK.pop()
pub fn rts(_op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    if let Some(address) = cpu.pop()? {
        cpu.registers.pc = address;
    }
    Ok(())
}

/// PC = addr
pub fn jump(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.pc = op.nnn();
    Ok(())
}

/// STACK.push(PC); PC = addr
pub fn call(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let return_address = cpu.registers.pc;
    cpu.push(return_address)?;
    cpu.registers.pc = op.nnn();
    Ok(())
}

/// if Vx == kk then pc += 2
pub fn ske(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let condition = cpu.registers.v[op.x()] == op.kk();
    skip_if(cpu, condition);
    Ok(())
}

/// if Vx != kk then pc += 2
pub fn skne(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let condition = cpu.registers.v[op.x()] != op.kk();
    skip_if(cpu, condition);
    Ok(())
}

/// if Vx == Vy then pc += 2
pub fn skre(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let condition = cpu.registers.v[op.x()] == cpu.registers.v[op.y()];
    skip_if(cpu, condition);
    Ok(())
}

/// Vx = kk
pub fn load(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.v[op.x()] = op.kk();
    Ok(())
}

/// Vx += kk
/// Add kk to Vx; allow for overflow but implicitly drop it
pub fn add(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    v[op.x()] = v[op.x()].wrapping_add(op.kk());
    Ok(())
}

/// Vx = Vy
pub fn mv(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    v[op.x()] = v[op.y()];
    Ok(())
}

/// Vx |= Vy
pub fn or(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    v[op.x()] |= v[op.y()];
    Ok(())
}

/// Vx &= Vy
pub fn and(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    v[op.x()] &= v[op.y()];
    Ok(())
}

/// Vx ^= Vy
pub fn xor(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    v[op.x()] ^= v[op.y()];
    Ok(())
}

/// Vx += Vy; VF = overflow
/// The flag is written first, so with x = F the sum replaces it
pub fn addr(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    let sum = u16::from(v[op.x()]) + u16::from(v[op.y()]);
    v[0xF] = u8::from(sum > 0xFF);
    v[op.x()] = (sum & 0xFF) as u8;
    Ok(())
}

/// Vx -= Vy; VF = Vx >= Vy
pub fn sub(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    let (vx, vy) = (v[op.x()], v[op.y()]);
    v[0xF] = u8::from(vx >= vy);
    v[op.x()] = vx.wrapping_sub(vy);
    Ok(())
}

/// Vx = source >> 1; VF = bit shifted out
/// The source is Vx under the shift quirk and Vy otherwise
pub fn shr(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let source = shift_source(op, cpu);
    let v = &mut cpu.registers.v;
    v[0xF] = source & 0x1;
    v[op.x()] = source >> 1;
    Ok(())
}

/// Vx = Vy - Vx; VF = Vy >= Vx
pub fn subn(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let v = &mut cpu.registers.v;
    let (vx, vy) = (v[op.x()], v[op.y()]);
    v[0xF] = u8::from(vy >= vx);
    v[op.x()] = vy.wrapping_sub(vx);
    Ok(())
}

/// Vx = source << 1; VF = bit shifted out
/// The source is Vx under the shift quirk and Vy otherwise
pub fn shl(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let source = shift_source(op, cpu);
    let v = &mut cpu.registers.v;
    v[0xF] = (source & 0x80) >> 7;
    v[op.x()] = source << 1;
    Ok(())
}

fn shift_source(op: &dyn Opcode, cpu: &Cpu) -> u8 {
    if cpu.config.shift_quirk {
        cpu.registers.v[op.x()]
    } else {
        cpu.registers.v[op.y()]
    }
}

/// if Vx != Vy then pc +=2
pub fn skrne(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let condition = cpu.registers.v[op.x()] != cpu.registers.v[op.y()];
    skip_if(cpu, condition);
    Ok(())
}

/// I = addr
pub fn loadi(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.i = op.nnn();
    Ok(())
}

/// PC = V0 + addr
pub fn jumpi(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.pc = u16::from(cpu.registers.v[0x0]) + op.nnn();
    Ok(())
}

/// Vx = rand_byte & kk
pub fn rand(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let rand_byte: u8 = cpu.rng.gen();
    cpu.registers.v[op.x()] = rand_byte & op.kk();
    Ok(())
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the sprite at mem[I..I+n] onto the frame buffer at (Vx, Vy).
/// Sets VF if any pixels were erased
pub fn draw(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let x = i32::from(cpu.registers.v[op.x()]);
    let y = i32::from(cpu.registers.v[op.y()]);
    let i = cpu.registers.i;
    if cpu.config.strict && op.n() > 0 {
        cpu.memory.try_get(i.saturating_add(u16::from(op.n()) - 1))?;
    }
    let collision = cpu.frame_buffer.draw_sprite(&cpu.memory, x, y, i, op.n());
    cpu.registers.v[0xF] = u8::from(collision);
    Ok(())
}

/// if Vx.pressed then pc += 2
pub fn skpr(op: &dyn Opcode, cpu: &mut Cpu, keys: &dyn KeyInput) -> Result<()> {
    let condition = keys.is_pressed(cpu.registers.v[op.x()]);
    skip_if(cpu, condition);
    Ok(())
}

/// if !Vx.pressed then pc += 2
pub fn skup(op: &dyn Opcode, cpu: &mut Cpu, keys: &dyn KeyInput) -> Result<()> {
    let condition = !keys.is_pressed(cpu.registers.v[op.x()]);
    skip_if(cpu, condition);
    Ok(())
}

/// Vx = DT
pub fn moved(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.v[op.x()] = cpu.registers.delay_timer;
    Ok(())
}

/// await keypress for Vx
pub fn keyd(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.awaiting_key = Some(op.x());
    Ok(())
}

/// DT = Vx
pub fn loads(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.delay_timer = cpu.registers.v[op.x()];
    Ok(())
}

/// ST = Vx
pub fn ld(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.sound_timer = cpu.registers.v[op.x()];
    Ok(())
}

/// I += Vx
/// Not masked to 12 bits; accesses through I are bounds checked instead
pub fn addi(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let r = &mut cpu.registers;
    r.i = r.i.wrapping_add(u16::from(r.v[op.x()]));
    Ok(())
}

/// I = Vx * 5
/// Set I to the memory address of the glyph for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ldspr(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    cpu.registers.i = MemoryImage::glyph_address(cpu.registers.v[op.x()]);
    Ok(())
}

/// mem[I..I+3] = bcd(Vx)
/// Store BCD repr of Vx in memory starting at address i
pub fn bcd(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let value = cpu.registers.v[op.x()];
    let i = cpu.registers.i;
    let digits = [value / 100, value / 10 % 10, value % 10];
    for (offset, digit) in (0u16..).zip(digits) {
        cpu.write(i.wrapping_add(offset), digit)?;
    }
    Ok(())
}

/// mem[I..=I+x] = V0..=Vx
/// I is left alone under the load/store quirk, otherwise it ends at I + x + 1
pub fn stor(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let i = cpu.registers.i;
    for register in 0..=op.x() {
        let value = cpu.registers.v[register];
        cpu.write(i.wrapping_add(register as u16), value)?;
    }
    advance_index(op, cpu);
    Ok(())
}

/// V0..=Vx = mem[I..=I+x]
/// I is left alone under the load/store quirk, otherwise it ends at I + x + 1
pub fn read(op: &dyn Opcode, cpu: &mut Cpu, _keys: &dyn KeyInput) -> Result<()> {
    let i = cpu.registers.i;
    for register in 0..=op.x() {
        cpu.registers.v[register] = cpu.read(i.wrapping_add(register as u16))?;
    }
    advance_index(op, cpu);
    Ok(())
}

fn advance_index(op: &dyn Opcode, cpu: &mut Cpu) {
    if !cpu.config.load_store_quirk {
        cpu.registers.i = cpu.registers.i.wrapping_add(op.x() as u16 + 1);
    }
}
