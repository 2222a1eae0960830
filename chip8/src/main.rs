use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::{info, warn};
use sdl2::event::Event;
use sdl2::keyboard::Scancode;

use chip8_vm::constants::{DEFAULT_CPU_FREQUENCY_HZ, PROGRAM_START};
use chip8_vm::{
    disassemble_program, Config, Cpu, FrameBuffer, Keypad, Peripherals, Scheduler, SystemClock,
};

use display::Display;
use keymap::keymap;
use sound::Buzzer;

mod display;
mod keymap;
mod sound;

/// Largest window scale; keeps the window size well inside `u32`
const MAX_SCALE: i64 = 64;

#[derive(Parser, Debug)]
#[command(name = "chip8")]
#[command(about = "Runs a CHIP-8 ROM", long_about = None)]
struct Args {
    /// Path to the ROM image
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_CPU_FREQUENCY_HZ)]
    frequency: u32,

    /// Leave I untouched after Fx55/Fx65
    #[arg(long, action = ArgAction::SetTrue)]
    load_store_quirk: bool,

    /// Shift Vx in place for 8xy6/8xyE instead of shifting Vy into Vx
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    shift_quirk: bool,

    /// Wrap sprites around the screen edges instead of clipping them
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    overlapping: bool,

    /// Halt on out of range memory and stack accesses
    #[arg(long, action = ArgAction::SetTrue)]
    strict: bool,

    /// Window pixels per CHIP-8 pixel
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=MAX_SCALE))]
    scale: u32,

    /// Print a listing of the ROM and exit
    #[arg(long, action = ArgAction::SetTrue)]
    disassemble: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            cpu_frequency_hz: self.frequency,
            load_store_quirk: self.load_store_quirk,
            shift_quirk: self.shift_quirk,
            overlapping_mode: self.overlapping,
            strict: self.strict,
        }
    }
}

/// The window and speaker
struct Frontend {
    display: Display,
    buzzer: Option<Buzzer>,
}

impl Peripherals for Frontend {
    fn render(&mut self, frame: &FrameBuffer) {
        if let Err(e) = self.display.draw(frame) {
            warn!("unable to draw frame: {:#}", e);
        }
    }

    fn sound_start(&mut self) {
        if let Some(buzzer) = &self.buzzer {
            buzzer.start();
        }
    }

    fn sound_stop(&mut self) {
        if let Some(buzzer) = &self.buzzer {
            buzzer.stop();
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.disassemble {
        let rom = std::fs::read(&args.rom)
            .with_context(|| format!("unable to read {}", args.rom.display()))?;
        for line in disassemble_program(&rom, PROGRAM_START) {
            println!("{}", line);
        }
        return Ok(());
    }

    let mut cpu = Cpu::new(args.config());
    let file = File::open(&args.rom)
        .with_context(|| format!("unable to open {}", args.rom.display()))?;
    let size = cpu
        .load_program_from(&mut BufReader::new(file))
        .with_context(|| format!("unable to load {}", args.rom.display()))?;
    info!("loaded {} bytes from {}", size, args.rom.display());
    let mut scheduler = Scheduler::new(cpu)?;

    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let display = Display::new(&sdl, "chip8", args.scale)?;
    let buzzer = match Buzzer::new(&sdl) {
        Ok(buzzer) => Some(buzzer),
        Err(e) => {
            warn!("sound unavailable: {:#}", e);
            None
        }
    };
    let mut frontend = Frontend { display, buzzer };
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    let mut keypad = Keypad::new();
    scheduler.run(
        &mut SystemClock::new(),
        &mut keypad,
        &mut frontend,
        |keypad| {
            for event in events.poll_iter() {
                match event {
                    Event::Quit { .. }
                    | Event::KeyDown {
                        scancode: Some(Scancode::Escape),
                        ..
                    } => return false,
                    Event::KeyDown {
                        scancode: Some(scancode),
                        repeat: false,
                        ..
                    } => {
                        if let Some(code) = keymap(scancode) {
                            keypad.press(code);
                        }
                    }
                    Event::KeyUp {
                        scancode: Some(scancode),
                        ..
                    } => {
                        if let Some(code) = keymap(scancode) {
                            keypad.release(code);
                        }
                    }
                    _ => continue,
                }
            }
            true
        },
    )?;
    Ok(())
}
