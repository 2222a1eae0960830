use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::constants::TIMER_FREQUENCY_HZ;
use crate::cpu::Cpu;
use crate::error::Result;
use crate::frame_buffer::FrameBuffer;
use crate::keypad::KeyInput;

/// A monotonic time source measured from an arbitrary epoch
pub trait Clock {
    /// Time elapsed since the clock's epoch
    fn now(&self) -> Duration;

    /// Blocks until `now()` reaches `deadline`
    fn sleep_until(&mut self, deadline: Duration);
}

/// Wall clock time; the epoch is the moment of construction
pub struct SystemClock {
    epoch: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            epoch: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn sleep_until(&mut self, deadline: Duration) {
        if let Some(remaining) = deadline.checked_sub(self.now()) {
            spin_sleep::sleep(remaining);
        }
    }
}

/// A clock that only moves when told to. Sleeping jumps straight to the deadline.
#[derive(Debug, Default, Clone, Copy)]
pub struct VirtualClock {
    now: Duration,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn sleep_until(&mut self, deadline: Duration) {
        self.now = self.now.max(deadline);
    }
}

/// # Peripherals
/// The outputs driven on every timer tick.
pub trait Peripherals {
    /// Present the current contents of the frame buffer
    fn render(&mut self, frame: &FrameBuffer);

    /// The sound timer became audible
    fn sound_start(&mut self);

    /// The sound timer fell silent
    fn sound_stop(&mut self);
}

/// Peripherals that discard everything
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl Peripherals for Headless {
    fn render(&mut self, _frame: &FrameBuffer) {}

    fn sound_start(&mut self) {}

    fn sound_stop(&mut self) {}
}

/// How far the schedule may fall behind before missed ticks are dropped instead of replayed
pub const MAX_LAG: Duration = Duration::from_secs(1);

/// The moment of the `tick`th tick of a `hz` clock, counting from the first at 1/hz
fn deadline(tick: u64, hz: u32) -> Duration {
    let nanos = u128::from(tick) * 1_000_000_000 / u128::from(hz);
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

/// # Scheduler
/// Interleaves instruction ticks and 60Hz timer ticks against a single clock.
///
/// Deadlines are absolute (the nth tick of each schedule is due at n / frequency after the
/// origin) so time lost to a late wake up is made up on the next call instead of accumulating.
/// After a stall longer than `MAX_LAG` the origin moves to the present and the missed ticks
/// are skipped.
/// When an instruction and a timer tick are due at the same moment the timer tick goes first.
pub struct Scheduler {
    cpu: Cpu,
    cpu_frequency_hz: u32,
    origin: Duration,
    instructions: u64,
    timer_ticks: u64,
    sound_on: bool,
}

impl Scheduler {
    pub fn new(cpu: Cpu) -> Result<Self> {
        cpu.config().validate()?;
        Ok(Scheduler {
            cpu_frequency_hz: cpu.config().cpu_frequency_hz,
            cpu,
            origin: Duration::ZERO,
            instructions: 0,
            timer_ticks: 0,
            sound_on: false,
        })
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu {
        &mut self.cpu
    }

    pub fn into_cpu(self) -> Cpu {
        self.cpu
    }

    /// Whether `sound_start` has been signalled without a matching `sound_stop`
    pub fn sound_on(&self) -> bool {
        self.sound_on
    }

    fn next_instruction(&self) -> Duration {
        self.origin + deadline(self.instructions + 1, self.cpu_frequency_hz)
    }

    fn next_timer(&self) -> Duration {
        self.origin + deadline(self.timer_ticks + 1, TIMER_FREQUENCY_HZ)
    }

    /// The earliest moment at which `advance_to` will have work to do
    pub fn next_deadline(&self) -> Duration {
        self.next_instruction().min(self.next_timer())
    }

    /// Runs every tick due at or before `now`, in order.
    /// Returns the number of instructions executed.
    pub fn advance_to(
        &mut self,
        now: Duration,
        keys: &mut dyn KeyInput,
        peripherals: &mut dyn Peripherals,
    ) -> Result<usize> {
        if let Some(lag) = now.checked_sub(self.next_deadline()) {
            if lag > MAX_LAG {
                warn!("{:?} behind schedule, skipping the missed ticks", lag);
                self.origin = now;
                self.instructions = 0;
                self.timer_ticks = 0;
            }
        }

        let mut executed = 0;
        loop {
            let next_timer = self.next_timer();
            let next_instruction = self.next_instruction();
            if next_timer <= next_instruction && next_timer <= now {
                self.timer_ticks += 1;
                self.tick_timers(peripherals);
            } else if next_instruction <= now {
                self.instructions += 1;
                self.cpu.step(keys)?;
                executed += 1;
            } else {
                return Ok(executed);
            }
        }
    }

    /// Decrements DT and ST, renders, and signals sound transitions.
    /// Sound is audible while ST > 1.
    fn tick_timers(&mut self, peripherals: &mut dyn Peripherals) {
        let registers = self.cpu.registers_mut();
        registers.decrement_timers();
        let audible = registers.sound_timer > 1;

        peripherals.render(self.cpu.frame_buffer());

        if audible && !self.sound_on {
            debug!("sound on");
            peripherals.sound_start();
            self.sound_on = true;
        } else if !audible && self.sound_on {
            debug!("sound off");
            peripherals.sound_stop();
            self.sound_on = false;
        }
    }

    /// Runs until `keep_running` returns false or the cpu reports an error,
    /// sleeping on `clock` between deadlines.
    /// `keep_running` is consulted before each batch of ticks; hosts poll their input there.
    pub fn run<K, F>(
        &mut self,
        clock: &mut dyn Clock,
        keys: &mut K,
        peripherals: &mut dyn Peripherals,
        mut keep_running: F,
    ) -> Result<()>
    where
        K: KeyInput,
        F: FnMut(&mut K) -> bool,
    {
        info!(
            "running at {}Hz with {:?}",
            self.cpu_frequency_hz,
            self.cpu.config()
        );
        while keep_running(keys) {
            self.advance_to(clock.now(), keys, peripherals)?;
            clock.sleep_until(self.next_deadline());
        }
        if self.sound_on {
            peripherals.sound_stop();
            self.sound_on = false;
        }
        info!("stopped");
        Ok(())
    }
}
