//! Vblank tick tracking and passive waiting

use core::cell::Cell;
use critical_section::Mutex;

/// Something that can halt the CPU until the next interrupt
pub trait Idle {
    fn idle(&mut self);
}

impl<T: Idle + ?Sized> Idle for &mut T {
    fn idle(&mut self) {
        (**self).idle()
    }
}

/// Free-running counter advanced by the periodic interrupt
pub struct VblankClock {
    ticks: Mutex<Cell<u16>>,
}

impl VblankClock {
    pub const fn new() -> Self {
        Self {
            ticks: Mutex::new(Cell::new(0)),
        }
    }

    /// Called from the periodic interrupt
    #[inline]
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let ticks = self.ticks.borrow(cs);
            ticks.set(ticks.get().wrapping_add(1));
        });
    }

    #[inline]
    pub fn ticks(&self) -> u16 {
        critical_section::with(|cs| self.ticks.borrow(cs).get())
    }

    /// Low byte of the tick counter, used for repeat deadlines
    #[inline]
    pub fn ticks_u8(&self) -> u8 {
        self.ticks() as u8
    }

    /// Halts until the counter moves
    pub fn wait_for_vblank<P: Idle + ?Sized>(&self, cpu: &mut P) {
        let last = self.ticks();
        while self.ticks() == last {
            cpu.idle();
        }
    }
}

impl Default for VblankClock {
    fn default() -> Self {
        Self::new()
    }
}
