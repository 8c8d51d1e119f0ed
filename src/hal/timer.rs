//! Timer0 as the vblank source

use avr_device::interrupt;

use super::reg::{OCR0, TCCR0, TCNT0, TIFR, TIMSK};
use super::CPU_FREQUENCY_HZ;
use crate::hal::interrupt::Interrupts;

const WGM01: u8 = 1 << 3;
const OCIE0: u8 = 1 << 1;
const CS_DIV1024: u8 = 0b111;

/// Refresh rate the keypad is sampled at
pub const VBLANK_HZ: u32 = 75;

/// Timer0 in CTC mode firing `TIMER0_COMP` once per frame
pub struct VblankTimer {
    _private: (),
}

impl VblankTimer {
    pub fn new() -> Self {
        TCCR0.write(0);
        TCNT0.write(0);
        Self { _private: () }
    }

    pub fn start(&mut self) {
        let compare = CPU_FREQUENCY_HZ / 1024 / VBLANK_HZ - 1;
        OCR0.write(compare as u8);
        TCCR0.write(WGM01 | CS_DIV1024);
        TIMSK.set_bits(OCIE0);
    }

    pub fn stop(&mut self) {
        TIMSK.clear_bits(OCIE0);
        TCCR0.write(0);
    }
}

impl Default for VblankTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Global interrupt control
pub struct VblankInterrupt {
    _private: (),
}

impl VblankInterrupt {
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Default for VblankInterrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupts for VblankInterrupt {
    fn disable(&self) {
        interrupt::disable();
    }

    fn enable(&self) {
        // SAFETY: shared state is only touched inside critical sections
        unsafe { interrupt::enable() };
    }

    fn acknowledge_all(&self) {
        // flags clear on writing one
        TIFR.write(0xFF);
    }
}
