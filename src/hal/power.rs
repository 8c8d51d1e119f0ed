use super::reg::MCUCR;
use crate::os::Idle;

const SE: u8 = 1 << 5;
const SM_MASK: u8 = 0b0001_1100;

#[derive(Clone, Copy)]
#[repr(u8)]
pub enum SleepMode {
    Idle = 0b000,
    AdcNoiseReduction = 0b001,
    PowerDown = 0b010,
    PowerSave = 0b011,
    Standby = 0b110,
    ExtendedStandby = 0b111,
}

impl SleepMode {
    /// SM2 is bit 2, SM1..SM0 are bits 4..3
    fn bits(self) -> u8 {
        let mode = self as u8;
        ((mode & 0b011) << 3) | (mode & 0b100)
    }
}

pub struct Power {
    _private: (),
}

impl Power {
    pub fn new() -> Self {
        Self { _private: () }
    }

    #[inline]
    pub fn set_sleep_mode(&mut self, mode: SleepMode) {
        MCUCR.modify(|r| (r & !SM_MASK) | mode.bits());
    }

    pub fn enter_idle_mode(&mut self) {
        self.set_sleep_mode(SleepMode::Idle);
        MCUCR.set_bits(SE);
        avr_device::asm::sleep();
        MCUCR.clear_bits(SE);
    }
}

impl Default for Power {
    fn default() -> Self {
        Self::new()
    }
}

impl Idle for Power {
    /// Sleeps until the next interrupt
    fn idle(&mut self) {
        self.enter_idle_mode();
    }
}
