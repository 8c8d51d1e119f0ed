//! On-chip EEPROM as the configuration store

use avr_device::interrupt;

use super::gpio;
use super::reg::{EECR, EEARH, EEARL, EEDR};
use crate::hal::eeprom::Eeprom;

const EERE: u8 = 1 << 0;
const EEWE: u8 = 1 << 1;
const EEMWE: u8 = 1 << 2;

/// Word access over the byte-wide EEPROM.
///
/// A word write is two byte writes; a power cut between them leaves a torn
/// word, which the install order tolerates because the splash is disabled
/// until verification passes.
pub struct AvrEeprom {
    _private: (),
}

impl AvrEeprom {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn wait_ready() {
        while EECR.read() & EEWE != 0 {}
    }

    fn set_address(addr: u16) {
        let [lo, hi] = addr.to_le_bytes();
        EEARH.write(hi);
        EEARL.write(lo);
    }

    fn read_byte(addr: u16) -> u8 {
        Self::wait_ready();
        Self::set_address(addr);
        EECR.set_bits(EERE);
        EEDR.read()
    }

    fn write_byte(addr: u16, value: u8) {
        Self::wait_ready();
        Self::set_address(addr);
        EEDR.write(value);
        // EEWE must follow EEMWE within four cycles
        interrupt::free(|_| {
            EECR.write(EEMWE);
            EECR.write(EEMWE | EEWE);
        });
    }
}

impl Default for AvrEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl Eeprom for AvrEeprom {
    fn read_word(&mut self, addr: u16) -> u16 {
        u16::from_le_bytes([Self::read_byte(addr), Self::read_byte(addr + 1)])
    }

    fn write_word(&mut self, addr: u16, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        if Self::read_byte(addr) != lo {
            Self::write_byte(addr, lo);
        }
        if Self::read_byte(addr + 1) != hi {
            Self::write_byte(addr + 1, hi);
        }
    }

    fn protect_check(&mut self) -> bool {
        gpio::lock_jumper_fitted()
    }
}
