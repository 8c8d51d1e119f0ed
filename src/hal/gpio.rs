//! Keypad and write-protect jumper inputs
//!
//! Keys are wired active-low: Start, A, B, X1-X4 and Y1 on PA0..PA7,
//! Y2-Y4 on PC0..PC2. The EEPROM lock jumper pulls PG0 low.

use super::reg::{DDRA, DDRC, DDRG, PINA, PINC, PING, PORTA, PORTC, PORTG};
use crate::drivers::keypad::KeySet;

const PORTC_KEYS: u8 = 0x07;
const LOCK_JUMPER: u8 = 0x01;

/// Configures the key and jumper pins as inputs with pull-ups
pub fn init() {
    DDRA.write(0x00);
    PORTA.write(0xFF);
    DDRC.clear_bits(PORTC_KEYS);
    PORTC.set_bits(PORTC_KEYS);
    DDRG.clear_bits(LOCK_JUMPER);
    PORTG.set_bits(LOCK_JUMPER);
}

/// Keys held right now
pub fn scan_keypad() -> KeySet {
    let low = !PINA.read() as u16;
    let high = (!PINC.read() & PORTC_KEYS) as u16;
    // key index n lives in bit n + 1
    KeySet((low | (high << 8)) << 1)
}

pub fn lock_jumper_fitted() -> bool {
    PING.read() & LOCK_JUMPER == 0
}
