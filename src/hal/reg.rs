//! Volatile access to memory-mapped I/O registers

use core::ptr::{read_volatile, write_volatile};

/// One 8-bit register at a data-space address
#[derive(Clone, Copy)]
pub struct Reg(usize);

impl Reg {
    pub const fn at(addr: usize) -> Self {
        Self(addr)
    }

    #[inline(always)]
    pub fn read(self) -> u8 {
        // SAFETY: only constructed with ATmega128 I/O addresses
        unsafe { read_volatile(self.0 as *const u8) }
    }

    #[inline(always)]
    pub fn write(self, value: u8) {
        // SAFETY: as above
        unsafe { write_volatile(self.0 as *mut u8, value) }
    }

    #[inline(always)]
    pub fn modify(self, f: impl FnOnce(u8) -> u8) {
        self.write(f(self.read()));
    }

    #[inline(always)]
    pub fn set_bits(self, mask: u8) {
        self.modify(|r| r | mask);
    }

    #[inline(always)]
    pub fn clear_bits(self, mask: u8) {
        self.modify(|r| r & !mask);
    }
}

// Data-space addresses (I/O address + 0x20 for the low registers)
pub(crate) const PINC: Reg = Reg::at(0x33);
pub(crate) const DDRC: Reg = Reg::at(0x34);
pub(crate) const PORTC: Reg = Reg::at(0x35);
pub(crate) const PINA: Reg = Reg::at(0x39);
pub(crate) const DDRA: Reg = Reg::at(0x3A);
pub(crate) const PORTA: Reg = Reg::at(0x3B);
pub(crate) const PING: Reg = Reg::at(0x63);
pub(crate) const DDRG: Reg = Reg::at(0x64);
pub(crate) const PORTG: Reg = Reg::at(0x65);

pub(crate) const EECR: Reg = Reg::at(0x3C);
pub(crate) const EEDR: Reg = Reg::at(0x3D);
pub(crate) const EEARL: Reg = Reg::at(0x3E);
pub(crate) const EEARH: Reg = Reg::at(0x3F);

pub(crate) const OCR0: Reg = Reg::at(0x51);
pub(crate) const TCNT0: Reg = Reg::at(0x52);
pub(crate) const TCCR0: Reg = Reg::at(0x53);
pub(crate) const MCUCR: Reg = Reg::at(0x55);
pub(crate) const TIFR: Reg = Reg::at(0x56);
pub(crate) const TIMSK: Reg = Reg::at(0x57);

pub(crate) const XMCRB: Reg = Reg::at(0x6C);
pub(crate) const XMCRA: Reg = Reg::at(0x6D);
