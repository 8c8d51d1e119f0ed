//! External SRAM on the XMEM bus, used as the backup mirror

use core::ptr::{read_volatile, write_volatile};

use super::reg::{MCUCR, XMCRA, XMCRB};
use crate::config::IEEP_SIZE;
use crate::hal::region::{FarPtr, MemoryRegion};

const SRE: u8 = 1 << 7;

/// First data-space address decoded to the external bus
const XMEM_START: usize = 0x1100;

/// Battery-backed SRAM window the size of the configuration store
pub struct XmemRegion {
    _private: (),
}

impl XmemRegion {
    /// Enables the external memory interface with no wait states
    pub fn new() -> Self {
        XMCRA.write(0);
        XMCRB.write(0);
        MCUCR.set_bits(SRE);
        Self { _private: () }
    }
}

impl Default for XmemRegion {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRegion for XmemRegion {
    fn base(&self) -> FarPtr {
        FarPtr::new((XMEM_START >> 4) as u16, 0)
    }

    fn len(&self) -> usize {
        IEEP_SIZE as usize
    }

    fn read_byte(&self, offset: usize) -> u8 {
        let addr = XMEM_START + offset % self.len();
        // SAFETY: inside the external SRAM window enabled in `new`
        unsafe { read_volatile(addr as *const u8) }
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        let addr = XMEM_START + offset % self.len();
        // SAFETY: as above
        unsafe { write_volatile(addr as *mut u8, value) }
    }
}
