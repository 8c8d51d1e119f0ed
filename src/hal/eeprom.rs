//! Word-addressed access to the internal configuration EEPROM

use crate::config::IEEP_SIZE;

/// Low-level accessor for the configuration store.
///
/// Addresses are byte offsets and must be even. A single `write_word` either
/// lands completely or leaves the previous value in place; sequences of
/// writes are not atomic.
pub trait Eeprom {
    fn read_word(&mut self, addr: u16) -> u16;
    fn write_word(&mut self, addr: u16, value: u16);

    /// Hardware write lock state
    fn protect_check(&mut self) -> bool {
        false
    }

    /// Reads `buf.len()` bytes starting at `addr` in little-endian word order
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) {
        for (i, chunk) in buf.chunks_mut(2).enumerate() {
            let word = self.read_word(addr + (i as u16) * 2).to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }
}

impl<T: Eeprom + ?Sized> Eeprom for &mut T {
    fn read_word(&mut self, addr: u16) -> u16 {
        (**self).read_word(addr)
    }

    fn write_word(&mut self, addr: u16, value: u16) {
        (**self).write_word(addr, value)
    }

    fn protect_check(&mut self) -> bool {
        (**self).protect_check()
    }

    fn read_block(&mut self, addr: u16, buf: &mut [u8]) {
        (**self).read_block(addr, buf)
    }
}

/// Configuration store held in RAM
pub struct RamEeprom {
    data: [u8; IEEP_SIZE as usize],
    locked: bool,
}

impl RamEeprom {
    pub const fn new() -> Self {
        Self {
            data: [0xFF; IEEP_SIZE as usize],
            locked: false,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut eeprom = Self::new();
        let len = bytes.len().min(eeprom.data.len());
        eeprom.data[..len].copy_from_slice(&bytes[..len]);
        eeprom
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl Default for RamEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl Eeprom for RamEeprom {
    fn read_word(&mut self, addr: u16) -> u16 {
        let i = (addr & (IEEP_SIZE - 2)) as usize;
        u16::from_le_bytes([self.data[i], self.data[i + 1]])
    }

    fn write_word(&mut self, addr: u16, value: u16) {
        let i = (addr & (IEEP_SIZE - 2)) as usize;
        self.data[i..i + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn protect_check(&mut self) -> bool {
        self.locked
    }
}
