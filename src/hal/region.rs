//! Typed access to fixed device memory regions

/// Segment:offset pointer as stored in splash headers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FarPtr {
    pub segment: u16,
    pub offset: u16,
}

impl FarPtr {
    pub const fn new(segment: u16, offset: u16) -> Self {
        Self { segment, offset }
    }

    /// 20-bit linear address
    pub const fn linear(&self) -> u32 {
        (((self.segment as u32) << 4) + self.offset as u32) & 0x000F_FFFF
    }
}

/// A fixed-size region addressed by byte offset from its base
pub trait MemoryRegion {
    fn base(&self) -> FarPtr;
    fn len(&self) -> usize;
    fn read_byte(&self, offset: usize) -> u8;
    fn write_byte(&mut self, offset: usize, value: u8);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_word(&self, offset: usize) -> u16 {
        u16::from_le_bytes([self.read_byte(offset), self.read_byte(offset + 1)])
    }

    fn write_word(&mut self, offset: usize, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.write_byte(offset, lo);
        self.write_byte(offset + 1, hi);
    }

    fn read_bytes(&self, offset: usize, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(offset + i);
        }
    }
}

/// Region backed by a RAM array, e.g. a cartridge SRAM window
pub struct RamRegion<const N: usize> {
    base: FarPtr,
    data: [u8; N],
}

impl<const N: usize> RamRegion<N> {
    pub const fn new(base: FarPtr) -> Self {
        Self { base, data: [0; N] }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

impl<const N: usize> MemoryRegion for RamRegion<N> {
    fn base(&self) -> FarPtr {
        self.base
    }

    fn len(&self) -> usize {
        N
    }

    fn read_byte(&self, offset: usize) -> u8 {
        self.data[offset % N]
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.data[offset % N] = value;
    }
}
