//! Boot-splash header layout as stored in the configuration EEPROM

pub mod status;
pub mod validate;

pub use status::{SplashStatus, StatusInspector, StatusLine};
pub use validate::{is_valid, is_valid_bytes};

use crate::config::{IEEP_C_OPTIONS1_CUSTOM_SPLASH, OWNER_TAG};
use crate::hal::region::FarPtr;

/// Packed header size in bytes
pub const HEADER_SIZE: usize = 0x36;

/// Header-relative field offsets
pub mod offset {
    pub const OPTIONS1: usize = 0x03;
    pub const NAME_COLOR: usize = 0x04;
    pub const SIZE: usize = 0x06;
    pub const START_FRAME: usize = 0x07;
    pub const END_FRAME: usize = 0x08;
    pub const SPRITE_COUNT: usize = 0x09;
    pub const PALETTE_FLAGS: usize = 0x0A;
    pub const TILE_COUNT: usize = 0x0B;
    pub const PALETTE_OFFSET: usize = 0x0C;
    pub const TILE_OFFSET: usize = 0x0E;
    pub const MAP_OFFSET: usize = 0x10;
    pub const SCREEN_DEST_HORIZONTAL: usize = 0x12;
    pub const SCREEN_DEST_VERTICAL: usize = 0x14;
    pub const MAP_WIDTH: usize = 0x16;
    pub const MAP_HEIGHT: usize = 0x17;
    pub const VBLANK_CODE_OFFSET: usize = 0x18;
    pub const VBLANK_CODE_SEGMENT: usize = 0x1A;
    pub const NAME_X_HORIZONTAL: usize = 0x1C;
    pub const NAME_Y_HORIZONTAL: usize = 0x1D;
    pub const NAME_X_VERTICAL: usize = 0x1E;
    pub const NAME_Y_VERTICAL: usize = 0x1F;
    pub const OWNER_TAG: usize = 0x20;
    pub const OWNER_VERSION: usize = 0x22;
    pub const SOUND_WAVETABLE_OFFSET: usize = 0x22;
    pub const SOUND_CHANNEL_OFFSET: usize = 0x24;
    pub const SWANCRYSTAL_INIT: usize = 0x2C;
}

/// Splash size code values
pub const SPLASH_SIZE_445: u8 = 0x00;
pub const SPLASH_SIZE_957: u8 = 0x01;

pub const PALETTE_1BPP: u8 = 0x00;
pub const PALETTE_2BPP: u8 = 0x80;

/// Version byte written by payloads that predate version numbering
const LEGACY_VERSION: u8 = 0x60;

/// Decoded copy of a boot-splash header.
///
/// Holding one says nothing about plausibility; run it through
/// [`is_valid`] before trusting any field, the vblank pointer above all.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BootSplashHeader {
    raw: [u8; HEADER_SIZE],
}

impl BootSplashHeader {
    pub const fn from_raw(raw: [u8; HEADER_SIZE]) -> Self {
        Self { raw }
    }

    /// Copies the header out of the start of `bytes`, zero-filling if short
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut raw = [0u8; HEADER_SIZE];
        let len = bytes.len().min(HEADER_SIZE);
        raw[..len].copy_from_slice(&bytes[..len]);
        Self { raw }
    }

    pub fn as_bytes(&self) -> &[u8; HEADER_SIZE] {
        &self.raw
    }

    fn byte(&self, at: usize) -> u8 {
        self.raw[at]
    }

    fn word(&self, at: usize) -> u16 {
        u16::from_le_bytes([self.raw[at], self.raw[at + 1]])
    }

    pub fn options1(&self) -> u8 {
        self.byte(offset::OPTIONS1)
    }

    pub fn custom_splash_enabled(&self) -> bool {
        self.options1() & IEEP_C_OPTIONS1_CUSTOM_SPLASH != 0
    }

    pub fn name_color(&self) -> u8 {
        self.byte(offset::NAME_COLOR)
    }

    pub fn size(&self) -> u8 {
        self.byte(offset::SIZE)
    }

    pub fn start_frame(&self) -> u8 {
        self.byte(offset::START_FRAME)
    }

    pub fn end_frame(&self) -> u8 {
        self.byte(offset::END_FRAME)
    }

    pub fn sprite_count(&self) -> u8 {
        self.byte(offset::SPRITE_COUNT)
    }

    pub fn palette_flags(&self) -> u8 {
        self.byte(offset::PALETTE_FLAGS)
    }

    pub fn tile_count(&self) -> u8 {
        self.byte(offset::TILE_COUNT)
    }

    pub fn palette_offset(&self) -> u16 {
        self.word(offset::PALETTE_OFFSET)
    }

    pub fn tile_offset(&self) -> u16 {
        self.word(offset::TILE_OFFSET)
    }

    pub fn map_offset(&self) -> u16 {
        self.word(offset::MAP_OFFSET)
    }

    pub fn screen_dest(&self) -> (u16, u16) {
        (
            self.word(offset::SCREEN_DEST_HORIZONTAL),
            self.word(offset::SCREEN_DEST_VERTICAL),
        )
    }

    pub fn map_dimensions(&self) -> (u8, u8) {
        (self.byte(offset::MAP_WIDTH), self.byte(offset::MAP_HEIGHT))
    }

    /// Far pointer to the code run at vblank time
    pub fn vblank_handler(&self) -> FarPtr {
        FarPtr::new(
            self.word(offset::VBLANK_CODE_SEGMENT),
            self.word(offset::VBLANK_CODE_OFFSET),
        )
    }

    /// Name tag position in horizontal and vertical orientation
    pub fn name_position(&self) -> ((u8, u8), (u8, u8)) {
        (
            (self.byte(offset::NAME_X_HORIZONTAL), self.byte(offset::NAME_Y_HORIZONTAL)),
            (self.byte(offset::NAME_X_VERTICAL), self.byte(offset::NAME_Y_VERTICAL)),
        )
    }

    pub fn sound_wavetable_offset(&self) -> u16 {
        self.word(offset::SOUND_WAVETABLE_OFFSET)
    }

    pub fn sound_channel_offset(&self, channel: usize) -> u16 {
        self.word(offset::SOUND_CHANNEL_OFFSET + (channel & 3) * 2)
    }

    pub fn swancrystal_init(&self) -> &[u8] {
        &self.raw[offset::SWANCRYSTAL_INIT..HEADER_SIZE]
    }

    pub fn owner_tag(&self) -> [u8; 2] {
        [self.byte(offset::OWNER_TAG), self.byte(offset::OWNER_TAG + 1)]
    }

    /// Whether the owner tag marks a payload produced by this installer
    pub fn is_ours(&self) -> bool {
        self.owner_tag() == OWNER_TAG
    }

    pub fn owner_version(&self) -> u8 {
        match self.byte(offset::OWNER_VERSION) {
            LEGACY_VERSION => 0,
            version => version,
        }
    }
}

impl Default for BootSplashHeader {
    fn default() -> Self {
        Self::from_raw([0; HEADER_SIZE])
    }
}
