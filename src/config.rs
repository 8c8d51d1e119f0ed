//! Configuration constants for the splash installer

/// Size of the internal configuration EEPROM in bytes
pub const IEEP_SIZE: u16 = 2048;

/// Store offset of the live boot-splash header
pub const SPLASH_HEADER_OFFSET: u16 = 0x80;

/// Store offset of the options word; its high byte holds options1
pub const OPTIONS_WORD_OFFSET: u16 = 0x82;

/// options1 bit enabling the custom boot splash
pub const IEEP_C_OPTIONS1_CUSTOM_SPLASH: u8 = 0x80;

/// Largest image accepted by a restore without the leading store prefix
pub const PAYLOAD_MAX_SIZE: u16 = IEEP_SIZE - SPLASH_HEADER_OFFSET;

/// Header-relative bytes below this offset are never written by an install
pub const INSTALL_START: u16 = 0x04;

/// SwanCrystal TFT calibration block, header-relative, end exclusive
pub const SWANCRYSTAL_DATA_START: u16 = 0x2C;
pub const SWANCRYSTAL_DATA_END: u16 = 0x38;

/// Header-relative name colour byte and its first invalid value
pub const NAME_COLOR_OFFSET: u16 = 0x04;
pub const NAME_COLOR_LIMIT: u8 = 0x10;

/// Store offset of the SwanCrystal factory TFT table
pub const SWANCRYSTAL_TFT_OFFSET: u16 = 0xAE;

/// Factory TFT configuration for SwanCrystal consoles
pub const SWANCRYSTAL_FACTORY_TFT: [u8; 8] = [0xD0, 0x77, 0xF7, 0x06, 0xE2, 0x0A, 0xEA, 0xEE];

/// Number of progress bar cells drawn during install and verify
pub const PROGRESS_CELLS: u8 = 26;

/// Block-transfer geometry
pub const TRANSFER_BLOCK_SIZE: usize = 128;
pub const TRANSFER_BLOCK_COUNT: usize = 16;
pub const TRANSFER_BUFFER_SIZE: usize = TRANSFER_BLOCK_SIZE * TRANSFER_BLOCK_COUNT;

/// Serial rate used for XMODEM transfers
pub const TRANSFER_BAUD: u32 = 38_400;

/// XMODEM retry limit per block
pub const TRANSFER_RETRIES: u8 = 10;

/// Polls of the serial port before a byte read is considered timed out
pub const TRANSFER_POLL_TIMEOUT: u32 = 200_000;

/// Key repeat timing in vblank ticks
pub const KEY_REPEAT_DELAY: u8 = 15;
pub const KEY_REPEAT_DELAY_NEXT: u8 = 3;

/// Header plausibility limits
pub const SPLASH_MAX_SPRITES: u8 = 128;
pub const SPLASH_MAX_TILES: u8 = (0x760 / 8) as u8;
pub const SPLASH_MIN_VBLANK_ADDRESS: u32 = 0x0800;

/// Owner tag of payloads produced by this installer
pub const OWNER_TAG: [u8; 2] = *b"bF";

/// Text screen geometry in character cells
pub const SCREEN_COLUMNS: u8 = 28;
pub const SCREEN_ROWS: u8 = 18;

/// Key auto-repeat timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Ticks between the first press and the first repeat
    pub initial_delay: u8,
    /// Ticks between subsequent repeats
    pub repeat_delay: u8,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            initial_delay: KEY_REPEAT_DELAY,
            repeat_delay: KEY_REPEAT_DELAY_NEXT,
        }
    }
}

/// Serial block-transfer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    pub baud: u32,
    pub retries: u8,
    pub poll_timeout: u32,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            baud: TRANSFER_BAUD,
            retries: TRANSFER_RETRIES,
            poll_timeout: TRANSFER_POLL_TIMEOUT,
        }
    }
}
