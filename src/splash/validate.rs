//! Structural plausibility checks for boot-splash headers

use super::BootSplashHeader;
use crate::config::{SPLASH_MAX_SPRITES, SPLASH_MAX_TILES, SPLASH_MIN_VBLANK_ADDRESS};

/// Heuristic header check. This is not a checksum: corrupt data with sane
/// looking fields passes.
pub fn is_valid(header: &BootSplashHeader) -> bool {
    if header.size() >= 2 {
        return false;
    }
    if header.start_frame() > header.end_frame() {
        return false;
    }
    if header.sprite_count() > SPLASH_MAX_SPRITES {
        return false;
    }
    if header.tile_count() > SPLASH_MAX_TILES {
        return false;
    }
    header.vblank_handler().linear() >= SPLASH_MIN_VBLANK_ADDRESS
}

/// [`is_valid`] over raw memory; too-short input is zero-filled
pub fn is_valid_bytes(bytes: &[u8]) -> bool {
    is_valid(&BootSplashHeader::from_bytes(bytes))
}
