//! Cached view of the installed splash header

use ufmt::uwrite;

use super::{is_valid, BootSplashHeader, HEADER_SIZE};
use crate::config::SPLASH_HEADER_OFFSET;
use crate::hal::eeprom::Eeprom;
use crate::ui::LineBuf;

/// What the store currently boots with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SplashStatus {
    NoSplash,
    InvalidSplash,
    ForeignSplash,
    Recognized { version: u8 },
}

/// Everything the status bar shows
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub locked: bool,
    pub active: bool,
    pub status: SplashStatus,
}

impl StatusLine {
    pub fn text(&self) -> LineBuf<28> {
        let mut line = LineBuf::new();
        match self.status {
            SplashStatus::NoSplash => uwrite!(line, "no splash").ok(),
            SplashStatus::InvalidSplash => uwrite!(line, "invalid splash").ok(),
            SplashStatus::ForeignSplash => uwrite!(line, "non-BF splash").ok(),
            SplashStatus::Recognized { version } => {
                uwrite!(line, "BF v.").ok();
                line.push_hex(version as u16, 2);
                Some(())
            }
        };
        line
    }
}

/// Reads the store's header only when something marked it dirty
pub struct StatusInspector {
    header: BootSplashHeader,
    valid: bool,
    dirty: bool,
}

impl StatusInspector {
    pub const fn new() -> Self {
        Self {
            header: BootSplashHeader::from_raw([0; HEADER_SIZE]),
            valid: false,
            dirty: true,
        }
    }

    /// Forces the next [`refresh`](Self::refresh) to re-read the store
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn refresh<E: Eeprom + ?Sized>(&mut self, eeprom: &mut E) {
        if !self.dirty {
            return;
        }
        let mut raw = [0u8; HEADER_SIZE];
        eeprom.read_block(SPLASH_HEADER_OFFSET, &mut raw);
        self.header = BootSplashHeader::from_raw(raw);
        self.valid = is_valid(&self.header);
        self.dirty = false;
    }

    pub fn header(&self) -> &BootSplashHeader {
        &self.header
    }

    pub fn splash_valid(&self) -> bool {
        self.valid
    }

    pub fn splash_active(&self) -> bool {
        self.header.custom_splash_enabled()
    }

    pub fn splash_ours(&self) -> bool {
        self.header.is_ours()
    }

    /// Classification of the cached header
    pub fn status(&self) -> SplashStatus {
        match (self.valid, self.splash_active()) {
            (false, false) => SplashStatus::NoSplash,
            (false, true) => SplashStatus::InvalidSplash,
            (true, _) if !self.header.is_ours() => SplashStatus::ForeignSplash,
            (true, _) => SplashStatus::Recognized {
                version: self.header.owner_version(),
            },
        }
    }

    /// Refreshes if needed and builds the status bar contents
    pub fn status_line<E: Eeprom + ?Sized>(&mut self, eeprom: &mut E) -> StatusLine {
        self.refresh(eeprom);
        StatusLine {
            locked: eeprom.protect_check(),
            active: self.splash_active(),
            status: self.status(),
        }
    }
}

impl Default for StatusInspector {
    fn default() -> Self {
        Self::new()
    }
}
