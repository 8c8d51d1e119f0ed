//! Install/verify engine for the boot-splash payload
//!
//! An install runs with the periodic interrupt masked and keeps the store
//! bootable at every step: the custom splash is switched off before the
//! first payload word is touched and switched back on only after the whole
//! payload read back correctly.

use crate::config::{
    IEEP_C_OPTIONS1_CUSTOM_SPLASH, INSTALL_START, NAME_COLOR_LIMIT, NAME_COLOR_OFFSET,
    OPTIONS_WORD_OFFSET, PAYLOAD_MAX_SIZE, PROGRESS_CELLS, SPLASH_HEADER_OFFSET,
    SWANCRYSTAL_DATA_END, SWANCRYSTAL_DATA_START, SWANCRYSTAL_FACTORY_TFT, SWANCRYSTAL_TFT_OFFSET,
};
use crate::diagnostics::{self, Fault, Result};
use crate::hal::eeprom::Eeprom;
use crate::hal::interrupt::Interrupts;
use crate::logger::{Event, Journal};
use crate::splash::status::StatusInspector;
use crate::ui::{Frontend, Notice};

const SPLASH_ENABLE_MASK: u16 = (IEEP_C_OPTIONS1_CUSTOM_SPLASH as u16) << 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InstallState {
    Idle,
    Writing,
    Verifying,
    Enabling,
}

/// What an install did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstallReport {
    /// Payload bytes considered
    pub size: u16,
    /// Payload words that differed and were rewritten
    pub written: u16,
}

/// Header-relative word offsets an install walks, paired with whether the
/// word is written. The SwanCrystal block is walked (it counts for progress)
/// but never written; an out-of-range name colour is skipped entirely.
fn payload_words(image: &[u8], size: u16) -> impl Iterator<Item = (u16, bool)> + '_ {
    (INSTALL_START..size)
        .step_by(2)
        .filter(move |&i| !(i == NAME_COLOR_OFFSET && image[i as usize] >= NAME_COLOR_LIMIT))
        .map(|i| (i, !(SWANCRYSTAL_DATA_START..SWANCRYSTAL_DATA_END).contains(&i)))
}

/// Image word at `i`; an odd trailing byte keeps the stored high byte
fn image_word(image: &[u8], i: u16, stored: u16) -> u16 {
    let lo = image[i as usize];
    let hi = image
        .get(i as usize + 1)
        .copied()
        .unwrap_or((stored >> 8) as u8);
    u16::from_le_bytes([lo, hi])
}

/// Progress bar: `PROGRESS_CELLS` cells spread over the walked words
struct Progress {
    per_cell: u16,
    count: u16,
    cell: u8,
}

impl Progress {
    fn new(size: u16) -> Self {
        Self {
            per_cell: size.saturating_sub(INSTALL_START) / (PROGRESS_CELLS as u16 * 2),
            count: 0,
            cell: 0,
        }
    }

    fn step<U: Frontend + ?Sized>(&mut self, ui: &mut U) {
        if self.cell >= PROGRESS_CELLS {
            return;
        }
        self.count += 1;
        if self.count == self.per_cell {
            ui.progress(self.cell);
            self.cell += 1;
            self.count = 0;
        }
    }
}

pub struct Installer<'a, E: Eeprom, I: Interrupts> {
    eeprom: E,
    irq: &'a I,
    status: StatusInspector,
    journal: Journal,
    state: InstallState,
}

impl<'a, E: Eeprom, I: Interrupts> Installer<'a, E, I> {
    pub fn new(eeprom: E, irq: &'a I, journal: Journal) -> Self {
        Self {
            eeprom,
            irq,
            status: StatusInspector::new(),
            journal,
            state: InstallState::Idle,
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn eeprom(&mut self) -> &mut E {
        &mut self.eeprom
    }

    pub fn interrupts(&self) -> &'a I {
        self.irq
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn journal_mut(&mut self) -> &mut Journal {
        &mut self.journal
    }

    /// Status inspector, refreshed against the store if it was marked dirty
    pub fn status(&mut self) -> &StatusInspector {
        self.status.refresh(&mut self.eeprom);
        &self.status
    }

    pub fn status_line(&mut self) -> crate::splash::status::StatusLine {
        self.status.status_line(&mut self.eeprom)
    }

    pub fn is_locked(&mut self) -> bool {
        self.eeprom.protect_check()
    }

    /// Writes `image` (header first, at most one payload) into the store,
    /// verifies it and only then enables the custom splash.
    ///
    /// On a verify mismatch the operator is shown the failing offset and the
    /// splash stays disabled.
    pub fn install<U: Frontend + ?Sized>(&mut self, ui: &mut U, image: &[u8]) -> Result<InstallReport> {
        let size = image.len().min(PAYLOAD_MAX_SIZE as usize) as u16;
        let image = &image[..size as usize];
        self.journal.log(Event::InstallStarted { size });
        ui.notice(Notice::Installing);

        let irq = self.irq;
        let guard = irq.suppress();

        let options = self.disable_splash();
        self.state = InstallState::Writing;
        let written = self.write_payload(ui, image, size);

        ui.notice(Notice::Verifying);
        self.state = InstallState::Verifying;
        let result = match self.verify_payload(ui, image, size) {
            Ok(()) => {
                self.state = InstallState::Enabling;
                self.eeprom
                    .write_word(OPTIONS_WORD_OFFSET, options | SPLASH_ENABLE_MASK);
                drop(guard);
                self.journal.log(Event::InstallFinished { written });
                Ok(InstallReport { size, written })
            }
            Err(offset) => {
                ui.notice(Notice::VerifyError { offset });
                self.journal.log(Event::VerifyMismatch { offset });
                guard.rearm();
                ui.acknowledge();
                Err(diagnostics::report(Fault::VerifyMismatch { offset }))
            }
        };

        self.state = InstallState::Idle;
        ui.clear();
        self.status.mark_dirty();
        result
    }

    /// Clears the enable bit if set; returns the options word without it
    fn disable_splash(&mut self) -> u16 {
        let options = self.eeprom.read_word(OPTIONS_WORD_OFFSET);
        if options & SPLASH_ENABLE_MASK != 0 {
            self.eeprom
                .write_word(OPTIONS_WORD_OFFSET, options ^ SPLASH_ENABLE_MASK);
        }
        options & !SPLASH_ENABLE_MASK
    }

    fn write_payload<U: Frontend + ?Sized>(&mut self, ui: &mut U, image: &[u8], size: u16) -> u16 {
        let mut progress = Progress::new(size);
        let mut written = 0;
        for (i, writable) in payload_words(image, size) {
            if writable {
                let addr = SPLASH_HEADER_OFFSET + i;
                let stored = self.eeprom.read_word(addr);
                let word = image_word(image, i, stored);
                if word != stored {
                    self.eeprom.write_word(addr, word);
                    written += 1;
                }
            }
            progress.step(ui);
        }
        written
    }

    /// Returns the first header-relative offset that did not read back
    fn verify_payload<U: Frontend + ?Sized>(
        &mut self,
        ui: &mut U,
        image: &[u8],
        size: u16,
    ) -> core::result::Result<(), u16> {
        let mut progress = Progress::new(size);
        for (i, writable) in payload_words(image, size) {
            if writable {
                let stored = self.eeprom.read_word(SPLASH_HEADER_OFFSET + i);
                if image_word(image, i, stored) != stored {
                    return Err(i);
                }
            }
            progress.step(ui);
        }
        Ok(())
    }

    /// Flips the custom-splash bit; returns whether it is now set
    pub fn toggle_splash(&mut self) -> bool {
        let options = self.eeprom.read_word(OPTIONS_WORD_OFFSET) ^ SPLASH_ENABLE_MASK;
        self.eeprom.write_word(OPTIONS_WORD_OFFSET, options);
        self.status.mark_dirty();

        let enabled = options & SPLASH_ENABLE_MASK != 0;
        self.journal.log(Event::SplashToggled { enabled });
        enabled
    }

    /// Rewrites the SwanCrystal factory TFT table; returns words changed
    pub fn recover_swancrystal(&mut self) -> u16 {
        let mut written = 0;
        for (i, pair) in SWANCRYSTAL_FACTORY_TFT.chunks_exact(2).enumerate() {
            let addr = SWANCRYSTAL_TFT_OFFSET + (i as u16) * 2;
            let word = u16::from_le_bytes([pair[0], pair[1]]);
            if self.eeprom.read_word(addr) != word {
                self.eeprom.write_word(addr, word);
                written += 1;
            }
        }
        self.status.mark_dirty();
        self.journal.log(Event::SwanCrystalRecovered { written });
        written
    }
}
