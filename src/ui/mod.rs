//! Text layout, menus and operator prompts

use ufmt::{uWrite, uwrite};

use crate::config::{SCREEN_COLUMNS, SCREEN_ROWS};
use crate::drivers::debouncer::InputDebouncer;
use crate::drivers::keypad::{Key, KeySet};
use crate::drivers::screen::{Color, TextScreen};
use crate::os::Idle;
use crate::splash::status::StatusLine;

const TITLE: &str = "splash installer      v0.1.0";

const PROGRESS_ROW: u8 = 15;
const STATUS_ROW: u8 = 6;
const WORK_FIRST_ROW: u8 = 3;
const WORK_LAST_ROW: u8 = 17;

/// Messages the core operations put in front of the operator
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    Installing,
    Verifying,
    VerifyError { offset: u16 },
    BackingUp,
    TransferInit,
    Transferring,
    TransferError,
    InvalidSize { received: u16 },
    InvalidContents,
}

/// Questions asked before a risky step
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prompt {
    BackupFirst,
    Install,
    AreYouSure,
    SwanCrystalRecovery,
}

/// Presentation surface consumed by the installer and the backup code
pub trait Frontend {
    fn notice(&mut self, notice: Notice);

    /// Lights progress cell `cell` (0-based)
    fn progress(&mut self, cell: u8);

    /// Removes progress and notices from the work area
    fn clear(&mut self);

    /// Blocks until the operator presses a key
    fn acknowledge(&mut self);

    fn confirm(&mut self, prompt: Prompt) -> bool;
}

impl<T: Frontend + ?Sized> Frontend for &mut T {
    fn notice(&mut self, notice: Notice) {
        (**self).notice(notice)
    }
    fn progress(&mut self, cell: u8) {
        (**self).progress(cell)
    }
    fn clear(&mut self) {
        (**self).clear()
    }
    fn acknowledge(&mut self) {
        (**self).acknowledge()
    }
    fn confirm(&mut self, prompt: Prompt) -> bool {
        (**self).confirm(prompt)
    }
}

/// Fixed-capacity line of text for `uwrite!`
pub struct LineBuf<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuf<N> {
    pub const fn new() -> Self {
        Self { buf: [0; N], len: 0 }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `value` as `digits` upper-case hex digits
    pub fn push_hex(&mut self, value: u16, digits: u8) {
        const HEX_CHARS: [u8; 16] = *b"0123456789ABCDEF";
        for shift in (0..digits).rev() {
            let nibble = (value >> (shift * 4)) & 0xF;
            self.push(HEX_CHARS[nibble as usize]);
        }
    }

    fn push(&mut self, byte: u8) {
        if self.len < N {
            self.buf[self.len] = byte;
            self.len += 1;
        }
    }
}

impl<const N: usize> Default for LineBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> uWrite for LineBuf<N> {
    type Error = core::convert::Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        for &byte in s.as_bytes() {
            self.push(byte);
        }
        Ok(())
    }
}

fn is_space(c: u8) -> bool {
    c == 0 || c == b'\n' || c == b' '
}

fn is_divider(c: u8) -> bool {
    is_space(c) || c == b'-'
}

/// Writes `text` at (`x`, `y`), wrapping on word boundaries.
/// Returns the row the text ended on.
pub fn puts<S: TextScreen + ?Sized>(screen: &mut S, mut x: u8, mut y: u8, color: Color, text: &str) -> u8 {
    let bytes = text.as_bytes();
    let cols = SCREEN_COLUMNS as usize;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\n' {
            i += 1;
            x = 0;
            y += 1;
            continue;
        }
        if is_space(c) && x == 0 {
            i += 1;
            continue;
        }

        let mut chars = 1;
        while i + chars < bytes.len() && !is_divider(bytes[i + chars]) {
            chars += 1;
        }
        if i + chars < bytes.len() && !is_space(bytes[i + chars]) {
            chars += 1;
        }

        if x as usize + chars > cols {
            if x != 0 {
                x = 0;
                y += 1;
                continue;
            }
            chars = cols;
        }

        for &ch in &bytes[i..i + chars] {
            screen.put_cell(x, y, color, ch);
            x += 1;
        }
        i += chars;
    }
    y
}

pub fn puts_centered<S: TextScreen + ?Sized>(screen: &mut S, y: u8, color: Color, text: &str) {
    let len = text.len().min(SCREEN_COLUMNS as usize) as u8;
    puts(screen, (SCREEN_COLUMNS - len) >> 1, y, color, text);
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry<'t> {
    pub text: &'t str,
    pub enabled: bool,
}

impl<'t> MenuEntry<'t> {
    pub const fn new(text: &'t str, enabled: bool) -> Self {
        Self { text, enabled }
    }
}

/// Screen plus keypad: everything the operator sees and touches
pub struct Console<'a, S: TextScreen, P: Idle> {
    screen: S,
    input: InputDebouncer<'a>,
    cpu: P,
}

impl<'a, S: TextScreen, P: Idle> Console<'a, S, P> {
    pub fn new(screen: S, input: InputDebouncer<'a>, cpu: P) -> Self {
        Self { screen, input, cpu }
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn input(&mut self) -> &mut InputDebouncer<'a> {
        &mut self.input
    }

    pub fn cpu(&mut self) -> &mut P {
        &mut self.cpu
    }

    pub fn puts(&mut self, x: u8, y: u8, color: Color, text: &str) -> u8 {
        puts(&mut self.screen, x, y, color, text)
    }

    pub fn puts_centered(&mut self, y: u8, color: Color, text: &str) {
        puts_centered(&mut self.screen, y, color, text)
    }

    pub fn clear_lines(&mut self, from: u8, to: u8) {
        self.screen.clear_lines(from, to.min(SCREEN_ROWS - 1));
    }

    pub fn wait_until_idle(&mut self) {
        self.input.wait_until_idle(&mut self.cpu);
    }

    pub fn wait_for_keypress(&mut self) -> KeySet {
        self.input.wait_for_keypress(&mut self.cpu)
    }

    /// Redraws the title row and the lock/splash status row
    pub fn draw_status_bar(&mut self, status: &StatusLine) {
        self.screen.fill_line(0, Color::Title);
        self.puts(0, 0, Color::Title, TITLE);
        self.clear_lines(1, 1);

        let lock = if status.locked { "EEP locked" } else { "EEP unlocked" };
        self.puts(0, 1, Color::Black, lock);

        let text = status.text();
        let color = if status.active { Color::Black } else { Color::Gray };
        let width = text.len().min(SCREEN_COLUMNS as usize) as u8;
        self.puts(SCREEN_COLUMNS - width, 1, color, text.as_str());
    }

    fn draw_entry(&mut self, entry: &MenuEntry<'_>, y: u8, selected: bool) {
        let color = if selected {
            Color::Selected
        } else if entry.enabled {
            Color::Black
        } else {
            Color::Gray
        };
        self.screen.fill_line(y, color);
        self.puts_centered(y, color, entry.text);
    }

    /// Runs a vertical list starting at row `y`. `None` when nothing is enabled.
    pub fn run_menu(&mut self, entries: &[MenuEntry<'_>], y: u8) -> Option<usize> {
        let mut current = entries.iter().position(|e| e.enabled)?;

        for (i, entry) in entries.iter().enumerate() {
            self.draw_entry(entry, y + i as u8, i == current);
        }

        loop {
            self.input.poll(&mut self.cpu);
            let pressed = self.input.pressed();

            let next = if pressed.contains(Key::A) {
                self.wait_until_idle();
                self.clear_lines(y, y + entries.len() as u8 - 1);
                return Some(current);
            } else if pressed.contains(Key::UP) {
                (0..current).rev().find(|&i| entries[i].enabled)
            } else if pressed.contains(Key::DOWN) {
                (current + 1..entries.len()).find(|&i| entries[i].enabled)
            } else {
                None
            };

            if let Some(next) = next {
                self.draw_entry(&entries[current], y + current as u8, false);
                current = next;
                self.draw_entry(&entries[current], y + current as u8, true);
            }
        }
    }

    /// Yes/no question centred in the work area
    pub fn ask(&mut self, text: &str, text_height: u8, centered: bool, yes_default: bool) -> bool {
        let height = text_height + 3;
        let y_text = WORK_FIRST_ROW + ((14u8.saturating_sub(height)) >> 1);
        let y_menu = y_text + text_height + 1;

        if centered {
            self.puts_centered(y_text, Color::Black, text);
        } else {
            self.puts(0, y_text, Color::Black, text);
        }

        let entries = if yes_default {
            [MenuEntry::new("Yes", true), MenuEntry::new("No", true)]
        } else {
            [MenuEntry::new("No", true), MenuEntry::new("Yes", true)]
        };
        let result = self.run_menu(&entries, y_menu);

        self.clear_lines(y_text, y_text + text_height - 1);
        match result {
            Some(0) => yes_default,
            Some(1) => !yes_default,
            _ => false,
        }
    }

    fn status(&mut self, text: &str) {
        self.clear_lines(STATUS_ROW, STATUS_ROW);
        self.puts_centered(STATUS_ROW, Color::Black, text);
    }
}

impl<S: TextScreen, P: Idle> Frontend for Console<'_, S, P> {
    fn notice(&mut self, notice: Notice) {
        match notice {
            Notice::Installing => {
                self.puts(1, 3, Color::Black, "Installing IEEPROM data...");
                self.puts(0, 5, Color::Red, "Do not turn off the console!");
            }
            Notice::Verifying => {
                self.puts(1, 3, Color::Black, "Verifying IEEPROM data....");
                self.clear_lines(PROGRESS_ROW, PROGRESS_ROW);
            }
            Notice::VerifyError { offset } => {
                let mut line = LineBuf::<28>::new();
                uwrite!(line, "Verify error @ ").ok();
                line.push_hex(offset, 3);
                self.clear_lines(PROGRESS_ROW, PROGRESS_ROW);
                self.puts(1, PROGRESS_ROW, Color::Red, line.as_str());
            }
            Notice::BackingUp => {
                self.clear_lines(WORK_FIRST_ROW, WORK_LAST_ROW);
                self.puts(1, 3, Color::Black, "Backing up IEEPROM...");
            }
            Notice::TransferInit => self.status("Initializing XMODEM transfer"),
            Notice::Transferring => self.status("Transferring data"),
            Notice::TransferError => self.status("Transfer error"),
            Notice::InvalidSize { received } => {
                self.status("Invalid file size");
                let mut line = LineBuf::<28>::new();
                uwrite!(line, "({} bytes)", received).ok();
                self.puts_centered(STATUS_ROW + 1, Color::Gray, line.as_str());
            }
            Notice::InvalidContents => self.status("Invalid file contents"),
        }
    }

    fn progress(&mut self, cell: u8) {
        self.screen.put_cell(1 + cell, PROGRESS_ROW, Color::Selected, b' ');
    }

    fn clear(&mut self) {
        self.clear_lines(WORK_FIRST_ROW, WORK_LAST_ROW);
    }

    fn acknowledge(&mut self) {
        self.wait_for_keypress();
    }

    fn confirm(&mut self, prompt: Prompt) -> bool {
        self.wait_until_idle();
        match prompt {
            Prompt::BackupFirst => self.ask(
                "Would you like to backup your internal EEPROM to cartridge save RAM first?",
                5,
                false,
                true,
            ),
            Prompt::Install => self.ask(
                "THIS SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND.\n\nWould you like to install?",
                6,
                false,
                false,
            ),
            Prompt::AreYouSure => self.ask("Are you sure?", 1, true, false),
            Prompt::SwanCrystalRecovery => self.ask(
                "THIS SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND.\n\nThis option tries to restore factory TFT configuration for SwanCrystal consoles.\n\nWould you like to continue?",
                9,
                false,
                false,
            ),
        }
    }
}
