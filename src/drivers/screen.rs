//! Character-cell text screen

use crate::config::{SCREEN_COLUMNS, SCREEN_ROWS};

/// Palette indices used by the installer UI
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Gray = 1,
    Red = 4,
    Selected = 10,
    Title = 11,
}

/// A 28x18 grid of character cells, each with a palette index
pub trait TextScreen {
    fn put_cell(&mut self, x: u8, y: u8, color: Color, ch: u8);

    /// Blanks rows `from..=to`
    fn clear_lines(&mut self, from: u8, to: u8) {
        for y in from..=to {
            for x in 0..SCREEN_COLUMNS {
                self.put_cell(x, y, Color::Black, b' ');
            }
        }
    }

    /// Fills row `y` with blank cells of `color`
    fn fill_line(&mut self, y: u8, color: Color) {
        for x in 0..SCREEN_COLUMNS {
            self.put_cell(x, y, color, b' ');
        }
    }
}

impl<T: TextScreen + ?Sized> TextScreen for &mut T {
    fn put_cell(&mut self, x: u8, y: u8, color: Color, ch: u8) {
        (**self).put_cell(x, y, color, ch)
    }

    fn clear_lines(&mut self, from: u8, to: u8) {
        (**self).clear_lines(from, to)
    }

    fn fill_line(&mut self, y: u8, color: Color) {
        (**self).fill_line(y, color)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: u8,
    pub color: Color,
}

const COLS: usize = SCREEN_COLUMNS as usize;
const ROWS: usize = SCREEN_ROWS as usize;

/// Screen kept in RAM, readable back as text
pub struct TextBuffer {
    cells: [[Cell; COLS]; ROWS],
}

impl TextBuffer {
    pub const fn new() -> Self {
        Self {
            cells: [[Cell { ch: b' ', color: Color::Black }; COLS]; ROWS],
        }
    }

    pub fn cell(&self, x: u8, y: u8) -> Cell {
        self.cells[y as usize][x as usize]
    }

    /// Row `y` as ASCII bytes, trailing blanks included
    pub fn row(&self, y: u8) -> [u8; COLS] {
        let mut out = [b' '; COLS];
        for (dst, cell) in out.iter_mut().zip(self.cells[y as usize].iter()) {
            *dst = cell.ch;
        }
        out
    }

    /// Whether `needle` appears on row `y`
    pub fn row_contains(&self, y: u8, needle: &str) -> bool {
        let row = self.row(y);
        let needle = needle.as_bytes();
        needle.is_empty() || row.windows(needle.len()).any(|w| w == needle)
    }

    /// Row index of the first row containing `needle`
    pub fn find(&self, needle: &str) -> Option<u8> {
        (0..SCREEN_ROWS).find(|&y| self.row_contains(y, needle))
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextScreen for TextBuffer {
    fn put_cell(&mut self, x: u8, y: u8, color: Color, ch: u8) {
        if (x as usize) < COLS && (y as usize) < ROWS {
            self.cells[y as usize][x as usize] = Cell { ch, color };
        }
    }
}
