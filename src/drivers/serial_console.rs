//! Text screen rendered on a VT100/ANSI serial terminal

use embedded_hal::serial;
use nb::block;

use super::screen::{Color, TextScreen};

/// Draws cells by moving the terminal cursor; tracks the last colour and
/// position to avoid redundant escape sequences.
pub struct SerialConsole<W> {
    port: W,
    cursor: Option<(u8, u8)>,
    color: Option<Color>,
}

impl<W: serial::Write<u8>> SerialConsole<W> {
    pub fn new(port: W) -> Self {
        Self {
            port,
            cursor: None,
            color: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.port
    }

    /// Clears the terminal and hides the cursor
    pub fn reset(&mut self) {
        self.write_str("\x1b[0m\x1b[2J\x1b[?25l");
        self.cursor = None;
        self.color = None;
    }

    pub fn write_byte(&mut self, byte: u8) {
        block!(self.port.write(byte)).ok();
    }

    pub fn write_str(&mut self, s: &str) {
        for byte in s.bytes() {
            self.write_byte(byte);
        }
    }

    fn write_decimal(&mut self, value: u8) {
        if value >= 100 {
            self.write_byte(b'0' + value / 100);
        }
        if value >= 10 {
            self.write_byte(b'0' + (value / 10) % 10);
        }
        self.write_byte(b'0' + value % 10);
    }

    fn move_to(&mut self, x: u8, y: u8) {
        if self.cursor == Some((x, y)) {
            return;
        }
        self.write_str("\x1b[");
        self.write_decimal(y + 1);
        self.write_byte(b';');
        self.write_decimal(x + 1);
        self.write_byte(b'H');
        self.cursor = Some((x, y));
    }

    fn set_color(&mut self, color: Color) {
        if self.color == Some(color) {
            return;
        }
        self.write_str(match color {
            Color::Black => "\x1b[0m",
            Color::Gray => "\x1b[0;90m",
            Color::Red => "\x1b[0;31m",
            Color::Selected => "\x1b[0;7m",
            Color::Title => "\x1b[0;1;7m",
        });
        self.color = Some(color);
    }
}

impl<W: serial::Write<u8>> TextScreen for SerialConsole<W> {
    fn put_cell(&mut self, x: u8, y: u8, color: Color, ch: u8) {
        self.move_to(x, y);
        self.set_color(color);
        self.write_byte(if ch.is_ascii_graphic() { ch } else { b' ' });
        self.cursor = Some((x + 1, y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct Sink(Vec<u8>);

    impl serial::Write<u8> for Sink {
        type Error = Infallible;

        fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
            self.0.push(word);
            Ok(())
        }

        fn flush(&mut self) -> nb::Result<(), Infallible> {
            Ok(())
        }
    }

    #[test]
    fn adjacent_cells_share_one_cursor_move() {
        let mut console = SerialConsole::new(Sink::default());
        console.put_cell(2, 0, Color::Black, b'h');
        console.put_cell(3, 0, Color::Black, b'i');
        assert_eq!(console.into_inner().0, b"\x1b[1;3H\x1b[0mhi");
    }

    #[test]
    fn colour_change_and_jump() {
        let mut console = SerialConsole::new(Sink::default());
        console.put_cell(0, 0, Color::Black, b'a');
        console.put_cell(10, 14, Color::Red, b'b');
        assert_eq!(console.into_inner().0, b"\x1b[1;1H\x1b[0ma\x1b[15;11H\x1b[0;31mb");
    }

    #[test]
    fn control_bytes_render_blank() {
        let mut console = SerialConsole::new(Sink::default());
        console.put_cell(0, 0, Color::Black, 0);
        assert_eq!(console.into_inner().0.last(), Some(&b' '));
    }
}
