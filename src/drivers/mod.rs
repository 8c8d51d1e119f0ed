pub mod debouncer;
pub mod keypad;
pub mod screen;
pub mod serial_console;

pub use debouncer::InputDebouncer;
pub use keypad::{InputLatch, Key, KeySet};
pub use screen::{Color, TextBuffer, TextScreen};
pub use serial_console::SerialConsole;
