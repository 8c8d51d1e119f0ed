//! Keypad bit layout and the interrupt-side key latch

use core::cell::RefCell;
use critical_section::Mutex;

/// Number of physical keys tracked for repeat timing
pub const KEY_COUNT: usize = 11;

/// Physical keys in scan priority order. Bit 0 of the raw mask is unused.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    Start,
    A,
    B,
    X1,
    X2,
    X3,
    X4,
    Y1,
    Y2,
    Y3,
    Y4,
}

impl Key {
    pub const ALL: [Key; KEY_COUNT] = [
        Key::Start,
        Key::A,
        Key::B,
        Key::X1,
        Key::X2,
        Key::X3,
        Key::X4,
        Key::Y1,
        Key::Y2,
        Key::Y3,
        Key::Y4,
    ];

    pub const UP: Key = Key::X1;
    pub const RIGHT: Key = Key::X2;
    pub const DOWN: Key = Key::X3;
    pub const LEFT: Key = Key::X4;

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn mask(self) -> u16 {
        2 << (self as u16)
    }
}

/// Bitmask of keys in raw scan layout
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeySet(pub u16);

impl KeySet {
    pub const EMPTY: KeySet = KeySet(0);

    pub const fn of(key: Key) -> Self {
        KeySet(key.mask())
    }

    pub const fn with(self, key: Key) -> Self {
        KeySet(self.0 | key.mask())
    }

    #[inline]
    pub const fn contains(self, key: Key) -> bool {
        self.0 & key.mask() != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// First key in priority order
    pub fn first(self) -> Option<Key> {
        Key::ALL.iter().copied().find(|&key| self.contains(key))
    }
}

impl From<Key> for KeySet {
    fn from(key: Key) -> Self {
        KeySet::of(key)
    }
}

/// Accumulators written by the periodic interrupt.
///
/// `held` is owned by the debouncer but read here to detect releases.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LatchState {
    pub keys: u16,
    pub repressed: u16,
    pub released: u16,
    pub held: u16,
}

impl LatchState {
    /// Folds one raw scan into the accumulators
    #[inline]
    pub fn sample(&mut self, keys: u16) {
        self.keys |= keys;
        self.repressed |= keys & self.released;
        self.released |= self.held & !keys;
    }

    /// Clears everything accumulated since the last consume
    #[inline]
    pub fn clear(&mut self) {
        self.keys = 0;
        self.repressed = 0;
        self.released = 0;
    }
}

/// Key state shared between the periodic interrupt and the UI loop
pub struct InputLatch {
    state: Mutex<RefCell<LatchState>>,
}

impl InputLatch {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(LatchState {
                keys: 0,
                repressed: 0,
                released: 0,
                held: 0,
            })),
        }
    }

    /// Called from the periodic interrupt with the raw keypad scan
    pub fn sample(&self, keys: KeySet) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).sample(keys.0));
    }

    /// Clears the accumulators with interrupts masked
    pub fn reset(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).clear());
    }

    /// Runs `f` on the latch with interrupts masked
    pub fn with<R>(&self, f: impl FnOnce(&mut LatchState) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.state.borrow_ref_mut(cs)))
    }

    /// Keys seen down since the last reset
    pub fn pending(&self) -> KeySet {
        critical_section::with(|cs| KeySet(self.state.borrow_ref(cs).keys))
    }
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}
