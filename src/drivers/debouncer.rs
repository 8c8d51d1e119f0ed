//! Edge-triggered key events with auto-repeat

use super::keypad::{InputLatch, Key, KeySet, KEY_COUNT};
use crate::config::DebounceConfig;
use crate::os::{Idle, VblankClock};

/// Turns the interrupt-accumulated key latch into one event per update.
///
/// Keys are scanned in [`Key::ALL`] order and the scan stops at the first
/// active key, so at most one key is reported per call.
pub struct InputDebouncer<'a> {
    latch: &'a InputLatch,
    clock: &'a VblankClock,
    config: DebounceConfig,
    deadlines: [u8; KEY_COUNT],
    pressed: KeySet,
}

impl<'a> InputDebouncer<'a> {
    pub fn new(latch: &'a InputLatch, clock: &'a VblankClock) -> Self {
        Self::with_config(latch, clock, DebounceConfig::default())
    }

    pub fn with_config(latch: &'a InputLatch, clock: &'a VblankClock, config: DebounceConfig) -> Self {
        Self {
            latch,
            clock,
            config,
            deadlines: [0; KEY_COUNT],
            pressed: KeySet::EMPTY,
        }
    }

    pub fn config(&self) -> DebounceConfig {
        self.config
    }

    /// Keys that became active on the last [`update`](Self::update)
    pub fn pressed(&self) -> KeySet {
        self.pressed
    }

    pub fn is_pressed(&self, key: Key) -> bool {
        self.pressed.contains(key)
    }

    /// Consumes the latch once per display refresh
    pub fn update(&mut self) -> KeySet {
        let now = self.clock.ticks_u8();
        let config = self.config;
        let deadlines = &mut self.deadlines;

        let pressed = self.latch.with(|latch| {
            let mut pressed = 0u16;

            for key in Key::ALL {
                let mask = key.mask();
                let idx = key.index();

                if latch.keys & mask == 0 {
                    latch.held &= !mask;
                    continue;
                }

                let released = latch.released & mask != 0;
                if latch.repressed & mask != 0 {
                    pressed |= mask;
                    latch.held |= mask;
                    deadlines[idx] = now.wrapping_add(config.initial_delay);
                } else if latch.held & mask != 0 {
                    if released {
                        latch.held &= !mask;
                    }
                    // Deadline still ahead of the counter: try the next key.
                    if deadlines[idx].wrapping_sub(now) < 0x80 {
                        continue;
                    }
                    if !released {
                        pressed |= mask;
                        deadlines[idx] = now.wrapping_add(config.repeat_delay);
                    }
                } else if !released {
                    pressed |= mask;
                    latch.held |= mask;
                    deadlines[idx] = now.wrapping_add(config.initial_delay);
                }
                break;
            }

            latch.clear();
            pressed
        });

        self.pressed = KeySet(pressed);
        self.pressed
    }

    /// Drops everything the interrupt accumulated so far
    pub fn reset(&self) {
        self.latch.reset();
    }

    /// Waits for the next refresh, then updates
    pub fn poll<P: Idle + ?Sized>(&mut self, cpu: &mut P) -> KeySet {
        self.clock.wait_for_vblank(cpu);
        self.update()
    }

    /// Blocks until every key is up, then clears the pending state
    pub fn wait_until_idle<P: Idle + ?Sized>(&mut self, cpu: &mut P) {
        loop {
            self.latch.reset();
            self.clock.wait_for_vblank(cpu);
            if self.latch.pending().is_empty() {
                break;
            }
        }
        self.update();
    }

    /// Blocks until one key event arrives; returns it
    pub fn wait_for_keypress<P: Idle + ?Sized>(&mut self, cpu: &mut P) -> KeySet {
        self.wait_until_idle(cpu);
        let pressed = loop {
            let pressed = self.poll(cpu);
            if !pressed.is_empty() {
                break pressed;
            }
        };
        self.wait_until_idle(cpu);
        pressed
    }
}
