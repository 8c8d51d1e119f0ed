//! Host-side stand-ins for the board: a fault-injecting store, a scripted
//! transfer channel, a recording frontend and a keypad script.

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use splash_installer::config::{OPTIONS_WORD_OFFSET, PAYLOAD_MAX_SIZE};
use splash_installer::drivers::{InputLatch, KeySet};
use splash_installer::hal::{Eeprom, Interrupts, RamEeprom};
use splash_installer::os::{Idle, VblankClock};
use splash_installer::protocol::{Block, BlockStatus, TransferChannel};
use splash_installer::splash::offset;
use splash_installer::ui::{Frontend, Notice, Prompt};

pub const BF_VERSION: u8 = 0x05;

/// A plausible splash payload tagged as ours
pub fn payload(size: usize) -> Vec<u8> {
    let mut image: Vec<u8> = (0..size).map(|i| (i as u8).wrapping_mul(13) ^ 0x5A).collect();
    image[offset::OPTIONS1] = 0x00;
    image[offset::NAME_COLOR] = 0x03;
    image[offset::SIZE] = 0x01;
    image[offset::START_FRAME] = 0;
    image[offset::END_FRAME] = 60;
    image[offset::SPRITE_COUNT] = 4;
    image[offset::TILE_COUNT] = 100;
    image[offset::VBLANK_CODE_OFFSET] = 0x00;
    image[offset::VBLANK_CODE_OFFSET + 1] = 0x00;
    image[offset::VBLANK_CODE_SEGMENT] = 0x00;
    image[offset::VBLANK_CODE_SEGMENT + 1] = 0x04;
    image[offset::OWNER_TAG] = b'b';
    image[offset::OWNER_TAG + 1] = b'F';
    image[offset::OWNER_VERSION] = BF_VERSION;
    image
}

pub fn full_payload() -> Vec<u8> {
    payload(PAYLOAD_MAX_SIZE as usize)
}

/// Configuration store with write logging and injected faults
pub struct FaultyEeprom {
    pub inner: RamEeprom,
    /// Store addresses of every write that landed
    pub writes: Vec<u16>,
    /// Writes to this address are silently dropped
    pub stuck: Option<u16>,
    /// Power is cut after this many writes; later writes are dropped
    pub power_budget: Option<usize>,
    pub attempted: usize,
    pub locked: bool,
}

impl FaultyEeprom {
    pub fn new() -> Self {
        Self::from_store(RamEeprom::new())
    }

    pub fn from_store(inner: RamEeprom) -> Self {
        Self {
            inner,
            writes: Vec::new(),
            stuck: None,
            power_budget: None,
            attempted: 0,
            locked: false,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn splash_enabled(&self) -> bool {
        self.bytes()[OPTIONS_WORD_OFFSET as usize + 1] & 0x80 != 0
    }

    pub fn payload_writes(&self) -> usize {
        self.writes.iter().filter(|&&a| a != OPTIONS_WORD_OFFSET).count()
    }
}

impl Eeprom for FaultyEeprom {
    fn read_word(&mut self, addr: u16) -> u16 {
        self.inner.read_word(addr)
    }

    fn write_word(&mut self, addr: u16, value: u16) {
        self.attempted += 1;
        if let Some(budget) = self.power_budget {
            if self.attempted > budget {
                return;
            }
        }
        if self.stuck == Some(addr) {
            return;
        }
        self.writes.push(addr);
        self.inner.write_word(addr, value);
    }

    fn protect_check(&mut self) -> bool {
        self.locked
    }
}

#[derive(Default)]
pub struct Irq {
    pub enabled: Cell<bool>,
    pub disables: Cell<u32>,
    pub acks: Cell<u32>,
}

impl Irq {
    pub fn armed() -> Self {
        let irq = Self::default();
        irq.enabled.set(true);
        irq
    }
}

impl Interrupts for Irq {
    fn disable(&self) {
        self.enabled.set(false);
        self.disables.set(self.disables.get() + 1);
    }

    fn enable(&self) {
        self.enabled.set(true);
    }

    fn acknowledge_all(&self) {
        self.acks.set(self.acks.get() + 1);
    }
}

/// Frontend that records everything and answers prompts from a queue
#[derive(Default)]
pub struct Recorder {
    pub notices: Vec<Notice>,
    pub prompts: Vec<Prompt>,
    pub answers: VecDeque<bool>,
    pub cells: usize,
    pub clears: usize,
    pub acknowledged: usize,
}

impl Recorder {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl Frontend for Recorder {
    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn progress(&mut self, _cell: u8) {
        self.cells += 1;
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn acknowledge(&mut self) {
        self.acknowledged += 1;
    }

    fn confirm(&mut self, prompt: Prompt) -> bool {
        self.prompts.push(prompt);
        self.answers.pop_front().unwrap_or(false)
    }
}

/// One scripted receive step
pub enum Incoming {
    Data(Vec<u8>),
    Status(BlockStatus),
}

/// Transfer channel replaying a script
#[derive(Default)]
pub struct ScriptedChannel {
    pub incoming: VecDeque<Incoming>,
    pub start_status: Option<BlockStatus>,
    pub send_results: VecDeque<BlockStatus>,
    pub finish_status: Option<BlockStatus>,
    pub sent: Vec<Vec<u8>>,
    pub opened: Vec<u32>,
    pub closed: usize,
    pub finished: usize,
    pub acks: usize,
    pub receiving: bool,
}

impl ScriptedChannel {
    /// Receives `image` in 128-byte blocks, then end of transmission
    pub fn sending_image(image: &[u8]) -> Self {
        let mut channel = Self::default();
        for chunk in image.chunks(128) {
            let mut block = chunk.to_vec();
            block.resize(128, 0x1A);
            channel.incoming.push_back(Incoming::Data(block));
        }
        channel.incoming.push_back(Incoming::Status(BlockStatus::Complete));
        channel
    }

    pub fn is_open(&self) -> bool {
        self.opened.len() > self.closed
    }
}

impl TransferChannel for ScriptedChannel {
    fn open(&mut self, baud: u32) {
        self.opened.push(baud);
    }

    fn close(&mut self) {
        self.closed += 1;
    }

    fn send_start(&mut self) -> BlockStatus {
        self.start_status.unwrap_or(BlockStatus::Ok)
    }

    fn send_block(&mut self, block: &Block) -> BlockStatus {
        let status = self.send_results.pop_front().unwrap_or(BlockStatus::Ok);
        if status == BlockStatus::Ok {
            self.sent.push(block.to_vec());
        }
        status
    }

    fn send_finish(&mut self) -> BlockStatus {
        self.finished += 1;
        self.finish_status.unwrap_or(BlockStatus::Complete)
    }

    fn recv_start(&mut self) {
        self.receiving = true;
    }

    fn recv_block(&mut self, block: &mut Block) -> BlockStatus {
        match self.incoming.pop_front() {
            Some(Incoming::Data(data)) => {
                block.copy_from_slice(&data);
                BlockStatus::Ok
            }
            Some(Incoming::Status(status)) => status,
            None => BlockStatus::Error,
        }
    }

    fn recv_ack(&mut self) {
        self.acks += 1;
    }
}

/// Feeds one keypad frame per idle call and advances the vblank counter
pub struct KeyScript<'a> {
    pub latch: &'a InputLatch,
    pub clock: &'a VblankClock,
    pub frames: VecDeque<KeySet>,
    pub idles: usize,
}

impl<'a> KeyScript<'a> {
    pub fn new(latch: &'a InputLatch, clock: &'a VblankClock, frames: &[KeySet]) -> Self {
        Self {
            latch,
            clock,
            frames: frames.iter().copied().collect(),
            idles: 0,
        }
    }
}

impl Idle for KeyScript<'_> {
    fn idle(&mut self) {
        self.idles += 1;
        let keys = self.frames.pop_front().unwrap_or(KeySet::EMPTY);
        self.latch.sample(keys);
        self.clock.tick();
    }
}
