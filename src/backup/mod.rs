//! Backup and restore of the configuration store
//!
//! Two backup paths (the cartridge SRAM mirror and an XMODEM upload) and two
//! restore paths (XMODEM download and the SRAM mirror). Every restore ends in
//! [`Installer::install`], so the store is never written outside of it.

use crate::config::{
    TransferConfig, IEEP_SIZE, PAYLOAD_MAX_SIZE, SPLASH_HEADER_OFFSET, TRANSFER_BLOCK_COUNT,
    TRANSFER_BLOCK_SIZE, TRANSFER_BUFFER_SIZE,
};
use crate::diagnostics::{self, Fault, Result};
use crate::hal::eeprom::Eeprom;
use crate::hal::interrupt::{Interrupts, Suppressed};
use crate::hal::region::MemoryRegion;
use crate::installer::{InstallReport, Installer};
use crate::logger::Event;
use crate::protocol::{Block, BlockStatus, TransferChannel};
use crate::splash::{is_valid_bytes, HEADER_SIZE};
use crate::ui::{Frontend, Notice, Prompt};

/// Whole-store image exchanged over the serial link
pub struct TransferBuffer {
    blocks: [Block; TRANSFER_BLOCK_COUNT],
    position: usize,
}

impl TransferBuffer {
    pub const fn new() -> Self {
        Self {
            blocks: [[0; TRANSFER_BLOCK_SIZE]; TRANSFER_BLOCK_COUNT],
            position: 0,
        }
    }

    pub fn clear(&mut self) {
        self.blocks = [[0; TRANSFER_BLOCK_SIZE]; TRANSFER_BLOCK_COUNT];
        self.position = 0;
    }

    /// Bytes received so far
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.blocks.as_flattened()
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        self.blocks.as_flattened_mut()
    }
}

impl Default for TransferBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Picks the installable window `(start, size)` of a received image.
///
/// A full-store image carries the bytes below the header and is installed
/// from the header on; anything else must already start with the header.
pub fn restore_window(received: usize) -> Result<(usize, usize)> {
    let payload_max = PAYLOAD_MAX_SIZE as usize;
    if received == TRANSFER_BUFFER_SIZE {
        Ok((SPLASH_HEADER_OFFSET as usize, payload_max))
    } else if received > payload_max {
        Err(Fault::InvalidSize { received: received as u16 })
    } else {
        Ok((0, received))
    }
}

pub struct Orchestrator<'a, E, I, C, M>
where
    E: Eeprom,
    I: Interrupts,
    C: TransferChannel,
    M: MemoryRegion,
{
    installer: Installer<'a, E, I>,
    channel: C,
    mirror: M,
    buffer: TransferBuffer,
    config: TransferConfig,
}

impl<'a, E, I, C, M> Orchestrator<'a, E, I, C, M>
where
    E: Eeprom,
    I: Interrupts,
    C: TransferChannel,
    M: MemoryRegion,
{
    pub fn new(installer: Installer<'a, E, I>, channel: C, mirror: M, config: TransferConfig) -> Self {
        Self {
            installer,
            channel,
            mirror,
            buffer: TransferBuffer::new(),
            config,
        }
    }

    pub fn installer(&mut self) -> &mut Installer<'a, E, I> {
        &mut self.installer
    }

    pub fn channel(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    pub fn mirror_mut(&mut self) -> &mut M {
        &mut self.mirror
    }

    pub fn buffer(&self) -> &TransferBuffer {
        &self.buffer
    }

    /// Whether the SRAM mirror holds a plausible header
    pub fn mirror_valid(&self) -> bool {
        let mut raw = [0u8; HEADER_SIZE];
        self.mirror.read_bytes(SPLASH_HEADER_OFFSET as usize, &mut raw);
        is_valid_bytes(&raw)
    }

    /// Copies the whole store into the SRAM mirror
    pub fn backup_local<U: Frontend + ?Sized>(&mut self, ui: &mut U) {
        ui.notice(Notice::BackingUp);
        let eeprom = self.installer.eeprom();
        for addr in (0..IEEP_SIZE).step_by(2) {
            self.mirror.write_word(addr as usize, eeprom.read_word(addr));
        }
        self.installer.journal_mut().log(Event::LocalBackup);
        ui.clear();
    }

    /// Offers a local backup when the mirror does not already hold one.
    /// Returns whether a backup was taken.
    pub fn backup_before_install<U: Frontend + ?Sized>(&mut self, ui: &mut U) -> bool {
        if self.mirror_valid() || !ui.confirm(Prompt::BackupFirst) {
            return false;
        }
        self.backup_local(ui);
        true
    }

    /// Reinstalls the payload held in the SRAM mirror
    pub fn restore_local<U: Frontend + ?Sized>(&mut self, ui: &mut U) -> Result<InstallReport> {
        if !self.mirror_valid() {
            return Err(diagnostics::report(Fault::InvalidHeader));
        }
        let size = PAYLOAD_MAX_SIZE as usize;
        self.buffer.clear();
        self.mirror
            .read_bytes(SPLASH_HEADER_OFFSET as usize, &mut self.buffer.as_bytes_mut()[..size]);
        self.installer.install(ui, &self.buffer.as_bytes()[..size])
    }

    /// Uploads the whole store over the transfer channel
    pub fn backup_transfer<U: Frontend + ?Sized>(&mut self, ui: &mut U) -> Result<()> {
        ui.clear();
        self.buffer.clear();
        self.installer.eeprom().read_block(0, self.buffer.as_bytes_mut());

        ui.notice(Notice::TransferInit);
        self.open();
        let result = self.send_all(ui);
        self.close(if result.is_ok() { TRANSFER_BUFFER_SIZE } else { 0 });
        ui.clear();
        result
    }

    fn send_all<U: Frontend + ?Sized>(&mut self, ui: &mut U) -> Result<()> {
        let status = self.channel.send_start();
        if status != BlockStatus::Ok {
            return self.abandon(ui, status, None);
        }

        let irq = self.installer.interrupts();
        let guard = irq.suppress();
        ui.notice(Notice::Transferring);
        for index in 0..TRANSFER_BLOCK_COUNT {
            let status = self.channel.send_block(&self.buffer.blocks[index]);
            self.installer.journal_mut().log(Event::BlockResult { block: index as u8, status });
            match status {
                BlockStatus::Ok | BlockStatus::Complete => {}
                status => return self.abandon(ui, status, Some(guard)),
            }
        }
        match self.channel.send_finish() {
            BlockStatus::Ok | BlockStatus::Complete => Ok(()),
            status => self.abandon(ui, status, Some(guard)),
        }
    }

    /// Downloads an image, checks its size and header and installs it
    pub fn restore_transfer<U: Frontend + ?Sized>(&mut self, ui: &mut U) -> Result<InstallReport> {
        ui.clear();
        self.buffer.clear();
        self.open();
        let received = self.receive_all(ui);
        self.close(self.buffer.position);
        ui.clear();
        let received = received?;

        let (start, size) = match restore_window(received) {
            Ok(window) => window,
            Err(fault) => {
                ui.notice(Notice::InvalidSize { received: received as u16 });
                self.installer
                    .journal_mut()
                    .log(Event::RestoreRejectedSize { received: received as u16 });
                ui.acknowledge();
                return Err(diagnostics::report(fault));
            }
        };

        let image = &self.buffer.as_bytes()[start..start + size];
        if !is_valid_bytes(image) {
            ui.notice(Notice::InvalidContents);
            self.installer.journal_mut().log(Event::RestoreRejectedContents);
            ui.acknowledge();
            return Err(diagnostics::report(Fault::InvalidContents));
        }

        self.installer
            .journal_mut()
            .log(Event::RestoreAccepted { size: size as u16 });
        self.installer.install(ui, image)
    }

    fn receive_all<U: Frontend + ?Sized>(&mut self, ui: &mut U) -> Result<usize> {
        let irq = self.installer.interrupts();
        let guard = irq.suppress();
        ui.notice(Notice::Transferring);
        self.channel.recv_start();

        for index in 0..TRANSFER_BLOCK_COUNT {
            let status = self.channel.recv_block(&mut self.buffer.blocks[index]);
            self.channel.recv_ack();
            self.installer.journal_mut().log(Event::BlockResult { block: index as u8, status });
            match status {
                BlockStatus::Ok => self.buffer.position += TRANSFER_BLOCK_SIZE,
                BlockStatus::Complete => return Ok(self.buffer.position),
                status => {
                    self.buffer.position = 0;
                    return self.abandon(ui, status, Some(guard)).map(|_| 0);
                }
            }
        }

        // full image; take the sender's end of transmission
        let mut scratch = [0u8; TRANSFER_BLOCK_SIZE];
        if self.channel.recv_block(&mut scratch) == BlockStatus::Complete {
            self.channel.recv_ack();
        }
        Ok(self.buffer.position)
    }

    /// Ends a transfer that did not complete. Errors are shown and
    /// acknowledged with the interrupt re-armed; cancellation is silent.
    fn abandon<U: Frontend + ?Sized>(
        &mut self,
        ui: &mut U,
        status: BlockStatus,
        guard: Option<Suppressed<'a, I>>,
    ) -> Result<()> {
        drop(guard);
        match status {
            BlockStatus::Cancel | BlockStatus::SelfCancel => {
                Err(diagnostics::report(Fault::TransferCancelled))
            }
            _ => {
                ui.notice(Notice::TransferError);
                ui.acknowledge();
                Err(diagnostics::report(Fault::TransferError))
            }
        }
    }

    fn open(&mut self) {
        self.channel.open(self.config.baud);
        self.installer
            .journal_mut()
            .log(Event::TransferOpened { baud: self.config.baud });
    }

    fn close(&mut self, bytes: usize) {
        self.channel.close();
        self.installer
            .journal_mut()
            .log(Event::TransferClosed { bytes: bytes as u16 });
    }
}
