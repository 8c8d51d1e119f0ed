//! Block-transfer channel used for IEEPROM backup and restore

pub mod crc;
pub mod xmodem;

pub use xmodem::{SerialPort, XmodemChannel};

use crate::config::TRANSFER_BLOCK_SIZE;

/// One transfer block
pub type Block = [u8; TRANSFER_BLOCK_SIZE];

/// Outcome of a single block exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlockStatus {
    Ok,
    Error,
    /// Sender signalled end of transmission
    Complete,
    /// Remote side cancelled
    Cancel,
    /// Local side cancelled
    SelfCancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolError {
    Timeout,
    InvalidPacket,
    InvalidChecksum,
    OutOfSequence,
    TransportError,
}

pub type Result<T> = core::result::Result<T, ProtocolError>;

/// Serial file-transfer primitives consumed by the backup code.
///
/// Framing, checksums and retries live behind this trait.
pub trait TransferChannel {
    fn open(&mut self, baud: u32);
    fn close(&mut self);

    fn send_start(&mut self) -> BlockStatus;
    fn send_block(&mut self, block: &Block) -> BlockStatus;
    fn send_finish(&mut self) -> BlockStatus;

    fn recv_start(&mut self);
    fn recv_block(&mut self, block: &mut Block) -> BlockStatus;
    /// Acknowledges the block last returned by `recv_block`
    fn recv_ack(&mut self);
}

impl<T: TransferChannel + ?Sized> TransferChannel for &mut T {
    fn open(&mut self, baud: u32) {
        (**self).open(baud)
    }
    fn close(&mut self) {
        (**self).close()
    }
    fn send_start(&mut self) -> BlockStatus {
        (**self).send_start()
    }
    fn send_block(&mut self, block: &Block) -> BlockStatus {
        (**self).send_block(block)
    }
    fn send_finish(&mut self) -> BlockStatus {
        (**self).send_finish()
    }
    fn recv_start(&mut self) {
        (**self).recv_start()
    }
    fn recv_block(&mut self, block: &mut Block) -> BlockStatus {
        (**self).recv_block(block)
    }
    fn recv_ack(&mut self) {
        (**self).recv_ack()
    }
}
