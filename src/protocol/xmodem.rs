//! XMODEM-CRC over an embedded-hal serial port
//!
//! 128-byte blocks, CRC-16 with fallback to the additive checksum when the
//! peer answers the CRC request with a plain NAK.

use embedded_hal::serial;
use nb::block;

use super::crc::{checksum8, crc16_xmodem};
use super::{Block, BlockStatus, ProtocolError, Result, TransferChannel};
use crate::config::TransferConfig;

const SOH: u8 = 0x01;
const EOT: u8 = 0x04;
const ACK: u8 = 0x06;
const NAK: u8 = 0x15;
const CAN: u8 = 0x18;
const CRC_REQUEST: u8 = b'C';

/// Byte-oriented port the channel runs on.
///
/// Baud and power handling default to no-ops so any embedded-hal serial
/// device can be used as is.
pub trait SerialPort: serial::Read<u8> + serial::Write<u8> {
    fn configure(&mut self, _baud: u32) {}
    fn shutdown(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    Sending,
    Receiving,
}

fn never() -> bool {
    false
}

pub struct XmodemChannel<S> {
    serial: S,
    config: TransferConfig,
    abort: fn() -> bool,
    state: State,
    crc_mode: bool,
    sequence: u8,
    started: bool,
    ack_pending: bool,
}

impl<S: SerialPort> XmodemChannel<S> {
    pub fn new(serial: S, config: TransferConfig) -> Self {
        Self {
            serial,
            config,
            abort: never,
            state: State::Closed,
            crc_mode: true,
            sequence: 1,
            started: false,
            ack_pending: false,
        }
    }

    /// Polled between frames; returning true cancels the transfer locally
    pub fn with_abort(mut self, abort: fn() -> bool) -> Self {
        self.abort = abort;
        self
    }

    pub fn is_open(&self) -> bool {
        self.state != State::Closed
    }

    pub fn crc_mode(&self) -> bool {
        self.crc_mode
    }

    pub fn into_inner(self) -> S {
        self.serial
    }

    fn reset(&mut self) {
        self.crc_mode = true;
        self.sequence = 1;
        self.started = false;
        self.ack_pending = false;
    }

    fn read_byte(&mut self) -> Result<u8> {
        for _ in 0..self.config.poll_timeout {
            match self.serial.read() {
                Ok(byte) => return Ok(byte),
                Err(nb::Error::WouldBlock) => continue,
                Err(nb::Error::Other(_)) => return Err(ProtocolError::TransportError),
            }
        }
        Err(ProtocolError::Timeout)
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        block!(self.serial.write(byte)).map_err(|_| ProtocolError::TransportError)
    }

    fn write_frame(&mut self, block: &Block) -> Result<()> {
        self.write_byte(SOH)?;
        self.write_byte(self.sequence)?;
        self.write_byte(!self.sequence)?;
        for &byte in block.iter() {
            self.write_byte(byte)?;
        }
        if self.crc_mode {
            let [hi, lo] = crc16_xmodem(block).to_be_bytes();
            self.write_byte(hi)?;
            self.write_byte(lo)
        } else {
            self.write_byte(checksum8(block))
        }
    }

    /// Reads the rest of a frame after SOH; returns its sequence number
    fn read_frame(&mut self, block: &mut Block) -> Result<u8> {
        let sequence = self.read_byte()?;
        let inverse = self.read_byte()?;
        for byte in block.iter_mut() {
            *byte = self.read_byte()?;
        }
        let intact = if self.crc_mode {
            let hi = self.read_byte()?;
            let lo = self.read_byte()?;
            crc16_xmodem(block) == u16::from_be_bytes([hi, lo])
        } else {
            checksum8(block) == self.read_byte()?
        };

        if sequence != !inverse {
            return Err(ProtocolError::InvalidPacket);
        }
        if !intact {
            return Err(ProtocolError::InvalidChecksum);
        }
        Ok(sequence)
    }

    fn cancel(&mut self) {
        self.write_byte(CAN).ok();
        self.write_byte(CAN).ok();
    }

    /// Asks the sender for (another) first block, dropping to checksum mode
    /// halfway through the retries
    fn request_start(&mut self, attempts: u8) -> Result<()> {
        if self.crc_mode && attempts >= self.config.retries / 2 {
            self.crc_mode = false;
        }
        self.write_byte(if self.crc_mode { CRC_REQUEST } else { NAK })
    }
}

impl<S: SerialPort> TransferChannel for XmodemChannel<S> {
    fn open(&mut self, baud: u32) {
        self.serial.configure(baud);
        self.reset();
        self.state = State::Open;
    }

    fn close(&mut self) {
        if self.state == State::Closed {
            return;
        }
        block!(self.serial.flush()).ok();
        self.serial.shutdown();
        self.state = State::Closed;
    }

    fn send_start(&mut self) -> BlockStatus {
        self.reset();
        self.state = State::Sending;
        let mut attempts = 0;
        while attempts < self.config.retries {
            if (self.abort)() {
                self.cancel();
                return BlockStatus::SelfCancel;
            }
            match self.read_byte() {
                Ok(CRC_REQUEST) => {
                    self.crc_mode = true;
                    return BlockStatus::Ok;
                }
                Ok(NAK) => {
                    self.crc_mode = false;
                    return BlockStatus::Ok;
                }
                Ok(CAN) => return BlockStatus::Cancel,
                Ok(_) | Err(ProtocolError::Timeout) => attempts += 1,
                Err(_) => return BlockStatus::Error,
            }
        }
        BlockStatus::Error
    }

    fn send_block(&mut self, block: &Block) -> BlockStatus {
        for _ in 0..self.config.retries {
            if (self.abort)() {
                self.cancel();
                return BlockStatus::SelfCancel;
            }
            if self.write_frame(block).is_err() {
                return BlockStatus::Error;
            }
            match self.read_byte() {
                Ok(ACK) => {
                    self.sequence = self.sequence.wrapping_add(1);
                    return BlockStatus::Ok;
                }
                Ok(CAN) => return BlockStatus::Cancel,
                Ok(_) | Err(ProtocolError::Timeout) => continue,
                Err(_) => return BlockStatus::Error,
            }
        }
        self.cancel();
        BlockStatus::Error
    }

    fn send_finish(&mut self) -> BlockStatus {
        for _ in 0..self.config.retries {
            if self.write_byte(EOT).is_err() {
                return BlockStatus::Error;
            }
            if let Ok(ACK) = self.read_byte() {
                self.state = State::Open;
                return BlockStatus::Complete;
            }
        }
        BlockStatus::Error
    }

    fn recv_start(&mut self) {
        self.reset();
        self.state = State::Receiving;
        self.request_start(0).ok();
    }

    fn recv_block(&mut self, block: &mut Block) -> BlockStatus {
        self.ack_pending = false;
        let mut attempts = 0;
        while attempts < self.config.retries {
            if (self.abort)() {
                self.cancel();
                return BlockStatus::SelfCancel;
            }
            match self.read_byte() {
                Ok(SOH) => match self.read_frame(block) {
                    Ok(sequence) if sequence == self.sequence => {
                        self.sequence = self.sequence.wrapping_add(1);
                        self.started = true;
                        self.ack_pending = true;
                        return BlockStatus::Ok;
                    }
                    Ok(sequence) if self.started && sequence == self.sequence.wrapping_sub(1) => {
                        // sender missed our ACK
                        attempts += 1;
                        self.write_byte(ACK).ok();
                    }
                    Ok(_) => {
                        self.cancel();
                        return BlockStatus::Error;
                    }
                    Err(ProtocolError::TransportError) => return BlockStatus::Error,
                    Err(_) => {
                        attempts += 1;
                        self.write_byte(NAK).ok();
                    }
                },
                Ok(EOT) => {
                    self.ack_pending = true;
                    return BlockStatus::Complete;
                }
                Ok(CAN) => return BlockStatus::Cancel,
                Ok(_) => attempts += 1,
                Err(ProtocolError::Timeout) => {
                    attempts += 1;
                    if self.started {
                        self.write_byte(NAK).ok();
                    } else {
                        self.request_start(attempts).ok();
                    }
                }
                Err(_) => return BlockStatus::Error,
            }
        }
        self.cancel();
        BlockStatus::Error
    }

    fn recv_ack(&mut self) {
        if core::mem::take(&mut self.ack_pending) {
            self.write_byte(ACK).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::serial::{Mock, Transaction};

    impl SerialPort for Mock<u8> {}

    fn config() -> TransferConfig {
        TransferConfig { retries: 4, poll_timeout: 1, ..TransferConfig::default() }
    }

    fn block_of(fill: u8) -> Block {
        [fill; 128]
    }

    fn frame(sequence: u8, block: &Block) -> Vec<u8> {
        let mut out = vec![SOH, sequence, !sequence];
        out.extend_from_slice(block);
        out.extend_from_slice(&crc16_xmodem(block).to_be_bytes());
        out
    }

    #[test]
    fn sends_a_crc_block_and_finishes() {
        let data = block_of(0x5A);
        let expectations = [
            Transaction::read(CRC_REQUEST),
            Transaction::write_many(frame(1, &data)),
            Transaction::read(ACK),
            Transaction::write(EOT),
            Transaction::read(ACK),
            Transaction::flush(),
        ];
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        channel.open(38400);
        assert_eq!(channel.send_start(), BlockStatus::Ok);
        assert!(channel.crc_mode());
        assert_eq!(channel.send_block(&data), BlockStatus::Ok);
        assert_eq!(channel.send_finish(), BlockStatus::Complete);
        channel.close();
        assert!(!channel.is_open());
        serial.done();
    }

    #[test]
    fn resends_after_nak_and_falls_back_to_checksum() {
        let data = block_of(0x01);
        let mut checksummed = vec![SOH, 1, 0xFE];
        checksummed.extend_from_slice(&data);
        checksummed.push(checksum8(&data));

        let expectations = [
            Transaction::read(NAK),
            Transaction::write_many(checksummed.clone()),
            Transaction::read(NAK),
            Transaction::write_many(checksummed),
            Transaction::read(ACK),
        ];
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        channel.open(38400);
        assert_eq!(channel.send_start(), BlockStatus::Ok);
        assert!(!channel.crc_mode());
        assert_eq!(channel.send_block(&data), BlockStatus::Ok);
        serial.done();
    }

    #[test]
    fn peer_cancel_stops_sending() {
        let data = block_of(0);
        let expectations = [
            Transaction::read(CRC_REQUEST),
            Transaction::write_many(frame(1, &data)),
            Transaction::read(CAN),
        ];
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        channel.open(38400);
        assert_eq!(channel.send_start(), BlockStatus::Ok);
        assert_eq!(channel.send_block(&data), BlockStatus::Cancel);
        serial.done();
    }

    #[test]
    fn local_abort_sends_cancel() {
        fn pressed() -> bool {
            true
        }
        let expectations = [Transaction::write_many([CAN, CAN])];
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config()).with_abort(pressed);

        channel.open(38400);
        assert_eq!(channel.send_start(), BlockStatus::SelfCancel);
        serial.done();
    }

    #[test]
    fn receives_blocks_until_eot() {
        let first = block_of(0x11);
        let second = block_of(0x22);
        let mut expectations = vec![Transaction::write(CRC_REQUEST)];
        expectations.push(Transaction::read_many(frame(1, &first)));
        expectations.push(Transaction::write(ACK));
        expectations.push(Transaction::read_many(frame(2, &second)));
        expectations.push(Transaction::write(ACK));
        expectations.push(Transaction::read(EOT));
        expectations.push(Transaction::write(ACK));
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        let mut buffer = [0u8; 256];
        channel.open(38400);
        channel.recv_start();

        let (a, b) = buffer.split_at_mut(128);
        let a: &mut Block = a.try_into().unwrap();
        let b: &mut Block = b.try_into().unwrap();
        assert_eq!(channel.recv_block(a), BlockStatus::Ok);
        channel.recv_ack();
        assert_eq!(channel.recv_block(b), BlockStatus::Ok);
        channel.recv_ack();
        let mut scratch = block_of(0);
        assert_eq!(channel.recv_block(&mut scratch), BlockStatus::Complete);
        channel.recv_ack();

        assert!(buffer[..128].iter().all(|&b| b == 0x11));
        assert!(buffer[128..].iter().all(|&b| b == 0x22));
        serial.done();
    }

    #[test]
    fn corrupted_block_is_naked_and_duplicate_is_acked() {
        let data = block_of(0x33);
        let mut corrupted = frame(1, &data);
        corrupted[10] ^= 0xFF;

        let expectations = [
            Transaction::write(CRC_REQUEST),
            Transaction::read_many(corrupted),
            Transaction::write(NAK),
            Transaction::read_many(frame(1, &data)),
            Transaction::write(ACK),
            Transaction::read_many(frame(1, &data)),
            Transaction::write(ACK),
            Transaction::read(EOT),
        ];
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        let mut block = block_of(0);
        channel.open(38400);
        channel.recv_start();
        assert_eq!(channel.recv_block(&mut block), BlockStatus::Ok);
        channel.recv_ack();
        assert_eq!(channel.recv_block(&mut block), BlockStatus::Complete);
        serial.done();
    }

    #[test]
    fn endless_duplicates_exhaust_the_retries() {
        let data = block_of(0x55);
        let mut expectations = vec![
            Transaction::write(CRC_REQUEST),
            Transaction::read_many(frame(1, &data)),
            Transaction::write(ACK),
        ];
        for _ in 0..config().retries {
            expectations.push(Transaction::read_many(frame(1, &data)));
            expectations.push(Transaction::write(ACK));
        }
        expectations.push(Transaction::write_many([CAN, CAN]));
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        let mut block = block_of(0);
        channel.open(38400);
        channel.recv_start();
        assert_eq!(channel.recv_block(&mut block), BlockStatus::Ok);
        channel.recv_ack();
        assert_eq!(channel.recv_block(&mut block), BlockStatus::Error);
        serial.done();
    }

    #[test]
    fn out_of_sequence_block_is_an_error() {
        let data = block_of(0x44);
        let expectations = [
            Transaction::write(CRC_REQUEST),
            Transaction::read_many(frame(5, &data)),
            Transaction::write_many([CAN, CAN]),
        ];
        let mut serial = Mock::new(&expectations);
        let mut channel = XmodemChannel::new(serial.clone(), config());

        let mut block = block_of(0);
        channel.open(38400);
        channel.recv_start();
        assert_eq!(channel.recv_block(&mut block), BlockStatus::Error);
        // nothing to acknowledge after an error
        channel.recv_ack();
        serial.done();
    }
}
