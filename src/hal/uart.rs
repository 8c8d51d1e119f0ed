//! Polled USART driver implementing the embedded-hal serial traits

use core::marker::PhantomData;

use embedded_hal::serial;

use super::reg::Reg;
use super::CPU_FREQUENCY_HZ;
use crate::protocol::SerialPort;

const RXC: u8 = 1 << 7;
const UDRE: u8 = 1 << 5;
const FE: u8 = 1 << 4;
const DOR: u8 = 1 << 3;
const UPE: u8 = 1 << 2;
const TXC: u8 = 1 << 6;

const RXEN: u8 = 1 << 4;
const TXEN: u8 = 1 << 3;
const FRAME_8N1: u8 = 0b0000_0110;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartError {
    Framing,
    Overrun,
    Parity,
}

/// Register addresses of one USART
pub trait UsartRegisters {
    const UDR: Reg;
    const UCSRA: Reg;
    const UCSRB: Reg;
    const UCSRC: Reg;
    const UBRRL: Reg;
    const UBRRH: Reg;
}

pub enum Port0 {}
pub enum Port1 {}

impl UsartRegisters for Port0 {
    const UDR: Reg = Reg::at(0x2C);
    const UCSRA: Reg = Reg::at(0x2B);
    const UCSRB: Reg = Reg::at(0x2A);
    const UCSRC: Reg = Reg::at(0x95);
    const UBRRL: Reg = Reg::at(0x29);
    const UBRRH: Reg = Reg::at(0x90);
}

impl UsartRegisters for Port1 {
    const UDR: Reg = Reg::at(0x9C);
    const UCSRA: Reg = Reg::at(0x9B);
    const UCSRB: Reg = Reg::at(0x9A);
    const UCSRC: Reg = Reg::at(0x9D);
    const UBRRL: Reg = Reg::at(0x99);
    const UBRRH: Reg = Reg::at(0x98);
}

pub struct Usart<P: UsartRegisters> {
    _port: PhantomData<P>,
}

/// XMODEM link
pub type Usart0 = Usart<Port0>;
/// Terminal the menu is drawn on
pub type Usart1 = Usart<Port1>;

impl<P: UsartRegisters> Usart<P> {
    pub fn new() -> Self {
        Self { _port: PhantomData }
    }

    pub fn set_baud(&mut self, baud: u32) {
        let ubrr = (CPU_FREQUENCY_HZ / (16 * baud)).saturating_sub(1) as u16;
        let [lo, hi] = ubrr.to_le_bytes();
        P::UBRRH.write(hi & 0x0F);
        P::UBRRL.write(lo);
        P::UCSRC.write(FRAME_8N1);
        P::UCSRB.write(RXEN | TXEN);
    }

    pub fn disable(&mut self) {
        P::UCSRB.write(0);
    }
}

impl<P: UsartRegisters> Default for Usart<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: UsartRegisters> serial::Read<u8> for Usart<P> {
    type Error = UsartError;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let status = P::UCSRA.read();
        if status & RXC == 0 {
            return Err(nb::Error::WouldBlock);
        }
        // UDR must be read even on error to clear RXC
        let byte = P::UDR.read();
        if status & FE != 0 {
            Err(nb::Error::Other(UsartError::Framing))
        } else if status & DOR != 0 {
            Err(nb::Error::Other(UsartError::Overrun))
        } else if status & UPE != 0 {
            Err(nb::Error::Other(UsartError::Parity))
        } else {
            Ok(byte)
        }
    }
}

impl<P: UsartRegisters> serial::Write<u8> for Usart<P> {
    type Error = UsartError;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        if P::UCSRA.read() & UDRE == 0 {
            return Err(nb::Error::WouldBlock);
        }
        // clear TXC so flush can wait on it
        P::UCSRA.set_bits(TXC);
        P::UDR.write(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        let status = P::UCSRA.read();
        if status & UDRE == 0 || (P::UCSRB.read() & TXEN != 0 && status & TXC == 0) {
            return Err(nb::Error::WouldBlock);
        }
        Ok(())
    }
}

impl<P: UsartRegisters> SerialPort for Usart<P> {
    fn configure(&mut self, baud: u32) {
        self.set_baud(baud);
    }

    fn shutdown(&mut self) {
        nb::block!(serial::Write::flush(self)).ok();
        self.disable();
    }
}
