//! Hardware seams and their ATmega128 implementations.
//!
//! The traits (`Eeprom`, `Interrupts`, `MemoryRegion`) are target independent;
//! everything touching registers sits behind the `atmega128` feature.

pub mod eeprom;
pub mod interrupt;
pub mod region;

#[cfg(all(feature = "atmega128", target_arch = "avr"))]
mod reg;
#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod gpio;
#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod nvm;
#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod power;
#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod timer;
#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod uart;
#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub mod xmem;

pub use eeprom::{Eeprom, RamEeprom};
pub use interrupt::{Interrupts, Suppressed};
pub use region::{FarPtr, MemoryRegion, RamRegion};

#[cfg(all(feature = "atmega128", target_arch = "avr"))]
pub use {
    nvm::AvrEeprom,
    power::{Power, SleepMode},
    timer::{VblankInterrupt, VblankTimer},
    uart::{Usart, Usart0, Usart1},
    xmem::XmemRegion,
};

/// CPU clock the register setups are computed for
pub const CPU_FREQUENCY_HZ: u32 = 16_000_000;
