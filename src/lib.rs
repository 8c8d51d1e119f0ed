//! Boot-splash installer core.
//!
//! Installs and verifies a boot-splash payload in the console's internal
//! configuration EEPROM, and backs the store up to (or restores it from) a
//! cartridge SRAM mirror or an XMODEM serial link.

#![cfg_attr(not(test), no_std)]

pub mod application;
pub mod backup;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod hal;
pub mod installer;
pub mod logger;
pub mod os;
pub mod protocol;
pub mod splash;
pub mod ui;

pub use application::{Application, MenuAction};
pub use backup::Orchestrator;
pub use diagnostics::{Fault, Result};
pub use installer::{InstallReport, Installer};
