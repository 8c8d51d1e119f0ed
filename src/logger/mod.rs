//! Event journal kept in RAM
//!
//! Entries are timestamped with the vblank tick counter and stored in a
//! fixed ring; once full the oldest entry is overwritten.

use crate::protocol::BlockStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LogType {
    System = 0,
    Eeprom = 1,
    Transfer = 2,
    Error = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Boot,
    InstallStarted { size: u16 },
    InstallFinished { written: u16 },
    VerifyMismatch { offset: u16 },
    SplashToggled { enabled: bool },
    SwanCrystalRecovered { written: u16 },
    LocalBackup,
    TransferOpened { baud: u32 },
    BlockResult { block: u8, status: BlockStatus },
    TransferClosed { bytes: u16 },
    RestoreRejectedSize { received: u16 },
    RestoreRejectedContents,
    RestoreAccepted { size: u16 },
}

impl Event {
    pub fn log_type(&self) -> LogType {
        match self {
            Event::Boot => LogType::System,
            Event::InstallStarted { .. }
            | Event::InstallFinished { .. }
            | Event::SplashToggled { .. }
            | Event::SwanCrystalRecovered { .. }
            | Event::LocalBackup => LogType::Eeprom,
            Event::TransferOpened { .. }
            | Event::TransferClosed { .. }
            | Event::RestoreAccepted { .. } => LogType::Transfer,
            Event::BlockResult { status, .. } => match status {
                BlockStatus::Error => LogType::Error,
                _ => LogType::Transfer,
            },
            Event::VerifyMismatch { .. }
            | Event::RestoreRejectedSize { .. }
            | Event::RestoreRejectedContents => LogType::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: u16,
    pub log_type: LogType,
    pub event: Event,
}

/// Ring of the most recent `N` events
pub struct Logger<const N: usize> {
    clock: fn() -> u16,
    buffer: [Option<LogEntry>; N],
    write_index: usize,
    total: u32,
}

impl<const N: usize> Logger<N> {
    pub const fn new(clock: fn() -> u16) -> Self {
        Self {
            clock,
            buffer: [None; N],
            write_index: 0,
            total: 0,
        }
    }

    pub fn log(&mut self, event: Event) {
        let entry = LogEntry {
            timestamp: (self.clock)(),
            log_type: event.log_type(),
            event,
        };

        #[cfg(feature = "defmt")]
        defmt::info!("[{}] {}", entry.timestamp, entry.event);

        if N == 0 {
            return;
        }
        self.buffer[self.write_index] = Some(entry);
        self.write_index = (self.write_index + 1) % N;
        self.total = self.total.wrapping_add(1);
    }

    /// Number of events ever logged
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        (self.total as usize).min(N)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        let start = if (self.total as usize) < N { 0 } else { self.write_index };
        (0..N).filter_map(move |i| self.buffer[(start + i) % N].as_ref())
    }

    pub fn last(&self) -> Option<&LogEntry> {
        if self.is_empty() {
            return None;
        }
        self.buffer[(self.write_index + N - 1) % N].as_ref()
    }

    /// Whether any retained entry is of `log_type`
    pub fn contains(&self, log_type: LogType) -> bool {
        self.iter().any(|e| e.log_type == log_type)
    }

    pub fn clear(&mut self) {
        self.buffer = [None; N];
        self.write_index = 0;
        self.total = 0;
    }
}

/// Journal size used by the installer
pub type Journal = Logger<32>;
