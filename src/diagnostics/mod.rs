//! Fault taxonomy for install, backup and restore
//!
//! Nothing here is fatal: every fault leaves the store bootable and hands
//! control back to the menu.

use core::cell::Cell;
use critical_section::Mutex;

static FAULTS: FaultCounter = FaultCounter::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// Header failed the plausibility check; nothing was written
    InvalidHeader,
    /// Read-back differed at this header-relative offset; splash left disabled
    VerifyMismatch { offset: u16 },
    /// Block transfer failed; channel closed, store untouched
    TransferError,
    /// Operator or peer cancelled the transfer
    TransferCancelled,
    /// Restore received a length that is neither a payload nor a full image
    InvalidSize { received: u16 },
    /// Restored image carried an implausible header
    InvalidContents,
}

impl Fault {
    /// Cancellation is reported as a fault value but is not an error
    pub fn is_error(&self) -> bool {
        !matches!(self, Fault::TransferCancelled)
    }
}

pub type Result<T> = core::result::Result<T, Fault>;

/// Running count of error faults; cancellations are not counted
pub struct FaultCounter {
    count: Mutex<Cell<u32>>,
}

impl FaultCounter {
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Counts `fault` if it is an error; returns it unchanged
    pub fn record(&self, fault: Fault) -> Fault {
        if fault.is_error() {
            critical_section::with(|cs| {
                let count = self.count.borrow(cs);
                count.set(count.get().wrapping_add(1));
            });
        }
        fault
    }

    pub fn count(&self) -> u32 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }
}

impl Default for FaultCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Records a fault; returns it for `?`-style propagation
pub fn report(fault: Fault) -> Fault {
    FAULTS.record(fault)
}

/// Faults reported since boot
pub fn fault_count() -> u32 {
    FAULTS.count()
}
