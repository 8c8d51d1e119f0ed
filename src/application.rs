//! Main menu: wires the console to the installer and the backup paths

use crate::backup::Orchestrator;
use crate::config::SCREEN_ROWS;
use crate::diagnostics::Fault;
use crate::drivers::screen::TextScreen;
use crate::hal::eeprom::Eeprom;
use crate::hal::interrupt::Interrupts;
use crate::hal::region::MemoryRegion;
use crate::logger::Event;
use crate::os::Idle;
use crate::protocol::TransferChannel;
use crate::splash::{is_valid, BootSplashHeader};
use crate::ui::{Console, Frontend, MenuEntry, Prompt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuAction {
    Install,
    ToggleSplash,
    RecoverSwanCrystal,
    BackupTransfer,
    RestoreTransfer,
    RestoreLocal,
}

/// Menu rows in display order; `None` is the spacer
const MENU_ACTIONS: [Option<MenuAction>; 7] = [
    Some(MenuAction::Install),
    Some(MenuAction::ToggleSplash),
    Some(MenuAction::RecoverSwanCrystal),
    None,
    Some(MenuAction::BackupTransfer),
    Some(MenuAction::RestoreTransfer),
    Some(MenuAction::RestoreLocal),
];

const MENU_TOP: u8 = 3 + ((14 - MENU_ACTIONS.len() as u8) >> 1);

pub struct Application<'a, S, P, E, I, C, M>
where
    S: TextScreen,
    P: Idle,
    E: Eeprom,
    I: Interrupts,
    C: TransferChannel,
    M: MemoryRegion,
{
    console: Console<'a, S, P>,
    backup: Orchestrator<'a, E, I, C, M>,
    payload: &'a [u8],
    last_fault: Option<Fault>,
}

impl<'a, S, P, E, I, C, M> Application<'a, S, P, E, I, C, M>
where
    S: TextScreen,
    P: Idle,
    E: Eeprom,
    I: Interrupts,
    C: TransferChannel,
    M: MemoryRegion,
{
    pub fn new(console: Console<'a, S, P>, backup: Orchestrator<'a, E, I, C, M>, payload: &'a [u8]) -> Self {
        Self {
            console,
            backup,
            payload,
            last_fault: None,
        }
    }

    pub fn console(&mut self) -> &mut Console<'a, S, P> {
        &mut self.console
    }

    pub fn backup(&mut self) -> &mut Orchestrator<'a, E, I, C, M> {
        &mut self.backup
    }

    /// Fault left by the most recent action, if any
    pub fn last_fault(&self) -> Option<Fault> {
        self.last_fault
    }

    pub fn start(&mut self) {
        self.backup.installer().journal_mut().log(Event::Boot);
        self.console.clear_lines(0, SCREEN_ROWS - 1);
        self.redraw_status();
    }

    pub fn redraw_status(&mut self) {
        let line = self.backup.installer().status_line();
        self.console.draw_status_bar(&line);
    }

    /// Entries for the current store state; disabled rows cannot be selected
    pub fn menu_entries(&mut self) -> [MenuEntry<'static>; 7] {
        let provided = BootSplashHeader::from_bytes(self.payload);
        let provided_ours = provided.is_ours();
        let provided_valid = is_valid(&provided);
        let mirror_valid = self.backup.mirror_valid();
        let installer = self.backup.installer();
        let locked = installer.is_locked();
        let status = installer.status();
        let active = status.splash_active();
        let ours = status.splash_ours();
        let valid = status.splash_valid();

        let install = if provided_ours { "Install BootFriend" } else { "Install splash" };
        let toggle = match (active, ours) {
            (true, true) => "Disable BootFriend",
            (true, false) => "Disable custom splash",
            (false, true) => "Enable BootFriend",
            (false, false) => "Enable custom splash",
        };

        [
            MenuEntry::new(install, !locked && provided_valid),
            MenuEntry::new(toggle, !locked && (active || valid)),
            MenuEntry::new("SwanCrystal TFT recovery", !locked),
            MenuEntry::new("", false),
            MenuEntry::new("Backup IEEPROM (XMODEM)", true),
            MenuEntry::new("Restore IEEPROM (XMODEM)", true),
            MenuEntry::new("Restore IEEPROM (SRAM)", mirror_valid),
        ]
    }

    /// Shows the menu once and carries out the selection
    pub fn run_once(&mut self) -> Option<MenuAction> {
        self.console.wait_until_idle();
        let entries = self.menu_entries();
        let action = self
            .console
            .run_menu(&entries, MENU_TOP)
            .and_then(|index| MENU_ACTIONS.get(index).copied().flatten())?;
        self.perform(action);
        Some(action)
    }

    pub fn perform(&mut self, action: MenuAction) {
        let console = &mut self.console;
        let backup = &mut self.backup;
        self.last_fault = None;

        let outcome = match action {
            MenuAction::Install => {
                if console.confirm(Prompt::Install) {
                    console.wait_until_idle();
                    backup.backup_before_install(console);
                    backup.installer().install(console, self.payload).map(drop)
                } else {
                    Ok(())
                }
            }
            MenuAction::ToggleSplash => {
                if console.confirm(Prompt::AreYouSure) {
                    backup.installer().toggle_splash();
                }
                Ok(())
            }
            MenuAction::RecoverSwanCrystal => {
                if console.confirm(Prompt::SwanCrystalRecovery) {
                    backup.installer().recover_swancrystal();
                }
                Ok(())
            }
            MenuAction::BackupTransfer => backup.backup_transfer(console),
            MenuAction::RestoreTransfer => {
                if console.confirm(Prompt::AreYouSure) {
                    backup.restore_transfer(console).map(drop)
                } else {
                    Ok(())
                }
            }
            MenuAction::RestoreLocal => {
                if console.confirm(Prompt::AreYouSure) {
                    backup.restore_local(console).map(drop)
                } else {
                    Ok(())
                }
            }
        };

        if let Err(fault) = outcome {
            #[cfg(feature = "defmt")]
            defmt::warn!("{} failed: {}", action, fault);
            self.last_fault = Some(fault);
        }
        self.redraw_status();
    }

    pub fn run(&mut self) -> ! {
        self.start();
        loop {
            self.run_once();
        }
    }
}
