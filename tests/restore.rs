mod common;

use common::{full_payload, payload, FaultyEeprom, Incoming, Irq, Recorder, ScriptedChannel};
use splash_installer::config::{TransferConfig, TRANSFER_BAUD};
use splash_installer::hal::{FarPtr, RamEeprom, RamRegion};
use splash_installer::logger::{Event, Journal};
use splash_installer::protocol::BlockStatus;
use splash_installer::splash::offset;
use splash_installer::ui::{Notice, Prompt};
use splash_installer::{Fault, Installer, Orchestrator};

type Mirror = RamRegion<2048>;

fn now() -> u16 {
    0
}

fn mirror() -> Mirror {
    RamRegion::new(FarPtr::new(0x1000, 0))
}

fn orchestrator<'a>(
    eeprom: &'a mut FaultyEeprom,
    irq: &'a Irq,
    channel: &'a mut ScriptedChannel,
) -> Orchestrator<'a, &'a mut FaultyEeprom, Irq, &'a mut ScriptedChannel, Mirror> {
    let installer = Installer::new(eeprom, irq, Journal::new(now));
    Orchestrator::new(installer, channel, mirror(), TransferConfig::default())
}

/// Whole-store image: an arbitrary prefix followed by a payload
fn store_image() -> Vec<u8> {
    let mut image = vec![0x11; 0x80];
    image.extend(full_payload());
    image
}

#[test]
fn full_store_restore_installs_from_the_header_on() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let image = store_image();
    let mut channel = ScriptedChannel::sending_image(&image);
    let mut ui = Recorder::default();

    let report = orchestrator(&mut eeprom, &irq, &mut channel)
        .restore_transfer(&mut ui)
        .unwrap();
    assert_eq!(report.size, 1920);

    let store = eeprom.bytes();
    assert!(store[..0x80].iter().all(|&b| b == 0xFF));
    assert_eq!(store[0x84..0xAC], image[0x84..0xAC]);
    assert_eq!(store[0xB8..], image[0xB8..]);
    assert!(eeprom.splash_enabled());

    // sixteen blocks plus the trailing end of transmission
    assert_eq!(channel.acks, 17);
    assert_eq!(channel.opened, [TRANSFER_BAUD]);
    assert!(!channel.is_open());
    assert!(irq.enabled.get());
}

#[test]
fn short_restore_uses_the_received_length() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let image = payload(300);
    let mut channel = ScriptedChannel::sending_image(&image);

    let report = orchestrator(&mut eeprom, &irq, &mut channel)
        .restore_transfer(&mut Recorder::default())
        .unwrap();
    assert_eq!(report.size, 384);

    let store = eeprom.bytes();
    assert_eq!(store[0x80 + 0x38..0x80 + 300], image[0x38..]);
    assert!(store[0x80 + 300..0x80 + 384].iter().all(|&b| b == 0x1A));
    assert!(store[0x80 + 384..].iter().all(|&b| b == 0xFF));
}

#[test]
fn implausible_header_is_rejected_before_any_write() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut image = payload(384);
    image[offset::SIZE] = 2;
    let mut channel = ScriptedChannel::sending_image(&image);
    let mut ui = Recorder::default();

    let result = orchestrator(&mut eeprom, &irq, &mut channel).restore_transfer(&mut ui);

    assert_eq!(result.unwrap_err(), Fault::InvalidContents);
    assert_eq!(ui.notices, [Notice::Transferring, Notice::InvalidContents]);
    assert_eq!(ui.acknowledged, 1);
    assert!(eeprom.writes.is_empty());
}

#[test]
fn block_error_aborts_and_leaves_the_store_alone() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut channel = ScriptedChannel::default();
    channel.incoming.push_back(Incoming::Data(vec![0; 128]));
    channel.incoming.push_back(Incoming::Data(vec![0; 128]));
    channel.incoming.push_back(Incoming::Status(BlockStatus::Error));
    let mut ui = Recorder::default();

    let mut backup = orchestrator(&mut eeprom, &irq, &mut channel);
    let result = backup.restore_transfer(&mut ui);
    assert_eq!(result.unwrap_err(), Fault::TransferError);
    assert_eq!(backup.buffer().position(), 0);
    drop(backup);

    assert_eq!(ui.notices, [Notice::Transferring, Notice::TransferError]);
    assert_eq!(ui.acknowledged, 1);
    assert_eq!(channel.closed, 1);
    assert!(irq.enabled.get());
    assert!(eeprom.writes.is_empty());
}

#[test]
fn peer_cancel_is_silent() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut channel = ScriptedChannel::default();
    channel.incoming.push_back(Incoming::Data(vec![0; 128]));
    channel.incoming.push_back(Incoming::Status(BlockStatus::Cancel));
    let mut ui = Recorder::default();

    let result = orchestrator(&mut eeprom, &irq, &mut channel).restore_transfer(&mut ui);

    assert_eq!(result.unwrap_err(), Fault::TransferCancelled);
    assert_eq!(ui.notices, [Notice::Transferring]);
    assert_eq!(ui.acknowledged, 0);
    assert!(!channel.is_open());
    assert!(irq.enabled.get());
    assert!(eeprom.writes.is_empty());
}

#[test]
fn backup_sends_the_whole_store() {
    let irq = Irq::armed();
    let contents: Vec<u8> = (0..2048).map(|i| (i * 3 + i / 256) as u8).collect();
    let mut eeprom = FaultyEeprom::from_store(RamEeprom::from_bytes(&contents));
    let mut channel = ScriptedChannel::default();
    let mut ui = Recorder::default();

    orchestrator(&mut eeprom, &irq, &mut channel)
        .backup_transfer(&mut ui)
        .unwrap();

    assert_eq!(channel.sent.len(), 16);
    assert_eq!(channel.sent.concat(), contents);
    assert_eq!(channel.finished, 1);
    assert_eq!(channel.opened, [TRANSFER_BAUD]);
    assert_eq!(channel.closed, 1);
    assert_eq!(ui.notices, [Notice::TransferInit, Notice::Transferring]);
    assert_eq!(irq.disables.get(), 1);
    assert!(irq.enabled.get());
    assert!(eeprom.writes.is_empty());
}

#[test]
fn operator_abort_stops_the_upload() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut channel = ScriptedChannel::default();
    channel.send_results.extend([
        BlockStatus::Ok,
        BlockStatus::Ok,
        BlockStatus::Ok,
        BlockStatus::SelfCancel,
    ]);
    let mut ui = Recorder::default();

    let result = orchestrator(&mut eeprom, &irq, &mut channel).backup_transfer(&mut ui);

    assert_eq!(result.unwrap_err(), Fault::TransferCancelled);
    assert_eq!(channel.sent.len(), 3);
    assert_eq!(channel.finished, 0);
    assert_eq!(channel.closed, 1);
    assert_eq!(ui.acknowledged, 0);
    assert!(irq.enabled.get());
}

#[test]
fn unacknowledged_end_of_transmission_is_an_error() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut channel = ScriptedChannel {
        finish_status: Some(BlockStatus::Error),
        ..ScriptedChannel::default()
    };
    let mut ui = Recorder::default();

    let mut backup = orchestrator(&mut eeprom, &irq, &mut channel);
    let result = backup.backup_transfer(&mut ui);
    assert_eq!(result.unwrap_err(), Fault::TransferError);
    assert_eq!(
        backup.installer().journal().last().map(|e| e.event),
        Some(Event::TransferClosed { bytes: 0 })
    );
    drop(backup);

    assert_eq!(channel.sent.len(), 16);
    assert_eq!(channel.finished, 1);
    assert_eq!(channel.closed, 1);
    assert_eq!(
        ui.notices,
        [Notice::TransferInit, Notice::Transferring, Notice::TransferError]
    );
    assert_eq!(ui.acknowledged, 1);
    assert!(irq.enabled.get());
}

#[test]
fn failed_handshake_is_reported() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut channel = ScriptedChannel {
        start_status: Some(BlockStatus::Error),
        ..ScriptedChannel::default()
    };
    let mut ui = Recorder::default();

    let result = orchestrator(&mut eeprom, &irq, &mut channel).backup_transfer(&mut ui);

    assert_eq!(result.unwrap_err(), Fault::TransferError);
    assert_eq!(ui.notices, [Notice::TransferInit, Notice::TransferError]);
    assert_eq!(ui.acknowledged, 1);
    assert!(channel.sent.is_empty());
    assert_eq!(irq.disables.get(), 0);
}

#[test]
fn local_backup_restores_after_damage() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    eeprom.inner.as_bytes_mut()[0x80..].copy_from_slice(&full_payload());
    let mut channel = ScriptedChannel::default();

    let mut backup = orchestrator(&mut eeprom, &irq, &mut channel);
    assert!(!backup.mirror_valid());
    backup.backup_local(&mut Recorder::default());
    assert!(backup.mirror_valid());
    let saved = backup.mirror().as_slice().to_vec();

    backup.installer().eeprom().inner.as_bytes_mut()[0x100..0x200].fill(0);
    backup.restore_local(&mut Recorder::default()).unwrap();
    drop(backup);

    assert_eq!(eeprom.bytes()[0xB8..], saved[0xB8..]);
    assert!(eeprom.splash_enabled());
}

#[test]
fn restore_local_refuses_an_empty_mirror() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    let mut channel = ScriptedChannel::default();

    let result = orchestrator(&mut eeprom, &irq, &mut channel).restore_local(&mut Recorder::default());

    assert_eq!(result.unwrap_err(), Fault::InvalidHeader);
    assert!(eeprom.writes.is_empty());
}

#[test]
fn backup_is_offered_only_without_a_valid_mirror() {
    let irq = Irq::armed();
    let mut eeprom = FaultyEeprom::new();
    eeprom.inner.as_bytes_mut()[0x80..].copy_from_slice(&full_payload());
    let mut channel = ScriptedChannel::default();
    let mut backup = orchestrator(&mut eeprom, &irq, &mut channel);

    let mut declined = Recorder::answering(&[false]);
    assert!(!backup.backup_before_install(&mut declined));
    assert_eq!(declined.prompts, [Prompt::BackupFirst]);
    assert!(!backup.mirror_valid());

    let mut accepted = Recorder::answering(&[true]);
    assert!(backup.backup_before_install(&mut accepted));
    assert_eq!(accepted.notices, [Notice::BackingUp]);
    assert!(backup.mirror_valid());

    let mut again = Recorder::answering(&[true]);
    assert!(!backup.backup_before_install(&mut again));
    assert!(again.prompts.is_empty());
}
