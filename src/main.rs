#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]

use panic_halt as _;

use splash_installer::config::TransferConfig;
use splash_installer::drivers::{InputDebouncer, InputLatch, Key, SerialConsole};
use splash_installer::hal::{
    gpio, AvrEeprom, Interrupts, Power, Usart0, Usart1, VblankInterrupt, VblankTimer, XmemRegion,
};
use splash_installer::logger::Journal;
use splash_installer::os::VblankClock;
use splash_installer::protocol::XmodemChannel;
use splash_installer::ui::Console;
use splash_installer::{Application, Installer, Orchestrator};

const TERMINAL_BAUD: u32 = 115_200;

// Shared with TIMER0_COMP
static INPUT: InputLatch = InputLatch::new();
static VBLANK: VblankClock = VblankClock::new();

static IRQ: VblankInterrupt = VblankInterrupt::new();

static PAYLOAD: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/payload.bin"));

fn ticks() -> u16 {
    VBLANK.ticks()
}

/// B held on the keypad cancels a running transfer
fn abort_requested() -> bool {
    gpio::scan_keypad().contains(Key::B)
}

#[avr_device::interrupt(atmega128a)]
fn TIMER0_COMP() {
    INPUT.sample(gpio::scan_keypad());
    VBLANK.tick();
}

#[avr_device::entry]
fn main() -> ! {
    IRQ.disable();
    gpio::init();

    let mut terminal = Usart1::new();
    terminal.set_baud(TERMINAL_BAUD);
    let mut screen = SerialConsole::new(terminal);
    screen.reset();

    let mut timer = VblankTimer::new();
    timer.start();

    let config = TransferConfig::default();
    let channel = XmodemChannel::new(Usart0::new(), config).with_abort(abort_requested);
    let installer = Installer::new(AvrEeprom::new(), &IRQ, Journal::new(ticks));
    let backup = Orchestrator::new(installer, channel, XmemRegion::new(), config);
    let console = Console::new(screen, InputDebouncer::new(&INPUT, &VBLANK), Power::new());

    let mut app = Application::new(console, backup, PAYLOAD);

    IRQ.acknowledge_all();
    IRQ.enable();
    app.run()
}
