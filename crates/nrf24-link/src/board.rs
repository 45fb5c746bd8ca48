//! ATmega328P bring-up for the radio and the console.
//!
//! | signal | pin |
//! |--------|-----|
//! | CE     | PB1 |
//! | CSN    | PB2 |
//! | MOSI   | PB3 |
//! | MISO   | PB4 |
//! | SCK    | PB5 |
//! | IRQ    | PD2 (INT0) |

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::{
    console::{ubrr, Console, UartRegisters, BAUD, F_CPU},
    hw::{AvrSpi, ChipSelected, PortPin, Register8, SpiRegisters},
    irq,
};
#[cfg(feature = "atmega328p")]
use crate::hw::{HalDelay, PacRegister};

/// PORTB bits
pub const CE_PIN: u8 = 1;
pub const CSN_PIN: u8 = 2;
pub const MOSI_PIN: u8 = 3;
pub const MISO_PIN: u8 = 4;
pub const SCK_PIN: u8 = 5;
/// PORTD bit of the radio's IRQ line
pub const IRQ_PIN: u8 = 2;

/// Every register [`bring_up()`] touches.
#[derive(Clone, Debug)]
pub struct BoardRegisters<R> {
    pub ddrb: R,
    pub portb: R,
    pub ddrd: R,
    pub portd: R,
    pub eicra: R,
    pub eimsk: R,
    pub spi: SpiRegisters<R>,
    pub uart: UartRegisters<R>,
}

/// The peripherals handed to the application after [`bring_up()`].
pub struct BoardParts<R, D> {
    /// The radio's CE pin, driven low.
    pub ce: PortPin<R>,
    /// The radio on the SPI bus, deselected.
    pub spi: ChipSelected<AvrSpi<R>, PortPin<R>, D>,
    pub delay: D,
    pub console: Console<R>,
}

/// Bring up an ATmega328P and enable interrupts.
#[cfg(feature = "atmega328p")]
pub fn atmega328p(dp: avr_device::atmega328p::Peripherals) -> BoardParts<PacRegister, HalDelay> {
    let parts = bring_up(
        crate::hw::registers(dp.PORTB, dp.PORTD, dp.SPI, dp.USART0, dp.EXINT),
        HalDelay,
    );
    // SAFETY: INT0's handler only raises `irq::RECEIPT`
    unsafe { avr_device::interrupt::enable() };
    parts
}

/// Prepare the MCU side of the link:
///
/// 1. INT0 on the falling edge of IRQ. Global interrupts stay as they are.
/// 2. CE and CSN as outputs, CSN high and CE low.
/// 3. The SPI master.
///
/// The console is started last. The radio itself is left alone; hand the
/// returned parts to [`Nrf24Link::new()`](fn@crate::radio::Nrf24Link::new)
/// and call `init()`.
pub fn bring_up<R, D>(regs: BoardRegisters<R>, delay: D) -> BoardParts<R, D>
where
    R: Register8 + Clone,
    D: DelayNs + Clone,
{
    let BoardRegisters {
        mut ddrb,
        portb,
        mut ddrd,
        mut portd,
        mut eicra,
        mut eimsk,
        spi,
        uart,
    } = regs;

    // IRQ is an input with the pull-up enabled (it is open-drain on the radio)
    ddrd.clear_bit(IRQ_PIN);
    portd.set_bit(IRQ_PIN);
    irq::enable_falling_edge(&mut eicra, &mut eimsk);

    let mut ce = PortPin::output(&mut ddrb, portb.clone(), CE_PIN);
    let csn = PortPin::output(&mut ddrb, portb, CSN_PIN);
    match ce.set_low() {
        Ok(()) => {}
        Err(never) => match never {},
    }

    ddrb.clear_bit(MISO_PIN);
    ddrb.modify(|v| v | (1 << MOSI_PIN) | (1 << SCK_PIN));
    let spi = match ChipSelected::new(AvrSpi::new(spi), csn, delay.clone()) {
        Ok(device) => device,
        Err(never) => match never {},
    };

    let console = Console::new(uart, ubrr(F_CPU, BAUD));
    BoardParts {
        ce,
        spi,
        delay,
        console,
    }
}
