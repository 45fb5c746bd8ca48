//! [`Register8`] over the `avr-device` ATmega328P peripheral access crate.

use avr_device::atmega328p::{EXINT, PORTB, PORTD, SPI, USART0};
use embedded_hal::delay::DelayNs;
use embedded_hal_02::blocking::delay::DelayUs;

use super::{Register8, SpiRegisters};
use crate::{board::BoardRegisters, console::UartRegisters};

/// Core clock of the board, as the HAL's delay loop understands it.
pub type Speed = atmega_hal::clock::MHz16;

/// One 8-bit register of a PAC peripheral.
#[derive(Clone, Copy)]
pub struct PacRegister {
    read: fn() -> u8,
    write: fn(u8),
}

impl Register8 for PacRegister {
    fn read(&self) -> u8 {
        (self.read)()
    }

    fn write(&mut self, value: u8) {
        (self.write)(value)
    }
}

macro_rules! pac_register {
    ($periph:ident . $reg:ident) => {
        PacRegister {
            // SAFETY: the peripheral was moved into `registers()`
            read: || unsafe { (*$periph::ptr()).$reg.read().bits() },
            write: |value| unsafe {
                (*$periph::ptr()).$reg.write(|w| w.bits(value));
            },
        }
    };
}

/// Hand the board's peripherals over to [`bring_up()`](crate::board::bring_up).
pub fn registers(
    _portb: PORTB,
    _portd: PORTD,
    _spi: SPI,
    _usart0: USART0,
    _exint: EXINT,
) -> BoardRegisters<PacRegister> {
    BoardRegisters {
        ddrb: pac_register!(PORTB.ddrb),
        portb: pac_register!(PORTB.portb),
        ddrd: pac_register!(PORTD.ddrd),
        portd: pac_register!(PORTD.portd),
        eicra: pac_register!(EXINT.eicra),
        eimsk: pac_register!(EXINT.eimsk),
        spi: SpiRegisters {
            spcr: pac_register!(SPI.spcr),
            spsr: pac_register!(SPI.spsr),
            spdr: pac_register!(SPI.spdr),
        },
        uart: UartRegisters {
            // UBRR0 is a single 16-bit register in the PAC
            ubrr_h: PacRegister {
                read: || unsafe { ((*USART0::ptr()).ubrr0.read().bits() >> 8) as u8 },
                write: |value| unsafe {
                    (*USART0::ptr())
                        .ubrr0
                        .modify(|r, w| w.bits((r.bits() & 0x00FF) | (u16::from(value) << 8)));
                },
            },
            ubrr_l: PacRegister {
                read: || unsafe { (*USART0::ptr()).ubrr0.read().bits() as u8 },
                write: |value| unsafe {
                    (*USART0::ptr())
                        .ubrr0
                        .modify(|r, w| w.bits((r.bits() & 0xFF00) | u16::from(value)));
                },
            },
            ucsr_a: pac_register!(USART0.ucsr0a),
            ucsr_b: pac_register!(USART0.ucsr0b),
            udr: pac_register!(USART0.udr0),
        },
    }
}

/// The HAL's busy-wait delay at [`Speed`], behind the `embedded-hal` 1.0 trait.
#[derive(Clone, Copy, Debug, Default)]
pub struct HalDelay;

impl DelayNs for HalDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut delay = atmega_hal::delay::Delay::<Speed>::new();
        DelayUs::<u32>::delay_us(&mut delay, ns.div_ceil(1000));
    }
}
