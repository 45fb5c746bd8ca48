//! Typed access to the MCU's 8-bit peripheral registers.
//!
//! Everything the board needs (GPIO ports, the SPI master, UART0 and the
//! external interrupt controller) is reached through the [`Register8`] trait,
//! so the same bring-up code runs against the `avr-device` PAC on the
//! target (feature `atmega328p`) and against plain memory cells in unit tests.

use core::{cell::Cell, convert::Infallible};

use embedded_hal::digital::{ErrorType, OutputPin};

mod spi;
pub use spi::{AvrSpi, BusError, ChipSelected, DeviceError, SpiRegisters};

#[cfg(feature = "atmega328p")]
mod avr;
#[cfg(feature = "atmega328p")]
pub use avr::{registers, HalDelay, PacRegister, Speed};

/// A single 8-bit hardware register.
pub trait Register8 {
    /// Read the current value of the register.
    fn read(&self) -> u8;

    /// Overwrite the register with `value`.
    fn write(&mut self, value: u8);

    /// Read-modify-write the register.
    fn modify<F: FnOnce(u8) -> u8>(&mut self, f: F) {
        let value = self.read();
        self.write(f(value));
    }

    /// Set the bit at position `bit` (0 is the LSB).
    fn set_bit(&mut self, bit: u8) {
        self.modify(|v| v | (1 << bit));
    }

    /// Clear the bit at position `bit` (0 is the LSB).
    fn clear_bit(&mut self, bit: u8) {
        self.modify(|v| v & !(1 << bit));
    }

    /// Is the bit at position `bit` set?
    fn is_set(&self, bit: u8) -> bool {
        self.read() & (1 << bit) != 0
    }
}

/// A register backed by ordinary memory.
///
/// Copies of a `CellRegister` share the same cell, which mirrors how
/// several handles to one hardware register observe the same value.
#[derive(Clone, Copy, Debug)]
pub struct CellRegister<'a>(&'a Cell<u8>);

impl<'a> CellRegister<'a> {
    pub const fn new(cell: &'a Cell<u8>) -> Self {
        Self(cell)
    }
}

impl Register8 for CellRegister<'_> {
    fn read(&self) -> u8 {
        self.0.get()
    }

    fn write(&mut self, value: u8) {
        self.0.set(value);
    }
}

/// A GPIO output: one bit of a PORTx register.
#[derive(Debug)]
pub struct PortPin<R> {
    port: R,
    bit: u8,
}

impl<R: Register8> PortPin<R> {
    /// Configure `bit` as an output in `ddr` and drive it through `port`.
    ///
    /// The pin level is left untouched; drive it explicitly afterwards.
    pub fn output<D: Register8>(ddr: &mut D, port: R, bit: u8) -> Self {
        ddr.set_bit(bit);
        Self { port, bit }
    }

    /// Is the pin currently driven high?
    pub fn is_set_high(&self) -> bool {
        self.port.is_set(self.bit)
    }
}

impl<R> ErrorType for PortPin<R> {
    type Error = Infallible;
}

impl<R: Register8> OutputPin for PortPin<R> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.port.clear_bit(self.bit);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.port.set_bit(self.bit);
        Ok(())
    }
}
