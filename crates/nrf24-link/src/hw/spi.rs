use embedded_hal::{
    delay::DelayNs,
    digital::OutputPin,
    spi::{self, ErrorKind, ErrorType, Operation, SpiBus, SpiDevice},
};

use super::Register8;

/// SPCR bits
const SPE: u8 = 6;
const MSTR: u8 = 4;
/// SPSR bits
const SPIF: u8 = 7;
const SPI2X: u8 = 0;

/// How many times SPIF is sampled before a byte exchange is abandoned.
pub const SPI_POLL_LIMIT: u32 = 1000;

/// Errors raised by the AVR SPI master.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusError {
    /// The transfer-complete flag never rose.
    Timeout,
}

impl spi::Error for BusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            BusError::Timeout => defmt::write!(fmt, "SPI bus timeout"),
        }
    }
}

/// The registers of the AVR SPI peripheral.
#[derive(Clone, Copy, Debug)]
pub struct SpiRegisters<R> {
    pub spcr: R,
    pub spsr: R,
    pub spdr: R,
}

/// The AVR hardware SPI in master mode.
///
/// Mode 0 (CPOL 0, CPHA 0), MSB first, at half the CPU clock.
/// Chip select is not handled here; see [`ChipSelected`].
#[derive(Debug)]
pub struct AvrSpi<R> {
    regs: SpiRegisters<R>,
    poll_limit: u32,
}

impl<R: Register8> AvrSpi<R> {
    /// Take over the SPI peripheral and configure it as a bus master.
    ///
    /// The MOSI/SCK/SS pin directions are a board concern and must be set up
    /// before the first transfer.
    pub fn new(mut regs: SpiRegisters<R>) -> Self {
        regs.spcr.write((1 << SPE) | (1 << MSTR));
        regs.spsr.set_bit(SPI2X);
        Self {
            regs,
            poll_limit: SPI_POLL_LIMIT,
        }
    }

    /// Change how many times SPIF is sampled per byte.
    pub fn with_poll_limit(self, poll_limit: u32) -> Self {
        Self { poll_limit, ..self }
    }

    /// Clock `out` onto MOSI and return the byte simultaneously shifted in on MISO.
    pub fn exchange_byte(&mut self, out: u8) -> Result<u8, BusError> {
        self.regs.spdr.write(out);
        for _ in 0..self.poll_limit {
            if self.regs.spsr.is_set(SPIF) {
                return Ok(self.regs.spdr.read());
            }
        }
        Err(BusError::Timeout)
    }

    /// Release the peripheral registers.
    pub fn free(self) -> SpiRegisters<R> {
        self.regs
    }
}

impl<R> ErrorType for AvrSpi<R> {
    type Error = BusError;
}

impl<R: Register8> SpiBus<u8> for AvrSpi<R> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.exchange_byte(0)?;
        }
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for word in words {
            self.exchange_byte(*word)?;
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let len = read.len().max(write.len());
        for i in 0..len {
            let received = self.exchange_byte(write.get(i).copied().unwrap_or(0))?;
            if let Some(word) = read.get_mut(i) {
                *word = received;
            }
        }
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        for word in words.iter_mut() {
            *word = self.exchange_byte(*word)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // every exchange already waited for SPIF
        Ok(())
    }
}

/// Errors raised by [`ChipSelected`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceError<BUS, CS> {
    /// The underlying bus failed.
    Bus(BUS),
    /// Driving the chip select pin failed.
    Csn(CS),
}

impl<BUS: spi::Error, CS: core::fmt::Debug> spi::Error for DeviceError<BUS, CS> {
    fn kind(&self) -> ErrorKind {
        match self {
            DeviceError::Bus(e) => e.kind(),
            DeviceError::Csn(_) => ErrorKind::ChipSelectFault,
        }
    }
}

#[cfg(feature = "defmt")]
impl<BUS: defmt::Format, CS> defmt::Format for DeviceError<BUS, CS> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            DeviceError::Bus(e) => defmt::write!(fmt, "bus error: {}", e),
            DeviceError::Csn(_) => defmt::write!(fmt, "CSN pin error"),
        }
    }
}

/// An exclusive [`SpiDevice`] made of a bus and an active-low chip select pin.
///
/// CSN is pulled low for the duration of each transaction and raised again
/// afterwards, even if one of the operations failed.
pub struct ChipSelected<BUS, CS, D> {
    bus: BUS,
    csn: CS,
    delay: D,
}

impl<BUS, CS, D> ChipSelected<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    /// Bind `bus` to the device selected by `csn`.
    ///
    /// CSN is driven high (deselected) immediately.
    pub fn new(bus: BUS, mut csn: CS, delay: D) -> Result<Self, CS::Error> {
        csn.set_high()?;
        Ok(Self { bus, csn, delay })
    }

    /// Release the bus and the pin.
    pub fn free(self) -> (BUS, CS, D) {
        (self.bus, self.csn, self.delay)
    }
}

impl<BUS, CS, D> ErrorType for ChipSelected<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
{
    type Error = DeviceError<BUS::Error, CS::Error>;
}

impl<BUS, CS, D> SpiDevice for ChipSelected<BUS, CS, D>
where
    BUS: SpiBus,
    CS: OutputPin,
    D: DelayNs,
{
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        self.csn.set_low().map_err(DeviceError::Csn)?;

        let result = operations.iter_mut().try_for_each(|op| match op {
            Operation::Read(buf) => self.bus.read(buf),
            Operation::Write(buf) => self.bus.write(buf),
            Operation::Transfer(read, write) => self.bus.transfer(read, write),
            Operation::TransferInPlace(buf) => self.bus.transfer_in_place(buf),
            Operation::DelayNs(ns) => {
                self.bus.flush()?;
                self.delay.delay_ns(*ns);
                Ok(())
            }
        });
        let flushed = self.bus.flush();
        let deselected = self.csn.set_high();

        result.map_err(DeviceError::Bus)?;
        flushed.map_err(DeviceError::Bus)?;
        deselected.map_err(DeviceError::Csn)
    }
}
