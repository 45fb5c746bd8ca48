use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

pub(crate) mod bit_fields;
mod constants;
mod details;
mod fifo;
mod init;
mod link;
mod state;
mod status;
use bit_fields::Config;
pub use constants::{commands, mnemonics, registers};
pub use details::RadioDetails;

use crate::{
    radio::RadioConfig,
    types::{OperatingState, StatusFlags},
};

/// The largest payload the nRF24L01+ can carry.
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// Command byte + payload + the trailing byte of a payload read.
const BUF_LEN: usize = MAX_PAYLOAD_SIZE + 2;

/// An collection of error types to describe what can go wrong on the link.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinkError<SPI, DO> {
    /// Represents a SPI transaction error.
    ///
    /// With [`AvrSpi`](crate::hw::AvrSpi) this is where a bus timeout surfaces.
    Spi(SPI),
    /// Represents a DigitalOutput (CE pin) error.
    Gpo(DO),
    /// The radio never reported the outcome of a transmission within
    /// [`RadioConfig::tx_timeout_us()`].
    RadioNotResponding,
    /// The outgoing payload is longer than [`MAX_PAYLOAD_SIZE`].
    PayloadTooLarge,
    /// The radio gave up after its configured number of retransmits.
    MaxRetransmitExceeded,
    /// The requested state change is not allowed from the current state.
    IllegalTransition {
        from: OperatingState,
        to: OperatingState,
    },
    /// The [`RadioConfig`] passed to [`Nrf24Link::new()`] is not usable.
    ///
    /// See [`RadioConfig::is_valid()`].
    InvalidConfig,
}

#[cfg(feature = "defmt")]
impl<SPI: defmt::Format, DO: defmt::Format> defmt::Format for LinkError<SPI, DO> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            LinkError::Spi(e) => defmt::write!(fmt, "SPI error: {}", e),
            LinkError::Gpo(e) => defmt::write!(fmt, "CE pin error: {}", e),
            LinkError::RadioNotResponding => defmt::write!(fmt, "radio not responding"),
            LinkError::PayloadTooLarge => defmt::write!(fmt, "payload too large"),
            LinkError::MaxRetransmitExceeded => defmt::write!(fmt, "max retransmits exceeded"),
            LinkError::IllegalTransition { from, to } => {
                defmt::write!(fmt, "illegal transition {} -> {}", from, to)
            }
            LinkError::InvalidConfig => defmt::write!(fmt, "invalid configuration"),
        }
    }
}

/// This struct implements the [`Esb*` traits](mod@crate::radio::prelude)
/// for an nRF24L01+ used as a single pipe text message link.
pub struct Nrf24Link<SPI, DO, DELAY> {
    _spi: SPI,
    /// The CE pin for the radio.
    _ce_pin: DO,
    _delay_impl: DELAY,
    _buf: [u8; BUF_LEN],
    _rx_buf: [u8; MAX_PAYLOAD_SIZE],
    _status: StatusFlags,
    _config: RadioConfig,
    _state: OperatingState,
}

impl<SPI, DO, DELAY> Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    /// Instantiate a [`Nrf24Link`] object for use on the specified
    /// `spi` device with the given `ce_pin`.
    ///
    /// The radio's CSN pin (aka Chip Select pin) shall be defined
    /// when instantiating the [`SpiDevice`] object (passed to the `spi` parameter),
    /// see [`ChipSelected`](crate::hw::ChipSelected).
    ///
    /// Nothing is sent to the radio until
    /// [`init()`](fn@crate::radio::prelude::EsbInit::init) is called.
    pub fn new(ce_pin: DO, spi: SPI, delay_impl: DELAY, config: RadioConfig) -> Self {
        Nrf24Link {
            _spi: spi,
            _ce_pin: ce_pin,
            _delay_impl: delay_impl,
            _buf: [0u8; BUF_LEN],
            _rx_buf: [0u8; MAX_PAYLOAD_SIZE],
            _status: StatusFlags::from_bits(0),
            _config: config,
            _state: OperatingState::PowerDown,
        }
    }

    /// The configuration this link was created with.
    pub fn config(&self) -> &RadioConfig {
        &self._config
    }

    /// Release the SPI device, the CE pin and the delay provider.
    pub fn free(self) -> (SPI, DO, DELAY) {
        (self._spi, self._ce_pin, self._delay_impl)
    }

    fn spi_transfer(&mut self, len: usize) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        self._spi
            .transfer_in_place(&mut self._buf[..len])
            .map_err(LinkError::Spi)?;
        self._status = StatusFlags::from_bits(self._buf[0]);
        Ok(())
    }

    /// Clock out `command` followed by `len` zero bytes; the bytes clocked
    /// back are left in `self._buf[1..=len]`.
    ///
    /// This is also used to write SPI commands that consist of 1 byte:
    /// ```ignore
    /// self.spi_read(0, commands::NOP)?;
    /// // STATUS register is now stored in self._status
    /// ```
    fn spi_read(&mut self, len: usize, command: u8) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        self._buf[0] = command;
        self._buf[1..=len].fill(0);
        self.spi_transfer(len + 1)
    }

    /// Clock out `command` followed by `data`.
    fn spi_command(
        &mut self,
        command: u8,
        data: &[u8],
    ) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        self._buf[0] = command;
        self._buf[1..=data.len()].copy_from_slice(data);
        self.spi_transfer(data.len() + 1)
    }

    fn spi_write_byte(
        &mut self,
        register: u8,
        byte: u8,
    ) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        self.spi_command(commands::W_REGISTER | (register & registers::MASK), &[byte])
    }

    fn spi_write_buf(
        &mut self,
        register: u8,
        buf: &[u8],
    ) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        self.spi_command(commands::W_REGISTER | (register & registers::MASK), buf)
    }

    fn read_byte(&mut self, register: u8) -> Result<u8, LinkError<SPI::Error, DO::Error>> {
        self.spi_read(1, commands::R_REGISTER | (register & registers::MASK))?;
        Ok(self._buf[1])
    }

    fn read_config(&mut self) -> Result<Config, LinkError<SPI::Error, DO::Error>> {
        Ok(Config::from_bits(self.read_byte(registers::CONFIG)?))
    }

    fn write_config(&mut self, config: Config) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        self.spi_write_byte(registers::CONFIG, config.into_bits())
    }

    /// Read `buf.len()` bytes from `register`.
    ///
    /// Buffers longer than [`MAX_PAYLOAD_SIZE`] are rejected with
    /// [`LinkError::PayloadTooLarge`] before any bus traffic.
    /// Returns the STATUS byte clocked out by the radio during the command.
    pub fn read_register(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> Result<StatusFlags, LinkError<SPI::Error, DO::Error>> {
        let len = buf.len();
        if len > MAX_PAYLOAD_SIZE {
            return Err(LinkError::PayloadTooLarge);
        }
        self.spi_read(len, commands::R_REGISTER | (register & registers::MASK))?;
        buf.copy_from_slice(&self._buf[1..=len]);
        Ok(self._status)
    }

    /// Write `buf` to `register`.
    ///
    /// Buffers longer than [`MAX_PAYLOAD_SIZE`] are rejected with
    /// [`LinkError::PayloadTooLarge`] before any bus traffic.
    /// Returns the STATUS byte clocked out by the radio during the command.
    pub fn write_register(
        &mut self,
        register: u8,
        buf: &[u8],
    ) -> Result<StatusFlags, LinkError<SPI::Error, DO::Error>> {
        if buf.len() > MAX_PAYLOAD_SIZE {
            return Err(LinkError::PayloadTooLarge);
        }
        self.spi_write_buf(register, buf)?;
        Ok(self._status)
    }
}
