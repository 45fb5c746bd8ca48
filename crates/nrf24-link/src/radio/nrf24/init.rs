use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    radio::{
        prelude::{EsbFifo, EsbInit},
        LinkError, Nrf24Link,
    },
    types::{OperatingState, StatusFlags},
};

use super::{mnemonics, registers};

/// Power-on reset time of the radio.
const POWER_ON_RESET_MS: u32 = 100;

/// The only RX pipe the link uses.
const RX_PIPE: u8 = 0;

impl<SPI, DO, DELAY> EsbInit for Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type ConfigErrorType = LinkError<SPI::Error, DO::Error>;

    fn init(&mut self) -> Result<(), Self::ConfigErrorType> {
        let config = self._config;
        if !config.is_valid() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Refusing to apply an invalid radio configuration");
            return Err(LinkError::InvalidConfig);
        }

        self._ce_pin.set_low().map_err(LinkError::Gpo)?;
        self._delay_impl.delay_ms(POWER_ON_RESET_MS);

        self.write_config(config.config_reg)?;
        self.spi_write_byte(
            registers::EN_AA,
            config.auto_ack() as u8 * mnemonics::ALL_PIPES,
        )?;
        self.spi_write_byte(registers::SETUP_RETR, config.auto_retries.into_bits())?;
        // all pipes closed until the addresses are in place
        self.spi_write_byte(registers::EN_RXADDR, 0)?;
        self.spi_write_byte(registers::RF_CH, config.channel())?;
        self.spi_write_byte(registers::RF_SETUP, config.rf_setup())?;
        self.spi_write_byte(registers::STATUS, StatusFlags::all().into_bits())?;
        self.spi_write_byte(
            registers::DYNPD,
            config.dynamic_payloads() as u8 * mnemonics::ALL_PIPES,
        )?;
        self.spi_write_byte(registers::FEATURE, config.feature())?;
        self.flush_rx()?;
        self.flush_tx()?;

        self.spi_write_buf(registers::RX_ADDR_P0, &config.rx_address())?;
        self.spi_write_buf(registers::TX_ADDR, &config.tx_address())?;
        self.spi_read(1, registers::EN_RXADDR)?;
        let open_pipes = self._buf[1] | (1 << RX_PIPE);
        self.spi_write_byte(registers::EN_RXADDR, open_pipes)?;

        self._state = OperatingState::StandbyI;
        Ok(())
    }
}
