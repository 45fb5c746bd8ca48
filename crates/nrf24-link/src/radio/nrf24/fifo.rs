use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::radio::{prelude::EsbFifo, LinkError, Nrf24Link};
use crate::FifoState;

use super::{commands, mnemonics, registers};

impl<SPI, DO, DELAY> EsbFifo for Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type FifoErrorType = LinkError<SPI::Error, DO::Error>;

    fn available(&mut self) -> Result<bool, Self::FifoErrorType> {
        self.spi_read(1, registers::FIFO_STATUS)?;
        Ok(self._buf[1] & mnemonics::RX_EMPTY == 0)
    }

    /// Use this to discard all 3 layers in the radio's RX FIFO.
    fn flush_rx(&mut self) -> Result<(), Self::FifoErrorType> {
        self.spi_read(0, commands::FLUSH_RX)
    }

    /// Use this to discard all 3 layers in the radio's TX FIFO.
    fn flush_tx(&mut self) -> Result<(), Self::FifoErrorType> {
        self.spi_read(0, commands::FLUSH_TX)
    }

    fn get_fifo_state(&mut self, about_tx: bool) -> Result<FifoState, Self::FifoErrorType> {
        self.spi_read(1, registers::FIFO_STATUS)?;
        Ok(decode_fifo_state(self._buf[1], about_tx))
    }
}

/// Decode one FIFO's state from a FIFO_STATUS register value.
pub(super) fn decode_fifo_state(fifo_status: u8, about_tx: bool) -> FifoState {
    let (empty, full) = if about_tx {
        (mnemonics::TX_EMPTY, mnemonics::TX_FULL)
    } else {
        (mnemonics::RX_EMPTY, mnemonics::RX_FULL)
    };
    if fifo_status & empty != 0 {
        FifoState::Empty
    } else if fifo_status & full != 0 {
        FifoState::Full
    } else {
        FifoState::Occupied
    }
}
