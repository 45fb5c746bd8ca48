use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    radio::{
        prelude::{EsbFifo, EsbLink, EsbState, EsbStatus},
        LinkError, Nrf24Link,
    },
    types::{OperatingState, StatusFlags},
};

use super::{commands, registers, state::SETTLING_DELAY_US, MAX_PAYLOAD_SIZE};

/// The ACK payload queued before each read when auto-ack is enabled.
const ACK_PAYLOAD: &[u8] = b"A";
/// The pipe ACK payloads are queued for.
const ACK_PIPE: u8 = 0;
/// How long CE is held high to start a transmission (>= 10 µs).
const CE_PULSE_US: u32 = 15;
/// Interval between two STATUS polls while waiting for a transmission.
const TX_POLL_INTERVAL_US: u32 = 10;

/// How a transmission ended.
enum TxOutcome {
    Sent,
    MaxRetries,
    TimedOut,
}

impl<SPI, DO, DELAY> Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    /// Mask (or unmask) the RX data ready event on the IRQ pin.
    fn mask_rx_dr(&mut self, mask: bool) -> Result<(), LinkError<SPI::Error, DO::Error>> {
        let config = self.read_config()?;
        self.write_config(config.with_rx_dr(!mask))
    }

    /// Poll STATUS until the radio reports the outcome of the pending transmission.
    fn wait_for_tx(&mut self) -> Result<TxOutcome, LinkError<SPI::Error, DO::Error>> {
        let polls = (self._config.tx_timeout_us() / TX_POLL_INTERVAL_US).max(1);
        for _ in 0..polls {
            self.spi_read(1, registers::STATUS)?;
            if self._status.tx_ds() {
                return Ok(TxOutcome::Sent);
            }
            if self._status.max_rt() {
                return Ok(TxOutcome::MaxRetries);
            }
            self._delay_impl.delay_us(TX_POLL_INTERVAL_US);
        }
        Ok(TxOutcome::TimedOut)
    }

    /// Load `payload` (plus a NUL) into the TX FIFO, pulse CE and wait for
    /// the outcome. The radio must already be in the transmitting state.
    fn transmit(&mut self, payload: &[u8]) -> Result<TxOutcome, LinkError<SPI::Error, DO::Error>> {
        self.flush_rx()?;
        self.flush_tx()?;
        self.clear_status_flags(StatusFlags::default().with_tx_ds(true))?;
        self.mask_rx_dr(true)?;

        let command = if self._config.auto_ack() {
            commands::W_TX_PAYLOAD
        } else {
            commands::W_TX_PAYLOAD_NO_ACK
        };
        let len = payload.len();
        self._buf[0] = command;
        self._buf[1..=len].copy_from_slice(payload);
        self._buf[len + 1] = 0;
        self.spi_transfer(len + 2)?;

        self._ce_pin.set_high().map_err(LinkError::Gpo)?;
        self._delay_impl.delay_us(CE_PULSE_US);
        self._ce_pin.set_low().map_err(LinkError::Gpo)?;

        let outcome = self.wait_for_tx()?;
        if let TxOutcome::MaxRetries = outcome {
            self.clear_status_flags(StatusFlags::default().with_max_rt(true))?;
            self.flush_tx()?;
        }
        Ok(outcome)
    }
}

impl<SPI, DO, DELAY> EsbLink for Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type LinkErrorType = LinkError<SPI::Error, DO::Error>;

    fn start_listening(&mut self) -> Result<(), Self::LinkErrorType> {
        self.apply_state(OperatingState::Receiving)?;
        self._ce_pin.set_high().map_err(LinkError::Gpo)?;
        self._delay_impl.delay_us(SETTLING_DELAY_US);
        Ok(())
    }

    /// See [`EsbLink::send_message()`] for implementation-agnostic detail.
    ///
    /// The payload goes out with a trailing NUL byte, so the receiver sees
    /// `payload.len() + 1` bytes (truncated to 32 by the radio).
    /// While the transmission is pending the RX data ready event is masked,
    /// so the IRQ pin stays quiet. Once the radio is in the transmitting
    /// state, it is unmasked and put back to listening even if the bus or
    /// CE fails along the way; the first error is returned.
    fn send_message(&mut self, payload: &[u8]) -> Result<(), Self::LinkErrorType> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(LinkError::PayloadTooLarge);
        }
        self.apply_state(OperatingState::Transmitting)?;

        let outcome = self.transmit(payload);
        // restored on every path, bus and CE failures included
        let unmasked = self.mask_rx_dr(false);
        let listening = self.start_listening();
        let outcome = outcome?;
        unmasked?;
        listening?;

        match outcome {
            TxOutcome::Sent => Ok(()),
            TxOutcome::MaxRetries => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Transmission failed: max retransmits reached");
                Err(LinkError::MaxRetransmitExceeded)
            }
            TxOutcome::TimedOut => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Transmission failed: no response from radio");
                Err(LinkError::RadioNotResponding)
            }
        }
    }

    /// See [`EsbLink::read_message()`] for implementation-agnostic detail.
    ///
    /// The radio clocks out one byte more than the reported width; the
    /// extra byte is ignored. A width above 32 means a corrupt packet,
    /// which is discarded by flushing the RX FIFO.
    fn read_message(&mut self) -> Result<Option<&[u8]>, Self::LinkErrorType> {
        if self._config.auto_ack() {
            self.spi_command(commands::W_ACK_PAYLOAD | ACK_PIPE, ACK_PAYLOAD)?;
        }

        self.spi_read(1, commands::R_RX_PL_WID)?;
        let width = self._buf[1] as usize;
        let mut len = 0;
        if width > MAX_PAYLOAD_SIZE {
            #[cfg(feature = "defmt")]
            defmt::warn!("Discarding corrupt payload of width {=usize}", width);
            self.flush_rx()?;
        } else if width > 0 {
            self.spi_read(width + 1, commands::R_RX_PAYLOAD)?;
            self._rx_buf[..width].copy_from_slice(&self._buf[1..=width]);
            len = self._rx_buf[..width]
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(width);
        }

        self.clear_status_flags(StatusFlags::default().with_rx_dr(true))?;
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(&self._rx_buf[..len]))
    }
}
