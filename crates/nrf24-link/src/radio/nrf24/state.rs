use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

use crate::{
    radio::{prelude::EsbState, LinkError, Nrf24Link},
    types::{OperatingState, StatusFlags},
};

use super::registers;

use OperatingState::*;

/// Every `(from, to)` pair the driver accepts. Anything else is rejected.
const TRANSITIONS: [(OperatingState, OperatingState); 28] = [
    (PowerDown, PowerDown),
    (PowerDown, PowerUp),
    (PowerUp, PowerDown),
    (PowerUp, PowerUp),
    (PowerUp, StandbyI),
    (PowerUp, StandbyII),
    (PowerUp, Receiving),
    (PowerUp, Transmitting),
    (StandbyI, PowerDown),
    (StandbyI, PowerUp),
    (StandbyI, StandbyI),
    (StandbyI, StandbyII),
    (StandbyI, Receiving),
    (StandbyI, Transmitting),
    (StandbyII, PowerDown),
    (StandbyII, StandbyI),
    (StandbyII, StandbyII),
    (StandbyII, Receiving),
    (StandbyII, Transmitting),
    (Receiving, PowerDown),
    (Receiving, StandbyI),
    (Receiving, Receiving),
    (Receiving, Transmitting),
    (Transmitting, PowerDown),
    (Transmitting, StandbyI),
    (Transmitting, StandbyII),
    (Transmitting, Receiving),
    (Transmitting, Transmitting),
];

/// Is moving from `from` to `to` allowed?
pub(crate) const fn is_legal(from: OperatingState, to: OperatingState) -> bool {
    let mut i = 0;
    while i < TRANSITIONS.len() {
        let (f, t) = TRANSITIONS[i];
        if f as u8 == from as u8 && t as u8 == to as u8 {
            return true;
        }
        i += 1;
    }
    false
}

/// Crystal start-up after PWR_UP is set.
const POWER_UP_DELAY_MS: u32 = 2;
/// RX/TX settling after CE rises.
pub(super) const SETTLING_DELAY_US: u32 = 150;

impl<SPI, DO, DELAY> EsbState for Nrf24Link<SPI, DO, DELAY>
where
    SPI: SpiDevice,
    DO: OutputPin,
    DELAY: DelayNs,
{
    type StateErrorType = LinkError<SPI::Error, DO::Error>;

    fn state(&self) -> OperatingState {
        self._state
    }

    fn apply_state(&mut self, target: OperatingState) -> Result<(), Self::StateErrorType> {
        let from = self._state;
        if !is_legal(from, target) {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejected state transition {} -> {}", from, target);
            return Err(LinkError::IllegalTransition { from, to: target });
        }

        let config = self.read_config()?;
        match target {
            PowerUp => {
                if !config.power() {
                    self.write_config(config.with_power(true))?;
                    self._delay_impl.delay_ms(POWER_UP_DELAY_MS);
                }
            }
            PowerDown => self.write_config(config.with_power(false))?,
            Receiving => {
                self.write_config(config.with_is_rx(true))?;
                self.spi_write_byte(registers::STATUS, StatusFlags::all().into_bits())?;
            }
            Transmitting => self.write_config(config.with_is_rx(false))?,
            StandbyI => self._ce_pin.set_low().map_err(LinkError::Gpo)?,
            StandbyII => {
                self.write_config(config.with_is_rx(false))?;
                self._ce_pin.set_high().map_err(LinkError::Gpo)?;
                self._delay_impl.delay_us(SETTLING_DELAY_US);
            }
        }

        #[cfg(feature = "defmt")]
        defmt::trace!("State {} -> {}", from, target);
        self._state = target;
        Ok(())
    }
}
