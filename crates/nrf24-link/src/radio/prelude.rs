//! This module defines the generic traits that may
//! need to imported to use the radio link.
//!
//! It is convenient to import these traits with the `*` syntax.
//!
//! ```
//! use nrf24_link::radio::prelude::*;
//! ```

use crate::types::{FifoState, OperatingState, StatusFlags};

use super::RadioDetails;

/// A trait to bring the transceiver into a known configuration.
pub trait EsbInit {
    type ConfigErrorType;

    /// Write the whole configuration to the radio.
    ///
    /// Afterwards the radio is powered up in StandBy-I mode with its FIFOs
    /// flushed and all IRQ flags cleared. Use [`EsbLink::start_listening()`]
    /// to begin receiving.
    fn init(&mut self) -> Result<(), Self::ConfigErrorType>;
}

/// A trait to drive the radio's operating state.
pub trait EsbState {
    type StateErrorType;

    /// The state the driver last put the radio in.
    fn state(&self) -> OperatingState;

    /// Move the radio to `target`.
    ///
    /// Requests that are not legal from the current state are rejected
    /// without any bus traffic.
    fn apply_state(&mut self, target: OperatingState) -> Result<(), Self::StateErrorType>;

    /// Power up the radio, waiting for the crystal to settle only if it was powered down.
    fn power_up(&mut self) -> Result<(), Self::StateErrorType> {
        self.apply_state(OperatingState::PowerUp)
    }

    /// Power down the radio. Register contents are kept.
    fn power_down(&mut self) -> Result<(), Self::StateErrorType> {
        self.apply_state(OperatingState::PowerDown)
    }
}

/// A trait to represent manipulation of a transceiver's FIFOs.
pub trait EsbFifo {
    type FifoErrorType;

    /// Is there a payload waiting in the RX FIFO?
    fn available(&mut self) -> Result<bool, Self::FifoErrorType>;

    /// Discard everything in the RX FIFO.
    fn flush_rx(&mut self) -> Result<(), Self::FifoErrorType>;

    /// Discard everything in the TX FIFO.
    fn flush_tx(&mut self) -> Result<(), Self::FifoErrorType>;

    /// Get the state of the TX FIFO (`about_tx` is `true`) or the RX FIFO.
    fn get_fifo_state(&mut self, about_tx: bool) -> Result<FifoState, Self::FifoErrorType>;
}

/// A trait to represent the transceiver's interrupt events.
pub trait EsbStatus {
    type StatusErrorType;

    /// Clear the given IRQ flags (write-1-to-clear).
    fn clear_status_flags(&mut self, flags: StatusFlags) -> Result<(), Self::StatusErrorType>;

    /// Refresh the cached STATUS byte with a NOP command.
    fn update(&mut self) -> Result<(), Self::StatusErrorType>;

    /// The STATUS byte returned by the most recent SPI transaction.
    fn get_status_flags(&self) -> StatusFlags;
}

/// A trait to exchange text messages over the air.
pub trait EsbLink {
    type LinkErrorType;

    /// Enter RX mode and raise CE.
    fn start_listening(&mut self) -> Result<(), Self::LinkErrorType>;

    /// Transmit `payload` (at most 32 bytes) and return to listening.
    ///
    /// This blocks until the radio reports the outcome or the configured
    /// timeout elapses. In either case the radio is listening again when
    /// this returns.
    fn send_message(&mut self, payload: &[u8]) -> Result<(), Self::LinkErrorType>;

    /// Drain the payload at the head of the RX FIFO.
    ///
    /// The message is cut at its first NUL byte. `None` means there was
    /// nothing (or only an empty message) to read. The returned slice
    /// borrows the driver's receive buffer, which the next call overwrites.
    fn read_message(&mut self) -> Result<Option<&[u8]>, Self::LinkErrorType>;
}

/// A trait to read back the radio's configuration for diagnostics.
pub trait EsbDetails {
    type DetailsErrorType;

    /// Take a snapshot of the radio's registers.
    fn details(&mut self) -> Result<RadioDetails, Self::DetailsErrorType>;
}
