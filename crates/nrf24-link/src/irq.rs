//! The radio's IRQ line and the flag it raises.
//!
//! The nRF24L01 pulls IRQ low when an unmasked event occurs. That edge
//! triggers INT0, whose handler does nothing but [`on_irq_edge()`]. All
//! radio traffic stays in the main loop, which polls [`PendingReceipt::take()`].
//!
//! With the `atmega328p` feature the INT0 handler is provided and raises
//! [`RECEIPT`].

use core::sync::atomic::{AtomicBool, Ordering};

use crate::hw::Register8;

/// EICRA: interrupt sense control bits for INT0
const ISC01: u8 = 1;
const ISC00: u8 = 0;
/// EIMSK: external interrupt request 0 enable
const INT0_ENABLE: u8 = 0;

/// The flag raised by the INT0 handler.
#[cfg(feature = "atmega328p")]
pub static RECEIPT: PendingReceipt = PendingReceipt::new();

#[cfg(feature = "atmega328p")]
#[avr_device::interrupt(atmega328p)]
fn INT0() {
    on_irq_edge(&RECEIPT);
}

/// A single "a packet may be waiting" notification shared between
/// interrupt context and the main loop.
#[derive(Debug, Default)]
pub struct PendingReceipt(AtomicBool);

impl PendingReceipt {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Mark a receipt as pending. Safe to call from interrupt context.
    #[inline]
    pub fn notify(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Consume the notification.
    ///
    /// Returns `true` at most once per call to [`PendingReceipt::notify()`]
    /// (several notifications before a `take()` collapse into one).
    #[cfg(feature = "atmega328p")]
    pub fn take(&self) -> bool {
        // AVR has no swap; INT0 must not fire between the load and the store
        avr_device::interrupt::free(|_| self.load_and_clear())
    }

    /// Consume the notification.
    ///
    /// Returns `true` at most once per call to [`PendingReceipt::notify()`]
    /// (several notifications before a `take()` collapse into one).
    #[cfg(all(not(feature = "atmega328p"), target_has_atomic = "8"))]
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }

    /// Consume the notification.
    ///
    /// Without `swap`, a notification landing between the load and the
    /// store is absorbed into this one.
    #[cfg(all(not(feature = "atmega328p"), not(target_has_atomic = "8")))]
    pub fn take(&self) -> bool {
        self.load_and_clear()
    }

    #[cfg(any(feature = "atmega328p", not(target_has_atomic = "8")))]
    fn load_and_clear(&self) -> bool {
        if self.0.load(Ordering::Acquire) {
            self.0.store(false, Ordering::Relaxed);
            return true;
        }
        false
    }

    /// Peek at the flag without consuming it.
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// The body of the external interrupt handler.
///
/// Never touches the SPI bus.
#[inline]
pub fn on_irq_edge(receipt: &PendingReceipt) {
    receipt.notify();
}

/// Arm INT0 on a falling edge.
///
/// Global interrupts are left alone; they are enabled once the board is
/// fully set up.
pub fn enable_falling_edge<R: Register8>(eicra: &mut R, eimsk: &mut R) {
    eicra.modify(|v| (v & !(1 << ISC00)) | (1 << ISC01));
    eimsk.set_bit(INT0_ENABLE);
}
