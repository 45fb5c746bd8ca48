//! A blocking text console on UART0.
//!
//! Frames are 8N1 (the reset value of UCSR0C). Output goes through
//! [`ufmt::uWrite`] or [`core::fmt::Write`], and `'\n'` is sent as `"\r\n"`.

use crate::hw::Register8;

/// CPU clock of the board.
pub const F_CPU: u32 = 16_000_000;

/// Console baud rate.
pub const BAUD: u32 = 9600;

/// How many times a UART status flag is sampled before giving up.
///
/// One character takes about 1 ms at 9600 baud.
pub const UART_POLL_LIMIT: u32 = 20_000;

/// UCSR0A bits
const RXC0: u8 = 7;
const UDRE0: u8 = 5;
/// UCSR0B bits
const RXEN0: u8 = 4;
const TXEN0: u8 = 3;

/// The UBRR divisor for `baud` in normal (16x oversampling) mode.
pub const fn ubrr(f_cpu: u32, baud: u32) -> u16 {
    (f_cpu / (baud * 16) - 1) as u16
}

/// Errors raised by the [`Console`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleError {
    /// The UART never became ready.
    Timeout,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConsoleError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            ConsoleError::Timeout => defmt::write!(fmt, "UART timeout"),
        }
    }
}

/// The registers of UART0.
#[derive(Clone, Copy, Debug)]
pub struct UartRegisters<R> {
    pub ubrr_h: R,
    pub ubrr_l: R,
    pub ucsr_a: R,
    pub ucsr_b: R,
    pub udr: R,
}

#[derive(Debug)]
pub struct Console<R> {
    regs: UartRegisters<R>,
    poll_limit: u32,
}

impl<R: Register8> Console<R> {
    /// Program the baud divisor and enable the receiver and transmitter.
    pub fn new(mut regs: UartRegisters<R>, ubrr: u16) -> Self {
        regs.ubrr_h.write((ubrr >> 8) as u8);
        regs.ubrr_l.write(ubrr as u8);
        regs.ucsr_b.write((1 << RXEN0) | (1 << TXEN0));
        Self {
            regs,
            poll_limit: UART_POLL_LIMIT,
        }
    }

    /// Change how many times a status flag is sampled per character.
    pub fn with_poll_limit(self, poll_limit: u32) -> Self {
        Self { poll_limit, ..self }
    }

    fn wait_for(&self, bit: u8) -> Result<(), ConsoleError> {
        for _ in 0..self.poll_limit {
            if self.regs.ucsr_a.is_set(bit) {
                return Ok(());
            }
        }
        Err(ConsoleError::Timeout)
    }

    /// Send one byte. A `b'\n'` is preceded by a `b'\r'`.
    pub fn put(&mut self, byte: u8) -> Result<(), ConsoleError> {
        if byte == b'\n' {
            self.put(b'\r')?;
        }
        self.wait_for(UDRE0)?;
        self.regs.udr.write(byte);
        Ok(())
    }

    /// Receive one byte.
    pub fn get(&mut self) -> Result<u8, ConsoleError> {
        self.wait_for(RXC0)?;
        Ok(self.regs.udr.read())
    }

    /// Send every byte of `bytes`.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), ConsoleError> {
        bytes.iter().try_for_each(|b| self.put(*b))
    }

    /// Release the UART registers.
    pub fn free(self) -> UartRegisters<R> {
        self.regs
    }
}

impl<R: Register8> ufmt::uWrite for Console<R> {
    type Error = ConsoleError;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_bytes(s.as_bytes())
    }
}

impl<R: Register8> core::fmt::Write for Console<R> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}
