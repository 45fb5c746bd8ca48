//! This module defines the value types shared by the radio driver,
//! its configuration and the console output.

use core::fmt::{Display, Formatter, Result};

use bitfield_struct::bitfield;

/// Implements [`Display`], [`ufmt::uDisplay`] and (optionally) `defmt::Format`
/// for a type with a `const fn as_str(&self) -> &'static str`.
macro_rules! display_as_str {
    ($t:ty) => {
        impl Display for $t {
            fn fmt(&self, f: &mut Formatter<'_>) -> Result {
                f.write_str(self.as_str())
            }
        }

        impl ufmt::uDisplay for $t {
            fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> core::result::Result<(), W::Error>
            where
                W: ufmt::uWrite + ?Sized,
            {
                f.write_str(self.as_str())
            }
        }

        #[cfg(feature = "defmt")]
        impl defmt::Format for $t {
            fn format(&self, fmt: defmt::Formatter) {
                defmt::write!(fmt, "{=str}", self.as_str())
            }
        }
    };
}

/// Power Amplifier level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaLevel {
    /// -18 dBm
    Min,
    /// -12 dBm
    Low,
    /// -6 dBm
    High,
    /// 0 dBm
    Max,
}

impl PaLevel {
    pub(crate) const MASK: u8 = 6;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            PaLevel::Min => 0,
            PaLevel::Low => 2,
            PaLevel::High => 4,
            PaLevel::Max => 6,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0 => PaLevel::Min,
            2 => PaLevel::Low,
            4 => PaLevel::High,
            _ => PaLevel::Max,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaLevel::Min => "Min",
            PaLevel::Low => "Low",
            PaLevel::High => "High",
            PaLevel::Max => "Max",
        }
    }
}

display_as_str!(PaLevel);

/// How fast data moves through the air. Units are in bits per second (bps).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataRate {
    /// represents 1 Mbps
    Mbps1,
    /// represents 2 Mbps
    Mbps2,
    /// represents 250 Kbps
    Kbps250,
}

impl DataRate {
    pub(crate) const MASK: u8 = 0x28;

    pub(crate) const fn into_bits(self) -> u8 {
        match self {
            DataRate::Mbps1 => 0,
            DataRate::Mbps2 => 0x8,
            DataRate::Kbps250 => 0x20,
        }
    }

    pub(crate) const fn from_bits(value: u8) -> Self {
        match value & Self::MASK {
            0x8 => DataRate::Mbps2,
            0x20 => DataRate::Kbps250,
            _ => DataRate::Mbps1,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DataRate::Mbps1 => "1 Mbps",
            DataRate::Mbps2 => "2 Mbps",
            DataRate::Kbps250 => "250 Kbps",
        }
    }
}

display_as_str!(DataRate);

/// The possible states of a FIFO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FifoState {
    /// Represent the state of a FIFO when it is full.
    Full,
    /// Represent the state of a FIFO when it is empty.
    Empty,
    /// Represent the state of a FIFO when it is not full but not empty either.
    Occupied,
}

impl FifoState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            FifoState::Full => "Full",
            FifoState::Empty => "Empty",
            FifoState::Occupied => "Occupied",
        }
    }
}

display_as_str!(FifoState);

/// The operating modes of the transceiver, as tracked by the driver.
///
/// | state | PWR_UP | PRIM_RX | CE |
/// |-------|:------:|:-------:|:--:|
/// | `PowerDown` | 0 | - | - |
/// | `PowerUp` | 1 | - | - |
/// | `StandbyI` | 1 | - | low |
/// | `StandbyII` | 1 | 0 | high |
/// | `Receiving` | 1 | 1 | high once listening |
/// | `Transmitting` | 1 | 0 | pulsed |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperatingState {
    PowerDown,
    PowerUp,
    StandbyI,
    StandbyII,
    Receiving,
    Transmitting,
}

impl OperatingState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OperatingState::PowerDown => "PowerDown",
            OperatingState::PowerUp => "PowerUp",
            OperatingState::StandbyI => "StandbyI",
            OperatingState::StandbyII => "StandbyII",
            OperatingState::Receiving => "Receiving",
            OperatingState::Transmitting => "Transmitting",
        }
    }
}

display_as_str!(OperatingState);

/// The interrupt events reported in the STATUS register.
///
/// ```
/// use nrf24_link::StatusFlags;
///
/// let flags = StatusFlags::default() // all flags are false
///     .with_rx_dr(true); // assert only `rx_dr` flags
/// assert!(flags.rx_dr());
/// ```
/// Use [`StatusFlags::default`] to instantiate all flags set to false.
/// Use [`StatusFlags::all`] to instantiate all flags set to true.
#[bitfield(u8, new = false, order = Msb)]
#[derive(PartialEq, Eq)]
pub struct StatusFlags {
    #[bits(1)]
    _padding: u8,

    /// RX data ready.
    #[bits(1, access = RO)]
    pub rx_dr: bool,

    /// TX data sent.
    #[bits(1, access = RO)]
    pub tx_ds: bool,

    /// Maximum number of retransmits reached.
    #[bits(1, access = RO)]
    pub max_rt: bool,

    /// Pipe number of the payload at the head of the RX FIFO (7 when empty).
    #[bits(3, access = RO)]
    pub rx_pipe: u8,

    #[bits(1, access = RO)]
    pub tx_full: bool,
}

impl StatusFlags {
    /// A mask to isolate only the IRQ flags. Useful for STATUS and CONFIG registers.
    pub(crate) const IRQ_MASK: u8 = 0x70;

    /// All three event flags set.
    pub fn all() -> Self {
        Self::from_bits(Self::IRQ_MASK)
    }

    fn with_flag(self, offset: usize, flag: bool) -> Self {
        let bits = self.into_bits() & !(1 << offset);
        Self::from_bits(bits | ((flag as u8) << offset))
    }

    pub fn with_rx_dr(self, flag: bool) -> Self {
        self.with_flag(Self::RX_DR_OFFSET, flag)
    }

    pub fn with_tx_ds(self, flag: bool) -> Self {
        self.with_flag(Self::TX_DS_OFFSET, flag)
    }

    pub fn with_max_rt(self, flag: bool) -> Self {
        self.with_flag(Self::MAX_RT_OFFSET, flag)
    }
}

impl Display for StatusFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "StatusFlags rx_dr: {}, tx_ds: {}, max_rt: {}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt()
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for StatusFlags {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "StatusFlags rx_dr: {=bool}, tx_ds: {=bool}, max_rt: {=bool}",
            self.rx_dr(),
            self.tx_ds(),
            self.max_rt()
        )
    }
}
