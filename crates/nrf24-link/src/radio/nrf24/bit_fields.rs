use bitfield_struct::bitfield;

use super::mnemonics;

/// The CONFIG register.
///
/// The IRQ bits are stored inverted (a set bit masks the event), so the
/// public accessors speak in terms of "enabled" events.
#[bitfield(u8, order = Msb)]
pub(crate) struct Config {
    #[bits(1)]
    _padding: u8,

    #[bits(1, access = None)]
    mask_rx_dr: bool,

    #[bits(1, access = None)]
    mask_tx_ds: bool,

    #[bits(1, access = None)]
    mask_max_rt: bool,

    pub en_crc: bool,

    /// 16-bit CRC when set, 8-bit otherwise.
    pub crc0: bool,

    pub power: bool,

    pub is_rx: bool,
}

impl Config {
    const fn with_mask(self, mask: u8, enable: bool) -> Self {
        Self::from_bits(self.into_bits() & !mask | ((!enable as u8) * mask))
    }

    pub const fn rx_dr(&self) -> bool {
        (self.into_bits() & mnemonics::MASK_RX_DR) == 0
    }

    pub const fn with_rx_dr(self, enable: bool) -> Self {
        self.with_mask(mnemonics::MASK_RX_DR, enable)
    }

    pub const fn tx_ds(&self) -> bool {
        (self.into_bits() & mnemonics::MASK_TX_DS) == 0
    }

    pub const fn with_tx_ds(self, enable: bool) -> Self {
        self.with_mask(mnemonics::MASK_TX_DS, enable)
    }

    pub const fn max_rt(&self) -> bool {
        (self.into_bits() & mnemonics::MASK_MAX_RT) == 0
    }

    pub const fn with_max_rt(self, enable: bool) -> Self {
        self.with_mask(mnemonics::MASK_MAX_RT, enable)
    }
}

/// The SETUP_RETR register.
#[bitfield(u8, order = Msb)]
pub(crate) struct SetupRetry {
    /// Auto retransmit delay, in steps of 250 µs (`(ard + 1) * 250`).
    #[bits(4, default = 15)]
    pub ard: u8,

    /// Auto retransmit count.
    #[bits(4, default = 0)]
    pub arc: u8,
}

impl SetupRetry {
    pub const fn delay_us(&self) -> u16 {
        (self.ard() as u16 + 1) * 250
    }
}
