use crate::radio::nrf24::{
    bit_fields::{Config, SetupRetry},
    mnemonics,
};
use crate::{DataRate, PaLevel};

/// Default transmission timeout: generous for 250 kbps with the
/// maximum retransmit delay.
const DEFAULT_TX_TIMEOUT_US: u32 = 60_000;

/// An object to configure the radio link.
///
/// This struct follows a builder pattern. Start with [`RadioConfig::default`],
/// then chain the `with_*` methods. The configuration is applied by
/// [`EsbInit::init()`](fn@crate::radio::prelude::EsbInit::init) and is
/// immutable afterwards.
/// ```
/// use nrf24_link::{radio::RadioConfig, DataRate};
///
/// let config = RadioConfig::default()
///     .with_channel(42)
///     .with_data_rate(DataRate::Kbps250);
/// assert_eq!(config.channel(), 42);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RadioConfig {
    pub(crate) config_reg: Config,
    pub(crate) auto_retries: SetupRetry,
    channel: u8,
    data_rate: DataRate,
    pa_level: PaLevel,
    continuous_carrier: bool,
    auto_ack: bool,
    dynamic_payloads: bool,
    rx_address: [u8; 5],
    tx_address: [u8; 5],
    tx_timeout_us: u32,
}

impl Default for RadioConfig {
    /// Instantiate a [`RadioConfig`] object with the link's defaults.
    ///
    /// | feature | default value |
    /// |--------:|:--------------|
    /// | [`RadioConfig::channel()`] | `0x76` |
    /// | [`RadioConfig::data_rate()`] | [`DataRate::Mbps2`] |
    /// | [`RadioConfig::pa_level()`] | [`PaLevel::Max`] |
    /// | [`RadioConfig::continuous_carrier()`] | `false` |
    /// | [`RadioConfig::auto_ack()`] | `false` |
    /// | [`RadioConfig::dynamic_payloads()`] | `true` |
    /// | [`RadioConfig::crc()`] | `true` (16 bit) |
    /// | [`RadioConfig::rx_dr()`] | `true` |
    /// | [`RadioConfig::tx_ds()`] | `false` |
    /// | [`RadioConfig::max_rt()`] | `false` |
    /// | [`RadioConfig::auto_retry_delay()`] | `15` (4000 µs) |
    /// | [`RadioConfig::auto_retry_count()`] | `0` |
    /// | [`RadioConfig::rx_address()`] | `[0xE7; 5]` |
    /// | [`RadioConfig::tx_address()`] | `[0xE7; 5]` |
    /// | [`RadioConfig::tx_timeout_us()`] | `60000` |
    fn default() -> Self {
        Self {
            /*
               - only RX data ready drives the IRQ pin
               - 16 bit CRC
               - powered up as a receiver
            */
            config_reg: Config::new()
                .with_rx_dr(true)
                .with_tx_ds(false)
                .with_max_rt(false)
                .with_en_crc(true)
                .with_crc0(true)
                .with_power(true)
                .with_is_rx(true),
            auto_retries: SetupRetry::new(),
            channel: 0x76,
            data_rate: DataRate::Mbps2,
            pa_level: PaLevel::Max,
            continuous_carrier: false,
            auto_ack: false,
            dynamic_payloads: true,
            rx_address: [0xE7; 5],
            tx_address: [0xE7; 5],
            tx_timeout_us: DEFAULT_TX_TIMEOUT_US,
        }
    }
}

impl RadioConfig {
    /// The highest channel the nRF24L01+ can tune to.
    pub const MAX_CHANNEL: u8 = 125;

    /// Is this configuration acceptable for [`EsbInit::init()`](fn@crate::radio::prelude::EsbInit::init)?
    ///
    /// The channel must be in range [0, 125], and with auto-ack enabled
    /// the TX address must equal the pipe 0 RX address (ACK packets arrive on pipe 0).
    pub fn is_valid(&self) -> bool {
        self.channel <= Self::MAX_CHANNEL && (!self.auto_ack || self.tx_address == self.rx_address)
    }

    /// Returns the value set by [`RadioConfig::with_channel()`].
    pub const fn channel(&self) -> u8 {
        self.channel
    }

    /// The RF channel (2400 + `channel` MHz). Valid range is [0, 125].
    pub fn with_channel(self, channel: u8) -> Self {
        Self { channel, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_data_rate()`].
    pub const fn data_rate(&self) -> DataRate {
        self.data_rate
    }

    pub fn with_data_rate(self, data_rate: DataRate) -> Self {
        Self { data_rate, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_pa_level()`].
    pub const fn pa_level(&self) -> PaLevel {
        self.pa_level
    }

    pub fn with_pa_level(self, pa_level: PaLevel) -> Self {
        Self { pa_level, ..self }
    }

    /// Returns the value set by [`RadioConfig::with_continuous_carrier()`].
    pub const fn continuous_carrier(&self) -> bool {
        self.continuous_carrier
    }

    /// Emit an unmodulated carrier while transmitting (test equipment use only).
    pub fn with_continuous_carrier(self, enable: bool) -> Self {
        Self {
            continuous_carrier: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_auto_ack()`].
    pub const fn auto_ack(&self) -> bool {
        self.auto_ack
    }

    /// Enable auto-acknowledgement on all pipes.
    ///
    /// This also enables ACK payloads and the per-payload "no ACK" flag, and
    /// makes [`EsbLink::read_message()`](fn@crate::radio::prelude::EsbLink::read_message)
    /// queue an ACK payload before reading.
    pub fn with_auto_ack(self, enable: bool) -> Self {
        Self {
            auto_ack: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_dynamic_payloads()`].
    pub const fn dynamic_payloads(&self) -> bool {
        self.dynamic_payloads
    }

    pub fn with_dynamic_payloads(self, enable: bool) -> Self {
        Self {
            dynamic_payloads: enable,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_crc()`].
    pub const fn crc(&self) -> bool {
        self.config_reg.en_crc()
    }

    /// Enable the 16 bit CRC scheme.
    pub fn with_crc(self, enable: bool) -> Self {
        Self {
            config_reg: self.config_reg.with_en_crc(enable).with_crc0(enable),
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_rx_dr()`].
    pub const fn rx_dr(&self) -> bool {
        self.config_reg.rx_dr()
    }

    /// Should the "RX Data Ready" event drive the IRQ pin?
    pub fn with_rx_dr(self, enable: bool) -> Self {
        Self {
            config_reg: self.config_reg.with_rx_dr(enable),
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_tx_ds()`].
    pub const fn tx_ds(&self) -> bool {
        self.config_reg.tx_ds()
    }

    /// Should the "TX Data Sent" event drive the IRQ pin?
    pub fn with_tx_ds(self, enable: bool) -> Self {
        Self {
            config_reg: self.config_reg.with_tx_ds(enable),
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_max_rt()`].
    pub const fn max_rt(&self) -> bool {
        self.config_reg.max_rt()
    }

    /// Should the "maximum retransmits reached" event drive the IRQ pin?
    pub fn with_max_rt(self, enable: bool) -> Self {
        Self {
            config_reg: self.config_reg.with_max_rt(enable),
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_rx_address()`].
    pub const fn rx_address(&self) -> [u8; 5] {
        self.rx_address
    }

    /// The address of RX pipe 0, the only pipe the link listens on.
    pub fn with_rx_address(self, address: [u8; 5]) -> Self {
        Self {
            rx_address: address,
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_tx_address()`].
    pub const fn tx_address(&self) -> [u8; 5] {
        self.tx_address
    }

    pub fn with_tx_address(self, address: [u8; 5]) -> Self {
        Self {
            tx_address: address,
            ..self
        }
    }

    /// Returns the `delay` value set by [`RadioConfig::with_auto_retries()`].
    pub const fn auto_retry_delay(&self) -> u8 {
        self.auto_retries.ard()
    }

    /// Returns the `count` value set by [`RadioConfig::with_auto_retries()`].
    pub const fn auto_retry_count(&self) -> u8 {
        self.auto_retries.arc()
    }

    /// Configure the hardware auto-retransmit.
    ///
    /// - `delay` is clamped to [0, 15]; the wait is `(delay + 1) * 250` µs.
    /// - `count` is clamped to [0, 15].
    pub fn with_auto_retries(self, delay: u8, count: u8) -> Self {
        Self {
            auto_retries: self
                .auto_retries
                .with_ard(delay.min(15))
                .with_arc(count.min(15)),
            ..self
        }
    }

    /// Returns the value set by [`RadioConfig::with_tx_timeout_us()`].
    pub const fn tx_timeout_us(&self) -> u32 {
        self.tx_timeout_us
    }

    /// How long [`EsbLink::send_message()`](fn@crate::radio::prelude::EsbLink::send_message)
    /// waits for the radio to report the outcome of a transmission.
    pub fn with_tx_timeout_us(self, timeout: u32) -> Self {
        Self {
            tx_timeout_us: timeout,
            ..self
        }
    }

    /// The RF_SETUP register value.
    pub(crate) fn rf_setup(&self) -> u8 {
        (self.continuous_carrier as u8 * mnemonics::CONT_WAVE)
            | self.data_rate.into_bits()
            | self.pa_level.into_bits()
    }

    /// The FEATURE register value.
    pub(crate) fn feature(&self) -> u8 {
        (self.dynamic_payloads as u8 * mnemonics::EN_DPL)
            | (self.auto_ack as u8 * (mnemonics::EN_ACK_PAY | mnemonics::EN_DYN_ACK))
    }
}
