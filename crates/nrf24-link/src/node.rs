//! The receive-then-reply node.
//!
//! After [`Node::start()`] the node prints the radio's configuration and
//! listens. Each time the IRQ handler flags a receipt, [`Node::poll()`]
//! reads the message, prints it on the console and answers with the
//! reply message.

use ufmt::{uWrite, uwrite};

use crate::{
    irq::PendingReceipt,
    radio::prelude::{EsbDetails, EsbInit, EsbLink},
};

/// The message sent back for every message received.
pub const DEFAULT_REPLY: &[u8] = b"Hello World!";

/// Errors raised by a [`Node`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeError<R, W> {
    Radio(R),
    Console(W),
}

#[cfg(feature = "defmt")]
impl<R: defmt::Format, W: defmt::Format> defmt::Format for NodeError<R, W> {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            NodeError::Radio(e) => defmt::write!(fmt, "radio: {}", e),
            NodeError::Console(e) => defmt::write!(fmt, "console: {}", e),
        }
    }
}

pub struct Node<RADIO, W> {
    radio: RADIO,
    console: W,
    reply: &'static [u8],
}

impl<RADIO, E, W> Node<RADIO, W>
where
    RADIO: EsbInit<ConfigErrorType = E> + EsbLink<LinkErrorType = E> + EsbDetails<DetailsErrorType = E>,
    W: uWrite,
{
    pub fn new(radio: RADIO, console: W) -> Self {
        Self {
            radio,
            console,
            reply: DEFAULT_REPLY,
        }
    }

    /// Answer with `reply` instead of [`DEFAULT_REPLY`].
    pub fn with_reply(self, reply: &'static [u8]) -> Self {
        Self { reply, ..self }
    }

    /// Configure the radio, print its configuration and start listening.
    pub fn start(&mut self) -> Result<(), NodeError<E, W::Error>> {
        self.radio.init().map_err(NodeError::Radio)?;
        let details = self.radio.details().map_err(NodeError::Radio)?;
        uwrite!(&mut self.console, "{}\n", details).map_err(NodeError::Console)?;
        self.radio.start_listening().map_err(NodeError::Radio)
    }

    /// Handle one pending receipt, if any.
    ///
    /// Returns `Ok(true)` when a receipt was consumed (and the reply sent).
    pub fn poll(&mut self, receipt: &PendingReceipt) -> Result<bool, NodeError<E, W::Error>> {
        if !receipt.take() {
            return Ok(false);
        }
        let message = self.radio.read_message().map_err(NodeError::Radio)?;
        self.console
            .write_str("Received message: ")
            .map_err(NodeError::Console)?;
        match message {
            Some(text) => self
                .console
                .write_str(printable(text))
                .map_err(NodeError::Console)?,
            None => self
                .console
                .write_str("failed")
                .map_err(NodeError::Console)?,
        }
        self.console.write_str("\n").map_err(NodeError::Console)?;
        self.radio
            .send_message(self.reply)
            .map_err(NodeError::Radio)?;
        Ok(true)
    }

    pub fn radio(&mut self) -> &mut RADIO {
        &mut self.radio
    }

    /// Release the radio and the console.
    pub fn free(self) -> (RADIO, W) {
        (self.radio, self.console)
    }
}

/// The longest UTF-8 prefix of `text`.
fn printable(text: &[u8]) -> &str {
    match core::str::from_utf8(text) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&text[..e.valid_up_to()]).unwrap_or_default(),
    }
}
