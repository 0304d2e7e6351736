//! embedded-hal I2C adapter
//!
//! Adapts any blocking [`embedded_hal::i2c::I2c`] bus to [`BusTransport`].
//! Writes are staged in a fixed buffer and sent as one transfer by
//! `end_transmission`; reads are performed by `request_from` into a receive
//! buffer that `read`/`peek` drain.
//!
//! # Clock Changes
//!
//! embedded-hal has no runtime frequency control. `set_clock` records the
//! requested frequency and invokes the optional reconfiguration hook, which
//! is where a HAL-specific driver reprograms its peripheral.
//!
//! # Example
//!
//! ```ignore
//! use smart_i2c::platform::HalBus;
//! use smart_i2c::SmartI2c;
//!
//! let bus = HalBus::new(i2c, 100_000).with_clock_hook(|hz| reconfigure(hz));
//! let mut controller = SmartI2c::with_defaults(bus, time);
//! controller.start();
//! ```

use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use heapless::Vec;

use smart_i2c_core::fault::OUTCOME_SUCCESS;

use crate::platform::error::{NackSource, TransportError};
use crate::platform::traits::BusTransport;

/// Staged transmit buffer size in bytes
pub const TX_BUFFER_SIZE: usize = 32;

/// Receive buffer size in bytes
pub const RX_BUFFER_SIZE: usize = 32;

/// [`BusTransport`] over a blocking embedded-hal I2C bus
pub struct HalBus<I2C> {
    i2c: I2C,
    target: u8,
    tx: Vec<u8, TX_BUFFER_SIZE>,
    tx_overflow: bool,
    rx: Vec<u8, RX_BUFFER_SIZE>,
    rx_pos: usize,
    clock_hz: u32,
    clock_hook: Option<fn(u32)>,
    last_error: Option<TransportError>,
}

impl<I2C: I2c> HalBus<I2C> {
    /// Wrap `i2c`, which the caller configured for `clock_hz`
    pub fn new(i2c: I2C, clock_hz: u32) -> Self {
        Self {
            i2c,
            target: 0,
            tx: Vec::new(),
            tx_overflow: false,
            rx: Vec::new(),
            rx_pos: 0,
            clock_hz,
            clock_hook: None,
            last_error: None,
        }
    }

    /// Call `hook` with the new frequency whenever the clock is reprogrammed
    pub fn with_clock_hook(mut self, hook: fn(u32)) -> Self {
        self.clock_hook = Some(hook);
        self
    }

    /// Most recently requested clock frequency in Hz
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Error from the most recent failed transfer
    pub fn last_error(&self) -> Option<TransportError> {
        self.last_error
    }

    /// Give back the wrapped bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> BusTransport for HalBus<I2C> {
    fn begin(&mut self) {
        self.tx.clear();
        self.tx_overflow = false;
        self.rx.clear();
        self.rx_pos = 0;
        self.last_error = None;
    }

    fn end(&mut self) {
        self.tx.clear();
        self.rx.clear();
        self.rx_pos = 0;
    }

    fn begin_transmission(&mut self, address: u8) {
        self.target = address;
        self.tx.clear();
        self.tx_overflow = false;
    }

    fn end_transmission(&mut self, _send_stop: bool) -> u8 {
        // A blocking embedded-hal write always ends with STOP
        if self.tx_overflow {
            self.last_error = Some(TransportError::BufferFull);
            return TransportError::BufferFull.outcome_code();
        }
        match self.i2c.write(self.target, &self.tx) {
            Ok(()) => OUTCOME_SUCCESS,
            Err(e) => {
                let error = map_hal_error(e.kind());
                self.last_error = Some(error);
                error.outcome_code()
            }
        }
    }

    fn request_from(&mut self, address: u8, count: u8, _send_stop: bool) -> u8 {
        let len = (count as usize).min(RX_BUFFER_SIZE);
        self.rx.clear();
        self.rx_pos = 0;
        if self.rx.resize(len, 0).is_err() {
            return 0;
        }
        match self.i2c.read(address, &mut self.rx) {
            Ok(()) => len as u8,
            Err(e) => {
                self.last_error = Some(map_hal_error(e.kind()));
                self.rx.clear();
                0
            }
        }
    }

    fn write(&mut self, byte: u8) -> usize {
        match self.tx.push(byte) {
            Ok(()) => 1,
            Err(_) => {
                self.tx_overflow = true;
                0
            }
        }
    }

    fn available(&self) -> usize {
        self.rx.len() - self.rx_pos
    }

    fn read(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.rx_pos += 1;
        Some(byte)
    }

    fn peek(&self) -> Option<u8> {
        self.rx.get(self.rx_pos).copied()
    }

    fn flush(&mut self) {
        // Transfers complete synchronously in end_transmission
    }

    fn set_clock(&mut self, hz: u32) {
        self.clock_hz = hz;
        if let Some(hook) = self.clock_hook {
            hook(hz);
        }
    }
}

/// Map embedded-hal I2C errors to transport errors
fn map_hal_error(kind: ErrorKind) -> TransportError {
    match kind {
        ErrorKind::NoAcknowledge(source) => TransportError::Nack(match source {
            NoAcknowledgeSource::Address => NackSource::Address,
            NoAcknowledgeSource::Data => NackSource::Data,
            _ => NackSource::Unknown,
        }),
        ErrorKind::ArbitrationLoss => TransportError::ArbitrationLoss,
        ErrorKind::Bus => TransportError::Bus,
        ErrorKind::Overrun => TransportError::Overrun,
        _ => TransportError::Other,
    }
}
