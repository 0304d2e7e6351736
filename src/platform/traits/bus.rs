//! Bus transport trait
//!
//! This module defines the byte-oriented I2C primitives the controller wraps.
//! The shape follows the usual controller-side driver model: a write is
//! staged with `begin_transmission`/`write` and sent by `end_transmission`,
//! a read is performed eagerly by `request_from` and drained with `read`.

/// I2C bus transport
///
/// Implementations perform the actual bus traffic. The controller only
/// observes outcome codes, received byte counts and elapsed time.
///
/// # Outcome Codes
///
/// `end_transmission` returns:
///
/// | Code | Meaning |
/// |------|---------|
/// | 0 | Acknowledged |
/// | 1 | No response (buffer overflow, timeout) |
/// | 2 | Address not acknowledged |
/// | 3 | Data byte not acknowledged |
/// | 4 | Other bus error |
///
/// # Invariants
///
/// - Addresses are 7-bit (valid range: 0x00..=0x7F)
/// - Only one owner per bus instance; the controller holds it exclusively
pub trait BusTransport {
    /// Initialize the bus in controller role
    fn begin(&mut self);

    /// Initialize the bus in target role at `address`
    ///
    /// Transports without target support fall back to controller role.
    fn begin_as_target(&mut self, address: u8) {
        let _ = address;
        self.begin();
    }

    /// Shut the bus down
    fn end(&mut self);

    /// Start staging a write to `address`
    fn begin_transmission(&mut self, address: u8);

    /// Send the staged write and return its outcome code
    fn end_transmission(&mut self, send_stop: bool) -> u8;

    /// Read up to `count` bytes from `address`
    ///
    /// Returns the number of bytes received; `0` means the read failed.
    fn request_from(&mut self, address: u8, count: u8, send_stop: bool) -> u8;

    /// Stage one byte, returning the number of bytes accepted
    fn write(&mut self, byte: u8) -> usize;

    /// Stage a slice, returning the number of bytes accepted
    fn write_all(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.write(byte) == 0 {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// Bytes received and not yet read
    fn available(&self) -> usize;

    /// Take the next received byte
    fn read(&mut self) -> Option<u8>;

    /// Look at the next received byte without consuming it
    fn peek(&self) -> Option<u8>;

    /// Wait for staged output to drain
    fn flush(&mut self);

    /// Program the bus clock frequency in Hz
    fn set_clock(&mut self, hz: u32);

    /// Program rise-time compensation in nanoseconds
    ///
    /// Returns `false` when the hardware has no such control, which is the
    /// default. The controller still tracks the value.
    fn set_rise_time(&mut self, ns: u32) -> bool {
        let _ = ns;
        false
    }
}
