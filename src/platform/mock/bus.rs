//! Mock bus transport for testing

use std::collections::VecDeque;
use std::vec::Vec;

use smart_i2c_core::fault::{OUTCOME_NACK_ADDRESS, OUTCOME_NACK_DATA, OUTCOME_SUCCESS};

use crate::platform::traits::BusTransport;

/// Bus call type for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusCall {
    /// Bus initialized in controller role
    Begin,
    /// Bus initialized in target role
    BeginAsTarget(u8),
    /// Bus shut down
    End,
    /// Write staged for an address
    BeginTransmission(u8),
    /// Staged write sent
    EndTransmission { address: u8, outcome: u8 },
    /// Read performed
    RequestFrom { address: u8, count: u8, received: u8 },
    /// Clock reprogrammed
    SetClock(u32),
    /// Rise-time compensation reprogrammed
    SetRiseTime(u32),
}

/// Mock bus transport
///
/// Simulates a set of devices that acknowledge their address. Outcomes can
/// be scripted per call, and the bus can be made to fail data transfers
/// while the programmed timing is outside a healthy window, which lets
/// tests exercise tuning and scanning end to end.
#[derive(Debug)]
pub struct MockBus {
    calls: Vec<BusCall>,
    present: [bool; 128],
    scripted: VecDeque<u8>,
    read_data: VecDeque<u8>,
    rx: VecDeque<u8>,
    staged: Vec<u8>,
    target: u8,
    clock_hz: u32,
    rise_ns: u32,
    max_clock_hz: Option<u32>,
    min_rise_ns: Option<u32>,
    rise_supported: bool,
    active: bool,
}

impl Default for MockBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBus {
    /// Create an empty bus with no devices attached
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            present: [false; 128],
            scripted: VecDeque::new(),
            read_data: VecDeque::new(),
            rx: VecDeque::new(),
            staged: Vec::new(),
            target: 0,
            clock_hz: 0,
            rise_ns: 0,
            max_clock_hz: None,
            min_rise_ns: None,
            rise_supported: true,
            active: false,
        }
    }

    /// Create a bus with devices at `addresses`
    pub fn with_devices(addresses: &[u8]) -> Self {
        let mut bus = Self::new();
        for &address in addresses {
            bus.add_device(address);
        }
        bus
    }

    /// Attach a device at `address`
    pub fn add_device(&mut self, address: u8) {
        if let Some(slot) = self.present.get_mut(address as usize) {
            *slot = true;
        }
    }

    /// Detach the device at `address`
    pub fn remove_device(&mut self, address: u8) {
        if let Some(slot) = self.present.get_mut(address as usize) {
            *slot = false;
        }
    }

    /// Queue an outcome code for the next transfer, overriding simulation
    pub fn push_outcome(&mut self, code: u8) {
        self.scripted.push_back(code);
    }

    /// Queue several outcome codes
    pub fn push_outcomes(&mut self, codes: &[u8]) {
        self.scripted.extend(codes.iter().copied());
    }

    /// Set data to return for read operations
    pub fn set_read_data(&mut self, data: &[u8]) {
        self.read_data = data.iter().copied().collect();
    }

    /// Fail transfers with a data NACK while the clock is above `hz`
    pub fn fail_above_clock(&mut self, hz: u32) {
        self.max_clock_hz = Some(hz);
    }

    /// Fail transfers with a data NACK while rise time is below `ns`
    pub fn fail_below_rise(&mut self, ns: u32) {
        self.min_rise_ns = Some(ns);
    }

    /// Choose whether rise-time programming is reported as supported
    pub fn set_rise_supported(&mut self, supported: bool) {
        self.rise_supported = supported;
    }

    /// Get call log (for test verification)
    pub fn calls(&self) -> &[BusCall] {
        &self.calls
    }

    /// Clear call log
    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of clock reprogramming calls logged
    pub fn clock_changes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BusCall::SetClock(_)))
            .count()
    }

    /// Bytes sent by the most recent write
    pub fn last_written(&self) -> &[u8] {
        &self.staged
    }

    /// Get current clock frequency
    pub fn clock_hz(&self) -> u32 {
        self.clock_hz
    }

    /// Get current rise time
    pub fn rise_ns(&self) -> u32 {
        self.rise_ns
    }

    /// Check whether the bus is initialized
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn timing_healthy(&self) -> bool {
        let clock_ok = self.max_clock_hz.map_or(true, |max| self.clock_hz <= max);
        let rise_ok = self.min_rise_ns.map_or(true, |min| self.rise_ns >= min);
        clock_ok && rise_ok
    }

    fn outcome_for(&mut self, address: u8) -> u8 {
        if let Some(code) = self.scripted.pop_front() {
            return code;
        }
        let present = self.present.get(address as usize).copied().unwrap_or(false);
        if !present {
            OUTCOME_NACK_ADDRESS
        } else if !self.timing_healthy() {
            OUTCOME_NACK_DATA
        } else {
            OUTCOME_SUCCESS
        }
    }
}

impl BusTransport for MockBus {
    fn begin(&mut self) {
        self.active = true;
        self.calls.push(BusCall::Begin);
    }

    fn begin_as_target(&mut self, address: u8) {
        self.active = true;
        self.calls.push(BusCall::BeginAsTarget(address));
    }

    fn end(&mut self) {
        self.active = false;
        self.calls.push(BusCall::End);
    }

    fn begin_transmission(&mut self, address: u8) {
        self.target = address;
        self.staged.clear();
        self.calls.push(BusCall::BeginTransmission(address));
    }

    fn end_transmission(&mut self, _send_stop: bool) -> u8 {
        let outcome = self.outcome_for(self.target);
        self.calls.push(BusCall::EndTransmission {
            address: self.target,
            outcome,
        });
        outcome
    }

    fn request_from(&mut self, address: u8, count: u8, _send_stop: bool) -> u8 {
        self.rx.clear();
        let received = if self.outcome_for(address) == OUTCOME_SUCCESS {
            for _ in 0..count {
                let byte = self.read_data.pop_front().unwrap_or(0xFF);
                self.rx.push_back(byte);
            }
            count
        } else {
            0
        };
        self.calls.push(BusCall::RequestFrom {
            address,
            count,
            received,
        });
        received
    }

    fn write(&mut self, byte: u8) -> usize {
        self.staged.push(byte);
        1
    }

    fn available(&self) -> usize {
        self.rx.len()
    }

    fn read(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }

    fn peek(&self) -> Option<u8> {
        self.rx.front().copied()
    }

    fn flush(&mut self) {}

    fn set_clock(&mut self, hz: u32) {
        self.clock_hz = hz;
        self.calls.push(BusCall::SetClock(hz));
    }

    fn set_rise_time(&mut self, ns: u32) -> bool {
        if !self.rise_supported {
            return false;
        }
        self.rise_ns = ns;
        self.calls.push(BusCall::SetRiseTime(ns));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_i2c_core::fault::OUTCOME_OTHER;

    #[test]
    fn test_present_device_acknowledges() {
        let mut bus = MockBus::with_devices(&[0x48]);
        bus.begin_transmission(0x48);
        bus.write_all(&[0x01, 0x02]);
        assert_eq!(bus.end_transmission(true), OUTCOME_SUCCESS);
        assert_eq!(bus.last_written(), &[0x01, 0x02]);
        assert_eq!(
            bus.calls().last(),
            Some(&BusCall::EndTransmission {
                address: 0x48,
                outcome: OUTCOME_SUCCESS
            })
        );
    }

    #[test]
    fn test_absent_device_nacks_address() {
        let mut bus = MockBus::with_devices(&[0x48]);
        bus.begin_transmission(0x20);
        assert_eq!(bus.end_transmission(true), OUTCOME_NACK_ADDRESS);
    }

    #[test]
    fn test_scripted_outcomes_take_precedence() {
        let mut bus = MockBus::with_devices(&[0x48]);
        bus.push_outcomes(&[OUTCOME_OTHER, OUTCOME_SUCCESS]);
        bus.begin_transmission(0x48);
        assert_eq!(bus.end_transmission(true), OUTCOME_OTHER);
        bus.begin_transmission(0x20);
        assert_eq!(bus.end_transmission(true), OUTCOME_SUCCESS);
        bus.begin_transmission(0x20);
        assert_eq!(bus.end_transmission(true), OUTCOME_NACK_ADDRESS);
    }

    #[test]
    fn test_unhealthy_timing_nacks_data() {
        let mut bus = MockBus::with_devices(&[0x48]);
        bus.fail_above_clock(400_000);
        bus.set_clock(1_000_000);
        bus.begin_transmission(0x48);
        assert_eq!(bus.end_transmission(true), OUTCOME_NACK_DATA);

        bus.set_clock(400_000);
        bus.begin_transmission(0x48);
        assert_eq!(bus.end_transmission(true), OUTCOME_SUCCESS);
        assert_eq!(bus.clock_changes(), 2);
    }

    #[test]
    fn test_rise_window() {
        let mut bus = MockBus::with_devices(&[0x48]);
        bus.fail_below_rise(100);
        assert!(bus.set_rise_time(80));
        bus.begin_transmission(0x48);
        assert_eq!(bus.end_transmission(true), OUTCOME_NACK_DATA);

        bus.set_rise_supported(false);
        assert!(!bus.set_rise_time(200));
        assert_eq!(bus.rise_ns(), 80);
    }

    #[test]
    fn test_request_from_fills_receive_buffer() {
        let mut bus = MockBus::with_devices(&[0x48]);
        bus.set_read_data(&[0xAA, 0xBB]);
        assert_eq!(bus.request_from(0x48, 3, true), 3);
        assert_eq!(bus.available(), 3);
        assert_eq!(bus.peek(), Some(0xAA));
        assert_eq!(bus.read(), Some(0xAA));
        assert_eq!(bus.read(), Some(0xBB));
        assert_eq!(bus.read(), Some(0xFF));
        assert_eq!(bus.read(), None);
    }

    #[test]
    fn test_request_from_absent_device() {
        let mut bus = MockBus::new();
        assert_eq!(bus.request_from(0x48, 2, true), 0);
        assert_eq!(bus.available(), 0);
    }

    #[test]
    fn test_lifecycle_calls() {
        let mut bus = MockBus::new();
        bus.begin();
        assert!(bus.is_active());
        bus.end();
        assert!(!bus.is_active());
        bus.begin_as_target(0x30);
        assert_eq!(
            bus.calls(),
            &[BusCall::Begin, BusCall::End, BusCall::BeginAsTarget(0x30)]
        );
    }
}
