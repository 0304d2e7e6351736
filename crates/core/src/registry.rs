//! Device registry
//!
//! Bounded set of per-address entries, each owning a timing snapshot (its
//! own metrics plus an optional timing override). Entries are created lazily
//! when an unseen address is used or explicitly on registration, removed
//! only explicitly, and never evicted.

use core::fmt;

use heapless::Vec;

use crate::range::ParameterRange;
use crate::snapshot::TimingSnapshot;

/// Maximum number of tracked devices
pub const MAX_DEVICES: usize = 16;

/// Highest valid 7-bit bus address
pub const MAX_ADDRESS: u8 = 0x7F;

/// Per-device configuration and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceEntry {
    /// 7-bit bus address (unique key)
    pub address: u8,
    /// Device timing and its metrics
    pub config: TimingSnapshot,
    /// `config` timing overrides the global configuration for this device
    pub has_override: bool,
}

impl DeviceEntry {
    /// Timing to force before talking to this device, if overridden
    pub fn override_timing(&self) -> Option<&TimingSnapshot> {
        self.has_override.then_some(&self.config)
    }
}

/// Registry errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// Registry holds `MAX_DEVICES` entries
    Full,
    /// Address already registered
    AlreadyPresent,
    /// Address outside the 7-bit range
    InvalidAddress,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Full => write!(f, "device registry full"),
            RegistryError::AlreadyPresent => write!(f, "device already registered"),
            RegistryError::InvalidAddress => write!(f, "invalid 7-bit address"),
        }
    }
}

/// Fixed-capacity set of device entries keyed by address
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    entries: Vec<DeviceEntry, MAX_DEVICES>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Look up an entry by address
    pub fn find(&self, address: u8) -> Option<&DeviceEntry> {
        self.entries.iter().find(|e| e.address == address)
    }

    /// Look up an entry by address for modification
    pub fn find_mut(&mut self, address: u8) -> Option<&mut DeviceEntry> {
        self.entries.iter_mut().find(|e| e.address == address)
    }

    /// Insert a new entry seeded with a copy of `seed`, override off
    pub fn add(&mut self, address: u8, seed: &TimingSnapshot) -> Result<(), RegistryError> {
        if address > MAX_ADDRESS {
            return Err(RegistryError::InvalidAddress);
        }
        if self.find(address).is_some() {
            return Err(RegistryError::AlreadyPresent);
        }
        self.entries
            .push(DeviceEntry {
                address,
                config: *seed,
                has_override: false,
            })
            .map_err(|_| RegistryError::Full)
    }

    /// Return the entry for `address`, creating it from `seed` when absent
    ///
    /// Returns `None` only when the registry is full or the address invalid.
    pub fn find_or_add(&mut self, address: u8, seed: &TimingSnapshot) -> Option<&mut DeviceEntry> {
        if self.find(address).is_none() {
            self.add(address, seed).ok()?;
        }
        self.find_mut(address)
    }

    /// Remove an entry, keeping the relative order of the rest
    ///
    /// Returns `false` when the address was not registered.
    pub fn remove(&mut self, address: u8) -> bool {
        match self.entries.iter().position(|e| e.address == address) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Install a timing override for `address`, creating the entry if needed
    ///
    /// Values are converted to the nearest valid steps of the given ranges.
    pub fn set_override(
        &mut self,
        address: u8,
        clock_hz: u32,
        rise_ns: u32,
        clock: &ParameterRange,
        rise: &ParameterRange,
        seed: &TimingSnapshot,
    ) -> Result<(), RegistryError> {
        if address > MAX_ADDRESS {
            return Err(RegistryError::InvalidAddress);
        }
        let entry = self.find_or_add(address, seed).ok_or(RegistryError::Full)?;
        let clock_step = clock.value_to_step(clock_hz);
        let rise_step = rise.value_to_step(rise_ns);
        entry.config.set_timing(
            clock_step,
            rise_step,
            clock.step_to_value(clock_step),
            rise.step_to_value(rise_step),
        );
        entry.has_override = true;
        Ok(())
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &DeviceEntry> {
        self.entries.iter()
    }

    /// Registered addresses in insertion order
    pub fn addresses(&self) -> Vec<u8, MAX_DEVICES> {
        self.entries.iter().map(|e| e.address).collect()
    }

    /// Number of registered devices
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no device is registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if the registry reached its capacity
    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }
}
