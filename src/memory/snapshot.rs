//! Point-in-time memory snapshot
//!
//! A [`MemorySnapshot`] combines process counters with per-device
//! accelerator counters. Snapshots are immutable: the sampler creates
//! them, the monitor and guard consume them, and they are discarded.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Accelerator memory counters for one device.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DeviceMemory {
    /// Bytes currently allocated to live tensors.
    pub allocated_bytes: u64,
    /// Bytes reserved by the allocator, including cached-but-unused blocks.
    pub reserved_bytes: u64,
    /// High-water mark of allocated bytes since process start.
    pub peak_allocated_bytes: u64,
}

/// Immutable record of process and accelerator memory at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct MemorySnapshot {
    /// Physical memory currently occupied by the process.
    pub resident_bytes: u64,
    /// Virtual address-space size of the process.
    pub virtual_bytes: u64,
    /// Resident memory as a percentage of total system memory.
    pub percent_of_system: f64,
    /// Per-device accelerator counters, keyed by device id (e.g. `cuda:0`).
    ///
    /// Empty when no accelerator is present or its counters are
    /// unreadable; that is not an error.
    pub devices: HashMap<String, DeviceMemory>,
    /// Unix timestamp in milliseconds when the snapshot was taken.
    pub timestamp_ms: u64,
}

impl MemorySnapshot {
    /// Build a snapshot stamped with the current wall-clock time.
    pub fn new(
        resident_bytes: u64,
        virtual_bytes: u64,
        percent_of_system: f64,
        devices: HashMap<String, DeviceMemory>,
    ) -> Self {
        Self {
            resident_bytes,
            virtual_bytes,
            percent_of_system,
            devices,
            timestamp_ms: now_timestamp_ms(),
        }
    }

    /// Resident memory in GiB.
    pub fn resident_gib(&self) -> f64 {
        self.resident_bytes as f64 / GIB
    }

    /// Virtual memory in GiB.
    pub fn virtual_gib(&self) -> f64 {
        self.virtual_bytes as f64 / GIB
    }

    /// Total allocated accelerator bytes across all devices.
    pub fn accelerator_allocated_bytes(&self) -> u64 {
        self.devices.values().map(|d| d.allocated_bytes).sum()
    }
}

/// Current wall-clock time as Unix milliseconds.
pub fn now_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_units() {
        let snapshot = MemorySnapshot::new(2 * 1024 * 1024 * 1024, 4 * 1024 * 1024 * 1024, 12.5, HashMap::new());
        assert!((snapshot.resident_gib() - 2.0).abs() < 1e-9);
        assert!((snapshot.virtual_gib() - 4.0).abs() < 1e-9);
        assert_eq!(snapshot.accelerator_allocated_bytes(), 0);
        assert!(snapshot.timestamp_ms > 0);
    }

    #[test]
    fn test_accelerator_totals() {
        let mut devices = HashMap::new();
        devices.insert(
            "cuda:0".to_string(),
            DeviceMemory {
                allocated_bytes: 100,
                reserved_bytes: 200,
                peak_allocated_bytes: 150,
            },
        );
        devices.insert(
            "cuda:1".to_string(),
            DeviceMemory {
                allocated_bytes: 50,
                ..Default::default()
            },
        );
        let snapshot = MemorySnapshot::new(0, 0, 0.0, devices);
        assert_eq!(snapshot.accelerator_allocated_bytes(), 150);
    }
}
