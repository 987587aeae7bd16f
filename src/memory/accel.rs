//! Accelerator device bridge
//!
//! Abstracts the accelerator runtime behind a small capability trait so
//! the sampler and the reclaimer stay testable on hosts without a GPU.
//! The default implementations describe a machine with no accelerator.

use std::collections::HashMap;

use candle_core::{Device, DeviceLocation};
use tracing::{debug, warn};

use crate::memory::snapshot::DeviceMemory;

/// Capability interface over the accelerator runtime.
pub trait AcceleratorBridge: Send + Sync {
    /// Per-device memory counters, keyed by device id.
    ///
    /// Returns an empty map when no device is present or the backend does
    /// not expose counters; never errors.
    fn device_memory(&self) -> HashMap<String, DeviceMemory> {
        HashMap::new()
    }

    /// Release cached-but-unused device allocations.
    ///
    /// Returns the number of blocks released; 0 when there is nothing to
    /// release.
    fn purge(&self) -> usize {
        0
    }

    /// Block until every visible device has drained in-flight work.
    fn synchronize(&self) {}

    /// Number of visible accelerator devices.
    fn device_count(&self) -> usize {
        0
    }
}

/// Bridge for hosts without any accelerator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAccelerator;

impl AcceleratorBridge for NullAccelerator {}

/// Candle-backed accelerator bridge.
///
/// Candle frees device tensors eagerly on drop and does not expose
/// allocator counters, so `device_memory` is empty and `purge` returns 0;
/// the synchronize step is the part the collection pass relies on.
pub struct CandleAccelerator {
    devices: Vec<Device>,
}

impl CandleAccelerator {
    /// Probe for accelerator devices.
    pub fn detect() -> Self {
        let mut devices = Vec::new();
        if let Ok(device) = Device::cuda_if_available(0) {
            if device.is_cuda() {
                devices.push(device);
            }
        }
        if devices.is_empty() {
            if let Ok(device) = Device::new_metal(0) {
                if device.is_metal() {
                    devices.push(device);
                }
            }
        }
        if devices.is_empty() {
            debug!("no accelerator device detected; running host-only");
        }
        Self { devices }
    }

    /// Build a bridge over an explicit device list.
    pub fn with_devices(devices: Vec<Device>) -> Self {
        let devices = devices
            .into_iter()
            .filter(|d| d.is_cuda() || d.is_metal())
            .collect();
        Self { devices }
    }

    fn device_id(device: &Device) -> String {
        match device.location() {
            DeviceLocation::Cpu => "cpu".to_string(),
            DeviceLocation::Cuda { gpu_id } => format!("cuda:{}", gpu_id),
            DeviceLocation::Metal { gpu_id } => format!("metal:{}", gpu_id),
        }
    }
}

impl AcceleratorBridge for CandleAccelerator {
    fn synchronize(&self) {
        for device in &self.devices {
            if let Err(e) = device.synchronize() {
                warn!(device = %Self::device_id(device), error = %e, "device synchronize failed");
            }
        }
    }

    fn device_count(&self) -> usize {
        self.devices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_accelerator_defaults() {
        let accel = NullAccelerator;
        assert!(accel.device_memory().is_empty());
        assert_eq!(accel.purge(), 0);
        assert_eq!(accel.device_count(), 0);
        accel.synchronize();
    }

    #[test]
    fn test_detect_is_safe_without_gpu() {
        let accel = CandleAccelerator::detect();
        // On a host without accelerators the bridge is empty but usable.
        accel.synchronize();
        assert!(accel.device_memory().is_empty());
    }

    #[test]
    fn test_with_devices_filters_cpu() {
        let accel = CandleAccelerator::with_devices(vec![Device::Cpu]);
        assert_eq!(accel.device_count(), 0);
    }
}
