//! Process memory sampling via `/proc`
//!
//! Reads resident and virtual sizes from `/proc/self/status` and total
//! system memory from `/proc/meminfo`. A failure to read the process
//! counters is a hard [`StudioError::Sampling`] error; accelerator and
//! system-total counters are optional and degrade to empty/zero.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::error::{Result, StudioError};
use crate::memory::accel::{AcceleratorBridge, NullAccelerator};
use crate::memory::snapshot::MemorySnapshot;

const STATUS_PATH: &str = "/proc/self/status";
const MEMINFO_PATH: &str = "/proc/meminfo";

/// Source of memory snapshots.
///
/// Implemented over `/proc` in production; tests substitute synthetic
/// samplers to script memory trajectories.
pub trait MemorySampler: Send + Sync {
    /// Capture a snapshot of current memory usage.
    fn sample(&self) -> Result<MemorySnapshot>;
}

/// `/proc`-backed sampler.
pub struct ProcSampler {
    accel: Arc<dyn AcceleratorBridge>,
    status_path: PathBuf,
    meminfo_path: PathBuf,
}

impl ProcSampler {
    /// Create a sampler with the given accelerator bridge.
    pub fn new(accel: Arc<dyn AcceleratorBridge>) -> Self {
        Self {
            accel,
            status_path: PathBuf::from(STATUS_PATH),
            meminfo_path: PathBuf::from(MEMINFO_PATH),
        }
    }

    /// Create a host-only sampler.
    pub fn host_only() -> Self {
        Self::new(Arc::new(NullAccelerator))
    }

    /// Override the `/proc` file locations (for testing).
    #[cfg(test)]
    fn with_paths(mut self, status: impl Into<PathBuf>, meminfo: impl Into<PathBuf>) -> Self {
        self.status_path = status.into();
        self.meminfo_path = meminfo.into();
        self
    }

    /// Parse `VmRSS`/`VmSize` out of `/proc/self/status` content.
    ///
    /// Returns `(resident_bytes, virtual_bytes)`.
    fn parse_status(content: &str, source: &Path) -> Result<(u64, u64)> {
        let mut rss_kb: Option<u64> = None;
        let mut size_kb: Option<u64> = None;

        for line in content.lines() {
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("VmRSS:") => rss_kb = parts.next().and_then(|v| v.parse().ok()),
                Some("VmSize:") => size_kb = parts.next().and_then(|v| v.parse().ok()),
                _ => {}
            }
            if rss_kb.is_some() && size_kb.is_some() {
                break;
            }
        }

        let rss_kb = rss_kb.ok_or_else(|| {
            StudioError::sampling(format!("VmRSS not found in {}", source.display()))
        })?;
        let size_kb = size_kb.ok_or_else(|| {
            StudioError::sampling(format!("VmSize not found in {}", source.display()))
        })?;
        Ok((rss_kb * 1024, size_kb * 1024))
    }

    /// Parse `MemTotal` out of `/proc/meminfo` content, in bytes.
    fn parse_meminfo_total(content: &str) -> Option<u64> {
        for line in content.lines() {
            let mut parts = line.split_whitespace();
            if parts.next() == Some("MemTotal:") {
                return parts.next().and_then(|v| v.parse::<u64>().ok()).map(|kb| kb * 1024);
            }
        }
        None
    }
}

impl MemorySampler for ProcSampler {
    fn sample(&self) -> Result<MemorySnapshot> {
        let status = std::fs::read_to_string(&self.status_path).map_err(|e| {
            StudioError::sampling(format!(
                "cannot read {}: {}",
                self.status_path.display(),
                e
            ))
        })?;
        let (resident_bytes, virtual_bytes) = Self::parse_status(&status, &self.status_path)?;

        // System total is informational only; 0% when unreadable.
        let percent_of_system = std::fs::read_to_string(&self.meminfo_path)
            .ok()
            .and_then(|content| Self::parse_meminfo_total(&content))
            .filter(|total| *total > 0)
            .map(|total| resident_bytes as f64 / total as f64 * 100.0)
            .unwrap_or(0.0);

        Ok(MemorySnapshot::new(
            resident_bytes,
            virtual_bytes,
            percent_of_system,
            self.accel.device_memory(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const STATUS_FIXTURE: &str = "Name:\tvoice-studio\n\
        VmPeak:\t  202400 kB\n\
        VmSize:\t  201400 kB\n\
        VmRSS:\t   51200 kB\n\
        Threads:\t4\n";

    const MEMINFO_FIXTURE: &str = "MemTotal:       16384000 kB\n\
        MemFree:         8192000 kB\n\
        MemAvailable:   12288000 kB\n";

    #[test]
    fn test_parse_status() {
        let (rss, vms) =
            ProcSampler::parse_status(STATUS_FIXTURE, Path::new("status")).unwrap();
        assert_eq!(rss, 51200 * 1024);
        assert_eq!(vms, 201400 * 1024);
    }

    #[test]
    fn test_parse_status_missing_rss_is_error() {
        let err = ProcSampler::parse_status("Name:\tx\nVmSize:\t10 kB\n", Path::new("status"))
            .unwrap_err();
        assert!(matches!(err, StudioError::Sampling { .. }));
    }

    #[test]
    fn test_parse_meminfo_total() {
        assert_eq!(
            ProcSampler::parse_meminfo_total(MEMINFO_FIXTURE),
            Some(16384000 * 1024)
        );
        assert_eq!(ProcSampler::parse_meminfo_total("MemFree: 1 kB\n"), None);
    }

    #[test]
    fn test_sample_from_fixture_files() {
        let dir = tempfile::tempdir().unwrap();
        let status_path = dir.path().join("status");
        let meminfo_path = dir.path().join("meminfo");
        std::fs::File::create(&status_path)
            .unwrap()
            .write_all(STATUS_FIXTURE.as_bytes())
            .unwrap();
        std::fs::File::create(&meminfo_path)
            .unwrap()
            .write_all(MEMINFO_FIXTURE.as_bytes())
            .unwrap();

        let sampler = ProcSampler::host_only().with_paths(&status_path, &meminfo_path);
        let snapshot = sampler.sample().unwrap();
        assert_eq!(snapshot.resident_bytes, 51200 * 1024);
        assert_eq!(snapshot.virtual_bytes, 201400 * 1024);
        assert!(snapshot.percent_of_system > 0.0);
        assert!(snapshot.devices.is_empty());
    }

    #[test]
    fn test_sample_missing_status_is_hard_error() {
        let sampler = ProcSampler::host_only().with_paths("/nonexistent/status", "/nonexistent/meminfo");
        assert!(matches!(
            sampler.sample(),
            Err(StudioError::Sampling { .. })
        ));
    }

    #[test]
    fn test_sample_missing_meminfo_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let status_path = dir.path().join("status");
        std::fs::File::create(&status_path)
            .unwrap()
            .write_all(STATUS_FIXTURE.as_bytes())
            .unwrap();

        let sampler = ProcSampler::host_only().with_paths(&status_path, "/nonexistent/meminfo");
        let snapshot = sampler.sample().unwrap();
        assert_eq!(snapshot.percent_of_system, 0.0);
    }
}
