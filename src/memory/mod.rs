//! Memory management layer
//!
//! The engineering core of the runtime:
//! - [`MemorySampler`]: process + accelerator counters on demand
//! - [`Reclaimer`]: the collection pass (hooks, device purge, synchronize)
//! - [`MemoryMonitor`]: background polling with threshold callbacks
//! - [`ExecutionGuard`]: pre/post-checked execution of one unit of work

pub mod accel;
pub mod guard;
pub mod monitor;
pub mod reclaim;
pub mod sampler;
pub mod snapshot;

pub use accel::{AcceleratorBridge, CandleAccelerator, NullAccelerator};
pub use guard::{ExecutionGuard, PRE_CHECK_FRACTION};
pub use monitor::{
    MemoryMonitor, MEMORY_CRITICAL_EVENT, MEMORY_WARNING_EVENT, STOP_JOIN_TIMEOUT,
};
pub use reclaim::{ReclaimStats, Reclaimer};
pub use sampler::{MemorySampler, ProcSampler};
pub use snapshot::{DeviceMemory, MemorySnapshot};
